use crate::{errors::Error, Result};

/// Initialize logging/tracing for the CLI.
///
/// Logs go to stderr so that progress lines on stdout stay clean.
pub fn init(service_name: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Config(format!("logging init failed: {e}")))
}

/// Warnings only; the CLI already reports outcomes on stdout.
/// `RUST_LOG=badger_core=info` (or `debug`) opts into more.
fn default_directives(service_name: &str) -> String {
    format!("warn,badger_core=warn,badger_discord=warn,{service_name}=warn")
}
