/// Core error type for badger.
///
/// The CLI prints every variant as a single line, so messages stay short and
/// never include the account token.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid sequence at position {position}: {reason}")]
    InvalidSequence { position: usize, reason: String },

    #[error("empty sequence")]
    EmptySequence,

    #[error("preset '{0}' does not exist")]
    PresetNotFound(String),

    #[error("presets {} do not exist", quoted_list(.0))]
    PresetsNotFound(Vec<String>),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// `'a', 'b'` style listing used in user-facing preset messages.
pub fn quoted_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
