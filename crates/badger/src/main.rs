use std::{
    ffi::OsString,
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

use anyhow::Context;
use clap::{ArgGroup, CommandFactory, FromArgMatches, Parser};

use badger_core::{
    command::alphabet_help,
    config::{self, Config},
    domain::ChannelId,
    errors::quoted_list,
    interpreter::Interpreter,
    messaging::port::MessagingPort,
    presets::{self, SaveOutcome},
    sequence::Sequence,
};
use badger_discord::DiscordMessenger;

/// Automate Mudae badges.
#[derive(Parser, Debug)]
#[command(name = "badger")]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .multiple(true)
        .args(["sequence", "preset", "list_presets", "delete"])
))]
struct Cli {
    /// Badges sequence string
    sequence: Option<String>,

    /// Preset name to execute (with SEQUENCE: save it under this name)
    #[arg(short, long, value_name = "NAME")]
    preset: Option<String>,

    /// Delay between messages, in seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<f64>,

    /// Discord channel ID
    #[arg(short, long, value_name = "ID")]
    channel: Option<u64>,

    /// Skip the refund step
    #[arg(short, long)]
    skip_refund: bool,

    /// View saved presets
    #[arg(short, long)]
    list_presets: bool,

    /// Delete saved presets
    #[arg(short, long, value_name = "PRESET", num_args = 1..)]
    delete: Option<Vec<String>>,

    /// Config file [default: $BADGER_CONFIG or config.json]
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Parse `args` (program name first). A bare invocation prints help and
    /// yields `None`; parse errors exit through clap.
    fn parse_with_epilog<I, T>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let mut command = Self::command().after_help(epilog());
        if args.len() <= 1 {
            let _ = command.print_help();
            return None;
        }

        let matches = command.get_matches_from(args);
        match Self::from_arg_matches(&matches) {
            Ok(cli) => Some(cli),
            Err(e) => e.exit(),
        }
    }
}

fn epilog() -> String {
    format!(
        "valid sequence characters:\n{}\n  1-4\tbadge level\n\n\
example:\n  badger -p foo '!b2i2g2r4i4'\n  \
refund, bronze 2, silver 2, gold 2, ruby 4, silver 4",
        alphabet_help()
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    let Some(cli) = Cli::parse_with_epilog(std::env::args_os()) else {
        return ExitCode::SUCCESS;
    };

    if let Err(e) = badger_core::logging::init("badger") {
        eprintln!("{e}");
    }

    let mut input = io::stdin().lock();
    let mut out = io::stdout().lock();
    match run(cli, &mut input, &mut out, connect_discord).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::debug!(error = ?e, "run failed");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn connect_discord(cfg: &Config) -> badger_core::Result<Arc<dyn MessagingPort>> {
    Ok(Arc::new(DiscordMessenger::new(&cfg.token)?))
}

/// Execute one invocation. `Ok(false)` is a reported failure (exit 1).
///
/// `connect` is only called once a sequence is about to be dispatched.
async fn run<C>(
    cli: Cli,
    input: &mut impl BufRead,
    out: &mut impl Write,
    connect: C,
) -> anyhow::Result<bool>
where
    C: FnOnce(&Config) -> badger_core::Result<Arc<dyn MessagingPort>>,
{
    let path = cli.config.clone().unwrap_or_else(config::default_path);
    let mut cfg = Config::load(&path)?;

    if cli.list_presets {
        writeln!(out, "{}", presets::format_presets(&cfg.presets))?;
        return Ok(true);
    }

    if let Some(names) = &cli.delete {
        let outcome = presets::delete_presets(&mut cfg, &path, names)?;
        if let Some(err) = outcome.missing_error() {
            writeln!(out, "{}.", capitalize(&err.to_string()))?;
            return Ok(false);
        }
        let plural = if outcome.deleted.len() > 1 { "s" } else { "" };
        writeln!(out, "Deleted preset{plural} {}.", quoted_list(&outcome.deleted))?;
        return Ok(true);
    }

    if let (Some(raw), Some(name)) = (&cli.sequence, &cli.preset) {
        let seq = Sequence::parse(raw)?;
        let outcome = presets::save_preset(&mut cfg, &path, name, &seq, |name, existing| {
            confirm_overwrite(input, out, name, existing)
        })?;
        if outcome == SaveOutcome::Saved {
            writeln!(out, "Sequence '{seq}' saved as '{name}'.")?;
        }
        return Ok(true);
    }

    let seq = presets::resolve_sequence(
        &cfg,
        cli.sequence.as_deref(),
        cli.preset.as_deref(),
        cli.skip_refund,
    )?;

    let delay = match cli.timeout {
        Some(secs) => config::parse_delay(secs)?,
        None => cfg.delay()?,
    };
    let channel_id = ChannelId(cli.channel.unwrap_or(cfg.channel_id));
    let user_id = cfg.user_id()?;

    let messenger = connect(&cfg)?;
    let interpreter = Interpreter::new(messenger.as_ref(), channel_id, delay, user_id)
        .with_prefix(cfg.prefix.clone());

    let summary = interpreter
        .run(&seq, |step| {
            let _ = writeln!(out, "{step}");
        })
        .await
        .with_context(|| format!("sequence '{seq}' aborted"))?;

    if summary.rejected() > 0 {
        writeln!(
            out,
            "{} of {} messages were rejected by Discord.",
            summary.rejected(),
            summary.messages
        )?;
    }

    Ok(true)
}

/// `(Y/n)` prompt; an empty line means yes, end of input means no.
fn confirm_overwrite(
    input: &mut impl BufRead,
    out: &mut impl Write,
    name: &str,
    existing: &str,
) -> badger_core::Result<bool> {
    write!(
        out,
        "Preset '{name} - {existing}' already exists, overwrite? (Y/n): "
    )?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(out)?;
        return Ok(false);
    }
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | ""))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use badger_core::{domain::MessageRef, errors::Error, presets::PresetStore};
    use std::{path::Path, sync::Mutex, time::Duration};

    #[derive(Default)]
    struct FakeMessenger {
        sent: Mutex<Vec<(ChannelId, String)>>,
        reject_all: bool,
    }

    impl FakeMessenger {
        fn texts(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_text(
            &self,
            channel_id: ChannelId,
            text: &str,
        ) -> badger_core::Result<MessageRef> {
            let mut sent = self.sent.lock().unwrap();
            sent.push((channel_id, text.to_string()));
            Ok(MessageRef {
                channel_id,
                message_id: (!self.reject_all).then(|| sent.len().to_string()),
            })
        }
    }

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.json"))
    }

    fn write_config(prefix: &str, presets: &[(&str, &str)]) -> PathBuf {
        let path = tmp_file(prefix);
        let cfg = Config {
            token: "NDI.x.y".to_string(),
            channel_id: 10,
            presets: presets
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<PresetStore>(),
            timeout: 0.0,
            prefix: "$".to_string(),
        };
        cfg.save(&path).unwrap();
        path
    }

    fn cli(path: &Path, args: &[&str]) -> Cli {
        let mut argv = vec!["badger", "--config", path.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn no_connect(_: &Config) -> badger_core::Result<Arc<dyn MessagingPort>> {
        panic!("nothing should be dispatched")
    }

    async fn run_with(cli: Cli, stdin: &str) -> (anyhow::Result<bool>, String) {
        let mut input = stdin.as_bytes();
        let mut out = Vec::new();
        let res = run(cli, &mut input, &mut out, no_connect).await;
        (res, String::from_utf8(out).unwrap())
    }

    fn core_error(res: anyhow::Result<bool>) -> Error {
        res.unwrap_err().downcast::<Error>().unwrap()
    }

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("badger").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sequence_with_options() {
        let cli = parse(&["-t", "0.5", "-c", "99", "-s", "!b2i2"]).unwrap();
        assert_eq!(cli.sequence.as_deref(), Some("!b2i2"));
        assert_eq!(cli.timeout, Some(0.5));
        assert_eq!(cli.channel, Some(99));
        assert!(cli.skip_refund);
    }

    #[test]
    fn delete_takes_several_names() {
        let cli = parse(&["-d", "a", "b"]).unwrap();
        assert_eq!(cli.delete, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn some_action_is_required() {
        assert!(parse(&["-t", "1"]).is_err());
        assert!(parse(&["-l"]).is_ok());
        assert!(parse(&["-p", "daily"]).is_ok());
    }

    #[test]
    fn bare_invocation_shows_help_and_succeeds() {
        assert!(Cli::parse_with_epilog(["badger"]).is_none());
        let cli = Cli::parse_with_epilog(["badger", "-l"]).unwrap();
        assert!(cli.list_presets);
    }

    #[test]
    fn epilog_lists_alphabet() {
        let text = epilog();
        assert!(text.contains("  !\tkakerarefund"));
        assert!(text.contains("1-4\tbadge level"));
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("preset 'x' does not exist"), "Preset 'x' does not exist");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn overwrite_prompt_answers() {
        for (answer, expected) in [
            ("\n", true),
            ("y\n", true),
            (" Y \n", true),
            ("n\n", false),
            ("yes please\n", false),
            ("", false),
        ] {
            let mut input = answer.as_bytes();
            let mut out = Vec::new();
            let ok = confirm_overwrite(&mut input, &mut out, "daily", "b1").unwrap();
            assert_eq!(ok, expected, "answer {answer:?}");
            assert!(String::from_utf8(out)
                .unwrap()
                .starts_with("Preset 'daily - b1' already exists, overwrite? (Y/n): "));
        }
    }

    #[tokio::test]
    async fn closed_stdin_keeps_existing_preset() {
        let path = write_config("badger-cli-eof", &[("daily", "b1")]);
        let before = std::fs::read_to_string(&path).unwrap();

        let (res, out) = run_with(cli(&path, &["-p", "daily", "g4"]), "").await;

        assert!(res.unwrap());
        assert!(!out.contains("saved as"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn enter_confirms_overwrite() {
        let path = write_config("badger-cli-enter", &[("daily", "b1")]);

        let (res, out) = run_with(cli(&path, &["-p", "daily", "g4"]), "\n").await;

        assert!(res.unwrap());
        assert!(out.ends_with("Sequence 'g4' saved as 'daily'.\n"));
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.presets.get("daily").map(String::as_str), Some("g4"));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn sequence_with_preset_saves_without_dispatch() {
        let path = write_config("badger-cli-save", &[]);

        let (res, out) = run_with(cli(&path, &["-p", "daily", "!b2"]), "").await;

        assert!(res.unwrap());
        assert_eq!(out, "Sequence '!b2' saved as 'daily'.\n");
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.presets.get("daily").map(String::as_str), Some("!b2"));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn invalid_sequence_is_not_saved() {
        let path = write_config("badger-cli-invalid", &[]);
        let before = std::fs::read_to_string(&path).unwrap();

        let (res, _) = run_with(cli(&path, &["-p", "daily", "b!"]), "").await;

        assert!(matches!(core_error(res), Error::InvalidSequence { position: 1, .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn partial_delete_fails_and_keeps_file() {
        let path = write_config("badger-cli-del-partial", &[("a", "b")]);
        let before = std::fs::read_to_string(&path).unwrap();

        let (res, out) = run_with(cli(&path, &["-d", "a", "b"]), "").await;

        assert!(!res.unwrap());
        assert_eq!(out, "Preset 'b' does not exist.\n");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn full_delete_succeeds() {
        let path = write_config("badger-cli-del", &[("a", "b"), ("c", "g"), ("d", "e")]);

        let (res, out) = run_with(cli(&path, &["-d", "a", "c"]), "").await;

        assert!(res.unwrap());
        assert_eq!(out, "Deleted presets 'a', 'c'.\n");
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.presets.keys().collect::<Vec<_>>(), vec!["d"]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn list_prints_presets() {
        let path = write_config("badger-cli-list", &[("a", "!b2"), ("longer", "g")]);

        let (res, out) = run_with(cli(&path, &["-l"]), "").await;

        assert!(res.unwrap());
        assert_eq!(out, "Saved presets:\na      - !b2\nlonger - g\n");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_preset_is_an_error() {
        let path = write_config("badger-cli-missing", &[]);

        let (res, out) = run_with(cli(&path, &["-p", "nope"]), "").await;

        assert!(matches!(core_error(res), Error::PresetNotFound(n) if n == "nope"));
        assert!(out.is_empty());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn skip_refund_leaving_nothing_is_an_error() {
        let path = write_config("badger-cli-empty", &[("r", "!")]);

        let (res, _) = run_with(cli(&path, &["-p", "r", "-s"]), "").await;

        assert!(matches!(core_error(res), Error::EmptySequence));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn preset_runs_through_messenger() {
        let path = write_config("badger-cli-run", &[("daily", "!b2")]);
        let fake = Arc::new(FakeMessenger::default());
        let port = fake.clone();

        let mut input: &[u8] = b"";
        let mut out = Vec::new();
        let res = run(
            cli(&path, &["-p", "daily", "-c", "55", "-t", "0"]),
            &mut input,
            &mut out,
            move |_| Ok(port as Arc<dyn MessagingPort>),
        )
        .await;

        assert!(res.unwrap());
        assert_eq!(
            fake.texts(),
            vec!["$kakerarefund 42", "confirm", "$bronze 2", "y"]
        );
        assert!(fake
            .sent
            .lock()
            .unwrap()
            .iter()
            .all(|(c, _)| *c == ChannelId(55)));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Refunding badges\nGetting bronze 2\n"
        );
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn rejected_messages_are_reported() {
        let path = write_config("badger-cli-rejected", &[]);
        let fake = Arc::new(FakeMessenger {
            reject_all: true,
            ..FakeMessenger::default()
        });
        let port = fake.clone();

        let mut input: &[u8] = b"";
        let mut out = Vec::new();
        let res = run(
            cli(&path, &["-s", "!g"]),
            &mut input,
            &mut out,
            move |_| Ok(port as Arc<dyn MessagingPort>),
        )
        .await;

        assert!(res.unwrap());
        assert_eq!(fake.texts(), vec!["$gold", "y"]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Getting gold\n2 of 2 messages were rejected by Discord.\n"
        );
        let _ = std::fs::remove_file(&path);
    }
}
