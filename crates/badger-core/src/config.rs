use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChannelId, UserId},
    errors::Error,
    presets::PresetStore,
    Result,
};

/// Default config file name, resolved against the working directory.
pub const DEFAULT_FILENAME: &str = "config.json";

/// Env var overriding the config file location.
pub const CONFIG_ENV: &str = "BADGER_CONFIG";

const DEFAULT_TIMEOUT_SECS: f64 = 1.0;
const DEFAULT_PREFIX: &str = "$";

// Discord token ids are base64 with the padding usually stripped.
const TOKEN_ID_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Persisted configuration (`config.json`).
///
/// Loaded once at startup and passed explicitly to whoever needs it; only
/// preset add/delete mutate it.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub token: String,
    pub channel_id: u64,
    #[serde(default)]
    pub presets: PresetStore,
    /// Delay between messages, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    /// Bot command prefix prepended to every command (not to confirmations).
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("channel_id", &self.channel_id)
            .field("presets", &self.presets)
            .field("timeout", &self.timeout)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = match fs::read_to_string(path) {
            Ok(txt) => txt,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::Config(format!(
                    "config file {} not found",
                    path.display()
                )));
            }
            Err(e) => return Err(Error::Io(e)),
        };
        let cfg: Config = serde_json::from_str(&txt)?;

        if cfg.token.trim().is_empty() {
            return Err(Error::Config("token is required".to_string()));
        }
        parse_delay(cfg.timeout)?;

        Ok(cfg)
    }

    /// Rewrite the whole file: pretty JSON (4-space indent) into a sibling
    /// temp file, then rename over the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');

        let tmp = temp_path(path);
        fs::write(&tmp, &buf)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::Io(e));
        }
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    pub fn channel(&self) -> ChannelId {
        ChannelId(self.channel_id)
    }

    pub fn delay(&self) -> Result<Duration> {
        parse_delay(self.timeout)
    }

    /// Account user id, decoded from the first segment of the token.
    pub fn user_id(&self) -> Result<UserId> {
        let segment = self.token.split('.').next().unwrap_or_default().trim();
        let bytes = TOKEN_ID_ENGINE
            .decode(segment)
            .map_err(|e| Error::Config(format!("token does not start with a user id: {e}")))?;
        let id = String::from_utf8(bytes)
            .map_err(|_| Error::Config("token user id is not utf-8".to_string()))?;
        if id.is_empty() {
            return Err(Error::Config("token user id is empty".to_string()));
        }
        Ok(UserId(id))
    }
}

/// Config location: `$BADGER_CONFIG`, else `config.json`.
pub fn default_path() -> PathBuf {
    env_path(CONFIG_ENV).unwrap_or_else(|| PathBuf::from(DEFAULT_FILENAME))
}

/// Seconds → delay. Rejects negative and non-finite values.
pub fn parse_delay(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| Error::Config(format!("invalid timeout {secs}: expected seconds >= 0")))
}

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_FILENAME.into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
