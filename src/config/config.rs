use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub grammarbot: GrammarBotConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// TCP port to listen on
    pub port: u16,

    /// Largest accepted request body
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarBotConfig {
    pub api_key: String,

    /// Base URL of the check API, without the trailing `/check`
    pub base_url: String,

    /// Language code sent with every check, e.g. "en-US"
    pub language: String,

    /// Upstream request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub error_mode: ErrorMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    pub filter: String,

    /// Colourised output
    pub ansi: bool,
}

/// How the relay reports a failed check back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Distinct 4xx/5xx statuses with a JSON error body
    #[default]
    Explicit,
    /// Failures answer 200 with a JSON `null` body, and a missing text is
    /// forwarded to the checker as-is
    Passthrough,
}

impl FromStr for ErrorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explicit" => Ok(ErrorMode::Explicit),
            "passthrough" => Ok(ErrorMode::Passthrough),
            other => Err(anyhow::anyhow!(
                "unknown error mode '{}', expected 'explicit' or 'passthrough'",
                other
            )),
        }
    }
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMode::Explicit => write!(f, "explicit"),
            ErrorMode::Passthrough => write!(f, "passthrough"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Default for GrammarBotConfig {
    fn default() -> Self {
        Self {
            api_key: "KS9C5N3Y".to_string(),
            base_url: "http://api.grammarbot.io/v2".to_string(),
            language: "en-US".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: true,
        }
    }
}

impl ServerConfig {
    /// Resolve `host` and `port` to a bind address. IP literals (v4, v6,
    /// optionally bracketed) are taken as-is; names go through the resolver.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let host = self
            .host
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']');

        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        (host, self.port)
            .to_socket_addrs()
            .with_context(|| format!("invalid listen host '{}'", self.host))?
            .next()
            .ok_or_else(|| anyhow::anyhow!("listen host '{}' resolved to no address", self.host))
    }
}

impl GrammarBotConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Read the TOML layer only. A missing default file yields defaults,
    /// a missing explicit file is an error.
    pub fn load_file_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::get_config_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("grammar-relay").join("config.toml"))
    }

    /// Final load step after the file layer: environment overrides, then
    /// validation
    pub fn finish_with_env(mut self) -> Result<Self> {
        self.apply_overrides_from(|key| std::env::var(key).ok());
        self.validate()?;
        Ok(self)
    }

    /// Apply overrides from any key lookup. Unparseable values are skipped
    /// with a warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("GRAMMAR_RELAY_HOST") {
            self.server.host = host;
        }

        // PORT is honoured for platforms that inject it; the namespaced
        // variable wins when both are set.
        for key in ["PORT", "GRAMMAR_RELAY_PORT"] {
            if let Some(raw) = lookup(key) {
                match raw.trim().parse::<u16>() {
                    Ok(port) => self.server.port = port,
                    Err(_) => warn!(target: "config", "ignoring {}={:?}: not a port", key, raw),
                }
            }
        }

        if let Some(key) = lookup("GRAMMARBOT_API_KEY") {
            self.grammarbot.api_key = key;
        }
        if let Some(url) = lookup("GRAMMARBOT_BASE_URL") {
            self.grammarbot.base_url = url;
        }
        if let Some(language) = lookup("GRAMMARBOT_LANGUAGE") {
            self.grammarbot.language = language;
        }
        if let Some(raw) = lookup("GRAMMARBOT_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.grammarbot.timeout_secs = secs,
                Err(_) => warn!(
                    target: "config",
                    "ignoring GRAMMARBOT_TIMEOUT_SECS={:?}: not a number",
                    raw
                ),
            }
        }

        if let Some(raw) = lookup("GRAMMAR_RELAY_ERROR_MODE") {
            match raw.parse::<ErrorMode>() {
                Ok(mode) => self.relay.error_mode = mode,
                Err(e) => warn!(target: "config", "ignoring GRAMMAR_RELAY_ERROR_MODE: {}", e),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.server.socket_addr()?;

        if self.grammarbot.base_url.trim().is_empty() {
            anyhow::bail!("grammarbot.base_url must not be empty");
        }
        if self.grammarbot.timeout_secs == 0 {
            anyhow::bail!("grammarbot.timeout_secs must be greater than zero");
        }
        if self.server.max_body_bytes == 0 {
            anyhow::bail!("server.max_body_bytes must be greater than zero");
        }
        if self.grammarbot.api_key.trim().is_empty() {
            warn!(target: "config", "grammarbot.api_key is empty; upstream will likely reject checks");
        }

        Ok(())
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Grammar Relay Configuration File
# Location: ~/.config/grammar-relay/config.toml (Linux)
#           ~/Library/Application Support/grammar-relay/config.toml (macOS)
#           %APPDATA%\grammar-relay\config.toml (Windows)
#
# Every value can also be set from the environment (or a .env file):
#   GRAMMAR_RELAY_HOST, GRAMMAR_RELAY_PORT (or PORT), GRAMMARBOT_API_KEY,
#   GRAMMARBOT_BASE_URL, GRAMMARBOT_LANGUAGE, GRAMMARBOT_TIMEOUT_SECS,
#   GRAMMAR_RELAY_ERROR_MODE

[server]
host = "0.0.0.0"
port = 5000

# Requests with a larger body are rejected with 413
max_body_bytes = 1048576

[grammarbot]
api_key = "KS9C5N3Y"
base_url = "http://api.grammarbot.io/v2"
language = "en-US"

# Upstream calls taking longer than this fail as unreachable
timeout_secs = 30

[relay]
# "explicit"    - failures get 4xx/5xx with {"error", "message"}
# "passthrough" - failures answer 200 with a null body
error_mode = "explicit"

[logging]
# Used when RUST_LOG is not set
filter = "info"
ansi = true
"#
        .to_string()
    }
}
