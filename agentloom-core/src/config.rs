use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AgentloomError, AgentloomResult};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentloomConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Deadline for the tool-creation request of the wizard.
    #[serde(default = "default_create_timeout")]
    pub create_timeout_secs: u64,

    /// Give up on a chat stream that sends nothing for this long. 0 disables.
    #[serde(default = "default_stream_idle_timeout")]
    pub stream_idle_timeout_secs: u64,

    /// IANA zone sent with every chat message. Empty means UTC.
    #[serde(default)]
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_key")]
    pub token_key: String,

    #[serde(default = "default_true")]
    pub remember: bool,

    /// Overrides the token file location. Empty means the config dir.
    #[serde(default)]
    pub token_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub color: bool,

    #[serde(default = "default_datetime_format")]
    pub datetime_format: String,

    #[serde(default = "default_true")]
    pub show_sources: bool,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_create_timeout() -> u64 {
    30
}

fn default_stream_idle_timeout() -> u64 {
    300
}

fn default_token_key() -> String {
    "auth_token".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

fn default_datetime_format() -> String {
    "%Y-%m-%d %H:%M".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            create_timeout_secs: default_create_timeout(),
            stream_idle_timeout_secs: default_stream_idle_timeout(),
            timezone: String::new(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_key: default_token_key(),
            remember: true,
            token_path: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            datetime_format: default_datetime_format(),
            show_sources: true,
        }
    }
}

impl AgentloomConfig {
    pub fn load() -> AgentloomResult<Self> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> AgentloomResult<Self> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("AGENTLOOM")
                .separator("__")
                .try_parsing(true),
        );

        let mut agentloom_config: AgentloomConfig = builder.build()?.try_deserialize()?;

        if let Ok(url) = std::env::var("AGENTLOOM_API_URL") {
            agentloom_config.api.base_url = url;
        }

        if let Ok(level) = std::env::var("AGENTLOOM_LOG_LEVEL") {
            agentloom_config.logging.level = level;
        }

        if let Ok(tz) = std::env::var("TZ") {
            if agentloom_config.api.timezone.is_empty() {
                agentloom_config.api.timezone = tz;
            }
        }

        agentloom_config.validate()?;

        Ok(agentloom_config)
    }

    pub fn validate(&self) -> AgentloomResult<()> {
        if self.api.base_url.is_empty() {
            return Err(AgentloomError::MissingConfig("api.base_url".to_string()));
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(AgentloomError::InvalidConfigValue {
                key: "api.base_url".to_string(),
                message: "Must start with http:// or https://".to_string(),
            });
        }

        if self.api.request_timeout_secs == 0 {
            return Err(AgentloomError::InvalidConfigValue {
                key: "api.request_timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.api.create_timeout_secs == 0 {
            return Err(AgentloomError::InvalidConfigValue {
                key: "api.create_timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.auth.token_key.trim().is_empty() {
            return Err(AgentloomError::MissingConfig("auth.token_key".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(AgentloomError::InvalidConfigValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }

    /// Base URL without a trailing slash, so paths can be appended as-is.
    pub fn api_base(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }

    pub fn timezone(&self) -> &str {
        if self.api.timezone.is_empty() {
            "UTC"
        } else {
            &self.api.timezone
        }
    }

    /// Where a remembered token is persisted.
    pub fn token_path(&self) -> Option<PathBuf> {
        if !self.auth.token_path.is_empty() {
            return Some(PathBuf::from(&self.auth.token_path));
        }
        get_config_dir().map(|d| d.join(format!("{}.json", self.auth.token_key)))
    }

    pub fn to_toml(&self) -> AgentloomResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write this configuration to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> AgentloomResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("agentloom.toml"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    let current_dir = std::env::current_dir().ok();

    let env_paths = [
        current_dir.as_ref().map(|d| d.join(".env")),
        current_dir.as_ref().map(|d| d.join(".env.local")),
        get_config_dir().map(|d| d.join(".env")),
    ];

    for path in env_paths.iter().flatten() {
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("agentloom"))
}

pub fn default_config_file() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join("config.toml"))
}
