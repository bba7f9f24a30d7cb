use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    /// Data directory (~/.ecocart) - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,

    /// API key for the external model API. `ECOCART_API_KEY` or
    /// `ANTHROPIC_API_KEY` override this after load.
    pub api_key: Option<String>,
    /// Base URL override for the model API (testing / proxies).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Token budget for a single food judgment.
    #[serde(default = "default_judge_max_tokens")]
    pub judge_max_tokens: u32,
    /// Token budget for the cart summary commentary.
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
    /// User every request without an explicit `user_id` resolves to.
    #[serde(default = "default_user_id")]
    pub default_user_id: String,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}

fn default_judge_max_tokens() -> u32 {
    1000
}

fn default_summary_max_tokens() -> u32 {
    300
}

fn default_user_id() -> String {
    "default_user".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            data_dir: PathBuf::new(),
            api_key: None,
            base_url: None,
            model: default_model(),
            judge_max_tokens: default_judge_max_tokens(),
            summary_max_tokens: default_summary_max_tokens(),
            default_user_id: default_user_id(),
            gateway: GatewayConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

// ── Gateway ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Gateway port (default: 5000)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    5000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

// ── Store ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store file path. Defaults to `user_data.json` under the data dir.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

impl Config {
    /// Load `~/.ecocart/config.toml`, creating the directory and a default
    /// config file on first run.
    pub fn load_or_init() -> Result<Self, ConfigError> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Load("could not find home directory".into()))?;
        Self::load_or_init_at(&home.join(".ecocart"))
    }

    pub fn load_or_init_at(data_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = data_dir.join("config.toml");

        if !data_dir.exists() {
            fs::create_dir_all(data_dir)?;
        }

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|e| ConfigError::Load(format!("failed to parse config file: {e}")))?;
            config.config_path = config_path;
            config.data_dir = data_dir.to_path_buf();
            config.validate()?;
            Ok(config)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                data_dir: data_dir.to_path_buf(),
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Load(format!("failed to serialize config: {e}")))?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }

    /// Apply environment variable overrides to config.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) =
            std::env::var("ECOCART_API_KEY").or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
            && !key.is_empty()
        {
            self.api_key = Some(key);
        }

        if let Ok(model) = std::env::var("ECOCART_MODEL")
            && !model.is_empty()
        {
            self.model = model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Validation("model must not be empty".into()));
        }
        if self.judge_max_tokens == 0 || self.summary_max_tokens == 0 {
            return Err(ConfigError::Validation(
                "token budgets must be greater than zero".into(),
            ));
        }
        if self.default_user_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default_user_id must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Resolved path of the store file.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .data_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("user_data.json"))
    }
}
