use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use dashvl::providers::configs::{ClientConfig, DEFAULT_TIMEOUT};
use serde::Deserialize;
use thiserror::Error;

const ENV_PREFIX: &str = "DASHVL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {env_var}: {message}")]
    InvalidValue { env_var: String, message: String },
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets a dotted settings key, e.g.
/// `models.image` -> `DASHVL_MODELS__IMAGE`
pub fn to_env_var(field: &str) -> String {
    format!("{}_{}", ENV_PREFIX, field.replace('.', "__").to_uppercase())
}

/// Model used by each menu branch
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelSettings {
    #[serde(default = "default_image_model")]
    pub image: String,
    /// Image text extraction runs without reasoning on a lighter model
    #[serde(default = "default_image_text_model")]
    pub image_text: String,
    #[serde(default = "default_video_model")]
    pub video: String,
    #[serde(default = "default_ocr_model")]
    pub ocr: String,
    #[serde(default = "default_text_model")]
    pub text: String,
    #[serde(default = "default_document_model")]
    pub document: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            image: default_image_model(),
            image_text: default_image_text_model(),
            video: default_video_model(),
            ocr: default_ocr_model(),
            text: default_text_model(),
            document: default_document_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub models: ModelSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Defaults, then the optional TOML file, then `DASHVL_*` variables
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let models = ModelSettings::default();
        let mut builder = Config::builder()
            .set_default("base_url", default_base_url())?
            .set_default("timeout_secs", default_timeout_secs())?
            .set_default("models.image", models.image)?
            .set_default("models.image_text", models.image_text)?
            .set_default("models.video", models.video)?
            .set_default("models.ocr", models.ocr)?
            .set_default("models.text", models.text)?
            .set_default("models.document", models.document)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(?settings, "loaded settings");
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                env_var: to_env_var("timeout_secs"),
                message: "timeout must be at least one second".to_string(),
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                env_var: to_env_var("base_url"),
                message: "base URL must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Client settings, with command line values taking precedence
    pub fn client_config(&self, api_key: Option<String>, base_url: Option<String>) -> ClientConfig {
        ClientConfig {
            api_key,
            base_url: base_url.unwrap_or_else(|| self.base_url.clone()),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

fn default_base_url() -> String {
    ClientConfig::from_env().base_url
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_image_model() -> String {
    "qwen3-vl-plus".to_string()
}

fn default_image_text_model() -> String {
    "qwen-vl-max-latest".to_string()
}

fn default_video_model() -> String {
    "qwen-vl-max-latest".to_string()
}

fn default_ocr_model() -> String {
    "qwen-vl-ocr-latest".to_string()
}

fn default_text_model() -> String {
    "qwen-plus".to_string()
}

fn default_document_model() -> String {
    "qwen-long".to_string()
}
