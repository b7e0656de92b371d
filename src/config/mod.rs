use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

use crate::error::AppError;

/// Default model when the caller omits one.
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Default and upper bound for max_tokens.
const DEFAULT_MAX_TOKENS: u32 = 1000;
const MAX_TOKENS_LIMIT: u32 = 4000;
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Outbound request timeout in seconds.
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub upstream: UpstreamConfig,
    pub generation: GenerationConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommonConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

/// Upstream completion API settings. The API key is held server-side
/// and never surfaces in responses or logs.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub api_key: String,
    pub base_url: String,
    /// Optional HTTP-Referer attribution header sent upstream.
    pub http_referer: Option<String>,
    /// Optional system message prepended to every prompt.
    pub system_prompt: Option<String>,
    pub timeout_secs: u64,
}

/// Defaults and bounds applied to inbound generation requests.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub default_model: String,
    pub default_max_tokens: u32,
    pub max_tokens_limit: u32,
    pub default_temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let common_cfg = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;
        let common: CommonConfig = common_cfg.try_deserialize()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let config = RelayConfig {
            common,
            upstream: UpstreamConfig {
                api_key: get_env("OPENROUTER_API_KEY", None, is_prod)?,
                base_url: get_env(
                    "RELAY_UPSTREAM_BASE_URL",
                    Some("https://openrouter.ai/api/v1"),
                    is_prod,
                )?,
                http_referer: env::var("RELAY_HTTP_REFERER").ok(),
                system_prompt: env::var("RELAY_SYSTEM_PROMPT").ok(),
                timeout_secs: get_env_parsed(
                    "RELAY_UPSTREAM_TIMEOUT_SECS",
                    Some(&DEFAULT_UPSTREAM_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?,
            },
            generation: GenerationConfig {
                default_model: get_env("RELAY_DEFAULT_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                default_max_tokens: get_env_parsed(
                    "RELAY_MAX_TOKENS_DEFAULT",
                    Some(&DEFAULT_MAX_TOKENS.to_string()),
                    is_prod,
                )?,
                max_tokens_limit: get_env_parsed(
                    "RELAY_MAX_TOKENS_LIMIT",
                    Some(&MAX_TOKENS_LIMIT.to_string()),
                    is_prod,
                )?,
                default_temperature: get_env_parsed(
                    "RELAY_DEFAULT_TEMPERATURE",
                    Some(&DEFAULT_TEMPERATURE.to_string()),
                    is_prod,
                )?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            },
        };

        config.validate(is_prod)?;
        Ok(config)
    }

    fn validate(&self, is_prod: bool) -> Result<(), AppError> {
        if self.upstream.api_key.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "OPENROUTER_API_KEY must not be empty"
            )));
        }
        if self.generation.default_max_tokens > self.generation.max_tokens_limit {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RELAY_MAX_TOKENS_DEFAULT ({}) exceeds RELAY_MAX_TOKENS_LIMIT ({})",
                self.generation.default_max_tokens,
                self.generation.max_tokens_limit
            )));
        }
        if is_prod && self.security.allowed_origins.iter().any(|o| o == "*") {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }
        Ok(())
    }
}

/// Look up a numeric env value; a malformed value is a hard error, not
/// a silent fallback to the default.
fn get_env_parsed<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(key, default, is_prod)?;
    raw.parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
