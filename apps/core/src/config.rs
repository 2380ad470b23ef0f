//! Runtime configuration for the collaborator-facing parts of the core.
//!
//! The rule engine itself needs no configuration; these settings cover the
//! remote model, the circuit breaker around it and the upload simulation.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use validator::Validate;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const ENV_API_URL: &str = "SEHHAMATE_LLM_URL";
pub const ENV_API_KEY: &str = "SEHHAMATE_LLM_API_KEY";
pub const ENV_MODEL: &str = "SEHHAMATE_LLM_MODEL";
pub const ENV_TEMPERATURE: &str = "SEHHAMATE_LLM_TEMPERATURE";
pub const ENV_TIMEOUT_SECS: &str = "SEHHAMATE_LLM_TIMEOUT_SECS";

/// Settings for the OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct RemoteModelConfig {
    #[validate(url)]
    pub api_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,
    /// Number of past chat turns forwarded with each request
    #[validate(range(max = 20))]
    pub history_window: usize,
}

impl Default for RemoteModelConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            request_timeout_secs: 30,
            history_window: 6,
        }
    }
}

impl RemoteModelConfig {
    /// Loads `.env` if present, then reads the `SEHHAMATE_LLM_*` variables.
    ///
    /// Unset variables keep their defaults; malformed ones are a config error.
    pub fn from_env() -> Result<Self, AppError> {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            api_url: env::var(ENV_API_URL).unwrap_or(defaults.api_url),
            api_key: env::var(ENV_API_KEY).ok().filter(|k| !k.trim().is_empty()),
            model: env::var(ENV_MODEL).unwrap_or(defaults.model),
            temperature: parse_var(ENV_TEMPERATURE, defaults.temperature)?,
            request_timeout_secs: parse_var(ENV_TIMEOUT_SECS, defaults.request_timeout_secs)?,
            history_window: defaults.history_window,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn endpoint(&self) -> Result<Url, AppError> {
        Ok(Url::parse(&self.api_url)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{} has invalid value '{}': {}", key, raw, e))),
        Err(_) => Ok(default),
    }
}

/// Failure window and cooldown for the remote-model circuit breaker.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BreakerConfig {
    #[validate(range(min = 1))]
    pub failure_threshold: usize,
    pub window_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            window_ms: 60_000,
            cooldown_ms: 30_000,
        }
    }
}

impl BreakerConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Timing of the simulated upload and analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DocumentPipelineConfig {
    /// Percent added per progress tick
    #[validate(range(min = 1, max = 100))]
    pub progress_step: u8,
    pub progress_interval_ms: u64,
    pub processing_delay_ms: u64,
}

impl Default for DocumentPipelineConfig {
    fn default() -> Self {
        Self {
            progress_step: 10,
            progress_interval_ms: 200,
            processing_delay_ms: 2_000,
        }
    }
}

impl DocumentPipelineConfig {
    /// No artificial delays; for tests and batch callers.
    pub fn immediate() -> Self {
        Self {
            progress_interval_ms: 0,
            processing_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 5] = [ENV_API_URL, ENV_API_KEY, ENV_MODEL, ENV_TEMPERATURE, ENV_TIMEOUT_SECS];

    /// Every config variable unset except the given overrides.
    fn env_with(
        overrides: &[(&'static str, &'static str)],
    ) -> Vec<(&'static str, Option<&'static str>)> {
        ALL_VARS
            .iter()
            .map(|key| {
                let value = overrides.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, value)
            })
            .collect()
    }

    #[test]
    fn test_defaults_when_env_is_empty() {
        temp_env::with_vars(env_with(&[]), || {
            let config = RemoteModelConfig::from_env().unwrap();
            assert_eq!(config.api_url, DEFAULT_API_URL);
            assert_eq!(config.model, DEFAULT_MODEL);
            assert_eq!(config.request_timeout(), Duration::from_secs(30));
            assert_eq!(config.history_window, 6);
            assert!(config.api_key.is_none());
        });
    }

    #[test]
    fn test_env_overrides() {
        let vars = env_with(&[
            (ENV_MODEL, "gpt-test"),
            (ENV_TEMPERATURE, "0.2"),
            (ENV_API_KEY, "sk-test"),
        ]);
        temp_env::with_vars(vars, || {
            let config = RemoteModelConfig::from_env().unwrap();
            assert_eq!(config.model, "gpt-test");
            assert!((config.temperature - 0.2).abs() < f32::EPSILON);
            assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        });
    }

    #[test]
    fn test_malformed_and_out_of_range_values() {
        temp_env::with_vars(env_with(&[(ENV_TIMEOUT_SECS, "soon")]), || {
            assert!(matches!(RemoteModelConfig::from_env(), Err(AppError::Config(_))));
        });

        temp_env::with_vars(env_with(&[(ENV_TEMPERATURE, "3.5")]), || {
            assert!(matches!(RemoteModelConfig::from_env(), Err(AppError::Config(_))));
        });
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let config = RemoteModelConfig {
            api_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(matches!(config.endpoint(), Err(AppError::Config(_))));
    }
}
