use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Process-wide configuration, read once from the environment at startup
/// and threaded through component construction.
#[derive(Clone)]
pub struct Config {
    /// Gemini API credential (required).
    pub api_key: String,
    /// Upstream Gemini endpoint. Overridable for tests via GEMINI_BASE_URL.
    pub base_url: String,
    /// Aggregator endpoint the console client posts to (API_URL).
    pub api_url: Option<String>,
    /// Model identifier used for all four personas.
    pub model: String,
    /// Timeout in seconds, applied per upstream call on the server and
    /// end-to-end on the console client.
    pub timeout: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Search grounding for the Honesty Agent, resolved once at startup.
    pub enable_search: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the credential
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("enable_search", &self.enable_search)
            .finish()
    }
}

impl Config {
    /// Load configuration from the environment. Fails fast when the
    /// required credential is missing or a value is out of range.
    pub fn load() -> Result<Self> {
        let api_key =
            env::var("API_KEY").context("API_KEY environment variable is not set")?;

        let config = Self {
            api_key,
            base_url: env_or("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            api_url: env::var("API_URL").ok().filter(|v| !v.trim().is_empty()),
            model: env_or("GEMINI_MODEL", DEFAULT_MODEL),
            timeout: env_parse("REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            max_tokens: env_parse("MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            temperature: env_parse("TEMPERATURE", DEFAULT_TEMPERATURE)?,
            enable_search: env_parse("ENABLE_SEARCH", true)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("API_KEY must not be empty");
        }
        if self.base_url.trim().is_empty() {
            bail!("base URL must not be empty");
        }
        if self.timeout == 0 {
            bail!("request timeout must be greater than zero");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            bail!("temperature must be within [0.0, 2.0]");
        }
        Ok(())
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {}", name, e)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            api_key: "test-key".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_url: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            enable_search: true,
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_api_key() {
        let mut config = valid_config();
        config.api_key = "   ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("API_KEY"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = valid_config();
        config.timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_temperature() {
        let mut config = valid_config();
        config.temperature = 2.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_credential() {
        let rendered = format!("{:?}", valid_config());
        assert!(!rendered.contains("test-key"));
    }
}
