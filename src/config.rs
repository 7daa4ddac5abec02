use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
///
/// The provider credentials are deliberately optional here: the original
/// servers report a missing key to the connecting client as a session error
/// rather than refusing to boot, and this crate keeps that behavior.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub deepgram_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub prompt_model: String,
    pub think_model: String,
    pub greeting: String,
    pub keepalive_interval: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let deepgram_key = std::env::var("DEEPGRAM_KEY").ok();
        let groq_api_key = std::env::var("GROQ_API_KEY").ok();

        let prompt_model =
            std::env::var("PROMPT_MODEL").unwrap_or_else(|_| "openai/gpt-oss-120b".to_string());
        let think_model =
            std::env::var("THINK_MODEL").unwrap_or_else(|_| "openai/gpt-oss-20b".to_string());
        let greeting = std::env::var("GREETING")
            .unwrap_or_else(|_| "Hello, welcome to your interview.".to_string());

        let keepalive_secs_str =
            std::env::var("KEEPALIVE_SECS").unwrap_or_else(|_| "5".to_string());
        let keepalive_secs = keepalive_secs_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "KEEPALIVE_SECS".to_string(),
                format!("'{}' is not a valid number of seconds", keepalive_secs_str),
            )
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            deepgram_key,
            groq_api_key,
            prompt_model,
            think_model,
            greeting,
            keepalive_interval: Duration::from_secs(keepalive_secs),
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("DEEPGRAM_KEY");
            env::remove_var("GROQ_API_KEY");
            env::remove_var("PROMPT_MODEL");
            env::remove_var("THINK_MODEL");
            env::remove_var("GREETING");
            env::remove_var("KEEPALIVE_SECS");
            env::remove_var("RUST_LOG");
        }
    }

    #[test]
    fn test_config_error_display() {
        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3001");
        assert_eq!(config.deepgram_key, None);
        assert_eq!(config.groq_api_key, None);
        assert_eq!(config.prompt_model, "openai/gpt-oss-120b");
        assert_eq!(config.think_model, "openai/gpt-oss-20b");
        assert_eq!(config.greeting, "Hello, welcome to your interview.");
        assert_eq!(config.keepalive_interval, Duration::from_secs(5));
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("DEEPGRAM_KEY", "dg-test-key");
            env::set_var("GROQ_API_KEY", "groq-test-key");
            env::set_var("PROMPT_MODEL", "llama-3.3-70b-versatile");
            env::set_var("THINK_MODEL", "llama-3.1-8b-instant");
            env::set_var("GREETING", "Welcome aboard.");
            env::set_var("KEEPALIVE_SECS", "10");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.deepgram_key, Some("dg-test-key".to_string()));
        assert_eq!(config.groq_api_key, Some("groq-test-key".to_string()));
        assert_eq!(config.prompt_model, "llama-3.3-70b-versatile");
        assert_eq!(config.think_model, "llama-3.1-8b-instant");
        assert_eq!(config.greeting, "Welcome aboard.");
        assert_eq!(config.keepalive_interval, Duration::from_secs(10));
        assert_eq!(config.log_level, Level::DEBUG);

        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
        }

        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_keepalive() {
        clear_env_vars();
        unsafe {
            env::set_var("KEEPALIVE_SECS", "soon");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "KEEPALIVE_SECS"),
        }

        clear_env_vars();
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
        }

        clear_env_vars();
    }
}
