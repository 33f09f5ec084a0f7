use std::str::FromStr;
use std::time::Duration;

use teloxide::types::ChatId;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SESSION_MINUTES: i64 = 30;
pub const DEFAULT_FALLBACK_DELAY_SECS: u64 = 300;

/// Настройки процесса, читаются один раз при старте.
#[derive(Clone, Debug)]
pub struct BotConfig {
    pub telegram_token: String,
    pub operator_chat: ChatId,
    pub openai_api_key: String,
    pub provider_token: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub session_length: chrono::Duration,
    pub fallback_delay: Duration,
    pub strict_pre_checkout: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("OWNER_ID must be a numeric Telegram chat id, got {0:?}")]
    InvalidOperatorId(String),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Разбор конфигурации через произвольный источник переменных.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| value(name).ok_or(ConfigError::MissingEnvVar(name));

        let telegram_token = required("TELEGRAM_TOKEN")?;
        let raw_owner = required("OWNER_ID")?;
        let operator_chat = raw_owner
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| ConfigError::InvalidOperatorId(raw_owner.clone()))?;
        let openai_api_key = required("OPENAI_API_KEY")?;

        let session_minutes: i64 =
            parse_or(value("SESSION_MINUTES"), "SESSION_MINUTES", DEFAULT_SESSION_MINUTES)?;
        if session_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                name: "SESSION_MINUTES",
                value: session_minutes.to_string(),
            });
        }
        let fallback_secs: u64 = parse_or(
            value("FALLBACK_DELAY_SECS"),
            "FALLBACK_DELAY_SECS",
            DEFAULT_FALLBACK_DELAY_SECS,
        )?;
        let strict_pre_checkout: bool =
            parse_or(value("PRE_CHECKOUT_STRICT"), "PRE_CHECKOUT_STRICT", true)?;

        Ok(Self {
            telegram_token,
            operator_chat,
            openai_api_key,
            provider_token: value("STRIPE_TOKEN"),
            openai_model: value("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: value("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            session_length: chrono::Duration::minutes(session_minutes),
            fallback_delay: Duration::from_secs(fallback_secs),
            strict_pre_checkout,
        })
    }
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("TELEGRAM_TOKEN", "123:ABC"),
        ("OWNER_ID", "42"),
        ("OPENAI_API_KEY", "sk-test"),
    ];

    #[test]
    fn defaults_applied_when_optional_vars_absent() {
        let config = BotConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.operator_chat, ChatId(42));
        assert_eq!(config.openai_model, "gpt-3.5-turbo");
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.session_length, chrono::Duration::minutes(30));
        assert_eq!(config.fallback_delay, Duration::from_secs(300));
        assert!(config.strict_pre_checkout);
        assert!(config.provider_token.is_none());
    }

    #[test]
    fn missing_token_is_fatal() {
        let err = BotConfig::from_lookup(lookup(&REQUIRED[1..])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar("TELEGRAM_TOKEN")));
    }

    #[test]
    fn non_numeric_owner_id_is_fatal() {
        let mut vars = REQUIRED.to_vec();
        vars[1] = ("OWNER_ID", "@operator");
        let err = BotConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOperatorId(ref raw) if raw == "@operator"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[2] = ("OPENAI_API_KEY", "   ");
        let err = BotConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar("OPENAI_API_KEY")));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("STRIPE_TOKEN", "284685063:TEST:abc"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("SESSION_MINUTES", "45"),
            ("FALLBACK_DELAY_SECS", "10"),
            ("PRE_CHECKOUT_STRICT", "false"),
        ]);
        let config = BotConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.provider_token.as_deref(), Some("284685063:TEST:abc"));
        assert_eq!(config.openai_base_url, "http://localhost:8080/v1");
        assert_eq!(config.session_length, chrono::Duration::minutes(45));
        assert_eq!(config.fallback_delay, Duration::from_secs(10));
        assert!(!config.strict_pre_checkout);
    }

    #[test]
    fn malformed_delay_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("FALLBACK_DELAY_SECS", "five minutes"));
        let err = BotConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "FALLBACK_DELAY_SECS", .. }));
    }
}
