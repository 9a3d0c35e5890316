use std::time::Duration;

use crate::quiz::timer::DemoTiming;

const DEFAULT_DB_PATH: &str = "db.sqlite";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{var} must be a number of milliseconds, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("invalid demo timing: {0}")]
    InvalidTiming(&'static str),
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub chatgpt_api_key: String,
    pub db_path: String,
    pub demo_timing: DemoTiming,
}

impl BotConfig {
    /// Reads the configuration from the process environment. The Telegram
    /// token itself is picked up by `Bot::from_env` from `TELOXIDE_TOKEN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let chatgpt_api_key = lookup("CHATGPT_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("CHATGPT_API_KEY"))?;
        let db_path = lookup("BOT_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let millis = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| ConfigError::InvalidNumber { var, value }),
            }
        };

        let demo_timing = DemoTiming {
            tick: millis("DEMO_TICK_MS", DemoTiming::DEFAULT_TICK)?,
            answer_at: millis("DEMO_ANSWER_AT_MS", DemoTiming::DEFAULT_ANSWER_AT)?,
            advance_at: millis("DEMO_ADVANCE_AT_MS", DemoTiming::DEFAULT_ADVANCE_AT)?,
            transition_delay: millis("DEMO_TRANSITION_MS", DemoTiming::DEFAULT_TRANSITION_DELAY)?,
        };
        if demo_timing.tick.is_zero() {
            return Err(ConfigError::InvalidTiming("tick must be positive"));
        }
        if demo_timing.answer_at >= demo_timing.advance_at {
            return Err(ConfigError::InvalidTiming(
                "answer must be revealed before the transition starts",
            ));
        }

        Ok(Self {
            chatgpt_api_key,
            db_path,
            demo_timing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("CHATGPT_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.db_path, "db.sqlite");
        assert_eq!(config.demo_timing, DemoTiming::default());
    }

    #[test]
    fn api_key_is_required() {
        assert!(matches!(
            config_from(&[]),
            Err(ConfigError::Missing("CHATGPT_API_KEY"))
        ));
        assert!(matches!(
            config_from(&[("CHATGPT_API_KEY", "  ")]),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn timing_overrides() {
        let config = config_from(&[
            ("CHATGPT_API_KEY", "sk-test"),
            ("BOT_DB_PATH", "/tmp/bot.sqlite"),
            ("DEMO_TICK_MS", "250"),
            ("DEMO_ANSWER_AT_MS", "3000"),
        ])
        .unwrap();
        assert_eq!(config.db_path, "/tmp/bot.sqlite");
        assert_eq!(config.demo_timing.tick, Duration::from_millis(250));
        assert_eq!(config.demo_timing.answer_at, Duration::from_millis(3000));
        assert_eq!(config.demo_timing.advance_at, DemoTiming::DEFAULT_ADVANCE_AT);
    }

    #[test]
    fn rejects_bad_timing() {
        assert!(matches!(
            config_from(&[("CHATGPT_API_KEY", "k"), ("DEMO_TICK_MS", "fast")]),
            Err(ConfigError::InvalidNumber { var: "DEMO_TICK_MS", .. })
        ));
        assert!(matches!(
            config_from(&[("CHATGPT_API_KEY", "k"), ("DEMO_TICK_MS", "0")]),
            Err(ConfigError::InvalidTiming(_))
        ));
        assert!(matches!(
            config_from(&[("CHATGPT_API_KEY", "k"), ("DEMO_ANSWER_AT_MS", "9000")]),
            Err(ConfigError::InvalidTiming(_))
        ));
    }
}
