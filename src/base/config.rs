//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc, time::Duration};

use config::{ConfigBuilder, builder::DefaultState};
use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};

use crate::interaction::rate_gate::CooldownScope;

use super::types::{Res, Vocabulary, WatchSet};

/// Default config file, used when no explicit path is given and it exists.
pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";

/// Default delay between poll cycles.
fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

/// Default number of events a response silences.
fn default_cooldown_cycles() -> u32 {
    100
}

/// Default delay before reconnecting after a dropped connection (none).
fn default_reconnect_delay() -> Duration {
    Duration::ZERO
}

/// Configuration for the react-bot application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The shared settings.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

/// Settings loaded from the config file and `REACT_BOT_*` environment variables.
#[serde_as]
#[derive(Deserialize, Clone)]
pub struct ConfigInner {
    /// Slack bot token (`SLACK_TOKEN`).
    pub slack_token: String,
    /// Slack app-level token used to open the Socket Mode connection (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Channels to react in (`WATCH_CHANNELS`), comma-separated or a list.
    #[serde(default)]
    pub watch_channels: WatchSet,
    /// Reaction names to choose from (`EMOJI_RESPONSES`), comma-separated or a list.
    pub emoji_responses: Vocabulary,
    /// Whether the process was asked to detach from its terminal (`DAEMON`).
    ///
    /// Detaching is left to the service manager, so only `false` is accepted.
    #[serde(default)]
    pub daemon: bool,
    /// Optional `tracing` filter directive, e.g. `react_bot=debug` (`LOG_FILTER`).
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Export spans over OTLP (`OTLP_ENABLED`).
    #[serde(default)]
    pub otlp_enabled: bool,
    /// Sleep between poll cycles (`POLL_INTERVAL_MS`).
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "poll_interval_ms", default = "default_poll_interval")]
    pub poll_interval: Duration,
    /// Value the cooldown counter is reset to after a response (`COOLDOWN_CYCLES`).
    #[serde(default = "default_cooldown_cycles")]
    pub cooldown_cycles: u32,
    /// Whether the cooldown is reset every poll or carried across polls (`COOLDOWN_SCOPE`).
    #[serde(default)]
    pub cooldown_scope: CooldownScope,
    /// Sleep before reconnecting after a dropped connection (`RECONNECT_DELAY_MS`).
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "reconnect_delay_ms", default = "default_reconnect_delay")]
    pub reconnect_delay: Duration,
}

// Tokens stay out of the logs.
impl std::fmt::Debug for ConfigInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigInner")
            .field("slack_token", &"<redacted>")
            .field("slack_app_token", &"<redacted>")
            .field("watch_channels", &self.watch_channels)
            .field("emoji_responses", &self.emoji_responses)
            .field("daemon", &self.daemon)
            .field("log_filter", &self.log_filter)
            .field("otlp_enabled", &self.otlp_enabled)
            .field("poll_interval", &self.poll_interval)
            .field("cooldown_cycles", &self.cooldown_cycles)
            .field("cooldown_scope", &self.cooldown_scope)
            .field("reconnect_delay", &self.reconnect_delay)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from the environment and a TOML file.
    ///
    /// Uses `explicit_path` when given, otherwise [`DEFAULT_CONFIG_PATH`] if it exists.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("REACT_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() {
            cfg = cfg.add_source(config::File::with_name(DEFAULT_CONFIG_PATH));
        }

        Self::build(cfg)
    }

    fn build(cfg: ConfigBuilder<DefaultState>) -> Res<Self> {
        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.slack_token.is_empty() || result.slack_app_token.is_empty() {
            return Err(anyhow::anyhow!("Both the Slack bot token and the Slack app token must be set."));
        }

        if result.daemon {
            return Err(anyhow::anyhow!("Daemon mode is not supported; run react-bot under a service manager instead."));
        }

        if result.poll_interval.is_zero() {
            return Err(anyhow::anyhow!("Poll interval must be greater than zero."));
        }

        if result.cooldown_cycles < 1 {
            return Err(anyhow::anyhow!("Cooldown cycles must be at least 1."));
        }

        Ok(result)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Res<Config> {
        Config::build(config::Config::builder().add_source(config::File::from_str(toml, config::FileFormat::Toml)))
    }

    #[test]
    fn test_parses_comma_separated_lists_with_defaults() {
        let config = parse(
            r#"
            slack_token = "xoxb-test"
            slack_app_token = "xapp-test"
            watch_channels = "C01, C02 ,"
            emoji_responses = "tada,  wave"
            "#,
        )
        .unwrap();

        assert_eq!(config.watch_channels.channels(), ["C01", "C02"]);
        assert_eq!(config.emoji_responses.payloads(), ["tada", "wave"]);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.cooldown_cycles, 100);
        assert_eq!(config.cooldown_scope, CooldownScope::Batch);
        assert_eq!(config.reconnect_delay, Duration::ZERO);
        assert!(!config.daemon);
    }

    #[test]
    fn test_parses_arrays_and_overrides() {
        let config = parse(
            r#"
            slack_token = "xoxb-test"
            slack_app_token = "xapp-test"
            watch_channels = ["C01"]
            emoji_responses = ["eyes"]
            poll_interval_ms = 250
            cooldown_cycles = 5
            cooldown_scope = "global"
            reconnect_delay_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.watch_channels.channels(), ["C01"]);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.cooldown_cycles, 5);
        assert_eq!(config.cooldown_scope, CooldownScope::Global);
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_empty_vocabulary_fails_startup() {
        let result = parse(
            r#"
            slack_token = "xoxb-test"
            slack_app_token = "xapp-test"
            watch_channels = "C01"
            emoji_responses = " , "
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_zero_poll_interval_fails() {
        let result = parse(
            r#"
            slack_token = "xoxb-test"
            slack_app_token = "xapp-test"
            emoji_responses = "tada"
            poll_interval_ms = 0
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_daemon_mode_is_rejected() {
        let result = parse(
            r#"
            slack_token = "xoxb-test"
            slack_app_token = "xapp-test"
            emoji_responses = "tada"
            daemon = true
            "#,
        );

        assert!(result.unwrap_err().to_string().contains("Daemon mode"));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let config = parse(
            r#"
            slack_token = "xoxb-secret"
            slack_app_token = "xapp-secret"
            emoji_responses = "tada"
            "#,
        )
        .unwrap();

        let debug = format!("{:?}", config);

        assert!(!debug.contains("secret"));
    }
}
