use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration for the bus.
///
/// Includes broker routing behavior, client lifecycle timing and logging.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub client: ClientSettings,
    pub logging: LoggingSettings,
}

/// Broker routing behavior.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct BrokerSettings {
    /// Enqueue once per matching pattern instead of once per subscriber.
    /// A subscriber with overlapping patterns then sees the same envelope
    /// several times.
    pub deliver_per_pattern: bool,
}

/// Client lifecycle timing.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Upper bound `close()` waits for the dispatch loop before aborting it.
    pub close_timeout_ms: u64,
}

impl ClientSettings {
    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            close_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub with_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}

/// Partial configuration loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub broker: Option<PartialBrokerSettings>,
    pub client: Option<PartialClientSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub deliver_per_pattern: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PartialClientSettings {
    pub close_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
    pub with_target: Option<bool>,
}

impl PartialSettings {
    /// Merge over the defaults, field by field.
    pub fn merge_with_defaults(self) -> Settings {
        let default = Settings::default();

        Settings {
            broker: BrokerSettings {
                deliver_per_pattern: self
                    .broker
                    .as_ref()
                    .and_then(|b| b.deliver_per_pattern)
                    .unwrap_or(default.broker.deliver_per_pattern),
            },
            client: ClientSettings {
                close_timeout_ms: self
                    .client
                    .as_ref()
                    .and_then(|c| c.close_timeout_ms)
                    .unwrap_or(default.client.close_timeout_ms),
            },
            logging: LoggingSettings {
                level: self
                    .logging
                    .as_ref()
                    .and_then(|l| l.level.clone())
                    .unwrap_or(default.logging.level),
                with_target: self
                    .logging
                    .as_ref()
                    .and_then(|l| l.with_target)
                    .unwrap_or(default.logging.with_target),
            },
        }
    }
}
