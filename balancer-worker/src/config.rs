use std::str::FromStr;
use std::time::Duration;

use envconfig::Envconfig;

/// A string that must be non-empty once trimmed, enforced as early as config parsing rather than
/// deferred to [`balancer_core::BalancerConfig::new`]'s own precondition check.
#[derive(Debug, Clone)]
pub struct NonEmptyString(pub String);

impl FromStr for NonEmptyString {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("value must not be empty".to_owned());
        }
        Ok(NonEmptyString(s.to_owned()))
    }
}

/// A duration expressed in the environment as whole milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub Duration);

impl FromStr for EnvMsDuration {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let millis: u64 = s.parse()?;
        Ok(EnvMsDuration(Duration::from_millis(millis)))
    }
}

#[derive(Envconfig, Debug, Clone)]
pub struct WorkerConfig {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub bind_host: String,

    #[envconfig(from = "BIND_PORT", default = "3000")]
    pub bind_port: u16,

    #[envconfig(from = "OWNER_ID")]
    pub owner_id: NonEmptyString,

    #[envconfig(from = "NAMESPACE")]
    pub namespace: NonEmptyString,

    #[envconfig(from = "HUB")]
    pub hub: NonEmptyString,

    #[envconfig(from = "CONSUMER_GROUP")]
    pub consumer_group: NonEmptyString,

    #[envconfig(from = "EXPIRATION_WINDOW_MS", default = "30000")]
    pub expiration_window: EnvMsDuration,

    #[envconfig(from = "TICK_INTERVAL_MS", default = "10000")]
    pub tick_interval: EnvMsDuration,

    #[envconfig(from = "PARTITION_COUNT")]
    pub partition_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_string_rejects_blank_input() {
        assert!("   ".parse::<NonEmptyString>().is_err());
        assert!("owner-1".parse::<NonEmptyString>().is_ok());
    }

    #[test]
    fn env_ms_duration_parses_milliseconds() {
        let parsed: EnvMsDuration = "1500".parse().unwrap();
        assert_eq!(parsed.0, Duration::from_millis(1500));
    }
}
