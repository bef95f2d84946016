use serde::{Deserialize, Serialize};

use crate::batch::DEFAULT_CONCURRENCY;
use crate::humanize::DurationMs;
use crate::retry::RetryPolicy;
use crate::video::PollSettings;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub retry: RetryPresets,
}

impl Config {
    /// Poll settings for video jobs, built from the configured presets.
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            poll_interval: self.video.poll_interval.as_duration(),
            start_policy: self.retry.gentle.to_policy(),
            poll_policy: self.retry.fast.to_policy(),
            fetch_policy: self.retry.standard.to_policy(),
        }
    }
}

/// Batch processor configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

/// Video polling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: DurationMs,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> DurationMs {
    DurationMs(5_000)
}

/// The four named retry presets, each overridable per section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryPresets {
    #[serde(default = "RetryPresetConfig::fast")]
    pub fast: RetryPresetConfig,
    #[serde(default = "RetryPresetConfig::standard")]
    pub standard: RetryPresetConfig,
    #[serde(default = "RetryPresetConfig::aggressive")]
    pub aggressive: RetryPresetConfig,
    #[serde(default = "RetryPresetConfig::gentle")]
    pub gentle: RetryPresetConfig,
}

impl Default for RetryPresets {
    fn default() -> Self {
        Self {
            fast: RetryPresetConfig::fast(),
            standard: RetryPresetConfig::standard(),
            aggressive: RetryPresetConfig::aggressive(),
            gentle: RetryPresetConfig::gentle(),
        }
    }
}

/// One retry preset as it appears in configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryPresetConfig {
    pub max_retries: u32,
    pub initial_delay: DurationMs,
    pub max_delay: DurationMs,
    pub backoff_multiplier: f64,
}

impl RetryPresetConfig {
    pub fn fast() -> Self {
        Self::from_policy(&RetryPolicy::fast())
    }

    pub fn standard() -> Self {
        Self::from_policy(&RetryPolicy::standard())
    }

    pub fn aggressive() -> Self {
        Self::from_policy(&RetryPolicy::aggressive())
    }

    pub fn gentle() -> Self {
        Self::from_policy(&RetryPolicy::gentle())
    }

    fn from_policy(policy: &RetryPolicy) -> Self {
        Self {
            max_retries: policy.max_retries,
            initial_delay: policy.initial_delay.into(),
            max_delay: policy.max_delay.into(),
            backoff_multiplier: policy.backoff_multiplier,
        }
    }

    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.initial_delay.as_duration(),
            self.max_delay.as_duration(),
            self.backoff_multiplier,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults_mirror_builtin_presets() {
        let config = Config::default();

        assert_eq!(config.batch.concurrency, 4);
        assert_eq!(config.video.poll_interval, DurationMs(5_000));
        assert_eq!(config.retry.fast.max_retries, 2);
        assert_eq!(config.retry.gentle.initial_delay, DurationMs(2_000));

        let policy = config.retry.standard.to_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
    }

    #[test]
    fn test_poll_settings_wire_the_right_presets() {
        let mut config = Config::default();
        config.video.poll_interval = DurationMs(1_000);
        config.retry.gentle.max_retries = 9;

        let settings = config.poll_settings();
        assert_eq!(settings.poll_interval, Duration::from_secs(1));
        assert_eq!(settings.start_policy.max_retries, 9);
        assert_eq!(settings.poll_policy.max_retries, 2);
    }
}
