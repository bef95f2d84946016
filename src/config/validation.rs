use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("batch concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("video poll_interval must be positive")]
    ZeroPollInterval,

    #[error("retry preset '{preset}' has backoff_multiplier {value}, expected >= 1.0")]
    MultiplierBelowOne { preset: String, value: f64 },

    #[error("retry preset '{preset}' has a zero initial_delay")]
    ZeroInitialDelay { preset: String },

    #[error("retry preset '{preset}' has a zero max_delay")]
    ZeroMaxDelay { preset: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.batch.concurrency == 0 {
        return Err(ValidationError::ZeroConcurrency);
    }
    if config.video.poll_interval.as_millis() == 0 {
        return Err(ValidationError::ZeroPollInterval);
    }

    let presets = [
        ("fast", &config.retry.fast),
        ("standard", &config.retry.standard),
        ("aggressive", &config.retry.aggressive),
        ("gentle", &config.retry.gentle),
    ];

    for (name, preset) in presets {
        if preset.backoff_multiplier < 1.0 {
            return Err(ValidationError::MultiplierBelowOne {
                preset: name.to_string(),
                value: preset.backoff_multiplier,
            });
        }
        if preset.initial_delay.as_millis() == 0 {
            return Err(ValidationError::ZeroInitialDelay {
                preset: name.to_string(),
            });
        }
        if preset.max_delay.as_millis() == 0 {
            return Err(ValidationError::ZeroMaxDelay {
                preset: name.to_string(),
            });
        }
    }

    Ok(())
}
