use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use super::classify::{ErrorClass, default_classify};

type DynError = dyn std::error::Error + Send + Sync + 'static;

type ClassifyFn = dyn Fn(&DynError) -> ErrorClass + Send + Sync;
type OnRetryFn = dyn Fn(u32, &DynError, Duration) + Send + Sync;

/// Immutable retry configuration, reused across many invocations.
///
/// Carries no per-call state; a single policy may drive any number of
/// concurrent [`execute`](super::execute) calls.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Growth factor per attempt, expected >= 1.0.
    pub backoff_multiplier: f64,
    classifier: Arc<ClassifyFn>,
    on_retry: Option<Arc<OnRetryFn>>,
}

impl RetryPolicy {
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_multiplier,
            classifier: Arc::new(default_classify),
            on_retry: None,
        }
    }

    /// Fast retries for quick operations (e.g. status polls).
    pub fn fast() -> Self {
        Self::new(2, Duration::from_millis(500), Duration::from_secs(2), 1.5)
    }

    /// Standard retries for most service calls.
    pub fn standard() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(10), 2.0)
    }

    /// Aggressive retries for critical operations.
    pub fn aggressive() -> Self {
        Self::new(5, Duration::from_secs(1), Duration::from_secs(30), 2.5)
    }

    /// Gentle retries for rate-limited creation endpoints.
    pub fn gentle() -> Self {
        Self::new(3, Duration::from_secs(2), Duration::from_secs(15), 2.0)
    }

    /// Replace the default text-heuristic classifier.
    pub fn with_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&DynError) -> ErrorClass + Send + Sync + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Observer invoked with `(attempt, error, delay)` before each wait.
    pub fn with_on_retry<F>(mut self, on_retry: F) -> Self
    where
        F: Fn(u32, &DynError, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(on_retry));
        self
    }

    pub fn classify(&self, err: &DynError) -> ErrorClass {
        (self.classifier)(err)
    }

    pub(crate) fn notify_retry(&self, attempt: u32, err: &DynError, delay: Duration) {
        if let Some(on_retry) = &self.on_retry {
            on_retry(attempt, err, delay);
        }
    }

    /// Capped exponential delay for the given attempt, before jitter.
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let exponential =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(exponential.min(self.max_delay.as_secs_f64()))
    }

    /// Delay to wait after the given attempt, with jitter drawn uniformly
    /// from [0.5, 1.5) to avoid synchronized retry storms.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter: f64 = rand::thread_rng().gen_range(0.5..1.5);
        Duration::from_secs_f64(self.backoff_ceiling(attempt).as_secs_f64() * jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("custom_on_retry", &self.on_retry.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_values() {
        let fast = RetryPolicy::fast();
        assert_eq!(fast.max_retries, 2);
        assert_eq!(fast.initial_delay, Duration::from_millis(500));
        assert_eq!(fast.max_delay, Duration::from_secs(2));

        let gentle = RetryPolicy::gentle();
        assert_eq!(gentle.max_retries, 3);
        assert_eq!(gentle.initial_delay, Duration::from_secs(2));

        let standard = RetryPolicy::default();
        assert_eq!(standard.max_retries, 3);
        assert_eq!(standard.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_backoff_ceiling_grows_exponentially_and_caps() {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(100),
            Duration::from_secs(1),
            2.0,
        );

        assert_eq!(policy.backoff_ceiling(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_ceiling(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_ceiling(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_ceiling(3), Duration::from_millis(800));
        // 1600ms would exceed the cap
        assert_eq!(policy.backoff_ceiling(4), Duration::from_secs(1));
    }

    #[test]
    fn test_jittered_delay_stays_in_bounds() {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(100),
            Duration::from_secs(1),
            2.0,
        );

        for attempt in 0..5 {
            let ceiling = policy.backoff_ceiling(attempt).as_secs_f64();
            for _ in 0..200 {
                let delay = policy.delay_for(attempt).as_secs_f64();
                assert!(delay >= ceiling * 0.5, "delay {delay} below jitter floor");
                assert!(delay <= ceiling * 1.5, "delay {delay} above jitter ceiling");
                assert!(delay > 0.0);
            }
        }
    }
}
