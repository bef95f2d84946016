use std::future::Future;

use tracing::{debug, warn};

use super::classify::ErrorClass;
use super::policy::RetryPolicy;

/// Run `operation` until it succeeds, fails fatally, or exhausts the
/// policy's retry budget.
///
/// Attempts are strictly sequential. A success on any attempt returns
/// immediately with no further delay. On final failure the original
/// error is returned unwrapped, so callers see the upstream message
/// rather than a retry-layer envelope.
pub async fn execute<T, E, F, Fut>(mut operation: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(attempts = attempt + 1, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                if policy.classify(&err) == ErrorClass::Fatal {
                    return Err(err);
                }

                if attempt >= policy.max_retries {
                    warn!(
                        attempts = attempt + 1,
                        error = %err,
                        "retries exhausted"
                    );
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                policy.notify_retry(attempt + 1, &err, delay);
                warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "operation failed, retrying"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
