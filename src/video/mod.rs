//! Long-running operation driver for video generation
//!
//! Video renders do not finish synchronously: the start call returns a
//! handle, status is polled on a fixed interval, and the finished
//! artifact is fetched from the locator the final poll reports. Each of
//! the three stages runs through the retry executor under its own
//! policy. The polling loop is unbounded by contract — the job itself
//! may take arbitrarily long, and an overall cutoff is the caller's (or
//! the platform's) concern.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

use crate::retry::{self, RetryPolicy};
use crate::service::{AspectRatio, GenerationService, OperationHandle, ServiceError, SourcePayload};

#[derive(Debug, Error)]
pub enum VideoError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("operation completed without a result locator")]
    MissingResult,
}

pub type Result<T> = std::result::Result<T, VideoError>;

/// Per-stage retry policies and the poll interval.
///
/// The start call gets a gentle policy (creation endpoints are the ones
/// that rate-limit), polls get a fast policy (failures there are cheap
/// and transient), and the artifact fetch gets the standard policy.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub start_policy: RetryPolicy,
    pub poll_policy: RetryPolicy,
    pub fetch_policy: RetryPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            start_policy: RetryPolicy::gentle(),
            poll_policy: RetryPolicy::fast(),
            fetch_policy: RetryPolicy::standard(),
        }
    }
}

/// Drive a create→poll→fetch protocol to completion.
///
/// `start` is invoked once (plus retries), then `poll` replaces the
/// handle after every interval until it reports done, then `fetch`
/// retrieves the artifact from the result locator. A done handle with
/// no locator is a fatal [`VideoError::MissingResult`].
pub async fn run_to_completion<T, S, SFut, P, PFut, F, FFut>(
    mut start: S,
    poll: P,
    fetch: F,
    settings: &PollSettings,
) -> Result<T>
where
    S: FnMut() -> SFut,
    SFut: Future<Output = std::result::Result<OperationHandle, ServiceError>>,
    P: Fn(OperationHandle) -> PFut,
    PFut: Future<Output = std::result::Result<OperationHandle, ServiceError>>,
    F: Fn(String) -> FFut,
    FFut: Future<Output = std::result::Result<T, ServiceError>>,
{
    let mut handle = retry::execute(&mut start, &settings.start_policy).await?;
    debug!(operation = %handle.id, "video job started");

    let mut polls: u32 = 0;
    while !handle.done {
        tokio::time::sleep(settings.poll_interval).await;

        let current = handle.clone();
        handle = retry::execute(|| poll(current.clone()), &settings.poll_policy).await?;
        polls += 1;
        debug!(operation = %handle.id, polls, done = handle.done, "poll cycle");
    }

    let locator = handle
        .result_locator
        .clone()
        .filter(|l| !l.is_empty())
        .ok_or(VideoError::MissingResult)?;

    info!(operation = %handle.id, polls, "video job done, fetching artifact");

    let artifact = retry::execute(|| fetch(locator.clone()), &settings.fetch_policy).await?;
    Ok(artifact)
}

/// Convenience wrapper: run a full video generation against a
/// [`GenerationService`].
pub async fn generate_video<S>(
    service: Arc<S>,
    source: &SourcePayload,
    instruction: &str,
    aspect: AspectRatio,
    settings: &PollSettings,
) -> Result<Bytes>
where
    S: GenerationService + ?Sized,
{
    run_to_completion(
        || service.start_video_job(source, instruction, aspect),
        |handle| {
            let service = service.clone();
            async move { service.poll_video_job(&handle).await }
        },
        |locator| {
            let service = service.clone();
            async move { service.fetch_video_artifact(&locator).await }
        },
        settings,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_settings() -> PollSettings {
        PollSettings {
            poll_interval: Duration::from_secs(5),
            start_policy: RetryPolicy::new(
                0,
                Duration::from_millis(10),
                Duration::from_millis(100),
                2.0,
            ),
            poll_policy: RetryPolicy::fast(),
            fetch_policy: RetryPolicy::standard(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_done_then_fetches() {
        let polls = AtomicU32::new(0);
        let began = tokio::time::Instant::now();

        let artifact = run_to_completion(
            || async { Ok(OperationHandle::pending("op-1")) },
            |handle| {
                let n = polls.fetch_add(1, Ordering::SeqCst);
                async move {
                    // Two pending polls, then done with a locator.
                    if n < 2 {
                        Ok(handle)
                    } else {
                        Ok(OperationHandle::finished("op-1", Some("loc://video".into())))
                    }
                }
            },
            |locator| async move {
                assert_eq!(locator, "loc://video");
                Ok(Bytes::from_static(b"mp4"))
            },
            &quick_settings(),
        )
        .await
        .unwrap();

        assert_eq!(artifact, Bytes::from_static(b"mp4"));
        assert_eq!(polls.load(Ordering::SeqCst), 3);
        // Three poll cycles means three interval waits.
        assert!(began.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_without_locator_is_an_error() {
        let fetched = AtomicU32::new(0);

        let result: Result<Bytes> = run_to_completion(
            || async { Ok(OperationHandle::finished("op-2", None)) },
            |handle| async move { Ok(handle) },
            |_locator| {
                fetched.fetch_add(1, Ordering::SeqCst);
                async { Ok(Bytes::new()) }
            },
            &quick_settings(),
        )
        .await;

        assert!(matches!(result, Err(VideoError::MissingResult)));
        // fetch must never run without a locator
        assert_eq!(fetched.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_start_error_propagates() {
        let result: Result<Bytes> = run_to_completion(
            || async { Err(ServiceError::Request("400 Bad Request".into())) },
            |handle| async move { Ok(handle) },
            |_locator| async { Ok(Bytes::new()) },
            &quick_settings(),
        )
        .await;

        match result {
            Err(VideoError::Service(err)) => {
                assert!(err.to_string().contains("400 Bad Request"));
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_poll_failures_are_retried() {
        let poll_calls = AtomicU32::new(0);

        let artifact = run_to_completion(
            || async { Ok(OperationHandle::pending("op-3")) },
            |_handle| {
                let n = poll_calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(ServiceError::Request("503 Service Unavailable".into()))
                    } else {
                        Ok(OperationHandle::finished("op-3", Some("loc://v".into())))
                    }
                }
            },
            |_locator| async { Ok(Bytes::from_static(b"ok")) },
            &quick_settings(),
        )
        .await
        .unwrap();

        assert_eq!(artifact, Bytes::from_static(b"ok"));
        assert_eq!(poll_calls.load(Ordering::SeqCst), 2);
    }
}
