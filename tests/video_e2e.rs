//! End-to-end video generation scenarios
//!
//! Exercises the create/poll/fetch protocol against a scripted service,
//! including transient failures at every stage.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use renderbox::config::Config;
use renderbox::service::{
    Artifact, AspectRatio, GenerationService, OperationHandle, ServiceError, SourcePayload,
};
use renderbox::video::{self, PollSettings, VideoError};

/// Scripted video backend: the start call fails `start_failures` times
/// with a rate-limit error, polls report pending until `polls_until_done`
/// checks have happened, then the job finishes with `locator`.
struct ScriptedVideoService {
    start_failures: u32,
    polls_until_done: u32,
    locator: Option<String>,
    start_calls: AtomicU32,
    poll_calls: AtomicU32,
    fetch_calls: AtomicU32,
}

impl ScriptedVideoService {
    fn new(start_failures: u32, polls_until_done: u32, locator: Option<&str>) -> Self {
        Self {
            start_failures,
            polls_until_done,
            locator: locator.map(String::from),
            start_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
            fetch_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl GenerationService for ScriptedVideoService {
    async fn generate_image_variant(
        &self,
        _source: &SourcePayload,
        _instruction: &str,
    ) -> Result<Artifact, ServiceError> {
        unimplemented!("video tests never generate image variants")
    }

    async fn generate_text_artifact(
        &self,
        _source: &SourcePayload,
        _instruction: &str,
    ) -> Result<Artifact, ServiceError> {
        unimplemented!("video tests never generate text artifacts")
    }

    async fn start_video_job(
        &self,
        _source: &SourcePayload,
        _instruction: &str,
        _aspect: AspectRatio,
    ) -> Result<OperationHandle, ServiceError> {
        let n = self.start_calls.fetch_add(1, Ordering::SeqCst);
        if n < self.start_failures {
            return Err(ServiceError::Request("429 Too Many Requests".into()));
        }
        Ok(OperationHandle::pending("op-video"))
    }

    async fn poll_video_job(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationHandle, ServiceError> {
        let n = self.poll_calls.fetch_add(1, Ordering::SeqCst);
        if n + 1 < self.polls_until_done {
            return Ok(handle.clone());
        }
        Ok(OperationHandle::finished(
            handle.id.clone(),
            self.locator.clone(),
        ))
    }

    async fn fetch_video_artifact(&self, locator: &str) -> Result<Bytes, ServiceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(locator, "loc://render/op-video");
        Ok(Bytes::from_static(b"mp4-bytes"))
    }
}

fn source() -> SourcePayload {
    SourcePayload::new(&b"frame"[..], "image/png")
}

#[tokio::test(start_paused = true)]
async fn test_generate_video_end_to_end() {
    // Start succeeds immediately; two polls report pending, the third is
    // done; the artifact is fetched exactly once.
    let service = Arc::new(ScriptedVideoService::new(0, 3, Some("loc://render/op-video")));
    let began = tokio::time::Instant::now();

    let artifact = video::generate_video(
        service.clone(),
        &source(),
        "slow pan across the product",
        AspectRatio::Wide,
        &PollSettings::default(),
    )
    .await
    .unwrap();

    assert_eq!(artifact, Bytes::from_static(b"mp4-bytes"));
    assert_eq!(service.start_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.poll_calls.load(Ordering::SeqCst), 3);
    assert_eq!(service.fetch_calls.load(Ordering::SeqCst), 1);
    // One 5s wait per poll cycle.
    assert!(began.elapsed() >= Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_start_is_retried_gently() {
    let service = Arc::new(ScriptedVideoService::new(2, 1, Some("loc://render/op-video")));

    let artifact = video::generate_video(
        service.clone(),
        &source(),
        "orbit shot",
        AspectRatio::Tall,
        &PollSettings::default(),
    )
    .await
    .unwrap();

    assert_eq!(artifact, Bytes::from_static(b"mp4-bytes"));
    assert_eq!(service.start_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_done_job_without_locator_fails() {
    let service = Arc::new(ScriptedVideoService::new(0, 1, None));

    let result = video::generate_video(
        service.clone(),
        &source(),
        "orbit shot",
        AspectRatio::Wide,
        &PollSettings::default(),
    )
    .await;

    assert!(matches!(result, Err(VideoError::MissingResult)));
    assert_eq!(service.fetch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_poll_settings_from_config() {
    // The configured poll interval drives the wait between status checks.
    let mut config = Config::default();
    config.video.poll_interval = renderbox::humanize::DurationMs(1_000);

    let service = Arc::new(ScriptedVideoService::new(0, 2, Some("loc://render/op-video")));
    let began = tokio::time::Instant::now();

    video::generate_video(
        service.clone(),
        &source(),
        "dolly zoom",
        AspectRatio::Wide,
        &config.poll_settings(),
    )
    .await
    .unwrap();

    let elapsed = began.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(5));
}
