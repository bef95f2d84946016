//! Generation service seam
//!
//! Abstracts the upstream generative service behind a capability trait so
//! the retry, polling, and batch layers never see vendor-specific types.
//! Errors cross this boundary as opaque messages; classification happens
//! in the retry layer by text heuristic (or a caller-supplied classifier).

pub mod http;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("no artifact found in response: {0}")]
    EmptyResponse(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Encoded input payload, supplied by the caller and read-only here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePayload {
    pub data: Bytes,
    pub media_type: String,
}

impl SourcePayload {
    pub fn new(data: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
        }
    }
}

/// One produced output (image bytes, rendered text, video blob).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Which variant slot produced this artifact (e.g. "studio").
    pub variant: String,
    pub media_type: String,
    pub data: Bytes,
}

impl Artifact {
    pub fn new(
        variant: impl Into<String>,
        media_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            variant: variant.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}

/// Opaque handle for a long-running generation job.
///
/// Returned by the start call and replaced wholesale by every poll
/// response; the handle itself is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub id: String,
    pub done: bool,
    /// Present only once the job finished successfully.
    pub result_locator: Option<String>,
}

impl OperationHandle {
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            done: false,
            result_locator: None,
        }
    }

    pub fn finished(id: impl Into<String>, result_locator: Option<String>) -> Self {
        Self {
            id: id.into(),
            done: true,
            result_locator,
        }
    }
}

/// Output shape for video generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9
    #[serde(rename = "16:9")]
    Wide,
    /// 9:16
    #[serde(rename = "9:16")]
    Tall,
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AspectRatio::Wide => write!(f, "16:9"),
            AspectRatio::Tall => write!(f, "9:16"),
        }
    }
}

/// Capability set consumed by the pipeline and video layers.
///
/// Implementations wrap a concrete provider; each call may fail with a
/// generic [`ServiceError`] whose message carries whatever detail the
/// provider surfaced.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Produce one image variant of the source according to `instruction`.
    async fn generate_image_variant(
        &self,
        source: &SourcePayload,
        instruction: &str,
    ) -> Result<Artifact>;

    /// Produce a text artifact (e.g. marketing copy) from the source.
    async fn generate_text_artifact(
        &self,
        source: &SourcePayload,
        instruction: &str,
    ) -> Result<Artifact>;

    /// Kick off an asynchronous video render, returning a pollable handle.
    async fn start_video_job(
        &self,
        source: &SourcePayload,
        instruction: &str,
        aspect: AspectRatio,
    ) -> Result<OperationHandle>;

    /// Check job status; the returned handle replaces the previous one.
    async fn poll_video_job(&self, handle: &OperationHandle) -> Result<OperationHandle>;

    /// Download the finished artifact from its result locator.
    async fn fetch_video_artifact(&self, locator: &str) -> Result<Bytes>;
}
