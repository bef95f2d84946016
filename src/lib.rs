//! Renderbox - resilient execution engine for generative media jobs
//!
//! Wraps an upstream generation service with exponential-backoff retries,
//! drives long-running video renders through a create/poll/fetch protocol,
//! and fans batches of sources across a bounded worker pool with per-item
//! failure isolation.

pub mod batch;
pub mod config;
pub mod humanize;
pub mod observability;
pub mod pipeline;
pub mod retry;
pub mod service;
pub mod video;
