//! Error classification for retry decisions
//!
//! Classification is text-based because upstream services surface errors
//! as opaque messages. The heuristic lives behind the
//! [`RetryPolicy`](super::RetryPolicy) classifier hook so callers with
//! structured transport errors can swap in a status-code check instead.

/// Whether an error is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient failure, eligible for automatic re-attempt.
    Retryable,
    /// Permanent failure, propagated without retry.
    Fatal,
}

/// Message fragments that indicate a transient failure.
const RETRYABLE_PATTERNS: &[&str] = &[
    // Network failures
    "network",
    "timeout",
    "fetch failed",
    "failed to fetch",
    // Rate limiting
    "rate limit",
    "too many requests",
    "429",
    // Server-side errors
    "500",
    "502",
    "503",
    "504",
    "internal server error",
    "service unavailable",
    // Temporary conditions
    "temporarily unavailable",
    "try again",
];

/// Default classifier applied when a policy carries no custom one.
///
/// Anything that does not match a known transient signature is treated
/// as fatal, including client errors (4xx other than 429) and unknown
/// messages. Failing closed here keeps a misbehaving endpoint from
/// being hammered with pointless retries.
pub fn default_classify(err: &(dyn std::error::Error + Send + Sync + 'static)) -> ErrorClass {
    let message = err.to_string().to_lowercase();

    if RETRYABLE_PATTERNS.iter().any(|p| message.contains(p)) {
        ErrorClass::Retryable
    } else {
        ErrorClass::Fatal
    }
}
