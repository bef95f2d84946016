//! Retry with exponential backoff
//!
//! Wraps fallible async operations and re-invokes them on transient
//! failures with capped, jittered delays. Policies are plain value
//! objects passed at each call site; there is no process-wide default.

mod classify;
mod executor;
mod policy;

pub use classify::{ErrorClass, default_classify};
pub use executor::execute;
pub use policy::RetryPolicy;
