//! Connection establishment: resolved targets and the bounded retry loop.
//!
//! Backends (PostgreSQL, Redis) supply their own connect-and-probe future;
//! this module owns the attempt counting, backoff, timeouts and the
//! redacted per-attempt diagnostics.

pub mod retry;
pub mod target;

pub use retry::{AttemptError, Establishment, RetryPolicy, establish};
pub use target::{CacheTarget, DatabaseTarget, DiscreteTarget, redact_url};
