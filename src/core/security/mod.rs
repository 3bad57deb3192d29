//! Cross-cutting gate stages.
//!
//! Each stage has a standalone pass/reject contract so it can be tested in
//! isolation; the HTTP transport composes them into a middleware chain.
//!
//! - `credentials`: optional HTTP Basic check with constant-time comparison
//! - `rate`: rate string parsing (`"100/minute"`)
//! - `rate_limit`: per-caller-address limiter (http feature)

mod credentials;
mod rate;
#[cfg(feature = "http")]
mod rate_limit;

pub use credentials::{AuthRejection, verify_basic_auth};
pub use rate::{RateLimit, RateLimitParseError, RatePeriod};
#[cfg(feature = "http")]
pub use rate_limit::{CallerRateLimiter, RateLimited};
