//! Per-caller-address rate limiting.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use thiserror::Error;
use tracing::debug;

use super::rate::RateLimit;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Idle callers are swept once every this many checks.
const SWEEP_INTERVAL: u64 = 1024;

/// A caller exceeded its budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Rate limit exceeded: {limit}")]
pub struct RateLimited {
    pub limit: String,
    /// Seconds until the next request would be admitted.
    pub retry_after: u64,
}

struct CallerSlot {
    limiter: DirectRateLimiter,
    /// Milliseconds since the limiter was created.
    last_seen: AtomicU64,
}

/// Limiter map keyed by caller address.
///
/// Each caller gets a full burst of `requests`, replenished evenly over the
/// period. Checking and consuming a cell is a single atomic step. A caller
/// silent for a whole period is back at a full burst, so its slot is dropped.
#[derive(Clone)]
pub struct CallerRateLimiter {
    limit: RateLimit,
    quota: Quota,
    started: Instant,
    checks: Arc<AtomicU64>,
    limiters: Arc<DashMap<IpAddr, Arc<CallerSlot>>>,
}

impl CallerRateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        let requests = limit.requests_nonzero();
        let quota = Quota::with_period(limit.period().duration() / requests.get())
            .unwrap_or_else(|| Quota::per_second(requests))
            .allow_burst(requests);

        Self {
            limit,
            quota,
            started: Instant::now(),
            checks: Arc::new(AtomicU64::new(0)),
            limiters: Arc::new(DashMap::new()),
        }
    }

    /// Admit or reject one request from `caller`.
    pub fn check(&self, caller: IpAddr) -> Result<(), RateLimited> {
        let now = self.elapsed_ms();
        let quota = self.quota;
        let slot = self
            .limiters
            .entry(caller)
            .or_insert_with(|| {
                Arc::new(CallerSlot {
                    limiter: RateLimiter::direct(quota),
                    last_seen: AtomicU64::new(now),
                })
            })
            .clone();
        slot.last_seen.store(now, Ordering::Relaxed);

        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep_at(now);
        }

        slot.limiter.check().map_err(|not_until| RateLimited {
            limit: self.limit.to_string(),
            retry_after: not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs()
                .max(1),
        })
    }

    /// Number of callers currently holding a slot.
    pub fn tracked_callers(&self) -> usize {
        self.limiters.len()
    }

    /// Drop the slots of callers idle for at least one period.
    pub fn sweep(&self) -> usize {
        self.sweep_at(self.elapsed_ms())
    }

    fn sweep_at(&self, now: u64) -> usize {
        let period = u64::try_from(self.limit.period().duration().as_millis()).unwrap_or(u64::MAX);
        let before = self.limiters.len();
        self.limiters
            .retain(|_, slot| now.saturating_sub(slot.last_seen.load(Ordering::Relaxed)) < period);
        let removed = before.saturating_sub(self.limiters.len());
        if removed > 0 {
            debug!("Dropped {} idle rate-limit slot(s)", removed);
        }
        removed
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_nth_passes_and_next_is_rejected() {
        let limiter = CallerRateLimiter::new("5/minute".parse().unwrap());
        for i in 1..=5 {
            assert!(limiter.check(addr(1)).is_ok(), "request {i} should pass");
        }
        let rejected = limiter.check(addr(1)).unwrap_err();
        assert_eq!(rejected.limit, "5/minute");
        assert!(rejected.retry_after >= 1);
    }

    #[test]
    fn test_callers_are_independent() {
        let limiter = CallerRateLimiter::new("1/hour".parse().unwrap());
        assert!(limiter.check(addr(1)).is_ok());
        assert!(limiter.check(addr(1)).is_err());
        assert!(limiter.check(addr(2)).is_ok());
    }

    #[test]
    fn test_clones_share_counters() {
        let limiter = CallerRateLimiter::new("2/minute".parse().unwrap());
        let other = limiter.clone();
        assert!(limiter.check(addr(3)).is_ok());
        assert!(other.check(addr(3)).is_ok());
        assert!(limiter.check(addr(3)).is_err());
    }

    #[test]
    fn test_idle_callers_are_swept() {
        let limiter = CallerRateLimiter::new("1/minute".parse().unwrap());
        assert!(limiter.check(addr(1)).is_ok());
        assert!(limiter.check(addr(2)).is_ok());
        assert_eq!(limiter.tracked_callers(), 2);

        // Both were seen just now.
        assert_eq!(limiter.sweep(), 0);

        let a_period_later = limiter.elapsed_ms() + 60_000;
        assert_eq!(limiter.sweep_at(a_period_later), 2);
        assert_eq!(limiter.tracked_callers(), 0);

        // A swept caller starts over with a full burst.
        assert!(limiter.check(addr(1)).is_ok());
    }
}
