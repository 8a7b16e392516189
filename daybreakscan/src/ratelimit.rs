//! Caller-facing rate limit, applied before a scan's internal fan-out begins
//! (spec §5 "callers are rate-limited before fan-out begins"). This is a
//! separate gate from the daily quota in `quota.rs`: quota bounds how many
//! scans an identity gets per day, this bounds how fast requests may arrive
//! at all, protecting upstream providers from a caller-side burst before any
//! upstream call is even made.

use std::num::NonZeroU32;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

use crate::error::ScanError;

pub struct CallerRateLimiter {
    inner: DefaultDirectRateLimiter,
}

impl CallerRateLimiter {
    pub fn new(requests_per_sec: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(requests_per_sec.max(1)).unwrap());
        Self { inner: RateLimiter::direct(quota) }
    }

    pub fn check(&self) -> Result<(), ScanError> {
        self.inner.check().map_err(|_| ScanError::UpstreamRateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_burst_up_to_quota_then_rejects() {
        let limiter = CallerRateLimiter::new(2);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
