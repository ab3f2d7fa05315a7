use std::time::Instant;

use crate::config::TokenBucketConfig;

/// A single-key token bucket. `tokens` is fractional so sub-second refills
/// accumulate correctly under a coarse polling interval.
pub struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(burst: u32, now: Instant) -> Self {
        Self {
            tokens: burst as f64,
            last_refill: now,
        }
    }

    fn refill(&mut self, config: &TokenBucketConfig, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * config.refill_rate_per_sec()).min(config.burst as f64);
        self.last_refill = now;
    }

    /// Attempts to take one token; returns whether the request is allowed.
    fn try_take(&mut self, config: &TokenBucketConfig, now: Instant) -> bool {
        self.refill(config, now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// One bucket family (Token, Authorize, or Register), keyed by remote IP
/// string. Guarded by a single mutex — reads and writes are O(1) and the
/// critical section is a HashMap lookup plus arithmetic, so contention is
/// not a concern at the request rates these buckets are meant to gate.
pub struct BucketFamily {
    config: TokenBucketConfig,
    buckets: std::sync::Mutex<std::collections::HashMap<String, Bucket>>,
}

impl BucketFamily {
    pub fn new(config: TokenBucketConfig) -> Self {
        Self {
            config,
            buckets: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().expect("bucket family mutex poisoned");
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(self.config.burst, now));
        bucket.try_take(&self.config, now)
    }

    /// Drops the whole table. Called periodically to bound memory; coarse
    /// but deliberate (§4.7) — a burst of traffic right after a reset gets
    /// a fresh allowance, which is an acceptable trade for not tracking
    /// per-IP last-seen times forever.
    pub fn reset(&self) {
        self.buckets
            .lock()
            .expect("bucket family mutex poisoned")
            .clear();
    }

    pub fn config(&self) -> TokenBucketConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(requests_per_minute: u32, burst: u32) -> TokenBucketConfig {
        TokenBucketConfig {
            requests_per_minute,
            burst,
        }
    }

    #[test]
    fn allows_up_to_burst_then_denies() {
        let family = BucketFamily::new(config(60, 3));
        assert!(family.check("1.2.3.4"));
        assert!(family.check("1.2.3.4"));
        assert!(family.check("1.2.3.4"));
        assert!(!family.check("1.2.3.4"));
    }

    #[test]
    fn distinct_keys_have_independent_buckets() {
        let family = BucketFamily::new(config(60, 1));
        assert!(family.check("1.1.1.1"));
        assert!(family.check("2.2.2.2"));
        assert!(!family.check("1.1.1.1"));
    }

    #[test]
    fn reset_clears_all_keys() {
        let family = BucketFamily::new(config(60, 1));
        assert!(family.check("1.1.1.1"));
        assert!(!family.check("1.1.1.1"));
        family.reset();
        assert!(family.check("1.1.1.1"));
    }
}
