use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use dashmap::DashMap;
use tokio::time::interval;
use tracing::debug;

// Bucket shared by every client that sends no forwarding header.
pub const FALLBACK_CLIENT_ID: &str = "anonymous";

// Rate limit entry - one counting window per client key
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: Instant,
    pub reset_unix_ms: i64,
}

impl RateLimitEntry {
    fn fresh(now: Instant, window: Duration) -> Self {
        Self {
            count: 0,
            reset_at: now + window,
            reset_unix_ms: chrono::Utc::now().timestamp_millis() + window.as_millis() as i64,
        }
    }
}

// Outcome of a limiter check. On denial, `remaining` is 0 and `retry_after`
// spans the rest of the active window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_unix_ms: i64,
    pub retry_after: Duration,
}

// Fixed-window counter keyed by client identifier. Not sliding: up to 2x
// the limit can land across a window boundary.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry::fresh(now, self.window));

        // window expired? start a new one
        if now > entry.reset_at {
            *entry = RateLimitEntry::fresh(now, self.window);
        }

        // over limit: deny without mutating; denials never extend the window
        if entry.count >= self.max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_unix_ms: entry.reset_unix_ms,
                retry_after: entry.reset_at.saturating_duration_since(now),
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: self.max_requests - entry.count,
            reset_unix_ms: entry.reset_unix_ms,
            retry_after: Duration::ZERO,
        }
    }

    // Drop entries whose window has passed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_at >= now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Periodic sweep of expired client buckets.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        loop {
            ticker.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                debug!(removed, "swept expired rate limit entries");
            }
        }
    });
}

// Prefer the first hop of X-Forwarded-For, then X-Real-IP.
pub fn client_identifier(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    FALLBACK_CLIENT_ID.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, window_ms: u64) -> RateLimiter {
        RateLimiter::new(max, Duration::from_millis(window_ms))
    }

    #[test]
    fn allows_up_to_the_limit_with_decreasing_remaining() {
        let rl = limiter(3, 60_000);
        let remaining: Vec<u32> = (0..3)
            .map(|_| {
                let decision = rl.check("client");
                assert!(decision.allowed);
                decision.remaining
            })
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);
    }

    #[test]
    fn denies_the_call_past_the_limit() {
        let rl = limiter(2, 60_000);
        rl.check("client");
        rl.check("client");

        let decision = rl.check("client");
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert!(decision.retry_after > Duration::ZERO);
    }

    #[test]
    fn denial_does_not_extend_the_window() {
        let rl = limiter(1, 60_000);
        rl.check("client");

        let first_denial = rl.check("client");
        let second_denial = rl.check("client");
        assert_eq!(first_denial.reset_unix_ms, second_denial.reset_unix_ms);
    }

    #[test]
    fn a_fresh_window_opens_after_expiry() {
        let rl = limiter(1, 25);
        assert!(rl.check("client").allowed);
        assert!(!rl.check("client").allowed);

        std::thread::sleep(Duration::from_millis(40));

        let decision = rl.check("client");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn keys_count_independently() {
        let rl = limiter(1, 60_000);
        assert!(rl.check("a").allowed);
        assert!(rl.check("b").allowed);
        assert!(!rl.check("a").allowed);
    }

    #[test]
    fn sweep_drops_only_expired_entries() {
        let rl = limiter(5, 25);
        rl.check("stale");
        std::thread::sleep(Duration::from_millis(40));
        rl.check("live");

        assert_eq!(rl.sweep(), 1);
        assert_eq!(rl.len(), 1);
    }

    #[test]
    fn forwarded_for_takes_the_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "10.0.0.9".parse().unwrap());
        assert_eq!(client_identifier(&headers), "203.0.113.7");
    }

    #[test]
    fn real_ip_is_the_second_choice() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.4".parse().unwrap());
        assert_eq!(client_identifier(&headers), "198.51.100.4");
    }

    #[test]
    fn unidentifiable_clients_share_one_bucket() {
        assert_eq!(client_identifier(&HeaderMap::new()), FALLBACK_CLIENT_ID);
    }
}
