use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::report::ReportError;

/// Tracked keys at which a new window first sweeps out expired ones.
pub const DEFAULT_PURGE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window request counter keyed by caller identity. One instance is
/// owned per deployment and shared through the server state.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    purge_threshold: usize,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            purge_threshold: DEFAULT_PURGE_THRESHOLD,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_purge_threshold(mut self, threshold: usize) -> Self {
        self.purge_threshold = threshold.max(1);
        self
    }

    pub fn check(&self, key: &str) -> Result<(), ReportError> {
        self.check_at(key, Instant::now())
    }

    /// Counts one request for `key` at `now`. An expired window starts over.
    /// Opening a window while `purge_threshold` keys are tracked first drops
    /// every expired window.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), ReportError> {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match windows.get_mut(key) {
            Some(entry) if now <= entry.reset_at => {
                if entry.count >= self.max_requests {
                    let retry_after = entry.reset_at.saturating_duration_since(now);
                    return Err(ReportError::RateLimited {
                        retry_after_secs: retry_after.as_secs().max(1),
                    });
                }
                entry.count += 1;
                Ok(())
            }
            _ => {
                if windows.len() >= self.purge_threshold {
                    windows.retain(|_, entry| now <= entry.reset_at);
                }
                windows.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                Ok(())
            }
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows
            .lock()
            .map(|windows| windows.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

pub fn email_key(email: &str) -> String {
    format!("email:{}", email.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_then_limits() {
        let limiter = RateLimiter::new(3, Duration::from_secs(3600));
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at("email:a@b.mt", now).is_ok());
        }
        let err = limiter.check_at("email:a@b.mt", now).unwrap_err();
        assert!(matches!(
            err,
            ReportError::RateLimited { retry_after_secs: 3600 }
        ));
        assert!(limiter.check_at("email:other@b.mt", now).is_ok());
    }

    #[test]
    fn expired_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check_at("k", start).is_ok());
        assert!(limiter.check_at("k", start + Duration::from_secs(30)).is_err());
        assert!(limiter.check_at("k", start + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn opening_windows_past_threshold_evicts_expired() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60)).with_purge_threshold(2);
        let start = Instant::now();
        limiter.check_at("a", start).unwrap();
        limiter.check_at("b", start).unwrap();
        limiter
            .check_at("c", start + Duration::from_secs(61))
            .unwrap();
        assert_eq!(limiter.tracked_keys(), 1);

        // live windows survive the sweep
        limiter
            .check_at("d", start + Duration::from_secs(62))
            .unwrap();
        limiter
            .check_at("e", start + Duration::from_secs(63))
            .unwrap();
        assert_eq!(limiter.tracked_keys(), 3);
    }

    #[test]
    fn check_keeps_map_bounded_for_short_windows() {
        let limiter = RateLimiter::new(1, Duration::ZERO).with_purge_threshold(4);
        for i in 0..20 {
            limiter.check(&email_key(&format!("user{i}@example.mt"))).unwrap();
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(limiter.tracked_keys() <= 4);
    }

    #[test]
    fn separate_limiters_do_not_share_counts() {
        let first = RateLimiter::new(1, Duration::from_secs(60));
        let second = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        first.check_at("k", now).unwrap();
        assert!(first.check_at("k", now).is_err());
        assert!(second.check_at("k", now).is_ok());
    }

    #[test]
    fn email_key_is_case_insensitive() {
        assert_eq!(email_key(" Owner@Example.MT "), "email:owner@example.mt");
    }
}
