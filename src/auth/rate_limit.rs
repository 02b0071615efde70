use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const MAX_ATTEMPTS: usize = 5;
const WINDOW_SECS: u64 = 900; // 15 minutes
/// Map size at which `record_failure` drops every expired username.
const SWEEP_THRESHOLD: usize = 1024;

/// Failed-login counter keyed by normalised username.
#[derive(Clone)]
pub struct RateLimiter {
    attempts: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_attempts: usize,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, Duration::from_secs(WINDOW_SECS))
    }
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    fn key(username: &str) -> String {
        username.trim().to_lowercase()
    }

    /// Check if the given username is locked out. Returns true if blocked.
    /// Also lazily drops expired attempts for that username.
    pub fn is_blocked(&self, username: &str) -> bool {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let key = Self::key(username);

        if let Some(timestamps) = map.get_mut(&key) {
            timestamps.retain(|t| now.duration_since(*t) < self.window);
            let blocked = timestamps.len() >= self.max_attempts;
            if timestamps.is_empty() {
                map.remove(&key);
            }
            blocked
        } else {
            false
        }
    }

    /// Record a failed login attempt for the given username.
    /// Once the map reaches `SWEEP_THRESHOLD` keys, expired ones are dropped first.
    pub fn record_failure(&self, username: &str) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        if map.len() >= SWEEP_THRESHOLD {
            map.retain(|_, timestamps| {
                timestamps.retain(|t| now.duration_since(*t) < self.window);
                !timestamps.is_empty()
            });
        }

        map.entry(Self::key(username)).or_default().push(now);
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Clear all recorded attempts for the given username (call on successful login).
    pub fn clear(&self, username: &str) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&Self::key(username));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_failures() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..2 {
            limiter.record_failure("alice");
        }
        assert!(!limiter.is_blocked("alice"));
        limiter.record_failure("ALICE ");
        assert!(limiter.is_blocked("alice"));
        assert!(!limiter.is_blocked("bob"));
    }

    #[test]
    fn clear_resets_the_counter() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        limiter.record_failure("alice");
        assert!(limiter.is_blocked("alice"));
        limiter.clear("alice");
        assert!(!limiter.is_blocked("alice"));
    }

    #[test]
    fn expired_usernames_are_swept_once_the_map_is_large() {
        let limiter = RateLimiter::new(5, Duration::from_millis(10));
        for i in 0..SWEEP_THRESHOLD {
            limiter.record_failure(&format!("user{i}"));
        }
        assert_eq!(limiter.tracked(), SWEEP_THRESHOLD);

        std::thread::sleep(Duration::from_millis(25));
        limiter.record_failure("fresh");
        assert_eq!(limiter.tracked(), 1);
        assert!(!limiter.is_blocked("user0"));
    }

    #[test]
    fn live_entries_survive_a_sweep() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        limiter.record_failure("alice");
        limiter.record_failure("alice");
        for i in 0..SWEEP_THRESHOLD {
            limiter.record_failure(&format!("user{i}"));
        }
        assert!(limiter.is_blocked("alice"));
    }

    #[test]
    fn attempts_expire_after_the_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        limiter.record_failure("alice");
        std::thread::sleep(Duration::from_millis(25));
        assert!(!limiter.is_blocked("alice"));
    }
}
