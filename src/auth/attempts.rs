//! Login Attempt Tracking
//! Mission: Throttle brute-force logins with per-username failure counters

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Failures before an account is treated as locked.
pub const MAX_ATTEMPTS: u32 = 5;

/// How long a failure record lives, measured from the first failure
/// of the window.
pub const ATTEMPT_WINDOW: Duration = Duration::from_secs(15 * 60);

struct AttemptEntry {
    count: u32,
    window_start: Instant,
}

/// Tracks consecutive failed logins per username.
///
/// Entries expire a fixed window after the *first* failure, not the
/// most recent one, so repeated probes cannot keep a lockout alive
/// past the window. Expiry is checked lazily on read and write;
/// [`LoginAttemptTracker::cleanup`] can additionally sweep from a
/// background task.
#[derive(Clone)]
pub struct LoginAttemptTracker {
    window: Duration,
    state: Arc<Mutex<HashMap<String, AttemptEntry>>>,
}

impl Default for LoginAttemptTracker {
    fn default() -> Self {
        Self::new(ATTEMPT_WINDOW)
    }
}

impl LoginAttemptTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a failed login. Creates the entry and starts the expiry
    /// window on the first failure; an expired entry starts a fresh
    /// window at count 1.
    pub fn record_failure(&self, username: &str) {
        let mut state = self.state.lock();
        let now = Instant::now();

        let entry = state
            .entry(username.to_string())
            .or_insert(AttemptEntry { count: 0, window_start: now });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        debug!(username, count = entry.count, "Recorded failed login attempt");
    }

    /// Whether the username has hit the lockout threshold inside the
    /// current window. Unknown and expired usernames report `false`.
    pub fn has_exceeded_max_attempts(&self, username: &str) -> bool {
        let mut state = self.state.lock();
        let now = Instant::now();

        match state.get(username) {
            Some(entry) if now.duration_since(entry.window_start) >= self.window => {
                state.remove(username);
                false
            }
            Some(entry) => entry.count >= MAX_ATTEMPTS,
            None => false,
        }
    }

    /// Current failure count inside the window. Zero for unknown or
    /// expired usernames.
    pub fn failure_count(&self, username: &str) -> u32 {
        let state = self.state.lock();
        let now = Instant::now();
        match state.get(username) {
            Some(entry) if now.duration_since(entry.window_start) < self.window => entry.count,
            _ => 0,
        }
    }

    /// Drop the record entirely. Called on successful authentication;
    /// resetting the failure history is mandatory, not advisory.
    pub fn evict(&self, username: &str) {
        if self.state.lock().remove(username).is_some() {
            debug!(username, "Evicted login attempt record");
        }
    }

    /// Sweep expired records (call from a background task).
    pub fn cleanup(&self) {
        let mut state = self.state.lock();
        let now = Instant::now();
        let window = self.window;
        state.retain(|_, entry| now.duration_since(entry.window_start) < window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_unknown_username_not_locked() {
        let tracker = LoginAttemptTracker::default();
        assert!(!tracker.has_exceeded_max_attempts("nobody"));
        assert_eq!(tracker.failure_count("nobody"), 0);
    }

    #[test]
    fn test_lockout_after_max_attempts() {
        let tracker = LoginAttemptTracker::default();

        for i in 1..MAX_ATTEMPTS {
            tracker.record_failure("bob");
            assert!(!tracker.has_exceeded_max_attempts("bob"), "locked after {} attempts", i);
        }

        tracker.record_failure("bob");
        assert!(tracker.has_exceeded_max_attempts("bob"));
        assert_eq!(tracker.failure_count("bob"), MAX_ATTEMPTS);
    }

    #[test]
    fn test_evict_resets_history() {
        let tracker = LoginAttemptTracker::default();

        for _ in 0..MAX_ATTEMPTS {
            tracker.record_failure("bob");
        }
        assert!(tracker.has_exceeded_max_attempts("bob"));

        tracker.evict("bob");
        assert!(!tracker.has_exceeded_max_attempts("bob"));
        assert_eq!(tracker.failure_count("bob"), 0);
    }

    #[test]
    fn test_counters_are_per_username() {
        let tracker = LoginAttemptTracker::default();

        for _ in 0..MAX_ATTEMPTS {
            tracker.record_failure("bob");
        }
        tracker.record_failure("alice");

        assert!(tracker.has_exceeded_max_attempts("bob"));
        assert!(!tracker.has_exceeded_max_attempts("alice"));
    }

    #[test]
    fn test_expired_window_clears_lockout() {
        let tracker = LoginAttemptTracker::new(Duration::from_millis(50));

        for _ in 0..MAX_ATTEMPTS {
            tracker.record_failure("bob");
        }
        assert!(tracker.has_exceeded_max_attempts("bob"));

        thread::sleep(Duration::from_millis(60));
        assert!(!tracker.has_exceeded_max_attempts("bob"));
    }

    #[test]
    fn test_failures_after_expiry_start_fresh_window() {
        let tracker = LoginAttemptTracker::new(Duration::from_millis(50));

        for _ in 0..MAX_ATTEMPTS {
            tracker.record_failure("bob");
        }
        thread::sleep(Duration::from_millis(60));

        // A probe after expiry counts from 1, it does not revive the
        // old lockout.
        tracker.record_failure("bob");
        assert_eq!(tracker.failure_count("bob"), 1);
        assert!(!tracker.has_exceeded_max_attempts("bob"));
    }

    #[test]
    fn test_cleanup_sweeps_expired_entries() {
        let tracker = LoginAttemptTracker::new(Duration::from_millis(50));
        tracker.record_failure("bob");
        tracker.record_failure("alice");

        thread::sleep(Duration::from_millis(60));
        tracker.cleanup();

        assert_eq!(tracker.failure_count("bob"), 0);
        assert_eq!(tracker.failure_count("alice"), 0);
    }

    #[test]
    fn test_concurrent_failures_never_undercount() {
        let tracker = LoginAttemptTracker::default();
        let threads: u32 = 8;
        let per_thread: u32 = 25;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        tracker.record_failure("bob");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.failure_count("bob"), threads * per_thread);
        assert!(tracker.has_exceeded_max_attempts("bob"));
    }
}
