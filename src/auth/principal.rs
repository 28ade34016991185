//! User Principal
//! Mission: Build the per-request identity with account-state semantics

use crate::auth::attempts::LoginAttemptTracker;
use crate::auth::models::UserRecord;

/// Authentication-relevant view over a stored user record.
///
/// Built fresh on every authentication attempt and immutable after
/// construction. The authority list is always non-empty because every
/// role grants at least one authority.
#[derive(Debug, Clone)]
pub struct UserPrincipal {
    pub member_id: String,
    pub username: String,
    pub password_hash: String,
    active: bool,
    not_locked: bool,
    authorities: Vec<String>,
}

impl UserPrincipal {
    /// Build a principal from a stored record, resolving the lock state
    /// against the attempt tracker.
    ///
    /// A record that is stored unlocked is flipped to locked for this
    /// construction when the tracker reports the threshold exceeded. A
    /// record that is stored locked instead has its attempt record
    /// evicted, so the counter is clean the next time the account is
    /// looked up (the account stays locked for this attempt). That
    /// one-shot reset mirrors the long-standing production behavior;
    /// see DESIGN.md for the cooldown alternative.
    pub fn from_record(record: &UserRecord, attempts: &LoginAttemptTracker) -> Self {
        let not_locked = if record.not_locked {
            !attempts.has_exceeded_max_attempts(&record.username)
        } else {
            attempts.evict(&record.username);
            false
        };

        Self {
            member_id: record.member_id.clone(),
            username: record.username.clone(),
            password_hash: record.password_hash.clone(),
            active: record.active,
            not_locked,
            authorities: record
                .role
                .authorities()
                .iter()
                .map(|a| a.to_string())
                .collect(),
        }
    }

    /// Whether the account may authenticate at all.
    pub fn is_enabled(&self) -> bool {
        self.active
    }

    /// Whether the account escaped the brute-force lockout.
    pub fn is_account_non_locked(&self) -> bool {
        self.not_locked
    }

    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }
}
