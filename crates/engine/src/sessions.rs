//! Session tokens and their lifetime policy.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Actor, User};

/// Shortest session lifetime accepted by [`SessionPolicy`].
pub const MIN_TTL_MINUTES: i64 = 10;
/// Longest session lifetime accepted by [`SessionPolicy`].
pub const MAX_TTL_MINUTES: i64 = 24 * 60;

/// Lifetimes of normal and remember-me sessions, clamped to
/// [`MIN_TTL_MINUTES`]..=[`MAX_TTL_MINUTES`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionPolicy {
    ttl: Duration,
    remember_me_ttl: Duration,
}

impl SessionPolicy {
    #[must_use]
    pub fn new(ttl_minutes: i64, remember_me_ttl_minutes: i64) -> Self {
        Self {
            ttl: Duration::minutes(ttl_minutes.clamp(MIN_TTL_MINUTES, MAX_TTL_MINUTES)),
            remember_me_ttl: Duration::minutes(
                remember_me_ttl_minutes.clamp(MIN_TTL_MINUTES, MAX_TTL_MINUTES),
            ),
        }
    }

    #[must_use]
    pub fn ttl(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.remember_me_ttl
        } else {
            self.ttl
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::new(MIN_TTL_MINUTES, MAX_TTL_MINUTES)
    }
}

/// A freshly issued session. `token` is only ever known to the client.
#[derive(Clone, Debug)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// The state attached to an authenticated request.
#[derive(Clone, Debug)]
pub struct SessionInfo {
    pub actor: Actor,
    pub remember_me: bool,
    pub expires_at: DateTime<Utc>,
}

/// 64 hex characters drawn from two v4 UUIDs.
pub(crate) fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

pub(crate) fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
