//! Single-writer editing lease on a project.
//!
//! A project can be edited by one user at a time. The user holding the lease
//! keeps it alive with heartbeats; a lease whose last heartbeat is older than
//! the TTL is treated as vacant wherever it is read, so there is no cleanup
//! task and a crashed client never blocks a project for longer than the TTL.
//!
//! The rules live in [`evaluate`], a pure function over the current
//! [`LeaseHold`]. Stores call it inside their own atomic section (a row lock
//! in Postgres, a mutex in [`memory::MemoryStore`]) and persist the
//! [`LeaseWrite`] it returns.

pub mod engine;
pub mod memory;
pub mod store;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

pub use engine::{AcquireOutcome, ActiveLease, LeaseEngine, LockHolder, RenewOutcome};
pub use store::{Directory, LeaseSnapshot, LeaseStore};

// ---------------------------------------------------------------------------
// Timing constants
// ---------------------------------------------------------------------------

/// How long a lease stays active without a heartbeat (in seconds).
pub const LOCK_TTL_SECS: i64 = 60;

/// How often an editing client renews its lease (in seconds).
///
/// Must stay well below [`LOCK_TTL_SECS`] so a slow heartbeat or two does not
/// drop a lease that is still in use.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 15;

/// [`LOCK_TTL_SECS`] as a duration.
pub fn default_ttl() -> Duration {
    Duration::seconds(LOCK_TTL_SECS)
}

// ---------------------------------------------------------------------------
// Lease state
// ---------------------------------------------------------------------------

/// The lease columns of a project when someone holds (or held) the lease.
///
/// A project with no holder has no `LeaseHold` at all, which keeps the
/// holder, `since` and `last_ping` columns set or cleared together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseHold {
    pub user_id: DbId,
    /// When `user_id` first acquired this lease.
    pub since: Timestamp,
    /// Most recent heartbeat from `user_id`.
    pub last_ping: Timestamp,
}

impl LeaseHold {
    /// Build a hold from the three nullable project columns.
    ///
    /// Returns `None` unless all three are present; a partially populated row
    /// is treated as vacant.
    pub fn from_columns(
        editing_by_user_id: Option<DbId>,
        editing_since: Option<Timestamp>,
        last_edit_ping: Option<Timestamp>,
    ) -> Option<Self> {
        match (editing_by_user_id, editing_since, last_edit_ping) {
            (Some(user_id), Some(since), Some(last_ping)) => Some(Self {
                user_id,
                since,
                last_ping,
            }),
            _ => None,
        }
    }

    /// `true` while the last heartbeat is younger than `ttl`.
    pub fn is_active(&self, now: Timestamp, ttl: Duration) -> bool {
        now - self.last_ping < ttl
    }
}

/// The hold, if it is still active at `now`.
pub fn active_hold(hold: Option<&LeaseHold>, now: Timestamp, ttl: Duration) -> Option<&LeaseHold> {
    hold.filter(|h| h.is_active(now, ttl))
}

/// Read-time projection of an active lease for project listings.
///
/// Serialized as the `currently_editing` field of a project summary and
/// deserialized by the presence client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentlyEditing {
    pub user_id: DbId,
    pub name: String,
    pub since: Timestamp,
}

/// Project the lease into a [`CurrentlyEditing`] value, or `None` when vacant
/// or expired. `holder_name` is the display name of `hold.user_id`.
pub fn currently_editing(
    hold: Option<&LeaseHold>,
    holder_name: Option<&str>,
    now: Timestamp,
    ttl: Duration,
) -> Option<CurrentlyEditing> {
    active_hold(hold, now, ttl).map(|h| CurrentlyEditing {
        user_id: h.user_id,
        name: holder_name.unwrap_or(UNKNOWN_USER_NAME).to_string(),
        since: h.since,
    })
}

/// Display name used when the holder no longer resolves to a user.
pub const UNKNOWN_USER_NAME: &str = "Unknown user";

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// The three lease operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseCommand {
    Acquire,
    Renew,
    Release,
}

/// A lease operation as seen by a store: who asks, what, and at which instant.
#[derive(Debug, Clone, Copy)]
pub struct LeaseRequest {
    pub command: LeaseCommand,
    pub user_id: DbId,
    pub now: Timestamp,
    pub ttl: Duration,
}

/// Result of evaluating a [`LeaseRequest`] against the current hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseDecision {
    /// Lease granted. `reacquired` is set when the requester was already the
    /// recorded holder and `since` was carried over.
    Granted { since: Timestamp, reacquired: bool },
    /// Another user holds an active lease.
    Denied { holder_id: DbId, since: Timestamp },
    Renewed,
    /// Renew from someone who is not the recorded holder.
    NotLockOwner,
    Released,
    /// Release from someone who is not the recorded holder. Not an error.
    ReleaseIgnored,
}

/// What a store must persist after a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseWrite {
    Keep,
    Set(LeaseHold),
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseTransition {
    pub decision: LeaseDecision,
    pub write: LeaseWrite,
}

impl LeaseTransition {
    fn new(decision: LeaseDecision, write: LeaseWrite) -> Self {
        Self { decision, write }
    }

    /// Apply the write to `current`, returning the resulting hold.
    pub fn next_hold(&self, current: Option<LeaseHold>) -> Option<LeaseHold> {
        match self.write {
            LeaseWrite::Keep => current,
            LeaseWrite::Set(hold) => Some(hold),
            LeaseWrite::Clear => None,
        }
    }
}

/// Decide a lease operation against the current hold.
///
/// Must be called inside the store's atomic section for the project so the
/// read, the decision and the write are seen as one step by concurrent
/// requests.
pub fn evaluate(current: Option<&LeaseHold>, request: &LeaseRequest) -> LeaseTransition {
    let LeaseRequest {
        command,
        user_id,
        now,
        ttl,
    } = *request;

    match command {
        // The recorded holder keeps `since` even after a lapse nobody took
        // over, matching renew.
        LeaseCommand::Acquire => match current {
            Some(hold) if hold.user_id == user_id => LeaseTransition::new(
                LeaseDecision::Granted {
                    since: hold.since,
                    reacquired: true,
                },
                LeaseWrite::Set(LeaseHold {
                    last_ping: hold.last_ping.max(now),
                    ..*hold
                }),
            ),
            _ => match active_hold(current, now, ttl) {
                Some(hold) => LeaseTransition::new(
                    LeaseDecision::Denied {
                        holder_id: hold.user_id,
                        since: hold.since,
                    },
                    LeaseWrite::Keep,
                ),
                None => LeaseTransition::new(
                    LeaseDecision::Granted {
                        since: now,
                        reacquired: false,
                    },
                    LeaseWrite::Set(LeaseHold {
                        user_id,
                        since: now,
                        last_ping: now,
                    }),
                ),
            },
        },

        // No liveness check: a holder whose lease lapsed but was never taken
        // over may keep going.
        LeaseCommand::Renew => match current {
            Some(hold) if hold.user_id == user_id => LeaseTransition::new(
                LeaseDecision::Renewed,
                LeaseWrite::Set(LeaseHold {
                    last_ping: hold.last_ping.max(now),
                    ..*hold
                }),
            ),
            _ => LeaseTransition::new(LeaseDecision::NotLockOwner, LeaseWrite::Keep),
        },

        LeaseCommand::Release => match current {
            Some(hold) if hold.user_id == user_id => {
                LeaseTransition::new(LeaseDecision::Released, LeaseWrite::Clear)
            }
            _ => LeaseTransition::new(LeaseDecision::ReleaseIgnored, LeaseWrite::Keep),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn at(millis: i64) -> Timestamp {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn request(command: LeaseCommand, user_id: DbId, now_ms: i64) -> LeaseRequest {
        LeaseRequest {
            command,
            user_id,
            now: at(now_ms),
            ttl: default_ttl(),
        }
    }

    fn hold(user_id: DbId, since_ms: i64, ping_ms: i64) -> LeaseHold {
        LeaseHold {
            user_id,
            since: at(since_ms),
            last_ping: at(ping_ms),
        }
    }

    // -----------------------------------------------------------------------
    // Liveness
    // -----------------------------------------------------------------------

    #[test]
    fn test_hold_active_strictly_inside_ttl() {
        let h = hold(1, 0, 0);
        assert!(h.is_active(at(0), default_ttl()));
        assert!(h.is_active(at(59_999), default_ttl()));
        assert!(!h.is_active(at(60_000), default_ttl()));
        assert!(!h.is_active(at(61_000), default_ttl()));
    }

    #[test]
    fn test_from_columns_requires_all_three() {
        assert!(LeaseHold::from_columns(Some(1), Some(at(0)), Some(at(0))).is_some());
        assert!(LeaseHold::from_columns(None, None, None).is_none());
        assert!(LeaseHold::from_columns(Some(1), None, Some(at(0))).is_none());
        assert!(LeaseHold::from_columns(Some(1), Some(at(0)), None).is_none());
    }

    #[test]
    fn test_currently_editing_projection() {
        let h = hold(7, 1_000, 5_000);
        let active = currently_editing(Some(&h), Some("Ada"), at(10_000), default_ttl());
        assert_eq!(
            active,
            Some(CurrentlyEditing {
                user_id: 7,
                name: "Ada".to_string(),
                since: at(1_000),
            })
        );

        assert_eq!(
            currently_editing(Some(&h), Some("Ada"), at(65_000), default_ttl()),
            None
        );
        assert_eq!(currently_editing(None, None, at(0), default_ttl()), None);

        let unnamed = currently_editing(Some(&h), None, at(6_000), default_ttl()).unwrap();
        assert_eq!(unnamed.name, UNKNOWN_USER_NAME);
    }

    // -----------------------------------------------------------------------
    // Acquire
    // -----------------------------------------------------------------------

    #[test]
    fn test_acquire_vacant_grants_fresh_lease() {
        let t = evaluate(None, &request(LeaseCommand::Acquire, 1, 1_000));
        assert_eq!(
            t.decision,
            LeaseDecision::Granted {
                since: at(1_000),
                reacquired: false
            }
        );
        assert_eq!(t.write, LeaseWrite::Set(hold(1, 1_000, 1_000)));
    }

    #[test]
    fn test_acquire_own_active_lease_keeps_since() {
        let current = hold(1, 0, 10_000);
        let t = evaluate(Some(&current), &request(LeaseCommand::Acquire, 1, 30_000));
        assert_eq!(
            t.decision,
            LeaseDecision::Granted {
                since: at(0),
                reacquired: true
            }
        );
        assert_eq!(t.write, LeaseWrite::Set(hold(1, 0, 30_000)));
    }

    #[test]
    fn test_acquire_denied_while_other_holder_active() {
        let current = hold(1, 0, 10_000);
        let t = evaluate(Some(&current), &request(LeaseCommand::Acquire, 2, 30_000));
        assert_eq!(
            t.decision,
            LeaseDecision::Denied {
                holder_id: 1,
                since: at(0)
            }
        );
        assert_eq!(t.write, LeaseWrite::Keep);
    }

    #[test]
    fn test_acquire_takes_over_expired_lease() {
        let current = hold(1, 0, 0);
        let t = evaluate(Some(&current), &request(LeaseCommand::Acquire, 2, 61_000));
        assert_eq!(
            t.decision,
            LeaseDecision::Granted {
                since: at(61_000),
                reacquired: false
            }
        );
        assert_eq!(t.write, LeaseWrite::Set(hold(2, 61_000, 61_000)));
    }

    #[test]
    fn test_acquire_own_expired_lease_keeps_since() {
        let current = hold(1, 0, 0);
        let t = evaluate(Some(&current), &request(LeaseCommand::Acquire, 1, 90_000));
        assert_eq!(
            t.decision,
            LeaseDecision::Granted {
                since: at(0),
                reacquired: true
            }
        );
        assert_eq!(t.write, LeaseWrite::Set(hold(1, 0, 90_000)));

        // Same state through renew gives the same hold.
        let renewed = evaluate(Some(&current), &request(LeaseCommand::Renew, 1, 90_000));
        assert_eq!(renewed.write, t.write);
    }

    // -----------------------------------------------------------------------
    // Renew
    // -----------------------------------------------------------------------

    #[test]
    fn test_renew_by_holder_only_moves_ping() {
        let current = hold(1, 0, 10_000);
        let t = evaluate(Some(&current), &request(LeaseCommand::Renew, 1, 20_000));
        assert_eq!(t.decision, LeaseDecision::Renewed);
        assert_eq!(t.write, LeaseWrite::Set(hold(1, 0, 20_000)));
    }

    #[test]
    fn test_renew_by_non_holder_rejected() {
        let current = hold(1, 0, 10_000);
        let t = evaluate(Some(&current), &request(LeaseCommand::Renew, 2, 20_000));
        assert_eq!(t.decision, LeaseDecision::NotLockOwner);
        assert_eq!(t.write, LeaseWrite::Keep);
    }

    #[test]
    fn test_renew_vacant_rejected() {
        let t = evaluate(None, &request(LeaseCommand::Renew, 1, 0));
        assert_eq!(t.decision, LeaseDecision::NotLockOwner);
    }

    #[test]
    fn test_renew_of_lapsed_but_untaken_lease_succeeds() {
        let current = hold(1, 0, 0);
        let t = evaluate(Some(&current), &request(LeaseCommand::Renew, 1, 120_000));
        assert_eq!(t.decision, LeaseDecision::Renewed);
        assert_eq!(t.write, LeaseWrite::Set(hold(1, 0, 120_000)));
    }

    #[test]
    fn test_renew_never_moves_ping_backwards() {
        let current = hold(1, 0, 50_000);
        let t = evaluate(Some(&current), &request(LeaseCommand::Renew, 1, 40_000));
        assert_eq!(t.write, LeaseWrite::Set(hold(1, 0, 50_000)));
    }

    // -----------------------------------------------------------------------
    // Release
    // -----------------------------------------------------------------------

    #[test]
    fn test_release_by_holder_clears() {
        let current = hold(1, 0, 0);
        let t = evaluate(Some(&current), &request(LeaseCommand::Release, 1, 5_000));
        assert_eq!(t.decision, LeaseDecision::Released);
        assert_eq!(t.write, LeaseWrite::Clear);
        assert_eq!(t.next_hold(Some(current)), None);
    }

    #[test]
    fn test_release_by_non_holder_is_ignored() {
        let current = hold(1, 0, 0);
        let t = evaluate(Some(&current), &request(LeaseCommand::Release, 2, 5_000));
        assert_eq!(t.decision, LeaseDecision::ReleaseIgnored);
        assert_eq!(t.next_hold(Some(current)), Some(current));
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    #[test]
    fn test_currently_editing_wire_shape() {
        let value = serde_json::to_value(CurrentlyEditing {
            user_id: 3,
            name: "Grace".to_string(),
            since: at(0),
        })
        .unwrap();
        assert_eq!(value["user_id"], 3);
        assert_eq!(value["name"], "Grace");
        assert_eq!(value["since"], "1970-01-01T00:00:00Z");
    }
}
