/**
 * Lock Arbitration Table
 *
 * This module implements the in-memory registry mapping a resource key to
 * the connection currently holding it. It grants, idempotently re-grants,
 * and revokes advisory edit locks, and is consulted by the gateway's
 * disconnect handler to free everything a vanished connection held.
 *
 * # Mutual Exclusion
 *
 * Every operation takes the table mutex once and runs to completion, so
 * per-key lock transitions are totally ordered by arrival: whichever
 * request reaches the table first wins, and a concurrent request for the
 * same key from another connection is denied with no state change.
 *
 * # Liveness
 *
 * There are no lock timeouts. A lock is held until explicit release or
 * until the holder's disconnect is detected; a client that crashes
 * without a clean close relies entirely on the transport's heartbeat to
 * eventually free its locks. This is a known liveness weakness of the
 * design, bounded by the gateway's ping interval.
 *
 * # Ephemerality
 *
 * Nothing here is persisted. A server restart silently clears all locks,
 * which is acceptable because locks are advisory UI affordances, not
 * transactional guarantees over the document store.
 */
use std::collections::HashMap;
use std::sync::Mutex;

use crate::shared::board::{BoardId, ResourceKind, UserId};
use crate::shared::protocol::ConnectionId;

/// Key identifying one lockable resource
///
/// Keys are scoped by board in addition to `(kind, id)`. Resource ids are
/// unique across boards in the source data model, so the extra scoping is
/// not load-bearing for uniqueness, but it lets disconnect cleanup route
/// each unlock broadcast to exactly the owning board's room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey {
    /// Board the resource lives on
    pub board_id: BoardId,
    /// Resource kind
    pub kind: ResourceKind,
    /// Resource id
    pub id: String,
}

impl LockKey {
    /// Create a key for any resource kind
    pub fn new(board_id: impl Into<BoardId>, kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            kind,
            id: id.into(),
        }
    }

    /// Create a note key
    pub fn note(board_id: impl Into<BoardId>, id: impl Into<String>) -> Self {
        Self::new(board_id, ResourceKind::Note, id)
    }

    /// Create a section key
    pub fn section(board_id: impl Into<BoardId>, id: impl Into<String>) -> Self {
        Self::new(board_id, ResourceKind::Section, id)
    }
}

/// Current holder of a lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHolder {
    /// Connection that holds the lock
    pub connection_id: ConnectionId,
    /// User identity shown to peers as "being edited by"
    pub user_id: UserId,
}

/// Outcome of a lock request
///
/// `Denied` is an expected outcome under contention, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The requester now holds (or already held) the lock
    Granted,
    /// Another connection holds the lock; no state change
    Denied,
}

/// Outcome of a lock release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The caller was the holder and the entry was removed
    Released,
    /// The caller was not the holder; silently ignored so a stale client
    /// cannot clear another user's active lock
    Ignored,
}

/// Advisory mutual exclusion over a small, frequently-churned resource set
///
/// Abstracted as a trait so the single-process map implementation can be
/// swapped for a networked key-value store with TTL-based expiry without
/// changing the protocol layer.
pub trait LockService: Send + Sync {
    /// Request a lock; idempotent when the caller already holds it
    fn acquire(&self, key: LockKey, connection_id: ConnectionId, user_id: &str) -> AcquireOutcome;

    /// Release a lock held by the caller
    fn release(&self, key: &LockKey, connection_id: ConnectionId) -> ReleaseOutcome;

    /// Current holder of a key, if any; absence means unlocked
    fn owner_of(&self, key: &LockKey) -> Option<LockHolder>;

    /// Remove every lock held by a connection, returning the removed keys
    ///
    /// Called exactly once by the gateway's disconnect hook. The caller
    /// emits one unlock broadcast per returned key.
    fn release_all(&self, connection_id: ConnectionId) -> Vec<LockKey>;
}

/// Single-process lock table over a mutex-guarded map
#[derive(Debug, Default)]
pub struct InMemoryLockTable {
    entries: Mutex<HashMap<LockKey, LockHolder>>,
}

impl InMemoryLockTable {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently held locks
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether no locks are held
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl LockService for InMemoryLockTable {
    fn acquire(&self, key: LockKey, connection_id: ConnectionId, user_id: &str) -> AcquireOutcome {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&key) {
            Some(holder) if holder.connection_id != connection_id => {
                tracing::debug!(
                    "[Locks] Denied {:?} {} to {}: held by {}",
                    key.kind,
                    key.id,
                    connection_id,
                    holder.connection_id
                );
                AcquireOutcome::Denied
            }
            _ => {
                // Vacant, or an idempotent re-grant to the current holder
                entries.insert(
                    key.clone(),
                    LockHolder {
                        connection_id,
                        user_id: user_id.to_string(),
                    },
                );
                tracing::debug!(
                    "[Locks] Granted {:?} {} to {}",
                    key.kind,
                    key.id,
                    connection_id
                );
                AcquireOutcome::Granted
            }
        }
    }

    fn release(&self, key: &LockKey, connection_id: ConnectionId) -> ReleaseOutcome {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(holder) if holder.connection_id == connection_id => {
                entries.remove(key);
                tracing::debug!(
                    "[Locks] Released {:?} {} by {}",
                    key.kind,
                    key.id,
                    connection_id
                );
                ReleaseOutcome::Released
            }
            _ => ReleaseOutcome::Ignored,
        }
    }

    fn owner_of(&self, key: &LockKey) -> Option<LockHolder> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn release_all(&self, connection_id: ConnectionId) -> Vec<LockKey> {
        let mut entries = self.entries.lock().unwrap();
        let released: Vec<LockKey> = entries
            .iter()
            .filter(|(_, holder)| holder.connection_id == connection_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &released {
            entries.remove(key);
        }
        if !released.is_empty() {
            tracing::info!(
                "[Locks] Released {} lock(s) held by disconnected {}",
                released.len(),
                connection_id
            );
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_acquire_vacant_grants() {
        let table = InMemoryLockTable::new();
        let conn = Uuid::new_v4();
        let outcome = table.acquire(LockKey::note("b1", "n1"), conn, "u1");
        assert_eq!(outcome, AcquireOutcome::Granted);
        assert_eq!(table.owner_of(&LockKey::note("b1", "n1")).unwrap().connection_id, conn);
    }

    #[test]
    fn test_acquire_held_by_other_denies_without_change() {
        let table = InMemoryLockTable::new();
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        table.acquire(LockKey::note("b1", "n1"), c1, "u1");

        let outcome = table.acquire(LockKey::note("b1", "n1"), c2, "u2");
        assert_eq!(outcome, AcquireOutcome::Denied);

        let holder = table.owner_of(&LockKey::note("b1", "n1")).unwrap();
        assert_eq!(holder.connection_id, c1);
        assert_eq!(holder.user_id, "u1");
    }

    #[test]
    fn test_re_grant_is_idempotent() {
        let table = InMemoryLockTable::new();
        let conn = Uuid::new_v4();
        let key = LockKey::section("b1", "s1");
        assert_eq!(table.acquire(key.clone(), conn, "u1"), AcquireOutcome::Granted);
        assert_eq!(table.acquire(key.clone(), conn, "u1"), AcquireOutcome::Granted);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_release_by_non_holder_is_ignored() {
        let table = InMemoryLockTable::new();
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        let key = LockKey::note("b1", "n1");
        table.acquire(key.clone(), c1, "u1");

        assert_eq!(table.release(&key, c2), ReleaseOutcome::Ignored);
        assert_eq!(table.owner_of(&key).unwrap().connection_id, c1);
    }

    #[test]
    fn test_release_unheld_is_ignored() {
        let table = InMemoryLockTable::new();
        let key = LockKey::note("b1", "n1");
        assert_eq!(table.release(&key, Uuid::new_v4()), ReleaseOutcome::Ignored);
    }

    #[test]
    fn test_release_all_returns_only_callers_keys() {
        let table = InMemoryLockTable::new();
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        table.acquire(LockKey::note("b1", "n1"), c1, "u1");
        table.acquire(LockKey::section("b2", "s1"), c1, "u1");
        table.acquire(LockKey::note("b1", "n2"), c2, "u2");

        let mut released = table.release_all(c1);
        released.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(released.len(), 2);
        assert_eq!(released[0].id, "n1");
        assert_eq!(released[1].id, "s1");

        // c2's lock survives
        assert_eq!(table.len(), 1);
        assert!(table.owner_of(&LockKey::note("b1", "n2")).is_some());
    }

    #[test]
    fn test_keys_are_board_scoped() {
        let table = InMemoryLockTable::new();
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        assert_eq!(
            table.acquire(LockKey::note("b1", "n1"), c1, "u1"),
            AcquireOutcome::Granted
        );
        // Same (kind, id) on a different board is an independent key
        assert_eq!(
            table.acquire(LockKey::note("b2", "n1"), c2, "u2"),
            AcquireOutcome::Granted
        );
        assert_eq!(table.len(), 2);
    }
}
