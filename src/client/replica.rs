/**
 * Optimistic Board Replica
 *
 * The per-client state store. Every local mutation is applied to the
 * in-memory maps immediately, before any network round trip, so the UI
 * never blocks on latency; inbound broadcast events are then merged by
 * resource id.
 *
 * # Conflict Guard
 *
 * An inbound update for a resource this client itself currently holds
 * the lock on is refused (`MergeOutcome::Conflict`) instead of silently
 * overwriting in-flight local edits. The advisory lock obtained before
 * editing is the guard against this race; a conflict therefore indicates
 * a peer that mutated a resource without holding its lock.
 *
 * # Lock Tracking
 *
 * The protocol never tells a client its own connection id, so ownership
 * of a granted lock is recognized by matching the grant against this
 * replica's pending requests: a `<kind>-locked` event for a key we asked
 * for is our grant; any other grant is a peer's, remembered so the UI
 * can render "being edited by user X".
 *
 * # Temporary Ids
 *
 * Notes created locally carry a client-local temporary id until the
 * persistence layer confirms a permanent one; `confirm_note_id` rebinds
 * the entry and any lock bookkeeping under the confirmed id.
 */
use std::collections::{HashMap, HashSet};

use chrono::Utc;
use uuid::Uuid;

use crate::shared::board::{
    Board, BoardId, Note, NoteId, ResourceKind, Section, SectionId, UserId,
};
use crate::shared::protocol::ServerEvent;

/// Key of a lockable resource as seen from one client
pub type LocalLockKey = (ResourceKind, String);

/// Result of merging one inbound event into the replica
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The event was applied to local state
    Applied,
    /// The event targeted a resource this client holds the lock on and
    /// was refused to protect in-flight local edits
    Conflict { kind: ResourceKind, id: String },
    /// The server denied a lock this client had requested
    Denied { kind: ResourceKind, id: String },
    /// The event did not change local state
    Noop,
}

/// Client-side board state with optimistic updates
#[derive(Debug, Default)]
pub struct BoardReplica {
    /// Board this replica mirrors
    board_id: BoardId,
    /// Notes by id
    pub notes: HashMap<NoteId, Note>,
    /// Sections by id
    pub sections: HashMap<SectionId, Section>,
    /// Locks this client holds
    held: HashSet<LocalLockKey>,
    /// Lock requests awaiting a grant or denial
    pending: HashSet<LocalLockKey>,
    /// Locks held by peers, keyed to the editing user
    peer_locks: HashMap<LocalLockKey, UserId>,
}

impl BoardReplica {
    /// Create an empty replica for one board
    pub fn new(board_id: impl Into<BoardId>) -> Self {
        Self {
            board_id: board_id.into(),
            ..Self::default()
        }
    }

    /// Board this replica mirrors
    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    // --- local mutations (optimistic) ---

    /// Create a note locally under a temporary id
    ///
    /// The note is visible immediately; the id is rebound once the
    /// persistence layer confirms a permanent one.
    pub fn create_note(&mut self, x: f64, y: f64, user: impl Into<UserId>) -> Note {
        let temp_id = format!("local-{}", Uuid::new_v4());
        let note = Note::new(temp_id.clone(), self.board_id.clone(), x, y, user);
        self.notes.insert(temp_id, note.clone());
        note
    }

    /// Rebind a temporary note id to the permanent one the store assigned
    pub fn confirm_note_id(&mut self, temp_id: &str, permanent_id: impl Into<NoteId>) -> bool {
        let permanent_id = permanent_id.into();
        let Some(mut note) = self.notes.remove(temp_id) else {
            return false;
        };
        note.id = permanent_id.clone();
        self.notes.insert(permanent_id.clone(), note);

        // Lock bookkeeping follows the rename
        let old_key = (ResourceKind::Note, temp_id.to_string());
        if self.held.remove(&old_key) {
            self.held.insert((ResourceKind::Note, permanent_id.clone()));
        }
        if self.pending.remove(&old_key) {
            self.pending.insert((ResourceKind::Note, permanent_id));
        }
        true
    }

    /// Move a note (drag)
    pub fn move_note(&mut self, id: &str, x: f64, y: f64, user: &str) -> Option<&Note> {
        let note = self.notes.get_mut(id)?;
        note.x = x;
        note.y = y;
        note.updated_by = user.to_string();
        note.updated_at = Utc::now();
        Some(note)
    }

    /// Edit a note's text
    pub fn edit_note_text(&mut self, id: &str, text: &str, user: &str) -> Option<&Note> {
        let note = self.notes.get_mut(id)?;
        note.text = text.to_string();
        note.updated_by = user.to_string();
        note.updated_at = Utc::now();
        Some(note)
    }

    /// Recolor a note
    pub fn recolor_note(&mut self, id: &str, color: &str, user: &str) -> Option<&Note> {
        let note = self.notes.get_mut(id)?;
        note.color = color.to_string();
        note.updated_by = user.to_string();
        note.updated_at = Utc::now();
        Some(note)
    }

    /// Delete a note locally
    pub fn delete_note(&mut self, id: &str) -> bool {
        self.notes.remove(id).is_some()
    }

    /// Create a section locally
    pub fn create_section(&mut self, section: Section) {
        self.sections.insert(section.id.clone(), section);
    }

    /// Delete a section locally, orphaning its notes
    pub fn delete_section(&mut self, id: &str) -> bool {
        if self.sections.remove(id).is_none() {
            return false;
        }
        for note in self.notes.values_mut() {
            if note.section_id.as_deref() == Some(id) {
                note.section_id = None;
            }
        }
        true
    }

    /// Current contents as a board snapshot (for `sync-board`)
    pub fn snapshot(&self) -> Board {
        let mut notes: Vec<Note> = self.notes.values().cloned().collect();
        notes.sort_by(|a, b| a.id.cmp(&b.id));
        let mut sections: Vec<Section> = self.sections.values().cloned().collect();
        sections.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        Board { notes, sections }
    }

    // --- lock bookkeeping ---

    /// Record an outgoing lock request
    pub fn lock_requested(&mut self, kind: ResourceKind, id: impl Into<String>) {
        self.pending.insert((kind, id.into()));
    }

    /// Record an outgoing lock release
    pub fn lock_released(&mut self, kind: ResourceKind, id: &str) {
        self.held.remove(&(kind, id.to_string()));
    }

    /// Whether this client holds the lock on a resource
    pub fn holds_lock(&self, kind: ResourceKind, id: &str) -> bool {
        self.held.contains(&(kind, id.to_string()))
    }

    /// User currently editing a resource, if a peer holds its lock
    pub fn editor_of(&self, kind: ResourceKind, id: &str) -> Option<&UserId> {
        self.peer_locks.get(&(kind, id.to_string()))
    }

    // --- inbound merge ---

    /// Merge one broadcast event into local state
    pub fn apply_remote(&mut self, event: ServerEvent) -> MergeOutcome {
        match event {
            ServerEvent::NoteCreated(note) => {
                self.notes.insert(note.id.clone(), note);
                MergeOutcome::Applied
            }
            ServerEvent::NoteUpdated(note) => {
                if self.holds_lock(ResourceKind::Note, &note.id) {
                    return MergeOutcome::Conflict {
                        kind: ResourceKind::Note,
                        id: note.id,
                    };
                }
                self.notes.insert(note.id.clone(), note);
                MergeOutcome::Applied
            }
            ServerEvent::NoteDeleted { id } => {
                if self.notes.remove(&id).is_some() {
                    MergeOutcome::Applied
                } else {
                    MergeOutcome::Noop
                }
            }
            ServerEvent::SectionCreated(section) => {
                self.sections.insert(section.id.clone(), section);
                MergeOutcome::Applied
            }
            ServerEvent::SectionUpdated(section) => {
                if self.holds_lock(ResourceKind::Section, &section.id) {
                    return MergeOutcome::Conflict {
                        kind: ResourceKind::Section,
                        id: section.id,
                    };
                }
                self.sections.insert(section.id.clone(), section);
                MergeOutcome::Applied
            }
            ServerEvent::SectionDeleted { id } => {
                if self.delete_section(&id) {
                    MergeOutcome::Applied
                } else {
                    MergeOutcome::Noop
                }
            }
            ServerEvent::NoteLocked { id, user_id, .. } => {
                self.merge_lock_grant(ResourceKind::Note, id, user_id)
            }
            ServerEvent::SectionLocked { id, user_id, .. } => {
                self.merge_lock_grant(ResourceKind::Section, id, user_id)
            }
            ServerEvent::NoteUnlocked { id } => self.merge_unlock(ResourceKind::Note, id),
            ServerEvent::SectionUnlocked { id } => self.merge_unlock(ResourceKind::Section, id),
            ServerEvent::LockFailed { id, kind } => {
                self.pending.remove(&(kind, id.clone()));
                MergeOutcome::Denied { kind, id }
            }
            ServerEvent::BoardSynced { notes, sections } => {
                self.notes = notes.into_iter().map(|n| (n.id.clone(), n)).collect();
                self.sections = sections.into_iter().map(|s| (s.id.clone(), s)).collect();
                MergeOutcome::Applied
            }
            ServerEvent::NotesCaptured {
                section_id,
                note_ids,
            } => {
                let mut changed = false;
                for id in note_ids {
                    if let Some(note) = self.notes.get_mut(&id) {
                        note.section_id = Some(section_id.clone());
                        changed = true;
                    }
                }
                if changed {
                    MergeOutcome::Applied
                } else {
                    MergeOutcome::Noop
                }
            }
        }
    }

    fn merge_lock_grant(
        &mut self,
        kind: ResourceKind,
        id: String,
        user_id: UserId,
    ) -> MergeOutcome {
        let key = (kind, id);
        if self.pending.remove(&key) {
            // Our own grant (or idempotent re-grant) coming back to us
            self.held.insert(key);
        } else if !self.held.contains(&key) {
            self.peer_locks.insert(key, user_id);
        }
        MergeOutcome::Applied
    }

    fn merge_unlock(&mut self, kind: ResourceKind, id: String) -> MergeOutcome {
        let key = (kind, id);
        // Covers both a peer's release and our own locks freed by a
        // server-observed disconnect
        self.held.remove(&key);
        self.peer_locks.remove(&key);
        MergeOutcome::Applied
    }
}
