/**
 * Wire Protocol
 *
 * This module defines the full message surface of the synchronization
 * protocol: every inbound client message and every outbound server event,
 * modeled as two tagged unions so the protocol can be dispatched through
 * a single match and enumerated in one place.
 *
 * # Wire Format
 *
 * Messages serialize as `{"event": "<name>", "data": {...}}` with
 * kebab-case event names and camelCase payload fields:
 *
 * ```json
 * {"event": "request-lock", "data": {"boardId": "b1", "id": "n1", "type": "note", "userId": "u1"}}
 * ```
 *
 * # Delivery Scope
 *
 * Mutation events (`note-created`, `section-updated`, `board-synced`, ...)
 * are relayed room-scoped and sender-excluded. Lock announcements
 * (`note-locked`, `note-unlocked`, ...) go to the whole room including
 * the requester. `lock-failed` is delivered to the requester only.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::board::{BoardId, Note, NoteId, ResourceKind, Section, SectionId, UserId};

/// Identifier of one gateway connection
///
/// Assigned by the gateway at upgrade time; never supplied by clients.
pub type ConnectionId = Uuid;

/// Inbound message from a client connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Join the broadcast room for a board
    JoinBoard { board_id: BoardId },
    /// Create a note and relay it to room peers
    CreateNote { board_id: BoardId, note: Note },
    /// Update a note and relay it to room peers
    UpdateNote { board_id: BoardId, note: Note },
    /// Delete a note and relay the deletion to room peers
    DeleteNote { board_id: BoardId, note_id: NoteId },
    /// Create a section, run auto-capture, relay to room peers
    CreateSection { board_id: BoardId, section: Section },
    /// Update a section and relay it to room peers
    UpdateSection { board_id: BoardId, section: Section },
    /// Delete a section (orphans its notes) and relay the deletion
    DeleteSection {
        board_id: BoardId,
        section_id: SectionId,
    },
    /// Request an advisory edit lock on one resource
    RequestLock {
        board_id: BoardId,
        id: String,
        #[serde(rename = "type")]
        kind: ResourceKind,
        user_id: UserId,
    },
    /// Release a held lock (non-holder release is a silent no-op)
    ReleaseLock {
        board_id: BoardId,
        id: String,
        #[serde(rename = "type")]
        kind: ResourceKind,
    },
    /// Push full board state to re-establish consistency after undo/redo
    SyncBoard {
        board_id: BoardId,
        notes: Vec<Note>,
        sections: Vec<Section>,
    },
}

impl ClientMessage {
    /// Board the message addresses
    pub fn board_id(&self) -> &BoardId {
        match self {
            Self::JoinBoard { board_id }
            | Self::CreateNote { board_id, .. }
            | Self::UpdateNote { board_id, .. }
            | Self::DeleteNote { board_id, .. }
            | Self::CreateSection { board_id, .. }
            | Self::UpdateSection { board_id, .. }
            | Self::DeleteSection { board_id, .. }
            | Self::RequestLock { board_id, .. }
            | Self::ReleaseLock { board_id, .. }
            | Self::SyncBoard { board_id, .. } => board_id,
        }
    }
}

/// Outbound event broadcast by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// A note was created by a room peer
    NoteCreated(Note),
    /// A note was updated by a room peer
    NoteUpdated(Note),
    /// A note was deleted by a room peer
    NoteDeleted { id: NoteId },
    /// A section was created by a room peer
    SectionCreated(Section),
    /// A section was updated by a room peer
    SectionUpdated(Section),
    /// A section was deleted by a room peer; its notes are now orphans
    SectionDeleted { id: SectionId },
    /// A note lock was granted; rendered as "being edited by user X"
    NoteLocked {
        id: NoteId,
        user_id: UserId,
        connection_id: ConnectionId,
    },
    /// A section lock was granted
    SectionLocked {
        id: SectionId,
        user_id: UserId,
        connection_id: ConnectionId,
    },
    /// A note lock was released (explicitly or by disconnect)
    NoteUnlocked { id: NoteId },
    /// A section lock was released (explicitly or by disconnect)
    SectionUnlocked { id: SectionId },
    /// Lock request denied; sent to the requester only
    LockFailed {
        id: String,
        #[serde(rename = "type")]
        kind: ResourceKind,
    },
    /// Full board state pushed by a peer after undo/redo
    BoardSynced {
        notes: Vec<Note>,
        sections: Vec<Section>,
    },
    /// Auto-capture assigned these orphan notes to a new section
    NotesCaptured {
        section_id: SectionId,
        note_ids: Vec<NoteId>,
    },
}

impl ServerEvent {
    /// Create the `<kind>-locked` announcement for a granted lock
    pub fn locked(
        kind: ResourceKind,
        id: impl Into<String>,
        user_id: impl Into<UserId>,
        connection_id: ConnectionId,
    ) -> Self {
        match kind {
            ResourceKind::Note => Self::NoteLocked {
                id: id.into(),
                user_id: user_id.into(),
                connection_id,
            },
            ResourceKind::Section => Self::SectionLocked {
                id: id.into(),
                user_id: user_id.into(),
                connection_id,
            },
        }
    }

    /// Create the `<kind>-unlocked` announcement for a released lock
    pub fn unlocked(kind: ResourceKind, id: impl Into<String>) -> Self {
        match kind {
            ResourceKind::Note => Self::NoteUnlocked { id: id.into() },
            ResourceKind::Section => Self::SectionUnlocked { id: id.into() },
        }
    }

    /// Create the `lock-failed` reply for a denied request
    pub fn lock_failed(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::LockFailed {
            id: id.into(),
            kind,
        }
    }

    /// Wire name of this event, as it appears in the `event` field
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoteCreated(_) => "note-created",
            Self::NoteUpdated(_) => "note-updated",
            Self::NoteDeleted { .. } => "note-deleted",
            Self::SectionCreated(_) => "section-created",
            Self::SectionUpdated(_) => "section-updated",
            Self::SectionDeleted { .. } => "section-deleted",
            Self::NoteLocked { .. } => "note-locked",
            Self::SectionLocked { .. } => "section-locked",
            Self::NoteUnlocked { .. } => "note-unlocked",
            Self::SectionUnlocked { .. } => "section-unlocked",
            Self::LockFailed { .. } => "lock-failed",
            Self::BoardSynced { .. } => "board-synced",
            Self::NotesCaptured { .. } => "notes-captured",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_name(value: &serde_json::Value) -> &str {
        value["event"].as_str().unwrap()
    }

    #[test]
    fn test_join_board_wire_format() {
        let msg = ClientMessage::JoinBoard {
            board_id: "b1".into(),
        };
        assert_eq!(msg.board_id(), "b1");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(event_name(&json), "join-board");
        assert_eq!(json["data"]["boardId"], "b1");
    }

    #[test]
    fn test_server_event_names_match_serialized_tag() {
        let events = vec![
            ServerEvent::NoteCreated(Note::new("n1", "b1", 0.0, 0.0, "u1")),
            ServerEvent::NoteDeleted { id: "n1".into() },
            ServerEvent::SectionUnlocked { id: "s1".into() },
            ServerEvent::lock_failed(ResourceKind::Section, "s1"),
            ServerEvent::NotesCaptured {
                section_id: "s1".into(),
                note_ids: vec![],
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(event_name(&json), event.name());
        }
    }

    #[test]
    fn test_request_lock_wire_format() {
        let msg = ClientMessage::RequestLock {
            board_id: "b1".into(),
            id: "n1".into(),
            kind: ResourceKind::Note,
            user_id: "u1".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(event_name(&json), "request-lock");
        assert_eq!(json["data"]["type"], "note");
        assert_eq!(json["data"]["userId"], "u1");
    }

    #[test]
    fn test_client_message_round_trip() {
        let msgs = vec![
            ClientMessage::JoinBoard {
                board_id: "b1".into(),
            },
            ClientMessage::DeleteNote {
                board_id: "b1".into(),
                note_id: "n1".into(),
            },
            ClientMessage::ReleaseLock {
                board_id: "b1".into(),
                id: "s1".into(),
                kind: ResourceKind::Section,
            },
            ClientMessage::SyncBoard {
                board_id: "b1".into(),
                notes: vec![],
                sections: vec![],
            },
        ];
        for msg in msgs {
            let json = serde_json::to_string(&msg).unwrap();
            let back: ClientMessage = serde_json::from_str(&json).unwrap();
            assert_eq!(back, msg);
        }
    }

    #[test]
    fn test_lock_event_names_follow_kind() {
        let conn = Uuid::new_v4();
        let locked = ServerEvent::locked(ResourceKind::Note, "n1", "u1", conn);
        let json = serde_json::to_value(&locked).unwrap();
        assert_eq!(event_name(&json), "note-locked");
        assert_eq!(json["data"]["connectionId"], conn.to_string());

        let unlocked = ServerEvent::unlocked(ResourceKind::Section, "s1");
        let json = serde_json::to_value(&unlocked).unwrap();
        assert_eq!(event_name(&json), "section-unlocked");
        assert_eq!(json["data"]["id"], "s1");
    }

    #[test]
    fn test_lock_failed_carries_kind_as_type() {
        let event = ServerEvent::lock_failed(ResourceKind::Note, "n1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(event_name(&json), "lock-failed");
        assert_eq!(json["data"]["type"], "note");
        assert_eq!(json["data"]["id"], "n1");
    }

    #[test]
    fn test_note_created_payload_is_the_note() {
        let note = Note::new("n1", "b1", 0.0, 0.0, "u1");
        let event = ServerEvent::NoteCreated(note.clone());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(event_name(&json), "note-created");
        assert_eq!(json["data"]["id"], "n1");

        let back: ServerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, ServerEvent::NoteCreated(note));
    }

    #[test]
    fn test_board_synced_round_trip() {
        let event = ServerEvent::BoardSynced {
            notes: vec![Note::new("n1", "b1", 0.0, 0.0, "u1")],
            sections: vec![Section::new("s1", "b1", 0.0, 0.0, 100.0, 100.0)],
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ServerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_malformed_payload_is_an_error_not_a_panic() {
        let malformed = r#"{"event": "request-lock", "data": {"boardId": "b1"}}"#;
        assert!(serde_json::from_str::<ClientMessage>(malformed).is_err());

        let unknown = r#"{"event": "no-such-event", "data": {}}"#;
        assert!(serde_json::from_str::<ClientMessage>(unknown).is_err());
    }
}
