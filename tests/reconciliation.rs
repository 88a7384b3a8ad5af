//! Broadcast and reconciliation integration tests
//!
//! Covers sender exclusion, full-board resync, and the client replica
//! merging events exactly as a second browser would.

mod common;

use assert_matches::assert_matches;
use common::{TestClient, test_state};
use corkboard::backend::store::BoardStore;
use corkboard::client::replica::{BoardReplica, MergeOutcome};
use corkboard::shared::board::{Note, ResourceKind, Section};
use corkboard::shared::protocol::{ClientMessage, ServerEvent};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_mutations_are_never_echoed_to_the_sender() {
    let state = test_state();
    let mut c1 = TestClient::connect_and_join(&state, "B1").await;
    let mut c2 = TestClient::connect_and_join(&state, "B1").await;

    c1.send(ClientMessage::CreateNote {
        board_id: "B1".to_string(),
        note: Note::new("n1", "B1", 0.0, 0.0, "u1"),
    });
    c1.send(ClientMessage::UpdateNote {
        board_id: "B1".to_string(),
        note: Note::new("n1", "B1", 10.0, 10.0, "u1"),
    });
    c1.send(ClientMessage::DeleteNote {
        board_id: "B1".to_string(),
        note_id: "n1".to_string(),
    });

    // The originator already has local optimistic state
    c1.assert_silent().await;

    let events = c2.drain().await;
    assert_eq!(events.len(), 3);
    assert_matches!(&events[0], ServerEvent::NoteCreated(note) if note.id == "n1");
    assert_matches!(&events[1], ServerEvent::NoteUpdated(note) if note.x == 10.0);
    assert_matches!(&events[2], ServerEvent::NoteDeleted { id } if id == "n1");
}

#[tokio::test]
async fn test_events_are_scoped_to_the_room() {
    let state = test_state();
    let mut c1 = TestClient::connect_and_join(&state, "B1").await;
    let mut other_board = TestClient::connect_and_join(&state, "B2").await;

    c1.send(ClientMessage::CreateNote {
        board_id: "B1".to_string(),
        note: Note::new("n1", "B1", 0.0, 0.0, "u1"),
    });

    other_board.assert_silent().await;
}

#[tokio::test]
async fn test_sync_board_reaches_peers_only() {
    let state = test_state();
    let mut c1 = TestClient::connect_and_join(&state, "B1").await;
    let mut c2 = TestClient::connect_and_join(&state, "B1").await;

    c1.send(ClientMessage::SyncBoard {
        board_id: "B1".to_string(),
        notes: vec![Note::new("n1", "B1", 5.0, 5.0, "u1")],
        sections: vec![Section::new("s1", "B1", 0.0, 0.0, 100.0, 100.0)],
    });

    c1.assert_silent().await;
    assert_matches!(
        c2.recv().await,
        ServerEvent::BoardSynced { notes, sections }
            if notes.len() == 1 && sections.len() == 1
    );

    // The server mirror now reflects the pushed state
    let board = state.store.snapshot("B1");
    assert_eq!(board.notes.len(), 1);
    assert_eq!(board.sections.len(), 1);
}

#[tokio::test]
async fn test_peer_replica_converges_with_server_mirror() {
    let state = test_state();
    let mut c1 = TestClient::connect_and_join(&state, "B1").await;
    let mut c2 = TestClient::connect_and_join(&state, "B1").await;
    let mut replica = BoardReplica::new("B1");

    c1.send(ClientMessage::CreateNote {
        board_id: "B1".to_string(),
        note: Note::new("n1", "B1", 150.0, 150.0, "u1"),
    });
    c1.send(ClientMessage::CreateNote {
        board_id: "B1".to_string(),
        note: Note::new("n2", "B1", 900.0, 900.0, "u1"),
    });
    c1.send(ClientMessage::CreateSection {
        board_id: "B1".to_string(),
        section: Section::new("s1", "B1", 0.0, 0.0, 300.0, 300.0),
    });
    c1.send(ClientMessage::DeleteNote {
        board_id: "B1".to_string(),
        note_id: "n2".to_string(),
    });

    for event in c2.drain().await {
        replica.apply_remote(event);
    }

    // C2's replica and the server mirror tell the same story
    assert_eq!(replica.snapshot(), state.store.snapshot("B1"));
    assert_eq!(
        replica.notes["n1"].section_id.as_deref(),
        Some("s1"),
        "capture assignment reached the peer"
    );
}

#[tokio::test]
async fn test_replica_refuses_updates_for_resources_it_has_locked() {
    let state = test_state();
    let mut c1 = TestClient::connect_and_join(&state, "B1").await;
    let mut c2 = TestClient::connect_and_join(&state, "B1").await;
    let mut replica = BoardReplica::new("B1");

    c1.send(ClientMessage::CreateNote {
        board_id: "B1".to_string(),
        note: Note::new("n1", "B1", 0.0, 0.0, "u1"),
    });
    for event in c2.drain().await {
        replica.apply_remote(event);
    }

    // C2 takes the edit lock and starts typing
    replica.lock_requested(ResourceKind::Note, "n1");
    c2.send(ClientMessage::RequestLock {
        board_id: "B1".to_string(),
        id: "n1".to_string(),
        kind: ResourceKind::Note,
        user_id: "u2".to_string(),
    });
    for event in c2.drain().await {
        replica.apply_remote(event);
    }
    assert!(replica.holds_lock(ResourceKind::Note, "n1"));
    replica.edit_note_text("n1", "my in-flight edit", "u2");

    // A peer update arrives for the same note (the peer ignored the
    // advisory lock); the replica surfaces a conflict instead of
    // overwriting
    c1.send(ClientMessage::UpdateNote {
        board_id: "B1".to_string(),
        note: Note::new("n1", "B1", 0.0, 0.0, "u1").with_text("peer overwrite"),
    });
    let events = c2.drain().await;
    assert_eq!(events.len(), 1);
    let outcome = replica.apply_remote(events.into_iter().next().unwrap());
    assert_eq!(
        outcome,
        MergeOutcome::Conflict {
            kind: ResourceKind::Note,
            id: "n1".to_string()
        }
    );
    assert_eq!(replica.notes["n1"].text, "my in-flight edit");
}

#[tokio::test]
async fn test_lock_state_renders_for_peers_and_clears_on_disconnect() {
    let state = test_state();
    let mut c1 = TestClient::connect_and_join(&state, "B1").await;
    let mut c2 = TestClient::connect_and_join(&state, "B1").await;
    let mut replica = BoardReplica::new("B1");

    c1.send(ClientMessage::RequestLock {
        board_id: "B1".to_string(),
        id: "n1".to_string(),
        kind: ResourceKind::Note,
        user_id: "u1".to_string(),
    });
    for event in c2.drain().await {
        replica.apply_remote(event);
    }
    assert_eq!(
        replica
            .editor_of(ResourceKind::Note, "n1")
            .map(String::as_str),
        Some("u1")
    );

    c1.disconnect();
    for event in c2.drain().await {
        replica.apply_remote(event);
    }
    assert!(replica.editor_of(ResourceKind::Note, "n1").is_none());
}
