/**
 * Protocol Dispatch
 *
 * The single dispatch point for every inbound client message. Modeling
 * the protocol as one tagged union processed through one match keeps its
 * full surface area enumerable and testable in one place.
 *
 * Every handler here runs to completion without yielding: store mutation,
 * lock arbitration, and broadcast fan-out happen synchronously within one
 * message's turn, which is what makes per-resource lock transitions
 * totally ordered by arrival.
 */
use crate::backend::capture::capture_orphans;
use crate::backend::error::BackendError;
use crate::backend::gateway::connection::Connection;
use crate::backend::locks::{AcquireOutcome, LockKey, ReleaseOutcome};
use crate::shared::protocol::{ClientMessage, ServerEvent};

impl Connection {
    /// Dispatch one parsed client message
    pub fn handle_message(&mut self, message: ClientMessage) -> Result<(), BackendError> {
        match message {
            ClientMessage::JoinBoard { board_id } => {
                self.join(&board_id);
                Ok(())
            }

            ClientMessage::CreateNote { board_id, note } => {
                ensure_same_board(&board_id, &note.board_id, "note")?;
                self.state.store.upsert_note(note.clone());
                self.state
                    .rooms
                    .broadcast(&board_id, Some(self.id), ServerEvent::NoteCreated(note));
                Ok(())
            }

            ClientMessage::UpdateNote { board_id, note } => {
                ensure_same_board(&board_id, &note.board_id, "note")?;
                self.state.store.upsert_note(note.clone());
                self.state
                    .rooms
                    .broadcast(&board_id, Some(self.id), ServerEvent::NoteUpdated(note));
                Ok(())
            }

            ClientMessage::DeleteNote { board_id, note_id } => {
                if !self.state.store.remove_note(&board_id, &note_id) {
                    tracing::debug!("[Gateway] Delete of unknown note {}", note_id);
                }
                self.state.rooms.broadcast(
                    &board_id,
                    Some(self.id),
                    ServerEvent::NoteDeleted { id: note_id },
                );
                Ok(())
            }

            ClientMessage::CreateSection { board_id, section } => {
                ensure_same_board(&board_id, &section.board_id, "section")?;
                self.state.store.upsert_section(section.clone());

                // Auto-capture runs once, synchronously, after the
                // section is stored
                let orphans = self.state.store.orphan_notes(&board_id);
                let outcome =
                    capture_orphans(&section, &orphans, self.state.config.capture_geometry);

                self.state.rooms.broadcast(
                    &board_id,
                    Some(self.id),
                    ServerEvent::SectionCreated(section),
                );

                if !outcome.is_empty() {
                    let assigned = self.state.store.assign_section(
                        &board_id,
                        &outcome.captured,
                        &outcome.section_id,
                    );
                    tracing::info!(
                        "[Capture] Assigned {} of {} captured note(s) to new section {}",
                        assigned,
                        outcome.count(),
                        outcome.section_id
                    );
                    // Delivered to the whole room: the creator updates its
                    // local view from this instead of re-fetching
                    self.state.rooms.broadcast(
                        &board_id,
                        None,
                        ServerEvent::NotesCaptured {
                            section_id: outcome.section_id,
                            note_ids: outcome.captured,
                        },
                    );
                }
                Ok(())
            }

            ClientMessage::UpdateSection { board_id, section } => {
                ensure_same_board(&board_id, &section.board_id, "section")?;
                self.state.store.upsert_section(section.clone());
                self.state.rooms.broadcast(
                    &board_id,
                    Some(self.id),
                    ServerEvent::SectionUpdated(section),
                );
                Ok(())
            }

            ClientMessage::DeleteSection {
                board_id,
                section_id,
            } => {
                if !self.state.store.remove_section(&board_id, &section_id) {
                    tracing::debug!("[Gateway] Delete of unknown section {}", section_id);
                }
                self.state.rooms.broadcast(
                    &board_id,
                    Some(self.id),
                    ServerEvent::SectionDeleted { id: section_id },
                );
                Ok(())
            }

            ClientMessage::RequestLock {
                board_id,
                id,
                kind,
                user_id,
            } => {
                let key = LockKey::new(board_id.clone(), kind, id.clone());
                match self.state.locks.acquire(key, self.id, &user_id) {
                    AcquireOutcome::Granted => {
                        // Announced to the whole room, requester included,
                        // so peers can render "being edited by user X"
                        self.state.rooms.broadcast(
                            &board_id,
                            None,
                            ServerEvent::locked(kind, id, user_id, self.id),
                        );
                    }
                    AcquireOutcome::Denied => {
                        // Contention is an expected outcome, surfaced to
                        // the requester only
                        let _ = self.outbound.send(ServerEvent::lock_failed(kind, id));
                    }
                }
                Ok(())
            }

            ClientMessage::ReleaseLock { board_id, id, kind } => {
                let key = LockKey::new(board_id.clone(), kind, id.clone());
                match self.state.locks.release(&key, self.id) {
                    ReleaseOutcome::Released => {
                        self.state.rooms.broadcast(
                            &board_id,
                            None,
                            ServerEvent::unlocked(kind, id),
                        );
                    }
                    ReleaseOutcome::Ignored => {
                        tracing::debug!(
                            "[Gateway] Ignored release of {:?} {} by non-holder {}",
                            kind,
                            id,
                            self.id
                        );
                    }
                }
                Ok(())
            }

            ClientMessage::SyncBoard {
                board_id,
                notes,
                sections,
            } => {
                self.state
                    .store
                    .replace_board(&board_id, notes.clone(), sections.clone());
                self.state.rooms.broadcast(
                    &board_id,
                    Some(self.id),
                    ServerEvent::BoardSynced { notes, sections },
                );
                Ok(())
            }
        }
    }
}

/// Reject a payload whose embedded resource names a different board
fn ensure_same_board(
    expected: &str,
    actual: &str,
    what: &'static str,
) -> Result<(), BackendError> {
    if expected == actual {
        Ok(())
    } else {
        Err(BackendError::protocol(format!(
            "{} addressed to board {} but belongs to {}",
            what, expected, actual
        )))
    }
}
