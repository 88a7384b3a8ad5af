/**
 * In-memory Board Store
 *
 * The server-side mirror of board contents, consulted by the capture
 * engine and by `sync-board` handling. The durable document store is an
 * external collaborator reached from the client side; this process keeps
 * only the working copy it needs to serve real-time traffic, behind the
 * same interface (`BoardStore`) that a database-backed implementation
 * would provide.
 *
 * Boards are created lazily on first access to a project reference and
 * never deleted by this subsystem.
 */
use std::collections::HashMap;
use std::sync::RwLock;

use crate::shared::board::{Board, BoardId, Note, NoteId, Section, SectionId};

/// Persistence interface consumed by the synchronization core
///
/// Mirrors the external document store surface: create/patch/delete for
/// notes and sections, batch operations for notes, and full-board listing
/// and replacement.
pub trait BoardStore: Send + Sync {
    /// Full contents of a board (creating it lazily if absent)
    fn snapshot(&self, board_id: &str) -> Board;

    /// Insert or overwrite a note
    fn upsert_note(&self, note: Note);

    /// Delete a note; returns whether it existed
    fn remove_note(&self, board_id: &str, note_id: &str) -> bool;

    /// Batch-delete notes; returns how many existed
    fn remove_notes(&self, board_id: &str, note_ids: &[NoteId]) -> usize;

    /// Insert or overwrite a section
    fn upsert_section(&self, section: Section);

    /// Delete a section, clearing `section_id` on its notes rather than
    /// cascading; returns whether the section existed
    fn remove_section(&self, board_id: &str, section_id: &str) -> bool;

    /// All notes on a board with no section assignment
    fn orphan_notes(&self, board_id: &str) -> Vec<Note>;

    /// Batch-assign notes to a section; returns how many were updated
    fn assign_section(&self, board_id: &str, note_ids: &[NoteId], section_id: &str) -> usize;

    /// Overwrite the full contents of a board (used by `sync-board`)
    fn replace_board(&self, board_id: &str, notes: Vec<Note>, sections: Vec<Section>);
}

#[derive(Debug, Default)]
struct BoardData {
    notes: HashMap<NoteId, Note>,
    sections: HashMap<SectionId, Section>,
}

/// Process-memory `BoardStore` implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    boards: RwLock<HashMap<BoardId, BoardData>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of boards touched so far
    pub fn board_count(&self) -> usize {
        self.boards.read().unwrap().len()
    }
}

impl BoardStore for MemoryStore {
    fn snapshot(&self, board_id: &str) -> Board {
        {
            let boards = self.boards.read().unwrap();
            if let Some(data) = boards.get(board_id) {
                let mut notes: Vec<Note> = data.notes.values().cloned().collect();
                notes.sort_by(|a, b| a.id.cmp(&b.id));
                let mut sections: Vec<Section> = data.sections.values().cloned().collect();
                sections.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
                return Board { notes, sections };
            }
        }
        // Lazy creation on first access
        self.boards
            .write()
            .unwrap()
            .entry(board_id.to_string())
            .or_default();
        Board::default()
    }

    fn upsert_note(&self, note: Note) {
        let mut boards = self.boards.write().unwrap();
        let data = boards.entry(note.board_id.clone()).or_default();
        data.notes.insert(note.id.clone(), note);
    }

    fn remove_note(&self, board_id: &str, note_id: &str) -> bool {
        let mut boards = self.boards.write().unwrap();
        boards
            .get_mut(board_id)
            .map(|data| data.notes.remove(note_id).is_some())
            .unwrap_or(false)
    }

    fn remove_notes(&self, board_id: &str, note_ids: &[NoteId]) -> usize {
        let mut boards = self.boards.write().unwrap();
        let Some(data) = boards.get_mut(board_id) else {
            return 0;
        };
        note_ids
            .iter()
            .filter(|id| data.notes.remove(*id).is_some())
            .count()
    }

    fn upsert_section(&self, section: Section) {
        let mut boards = self.boards.write().unwrap();
        let data = boards.entry(section.board_id.clone()).or_default();
        data.sections.insert(section.id.clone(), section);
    }

    fn remove_section(&self, board_id: &str, section_id: &str) -> bool {
        let mut boards = self.boards.write().unwrap();
        let Some(data) = boards.get_mut(board_id) else {
            return false;
        };
        if data.sections.remove(section_id).is_none() {
            return false;
        }
        // Orphan the members instead of cascading the delete
        for note in data.notes.values_mut() {
            if note.section_id.as_deref() == Some(section_id) {
                note.section_id = None;
            }
        }
        true
    }

    fn orphan_notes(&self, board_id: &str) -> Vec<Note> {
        let boards = self.boards.read().unwrap();
        boards
            .get(board_id)
            .map(|data| {
                data.notes
                    .values()
                    .filter(|note| note.is_orphan())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn assign_section(&self, board_id: &str, note_ids: &[NoteId], section_id: &str) -> usize {
        let mut boards = self.boards.write().unwrap();
        let Some(data) = boards.get_mut(board_id) else {
            return 0;
        };
        let mut updated = 0;
        for id in note_ids {
            if let Some(note) = data.notes.get_mut(id) {
                note.section_id = Some(section_id.to_string());
                updated += 1;
            }
        }
        updated
    }

    fn replace_board(&self, board_id: &str, notes: Vec<Note>, sections: Vec<Section>) {
        let mut boards = self.boards.write().unwrap();
        let data = boards.entry(board_id.to_string()).or_default();
        data.notes = notes.into_iter().map(|n| (n.id.clone(), n)).collect();
        data.sections = sections.into_iter().map(|s| (s.id.clone(), s)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_creates_board_lazily() {
        let store = MemoryStore::new();
        assert_eq!(store.board_count(), 0);
        let board = store.snapshot("b1");
        assert!(board.notes.is_empty());
        assert_eq!(store.board_count(), 1);
    }

    #[test]
    fn test_note_round_trip() {
        let store = MemoryStore::new();
        store.upsert_note(Note::new("n1", "b1", 1.0, 2.0, "u1"));
        let board = store.snapshot("b1");
        assert_eq!(board.notes.len(), 1);
        assert_eq!(board.notes[0].id, "n1");

        assert!(store.remove_note("b1", "n1"));
        assert!(!store.remove_note("b1", "n1"));
    }

    #[test]
    fn test_remove_notes_batch_counts_existing() {
        let store = MemoryStore::new();
        store.upsert_note(Note::new("n1", "b1", 0.0, 0.0, "u1"));
        store.upsert_note(Note::new("n2", "b1", 0.0, 0.0, "u1"));
        let removed = store.remove_notes("b1", &["n1".into(), "n2".into(), "ghost".into()]);
        assert_eq!(removed, 2);
        assert!(store.snapshot("b1").notes.is_empty());
    }

    #[test]
    fn test_section_delete_orphans_notes() {
        let store = MemoryStore::new();
        store.upsert_section(Section::new("s1", "b1", 0.0, 0.0, 100.0, 100.0));
        store.upsert_note(Note::new("n1", "b1", 10.0, 10.0, "u1").in_section("s1"));

        assert!(store.remove_section("b1", "s1"));
        let board = store.snapshot("b1");
        assert!(board.sections.is_empty());
        assert_eq!(board.notes.len(), 1);
        assert!(board.notes[0].is_orphan());
    }

    #[test]
    fn test_orphans_and_batch_assignment() {
        let store = MemoryStore::new();
        store.upsert_note(Note::new("n1", "b1", 0.0, 0.0, "u1"));
        store.upsert_note(Note::new("n2", "b1", 0.0, 0.0, "u1").in_section("s0"));
        assert_eq!(store.orphan_notes("b1").len(), 1);

        let updated = store.assign_section("b1", &["n1".into()], "s1");
        assert_eq!(updated, 1);
        assert!(store.orphan_notes("b1").is_empty());
    }

    #[test]
    fn test_replace_board_overwrites_contents() {
        let store = MemoryStore::new();
        store.upsert_note(Note::new("stale", "b1", 0.0, 0.0, "u1"));
        store.replace_board(
            "b1",
            vec![Note::new("n1", "b1", 0.0, 0.0, "u1")],
            vec![Section::new("s1", "b1", 0.0, 0.0, 50.0, 50.0)],
        );
        let board = store.snapshot("b1");
        assert_eq!(board.notes.len(), 1);
        assert_eq!(board.notes[0].id, "n1");
        assert_eq!(board.sections.len(), 1);
    }

    #[test]
    fn test_sections_sorted_by_z_index() {
        let store = MemoryStore::new();
        let mut back = Section::new("sb", "b1", 0.0, 0.0, 10.0, 10.0);
        back.z_index = 0;
        let mut front = Section::new("sa", "b1", 0.0, 0.0, 10.0, 10.0);
        front.z_index = 5;
        store.upsert_section(front);
        store.upsert_section(back);
        let board = store.snapshot("b1");
        assert_eq!(board.sections[0].id, "sb");
        assert_eq!(board.sections[1].id, "sa");
    }
}
