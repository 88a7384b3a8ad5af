/**
 * Spatial Capture Engine
 *
 * Runs once per section creation, after the new section has been written
 * to the store: scans the board's currently-unassigned notes and
 * geometrically assigns those falling inside the new section's bounds.
 *
 * # Containment Test
 *
 * A note is captured when its anchor point, offset by half the note
 * dimensions, falls within the section rectangle:
 *
 * ```text
 * left <= note.x <= right  - w/2
 * top  <= note.y <= bottom - h/2
 * ```
 *
 * With `CaptureGeometry::DefaultSize` the half-offsets use the default
 * 200x140 note size regardless of each note's stored dimensions. That
 * reproduces the source behavior and can mis-capture or miss resized
 * notes at section boundaries; it is a data-quality approximation, never
 * an error. `CaptureGeometry::ActualSize` tests against stored sizes.
 *
 * # One-shot Semantics
 *
 * Capture happens only at section creation. Notes that later move into
 * the section's area are not annexed, and a note already assigned to a
 * section is never reassigned by this engine.
 */
use crate::shared::board::{
    Note, NoteId, Section, SectionId, DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH,
};
use crate::shared::config::CaptureGeometry;

/// Result of one capture pass, returned to the creating client so it can
/// update its local view without a full re-fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    /// The newly created section
    pub section_id: SectionId,
    /// Ids of the notes that were assigned
    pub captured: Vec<NoteId>,
}

impl CaptureOutcome {
    /// Number of notes captured
    pub fn count(&self) -> usize {
        self.captured.len()
    }

    /// Whether any note was captured
    pub fn is_empty(&self) -> bool {
        self.captured.is_empty()
    }
}

/// Run one capture pass over a board's orphan notes
///
/// Only orphans (notes with no section) are considered; the caller is
/// expected to apply the returned ids as one batched store update.
pub fn capture_orphans<'a>(
    section: &Section,
    notes: impl IntoIterator<Item = &'a Note>,
    geometry: CaptureGeometry,
) -> CaptureOutcome {
    let captured: Vec<NoteId> = notes
        .into_iter()
        .filter(|note| note.is_orphan() && anchor_fits(section, note, geometry))
        .map(|note| note.id.clone())
        .collect();
    if !captured.is_empty() {
        tracing::debug!(
            "[Capture] Section {} captured {} orphan note(s)",
            section.id,
            captured.len()
        );
    }
    CaptureOutcome {
        section_id: section.id.clone(),
        captured,
    }
}

/// Containment test for one note anchor against the section rectangle
fn anchor_fits(section: &Section, note: &Note, geometry: CaptureGeometry) -> bool {
    let (w, h) = match geometry {
        CaptureGeometry::DefaultSize => (DEFAULT_NOTE_WIDTH, DEFAULT_NOTE_HEIGHT),
        CaptureGeometry::ActualSize => (note.width, note.height),
    };
    section.x <= note.x
        && note.x <= section.right() - w / 2.0
        && section.y <= note.y
        && note.y <= section.bottom() - h / 2.0
}
