/**
 * Board Data Structures
 *
 * This module defines the Note and Section structs that make up a board,
 * and their serialization/deserialization for WebSocket communication.
 *
 * The structs are shared between server and client, allowing seamless
 * serialization over the wire and deserialization in both contexts.
 * Field names serialize as camelCase to match the JSON payloads the
 * browser clients exchange.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External project reference identifying one board
pub type BoardId = String;

/// Note identifier
///
/// Freshly created notes carry a client-local temporary id until the
/// persistence layer confirms a permanent one, so ids are free-form
/// strings rather than UUIDs.
pub type NoteId = String;

/// Section identifier
pub type SectionId = String;

/// User identity as supplied by the external session layer
pub type UserId = String;

/// Default note width in logical units
pub const DEFAULT_NOTE_WIDTH: f64 = 200.0;

/// Default note height in logical units
pub const DEFAULT_NOTE_HEIGHT: f64 = 140.0;

/// Kind of lockable board resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A freeform note
    Note,
    /// A rectangular spatial section
    Section,
}

impl ResourceKind {
    /// Wire name of this kind, used to build event names like `note-locked`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Section => "section",
        }
    }
}

/// A freeform note on a board
///
/// Position is world-space and unconstrained (may be negative or
/// unbounded). A note belongs to exactly one board and optionally to one
/// section on the same board; `section_id == None` marks an orphan note,
/// eligible for auto-capture when a new section is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Note id (temporary client-local id until persistence confirms one)
    pub id: NoteId,
    /// Owning board
    pub board_id: BoardId,
    /// World-space x position
    pub x: f64,
    /// World-space y position
    pub y: f64,
    /// Width in logical units
    #[serde(default = "default_note_width")]
    pub width: f64,
    /// Height in logical units
    #[serde(default = "default_note_height")]
    pub height: f64,
    /// Display color
    #[serde(default)]
    pub color: String,
    /// Free text content
    #[serde(default)]
    pub text: String,
    /// Optional due date
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Optional assignee
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub assignee: Option<UserId>,
    /// Owning section, if any
    #[serde(default)]
    pub section_id: Option<SectionId>,
    /// Creator identity
    #[serde(default)]
    pub created_by: UserId,
    /// Last updater identity
    #[serde(default)]
    pub updated_by: UserId,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

fn default_note_width() -> f64 {
    DEFAULT_NOTE_WIDTH
}

fn default_note_height() -> f64 {
    DEFAULT_NOTE_HEIGHT
}

impl Note {
    /// Create a new note at the given position with default geometry
    pub fn new(
        id: impl Into<NoteId>,
        board_id: impl Into<BoardId>,
        x: f64,
        y: f64,
        created_by: impl Into<UserId>,
    ) -> Self {
        let now = Utc::now();
        let created_by = created_by.into();
        Self {
            id: id.into(),
            board_id: board_id.into(),
            x,
            y,
            width: DEFAULT_NOTE_WIDTH,
            height: DEFAULT_NOTE_HEIGHT,
            color: String::new(),
            text: String::new(),
            due_date: None,
            assignee: None,
            section_id: None,
            created_by: created_by.clone(),
            updated_by: created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the display color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set an explicit size, overriding the defaults
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Assign the note to a section
    pub fn in_section(mut self, section_id: impl Into<SectionId>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    /// Whether the note is unassigned and eligible for auto-capture
    pub fn is_orphan(&self) -> bool {
        self.section_id.is_none()
    }
}

/// A rectangular spatial grouping of notes
///
/// The bounding region is used only at creation time by the capture
/// engine; sections do not dynamically re-capture notes that move into
/// them later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Section id
    pub id: SectionId,
    /// Owning board
    pub board_id: BoardId,
    /// World-space x position of the left edge
    pub x: f64,
    /// World-space y position of the top edge
    pub y: f64,
    /// Width in logical units
    pub width: f64,
    /// Height in logical units
    pub height: f64,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Display color
    #[serde(default)]
    pub color: String,
    /// Stacking order
    #[serde(default)]
    pub z_index: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Section {
    /// Create a new section with the given bounds
    pub fn new(
        id: impl Into<SectionId>,
        board_id: impl Into<BoardId>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            board_id: board_id.into(),
            x,
            y,
            width,
            height,
            title: String::new(),
            color: String::new(),
            z_index: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Right edge of the section bounds
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge of the section bounds
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Full contents of one board, as exchanged by `sync-board`
///
/// A board is created lazily on first access to a project reference and
/// is never deleted by this subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    /// All notes on the board
    pub notes: Vec<Note>,
    /// All sections on the board
    pub sections: Vec<Section>,
}
