/**
 * Debounced Persistence Writer
 *
 * Queues local mutations for the external document store, coalescing
 * rapid repeated writes to the same resource: a burst of position
 * updates during a continuous drag collapses into a single outbound
 * write fired once the debounce window (500 ms by default) has elapsed
 * since the last mutation in the burst.
 *
 * A pointer release at the end of a drag additionally triggers an
 * immediate, non-debounced flush of the final state, so the persisted
 * value matches the last visible position even when the window has not
 * yet elapsed.
 *
 * Persistence is fully decoupled from the lock/broadcast path: a slow
 * document store write never stalls other users' real-time events.
 */
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::shared::board::{Note, NoteId, Section, SectionId};

/// Default debounce window
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Failure writing to the external document store
#[derive(Debug, Error)]
pub enum PersistError {
    /// The store could not be reached
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    /// The store rejected the write
    #[error("document store rejected write: {0}")]
    Rejected(String),
}

/// Write access to the external document store
///
/// The durable store is an external collaborator; this seam is all the
/// reconciliation agent knows about it.
#[allow(async_fn_in_trait)]
pub trait BoardPersister {
    /// Create or patch a note
    async fn persist_note(&self, note: &Note) -> Result<(), PersistError>;

    /// Create or patch a section
    async fn persist_section(&self, section: &Section) -> Result<(), PersistError>;
}

/// Reference to one debounced resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Note(NoteId),
    Section(SectionId),
}

#[derive(Debug, Clone)]
enum Payload {
    Note(Note),
    Section(Section),
}

#[derive(Debug)]
struct Pending {
    payload: Payload,
    due_at: Instant,
}

/// Per-resource debounced write queue
#[derive(Debug)]
pub struct DebouncedWriter<P> {
    persister: P,
    window: Duration,
    pending: Mutex<HashMap<ResourceRef, Pending>>,
}

impl<P: BoardPersister> DebouncedWriter<P> {
    /// Create a writer with the default 500 ms window
    pub fn new(persister: P) -> Self {
        Self::with_window(persister, DEBOUNCE_WINDOW)
    }

    /// Create a writer with an explicit window
    pub fn with_window(persister: P, window: Duration) -> Self {
        Self {
            persister,
            window,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Queue a note write, replacing any pending write for the same note
    /// and restarting its debounce window
    pub fn record_note(&self, note: Note) {
        let mut pending = self.pending.lock().unwrap();
        pending.insert(
            ResourceRef::Note(note.id.clone()),
            Pending {
                payload: Payload::Note(note),
                due_at: Instant::now() + self.window,
            },
        );
    }

    /// Queue a section write, replacing any pending write for the same
    /// section and restarting its debounce window
    pub fn record_section(&self, section: Section) {
        let mut pending = self.pending.lock().unwrap();
        pending.insert(
            ResourceRef::Section(section.id.clone()),
            Pending {
                payload: Payload::Section(section),
                due_at: Instant::now() + self.window,
            },
        );
    }

    /// Number of writes currently pending
    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .lock()
            .unwrap()
            .values()
            .map(|entry| entry.due_at)
            .min()
    }

    /// Immediately flush one resource, ignoring its debounce deadline
    ///
    /// Used at the end of a drag gesture. Returns whether a pending
    /// write existed for the resource.
    pub async fn flush_resource(&self, resource: &ResourceRef) -> Result<bool, PersistError> {
        let entry = self.pending.lock().unwrap().remove(resource);
        match entry {
            Some(pending) => {
                self.write(pending.payload).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Flush every write whose debounce window has elapsed
    ///
    /// Returns the number of writes persisted. Store failures are logged
    /// and the failed write is dropped; the optimistic local state is
    /// still authoritative for the UI.
    pub async fn flush_due(&self) -> usize {
        let now = Instant::now();
        let due: Vec<Payload> = {
            let mut pending = self.pending.lock().unwrap();
            let keys: Vec<ResourceRef> = pending
                .iter()
                .filter(|(_, entry)| entry.due_at <= now)
                .map(|(key, _)| key.clone())
                .collect();
            keys.into_iter()
                .filter_map(|key| pending.remove(&key))
                .map(|entry| entry.payload)
                .collect()
        };

        let mut written = 0;
        for payload in due {
            match self.write(payload).await {
                Ok(()) => written += 1,
                Err(e) => tracing::warn!("[Persist] Dropped failed write: {}", e),
            }
        }
        written
    }

    /// Drive the queue: sleep until the next deadline, then flush
    pub async fn run(&self) {
        loop {
            match self.next_deadline() {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => tokio::time::sleep(self.window).await,
            }
            self.flush_due().await;
        }
    }

    async fn write(&self, payload: Payload) -> Result<(), PersistError> {
        match payload {
            Payload::Note(note) => self.persister.persist_note(&note).await,
            Payload::Section(section) => self.persister.persist_section(&section).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Records every write it receives
    #[derive(Debug, Default, Clone)]
    struct RecordingPersister {
        notes: Arc<Mutex<Vec<Note>>>,
        sections: Arc<Mutex<Vec<Section>>>,
    }

    impl BoardPersister for RecordingPersister {
        async fn persist_note(&self, note: &Note) -> Result<(), PersistError> {
            self.notes.lock().unwrap().push(note.clone());
            Ok(())
        }

        async fn persist_section(&self, section: &Section) -> Result<(), PersistError> {
            self.sections.lock().unwrap().push(section.clone());
            Ok(())
        }
    }

    fn note_at(x: f64) -> Note {
        let mut note = Note::new("n1", "b1", x, 0.0, "u1");
        note.updated_at = chrono::Utc::now();
        note
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_write() {
        let persister = RecordingPersister::default();
        let writer = DebouncedWriter::new(persister.clone());

        // Rapid drag: five positions inside one window
        for x in [10.0, 20.0, 30.0, 40.0, 50.0] {
            writer.record_note(note_at(x));
            tokio::time::advance(Duration::from_millis(50)).await;
        }

        // Window restarts on every mutation; nothing is due yet
        assert_eq!(writer.flush_due().await, 0);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(writer.flush_due().await, 1);

        let written = persister.notes.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].x, 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_due_before_window_elapses() {
        let persister = RecordingPersister::default();
        let writer = DebouncedWriter::new(persister.clone());
        writer.record_note(note_at(1.0));

        tokio::time::advance(Duration::from_millis(499)).await;
        assert_eq!(writer.flush_due().await, 0);
        assert_eq!(writer.pending_len(), 1);

        tokio::time::advance(Duration::from_millis(2)).await;
        assert_eq!(writer.flush_due().await, 1);
        assert_eq!(writer.pending_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_end_flushes_immediately() {
        let persister = RecordingPersister::default();
        let writer = DebouncedWriter::new(persister.clone());
        writer.record_note(note_at(75.0));

        // Pointer release: no waiting for the window
        let flushed = writer
            .flush_resource(&ResourceRef::Note("n1".into()))
            .await
            .unwrap();
        assert!(flushed);
        assert_eq!(persister.notes.lock().unwrap()[0].x, 75.0);

        // The entry is gone; the window elapsing must not write again
        tokio::time::advance(Duration::from_millis(600)).await;
        assert_eq!(writer.flush_due().await, 0);
        assert_eq!(persister.notes.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_resources_debounce_independently() {
        let persister = RecordingPersister::default();
        let writer = DebouncedWriter::new(persister.clone());

        writer.record_note(note_at(1.0));
        writer.record_section(Section::new("s1", "b1", 0.0, 0.0, 10.0, 10.0));

        tokio::time::advance(Duration::from_millis(501)).await;
        assert_eq!(writer.flush_due().await, 2);
        assert_eq!(persister.notes.lock().unwrap().len(), 1);
        assert_eq!(persister.sections.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_unknown_resource_is_noop() {
        let writer = DebouncedWriter::new(RecordingPersister::default());
        let flushed = writer
            .flush_resource(&ResourceRef::Note("ghost".into()))
            .await
            .unwrap();
        assert!(!flushed);
    }
}
