//! Debounced autosave
//!
//! [`Autosave`] owns the entry currently being edited and turns a stream of
//! edits into as few store writes as possible.
//!
//! ## States
//!
//! ```text
//! Clean --edit--> Dirty(deadline) --edit--> Dirty(later deadline)
//!                      |
//!                      | tick() past deadline, or save_now()
//!                      v
//!                   Saving --ok--> Clean
//!                      |
//!                      +--err--> Dirty(no deadline)
//! ```
//!
//! Every edit re-arms the timer, so only inactivity longer than the
//! debounce window triggers a write. `save_now` skips the wait. There is a
//! single dirty flag: one successful write clears it no matter how many
//! edits were coalesced into it.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::dates;
use crate::models::{Edit, EditError, Entry};
use crate::storage::{EntryStore, StorageResult};

/// Default inactivity window before an edit is persisted
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Persistence state of the current entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// Everything in memory is stored
    Clean,
    /// Unsaved edits; `deadline` is when the armed timer fires, `None` after
    /// a failed write until the next edit re-arms it
    Dirty { deadline: Option<DateTime<Utc>> },
    /// A write is in progress
    Saving,
}

/// Autosave controller over an [`EntryStore`]
pub struct Autosave<S: EntryStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    debounce: Duration,
    current: Entry,
    state: SaveState,
}

impl<S: EntryStore, C: Clock> Autosave<S, C> {
    /// Create a controller editing a blank entry for today
    ///
    /// Nothing is read or written until [`load_date`](Self::load_date) or an
    /// edit.
    pub fn new(store: S, clock: C) -> Self {
        let current = Entry::blank_at(dates::today(), clock.now());
        Self {
            store,
            clock,
            debounce: Duration::milliseconds(DEFAULT_DEBOUNCE_MS as i64),
            current,
            state: SaveState::Clean,
        }
    }

    /// Set the inactivity window
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn current(&self) -> &Entry {
        &self.current
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.state, SaveState::Dirty { .. })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Apply an edit to the current entry and re-arm the save timer
    ///
    /// Edits that change nothing leave the state alone.
    pub fn edit(&mut self, edit: Edit) -> Result<&Entry, EditError> {
        if self.current.apply(edit)? {
            self.mark_dirty();
        }
        Ok(&self.current)
    }

    /// Write if the debounce window has elapsed since the last edit
    ///
    /// Returns whether a write happened.
    pub fn tick(&mut self) -> StorageResult<bool> {
        let state = self.state;
        match state {
            SaveState::Dirty {
                deadline: Some(deadline),
            } if self.clock.now() >= deadline => {
                debug!("Autosave timer fired for {}", self.current.date);
                self.write()
            }
            _ => Ok(false),
        }
    }

    /// Flush pending edits immediately
    ///
    /// Cancels the timer and writes when dirty; does nothing when clean.
    /// Returns whether a write happened.
    pub fn save_now(&mut self) -> StorageResult<bool> {
        match self.state {
            SaveState::Dirty { .. } => self.write(),
            SaveState::Clean | SaveState::Saving => Ok(false),
        }
    }

    /// Switch to another date
    ///
    /// Pending edits for the previous date are flushed first; if that write
    /// fails the switch is abandoned and the current entry kept. Returns
    /// whether a stored record was found (otherwise a blank entry is used).
    pub fn load_date(&mut self, date: &str) -> StorageResult<bool> {
        self.save_now()?;

        let found = self.store.get(date)?;
        let exists = found.is_some();
        self.current = found.unwrap_or_else(|| Entry::blank_at(date, self.clock.now()));
        self.state = SaveState::Clean;

        debug!(
            "Loaded {} ({})",
            date,
            if exists { "stored" } else { "new" }
        );
        Ok(exists)
    }

    /// Remove the stored record for `date`
    ///
    /// When `date` is the one being edited, the pending write is cancelled
    /// and editing continues on a blank entry.
    pub fn delete_entry(&mut self, date: &str) -> StorageResult<()> {
        self.store.delete(date)?;

        if self.current.date == date {
            self.current = Entry::blank_at(date, self.clock.now());
            self.state = SaveState::Clean;
        }
        info!("Cleared entry {}", date);
        Ok(())
    }

    /// All stored entries, newest first
    pub fn list_entries(&self) -> StorageResult<Vec<Entry>> {
        self.store.list()
    }

    /// Stored entries matching a substring query, newest first
    pub fn search(&self, query: &str) -> StorageResult<Vec<Entry>> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter(|entry| entry.matches(query))
            .collect())
    }

    /// Flush, then list everything (for backups and bulk export)
    pub fn flushed_entries(&mut self) -> StorageResult<Vec<Entry>> {
        self.save_now()?;
        self.store.list()
    }

    fn mark_dirty(&mut self) {
        let deadline = self.clock.now() + self.debounce;
        self.state = SaveState::Dirty {
            deadline: Some(deadline),
        };
        debug!("Autosave armed for {} until {}", self.current.date, deadline);
    }

    fn write(&mut self) -> StorageResult<bool> {
        self.state = SaveState::Saving;
        // Only a successful write moves updated_at
        let mut saved = self.current.clone();
        saved.updated_at = self.clock.now();

        match self.store.put(&saved) {
            Ok(()) => {
                self.current.updated_at = saved.updated_at;
                self.state = SaveState::Clean;
                info!("Saved entry {}", self.current.date);
                Ok(true)
            }
            Err(e) => {
                self.state = SaveState::Dirty { deadline: None };
                warn!("Failed to save entry {}: {}", self.current.date, e);
                Err(e)
            }
        }
    }
}
