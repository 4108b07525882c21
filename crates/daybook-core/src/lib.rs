//! Daybook Core Library
//!
//! This crate provides the entry lifecycle layer for Daybook, a local-first
//! journal that keeps exactly one entry per calendar date.
//!
//! # Architecture
//!
//! - **Entry model**: canonical record shape plus normalization of raw records
//! - **Storage**: date-keyed SQLite store behind the `EntryStore` trait
//! - **Autosave**: debounced, coalesced writes of the entry being edited
//! - **Export**: pure renderers for HTML, Markdown, JSON and the backup envelope
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let store = SqliteStore::open(&config)?;
//! let mut journal = Autosave::new(store, SystemClock).with_debounce(config.debounce());
//!
//! journal.load_date("2024-06-01")?;
//! journal.edit(Edit::SetHeadline("Test".into()))?;
//! journal.save_now()?;
//!
//! let files = export_entry_files(journal.current())?;
//! ```
//!
//! # Modules
//!
//! - `models`: `Entry`, `Item`, `Edit` and `normalize_entry`
//! - `dates`: date keys and day arithmetic
//! - `storage`: SQLite persistence and storage errors
//! - `clock`: injectable time source
//! - `autosave`: the debounce controller that owns the current entry
//! - `export`: document renderers
//! - `config`: application configuration

pub mod autosave;
pub mod clock;
pub mod config;
pub mod dates;
pub mod export;
pub mod models;
pub mod storage;

pub use autosave::{Autosave, SaveState, DEFAULT_DEBOUNCE_MS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use dates::DateError;
pub use export::{
    backup_file, build_all_entries_html_index, export_entry_files, to_html, to_json, to_markdown,
    EntryFiles, ExportError, ExportFile,
};
pub use models::{normalize_entry, Edit, EditError, Entry, Item, Template};
pub use storage::{EntryStore, SqliteStore, StorageError, StorageResult};
