//! Command handlers

pub mod config;
pub mod entry;
pub mod export;
pub mod history;

use anyhow::{Context, Result};

use daybook_core::{dates, Autosave, Config, SqliteStore, SystemClock};

/// The autosave controller over the on-disk store
pub type Journal = Autosave<SqliteStore>;

/// Open the journal database and wrap it in an autosave controller
pub fn open_journal(config: &Config) -> Result<Journal> {
    let store = SqliteStore::open(config).with_context(|| {
        format!(
            "Failed to open journal database at {:?}",
            config.sqlite_path()
        )
    })?;
    Ok(Autosave::new(store, SystemClock).with_debounce(config.debounce()))
}

/// Resolve an optional date argument, defaulting to today
pub fn resolve_date(input: Option<&str>) -> Result<String> {
    Ok(dates::resolve(input.unwrap_or("today"))?)
}

/// Switch the journal to `date`, returning whether it has a stored record
pub fn load(journal: &mut Journal, date: Option<&str>) -> Result<bool> {
    let date = resolve_date(date)?;
    journal
        .load_date(&date)
        .with_context(|| format!("Failed to load entry for {}", date))
}

#[cfg(test)]
pub(crate) fn memory_journal() -> Journal {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    Autosave::new(store, SystemClock)
}
