//! Export command handlers
//!
//! Rendering happens in the core; this module decides which files to
//! write and puts them on disk.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::ValueEnum;
use tracing::debug;

use daybook_core::export::{entry_filename, ENTRIES_DIR, INDEX_FILENAME};
use daybook_core::{backup_file, build_all_entries_html_index, export_entry_files, to_html, ExportFile};

use super::{load, Journal};
use crate::output::Output;

/// Which single-entry documents to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Html,
    Md,
    Json,
    All,
}

/// Export one entry
pub fn export(
    journal: &mut Journal,
    date: Option<&str>,
    format: ExportFormat,
    dir: &Path,
    open: bool,
    output: &Output,
) -> Result<()> {
    load(journal, date)?;
    let files = export_entry_files(journal.current())?;

    let selected: Vec<&ExportFile> = match format {
        ExportFormat::Html => vec![&files.html],
        ExportFormat::Md => vec![&files.md],
        ExportFormat::Json => vec![&files.json],
        ExportFormat::All => files.iter().collect(),
    };

    let mut written = Vec::with_capacity(selected.len());
    for file in selected {
        written.push(write_file(dir, file)?);
    }
    output.print_written(&written);

    if open {
        if let Some(first) = written.first() {
            open::that(first).with_context(|| format!("Failed to open {:?}", first))?;
        }
    }
    Ok(())
}

/// Write the JSON backup of every entry
pub fn backup(journal: &mut Journal, dir: &Path, output: &Output) -> Result<()> {
    let entries = journal
        .flushed_entries()
        .context("Failed to read entries for backup")?;
    let file = backup_file(&entries, Utc::now())?;

    let path = write_file(dir, &file)?;
    output.print_written(&[path]);
    output.message(&format!("{} entry(ies) backed up", entries.len()));
    Ok(())
}

/// Write the index page plus one HTML document per entry
pub fn export_all(journal: &mut Journal, dir: &Path, output: &Output) -> Result<()> {
    let entries = journal
        .flushed_entries()
        .context("Failed to read entries for export")?;
    if entries.is_empty() {
        output.message("No entries to export.");
        return Ok(());
    }

    let mut written = Vec::with_capacity(entries.len() + 1);
    let index = build_all_entries_html_index(&entries)?;
    let index_path = dir.join(INDEX_FILENAME);
    atomic_write(&index_path, index.as_bytes())?;
    written.push(index_path);

    let entries_dir = dir.join(ENTRIES_DIR);
    for entry in &entries {
        let path = entries_dir.join(entry_filename(&entry.date, "html"));
        atomic_write(&path, to_html(entry)?.as_bytes())?;
        written.push(path);
    }

    output.print_written(&written);
    Ok(())
}

fn write_file(dir: &Path, file: &ExportFile) -> Result<PathBuf> {
    let path = dir.join(&file.filename);
    atomic_write(&path, file.text.as_bytes())?;
    debug!("Wrote {} ({})", path.display(), file.mime);
    Ok(path)
}

/// Write data to a file atomically
///
/// Writes to a temporary file first, then renames to the target.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;

    file.write_all(data)
        .with_context(|| format!("Failed to write to temp file {:?}", temp_path))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {:?}", temp_path))?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::memory_journal;
    use crate::output::OutputFormat;
    use daybook_core::Edit;
    use tempfile::TempDir;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn journal_with(dates: &[&str]) -> Journal {
        let mut journal = memory_journal();
        for date in dates {
            journal.load_date(date).unwrap();
            journal
                .edit(Edit::SetHeadline(format!("Day {}", date)))
                .unwrap();
        }
        journal
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("journal-2024-06-01.md");

        atomic_write(&path, b"# Test\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "# Test\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_export_single_format() {
        let temp_dir = TempDir::new().unwrap();
        let mut journal = journal_with(&["2024-06-01"]);

        export(
            &mut journal,
            Some("2024-06-01"),
            ExportFormat::Md,
            temp_dir.path(),
            false,
            &quiet(),
        )
        .unwrap();

        let md = fs::read_to_string(temp_dir.path().join("journal-2024-06-01.md")).unwrap();
        assert!(md.starts_with("# Day 2024-06-01\n"));
        assert!(!temp_dir.path().join("journal-2024-06-01.html").exists());
    }

    #[test]
    fn test_export_all_formats() {
        let temp_dir = TempDir::new().unwrap();
        let mut journal = journal_with(&["2024-06-01"]);

        export(
            &mut journal,
            Some("2024-06-01"),
            ExportFormat::All,
            temp_dir.path(),
            false,
            &quiet(),
        )
        .unwrap();

        for ext in ["html", "md", "json"] {
            assert!(temp_dir
                .path()
                .join(format!("journal-2024-06-01.{}", ext))
                .exists());
        }
    }

    #[test]
    fn test_backup_flushes_pending_edits() {
        let temp_dir = TempDir::new().unwrap();
        let mut journal = journal_with(&["2024-01-01", "2024-01-02"]);
        assert!(journal.is_dirty());

        backup(&mut journal, temp_dir.path(), &quiet()).unwrap();

        let text = fs::read_to_string(temp_dir.path().join("journal-backup-all.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let entries = parsed["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["date"], "2024-01-02");
        assert!(parsed["exportedAt"].is_string());
    }

    #[test]
    fn test_export_all_writes_index_and_entries() {
        let temp_dir = TempDir::new().unwrap();
        let mut journal = journal_with(&["2024-01-01", "2024-01-02"]);

        export_all(&mut journal, temp_dir.path(), &quiet()).unwrap();

        let index = fs::read_to_string(temp_dir.path().join(INDEX_FILENAME)).unwrap();
        assert!(index.contains("entries/journal-2024-01-01.html"));
        assert!(index.contains("entries/journal-2024-01-02.html"));

        let page = fs::read_to_string(
            temp_dir
                .path()
                .join("entries")
                .join("journal-2024-01-02.html"),
        )
        .unwrap();
        assert!(page.contains("Day 2024-01-02"));
    }

    #[test]
    fn test_export_all_without_entries() {
        let temp_dir = TempDir::new().unwrap();
        let mut journal = memory_journal();

        export_all(&mut journal, temp_dir.path(), &quiet()).unwrap();
        assert!(!temp_dir.path().join(INDEX_FILENAME).exists());
    }
}
