//! History command handlers

use anyhow::{Context, Result};

use super::Journal;
use crate::output::Output;

/// List stored entries, newest first, optionally filtered by a search query
pub fn list(journal: &Journal, search: Option<&str>, output: &Output) -> Result<()> {
    let entries = match search {
        Some(query) => journal
            .search(query)
            .with_context(|| format!("Failed to search entries for '{}'", query))?,
        None => journal.list_entries().context("Failed to list entries")?,
    };

    output.print_entries(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::memory_journal;
    use crate::output::OutputFormat;
    use daybook_core::Edit;

    #[test]
    fn test_list_and_search() {
        let mut journal = memory_journal();
        for (date, headline) in [("2024-01-01", "Snow day"), ("2024-02-01", "Rain")] {
            journal.load_date(date).unwrap();
            journal.edit(Edit::SetHeadline(headline.to_string())).unwrap();
        }
        journal.save_now().unwrap();

        let out = Output::new(OutputFormat::Quiet);
        list(&journal, None, &out).unwrap();
        list(&journal, Some("snow"), &out).unwrap();

        assert_eq!(journal.search("snow").unwrap().len(), 1);
        assert_eq!(journal.list_entries().unwrap().len(), 2);
    }
}
