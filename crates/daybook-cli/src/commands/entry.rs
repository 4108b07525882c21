//! Entry command handlers
//!
//! Each command loads its date, applies edits through the autosave
//! controller and flushes before returning.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;

use daybook_core::{Edit, Template};

use super::{load, resolve_date, Journal};
use crate::editor::{confirm, edit_text, strip_comments, with_instructions};
use crate::output::Output;

/// Long-form fields that can be written in $EDITOR
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntryField {
    FreeWrite,
    Highlights,
    Gratitude,
}

impl EntryField {
    fn label(self) -> &'static str {
        match self {
            EntryField::FreeWrite => "Free write",
            EntryField::Highlights => "Highlights",
            EntryField::Gratitude => "Gratitude",
        }
    }

    fn edit(self, text: String) -> Edit {
        match self {
            EntryField::FreeWrite => Edit::SetFreeWrite(text),
            EntryField::Highlights => Edit::SetHighlights(text),
            EntryField::Gratitude => Edit::SetGratitude(text),
        }
    }
}

/// Field values given to `daybook set`
#[derive(Debug, Default)]
pub struct SetFields {
    pub headline: Option<String>,
    pub mood: Option<f64>,
    pub free_write: Option<String>,
    pub highlights: Option<String>,
    pub gratitude: Option<String>,
}

impl SetFields {
    fn into_edits(self) -> Vec<Edit> {
        let mut edits = Vec::new();
        if let Some(headline) = self.headline {
            edits.push(Edit::SetHeadline(headline));
        }
        if let Some(mood) = self.mood {
            edits.push(Edit::SetMood(mood));
        }
        if let Some(text) = self.free_write {
            edits.push(Edit::SetFreeWrite(text));
        }
        if let Some(text) = self.highlights {
            edits.push(Edit::SetHighlights(text));
        }
        if let Some(text) = self.gratitude {
            edits.push(Edit::SetGratitude(text));
        }
        edits
    }
}

/// Show the entry for a date
pub fn show(journal: &mut Journal, date: Option<&str>, output: &Output) -> Result<()> {
    let stored = load(journal, date)?;
    output.print_entry(journal.current(), stored)
}

/// Set one or more fields
pub fn set(
    journal: &mut Journal,
    date: Option<&str>,
    fields: SetFields,
    output: &Output,
) -> Result<()> {
    let edits = fields.into_edits();
    if edits.is_empty() {
        bail!("Nothing to set. Pass --headline, --mood, --free-write, --highlights or --gratitude.");
    }

    load(journal, date)?;
    apply_all(journal, edits)?;
    flush(journal)?;

    output.success(&format!("Updated entry {}", journal.current().date));
    Ok(())
}

/// Append an item, optionally filling it in
pub fn item_add(
    journal: &mut Journal,
    date: Option<&str>,
    prompt: Option<String>,
    answer: Option<String>,
    output: &Output,
) -> Result<()> {
    load(journal, date)?;

    let edits = if prompt.is_none() && answer.is_none() {
        vec![Edit::AddBlankItem]
    } else if journal.current().has_only_blank_item() {
        // Fill the empty item instead of leaving it above the new one
        item_edits(0, prompt, answer)
    } else {
        let mut edits = vec![Edit::AddItem];
        edits.extend(item_edits(journal.current().items.len(), prompt, answer));
        edits
    };
    apply_all(journal, edits)?;
    flush(journal)?;

    output.success(&format!(
        "Entry {} has {} item(s)",
        journal.current().date,
        journal.current().items.len()
    ));
    Ok(())
}

/// Change the prompt and/or answer of an item
pub fn item_set(
    journal: &mut Journal,
    date: Option<&str>,
    position: usize,
    prompt: Option<String>,
    answer: Option<String>,
    output: &Output,
) -> Result<()> {
    if prompt.is_none() && answer.is_none() {
        bail!("Nothing to set. Pass --prompt and/or --answer.");
    }
    let index = position_to_index(position)?;

    load(journal, date)?;
    apply_all(journal, item_edits(index, prompt, answer))?;
    flush(journal)?;

    output.success(&format!("Updated prompt {}", position));
    Ok(())
}

/// Remove an item
pub fn item_remove(
    journal: &mut Journal,
    date: Option<&str>,
    position: usize,
    output: &Output,
) -> Result<()> {
    let index = position_to_index(position)?;

    load(journal, date)?;
    journal.edit(Edit::RemoveItem(index))?;
    flush(journal)?;

    output.success(&format!("Removed prompt {}", position));
    Ok(())
}

/// Replace all items with pasted prompts
///
/// Reads from FILE when given, otherwise from piped stdin, otherwise opens
/// the editor.
pub fn prompts(
    journal: &mut Journal,
    date: Option<&str>,
    file: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let pasted = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prompts from {:?}", path))?,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read prompts from stdin")?;
            text
        }
        None => {
            let initial = with_instructions("One prompt per line", "");
            strip_comments(&edit_text(&initial).context("Failed to edit prompts")?)
        }
    };

    load(journal, date)?;
    journal.edit(Edit::ReplacePrompts(pasted))?;
    if !journal.is_dirty() {
        output.message("No prompts given; entry unchanged.");
        return Ok(());
    }
    flush(journal)?;

    output.success(&format!(
        "Entry {} now has {} prompt(s)",
        journal.current().date,
        journal.current().items.len()
    ));
    Ok(())
}

/// Fill an entry from a TOML template file
///
/// An empty headline takes the template's; its prompts replace a blank
/// entry's items and are appended otherwise.
pub fn template(
    journal: &mut Journal,
    date: Option<&str>,
    file: &Path,
    output: &Output,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read template {:?}", file))?;
    let template = Template::from_toml(&text)
        .with_context(|| format!("Invalid template {:?}", file))?;

    load(journal, date)?;
    journal.edit(Edit::ApplyTemplate(template))?;
    if !journal.is_dirty() {
        output.message("Template had nothing to add; entry unchanged.");
        return Ok(());
    }
    flush(journal)?;

    output.success(&format!(
        "Applied template to {} ({} prompt(s))",
        journal.current().date,
        journal.current().items.len()
    ));
    Ok(())
}

/// Append a highlight snippet on its own line
pub fn highlight(
    journal: &mut Journal,
    date: Option<&str>,
    text: String,
    output: &Output,
) -> Result<()> {
    load(journal, date)?;

    let existing = &journal.current().highlights;
    let snippet = if existing.is_empty() || existing.ends_with('\n') {
        text
    } else {
        format!("\n{}", text)
    };
    journal.edit(Edit::InsertHighlight(snippet))?;
    flush(journal)?;

    output.success(&format!("Added highlight to {}", journal.current().date));
    Ok(())
}

/// Edit a long-form field in $EDITOR
pub fn write(
    journal: &mut Journal,
    date: Option<&str>,
    field: EntryField,
    output: &Output,
) -> Result<()> {
    load(journal, date)?;

    let entry = journal.current();
    let current = match field {
        EntryField::FreeWrite => &entry.free_write,
        EntryField::Highlights => &entry.highlights,
        EntryField::Gratitude => &entry.gratitude,
    };
    let initial = with_instructions(&format!("{} for {}", field.label(), entry.date), current);

    let edited = strip_comments(&edit_text(&initial).context("Failed to edit entry")?);
    journal.edit(field.edit(edited))?;
    flush(journal)?;

    output.success(&format!("Saved {} for {}", field.label(), journal.current().date));
    Ok(())
}

/// Delete the stored entry for a date
pub fn clear(journal: &mut Journal, date: Option<&str>, yes: bool, output: &Output) -> Result<()> {
    let date = resolve_date(date)?;

    if !yes {
        if !output.should_prompt() {
            bail!("Refusing to clear {} without --yes", date);
        }
        if !confirm(&format!("Clear the entry for {}?", date))? {
            output.message("Cancelled.");
            return Ok(());
        }
    }

    journal
        .delete_entry(&date)
        .with_context(|| format!("Failed to clear entry {}", date))?;

    output.success(&format!("Cleared entry {}", date));
    Ok(())
}

fn item_edits(index: usize, prompt: Option<String>, answer: Option<String>) -> Vec<Edit> {
    let mut edits = Vec::new();
    if let Some(text) = prompt {
        edits.push(Edit::SetPrompt { index, text });
    }
    if let Some(text) = answer {
        edits.push(Edit::SetAnswer { index, text });
    }
    edits
}

fn apply_all(journal: &mut Journal, edits: Vec<Edit>) -> Result<()> {
    for edit in edits {
        journal.edit(edit)?;
    }
    Ok(())
}

fn flush(journal: &mut Journal) -> Result<()> {
    let date = journal.current().date.clone();
    journal
        .save_now()
        .with_context(|| format!("Failed to save entry {}", date))?;
    Ok(())
}

/// Convert a 1-based item position to an index
fn position_to_index(position: usize) -> Result<usize> {
    match position.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("Item positions start at 1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::memory_journal;
    use crate::output::OutputFormat;
    use daybook_core::{EntryStore, Item, SaveState};

    const DATE: &str = "2024-06-01";

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_set_writes_fields() {
        let mut journal = memory_journal();
        let fields = SetFields {
            headline: Some("Test".to_string()),
            mood: Some(8.0),
            ..Default::default()
        };

        set(&mut journal, Some(DATE), fields, &quiet()).unwrap();

        let stored = journal.store().get(DATE).unwrap().unwrap();
        assert_eq!(stored.headline, "Test");
        assert_eq!(stored.mood, 8.0);
        assert_eq!(journal.state(), SaveState::Clean);
    }

    #[test]
    fn test_set_requires_a_field() {
        let mut journal = memory_journal();
        assert!(set(&mut journal, Some(DATE), SetFields::default(), &quiet()).is_err());
        assert!(journal.store().get(DATE).unwrap().is_none());
    }

    #[test]
    fn test_item_commands() {
        let mut journal = memory_journal();
        let out = quiet();

        // First add fills the blank item
        item_add(
            &mut journal,
            Some(DATE),
            Some("What went well?".to_string()),
            None,
            &out,
        )
        .unwrap();
        item_add(&mut journal, Some(DATE), None, None, &out).unwrap();
        assert_eq!(journal.current().items.len(), 2);

        item_set(
            &mut journal,
            Some(DATE),
            2,
            Some("What next?".to_string()),
            Some("Rest".to_string()),
            &out,
        )
        .unwrap();
        let stored = journal.store().get(DATE).unwrap().unwrap();
        assert_eq!(stored.items[1], Item::new("What next?", "Rest"));

        item_remove(&mut journal, Some(DATE), 1, &out).unwrap();
        let stored = journal.store().get(DATE).unwrap().unwrap();
        assert_eq!(stored.items, vec![Item::new("What next?", "Rest")]);
    }

    #[test]
    fn test_item_position_errors() {
        let mut journal = memory_journal();
        let out = quiet();

        assert!(item_remove(&mut journal, Some(DATE), 0, &out).is_err());

        let err = item_remove(&mut journal, Some(DATE), 3, &out).unwrap_err();
        assert!(err.to_string().contains("No item at position 3"));
        assert!(journal.store().get(DATE).unwrap().is_none());
    }

    #[test]
    fn test_prompts_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("prompts.txt");
        std::fs::write(&path, "  What went well?\n\nWhat was hard?  \n").unwrap();

        let mut journal = memory_journal();
        prompts(&mut journal, Some(DATE), Some(path), &quiet()).unwrap();

        let stored = journal.store().get(DATE).unwrap().unwrap();
        assert_eq!(
            stored.items,
            vec![Item::new("What went well?", ""), Item::new("What was hard?", "")]
        );
    }

    #[test]
    fn test_blank_prompts_file_changes_nothing() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("prompts.txt");
        std::fs::write(&path, "\n   \n").unwrap();

        let mut journal = memory_journal();
        prompts(&mut journal, Some(DATE), Some(path), &quiet()).unwrap();
        assert!(journal.store().get(DATE).unwrap().is_none());
    }

    #[test]
    fn test_non_finite_mood_is_stored_as_shown() {
        let mut journal = memory_journal();
        let fields = SetFields {
            mood: Some(f64::NAN),
            ..Default::default()
        };
        set(&mut journal, Some(DATE), fields, &quiet()).unwrap();

        let stored = journal.store().get(DATE).unwrap().unwrap();
        assert_eq!(journal.current().mood, 6.0);
        assert_eq!(stored.mood, journal.current().mood);
    }

    fn write_template(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("homecoming.toml");
        std::fs::write(
            &path,
            "headline = \"DAY 1 - Homecoming\"\n\
             prompts = [\"What did I notice first?\", \"What do I want from today?\"]\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_template_on_blank_entry() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = write_template(&temp_dir);

        let mut journal = memory_journal();
        template(&mut journal, Some(DATE), &path, &quiet()).unwrap();

        let stored = journal.store().get(DATE).unwrap().unwrap();
        assert_eq!(stored.headline, "DAY 1 - Homecoming");
        assert_eq!(
            stored.items,
            vec![
                Item::new("What did I notice first?", ""),
                Item::new("What do I want from today?", "")
            ]
        );
    }

    #[test]
    fn test_template_on_written_entry() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = write_template(&temp_dir);

        let mut journal = memory_journal();
        let fields = SetFields {
            headline: Some("Rainy".to_string()),
            ..Default::default()
        };
        set(&mut journal, Some(DATE), fields, &quiet()).unwrap();
        item_add(
            &mut journal,
            Some(DATE),
            Some("Mine".to_string()),
            Some("kept".to_string()),
            &quiet(),
        )
        .unwrap();

        template(&mut journal, Some(DATE), &path, &quiet()).unwrap();

        let stored = journal.store().get(DATE).unwrap().unwrap();
        assert_eq!(stored.headline, "Rainy");
        assert_eq!(stored.items.len(), 3);
        assert_eq!(stored.items[0], Item::new("Mine", "kept"));
    }

    #[test]
    fn test_template_errors() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut journal = memory_journal();

        let missing = temp_dir.path().join("missing.toml");
        assert!(template(&mut journal, Some(DATE), &missing, &quiet()).is_err());

        let broken = temp_dir.path().join("broken.toml");
        std::fs::write(&broken, "prompts = \"not a list\"").unwrap();
        let err = template(&mut journal, Some(DATE), &broken, &quiet()).unwrap_err();
        assert!(err.to_string().contains("Invalid template"));
        assert!(journal.store().get(DATE).unwrap().is_none());
    }

    #[test]
    fn test_highlights_stack_on_lines() {
        let mut journal = memory_journal();
        highlight(&mut journal, Some(DATE), "Sunrise".to_string(), &quiet()).unwrap();
        highlight(&mut journal, Some(DATE), "Coffee".to_string(), &quiet()).unwrap();

        let stored = journal.store().get(DATE).unwrap().unwrap();
        assert_eq!(stored.highlights, "Sunrise\nCoffee");
    }

    #[test]
    fn test_clear_with_yes() {
        let mut journal = memory_journal();
        let fields = SetFields {
            headline: Some("Gone".to_string()),
            ..Default::default()
        };
        set(&mut journal, Some(DATE), fields, &quiet()).unwrap();

        clear(&mut journal, Some(DATE), true, &quiet()).unwrap();
        assert!(journal.store().get(DATE).unwrap().is_none());
        assert_eq!(journal.current().headline, "");
    }

    #[test]
    fn test_clear_refuses_without_confirmation() {
        let mut journal = memory_journal();
        let fields = SetFields {
            headline: Some("Kept".to_string()),
            ..Default::default()
        };
        set(&mut journal, Some(DATE), fields, &quiet()).unwrap();

        assert!(clear(&mut journal, Some(DATE), false, &quiet()).is_err());
        assert!(journal.store().get(DATE).unwrap().is_some());
    }
}
