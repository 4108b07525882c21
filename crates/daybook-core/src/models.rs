//! Data models for Daybook
//!
//! Defines the journal [`Entry`], its prompt/answer [`Item`]s, and the
//! [`Edit`] intents the front end dispatches against the current entry.
//!
//! Records read from storage are never trusted as-is: [`normalize_entry`]
//! repairs any shape (older formats, partial writes, hand-edited backups)
//! into the canonical form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::dates;

/// Mood given to a blank entry
pub const DEFAULT_MOOD: f64 = 6.0;

/// Title used when the headline is blank
pub const DEFAULT_TITLE: &str = "Journal Entry";

/// A prompt and the answer written for it
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub prompt: String,
    pub answer: String,
}

impl Item {
    pub fn new(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            answer: answer.into(),
        }
    }

    /// True when neither prompt nor answer has visible content
    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty() && self.answer.trim().is_empty()
    }

    fn from_value(value: &Value) -> Self {
        Self {
            prompt: string_field(value, "prompt").unwrap_or_default(),
            answer: string_field(value, "answer").unwrap_or_default(),
        }
    }
}

/// The journal record for one calendar date
///
/// Field order here is the serialized field order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// `YYYY-MM-DD`, the storage key
    pub date: String,
    pub headline: String,
    /// Not range-checked; the UI offers 0-10
    #[serde(serialize_with = "serialize_mood")]
    pub mood: f64,
    /// Never empty
    pub items: Vec<Item>,
    pub free_write: String,
    pub highlights: String,
    pub gratitude: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every persisted write
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Create a blank entry for `date`, timestamped now
    pub fn blank(date: impl Into<String>) -> Self {
        Self::blank_at(date, Utc::now())
    }

    /// Create a blank entry for `date` with both timestamps set to `now`
    pub fn blank_at(date: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            date: date.into(),
            headline: String::new(),
            mood: DEFAULT_MOOD,
            items: vec![Item::default()],
            free_write: String::new(),
            highlights: String::new(),
            gratitude: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Re-apply the canonical invariants to a typed entry
    pub fn normalized(mut self) -> Self {
        if self.date.trim().is_empty() {
            self.date = dates::today();
        }
        if self.items.is_empty() {
            self.items.push(Item::default());
        }
        if !self.mood.is_finite() {
            self.mood = DEFAULT_MOOD;
        }
        self
    }

    /// Trimmed headline, or the default title when blank
    pub fn title(&self) -> &str {
        let headline = self.headline.trim();
        if headline.is_empty() {
            DEFAULT_TITLE
        } else {
            headline
        }
    }

    /// True when the entry holds only the single empty item
    pub fn has_only_blank_item(&self) -> bool {
        self.items.len() == 1 && self.items[0].is_blank()
    }

    /// Case-insensitive substring match over every text field
    ///
    /// A blank query matches every entry.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        let mut haystack = vec![
            self.date.as_str(),
            self.headline.as_str(),
            self.highlights.as_str(),
            self.gratitude.as_str(),
            self.free_write.as_str(),
        ];
        for item in &self.items {
            haystack.push(&item.prompt);
            haystack.push(&item.answer);
        }
        haystack.join("\n").to_lowercase().contains(&query)
    }

    /// Apply an edit in place
    ///
    /// Returns `Ok(false)` when the edit had nothing to do: an empty prompt
    /// paste, a blank item requested while one is already the only item, or
    /// a template with nothing to add.
    pub fn apply(&mut self, edit: Edit) -> Result<bool, EditError> {
        match edit {
            Edit::SetHeadline(text) => self.headline = text,
            Edit::SetMood(mood) => {
                self.mood = if mood.is_finite() { mood } else { DEFAULT_MOOD }
            }
            Edit::SetFreeWrite(text) => self.free_write = text,
            Edit::SetHighlights(text) => self.highlights = text,
            Edit::SetGratitude(text) => self.gratitude = text,
            Edit::SetPrompt { index, text } => self.item_mut(index)?.prompt = text,
            Edit::SetAnswer { index, text } => self.item_mut(index)?.answer = text,
            Edit::AddItem => self.items.push(Item::default()),
            Edit::RemoveItem(index) => {
                self.item_mut(index)?;
                if self.items.len() == 1 {
                    self.items[0] = Item::default();
                } else {
                    self.items.remove(index);
                }
            }
            Edit::ReplacePrompts(pasted) => {
                let prompts: Vec<Item> = pasted
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| Item::new(line, ""))
                    .collect();
                if prompts.is_empty() {
                    return Ok(false);
                }
                self.items = prompts;
            }
            Edit::InsertHighlight(snippet) => self.highlights.push_str(&snippet),
            Edit::AddBlankItem => {
                if self.has_only_blank_item() {
                    return Ok(false);
                }
                self.items.push(Item::default());
            }
            Edit::ApplyTemplate(template) => return Ok(self.apply_template(template)),
        }
        Ok(true)
    }

    /// Headline only when empty; prompts replace a blank entry's single
    /// item, otherwise they are appended
    fn apply_template(&mut self, template: Template) -> bool {
        let mut changed = false;
        if self.headline.is_empty() && !template.headline.is_empty() {
            self.headline = template.headline;
            changed = true;
        }

        let prompts: Vec<Item> = template
            .prompts
            .into_iter()
            .filter(|prompt| !prompt.trim().is_empty())
            .map(|prompt| Item::new(prompt, ""))
            .collect();
        if !prompts.is_empty() {
            if self.has_only_blank_item() {
                self.items = prompts;
            } else {
                self.items.extend(prompts);
            }
            changed = true;
        }
        changed
    }

    fn item_mut(&mut self, index: usize) -> Result<&mut Item, EditError> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(EditError::ItemOutOfRange { index, len })
    }
}

/// A field-level change to the current entry
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    SetHeadline(String),
    SetMood(f64),
    SetFreeWrite(String),
    SetHighlights(String),
    SetGratitude(String),
    /// Replace the prompt of the item at `index` (0-based)
    SetPrompt { index: usize, text: String },
    /// Replace the answer of the item at `index` (0-based)
    SetAnswer { index: usize, text: String },
    AddItem,
    /// Remove an item; the last item is reset instead of removed
    RemoveItem(usize),
    /// Replace all items with one unanswered item per non-empty pasted line
    ReplacePrompts(String),
    /// Append a snippet to the highlights
    InsertHighlight(String),
    /// Start a blank prompt unless the entry is already blank
    AddBlankItem,
    /// Fill in a prompt template
    ApplyTemplate(Template),
}

/// A reusable headline and set of prompts
///
/// Stored as TOML:
///
/// ```toml
/// headline = "DAY 1 - Homecoming"
/// prompts = ["What's the first honest thought I had this morning?"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub prompts: Vec<String>,
}

impl Template {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("No item at position {} (entry has {len} item(s))", .index + 1)]
    ItemOutOfRange { index: usize, len: usize },
}

/// Repair any raw record into a well-formed [`Entry`]
///
/// Starts from a blank entry for the record's date (today when missing),
/// overlays every field that is present with a usable type, then forces
/// `items` to be a non-empty list of `{prompt, answer}` and `mood` to be
/// a finite number.
pub fn normalize_entry(raw: &Value) -> Entry {
    let now = Utc::now();
    let date = string_field(raw, "date")
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(dates::today);
    let mut entry = Entry::blank_at(date, now);

    if let Some(headline) = string_field(raw, "headline") {
        entry.headline = headline;
    }
    if let Some(text) = string_field(raw, "freeWrite") {
        entry.free_write = text;
    }
    if let Some(text) = string_field(raw, "highlights") {
        entry.highlights = text;
    }
    if let Some(text) = string_field(raw, "gratitude") {
        entry.gratitude = text;
    }
    if let Some(mood) = raw.get("mood").and_then(coerce_mood) {
        entry.mood = mood;
    }
    if let Some(Value::Array(items)) = raw.get("items") {
        if !items.is_empty() {
            entry.items = items.iter().map(Item::from_value).collect();
        }
    }
    if let Some(created) = timestamp_field(raw, "createdAt") {
        entry.created_at = created;
    }
    if let Some(updated) = timestamp_field(raw, "updatedAt") {
        entry.updated_at = updated;
    }

    entry
}

/// Build the raw shape for a key whose stored record could not be parsed
pub(crate) fn bare_record(date: &str) -> Value {
    let mut map = Map::new();
    map.insert("date".to_string(), Value::String(date.to_string()));
    Value::Object(map)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn timestamp_field(value: &Value, key: &str) -> Option<DateTime<Utc>> {
    let text = value.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn coerce_mood(value: &Value) -> Option<f64> {
    let mood = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    mood.is_finite().then_some(mood)
}

/// Whole moods are written as integers (`6`, not `6.0`)
fn serialize_mood<S: Serializer>(mood: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if mood.fract() == 0.0 && mood.abs() < 1e15 {
        serializer.serialize_i64(*mood as i64)
    } else {
        serializer.serialize_f64(*mood)
    }
}
