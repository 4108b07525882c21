//! Export engine
//!
//! Pure renderers from entries to downloadable text: a standalone HTML
//! page, Markdown, pretty JSON, an HTML index for bulk exports, and the
//! all-entries backup envelope. Nothing here touches the filesystem;
//! callers decide where the bytes go.
//!
//! User text is HTML-escaped exactly once, at the point it is placed into
//! markup.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::Entry;

pub const HTML_MIME: &str = "text/html;charset=utf-8";
pub const MARKDOWN_MIME: &str = "text/markdown;charset=utf-8";
pub const JSON_MIME: &str = "application/json;charset=utf-8";

/// Backup of every entry
pub const BACKUP_FILENAME: &str = "journal-backup-all.json";

/// Index page written next to a bulk export
pub const INDEX_FILENAME: &str = "journal-export-index.html";

/// Directory the index links into for per-entry pages
pub const ENTRIES_DIR: &str = "entries";

const NO_RESPONSE_MD: &str = "_(no response)_";
const NO_RESPONSE_HTML: &str = "<em>(no response)</em>";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot export an entry without a date")]
    MissingDate,

    #[error("Failed to serialize entry: {0}")]
    Json(#[from] serde_json::Error),
}

/// One rendered document ready to be written or offered as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub text: String,
    pub mime: &'static str,
}

/// The three per-entry renderings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFiles {
    pub html: ExportFile,
    pub md: ExportFile,
    pub json: ExportFile,
}

impl EntryFiles {
    pub fn iter(&self) -> impl Iterator<Item = &ExportFile> {
        [&self.html, &self.md, &self.json].into_iter()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Backup<'a> {
    exported_at: DateTime<Utc>,
    entries: &'a [Entry],
}

/// Render an entry as Markdown
pub fn to_markdown(entry: &Entry) -> Result<String, ExportError> {
    require_date(entry)?;

    let mut lines = vec![
        format!("# {}", entry.title()),
        format!("**Date:** {}", entry.date),
        format!("**Mood:** {}/10", entry.mood),
        String::new(),
    ];

    for (idx, item) in entry.items.iter().enumerate() {
        let prompt = item.prompt.trim();
        let answer = item.answer.trim();

        lines.push(format!("## Prompt {}", idx + 1));
        if !prompt.is_empty() {
            lines.push(prompt.to_string());
        }
        lines.push(String::new());
        lines.push(if answer.is_empty() {
            NO_RESPONSE_MD.to_string()
        } else {
            answer.to_string()
        });
        lines.push(String::new());
    }

    for (heading, body) in optional_sections(entry) {
        lines.push(format!("## {}", heading));
        lines.push(body.to_string());
        lines.push(String::new());
    }

    Ok(lines.join("\n"))
}

/// Render an entry as a standalone HTML document
pub fn to_html(entry: &Entry) -> Result<String, ExportError> {
    require_date(entry)?;

    let title = escape_html(entry.title());
    let date = escape_html(&entry.date);
    let mood = escape_html(&entry.mood.to_string());

    let mut items = String::new();
    for (idx, item) in entry.items.iter().enumerate() {
        let answer = multiline_html(&item.answer);
        items.push_str(&format!(
            r#"
      <section class="block">
        <div class="kicker">Prompt {number}</div>
        <div class="prompt">{prompt}</div>
        <div class="answer">{answer}</div>
      </section>"#,
            number = idx + 1,
            prompt = multiline_html(&item.prompt),
            answer = if answer.is_empty() {
                NO_RESPONSE_HTML.to_string()
            } else {
                answer
            },
        ));
    }

    let mut free_write = String::new();
    let mut boxes = String::new();
    for (heading, body) in optional_sections(entry) {
        let body = multiline_html(body);
        if heading == "Free write" {
            free_write = format!(
                r#"
      <section class="block"><div class="kicker">{heading}</div><div class="answer">{body}</div></section>"#
            );
        } else {
            boxes.push_str(&format!(
                r#"
        <div class="box"><h3>{heading}</h3><div class="answer">{body}</div></div>"#
            ));
        }
    }
    let boxes = if boxes.is_empty() {
        String::new()
    } else {
        format!("\n      <div class=\"two\">{boxes}\n      </div>")
    };

    Ok(format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>{title} - {date}</title>
<style>
{style}
</style>
</head>
<body>
  <div class="page">
    <div class="card">
      <h1>{title}</h1>
      <div class="meta">
        <span class="pill">Date: {date}</span>
        <span class="pill">Mood: {mood}/10</span>
      </div>{items}{free_write}{boxes}
    </div>
  </div>
</body>
</html>
"#,
        style = ENTRY_STYLE,
    ))
}

/// Pretty-printed JSON record
pub fn to_json(entry: &Entry) -> Result<String, ExportError> {
    require_date(entry)?;
    Ok(serde_json::to_string_pretty(entry)?)
}

/// Render all three formats with their filenames and MIME types
pub fn export_entry_files(entry: &Entry) -> Result<EntryFiles, ExportError> {
    Ok(EntryFiles {
        html: ExportFile {
            filename: entry_filename(&entry.date, "html"),
            text: to_html(entry)?,
            mime: HTML_MIME,
        },
        md: ExportFile {
            filename: entry_filename(&entry.date, "md"),
            text: to_markdown(entry)?,
            mime: MARKDOWN_MIME,
        },
        json: ExportFile {
            filename: entry_filename(&entry.date, "json"),
            text: to_json(entry)?,
            mime: JSON_MIME,
        },
    })
}

/// `journal-<date>.<ext>`, with `:` replaced for filesystem safety
pub fn entry_filename(date: &str, ext: &str) -> String {
    format!("journal-{}.{}", date.replace(':', "-"), ext)
}

/// HTML page linking each entry's page under [`ENTRIES_DIR`]
pub fn build_all_entries_html_index(entries: &[Entry]) -> Result<String, ExportError> {
    let mut rows = String::new();
    for entry in entries {
        require_date(entry)?;
        let href = format!("{}/{}", ENTRIES_DIR, entry_filename(&entry.date, "html"));
        rows.push_str(&format!(
            r#"
        <li><a href="{href}"><span class="d">{date}</span><span class="t">{title}</span></a></li>"#,
            href = escape_html(&href),
            date = escape_html(&entry.date),
            title = escape_html(entry.title()),
        ));
    }

    Ok(format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>Journal Export</title>
<style>
{style}
</style>
</head>
<body>
  <div class="wrap">
    <div class="card">
      <h1>Journal Export</h1>
      <p class="hint">Open an entry to view the exported HTML snapshot.</p>
      <ul>{rows}
      </ul>
    </div>
  </div>
</body>
</html>
"#,
        style = INDEX_STYLE,
    ))
}

/// The `{exportedAt, entries}` backup envelope
pub fn backup_file(entries: &[Entry], exported_at: DateTime<Utc>) -> Result<ExportFile, ExportError> {
    let backup = Backup {
        exported_at,
        entries,
    };
    Ok(ExportFile {
        filename: BACKUP_FILENAME.to_string(),
        text: serde_json::to_string_pretty(&backup)?,
        mime: JSON_MIME,
    })
}

/// Escape `& < > " '` for HTML text and attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn multiline_html(text: &str) -> String {
    escape_html(text.trim())
        .replace("\r\n", "\n")
        .replace('\n', "<br/>")
}

fn require_date(entry: &Entry) -> Result<(), ExportError> {
    if entry.date.trim().is_empty() {
        return Err(ExportError::MissingDate);
    }
    Ok(())
}

/// Free write, highlights and gratitude, in that order, when non-blank
fn optional_sections(entry: &Entry) -> Vec<(&'static str, &str)> {
    [
        ("Free write", entry.free_write.as_str()),
        ("Highlights", entry.highlights.as_str()),
        ("Gratitude", entry.gratitude.as_str()),
    ]
    .into_iter()
    .map(|(heading, body)| (heading, body.trim()))
    .filter(|(_, body)| !body.is_empty())
    .collect()
}

const ENTRY_STYLE: &str = r#"  :root{--bg:#0b0d10;--ink:#e9edf2;--muted:rgba(233,237,242,.68);--accent:#1fe3d2;
    --serif:ui-serif,Georgia,"Times New Roman",serif;--sans:ui-sans-serif,system-ui,Segoe UI,Roboto,Helvetica,Arial;
    --mono:ui-monospace,SFMono-Regular,Menlo,Consolas,monospace}
  body{margin:0;font-family:var(--sans);color:var(--ink);background:linear-gradient(180deg,#07080a,var(--bg))}
  .page{max-width:900px;margin:24px auto;padding:0 16px}
  .card{background:rgba(18,22,28,.9);border:1px solid rgba(233,237,242,.10);border-radius:18px;padding:22px}
  h1{margin:0;font-family:var(--serif)}
  .meta{margin-top:8px;color:var(--muted);font-family:var(--mono);font-size:12px;display:flex;gap:12px;flex-wrap:wrap}
  .pill{border:1px solid rgba(233,237,242,.25);border-radius:999px;padding:6px 10px}
  .block{margin-top:16px;padding-top:14px;border-top:1px solid rgba(233,237,242,.15)}
  .kicker{color:var(--muted);text-transform:uppercase;letter-spacing:.22px;font-size:12px}
  .prompt{margin-top:6px;color:var(--accent);font-weight:700}
  .answer{margin-top:10px;line-height:1.55}
  .two{display:grid;grid-template-columns:1fr 1fr;gap:12px;margin-top:16px}
  .box{border:1px solid rgba(233,237,242,.25);border-radius:14px;padding:12px}
  .box h3{margin:0 0 6px 0;font-size:13px;color:var(--muted);text-transform:uppercase}
  @media (max-width:820px){.two{grid-template-columns:1fr}}
  @media print{body{background:#fff;color:#111}.card{border:none}}"#;

const INDEX_STYLE: &str = r#"  body{margin:0;font-family:ui-sans-serif,system-ui,Segoe UI,Roboto,Helvetica,Arial;background:#0b0d10;color:#e9edf2}
  .wrap{max-width:900px;margin:24px auto;padding:0 16px}
  .card{background:rgba(18,22,28,.9);border:1px solid rgba(233,237,242,.10);border-radius:18px;padding:18px}
  h1{margin:0 0 12px 0;font-family:ui-serif,Georgia,"Times New Roman",serif}
  .hint{margin-top:0;color:rgba(233,237,242,.68)}
  ul{list-style:none;padding:0;margin:0;display:grid;gap:10px}
  a{display:flex;gap:12px;align-items:center;padding:12px;border:1px solid rgba(233,237,242,.10);border-radius:14px;text-decoration:none;color:inherit}
  .d{font-family:ui-monospace,SFMono-Regular,Menlo,Consolas,monospace;font-size:12px;color:#8a909a;min-width:110px}
  .t{overflow:hidden;text-overflow:ellipsis;white-space:nowrap}"#;
