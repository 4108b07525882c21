//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use std::path::PathBuf;

use anyhow::Result;
use daybook_core::Entry;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single entry in full
    ///
    /// `stored` is false for a date that has no saved record yet.
    pub fn print_entry(&self, entry: &Entry, stored: bool) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("Date:      {}", entry.date);
                println!("Headline:  {}", entry.title());
                println!("Mood:      {}/10", entry.mood);
                if stored {
                    println!("Updated:   {}", entry.updated_at.format("%Y-%m-%d %H:%M"));
                } else {
                    println!("Updated:   (not saved yet)");
                }

                for (i, item) in entry.items.iter().enumerate() {
                    println!();
                    println!("── Prompt {} ──", i + 1);
                    if !item.prompt.trim().is_empty() {
                        println!("{}", item.prompt.trim());
                    }
                    if item.answer.trim().is_empty() {
                        println!("  (no response)");
                    } else {
                        for line in item.answer.trim().lines() {
                            println!("  {}", line);
                        }
                    }
                }

                let sections = [
                    ("Free write", &entry.free_write),
                    ("Highlights", &entry.highlights),
                    ("Gratitude", &entry.gratitude),
                ];
                for (heading, body) in sections {
                    if body.trim().is_empty() {
                        continue;
                    }
                    println!();
                    println!("── {} ──", heading);
                    println!("{}", body.trim());
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(entry)?);
            }
            OutputFormat::Quiet => {
                println!("{}", entry.date);
            }
        }
        Ok(())
    }

    /// Print a list of entries
    pub fn print_entries(&self, entries: &[Entry]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No entries found.");
                    return Ok(());
                }
                for entry in entries {
                    println!(
                        "{} | {:>4} | {}",
                        entry.date,
                        entry.mood,
                        truncate(entry.title(), 50)
                    );
                }
                println!("\n{} entry(ies)", entries.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(entries)?);
            }
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.date);
                }
            }
        }
        Ok(())
    }

    /// Print the files an export wrote
    pub fn print_written(&self, paths: &[PathBuf]) {
        match self.format {
            OutputFormat::Human => {
                for path in paths {
                    println!("✓ Wrote {}", path.display());
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"status": "success", "files": paths}));
            }
            OutputFormat::Quiet => {
                for path in paths {
                    println!("{}", path.display());
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_counts_chars() {
        // Multi-byte characters must not split
        assert_eq!(truncate("días felices", 7), "días...");
    }

    #[test]
    fn test_only_human_prompts() {
        assert!(Output::new(OutputFormat::Human).should_prompt());
        assert!(!Output::new(OutputFormat::Json).should_prompt());
        assert!(!Output::new(OutputFormat::Quiet).should_prompt());
    }
}
