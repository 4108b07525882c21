//! Daybook CLI
//!
//! Command-line interface for Daybook - one journal entry per day.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use daybook_core::{Config, StorageResult};

mod commands;
mod editor;
mod output;

use commands::entry::{EntryField, SetFields};
use commands::export::ExportFormat;
use output::{Output, OutputFormat};

/// Default log filter when DAYBOOK_LOG is not set
const DEFAULT_LOG_FILTER: &str = "daybook_core=warn,daybook_cli=warn";

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "Daybook - a local-first daily journal")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the entry for a date
    Show {
        /// YYYY-MM-DD, today, yesterday, tomorrow or a day offset like -1
        #[arg(allow_hyphen_values = true)]
        date: Option<String>,
    },
    /// Set entry fields
    Set {
        /// Entry date (default today)
        #[arg(short, long, allow_hyphen_values = true)]
        date: Option<String>,
        #[arg(short = 'H', long)]
        headline: Option<String>,
        /// Mood score, usually 0-10
        #[arg(short, long, allow_hyphen_values = true)]
        mood: Option<f64>,
        #[arg(long)]
        free_write: Option<String>,
        #[arg(long)]
        highlights: Option<String>,
        #[arg(long)]
        gratitude: Option<String>,
    },
    /// Manage prompt/answer items
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },
    /// Replace all items with one prompt per line (from FILE, stdin or $EDITOR)
    Prompts {
        /// Entry date (default today)
        #[arg(short, long, allow_hyphen_values = true)]
        date: Option<String>,
        /// File holding the prompts
        file: Option<PathBuf>,
    },
    /// Fill the entry from a TOML template (headline plus prompts)
    Template {
        /// Entry date (default today)
        #[arg(short, long, allow_hyphen_values = true)]
        date: Option<String>,
        /// Template file
        file: PathBuf,
    },
    /// Append a snippet to the highlights
    Highlight {
        /// Entry date (default today)
        #[arg(short, long, allow_hyphen_values = true)]
        date: Option<String>,
        text: String,
    },
    /// Write a long-form field in $EDITOR
    Write {
        /// Entry date (default today)
        #[arg(short, long, allow_hyphen_values = true)]
        date: Option<String>,
        /// Field to edit
        #[arg(value_enum, default_value = "free-write")]
        field: EntryField,
    },
    /// Delete the stored entry for a date
    Clear {
        #[arg(allow_hyphen_values = true)]
        date: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List saved entries, newest first
    #[command(alias = "ls")]
    List {
        /// Only entries containing this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Export one entry as HTML, Markdown or JSON
    Export {
        #[arg(allow_hyphen_values = true)]
        date: Option<String>,
        #[arg(short, long, value_enum, default_value = "html")]
        format: ExportFormat,
        /// Output directory (default: export_dir or the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Open the exported file afterwards
        #[arg(long)]
        open: bool,
    },
    /// Write a JSON backup of every entry
    Backup {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Export every entry as HTML with an index page
    ExportAll {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ItemCommands {
    /// Append an item
    Add {
        #[arg(short, long, allow_hyphen_values = true)]
        date: Option<String>,
        #[arg(short, long)]
        prompt: Option<String>,
        #[arg(short, long)]
        answer: Option<String>,
    },
    /// Change the prompt or answer of an item
    Set {
        /// Item position, starting at 1
        position: usize,
        #[arg(short, long, allow_hyphen_values = true)]
        date: Option<String>,
        #[arg(short, long)]
        prompt: Option<String>,
        #[arg(short, long)]
        answer: Option<String>,
    },
    /// Remove an item
    #[command(alias = "rm")]
    Remove {
        /// Item position, starting at 1
        position: usize,
        #[arg(short, long, allow_hyphen_values = true)]
        date: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, debounce_ms, export_dir, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return match command {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let mut journal = commands::open_journal(&config)?;

    let result = match cli.command {
        Commands::Show { date } => commands::entry::show(&mut journal, date.as_deref(), &output),
        Commands::Set {
            date,
            headline,
            mood,
            free_write,
            highlights,
            gratitude,
        } => {
            let fields = SetFields {
                headline,
                mood,
                free_write,
                highlights,
                gratitude,
            };
            commands::entry::set(&mut journal, date.as_deref(), fields, &output)
        }
        Commands::Item { command } => handle_item_command(command, &mut journal, &output),
        Commands::Prompts { date, file } => {
            commands::entry::prompts(&mut journal, date.as_deref(), file, &output)
        }
        Commands::Template { date, file } => {
            commands::entry::template(&mut journal, date.as_deref(), &file, &output)
        }
        Commands::Highlight { date, text } => {
            commands::entry::highlight(&mut journal, date.as_deref(), text, &output)
        }
        Commands::Write { date, field } => {
            commands::entry::write(&mut journal, date.as_deref(), field, &output)
        }
        Commands::Clear { date, yes } => {
            commands::entry::clear(&mut journal, date.as_deref(), yes, &output)
        }
        Commands::List { search } => {
            commands::history::list(&journal, search.as_deref(), &output)
        }
        Commands::Export {
            date,
            format,
            out,
            open,
        } => {
            let dir = out.unwrap_or_else(|| config.export_dir());
            commands::export::export(&mut journal, date.as_deref(), format, &dir, open, &output)
        }
        Commands::Backup { out } => {
            let dir = out.unwrap_or_else(|| config.export_dir());
            commands::export::backup(&mut journal, &dir, &output)
        }
        Commands::ExportAll { out } => {
            let dir = out.unwrap_or_else(|| config.export_dir());
            commands::export::export_all(&mut journal, &dir, &output)
        }
        Commands::Config { .. } => unreachable!(), // Handled above
    };

    // Anything still pending is written before exit
    let flushed = journal.save_now();
    finish(result, flushed)
}

/// Combine a command's result with the final flush
///
/// A command error is reported ahead of a failed flush.
fn finish(result: Result<()>, flushed: StorageResult<bool>) -> Result<()> {
    result?;
    flushed.context("Failed to save pending changes")?;
    Ok(())
}

fn handle_item_command(
    command: ItemCommands,
    journal: &mut commands::Journal,
    output: &Output,
) -> Result<()> {
    match command {
        ItemCommands::Add {
            date,
            prompt,
            answer,
        } => commands::entry::item_add(journal, date.as_deref(), prompt, answer, output),
        ItemCommands::Set {
            position,
            date,
            prompt,
            answer,
        } => commands::entry::item_set(journal, date.as_deref(), position, prompt, answer, output),
        ItemCommands::Remove { position, date } => {
            commands::entry::item_remove(journal, date.as_deref(), position, output)
        }
    }
}

/// Initialize tracing
///
/// Logs go to stderr unless `log_file` is configured. The filter comes
/// from DAYBOOK_LOG.
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_env("DAYBOOK_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if let Some(log_path) = &config.log_file {
        match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
                return;
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            }
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
