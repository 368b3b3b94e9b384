//! Journal command-line entry point.
//!
//! # Responsibility
//! - Drive the core journal store from a terminal.
//! - Keep output deterministic so scripts can diff it.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use journal_core::db::open_db;
use journal_core::{
    default_log_level, fetch_and_cache, init_logging, parse_locale, EntryId, JournalCalendar,
    JournalConfig, JournalService, QuoteClient, SqliteEntryRepository, SqliteQuoteCache,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "journal")]
#[command(about = "Private journal: dated entries grouped by month")]
#[command(version)]
struct Cli {
    /// SQLite database file (default: $JOURNAL_DB_PATH or temp dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Locale for date strings, e.g. `en_US` or `de_DE.UTF-8`
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Absolute directory for rolling log files; logging is off without it
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entries grouped by month, newest first
    List {
        /// Keep entries whose short date or month/year contains this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Add an entry
    Add {
        /// YYYY-MM-DD (local midnight) or RFC 3339
        #[arg(long)]
        date: String,

        #[arg(long, default_value = "")]
        text: String,
    },

    /// Replace date and text of an entry
    Edit {
        id: String,

        /// YYYY-MM-DD (local midnight) or RFC 3339
        #[arg(long)]
        date: String,

        #[arg(long, default_value = "")]
        text: String,
    },

    /// Delete an entry
    Delete { id: String },

    /// Fetch a quote and cache it
    Quote,

    /// Check core linkage
    Ping,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::List { filter } => cmd_list(&config, filter.as_deref()),
        Commands::Add { date, text } => cmd_add(&config, &date, text),
        Commands::Edit { id, date, text } => cmd_edit(&config, &id, &date, text),
        Commands::Delete { id } => cmd_delete(&config, &id),
        Commands::Quote => cmd_quote(&config),
        Commands::Ping => {
            println!(
                "journal_core ping={} version={}",
                journal_core::ping(),
                journal_core::core_version()
            );
            Ok(())
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<JournalConfig, Box<dyn Error>> {
    let mut config = JournalConfig::from_env();
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(name) = cli.locale.as_deref() {
        config.locale = parse_locale(name).ok_or_else(|| format!("unknown locale `{name}`"))?;
    }
    Ok(config)
}

fn cmd_list(config: &JournalConfig, filter: Option<&str>) -> Result<(), Box<dyn Error>> {
    let conn = open_db(&config.db_path)?;
    let service = JournalService::new(
        SqliteEntryRepository::try_new(&conn)?,
        JournalCalendar::local(config.locale),
    );

    let groups = service.query(filter)?;
    if groups.is_empty() {
        println!("No entries.");
        return Ok(());
    }

    for group in groups {
        println!("{}", group.title);
        for entry in group.entries {
            let first_line = entry.entry_text.lines().next().unwrap_or_default();
            println!(
                "  {}  {:<10}  {}",
                entry.id, entry.short_date_string, first_line
            );
        }
    }
    Ok(())
}

fn cmd_add(config: &JournalConfig, date: &str, text: String) -> Result<(), Box<dyn Error>> {
    let entry_date = parse_entry_date(date)?;
    let conn = open_db(&config.db_path)?;
    let service = JournalService::new(
        SqliteEntryRepository::try_new(&conn)?,
        JournalCalendar::local(config.locale),
    );

    let id = service.create_entry(entry_date, text)?;
    info!("event=cli_add module=cli status=ok entry_id={id}");
    println!("{id}");
    Ok(())
}

fn cmd_edit(
    config: &JournalConfig,
    id: &str,
    date: &str,
    text: String,
) -> Result<(), Box<dyn Error>> {
    let id = parse_entry_id(id)?;
    let entry_date = parse_entry_date(date)?;
    let conn = open_db(&config.db_path)?;
    let service = JournalService::new(
        SqliteEntryRepository::try_new(&conn)?,
        JournalCalendar::local(config.locale),
    );

    service.update_entry(id, entry_date, text)?;
    println!("updated {id}");
    Ok(())
}

fn cmd_delete(config: &JournalConfig, id: &str) -> Result<(), Box<dyn Error>> {
    let id = parse_entry_id(id)?;
    let conn = open_db(&config.db_path)?;
    let service = JournalService::new(
        SqliteEntryRepository::try_new(&conn)?,
        JournalCalendar::local(config.locale),
    );

    service.delete_entry(id)?;
    println!("deleted {id}");
    Ok(())
}

fn cmd_quote(config: &JournalConfig) -> Result<(), Box<dyn Error>> {
    let client = QuoteClient::new(config.quote_base_url.clone(), config.quote_timeout)?;
    let conn = open_db(&config.db_path)?;
    let cache = SqliteQuoteCache::try_new(&conn)?;

    let quote = fetch_and_cache(&client, &cache)?;
    println!("{}", quote.display_text());
    Ok(())
}

fn parse_entry_id(raw: &str) -> Result<EntryId, String> {
    EntryId::parse_str(raw.trim()).map_err(|err| format!("invalid entry id `{raw}`: {err}"))
}

/// Parses `YYYY-MM-DD` as local midnight, otherwise RFC 3339.
fn parse_entry_date(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_entry_date_in(raw, &Local)
}

fn parse_entry_date_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = day.and_hms_opt(0, 0, 0).ok_or("invalid midnight")?;
        return tz
            .from_local_datetime(&midnight)
            .earliest()
            .map(|date| date.with_timezone(&Utc))
            .ok_or_else(|| format!("`{raw}` has no local midnight"));
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|err| format!("invalid date `{raw}`: {err}"))
}
