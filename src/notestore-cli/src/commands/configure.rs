//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting notes CLI defaults.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::config::{default_database_path, Config, DEFAULT_LIMIT};

/// Values to store; `None` leaves the current setting alone
#[derive(Debug, Default)]
pub struct Changes {
    pub database: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub limit: Option<usize>,
}

impl Changes {
    fn is_empty(&self) -> bool {
        self.database.is_none() && self.format.is_none() && self.limit.is_none()
    }
}

/// Handle the configure command
pub fn handle(changes: Changes, show: bool) -> Result<()> {
    let path = Config::config_path()?;
    let mut config = Config::load_from(&path)?;

    if show {
        print!("{}", describe(&config, &path));
        return Ok(());
    }

    if changes.is_empty() {
        show_usage();
        return Ok(());
    }

    apply(&mut config, changes)?;
    config.save_to(&path)?;
    println!("Config saved to: {}", path.display());

    Ok(())
}

fn apply(config: &mut Config, changes: Changes) -> Result<()> {
    if changes.limit == Some(0) {
        bail!("Default limit must be positive");
    }

    if let Some(database) = changes.database {
        println!("Database: {}", database.display());
        config.database = Some(database);
    }
    if let Some(format) = changes.format {
        println!("Output format: {}", format_name(format));
        config.format = Some(format);
    }
    if let Some(limit) = changes.limit {
        println!("Search limit: {}", limit);
        config.limit = Some(limit);
    }

    Ok(())
}

fn format_name(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Pretty => "pretty",
        OutputFormat::Json => "json",
    }
}

/// Current configuration, with defaults marked
fn describe(config: &Config, path: &Path) -> String {
    let database = match (&config.database, default_database_path()) {
        (Some(db), _) => db.display().to_string(),
        (None, Some(db)) => format!("{} (default)", db.display()),
        (None, None) => "not configured".to_string(),
    };
    let format = match config.format {
        Some(format) => format_name(format).to_string(),
        None => "pretty (default)".to_string(),
    };
    let limit = match config.limit {
        Some(limit) => limit.to_string(),
        None => format!("{} (default)", DEFAULT_LIMIT),
    };
    let (start, end) = config.metadata.timestamp_window;

    format!(
        "Database: {database}\n\
         Output format: {format}\n\
         Search limit: {limit}\n\
         Strict decoding: {}\n\
         Timestamp window: {start}..={end}\n\
         Config file: {}\n",
        config.strict,
        path.display()
    )
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: notes configure --database PATH");
    println!("   or: notes configure --default-format json --default-limit 50");
    println!("   or: notes configure --show");
}
