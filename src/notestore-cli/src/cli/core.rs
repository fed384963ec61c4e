//! Core CLI definitions

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Read and search notes from the desktop Notes database", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to NoteStore.sqlite (uses configured default if not provided)
    #[arg(long, global = true, env = "NOTESTORE_DB")]
    pub db: Option<PathBuf>,

    /// Output format (uses configured default if not provided)
    #[arg(short, long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Fail on checklist/nesting arrays that do not line up with the text
    #[arg(long, global = true)]
    pub strict: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search notes by title or snippet (empty term lists everything)
    #[command(visible_alias = "s")]
    Search {
        /// Case-insensitive search term
        #[arg(default_value = "")]
        term: String,

        /// Maximum number of notes to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number of matching notes to skip
        #[arg(short, long, default_value_t = 0)]
        offset: usize,
    },

    /// Show a single note by ID
    #[command(visible_alias = "g")]
    Get {
        /// Note primary key
        id: i64,

        /// Include decoded metadata (timestamps, flags, references)
        #[arg(short, long)]
        metadata: bool,
    },

    /// Dump the raw field tree of a note body
    #[command(visible_alias = "d")]
    Dump {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show the metadata summary of a note body
    #[command(visible_alias = "m")]
    Meta {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default database path
        #[arg(long)]
        database: Option<PathBuf>,

        /// Set default output format
        #[arg(long, value_enum)]
        default_format: Option<OutputFormat>,

        /// Set default search limit
        #[arg(long)]
        default_limit: Option<usize>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

/// Where a note body comes from: a file on disk or a row in the database
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// File holding a (possibly gzip-compressed) note body
    pub file: Option<PathBuf>,

    /// Read the body of this note from the database
    #[arg(long)]
    pub id: Option<i64>,
}
