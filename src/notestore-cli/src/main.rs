mod cli;
mod commands;
mod config;
mod repo;
mod view;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::*;
use commands::configure::Changes;
use commands::dump::Source;
use config::Config;
use repo::NoteRepository;
use view::{View, ViewResult};

const DEFAULT_FILTER: &str = "notes=warn,notestore=warn";
const VERBOSE_FILTER: &str = "notes=debug,notestore=debug";

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.globals.verbose);

    let result = run(cli, Config::load());

    if result.exit_code == 0 {
        print!("{}", result.content);
    } else {
        eprint!("{}", result.content);
        std::process::exit(result.exit_code);
    }
}

/// Run one command; errors, including a config that failed to load, are
/// rendered by the selected view
fn run(cli: Cli, config: Result<Config>) -> ViewResult {
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            let view = view::create_view(cli.globals.format.unwrap_or_default());
            return view.error_result(&err);
        }
    };

    let format = config.output_format(cli.globals.format);
    let view = view::create_view(format);

    dispatch(cli.command, &cli.globals, &config, format, view.as_ref())
        .unwrap_or_else(|err| view.error_result(&err))
}

/// Log to stderr; `RUST_LOG` overrides the default filter unless `--verbose`
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn dispatch(
    command: Commands,
    globals: &GlobalArgs,
    config: &Config,
    format: OutputFormat,
    view: &dyn View,
) -> Result<ViewResult> {
    let options = config.decode_options(globals.strict);

    match command {
        Commands::Search {
            term,
            limit,
            offset,
        } => {
            let repo = open_repository(globals, config)?;
            let limit = config.search_limit(limit);
            commands::notes::search(&repo, view, &options, &term, limit, offset)
        }

        Commands::Get { id, metadata } => {
            let repo = open_repository(globals, config)?;
            commands::notes::get(&repo, view, &options, id, metadata)
        }

        Commands::Dump { source } => {
            let data = load_source(source, globals, config)?;
            commands::dump::dump(&data, format)
        }

        Commands::Meta { source } => {
            let data = load_source(source, globals, config)?;
            commands::dump::meta(&data, format, &options.metadata)
        }

        Commands::Configure {
            database,
            default_format,
            default_limit,
            show,
        } => {
            let changes = Changes {
                database,
                format: default_format,
                limit: default_limit,
            };
            commands::configure::handle(changes, show)?;
            Ok(ViewResult::success(String::new()))
        }
    }
}

fn open_repository(globals: &GlobalArgs, config: &Config) -> Result<NoteRepository> {
    let path = config.database_path(globals.db.as_deref())?;
    debug!(path = %path.display(), "opening notes database");

    NoteRepository::open(&path)
        .with_context(|| format!("Failed to open notes database at {}", path.display()))
}

fn load_source(args: SourceArgs, globals: &GlobalArgs, config: &Config) -> Result<Vec<u8>> {
    let source = Source::from_args(args)?;
    let repo = if source.needs_database() {
        Some(open_repository(globals, config)?)
    } else {
        None
    };
    source.load(repo.as_ref())
}
