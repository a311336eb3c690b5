//! movedex CLI tool
//!
//! Command-line interface for extracting move records from saved wiki pages and looking moves up
//! in the resulting corpus.
//!
//! ## Commands
//!
//! - `extract <pages>`: Build one record per character page found in a directory of saved pages
//! - `query <records> <character> [move]`: Resolve a move (or show the character overview)
//! - `nav <records> <token>`: Follow a navigation token
//! - `config <path>`: Write the bundled settings and rule tables to a file for editing
//!
//! Every command reads settings from `--config` when given; the bundled rules are used otherwise.

use clap::{Parser, Subcommand};
use movedex_core::{
    codec::{DirPageSource, ExtractionJob},
    config::Settings,
    corpus,
    navkey::{navigate, NavOutcome, NavToken},
    query::{MoveQuery, Resolver},
    view::{character_overview, controls, overview_controls, MoveView},
    MovedexError,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "movedex")]
#[command(author, version, about = "Extract and query fighting-game move data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract character records from a directory of saved pages (index.html + <slug>.html)
    Extract {
        /// Directory holding the saved pages
        pages: PathBuf,

        /// Directory the JSON records are written to
        #[arg(short, long, default_value = "characters")]
        out: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the pause between pages, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Resolve a move of one character
    Query {
        /// Directory of character records
        records: PathBuf,

        /// Character name (case-insensitive)
        character: String,

        /// Move name, input or `name-<list>-<version>`; omit for the character overview
        query: Option<String>,

        /// Version to show (0 is the base move)
        #[arg(long)]
        version: Option<usize>,

        /// Additional record directories, loaded after the main one
        #[arg(long)]
        extra: Vec<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the navigation tokens of the rendered controls
        #[arg(short, long)]
        verbose: bool,
    },

    /// Follow a navigation token
    Nav {
        /// Directory of character records
        records: PathBuf,

        /// Token as produced by a control
        token: String,

        /// Additional record directories, loaded after the main one
        #[arg(long)]
        extra: Vec<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the bundled settings to a file
    Config {
        /// Where to write the settings
        #[arg(default_value = "movedex.toml")]
        path: PathBuf,
    },
}

fn settings(config: Option<&Path>) -> Result<Settings, MovedexError> {
    match config {
        Some(path) => Settings::load(path),
        None => Settings::builtin(),
    }
}

fn load_corpus(records: PathBuf, extra: Vec<PathBuf>, settings: &Settings) -> Result<(), MovedexError> {
    let mut dirs = vec![records];
    dirs.extend(extra);
    let count = corpus::reload(&dirs, settings)?;
    if count == 0 {
        tracing::warn!("No character records loaded from {:?}", dirs);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            pages,
            out,
            config,
            delay_ms,
        } => {
            let mut settings = settings(config.as_deref())?;
            if let Some(delay) = delay_ms {
                settings.extract.request_delay_ms = delay;
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let summary = runtime.block_on(async {
                ExtractionJob::new(DirPageSource::new(pages), &settings.extract, &out)
                    .run()
                    .await
            })?;

            println!(
                "Saved {} of {} characters to {:?}",
                summary.saved.len(),
                summary.attempted(),
                out
            );
            for (slug, err) in summary
                .incomplete
                .iter()
                .chain(summary.failed.iter())
                .chain(summary.duplicates.iter())
            {
                println!("  {slug}: {err}");
            }
            let problems = summary
                .diagnostics
                .iter()
                .filter(|(_, d)| d.is_problem())
                .count();
            if problems > 0 {
                println!("{problems} markup diagnostics (run with RUST_LOG=debug for details)");
            }
        }

        Commands::Query {
            records,
            character,
            query,
            version,
            extra,
            config,
            verbose,
        } => {
            let settings = settings(config.as_deref())?;
            load_corpus(records, extra, &settings)?;
            let corpus = corpus::snapshot();
            let Some(found) = corpus.get(&character) else {
                eprintln!("Character '{character}' not found");
                std::process::exit(1);
            };
            let resolver = Resolver::new(&settings);

            let Some(raw) = query else {
                println!("{}", character_overview(found));
                for control in overview_controls(found, 0) {
                    println!("[{}] {}", control.label, control.custom_id()?);
                }
                return Ok(());
            };
            let mut parsed = MoveQuery::parse(&raw);
            if version.is_some() {
                parsed.version = version;
            }
            let Some(selection) = resolver.select(found, &parsed) else {
                eprintln!("No move matching '{raw}' for {}", found.name);
                std::process::exit(1);
            };
            println!(
                "{}",
                MoveView::new(found, &selection.matched, selection.version)
            );
            if verbose {
                for control in controls(found, &resolver, &selection) {
                    let marker = if control.selected { "*" } else { " " };
                    println!("{marker}[{}] {}", control.label, control.custom_id()?);
                }
            }
        }

        Commands::Nav {
            records,
            token,
            extra,
            config,
        } => {
            let settings = settings(config.as_deref())?;
            load_corpus(records, extra, &settings)?;
            let corpus = corpus::snapshot();
            let resolver = Resolver::new(&settings);
            let token: NavToken = token.parse()?;
            match navigate(&corpus, &resolver, &token) {
                Ok(NavOutcome::Move {
                    character,
                    selection,
                }) => println!(
                    "{}",
                    MoveView::new(character, &selection.matched, selection.version)
                ),
                Ok(NavOutcome::MoveList {
                    character,
                    move_list,
                }) => {
                    let list = &character.movelists[move_list];
                    println!("{} - {}", character.name, list.name);
                    for mv in &list.moves {
                        println!("{mv}");
                    }
                }
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { path } => {
            Settings::builtin()?.save(&path)?;
            println!("Wrote settings to {:?}", path);
        }
    }

    Ok(())
}
