//! Command-line front end for the daybook journal.

/// Clap argument definitions
mod args;

/// `attach` and `attachments` commands
mod attachment;

/// `init`, `root` and `theme` commands
mod config;

/// `show`, `list`, `write` and `append` commands
mod entry;

/// Shared CLI utilities
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use daybook_core::{ConfigStore, Journal, NativeTree, RootHandle};

pub use args::Cli;
use args::Commands;

/// Journal type used by every command.
pub type CliJournal = Journal<NativeTree>;

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("✗ Could not start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if !runtime.block_on(run(cli)) {
        std::process::exit(1);
    }
}

/// Execute one command; returns true on success
async fn run(cli: Cli) -> bool {
    let settings = match ConfigStore::load_default() {
        Ok(settings) => {
            if let Some(path) = settings.path() {
                log::debug!("Loaded config from {}", path.display());
            }
            Arc::new(settings)
        }
        Err(e) => {
            eprintln!("✗ Failed to load config: {}", e);
            return false;
        }
    };

    match cli.command {
        Commands::Init { root } => config::handle_init(&settings, &root).await,

        Commands::Root { clear } => config::handle_root(&settings, clear).await,

        Commands::Theme { mode } => config::handle_theme(&settings, mode).await,

        Commands::Show {
            date,
            preview,
            json,
        } => {
            let journal = open_journal(&settings, cli.root);
            entry::handle_show(&journal, date.as_deref(), preview, json).await
        }

        Commands::List { month } => {
            let journal = open_journal(&settings, cli.root);
            entry::handle_list(&journal, month.as_deref()).await
        }

        Commands::Write { date, text } => {
            let journal = open_journal(&settings, cli.root);
            entry::handle_write(&journal, date.as_deref(), text).await
        }

        Commands::Append { text, date } => {
            let journal = open_journal(&settings, cli.root);
            entry::handle_append(&journal, date.as_deref(), &text).await
        }

        Commands::Attach { files, date } => {
            let journal = open_journal(&settings, cli.root);
            attachment::handle_attach(&journal, date.as_deref(), &files).await
        }

        Commands::Attachments { month } => {
            let journal = open_journal(&settings, cli.root);
            attachment::handle_attachments(&journal, month.as_deref()).await
        }
    }
}

/// Build the journal, honoring a `--root` override without persisting it
fn open_journal(settings: &Arc<ConfigStore>, root_override: Option<PathBuf>) -> CliJournal {
    let config = settings.snapshot();
    let delay = config.autosave_delay();
    match root_override {
        Some(root) => {
            log::debug!("Using journal folder override {}", root.display());
            let overridden = daybook_core::Config {
                root: Some(RootHandle::new(root.display().to_string())),
                ..config
            };
            Journal::with_debounce(
                NativeTree,
                Arc::new(ConfigStore::in_memory(overridden)),
                delay,
            )
        }
        None => Journal::with_debounce(NativeTree, settings.clone(), delay),
    }
}
