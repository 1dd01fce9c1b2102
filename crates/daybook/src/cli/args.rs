//! Command-line argument structures and enums

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "One markdown file per day, with attachments kept alongside each month", long_about = None)]
pub struct Cli {
    /// Use this journal folder instead of the configured one (not saved)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose the journal folder and save it to the config file
    Init {
        /// Folder that holds the month folders (created if missing)
        root: PathBuf,
    },

    /// Show or clear the configured journal folder
    Root {
        /// Forget the configured folder
        #[arg(long)]
        clear: bool,
    },

    /// Show or change the theme preference
    Theme {
        /// One of: system, light, dark
        mode: Option<String>,
    },

    /// Print an entry
    Show {
        /// Date to show (e.g., "2026-01-16", "today", "yesterday", "last friday")
        date: Option<String>,

        /// Print attachment links resolved to their locations
        #[arg(short, long)]
        preview: bool,

        /// Print the whole view as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the days of a month that have an entry
    #[command(alias = "ls")]
    List {
        /// Month to list (e.g., "2026-01", "today", "last month")
        month: Option<String>,
    },

    /// Replace an entry's text
    Write {
        /// Date of the entry (default: today)
        date: Option<String>,

        /// New text (read from stdin if omitted)
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Add a line to the end of an entry
    Append {
        /// Text to append
        text: String,

        /// Date of the entry (default: today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Copy files into the month's attachments and link them from the entry
    Attach {
        /// Files to attach
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Date of the entry (default: today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// List the attachments stored for a month
    Attachments {
        /// Month to list (default: this month)
        month: Option<String>,
    },
}
