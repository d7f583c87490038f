use clap::{Args, Parser, Subcommand};

use crate::collection::BulkAction;
use crate::screen::ScreenKind;

#[derive(Parser, Debug)]
#[command(name = "backoffice")]
#[command(about = "Moderate marketplace categories and vendors")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format flags shared by every command
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List one page of a screen
    #[command(visible_alias = "ls")]
    List {
        /// Screen: categories, sub-categories, vendors-active, vendors-blocked
        #[arg(value_parser = parse_screen)]
        screen: ScreenKind,

        /// Parent category (required for sub-categories)
        #[arg(long)]
        category: Option<String>,

        /// Page to show (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Rows per page (default: page_size from config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Case-insensitive text search
        #[arg(short, long)]
        search: Option<String>,

        /// Only rows with this status ("all" for every status)
        #[arg(long)]
        status: Option<String>,

        /// Only rows of this type (case-insensitive)
        #[arg(short = 't', long = "type")]
        item_type: Option<String>,

        /// Field to sort by
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending instead of ascending
        #[arg(long, requires = "sort")]
        desc: bool,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Apply an action to several rows
    Bulk {
        /// Screen: categories, sub-categories, vendors-active, vendors-blocked
        #[arg(value_parser = parse_screen)]
        screen: ScreenKind,

        /// Action: block, unblock, activate, deactivate, delete
        #[arg(value_parser = parse_action)]
        action: BulkAction,

        /// Identifiers of the rows to change
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,

        /// Parent category (required for sub-categories)
        #[arg(long)]
        category: Option<String>,

        /// Confirm a delete
        #[arg(short, long)]
        yes: bool,

        /// Requests in flight at once (default: bulk_concurrency from config)
        #[arg(long)]
        concurrency: Option<usize>,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        #[command(flatten)]
        output: OutputOptions,
    },
}

fn parse_screen(s: &str) -> Result<ScreenKind, String> {
    s.parse().map_err(|_| {
        let valid: Vec<String> = ScreenKind::ALL.iter().map(|k| k.to_string()).collect();
        format!("Invalid screen. Must be one of: {}", valid.join(", "))
    })
}

fn parse_action(s: &str) -> Result<BulkAction, String> {
    s.parse().map_err(|_| {
        let valid: Vec<String> = BulkAction::ALL.iter().map(|a| a.to_string()).collect();
        format!("Invalid action. Must be one of: {}", valid.join(", "))
    })
}
