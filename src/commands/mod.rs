mod bulk;
mod config;
mod list;

pub use bulk::{BulkCommand, cmd_bulk, select_ids};
pub use config::cmd_config_show;
pub use list::{ListCommand, cmd_list};

use owo_colors::OwoColorize;
use serde::Serialize;

use crate::collection::{BulkOperationResult, CollectionController, ControllerOptions};
use crate::config::Config;
use crate::error::Result;
use crate::record::JsonItem;
use crate::remote::{HttpBackend, HttpMutator};
use crate::screen::Screen;

/// Controller wired to the REST backend
pub type HttpController = CollectionController<JsonItem, HttpBackend, HttpMutator>;

/// Build a controller for `screen` from the loaded config.
pub fn http_controller(
    config: &Config,
    screen: Screen,
    options: ControllerOptions,
) -> Result<HttpController> {
    let backend = HttpBackend::from_config(config)?;
    let mutator = backend.mutator(&screen);
    Ok(CollectionController::new(screen, backend, mutator, options))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Color a status value for terminal output
pub fn format_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "active" => status.green().to_string(),
        "blocked" => status.red().to_string(),
        "inactive" | "deactivated" => status.dimmed().to_string(),
        _ => status.yellow().to_string(),
    }
}

/// Summary line plus one line per failed identifier
pub fn format_bulk_result(result: &BulkOperationResult) -> String {
    let header = format!("{}: {}", result.action(), result.summary());
    let mut output = if !result.has_failures() && !result.was_cancelled() {
        header.green().to_string()
    } else if result.success_count() == 0 {
        header.red().to_string()
    } else {
        header.yellow().to_string()
    };

    for failure in result.failures() {
        output.push_str(&format!(
            "\n  {} {}: {}",
            "✗".red(),
            failure.identifier.cyan(),
            failure.error_message
        ));
    }
    if !result.skipped().is_empty() {
        output.push_str(&format!(
            "\n  {} {}",
            "skipped:".dimmed(),
            result.skipped().join(", ")
        ));
    }
    output
}
