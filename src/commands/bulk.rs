use std::collections::HashSet;

use owo_colors::OwoColorize;

use super::{format_bulk_result, http_controller, print_json};
use crate::cli::OutputOptions;
use crate::collection::{
    BulkAction, CollectionController, ControllerOptions, PagingMode, PendingDelete,
};
use crate::config::Config;
use crate::error::Result;
use crate::record::Record;
use crate::remote::{ItemMutator, PageSource};
use crate::screen::{Screen, ScreenKind};

/// Arguments of `backoffice bulk`
#[derive(Debug, Clone)]
pub struct BulkCommand {
    pub screen: ScreenKind,
    pub action: BulkAction,
    pub ids: Vec<String>,
    pub category: Option<String>,
    pub yes: bool,
    pub concurrency: Option<usize>,
    pub output: OutputOptions,
}

/// Select `ids` in `controller`, walking server pages until every one is
/// found or the last page is reached. Returns the identifiers never seen.
pub async fn select_ids<T, S, M>(
    controller: &CollectionController<T, S, M>,
    ids: &[String],
) -> Result<Vec<String>>
where
    T: Record + Clone + serde::de::DeserializeOwned + Send,
    S: PageSource,
    M: ItemMutator,
{
    let mut wanted: Vec<&str> = {
        let mut seen = HashSet::new();
        ids.iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect()
    };

    let mut page = 1;
    loop {
        controller.load_page(page).await?;
        wanted.retain(|id| !controller.select(id));

        let view = controller.snapshot();
        if wanted.is_empty()
            || view.mode == PagingMode::Client
            || view.pagination.on_last_page()
        {
            break;
        }
        page += 1;
    }

    Ok(wanted.into_iter().map(str::to_string).collect())
}

/// Apply an action to several rows of a screen
pub async fn cmd_bulk(command: BulkCommand) -> Result<()> {
    let screen = Screen::new(command.screen).with_parent(command.category.clone());
    screen.ensure_allows(command.action)?;

    let config = Config::load()?;
    let mut options = ControllerOptions::from(&config);
    if let Some(concurrency) = command.concurrency {
        options.bulk_concurrency = concurrency.max(1);
    }
    let controller = http_controller(&config, screen, options)?;

    let missing = select_ids(&controller, &command.ids).await?;
    if !missing.is_empty() {
        eprintln!(
            "{} not found on the {} screen, skipping: {}",
            "Warning:".yellow(),
            command.screen,
            missing.join(", ")
        );
    }

    let result = if command.action.requires_confirmation() {
        let token = controller.request_bulk_delete()?;
        if !command.yes {
            if let Some(pending) = controller.snapshot().pending_delete {
                println!("{}", delete_preview(&pending));
            }
            println!("{}", "Re-run with --yes to delete.".dimmed());
            controller.cancel_bulk_delete();
            return Ok(());
        }
        let canceller = watch_for_interrupt(controller.clone());
        let result = controller.confirm_bulk_delete(token).await;
        canceller.abort();
        result?
    } else {
        let canceller = watch_for_interrupt(controller.clone());
        let result = controller.run_bulk_action(command.action).await;
        canceller.abort();
        result?
    };

    if command.output.json {
        print_json(&result)?;
    } else {
        println!("{}", format_bulk_result(&result));
    }
    Ok(())
}

/// Ctrl-C stops the bulk loop before its next item instead of killing the
/// process mid-request.
fn watch_for_interrupt<T, S, M>(
    controller: CollectionController<T, S, M>,
) -> tokio::task::JoinHandle<()>
where
    T: Record + Clone + serde::de::DeserializeOwned + Send + 'static,
    S: PageSource + 'static,
    M: ItemMutator + 'static,
{
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && controller.cancel_bulk_action() {
            eprintln!("{}", "Interrupted, finishing the current item...".yellow());
        }
    })
}

/// Confirmation prompt for an unconfirmed delete, listing the identifiers
/// when there is more than one.
fn delete_preview(pending: &PendingDelete) -> String {
    let mut text = pending.prompt();
    if pending.identifiers.len() > 1 {
        text.push_str(&format!("\n  {}", pending.identifiers.join(", ")));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_preview_single() {
        let pending = PendingDelete::new(vec!["v7".into()]);
        assert_eq!(delete_preview(&pending), "Delete 'v7'? This cannot be undone.");
    }

    #[test]
    fn test_delete_preview_lists_identifiers() {
        let pending = PendingDelete::new(vec!["v1".into(), "v4".into()]);
        assert_eq!(
            delete_preview(&pending),
            "Delete 2 items? This cannot be undone.\n  v1, v4"
        );
    }
}
