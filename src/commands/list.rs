use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{format_status, http_controller, print_json};
use crate::cli::OutputOptions;
use crate::collection::{
    CollectionConfig, CollectionController, ControllerOptions, ValueFilter, ViewSnapshot,
};
use crate::config::Config;
use crate::error::Result;
use crate::record::{JsonItem, Record};
use crate::remote::{ItemMutator, PageSource};
use crate::screen::{Screen, ScreenKind};

/// Arguments of `backoffice list`
#[derive(Debug, Clone)]
pub struct ListCommand {
    pub screen: ScreenKind,
    pub category: Option<String>,
    pub page: usize,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub item_type: Option<String>,
    pub sort: Option<String>,
    pub desc: bool,
    pub output: OutputOptions,
}

impl ListCommand {
    /// Push the requested filters and sort into `controller`.
    pub fn apply_to<S, M>(&self, controller: &CollectionController<JsonItem, S, M>)
    where
        S: PageSource,
        M: ItemMutator,
    {
        if let Some(search) = &self.search {
            controller.set_search(search.as_str());
        }
        if let Some(status) = &self.status {
            controller.set_status_filter(ValueFilter::parse(status));
        }
        if let Some(item_type) = &self.item_type {
            controller.set_type_filter(ValueFilter::parse(item_type));
        }
        if let Some(key) = &self.sort {
            controller.request_sort(key);
            if self.desc {
                controller.request_sort(key);
            }
        }
    }
}

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    item_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn text_field(item: &JsonItem, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| item.field(name))
        .map(|value| value.as_text().into_owned())
}

fn list_row(item: &JsonItem, config: &CollectionConfig) -> ListRow {
    let status = text_field(item, &[config.status_field.as_str()])
        .unwrap_or_else(|| config.default_status.clone());
    ListRow {
        id: item.id().to_string(),
        name: text_field(item, &["label", "name", "businessName"])
            .unwrap_or_else(|| "-".to_string()),
        item_type: text_field(item, &[config.type_field.as_str()])
            .unwrap_or_else(|| "-".to_string()),
        status: format_status(&status),
        created: text_field(item, &["createdAt", "created_at"]).unwrap_or_default(),
    }
}

/// "Showing 11-12 of 12 (page 2 of 2)"
pub fn page_footer<T>(view: &ViewSnapshot<T>) -> String {
    let pagination = &view.pagination;
    match pagination.item_range() {
        Some((start, end)) => format!(
            "Showing {start}-{end} of {} (page {} of {})",
            pagination.total(),
            pagination.page(),
            pagination.page_count()
        ),
        None => "No rows".to_string(),
    }
}

/// List one page of a screen
pub async fn cmd_list(command: ListCommand) -> Result<()> {
    let config = Config::load()?;
    let mut options = ControllerOptions::from(&config);
    if let Some(limit) = command.limit {
        options.page_size = limit.max(1);
    }

    let screen = Screen::new(command.screen).with_parent(command.category.clone());
    let field_config = screen.collection_config();
    let controller = http_controller(&config, screen, options)?;

    command.apply_to(&controller);
    controller.load_page(command.page.max(1)).await?;
    let view = controller.snapshot();

    if let Some(diagnostic) = &view.diagnostic {
        eprintln!(
            "{} unexpected response from server: {diagnostic}",
            "Warning:".yellow()
        );
    }

    if command.output.json {
        return print_json(&view);
    }

    if view.rows.is_empty() {
        println!("No rows found.");
        return Ok(());
    }

    let rows: Vec<ListRow> = view
        .rows
        .iter()
        .map(|row| list_row(&row.item, &field_config))
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("\n{}", page_footer(&view).dimmed());

    Ok(())
}
