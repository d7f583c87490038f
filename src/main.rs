use clap::Parser;
use std::process::ExitCode;

use backoffice::cli::{Cli, Commands, ConfigAction};
use backoffice::commands::{BulkCommand, ListCommand, cmd_bulk, cmd_config_show, cmd_list};
use backoffice::logging;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List {
            screen,
            category,
            page,
            limit,
            search,
            status,
            item_type,
            sort,
            desc,
            output,
        } => {
            cmd_list(ListCommand {
                screen,
                category,
                page,
                limit,
                search,
                status,
                item_type,
                sort,
                desc,
                output,
            })
            .await
        }

        Commands::Bulk {
            screen,
            action,
            ids,
            category,
            yes,
            concurrency,
            output,
        } => {
            cmd_bulk(BulkCommand {
                screen,
                action,
                ids,
                category,
                yes,
                concurrency,
                output,
            })
            .await
        }

        Commands::Config { action } => match action {
            ConfigAction::Show { output } => cmd_config_show(output),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
