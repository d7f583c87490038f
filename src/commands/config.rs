use owo_colors::OwoColorize;
use serde_json::json;

use super::print_json;
use crate::cli::OutputOptions;
use crate::config::{API_URL_ENV, Config};
use crate::error::Result;

/// Show the effective configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let api_url = config.api_url();
    let api_url_from_env = std::env::var(API_URL_ENV).is_ok_and(|v| !v.trim().is_empty());

    if output.json {
        return print_json(&json!({
            "api_url": api_url,
            "api_url_from_env": api_url_from_env,
            "request_timeout": config.request_timeout,
            "page_size": config.page_size,
            "bulk_concurrency": config.bulk_concurrency,
            "notice_ttl": config.notice_ttl,
            "config_file": Config::config_path().to_string_lossy(),
        }));
    }

    println!("{}\n", "Configuration:".cyan().bold());
    match api_url {
        Some(url) if api_url_from_env => {
            println!("{}: {url} {}", "api_url".cyan(), "(from environment)".dimmed())
        }
        Some(url) => println!("{}: {url}", "api_url".cyan()),
        None => println!("{}: {}", "api_url".cyan(), "not set".dimmed()),
    }
    println!("{}: {}s", "request_timeout".cyan(), config.request_timeout);
    println!("{}: {}", "page_size".cyan(), config.page_size);
    println!("{}: {}", "bulk_concurrency".cyan(), config.bulk_concurrency);
    println!("{}: {}s", "notice_ttl".cyan(), config.notice_ttl);
    println!(
        "\n{} {}",
        "Config file:".dimmed(),
        Config::config_path().display()
    );

    Ok(())
}
