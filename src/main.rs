//! fichas - Wildlife Intake Record Browser
//!
//! Search, select and print intake records kept behind a spreadsheet gateway.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use fichas::{Config, Query, SortOrder};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("fichas")
        .version(fichas::VERSION)
        .about("Search, select and print wildlife intake records")
        .long_about(
            "fichas fetches intake records from a spreadsheet web-app gateway, filters and \
             orders them locally, and opens their printable clinical, post-mortem or \
             captive-birth documents.",
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Configuration file (default: <config dir>/fichas/config.toml)"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .help("Gateway web-app URL, overrides gateway.base_url"),
        )
        .arg(
            Arg::new("query")
                .long("query")
                .value_name("TEXT")
                .default_value("")
                .help("Initial search text; empty lists every record"),
        )
        .arg(
            Arg::new("order")
                .long("order")
                .value_name("ORDER")
                .default_value("newest")
                .help("Initial ordering by entry number: newest or oldest"),
        )
        .arg(
            Arg::new("callback")
                .long("callback")
                .action(ArgAction::SetTrue)
                .help("Ask the gateway for callback-wrapped replies"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .action(ArgAction::SetTrue)
                .help("Run one search, print the rows and exit"),
        )
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let path = matches.get_one::<String>("config").map(PathBuf::from);
    let mut config = Config::discover(path.as_deref()).context("loading configuration")?;

    if let Some(url) = matches.get_one::<String>("base-url") {
        config.gateway.base_url = url.clone();
    }
    if matches.get_flag("callback") {
        config.gateway.callback_mode = true;
    }
    config.validate()?;
    Ok(config)
}

fn initial_query(matches: &ArgMatches) -> Result<Query> {
    let text = matches.get_one::<String>("query").cloned().unwrap_or_default();
    let order = match matches.get_one::<String>("order") {
        Some(raw) => raw.parse::<SortOrder>()?,
        None => SortOrder::default(),
    };
    Ok(Query::new(text, order))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG controls the filter)
    env_logger::init();

    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    let query = initial_query(&matches)?;

    if matches.get_flag("list") {
        let gateway = fichas::Gateway::from_config(&config.gateway)?;
        let mut stdout = std::io::stdout().lock();
        fichas::app::list_records(&gateway, &query, &mut stdout).await?;
        return Ok(());
    }

    use fichas::render::ui::TerminalUI;
    use fichas::Application;

    let ui_renderer = Box::new(TerminalUI::new()?);
    let mut app = Application::new(config, query, ui_renderer)?;

    app.run().await?;

    Ok(())
}
