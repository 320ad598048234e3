//! Contentbot - a GraphQL API over flat-file content.

mod cli;
mod config;
mod init;
mod serve;

use anyhow::{Context, Result, bail};
use async_graphql::{Request, Variables};
use clap::Parser;
use cli::{Cli, Commands};
use config::BotConfig;
use contentbot::Contentbot;
use init::new_project;
use serve::serve_bot;
use std::fs;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Init { .. } => new_project(&config),
        Commands::Schema => {
            let runtime = runtime()?;
            let bot = runtime.block_on(open_bot(&config))?;
            println!("{}", bot.sdl());
            Ok(())
        }
        Commands::Query {
            query,
            variables,
            file,
        } => {
            let runtime = runtime()?;
            let bot = runtime.block_on(open_bot(&config))?;
            run_query(&runtime, &bot, query, variables.as_deref(), *file)
        }
        Commands::Serve { .. } => {
            let runtime = runtime()?;
            let bot = runtime.block_on(open_bot(&config))?;
            serve_bot(&config, &runtime, &bot)
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<BotConfig> {
    let root = cli.root.as_deref().unwrap_or(std::path::Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        BotConfig::from_path(&config_path)?
    } else {
        BotConfig::default()
    };
    config.update_with_cli(cli);

    if cli.is_init() {
        if config.config_path.exists() {
            bail!("Config file already exists. Remove it manually or init in a different path.");
        }
    } else {
        config.validate()?;
    }

    Ok(config)
}

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")
}

async fn open_bot(config: &BotConfig) -> Result<Contentbot> {
    let bot = config.bot_builder()?.build().await?;
    Ok(bot)
}

/// Execute one operation and print the response, failing if it has errors.
fn run_query(
    runtime: &Runtime,
    bot: &Contentbot,
    query: &str,
    variables: Option<&str>,
    from_file: bool,
) -> Result<()> {
    let query = if from_file {
        fs::read_to_string(query).with_context(|| format!("Failed to read {query}"))?
    } else {
        query.to_owned()
    };

    let mut request = Request::new(query);
    if let Some(variables) = variables {
        let variables: serde_json::Value =
            serde_json::from_str(variables).context("--variables must be a JSON object")?;
        request = request.variables(Variables::from_json(variables));
    }

    let response = runtime.block_on(bot.execute(request));
    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.is_err() {
        bail!("query failed with {} error(s)", response.errors.len());
    }
    Ok(())
}
