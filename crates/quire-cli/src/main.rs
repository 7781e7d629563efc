use anyhow::{Context, Result};
use clap::Parser;
use quire_config::{ConfigLoader, EngineConfig};
use quire_core::Dialect;
use quire_engine::QueryEngine;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod output;

use cli::{Cli, Commands, OutputFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins when set; otherwise the flags decide
    let env_filter = EnvFilter::builder()
        .with_default_directive(cli.level().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let ok = match &cli.command {
        Commands::Check { dialect, statement } => check((*dialect).into(), statement),
        Commands::Query {
            dialect,
            format,
            context,
            statement,
        } => {
            let config = load_config(&cli).await?;
            let context = match context {
                Some(raw) => serde_json::from_str(raw).context("--context is not valid JSON")?,
                None => serde_json::Value::Null,
            };
            query(config, (*dialect).into(), *format, context, statement).await?
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .await
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ConfigLoader::load_from_env()?,
    };

    if let Some(target) = &cli.sql_target {
        config.sql.target = Some(target.clone());
    }
    if let Some(target) = &cli.cypher_target {
        config.cypher.target = Some(target.clone());
    }
    config.validate()?;

    debug!(?config, "Effective configuration");
    Ok(config)
}

fn check(dialect: Dialect, statement: &str) -> bool {
    match quire_query::check(dialect, statement) {
        Ok(()) => {
            println!("accepted");
            true
        }
        Err(e) => {
            println!("rejected: {}", e);
            false
        }
    }
}

async fn query(
    config: EngineConfig,
    dialect: Dialect,
    format: OutputFormat,
    context: serde_json::Value,
    statement: &str,
) -> Result<bool> {
    let engine = QueryEngine::initialize(config).await;
    let result = engine.run_query(dialect, statement, context).await;

    match format {
        OutputFormat::Json => println!("{}", output::render_json(&result)?),
        OutputFormat::Table => println!("{}", output::render_table(&result)),
    }
    Ok(result.success)
}
