use crate::config::Config;
use crate::error::Result;
use crate::gateway::run_gateway;
use crate::judge::Judge;
use crate::providers::{AnthropicProvider, Provider};
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "ecocart",
    about = "Sustainability scoring backend for grocery items",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP gateway
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Evaluate a single food item and print the judgment as JSON
    Judge {
        /// Free-text description of the food item
        query: Vec<String>,
    },
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            run_gateway(&host, port, &config).await?;
            Ok(())
        }
        Command::Judge { query } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                return Err(anyhow::anyhow!("a food query is required").into());
            }
            let provider: Arc<dyn Provider> = Arc::new(AnthropicProvider::with_base_url(
                config.api_key.as_deref(),
                config.base_url.as_deref(),
            ));
            let judge = Judge::new(
                provider,
                config.model.clone(),
                config.judge_max_tokens,
                config.summary_max_tokens,
            );
            let judgment = judge.evaluate_food(&query).await;
            println!("{}", serde_json::to_string_pretty(&judgment).map_err(anyhow::Error::from)?);
            Ok(())
        }
    }
}
