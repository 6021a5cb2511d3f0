mod aggregator;
mod agents;
mod client;
mod config;
mod console;
mod gemini;
mod server;
mod types;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::aggregator::Aggregator;
use crate::client::{ApiClient, DEFAULT_API_URL};
use crate::config::Config;
use crate::console::Console;

#[derive(Debug, Parser)]
struct Args {
    /// Run the interactive console client instead of the API server
    #[arg(long, default_value_t = false)]
    console: bool,

    /// Address the API server binds to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port the API server binds to
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Aggregator endpoint the console client posts to (overrides API_URL)
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    // logging
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter_layer).init();

    tracing::info!("Starting Breakup Recovery Assistant");

    // Configuration is read once here and threaded through construction;
    // a missing credential fails fast in either mode.
    let config = Config::load()?;

    if args.console {
        let api_url = args
            .api_url
            .or_else(|| config.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let client = ApiClient::new(api_url, config.timeout)?;
        let console = Console::new(client);
        console.run().await?;
        return Ok(());
    }

    let aggregator = Aggregator::new(config)?;
    server::serve(aggregator, &args.host, args.port).await
}
