mod command_line;
mod logging;

use anyhow::Result;
use aws_local_dev::ConnectionConfig;
use clap::Parser;
use tracing::debug;

use crate::command_line::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.global.verbose)?;

    let mut config = ConnectionConfig::from_env()?;
    if let Some(endpoint_url) = cli.global.endpoint_url {
        config = config.with_endpoint_url(endpoint_url)?;
    }
    debug!("Resolved connection config: {:?}", config);

    command_line::run(cli.command, config).await
}
