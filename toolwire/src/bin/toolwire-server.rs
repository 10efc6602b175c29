//! Serves the calculator tools over newline-delimited JSON-RPC.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "toolwire-server", version, about = "Serve the toolwire calculator tools")]
struct Cli {
    /// Accept TCP connections on this address instead of serving stdio
    #[arg(long, env = "TOOLWIRE_LISTEN")]
    listen: Option<String>,

    /// Raise log verbosity (-v info, -vv debug); logs go to stderr
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    toolwire::init_logging(cli.verbose);

    let server = toolwire::math_server()?;

    match cli.listen {
        Some(address) => {
            let listener = TcpListener::bind(&address)
                .await
                .with_context(|| format!("failed to bind {address}"))?;

            tokio::select! {
                served = server.serve_tcp(listener) => served?,
                signal = tokio::signal::ctrl_c() => {
                    signal.context("failed to listen for ctrl-c")?;
                    tracing::info!("shutting down");
                }
            }
        }
        None => server.serve_stdio().await?,
    }

    Ok(())
}
