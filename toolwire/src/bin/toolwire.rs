//! Interactive front end: one natural-language request per line.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use toolwire::{Orchestrator, ProviderId, ToolwireConfig};

#[derive(Debug, Parser)]
#[command(name = "toolwire", version, about = "Route natural-language requests to tools")]
struct Cli {
    /// Answer a single request and exit
    #[arg(long)]
    once: Option<String>,

    /// Completion provider: openai or ollama
    #[arg(long)]
    provider: Option<ProviderId>,

    #[arg(long)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long)]
    base_url: Option<String>,

    /// JSON file listing the tool servers to launch
    #[arg(long)]
    servers: Option<PathBuf>,

    /// Completion timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Raise log verbosity (-v info, -vv debug); logs go to stderr
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply(&self, mut config: ToolwireConfig) -> Result<ToolwireConfig> {
        if let Some(provider) = self.provider {
            config = config.with_provider(provider);
        }
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(servers) = &self.servers {
            config = config.with_servers_file(servers);
        }
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                bail!("--timeout must be at least one second");
            }
            config = config.with_completion_timeout(Duration::from_secs(timeout));
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    toolwire::init_logging(cli.verbose);

    let config = cli.apply(ToolwireConfig::from_env()?)?;
    let orchestrator = toolwire::connect(&config).await?;

    if let Some(request) = &cli.once {
        println!("{}", orchestrator.handle(request).await);
        return Ok(());
    }

    print_catalog(&orchestrator).await;
    repl(&orchestrator).await
}

async fn print_catalog(orchestrator: &Orchestrator) {
    match orchestrator.catalog().await {
        Ok(catalog) => {
            println!("Available tools:");
            for spec in catalog.specs() {
                let params = spec
                    .parameters
                    .iter()
                    .map(|param| format!("{}: {}", param.name, param.param_type))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("  {}({params}) - {}", spec.name, spec.description);
            }
            println!();
        }
        Err(error) => eprintln!("could not list tools: {error}"),
    }
}

async fn repl(orchestrator: &Orchestrator) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim().to_ascii_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        println!("{}", orchestrator.handle(&line).await);
    }

    Ok(())
}
