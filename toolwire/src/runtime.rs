//! Runtime wiring for the tool server and the orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use tchannel::{EndpointSet, ServerCommand, ToolClient, ToolEndpoint, ToolServer};
use tobserve::{SafeOrchestrationHooks, SafeProviderHooks, SafeToolHooks, TracingObservabilityHooks};
use tplan::{CompletionResolver, Orchestrator};
use tprovider::{CompletionProvider, ObservedProvider};
use ttooling::DefaultToolRuntime;
use ttooling::math::math_registry;

use crate::{ServersFile, SetupError, ToolwireConfig, build_provider};

pub const DEFAULT_SERVER_NAME: &str = "math";
pub const SERVER_BINARY: &str = "toolwire-server";

/// The calculator tools behind a runtime that logs every execution.
pub fn math_tool_runtime() -> Result<DefaultToolRuntime, SetupError> {
    let registry = math_registry()?;
    Ok(DefaultToolRuntime::new(Arc::new(registry))
        .with_hooks(Arc::new(SafeToolHooks::new(TracingObservabilityHooks))))
}

pub fn math_server() -> Result<ToolServer, SetupError> {
    let runtime = math_tool_runtime()?;
    Ok(ToolServer::new(Arc::new(runtime)).with_info(SERVER_BINARY, env!("CARGO_PKG_VERSION")))
}

/// `toolwire-server` from the directory holding the running executable.
pub fn default_server_command() -> Result<ServerCommand, SetupError> {
    let exe = std::env::current_exe()
        .map_err(|error| SetupError::endpoint(format!("cannot locate current executable: {error}")))?;
    let dir = exe
        .parent()
        .map(PathBuf::from)
        .ok_or_else(|| SetupError::endpoint("current executable has no parent directory"))?;
    let binary = dir.join(format!("{SERVER_BINARY}{}", std::env::consts::EXE_SUFFIX));

    Ok(ServerCommand::new(binary.to_string_lossy()))
}

/// Servers from the configured servers file, or the bundled math server.
pub fn server_commands(config: &ToolwireConfig) -> Result<Vec<(String, ServerCommand)>, SetupError> {
    match &config.servers_file {
        Some(path) => {
            let commands = ServersFile::load(path)?.commands(|key| std::env::var(key).ok());
            if commands.is_empty() {
                return Err(SetupError::config(format!(
                    "servers file {} lists no servers",
                    path.display()
                )));
            }
            Ok(commands)
        }
        None => Ok(vec![(DEFAULT_SERVER_NAME.to_string(), default_server_command()?)]),
    }
}

/// Spawns and initializes each server. Servers that fail to start are
/// skipped; at least one must come up.
pub async fn connect_endpoints(
    config: &ToolwireConfig,
    commands: Vec<(String, ServerCommand)>,
) -> Result<EndpointSet, SetupError> {
    let mut endpoints = EndpointSet::new("toolwire");

    for (name, command) in commands {
        let client = match ToolClient::spawn(name.as_str(), &command) {
            Ok(client) => client.with_timeout(config.call_timeout),
            Err(error) => {
                tracing::warn!(endpoint = %name, error = %error, "skipping endpoint");
                continue;
            }
        };

        match client.initialize().await {
            Ok(info) => {
                tracing::info!(
                    endpoint = %name,
                    server = %info.server_info.name,
                    version = %info.server_info.version,
                    "endpoint ready"
                );
                endpoints = endpoints.with_endpoint(Arc::new(client));
            }
            Err(error) => tracing::warn!(endpoint = %name, error = %error, "skipping endpoint"),
        }
    }

    if endpoints.is_empty() {
        return Err(SetupError::endpoint("no tool endpoint could be started"));
    }

    Ok(endpoints)
}

pub fn observed_provider(provider: Arc<dyn CompletionProvider>) -> Arc<dyn CompletionProvider> {
    Arc::new(ObservedProvider::new(
        provider,
        Arc::new(SafeProviderHooks::new(TracingObservabilityHooks)),
    ))
}

pub fn build_resolver(
    config: &ToolwireConfig,
    provider: Arc<dyn CompletionProvider>,
) -> CompletionResolver {
    let options = tcommon::GenerationOptions::default().with_temperature(config.temperature);
    CompletionResolver::new(provider, config.model())
        .with_options(options)
        .with_timeout(config.completion_timeout)
}

pub fn build_orchestrator(
    config: &ToolwireConfig,
    endpoint: Arc<dyn ToolEndpoint>,
    provider: Arc<dyn CompletionProvider>,
) -> Result<Orchestrator, SetupError> {
    let resolver = build_resolver(config, observed_provider(provider));
    let orchestrator = Orchestrator::builder()
        .endpoint(endpoint)
        .resolver(Arc::new(resolver))
        .hooks(Arc::new(SafeOrchestrationHooks::new(TracingObservabilityHooks)))
        .build()?;

    Ok(orchestrator)
}

/// Everything the interactive front end needs, built from configuration.
pub async fn connect(config: &ToolwireConfig) -> Result<Orchestrator, SetupError> {
    config.validate()?;
    let provider = build_provider(config)?;
    let endpoints = connect_endpoints(config, server_commands(config)?).await?;
    build_orchestrator(config, Arc::new(endpoints), provider)
}
