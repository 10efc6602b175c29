//! Orchestrator-side client for a tool endpoint.
//!
//! One request is outstanding per connection at a time. Every round-trip is
//! bounded by the client timeout; a response that arrives after its request
//! timed out is skipped when the next request reads the stream.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tcommon::with_deadline;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, OnceCell};
use ttooling::{Catalog, ToolError, ToolInvocation, ToolResult, ToolSpec};

use crate::{
    ChannelError, Frame, FrameReader, FrameWriter, InitializeParams, InitializeResult, ListToolsResult,
    PROTOCOL_VERSION, PeerInfo, RpcRequest, RpcResponse, codes, encode_frame, frame_reader,
    frame_writer, methods,
};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

type BoxReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// How to launch an endpoint process that speaks the protocol on its stdio.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerCommand {
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl ServerCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

struct Connection {
    reader: FrameReader<BoxReader>,
    writer: FrameWriter<BoxWriter>,
    /// Set while a request frame is being written; still set afterwards means
    /// the write was cut short and the peer may hold a partial frame.
    writing: bool,
    broken: Option<ChannelError>,
}

pub struct ToolClient {
    name: String,
    connection: Mutex<Connection>,
    next_id: AtomicU64,
    timeout: Duration,
    catalog: OnceCell<Catalog>,
    client_info: PeerInfo,
    _child: Option<Mutex<Child>>,
}

impl ToolClient {
    pub fn new<R, W>(name: impl Into<String>, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            name: name.into(),
            connection: Mutex::new(Connection {
                reader: frame_reader(Box::new(reader) as BoxReader),
                writer: frame_writer(Box::new(writer) as BoxWriter),
                writing: false,
                broken: None,
            }),
            next_id: AtomicU64::new(1),
            timeout: DEFAULT_CALL_TIMEOUT,
            catalog: OnceCell::new(),
            client_info: PeerInfo::new("toolwire", env!("CARGO_PKG_VERSION")),
            _child: None,
        }
    }

    /// Launches the endpoint as a child process; it is killed when the client drops.
    pub fn spawn(name: impl Into<String>, command: &ServerCommand) -> Result<Self, ChannelError> {
        let name = name.into();
        let mut child = Command::new(&command.command)
            .args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| {
                ChannelError::spawn(format!(
                    "failed to start endpoint '{name}' ({}): {error}",
                    command.command
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ChannelError::spawn("endpoint stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ChannelError::spawn("endpoint stdout was not captured"))?;

        tracing::info!(endpoint = %name, command = %command.command, "spawned endpoint process");
        let mut client = Self::new(name, stdout, stdin);
        client._child = Some(Mutex::new(child));
        Ok(client)
    }

    pub async fn connect_tcp(
        name: impl Into<String>,
        address: impl ToSocketAddrs,
    ) -> Result<Self, ChannelError> {
        let stream = TcpStream::connect(address).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self::new(name, reader, writer))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_info = PeerInfo::new(name, version);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn initialize(&self) -> Result<InitializeResult, ChannelError> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            client_info: self.client_info.clone(),
        };
        let result: InitializeResult = self
            .request(methods::INITIALIZE, to_params(&params)?)
            .await?;

        if result.protocol_version != PROTOCOL_VERSION {
            return Err(ChannelError::protocol(format!(
                "endpoint speaks protocol '{}', expected '{PROTOCOL_VERSION}'",
                result.protocol_version
            )));
        }

        tracing::info!(
            endpoint = %self.name,
            server = %result.server_info.name,
            version = %result.server_info.version,
            "endpoint initialized"
        );
        Ok(result)
    }

    /// Requests the tool list from the endpoint without touching the cache.
    pub async fn list_tools(&self) -> Result<Vec<ToolSpec>, ChannelError> {
        let result: ListToolsResult = self.request(methods::LIST_TOOLS, json!({})).await?;
        Ok(result.tools)
    }

    /// Returns the session catalog, fetching it on first use.
    pub async fn fetch_catalog(&self) -> Result<Catalog, ToolError> {
        let catalog = self
            .catalog
            .get_or_try_init(|| async {
                let tools = self.list_tools().await?;
                tracing::debug!(endpoint = %self.name, tools = tools.len(), "catalog fetched");
                Ok::<_, ChannelError>(Catalog::from_specs(tools))
            })
            .await?;

        Ok(catalog.clone())
    }

    pub fn cached_catalog(&self) -> Option<&Catalog> {
        self.catalog.get()
    }

    /// Executes one invocation. Never retries; every failure is returned as
    /// [`ToolResult::Failure`].
    pub async fn call(&self, invocation: ToolInvocation) -> ToolResult {
        if let Some(catalog) = self.catalog.get()
            && let Err(error) = catalog.validate(&invocation)
        {
            return ToolResult::failure(error);
        }

        let tool_name = invocation.tool_name.clone();
        let params = match to_params(&invocation) {
            Ok(params) => params,
            Err(error) => return ToolResult::failure(ToolError::from(error).with_tool_name(tool_name)),
        };

        match self.round_trip(methods::CALL_TOOL, params).await {
            Ok(response) => call_result(response, &tool_name),
            Err(error) => {
                tracing::warn!(endpoint = %self.name, %tool_name, error = %error, "tool call failed");
                ToolResult::failure(ToolError::from(error).with_tool_name(tool_name))
            }
        }
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChannelError> {
        let response = self.round_trip(method, params).await?;

        if let Some(error) = response.error {
            return Err(ChannelError::remote(&error));
        }

        let result = response
            .result
            .ok_or_else(|| ChannelError::protocol(format!("{method} response has no result")))?;
        serde_json::from_value(result)
            .map_err(|error| ChannelError::protocol(format!("malformed {method} result: {error}")))
    }

    async fn round_trip(&self, method: &str, params: Value) -> Result<RpcResponse, ChannelError> {
        let mut connection = self.connection.lock().await;
        if let Some(error) = &connection.broken {
            return Err(error.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = encode_frame(&RpcRequest::new(id, method, params))?;
        let pending = exchange(&mut connection, id, frame);

        let outcome = match with_deadline(self.timeout, pending).await {
            Ok(outcome) => outcome,
            Err(elapsed) if connection.writing => Err(ChannelError::closed(format!(
                "request write interrupted, connection abandoned: {elapsed}"
            ))),
            Err(elapsed) => Err(elapsed.into()),
        };

        if let Err(error) = &outcome
            && (error.is_fatal() || connection.writing)
        {
            connection.broken = Some(error.clone());
        }

        outcome
    }
}

async fn exchange(connection: &mut Connection, id: u64, frame: String) -> Result<RpcResponse, ChannelError> {
    connection.writing = true;
    connection.writer.send(frame).await?;
    connection.writing = false;
    let expected = Value::from(id);

    loop {
        let frame = match connection.reader.next().await {
            Some(Ok(Frame::Text(frame))) => frame,
            Some(Ok(unreadable)) => {
                tracing::warn!(frame = ?unreadable, "skipping unreadable frame from endpoint");
                continue;
            }
            Some(Err(error)) => return Err(error.into()),
            None => return Err(ChannelError::closed("endpoint closed the connection")),
        };

        if frame.trim().is_empty() {
            continue;
        }

        let response: RpcResponse = match serde_json::from_str(&frame) {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(error = %error, "skipping malformed frame from endpoint");
                continue;
            }
        };

        if response.id == expected {
            return Ok(response);
        }

        if response.id.is_null() {
            if let Some(error) = response.error {
                return Err(ChannelError::remote(&error));
            }
            continue;
        }

        tracing::debug!(id = %response.id, "skipping stale response");
    }
}

fn to_params<T: serde::Serialize>(value: &T) -> Result<Value, ChannelError> {
    serde_json::to_value(value)
        .map_err(|error| ChannelError::protocol(format!("failed to encode params: {error}")))
}

fn call_result(response: RpcResponse, tool_name: &str) -> ToolResult {
    if let Some(error) = response.error {
        let failure = match error.code {
            codes::INVALID_PARAMS => ToolError::invalid_arguments(error.message),
            _ => ToolError::from(ChannelError::remote(&error)),
        };
        return ToolResult::failure(failure.with_tool_name(tool_name));
    }

    let Some(result) = response.result else {
        return ToolResult::failure(
            ToolError::transport("tools/call response has no result").with_tool_name(tool_name),
        );
    };

    serde_json::from_value(result).unwrap_or_else(|error| {
        ToolResult::failure(
            ToolError::transport(format!("malformed tools/call result: {error}"))
                .with_tool_name(tool_name),
        )
    })
}

#[cfg(test)]
mod tests {
    use ttooling::ToolErrorKind;

    use super::*;
    use crate::RpcError;

    #[test]
    fn server_command_builder_collects_arguments() {
        let command = ServerCommand::new("toolwire-server")
            .arg("--listen")
            .args(["127.0.0.1:0"])
            .env("RUST_LOG", "debug");

        assert_eq!(command.args, vec!["--listen", "127.0.0.1:0"]);
        assert_eq!(command.env.get("RUST_LOG").map(String::as_str), Some("debug"));
    }

    #[test]
    fn call_results_map_protocol_errors() {
        let invalid = call_result(
            RpcResponse::failure(json!(1), RpcError::invalid_params("missing name")),
            "add",
        );
        assert_eq!(
            invalid.error().map(|error| error.kind),
            Some(ToolErrorKind::InvalidArguments)
        );

        let unknown_method = call_result(
            RpcResponse::failure(json!(1), RpcError::method_not_found("tools/call")),
            "add",
        );
        assert_eq!(
            unknown_method.error().map(|error| error.kind),
            Some(ToolErrorKind::TransportError)
        );

        let garbage = call_result(RpcResponse::success(json!(1), json!("twelve")), "add");
        assert_eq!(
            garbage.error().map(|error| error.kind),
            Some(ToolErrorKind::TransportError)
        );
    }

    #[tokio::test]
    async fn spawn_failures_are_reported() {
        let result = ToolClient::spawn("missing", &ServerCommand::new("/nonexistent/toolwire-endpoint"));

        match result {
            Err(error) => assert_eq!(error.kind, crate::ChannelErrorKind::Spawn),
            Ok(_) => panic!("spawning a missing binary should fail"),
        }
    }
}
