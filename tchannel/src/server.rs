//! Tool endpoint server: answers `initialize`, `tools/list` and `tools/call`
//! frames from a [`ToolRuntime`].
//!
//! Tool failures travel inside a successful response as a serialized
//! [`ToolResult`](ttooling::ToolResult); JSON-RPC errors are reserved for
//! frames the server cannot interpret.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use ttooling::{ToolInvocation, ToolRuntime};

use crate::{
    ChannelError, Frame, InitializeResult, JSONRPC_VERSION, ListToolsResult, MAX_FRAME_BYTES,
    PROTOCOL_VERSION, PeerInfo, RpcError, RpcRequest, RpcResponse, encode_frame, frame_reader,
    frame_writer, methods,
};

#[derive(Clone)]
pub struct ToolServer {
    runtime: Arc<dyn ToolRuntime>,
    info: PeerInfo,
}

impl ToolServer {
    pub fn new(runtime: Arc<dyn ToolRuntime>) -> Self {
        Self {
            runtime,
            info: PeerInfo::new("toolwire", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.info = PeerInfo::new(name, version);
        self
    }

    pub fn info(&self) -> &PeerInfo {
        &self.info
    }

    /// Handles one raw frame. Returns `None` for notifications.
    pub async fn handle_frame(&self, frame: &str) -> Option<RpcResponse> {
        let raw: Value = match serde_json::from_str(frame) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(error = %error, "discarding unparseable frame");
                return Some(RpcResponse::failure(
                    Value::Null,
                    RpcError::parse_error(format!("frame is not valid JSON: {error}")),
                ));
            }
        };

        let id = raw.get("id").cloned().unwrap_or(Value::Null);
        let request: RpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(error) => {
                return Some(RpcResponse::failure(
                    id,
                    RpcError::invalid_request(format!("malformed request: {error}")),
                ));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(RpcResponse::failure(
                id,
                RpcError::invalid_request(format!(
                    "unsupported jsonrpc version '{}'",
                    request.jsonrpc
                )),
            ));
        }

        let id = request.id.clone()?;
        let response = match self.dispatch(request).await {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => RpcResponse::failure(id, error),
        };
        Some(response)
    }

    async fn dispatch(&self, request: RpcRequest) -> Result<Value, RpcError> {
        match request.method.as_str() {
            methods::INITIALIZE => to_result(&InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                server_info: self.info.clone(),
            }),
            methods::LIST_TOOLS => to_result(&ListToolsResult {
                tools: self.runtime.list_tools(),
            }),
            methods::CALL_TOOL => {
                let invocation: ToolInvocation = serde_json::from_value(request.params)
                    .map_err(|error| {
                        RpcError::invalid_params(format!("invalid tools/call params: {error}"))
                    })?;
                tracing::debug!(tool_name = %invocation.tool_name, "dispatching tool call");
                let result = self.runtime.invoke(invocation).await;
                to_result(&result)
            }
            other => Err(RpcError::method_not_found(other)),
        }
    }

    /// Serves requests from `reader` until it reaches end of stream. Only a
    /// transport failure ends the session early; unreadable lines get a
    /// parse error and the loop moves on.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ChannelError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut frames = frame_reader(reader);
        let mut sink = frame_writer(writer);

        while let Some(frame) = frames.next().await {
            let response = match frame? {
                Frame::Text(text) if text.trim().is_empty() => continue,
                Frame::Text(text) => self.handle_frame(&text).await,
                Frame::Oversized => {
                    tracing::warn!(limit = MAX_FRAME_BYTES, "discarding oversized frame");
                    Some(unreadable(format!(
                        "frame exceeds the {MAX_FRAME_BYTES} byte limit"
                    )))
                }
                Frame::NotUtf8 => {
                    tracing::warn!("discarding frame that is not valid UTF-8");
                    Some(unreadable("frame is not valid UTF-8"))
                }
            };

            if let Some(response) = response {
                let frame = match encode_frame(&response) {
                    Ok(frame) => frame,
                    Err(error) => encode_frame(&RpcResponse::failure(
                        response.id.clone(),
                        RpcError::internal(error.message),
                    ))?,
                };
                sink.send(frame).await?;
            }
        }

        Ok(())
    }

    pub async fn serve_stdio(&self) -> Result<(), ChannelError> {
        tracing::info!(server = %self.info.name, "serving tools on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Accepts connections forever, serving each on its own task.
    pub async fn serve_tcp(&self, listener: TcpListener) -> Result<(), ChannelError> {
        if let Ok(address) = listener.local_addr() {
            tracing::info!(server = %self.info.name, %address, "serving tools over tcp");
        }

        loop {
            let (stream, peer) = listener.accept().await?;
            let server = self.clone();
            tokio::spawn(async move {
                tracing::info!(%peer, "connection opened");
                let (reader, writer) = stream.into_split();
                match server.serve(reader, writer).await {
                    Ok(()) => tracing::info!(%peer, "connection closed"),
                    Err(error) => tracing::warn!(%peer, error = %error, "connection failed"),
                }
            });
        }
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value)
        .map_err(|error| RpcError::internal(format!("failed to encode result: {error}")))
}

fn unreadable(message: impl Into<String>) -> RpcResponse {
    RpcResponse::failure(Value::Null, RpcError::parse_error(message))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use ttooling::math::math_registry;
    use ttooling::{DefaultToolRuntime, ToolResult};

    use super::*;
    use crate::codes;

    fn server() -> ToolServer {
        let registry = math_registry().expect("math tools should register");
        ToolServer::new(Arc::new(DefaultToolRuntime::new(Arc::new(registry))))
    }

    #[tokio::test]
    async fn tool_failures_are_results_not_protocol_errors() {
        let frame = json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "divide", "arguments": {"a": 5, "b": 0}}
        })
        .to_string();

        let response = server().handle_frame(&frame).await.expect("response");
        assert_eq!(response.id, json!(3));
        assert!(response.error.is_none());

        let result: ToolResult =
            serde_json::from_value(response.result.expect("result")).expect("tool result");
        assert_eq!(
            result.error().map(|error| error.kind),
            Some(ttooling::ToolErrorKind::ExecutionError)
        );
    }

    #[tokio::test]
    async fn protocol_errors_use_standard_codes() {
        let server = server();

        let cases = [
            ("{not json".to_string(), codes::PARSE_ERROR, Value::Null),
            (json!({"jsonrpc": "2.0", "id": 1}).to_string(), codes::INVALID_REQUEST, json!(1)),
            (
                json!({"jsonrpc": "1.0", "id": 2, "method": "tools/list"}).to_string(),
                codes::INVALID_REQUEST,
                json!(2),
            ),
            (
                json!({"jsonrpc": "2.0", "id": 4, "method": "tools/delete"}).to_string(),
                codes::METHOD_NOT_FOUND,
                json!(4),
            ),
            (
                json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {"arguments": {}}})
                    .to_string(),
                codes::INVALID_PARAMS,
                json!(5),
            ),
        ];

        for (frame, code, id) in cases {
            let response = server.handle_frame(&frame).await.expect("response");
            assert_eq!(response.error.map(|error| error.code), Some(code), "{frame}");
            assert_eq!(response.id, id, "{frame}");
        }
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let frame = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();
        assert!(server().handle_frame(&frame).await.is_none());
    }

    #[tokio::test]
    async fn initialize_reports_server_identity() {
        let frame = json!({"jsonrpc": "2.0", "id": "init", "method": "initialize"}).to_string();
        let response = server()
            .with_info("calculator", "1.2.3")
            .handle_frame(&frame)
            .await
            .expect("response");

        let result: InitializeResult =
            serde_json::from_value(response.result.expect("result")).expect("initialize result");
        assert_eq!(result.protocol_version, PROTOCOL_VERSION);
        assert_eq!(result.server_info, PeerInfo::new("calculator", "1.2.3"));
    }

    async fn next_reply<R: AsyncRead + Unpin>(replies: &mut crate::FrameReader<R>) -> RpcResponse {
        use futures_util::StreamExt;

        let frame = replies.next().await.expect("reply").expect("io");
        serde_json::from_str(&frame.into_text().expect("text frame")).expect("response json")
    }

    #[tokio::test]
    async fn invalid_utf8_frame_gets_a_parse_error_and_serving_continues() {
        use tokio::io::AsyncWriteExt;

        let (mut client, endpoint) = tokio::io::duplex(4096);
        let (reader, writer) = tokio::io::split(endpoint);
        let serving = tokio::spawn(async move { server().serve(reader, writer).await });

        client.write_all(b"\xff\xfe\n").await.expect("write bytes");
        client
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n")
            .await
            .expect("write request");
        let (client_reader, _client_writer) = tokio::io::split(client);
        let mut replies = crate::frame_reader(client_reader);

        let rejected = next_reply(&mut replies).await;
        assert_eq!(rejected.id, Value::Null);
        assert_eq!(rejected.error.map(|error| error.code), Some(codes::PARSE_ERROR));

        let listed = next_reply(&mut replies).await;
        assert_eq!(listed.id, json!(1));
        assert!(listed.result.is_some());
        assert!(!serving.is_finished());
    }
}
