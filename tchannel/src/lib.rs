//! Channel layer between orchestrators and tool endpoints.
//!
//! The wire format is newline-delimited JSON-RPC 2.0 with three methods:
//! `initialize`, `tools/list` and `tools/call`.

mod client;
mod endpoint;
mod error;
mod framing;
mod protocol;
mod server;

pub mod prelude {
    pub use crate::{
        ChannelError, ChannelErrorKind, EndpointSet, LocalEndpoint, ServerCommand, ToolClient,
        ToolEndpoint, ToolServer,
    };
}

pub use client::{DEFAULT_CALL_TIMEOUT, ServerCommand, ToolClient};
pub use endpoint::{EndpointFuture, EndpointSet, LocalEndpoint, ToolEndpoint};
pub use error::{ChannelError, ChannelErrorKind};
pub use framing::{
    Frame, FrameCodec, FrameReader, FrameWriter, encode_frame, frame_reader, frame_writer,
};
pub use protocol::{
    InitializeParams, InitializeResult, JSONRPC_VERSION, ListToolsResult, MAX_FRAME_BYTES,
    PROTOCOL_VERSION, PeerInfo, RpcError, RpcRequest, RpcResponse, codes, methods,
};
pub use server::ToolServer;
