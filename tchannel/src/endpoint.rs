//! The orchestrator-facing seam over anything that can list and call tools.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use tchannel::{LocalEndpoint, ToolEndpoint};
//! use ttooling::math::math_registry;
//! use ttooling::{DefaultToolRuntime, ToolInvocation};
//!
//! # block_on(async {
//! let runtime = DefaultToolRuntime::new(Arc::new(math_registry().expect("math tools")));
//! let endpoint = LocalEndpoint::new("calculator", Arc::new(runtime));
//!
//! let catalog = endpoint.fetch_catalog().await.expect("catalog");
//! assert!(catalog.contains("add"));
//!
//! let result = endpoint
//!     .call(ToolInvocation::from_json("add", json!({"a": 5, "b": 7})))
//!     .await;
//! assert_eq!(result.value(), Some(&json!(12)));
//! # });
//! # fn block_on<F: std::future::Future>(future: F) -> F::Output {
//! #     futures_util::FutureExt::now_or_never(future).expect("local endpoint completes without waking")
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tcommon::BoxFuture;
use tokio::sync::OnceCell;
use ttooling::{Catalog, ToolError, ToolInvocation, ToolResult, ToolRuntime};

use crate::ToolClient;

pub type EndpointFuture<'a, T> = BoxFuture<'a, T>;

pub trait ToolEndpoint: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the endpoint's catalog; repeated calls reuse the first fetch.
    fn fetch_catalog<'a>(&'a self) -> EndpointFuture<'a, Result<Catalog, ToolError>>;

    fn call<'a>(&'a self, invocation: ToolInvocation) -> EndpointFuture<'a, ToolResult>;
}

impl ToolEndpoint for ToolClient {
    fn name(&self) -> &str {
        ToolClient::name(self)
    }

    fn fetch_catalog<'a>(&'a self) -> EndpointFuture<'a, Result<Catalog, ToolError>> {
        Box::pin(ToolClient::fetch_catalog(self))
    }

    fn call<'a>(&'a self, invocation: ToolInvocation) -> EndpointFuture<'a, ToolResult> {
        Box::pin(ToolClient::call(self, invocation))
    }
}

/// In-process endpoint over a tool runtime, with no channel in between.
pub struct LocalEndpoint {
    name: String,
    runtime: Arc<dyn ToolRuntime>,
    catalog: OnceLock<Catalog>,
}

impl LocalEndpoint {
    pub fn new(name: impl Into<String>, runtime: Arc<dyn ToolRuntime>) -> Self {
        Self {
            name: name.into(),
            runtime,
            catalog: OnceLock::new(),
        }
    }
}

impl ToolEndpoint for LocalEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_catalog<'a>(&'a self) -> EndpointFuture<'a, Result<Catalog, ToolError>> {
        Box::pin(async move {
            Ok(self
                .catalog
                .get_or_init(|| Catalog::from_specs(self.runtime.list_tools()))
                .clone())
        })
    }

    fn call<'a>(&'a self, invocation: ToolInvocation) -> EndpointFuture<'a, ToolResult> {
        self.runtime.invoke(invocation)
    }
}

struct Routes {
    catalog: Catalog,
    owners: HashMap<String, usize>,
}

/// Several endpoints presented as one. The first endpoint to expose a tool
/// name owns it; later duplicates are ignored.
pub struct EndpointSet {
    name: String,
    endpoints: Vec<Arc<dyn ToolEndpoint>>,
    routes: OnceCell<Routes>,
}

impl EndpointSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoints: Vec::new(),
            routes: OnceCell::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: Arc<dyn ToolEndpoint>) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn endpoints(&self) -> &[Arc<dyn ToolEndpoint>] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    async fn routes(&self) -> Result<&Routes, ToolError> {
        self.routes.get_or_try_init(|| self.build_routes()).await
    }

    async fn build_routes(&self) -> Result<Routes, ToolError> {
        let mut catalog = Catalog::new();
        let mut owners = HashMap::new();
        let mut last_error = None;
        let mut reachable = 0usize;

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            let endpoint_catalog = match endpoint.fetch_catalog().await {
                Ok(endpoint_catalog) => endpoint_catalog,
                Err(error) => {
                    tracing::warn!(endpoint = %endpoint.name(), error = %error, "endpoint catalog unavailable");
                    last_error = Some(error);
                    continue;
                }
            };
            reachable += 1;

            for spec in endpoint_catalog.specs() {
                if catalog.insert_if_absent(spec.clone()) {
                    owners.insert(spec.name.clone(), index);
                } else {
                    tracing::warn!(
                        endpoint = %endpoint.name(),
                        tool_name = %spec.name,
                        "tool already provided by another endpoint; ignoring duplicate"
                    );
                }
            }
        }

        if reachable == 0 && !self.endpoints.is_empty() {
            return Err(last_error
                .unwrap_or_else(|| ToolError::transport("no endpoint catalog could be fetched")));
        }

        Ok(Routes { catalog, owners })
    }
}

impl ToolEndpoint for EndpointSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_catalog<'a>(&'a self) -> EndpointFuture<'a, Result<Catalog, ToolError>> {
        Box::pin(async move { Ok(self.routes().await?.catalog.clone()) })
    }

    fn call<'a>(&'a self, invocation: ToolInvocation) -> EndpointFuture<'a, ToolResult> {
        Box::pin(async move {
            let routes = match self.routes().await {
                Ok(routes) => routes,
                Err(error) => return ToolResult::failure(error),
            };

            match routes.owners.get(&invocation.tool_name) {
                Some(&index) => self.endpoints[index].call(invocation).await,
                None => ToolResult::failure(
                    ToolError::unknown_tool(format!(
                        "no endpoint provides tool '{}'",
                        invocation.tool_name
                    ))
                    .with_tool_name(invocation.tool_name),
                ),
            }
        })
    }
}
