//! Operational hooks around provider calls and a provider wrapper that fires them.
//!
//! ```rust
//! use tprovider::{NoopOperationHooks, ProviderOperationHooks};
//!
//! fn accepts_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! accepts_hooks(&NoopOperationHooks);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    Completion, CompletionProvider, CompletionRequest, ProviderError, ProviderFuture, ProviderId,
};

pub trait ProviderOperationHooks: Send + Sync {
    fn on_request_start(&self, _provider: ProviderId, _model: &str) {}

    fn on_request_success(
        &self,
        _provider: ProviderId,
        _model: &str,
        _completion: &Completion,
        _elapsed: Duration,
    ) {
    }

    fn on_request_failure(
        &self,
        _provider: ProviderId,
        _model: &str,
        _error: &ProviderError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ProviderOperationHooks for NoopOperationHooks {}

/// Wraps any provider and reports every request to `hooks`.
#[derive(Clone)]
pub struct ObservedProvider {
    inner: Arc<dyn CompletionProvider>,
    hooks: Arc<dyn ProviderOperationHooks>,
}

impl ObservedProvider {
    pub fn new(inner: Arc<dyn CompletionProvider>, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        Self { inner, hooks }
    }
}

impl CompletionProvider for ObservedProvider {
    fn id(&self) -> ProviderId {
        self.inner.id()
    }

    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderFuture<'a, Result<Completion, ProviderError>> {
        Box::pin(async move {
            let provider = self.inner.id();
            let model = request.model.clone();
            let started = Instant::now();
            self.hooks.on_request_start(provider, &model);

            let outcome = self.inner.complete(request).await;
            match &outcome {
                Ok(completion) => {
                    self.hooks
                        .on_request_success(provider, &model, completion, started.elapsed())
                }
                Err(error) => {
                    self.hooks
                        .on_request_failure(provider, &model, error, started.elapsed())
                }
            }

            outcome
        })
    }
}
