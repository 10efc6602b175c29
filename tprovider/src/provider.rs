use tcommon::BoxFuture;

use crate::{Completion, CompletionRequest, ProviderError, ProviderId};

pub type ProviderFuture<'a, T> = BoxFuture<'a, T>;

/// A text-completion collaborator: prompt in, text out. May fail or hang;
/// callers bound it with their own deadline.
pub trait CompletionProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderFuture<'a, Result<Completion, ProviderError>>;
}
