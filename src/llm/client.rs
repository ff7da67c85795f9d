use std::sync::Arc;

use crate::error::Result;
use crate::llm::types::GenerationRequest;

/// Text-generation backend. Implementations return the raw UTF-8 reply of
/// the model and map transport failures to `JournalError::ModelFailed`.
#[allow(async_fn_in_trait)]
pub trait LanguageModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

impl<M: LanguageModel + ?Sized> LanguageModel for &M {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        (**self).generate(request).await
    }
}

impl<M: LanguageModel + ?Sized> LanguageModel for Arc<M> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        (**self).generate(request).await
    }
}
