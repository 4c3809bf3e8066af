//! The language-model collaborator seam.

use async_trait::async_trait;
use llm_client::{Client, Error, Message, Request, TextStream};

/// Something that turns a conversation into model text.
///
/// The pipeline prefers [`ModelClient::stream_completion`] and falls back to
/// [`ModelClient::complete`] once when streaming fails.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Start a streamed completion yielding text fragments.
    async fn stream_completion(&self, messages: &[Message]) -> Result<TextStream, Error>;

    /// Run a non-streaming completion and return the full text.
    async fn complete(&self, messages: &[Message]) -> Result<String, Error>;
}

#[async_trait]
impl ModelClient for Client {
    async fn stream_completion(&self, messages: &[Message]) -> Result<TextStream, Error> {
        self.stream_text(Request::new(messages.to_vec())).await
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, Error> {
        let response = Client::complete(self, Request::new(messages.to_vec())).await?;
        Ok(response.text)
    }
}
