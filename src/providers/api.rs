use crate::core::LLMError;
use crate::protocol::ChatRequest;
use crate::session::{AbortHandle, Message, SessionStream};
use async_trait::async_trait;

#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Sends a request and waits for the complete reply
    async fn send_message(&self, request: &ChatRequest) -> Result<Message, LLMError>;

    /// Starts a streaming reply.
    ///
    /// Never fails up front: request and transport failures arrive as a
    /// finished error message on the returned stream.
    fn stream_message(&self, request: &ChatRequest) -> (AbortHandle, SessionStream);
}
