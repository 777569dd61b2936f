use crate::core::{Config, LLMError};
use crate::protocol::ChatRequest;
use crate::providers::api::AssistantApi;
use crate::session::{self, AbortHandle, Message, SessionStream};
use async_trait::async_trait;
use log::debug;
use reqwest::{
    header::{HeaderValue, ACCEPT},
    Client, Response,
};

const EVENT_STREAM: &str = "text/event-stream";

/// Client for the assistant's chat endpoints.
pub struct AssistantClient {
    client: Client,
    config: Config,
}

impl AssistantClient {
    pub fn new(config: Config) -> Result<Self, LLMError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| LLMError::ConfigError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    async fn post(
        client: &Client,
        url: &str,
        request: &ChatRequest,
        stream: bool,
    ) -> Result<Response, LLMError> {
        debug!("[Client] POST {url} (stream: {stream})");
        let mut builder = client.post(url).json(request);
        if stream {
            builder = builder.header(ACCEPT, HeaderValue::from_static(EVENT_STREAM));
        }

        let response = builder.send().await.map_err(LLMError::from)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(LLMError::from_status(status, &error_text))
    }
}

#[async_trait]
impl AssistantApi for AssistantClient {
    async fn send_message(&self, request: &ChatRequest) -> Result<Message, LLMError> {
        let response = Self::post(&self.client, &self.config.message_url(), request, false).await?;
        let response_text = response
            .text()
            .await
            .map_err(|e| LLMError::ResponseFormat(format!("Failed to get response text: {e}")))?;
        serde_json::from_str(&response_text).map_err(|e| {
            LLMError::ResponseFormat(format!("Failed to parse assistant response: {e}"))
        })
    }

    fn stream_message(&self, request: &ChatRequest) -> (AbortHandle, SessionStream) {
        let client = self.client.clone();
        let url = self.config.stream_url();
        let request = request.clone();

        session::start(async move {
            let response = Self::post(&client, &url, &request, true).await?;
            Ok::<_, LLMError>(response.bytes_stream())
        })
    }
}
