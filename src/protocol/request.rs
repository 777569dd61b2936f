use serde::Serialize;

/// Body of a chat request, shared by the streaming and non-streaming endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub content: String,
    /// `None` enables every tool the server offers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_tools: Option<Vec<String>>,
    pub research_mode: bool,
}

impl ChatRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            enabled_tools: None,
            research_mode: false,
        }
    }

    /// Restricts the tools the assistant may call
    pub fn with_tools<I, T>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.enabled_tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub const fn with_research_mode(mut self, enabled: bool) -> Self {
        self.research_mode = enabled;
        self
    }
}
