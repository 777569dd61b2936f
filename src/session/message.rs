use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::research::ResearchStats;

/// Content used when a reply finished without any text.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "No response received.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Entry of the tool log, kept in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolCallRecord {
    Call {
        tool: String,
        #[serde(default)]
        params: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call_id: Option<String>,
    },
    Result {
        tool: String,
        #[serde(default)]
        status: String,
        #[serde(default)]
        result: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call_id: Option<String>,
    },
}

impl ToolCallRecord {
    pub fn tool(&self) -> &str {
        match self {
            Self::Call { tool, .. } | Self::Result { tool, .. } => tool,
        }
    }

    pub fn call_id(&self) -> Option<&str> {
        match self {
            Self::Call { call_id, .. } | Self::Result { call_id, .. } => call_id.as_deref(),
        }
    }

    pub const fn is_call(&self) -> bool {
        matches!(self, Self::Call { .. })
    }
}

/// Reasoning emitted by one agent while the reply was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingTrace {
    pub agent: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// Citation attached to a finished reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A finished conversation message.
///
/// Built once when a session terminates and never changed afterwards, so it
/// only exposes read accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    id: Option<String>,
    role: Role,
    content: String,
    #[serde(default)]
    is_error: bool,
    #[serde(default)]
    tool_calls: Vec<ToolCallRecord>,
    #[serde(default)]
    thinking: Vec<ThinkingTrace>,
    #[serde(default)]
    references: Vec<Reference>,
    #[serde(default)]
    research: Option<ResearchStats>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

/// Parts of a message gathered while streaming.
#[derive(Debug, Default)]
pub(crate) struct MessageParts {
    pub id: Option<String>,
    pub content: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub thinking: Vec<ThinkingTrace>,
    pub references: Vec<Reference>,
    pub research: Option<ResearchStats>,
}

impl Message {
    /// Successful assistant reply. Empty content becomes [`EMPTY_RESPONSE_PLACEHOLDER`].
    pub(crate) fn reply(parts: MessageParts) -> Self {
        let content = if parts.content.is_empty() {
            EMPTY_RESPONSE_PLACEHOLDER.to_string()
        } else {
            parts.content
        };
        Self::build(
            parts.id,
            content,
            false,
            parts.tool_calls,
            parts.thinking,
            parts.references,
            parts.research,
        )
    }

    /// Failed assistant reply carrying a readable description as its content.
    pub(crate) fn failure(
        description: &str,
        tool_calls: Vec<ToolCallRecord>,
        thinking: Vec<ThinkingTrace>,
    ) -> Self {
        let content = format!("Error: {description}");
        Self::build(None, content, true, tool_calls, thinking, Vec::new(), None)
    }

    fn build(
        id: Option<String>,
        content: String,
        is_error: bool,
        tool_calls: Vec<ToolCallRecord>,
        thinking: Vec<ThinkingTrace>,
        references: Vec<Reference>,
        research: Option<ResearchStats>,
    ) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content,
            is_error,
            tool_calls,
            thinking,
            references,
            research,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn tool_calls(&self) -> &[ToolCallRecord] {
        &self.tool_calls
    }

    pub fn thinking(&self) -> &[ThinkingTrace] {
        &self.thinking
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub const fn research(&self) -> Option<&ResearchStats> {
        self.research.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Finds the result belonging to `call`.
    ///
    /// Pairing uses the explicit `call_id` only. A call without an id has no
    /// attributable result, even if a result for the same tool follows it.
    pub fn tool_result_for(&self, call: &ToolCallRecord) -> Option<&ToolCallRecord> {
        let id = match call {
            ToolCallRecord::Call { call_id: Some(id), .. } => id,
            _ => return None,
        };
        self.tool_calls
            .iter()
            .find(|record| !record.is_call() && record.call_id() == Some(id.as_str()))
    }
}
