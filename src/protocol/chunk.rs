use log::warn;
use serde::Deserialize;
use serde_json::Value;

use super::lenient;
use crate::session::{Reference, ResearchPhase, ResearchStats};

/// One decoded event of the assistant's reply stream, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChunkEvent {
    /// A fragment of the reply text
    Content {
        #[serde(default, deserialize_with = "lenient::null_as_default")]
        content: String,
    },
    /// The assistant invoked a tool
    ToolCall {
        #[serde(default, deserialize_with = "lenient::null_as_default")]
        tool: String,
        #[serde(default)]
        params: Value,
        #[serde(default)]
        call_id: Option<String>,
    },
    /// A tool invocation finished
    ToolResult {
        #[serde(default, deserialize_with = "lenient::null_as_default")]
        tool: String,
        #[serde(default, deserialize_with = "lenient::null_as_default")]
        status: String,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        call_id: Option<String>,
    },
    /// Intermediate reasoning from one of the agents
    Thinking {
        #[serde(default, deserialize_with = "lenient::null_as_default")]
        agent: String,
        #[serde(default, alias = "content")]
        text: Option<String>,
    },
    ResearchPhase {
        phase: ResearchPhase,
    },
    ResearchPlan {
        #[serde(
            default,
            alias = "questions",
            deserialize_with = "lenient::null_as_default"
        )]
        sub_questions: Vec<String>,
    },
    ResearchProgress {
        #[serde(default, deserialize_with = "lenient::count")]
        total_units: Option<u32>,
        #[serde(default, alias = "completed_units", deserialize_with = "lenient::count")]
        completed: Option<u32>,
        #[serde(default, alias = "sources_found", deserialize_with = "lenient::count")]
        notes_found: Option<u32>,
    },
    ResearchComplete {
        #[serde(default, alias = "completed_units", deserialize_with = "lenient::count")]
        completed: Option<u32>,
        #[serde(default, alias = "sources_found", deserialize_with = "lenient::count")]
        notes_found: Option<u32>,
    },
    /// Successful end of the stream
    Done {
        #[serde(default)]
        message_id: Option<String>,
        #[serde(default, deserialize_with = "lenient::null_as_default")]
        references: Vec<Reference>,
        #[serde(default)]
        research_stats: Option<ResearchStats>,
    },
    /// Server-reported failure, ends the stream
    Error {
        #[serde(default, alias = "message")]
        error: Option<String>,
    },
    /// Any discriminant this client does not know about
    #[serde(other)]
    Unknown,
}

impl ChunkEvent {
    /// Parses one frame payload. A malformed payload is logged and dropped.
    pub fn from_frame(payload: &str) -> Option<Self> {
        match serde_json::from_str(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("[Parser] dropping malformed frame: {e}. Payload: {payload}");
                None
            }
        }
    }

    /// `done` and `error` end a session.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Content { .. } => "content",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Thinking { .. } => "thinking",
            Self::ResearchPhase { .. } => "research_phase",
            Self::ResearchPlan { .. } => "research_plan",
            Self::ResearchProgress { .. } => "research_progress",
            Self::ResearchComplete { .. } => "research_complete",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
            Self::Unknown => "unknown",
        }
    }
}
