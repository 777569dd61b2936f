use chrono::Utc;
use serde_json::Value;

use super::message::{Message, MessageParts, Reference, ThinkingTrace, ToolCallRecord};
use super::research::{ResearchPhase, ResearchProgress, ResearchStats};

/// Research sub-state, present once the server sends a research event.
#[derive(Debug, Default)]
struct ResearchState {
    phase: Option<ResearchPhase>,
    progress: ResearchProgress,
}

/// Working set of one in-progress reply.
///
/// Owned by a single dispatch loop and mutated in arrival order. The live
/// view ([`Accumulator::snapshot`]) borrows the same fields that
/// [`Accumulator::finalize`] moves out, so the two can never diverge.
#[derive(Debug, Default)]
pub struct Accumulator {
    content: String,
    tool_calls: Vec<ToolCallRecord>,
    thinking: Vec<ThinkingTrace>,
    active_agent: Option<String>,
    research: Option<ResearchState>,
}

/// Borrowed view of the working set, for rendering a reply still in flight.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub content: &'a str,
    pub tool_calls: &'a [ToolCallRecord],
    pub thinking: &'a [ThinkingTrace],
    pub active_agent: Option<&'a str>,
    pub research_phase: Option<&'a ResearchPhase>,
    pub research_progress: Option<&'a ResearchProgress>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_content(&mut self, fragment: &str) {
        self.content.push_str(fragment);
    }

    pub fn append_tool_call(&mut self, tool: &str, params: &Value, call_id: Option<&str>) {
        self.tool_calls.push(ToolCallRecord::Call {
            tool: tool.to_string(),
            params: params.clone(),
            call_id: call_id.map(str::to_string),
        });
    }

    pub fn append_tool_result(
        &mut self,
        tool: &str,
        status: &str,
        result: &Value,
        call_id: Option<&str>,
    ) {
        self.tool_calls.push(ToolCallRecord::Result {
            tool: tool.to_string(),
            status: status.to_string(),
            result: result.clone(),
            call_id: call_id.map(str::to_string),
        });
    }

    /// Marks `agent` as active and records its reasoning when there is any.
    pub fn record_thinking(&mut self, agent: &str, text: Option<&str>) {
        self.active_agent = Some(agent.to_string());
        if let Some(text) = text.filter(|text| !text.is_empty()) {
            self.thinking.push(ThinkingTrace {
                agent: agent.to_string(),
                text: text.to_string(),
                received_at: Utc::now(),
            });
        }
    }

    pub fn set_research_phase(&mut self, phase: ResearchPhase) {
        self.research_state().phase = Some(phase);
    }

    pub fn set_research_plan(&mut self, sub_questions: &[String]) {
        self.research_state()
            .progress
            .replace_plan(sub_questions.to_vec());
    }

    /// Merges counters into the research progress, leaving absent ones untouched.
    pub fn merge_research_progress(
        &mut self,
        total_units: Option<u32>,
        completed_units: Option<u32>,
        sources_found: Option<u32>,
    ) {
        self.research_state()
            .progress
            .merge_counts(total_units, completed_units, sources_found);
    }

    pub const fn is_research(&self) -> bool {
        self.research.is_some()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            content: &self.content,
            tool_calls: &self.tool_calls,
            thinking: &self.thinking,
            active_agent: self.active_agent.as_deref(),
            research_phase: self.research.as_ref().and_then(|r| r.phase.as_ref()),
            research_progress: self.research.as_ref().map(|r| &r.progress),
        }
    }

    /// Builds the finished reply, consuming the working set.
    ///
    /// Statistics sent with the final event are laid over the locally tracked
    /// progress field by field; without either the message carries no
    /// research section.
    pub fn finalize(
        self,
        message_id: Option<String>,
        references: Vec<Reference>,
        research_stats: Option<ResearchStats>,
    ) -> Message {
        let tracked = self.research.as_ref().map(|r| ResearchStats::from(&r.progress));
        let research = match (tracked, research_stats) {
            (Some(tracked), Some(reported)) => Some(tracked.overlay(reported)),
            (tracked, reported) => tracked.or(reported),
        };

        Message::reply(MessageParts {
            id: message_id,
            content: self.content,
            tool_calls: self.tool_calls,
            thinking: self.thinking,
            references,
            research,
        })
    }

    /// Builds an error reply, consuming the working set. Partial text is
    /// dropped; the tool and thinking logs are kept.
    pub fn fail(self, description: &str) -> Message {
        Message::failure(description, self.tool_calls, self.thinking)
    }

    fn research_state(&mut self) -> &mut ResearchState {
        self.research.get_or_insert_with(ResearchState::default)
    }
}
