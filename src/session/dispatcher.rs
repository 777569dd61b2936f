use log::{debug, warn};

use super::accumulator::{Accumulator, Snapshot};
use super::message::Message;
use crate::protocol::ChunkEvent;

/// Fallback description for an `error` event that carries none.
const UNKNOWN_SERVER_ERROR: &str = "the assistant reported an unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No event accepted yet
    Idle,
    Streaming,
    /// A message was finalized; every later event is ignored
    Terminal,
}

/// Outcome of dispatching one event.
#[derive(Debug)]
pub enum Dispatch {
    /// The event changed the working set and is handed back for display
    Applied(ChunkEvent),
    /// The event was dropped: unknown type, or the session already ended
    Ignored,
    /// The event ended the session
    Finished(Message),
}

/// Routes events to the accumulator and enforces the session state machine.
#[derive(Debug)]
pub struct Dispatcher {
    state: SessionState,
    accumulator: Accumulator,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            accumulator: Accumulator::new(),
        }
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        self.accumulator.snapshot()
    }

    pub fn dispatch(&mut self, event: ChunkEvent) -> Dispatch {
        if self.state == SessionState::Terminal {
            warn!("[Dispatch] ignoring `{}` event after the session ended", event.kind());
            return Dispatch::Ignored;
        }

        match event {
            ChunkEvent::Unknown => {
                debug!("[Dispatch] ignoring event of unknown type");
                Dispatch::Ignored
            }
            ChunkEvent::Done {
                message_id,
                references,
                research_stats,
            } => {
                let message = self
                    .terminate()
                    .finalize(message_id, references, research_stats);
                debug!("[Dispatch] session finished, message id: {:?}", message.id());
                Dispatch::Finished(message)
            }
            ChunkEvent::Error { error } => {
                let description = error.as_deref().unwrap_or(UNKNOWN_SERVER_ERROR);
                warn!("[Dispatch] server reported an error: {description}");
                Dispatch::Finished(self.terminate().fail(description))
            }
            event => {
                self.state = SessionState::Streaming;
                self.apply(&event);
                Dispatch::Applied(event)
            }
        }
    }

    fn apply(&mut self, event: &ChunkEvent) {
        let acc = &mut self.accumulator;
        match event {
            ChunkEvent::Content { content } => acc.append_content(content),
            ChunkEvent::ToolCall {
                tool,
                params,
                call_id,
            } => acc.append_tool_call(tool, params, call_id.as_deref()),
            ChunkEvent::ToolResult {
                tool,
                status,
                result,
                call_id,
            } => acc.append_tool_result(tool, status, result, call_id.as_deref()),
            ChunkEvent::Thinking { agent, text } => acc.record_thinking(agent, text.as_deref()),
            ChunkEvent::ResearchPhase { phase } => acc.set_research_phase(phase.clone()),
            ChunkEvent::ResearchPlan { sub_questions } => acc.set_research_plan(sub_questions),
            ChunkEvent::ResearchProgress {
                total_units,
                completed,
                notes_found,
            } => acc.merge_research_progress(*total_units, *completed, *notes_found),
            ChunkEvent::ResearchComplete {
                completed,
                notes_found,
            } => acc.merge_research_progress(None, *completed, *notes_found),
            ChunkEvent::Done { .. } | ChunkEvent::Error { .. } | ChunkEvent::Unknown => {}
        }
    }

    /// Ends the session with a failure that did not come from the event
    /// stream. Returns `None` when the session already ended.
    pub fn fail(&mut self, description: &str) -> Option<Message> {
        if self.state == SessionState::Terminal {
            return None;
        }
        Some(self.terminate().fail(description))
    }

    fn terminate(&mut self) -> Accumulator {
        self.state = SessionState::Terminal;
        std::mem::take(&mut self.accumulator)
    }
}
