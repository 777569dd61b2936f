use colored::Colorize;
use std::io::Write;

use crate::core::LLMError;
use crate::protocol::ChunkEvent;
use crate::session::{Message, Reference, SessionUpdate};

/// Writes a reply to the terminal as it streams in.
///
/// Text fragments are printed inline. Tool activity, reasoning and research
/// status go on their own dimmed lines.
pub struct Renderer {
    show_thinking: bool,
    show_tools: bool,
    at_line_start: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl Renderer {
    pub const fn new(show_thinking: bool, show_tools: bool) -> Self {
        Self {
            show_thinking,
            show_tools,
            at_line_start: true,
        }
    }

    pub fn render_update<W: Write>(
        &mut self,
        writer: &mut W,
        update: &SessionUpdate,
    ) -> Result<(), LLMError> {
        match update {
            SessionUpdate::Progress(event) => self.render_event(writer, event)?,
            SessionUpdate::Finished(message) if message.is_error() => {
                self.side_line(writer, &message.content().red().to_string())?;
            }
            SessionUpdate::Finished(message) => self.render_references(writer, message.references())?,
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes a complete message, as returned by the non-streaming endpoint.
    pub fn render_message<W: Write>(
        &mut self,
        writer: &mut W,
        message: &Message,
    ) -> Result<(), LLMError> {
        if message.is_error() {
            self.side_line(writer, &message.content().red().to_string())?;
        } else {
            self.write_text(writer, message.content())?;
            self.render_references(writer, message.references())?;
        }
        writer.flush()?;
        Ok(())
    }

    fn render_event<W: Write>(&mut self, writer: &mut W, event: &ChunkEvent) -> Result<(), LLMError> {
        match event {
            ChunkEvent::Content { content } => self.write_text(writer, content),
            ChunkEvent::ToolCall { tool, params, .. } if self.show_tools => {
                let line = format!("→ {tool} {params}");
                self.side_line(writer, &line.dimmed().to_string())
            }
            ChunkEvent::ToolResult { tool, status, .. } if self.show_tools => {
                let line = format!("← {tool} [{status}]");
                self.side_line(writer, &line.dimmed().to_string())
            }
            ChunkEvent::Thinking {
                agent,
                text: Some(text),
            } if self.show_thinking => {
                let line = format!("[{agent}] {text}");
                self.side_line(writer, &line.italic().dimmed().to_string())
            }
            ChunkEvent::ResearchPhase { phase } => {
                let line = format!("research: {phase}");
                self.side_line(writer, &line.cyan().to_string())
            }
            ChunkEvent::ResearchPlan { sub_questions } => {
                let mut line = format!("research plan ({} questions)", sub_questions.len());
                for question in sub_questions {
                    line.push_str("\n  - ");
                    line.push_str(question);
                }
                self.side_line(writer, &line.cyan().to_string())
            }
            ChunkEvent::ResearchProgress {
                total_units,
                completed,
                ..
            } => {
                let line = format!(
                    "research progress: {}/{}",
                    completed.map_or_else(|| "?".to_string(), |c| c.to_string()),
                    total_units.map_or_else(|| "?".to_string(), |t| t.to_string())
                );
                self.side_line(writer, &line.cyan().to_string())
            }
            _ => Ok(()),
        }
    }

    fn render_references<W: Write>(
        &mut self,
        writer: &mut W,
        references: &[Reference],
    ) -> Result<(), LLMError> {
        if references.is_empty() {
            return Ok(());
        }
        self.side_line(writer, &"References:".bold().to_string())?;
        for (i, reference) in references.iter().enumerate() {
            let title = reference.title.as_deref().unwrap_or("untitled");
            let line = match &reference.url {
                Some(url) => format!("[{}] {title} <{url}>", i + 1),
                None => format!("[{}] {title}", i + 1),
            };
            self.side_line(writer, &line)?;
        }
        Ok(())
    }

    fn write_text<W: Write>(&mut self, writer: &mut W, text: &str) -> Result<(), LLMError> {
        if text.is_empty() {
            return Ok(());
        }
        writer.write_all(text.as_bytes())?;
        self.at_line_start = text.ends_with('\n');
        Ok(())
    }

    fn side_line<W: Write>(&mut self, writer: &mut W, line: &str) -> Result<(), LLMError> {
        if !self.at_line_start {
            writeln!(writer)?;
        }
        writeln!(writer, "{line}")?;
        self.at_line_start = true;
        Ok(())
    }
}
