use futures::{Stream, StreamExt};
use log::debug;
use std::io::{self, Write};

use super::args::Args;
use crate::{
    core::{Config, LLMError, Renderer},
    protocol::ChatRequest,
    providers::{AssistantApi, AssistantClient},
    session::{AbortHandle, SessionUpdate},
};

fn build_request(args: &Args, config: &Config) -> ChatRequest {
    let request = ChatRequest::new(args.query.trim())
        .with_research_mode(args.research || config.research_mode);
    match args.tools.as_ref().or(config.enabled_tools.as_ref()) {
        Some(tools) => request.with_tools(tools.iter().map(String::as_str)),
        None => request,
    }
}

/// Renders every update of a streaming reply. Returns whether the reply
/// finished; a reply stopped by `abort` first is marked as cancelled.
async fn stream_reply<S, W>(
    renderer: &mut Renderer,
    writer: &mut W,
    abort: &AbortHandle,
    updates: &mut S,
) -> Result<bool, LLMError>
where
    S: Stream<Item = SessionUpdate> + Unpin,
    W: Write,
{
    let mut finished = false;
    while let Some(update) = updates.next().await {
        renderer.render_update(writer, &update)?;
        if let SessionUpdate::Finished(message) = &update {
            finished = true;
            debug!(
                "[Session] finished: {} tool records, {} thinking traces",
                message.tool_calls().len(),
                message.thinking().len()
            );
        }
    }

    if abort.is_aborted() && !finished {
        writeln!(writer, "\n[cancelled]")?;
    }
    Ok(finished)
}

pub async fn run(args: Args) -> Result<(), LLMError> {
    let _ = dotenv::dotenv();

    if args.query.trim().is_empty() {
        return Err(LLMError::ApiError("Query must not be empty".to_string()));
    }
    let mut config = Config::load()?;
    if let Some(base_url) = &args.base_url {
        config.base_url.clone_from(base_url);
    }

    let request = build_request(&args, &config);
    debug!(
        "[SETTINGS] server: {}, research_mode: {}, tools: {:?}",
        config.base_url, request.research_mode, request.enabled_tools
    );

    let mut renderer = Renderer::new(config.show_thinking, config.show_tools);
    let client = AssistantClient::new(config)?;
    let mut stdout = io::stdout();

    if args.no_stream {
        let message = client.send_message(&request).await?;
        renderer.render_message(&mut stdout, &message)?;
    } else {
        let (abort, mut updates) = client.stream_message(&request);
        let ctrl_c = abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ctrl_c.abort();
            }
        });

        let finished = stream_reply(&mut renderer, &mut stdout, &abort, &mut updates).await?;
        if !finished {
            updates.with_snapshot(|partial| {
                debug!(
                    "[Session] stopped early: {} bytes of text, {} tool records",
                    partial.content.len(),
                    partial.tool_calls.len()
                );
            });
        }
    }

    // Ensure final newline
    writeln!(&mut stdout)?;
    Ok(())
}
