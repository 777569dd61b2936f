use async_stream::stream;
use futures::{Stream, StreamExt};
use log::{debug, error};
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

use super::accumulator::Snapshot;
use super::dispatcher::{Dispatch, Dispatcher};
use super::message::Message;
use crate::core::LLMError;
use crate::eventsource;
use crate::protocol::ChunkEvent;

const INCOMPLETE_STREAM: &str = "stream ended before the response completed";

/// What a streaming session reports to its caller, in wire order.
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    /// A non-terminal event was accumulated
    Progress(ChunkEvent),
    /// The finalized message. Sent at most once, and always last.
    Finished(Message),
}

/// The updates of one session, plus a live view of what it has gathered.
pub struct SessionStream {
    updates: Pin<Box<dyn Stream<Item = SessionUpdate> + Send>>,
    dispatcher: Arc<Mutex<Dispatcher>>,
}

impl SessionStream {
    /// Runs `read` against the working set as it stands now.
    ///
    /// The view is empty once the session has finished; the finished
    /// [`Message`] holds everything from then on.
    pub fn with_snapshot<R>(&self, read: impl FnOnce(Snapshot<'_>) -> R) -> R {
        read(lock(&self.dispatcher).snapshot())
    }
}

impl Stream for SessionStream {
    type Item = SessionUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.updates.as_mut().poll_next(cx)
    }
}

fn lock(dispatcher: &Mutex<Dispatcher>) -> MutexGuard<'_, Dispatcher> {
    dispatcher.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stops a running session.
///
/// Aborting stops further reads and drops whatever transport error the stop
/// causes; the session stream then ends without a [`SessionUpdate::Finished`].
/// Once the message has been finalized, aborting does nothing.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    token: CancellationToken,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Starts a session over the body produced by `connect`.
///
/// Nothing happens until the returned stream is polled. `connect` is where
/// the request is issued; its failure is reported like any other transport
/// failure.
pub fn start<F, S, B, E>(connect: F) -> (AbortHandle, SessionStream)
where
    F: Future<Output = Result<S, LLMError>> + Send + 'static,
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let handle = AbortHandle::new();
    let dispatcher = Arc::new(Mutex::new(Dispatcher::new()));
    let updates = drive(connect, handle.token.clone(), Arc::clone(&dispatcher));
    let session = SessionStream {
        updates: Box::pin(updates),
        dispatcher,
    };
    (handle, session)
}

enum Step<E> {
    Aborted,
    Frame(String),
    Failed(E),
    Ended,
}

fn drive<F, S, B, E>(
    connect: F,
    token: CancellationToken,
    dispatcher: Arc<Mutex<Dispatcher>>,
) -> impl Stream<Item = SessionUpdate>
where
    F: Future<Output = Result<S, LLMError>> + Send,
    S: Stream<Item = Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    // The dispatcher lock is only taken inside single statements, never
    // across an await or a yield.
    stream! {
        let connected = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            body = connect => Some(body),
        };
        let body = match connected {
            None => {
                debug!("[Session] aborted before the response arrived");
                return;
            }
            Some(Err(e)) => {
                if token.is_cancelled() {
                    return;
                }
                error!("[Session] request failed: {e}");
                let failed = lock(&dispatcher).fail(&e.to_string());
                if let Some(message) = failed {
                    yield SessionUpdate::Finished(message);
                }
                return;
            }
            Some(Ok(body)) => body,
        };

        let frames = eventsource::frames(body);
        futures::pin_mut!(frames);

        loop {
            let step = tokio::select! {
                biased;
                _ = token.cancelled() => Step::Aborted,
                frame = frames.next() => match frame {
                    Some(Ok(payload)) => Step::Frame(payload),
                    Some(Err(e)) => Step::Failed(e),
                    None => Step::Ended,
                },
            };

            match step {
                Step::Aborted => {
                    debug!("[Session] aborted, stopping reads");
                    return;
                }
                Step::Frame(payload) => {
                    let Some(event) = ChunkEvent::from_frame(&payload) else {
                        continue;
                    };
                    let outcome = lock(&dispatcher).dispatch(event);
                    match outcome {
                        Dispatch::Applied(event) => yield SessionUpdate::Progress(event),
                        Dispatch::Ignored => {}
                        Dispatch::Finished(message) => {
                            yield SessionUpdate::Finished(message);
                            return;
                        }
                    }
                }
                Step::Failed(e) => {
                    if token.is_cancelled() {
                        return;
                    }
                    error!("[Session] transport failed: {e}");
                    let failed = lock(&dispatcher).fail(&e.to_string());
                    if let Some(message) = failed {
                        yield SessionUpdate::Finished(message);
                    }
                    return;
                }
                Step::Ended => {
                    error!("[Session] {INCOMPLETE_STREAM}");
                    let failed = lock(&dispatcher).fail(INCOMPLETE_STREAM);
                    if let Some(message) = failed {
                        yield SessionUpdate::Finished(message);
                    }
                    return;
                }
            }
        }
    }
}
