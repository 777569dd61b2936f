//! Turns a reply stream into one finished [`Message`].
//!
//! Events flow through a [`Dispatcher`], which owns the [`Accumulator`] for
//! the life of the session. [`start`] wires the frame decoder, parser and
//! dispatcher into a stream of [`SessionUpdate`]s guarded by an [`AbortHandle`].

pub mod accumulator;
pub mod controller;
pub mod dispatcher;
pub mod message;
pub mod research;

pub use accumulator::{Accumulator, Snapshot};
pub use controller::{start, AbortHandle, SessionStream, SessionUpdate};
pub use dispatcher::{Dispatch, Dispatcher, SessionState};
pub use message::{
    Message, Reference, Role, ThinkingTrace, ToolCallRecord, EMPTY_RESPONSE_PLACEHOLDER,
};
pub use research::{ResearchPhase, ResearchProgress, ResearchStats};
