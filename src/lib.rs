pub mod cli;
pub mod core;
pub mod eventsource;
pub mod protocol;
pub mod providers;
pub mod session;

pub use crate::core::{Config, LLMError};
pub use protocol::{ChatRequest, ChunkEvent};
pub use providers::{AssistantApi, AssistantClient};
pub use session::{AbortHandle, Message, SessionStream, SessionUpdate};
