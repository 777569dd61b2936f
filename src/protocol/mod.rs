pub mod chunk;
pub(crate) mod lenient;
pub mod request;

pub use chunk::ChunkEvent;
pub use request::ChatRequest;
