mod config;
pub mod error;
pub mod render;

pub use config::Config;
pub use error::LLMError;
pub use render::Renderer;
