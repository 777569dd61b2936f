pub mod api;
pub mod client;

pub use api::AssistantApi;
pub use client::AssistantClient;
