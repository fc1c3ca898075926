pub mod error;
pub mod mock;
pub mod ollama;
pub mod response;
