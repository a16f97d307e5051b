//! HTTP provider implementations.

pub mod common;
pub mod ollama;
pub mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
