//! External API clients

pub mod ollama;

pub use ollama::OllamaClient;
