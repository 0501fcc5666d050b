pub mod backend;
pub mod gemini;
pub mod generator;
pub mod ollama;
pub mod prompt;

pub use backend::GenerationBackend;
pub use generator::{GenerationOutcome, ResponseGenerator};
