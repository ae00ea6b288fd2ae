pub mod error;
pub mod gemini;
pub mod redis;
pub mod snapshot;
