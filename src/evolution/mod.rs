pub mod engine;
pub mod options;

pub use engine::{Engine, GenerationReport};
pub use options::{EngineOptions, EngineOptionsBuilder, LogLevel};
