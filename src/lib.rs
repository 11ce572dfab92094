pub mod chunk;
pub mod dispatch;
pub mod error;
pub mod evolution;
pub mod individual;
pub mod population;
pub mod problem;
pub mod rng;
pub mod selection;

// Re-export commonly used types for convenience
pub use dispatch::{ChunkExecutor, Dispatcher, DispatcherKind};
pub use error::{GeneticError, OptionExt, Result};
pub use evolution::{Engine, EngineOptions, GenerationReport, LogLevel};
pub use individual::{Fitness, Individual};
pub use population::Population;
pub use problem::ProblemInstance;
