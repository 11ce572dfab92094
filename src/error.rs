//! # Error Types
//!
//! This module defines the error type shared by the whole engine. Errors fall
//! into two groups: configuration errors, raised while an engine or one of its
//! parts is being built, and runtime errors, raised while a generation is
//! being processed.
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use knapsack_ga::error::{GeneticError, Result};
//!
//! fn validate_workers(workers: usize) -> Result<usize> {
//!     if workers == 0 {
//!         return Err(GeneticError::Configuration(
//!             "Worker count must be positive".to_string(),
//!         ));
//!     }
//!     Ok(workers)
//! }
//!
//! assert!(validate_workers(0).is_err());
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use knapsack_ga::error::{GeneticError, OptionExt};
//!
//! fn first_fitness(scores: &[i64]) -> knapsack_ga::error::Result<i64> {
//!     scores.first().copied().ok_or_else_genetic(|| GeneticError::EmptyPopulation)
//! }
//!
//! assert_eq!(first_fitness(&[3, 1]).unwrap(), 3);
//! ```

use thiserror::Error;

/// Represents errors that can occur while building or running the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneticError {
    /// Error that occurs when an invalid configuration is provided.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error that occurs when an empty population is encountered.
    #[error("Empty population error: Cannot operate on an empty population")]
    EmptyPopulation,

    /// Error that occurs when a fitness value is read before it was measured.
    #[error("Fitness calculation error: {0}")]
    FitnessCalculation(String),

    /// Error that occurs when the processing of a single chunk fails.
    ///
    /// The range identifies the chunk whose work was lost; the results of
    /// the other chunks of the same phase are unaffected.
    #[error("Dispatch error in chunk [{start}, {end}): {reason}")]
    Dispatch {
        start: usize,
        end: usize,
        reason: String,
    },

    /// Error that occurs when a generation breaks an engine invariant.
    #[error("Evolution error: {0}")]
    Evolution(String),
}

/// A specialized Result type for engine operations.
///
/// This type is a convenience wrapper around `std::result::Result` with the error type
/// fixed to `GeneticError`.
pub type Result<T> = std::result::Result<T, GeneticError>;

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, GeneticError>` using
    /// a closure to generate the error.
    fn ok_or_else_genetic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> GeneticError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_genetic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> GeneticError,
    {
        self.ok_or_else(err_fn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_mentions_range() {
        let err = GeneticError::Dispatch {
            start: 5,
            end: 10,
            reason: "worker panicked".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Dispatch error in chunk [5, 10): worker panicked"
        );
    }

    #[test]
    fn test_ok_or_else_genetic() {
        let none: Option<u8> = None;
        let result = none.ok_or_else_genetic(|| GeneticError::EmptyPopulation);

        assert_eq!(result, Err(GeneticError::EmptyPopulation));
        assert_eq!(Some(1).ok_or_else_genetic(|| GeneticError::EmptyPopulation), Ok(1));
    }
}
