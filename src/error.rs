//! Error types for the outer layers of ttlkv.
//!
//! The storage engine itself has no failure modes: a missing key, an empty
//! range or "nothing to reclaim" are ordinary `Option`/`Vec` results. Errors
//! only arise when configuring the reclaimer or the binary, and when parsing
//! console input.

use std::time::Duration;
use thiserror::Error;

/// Invalid configuration for the reclaimer or the command-line binary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A sweep must be allowed to reclaim at least one entry
    #[error("max_per_sweep must be greater than zero")]
    ZeroBatch,

    /// Sweep intervals must be non-zero
    #[error("reclaim intervals must be non-zero")]
    ZeroInterval,

    /// Intervals must satisfy min <= base <= max
    #[error("reclaim intervals out of order: min {min:?}, base {base:?}, max {max:?}")]
    IntervalOrder {
        min: Duration,
        base: Duration,
        max: Duration,
    },

    /// A flag was given without its value
    #[error("{0} requires a value")]
    MissingValue(String),

    /// A flag value could not be parsed as a number
    #[error("invalid value for {flag}: {value}")]
    InvalidNumber { flag: String, value: String },

    /// An argument the binary does not know about
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

/// Malformed console input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Nothing but whitespace was entered
    #[error("empty command")]
    Empty,

    /// The command name is not recognised
    #[error("unknown command '{0}'")]
    Unknown(String),

    /// The command was given the wrong number of arguments
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    /// An argument that must be an integer was not
    #[error("value is not an integer or out of range: {0}")]
    InvalidInteger(String),

    /// A double-quoted token was never closed
    #[error("unbalanced quotes in request")]
    UnbalancedQuotes,
}
