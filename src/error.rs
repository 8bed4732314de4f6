use std::fmt;

use thiserror::Error;

/// Which timing field of the form a wait value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitField {
    Cycle,
    Click,
}

impl fmt::Display for WaitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitField::Cycle => f.write_str("cycle wait"),
            WaitField::Click => f.write_str("click wait"),
        }
    }
}

/// Malformed form input. Nothing is started or replaced when one of these is returned.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("number of locations must be a whole number between 1 and 10 (got {input:?})")]
    LocationCount { input: String },
    #[error("location {location}: expected 'x, y' (e.g. '100, 200'), got {input:?}")]
    Coordinates { location: usize, input: String },
    #[error("{field}: expected a non-negative number of seconds, got {input:?}")]
    Wait { field: WaitField, input: String },
    #[error("at least one location is required")]
    NoTargets,
}

/// Failure reported by the input injector. Either variant ends the current run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InjectorError {
    #[error("fail-safe triggered: pointer moved to screen corner ({x}, {y})")]
    FailSafe { x: i32, y: i32 },
    #[error("input injection failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("script is already running")]
    AlreadyRunning,
    #[error("could not start background thread: {0}")]
    Spawn(#[from] std::io::Error),
}
