use thiserror::Error;

/// Failures when dispatching a named command.
///
/// Everything else in this crate treats bad input as a programming
/// fault and panics: a silently skipped or half-applied edit would
/// desynchronize every change-record subscriber, which is worse than a
/// visible crash.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Command disabled for the current selection: {0}")]
    Disabled(String),
}
