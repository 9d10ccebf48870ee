use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The positional values do not line up with the operation's
    /// parameter signature. Raised synchronously, before any I/O.
    #[error("operation {operation} takes {expected} argument values, got {got}")]
    ArityMismatch {
        operation: String,
        expected: usize,
        got: usize,
    },

    #[error("failed to start dispatcher: {0}")]
    Init(String),
}
