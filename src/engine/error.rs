use thiserror::Error;

use super::stack::Stack;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug, PartialEq)]
pub enum EngineError {
    #[error("cannot move cards from {from} to {to}: {reason}")]
    IllegalMove {
        from: Stack,
        to: Stack,
        reason: String,
    },
    #[error("{0:?} is not a stack")]
    UnknownStack(String),
    #[error("{0:?} is not a card")]
    UnknownCard(String),
    #[error("board is corrupt: {0}")]
    InvariantViolation(String),
}

pub const REASON_EMPTY_SOURCE: &str = "nothing to move";
pub const REASON_SAME_STACK: &str = "source and destination are the same stack";
pub const REASON_NOT_IN_STACK: &str = "that card is not in the source stack";
pub const REASON_FACE_DOWN: &str = "cannot move face-down cards";
pub const REASON_RUN_OUTSIDE_TABLEAU: &str = "only tableaus can move several cards at once";
pub const REASON_DOES_NOT_FIT: &str = "those cards do not fit there";
