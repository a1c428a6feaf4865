use std::collections::TryReserveError;
use thiserror::Error;

use crate::TopicId;

pub type Result<T> = std::result::Result<T, RbcError>;

#[derive(Debug, Error)]
pub enum RbcError {
    #[error("`depth` must be at least 1")]
    InvalidDepth,
    #[error("topic {0} accumulator could not be processed")]
    UnknownTopic(TopicId),
    #[error("cannot {op} while engine is {state}")]
    InvalidState { op: &'static str, state: &'static str },
    #[error("rank {rank} is beyond weight table of length {len}")]
    OutOfRange { rank: usize, len: usize },
    #[error("persistence {0} is outside (0, 1)")]
    InvalidPhi(f64),
    #[error("persistence already fixed at {fixed}, got {given}")]
    PhiMismatch { fixed: f64, given: f64 },
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: missing {field} field")]
    MissingField { line: usize, field: &'static str },
    #[error("line {line}: invalid topic `{value}`")]
    InvalidTopic { line: usize, value: String },
    #[error("line {line}: invalid rank `{value}`")]
    InvalidRank { line: usize, value: String },
    #[error("line {line}: invalid score `{value}`")]
    InvalidScore { line: usize, value: String },
}
