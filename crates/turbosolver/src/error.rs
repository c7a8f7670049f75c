//! # Error Definitions
//!
//! Every variant is local to the single call it reports on. Errors are `Clone`
//! so that one teardown reason can be delivered to every outstanding caller.

use std::time::Duration;

use gridwire::ErrorCode;
use gridwire::PayloadKind;
use gridwire::RequestId;
use gridwire::RequestKind;

use crate::transport::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The request could not be encoded; nothing was transmitted.
    #[error(transparent)]
    MalformedRequest(gridwire::Error),
    /// A pending call already exists for this id.
    #[error("request id {0} is already pending")]
    DuplicateId(RequestId),
    /// The engine answered with a payload that does not match the request.
    #[error("{expected} request answered with {found} payload")]
    UnexpectedVariant { expected: RequestKind, found: PayloadKind },
    /// The engine reported a failure.
    #[error("engine error {0}")]
    Engine(ErrorCode),
    /// The engine has no solution for the solver's grid.
    #[error("no solution for grid")]
    NoSolution,
    /// The dispatcher was torn down while the call was outstanding.
    #[error("dispatcher shut down")]
    Shutdown,
    /// The transport refused the envelope or lost its connection.
    #[error("transport error: {0}")]
    Transport(TransportError),
    /// A caller-imposed deadline expired.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    /// The request id space of this dispatcher is used up.
    #[error("request ids exhausted")]
    IdsExhausted,
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
