//! # Envelope Types
//!
//! The typed shapes carried by the wire protocol.

use std::fmt;

/// Correlates a response with the request that produced it.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestId(pub u32);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// An outbound call to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub id: RequestId,
    pub body: RequestBody,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    CreateSolver { grid: String },
    Solve { id: i32 },
    Destroy { id: i32 },
}

impl RequestBody {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::CreateSolver { .. } => RequestKind::CreateSolver,
            Self::Solve { .. } => RequestKind::Solve,
            Self::Destroy { .. } => RequestKind::Destroy,
        }
    }
}

/// Discriminant of a `RequestBody`, without its data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    CreateSolver,
    Solve,
    Destroy,
}

impl RequestKind {
    /// The only payload kind that may answer this request.
    pub fn answered_by(self) -> PayloadKind {
        match self {
            Self::CreateSolver => PayloadKind::SolverCreated,
            Self::Solve => PayloadKind::SolveResult,
            Self::Destroy => PayloadKind::SolverDestroyed,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An inbound answer from the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub id: RequestId,
    pub body: ResponseBody,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseBody {
    Ok(Payload),
    Err(ErrorCode),
}

/// The success payload of a `Response`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    SolverCreated { id: i32 },
    SolveResult { solution: String },
    SolverDestroyed,
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::SolverCreated { .. } => PayloadKind::SolverCreated,
            Self::SolveResult { .. } => PayloadKind::SolveResult,
            Self::SolverDestroyed => PayloadKind::SolverDestroyed,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    SolverCreated,
    SolveResult,
    SolverDestroyed,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Numeric failure code reported by the engine.
///
/// Carried verbatim; codes outside the known set are preserved.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const INTERNAL: Self = Self(1);
    pub const BAD_GRID: Self = Self(2);
    pub const NO_SOLUTION: Self = Self(3);
    pub const NOT_AVAILABLE: Self = Self(4);

    /// Symbolic name of a known code.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::INTERNAL => Some("internal"),
            Self::BAD_GRID => Some("bad-grid"),
            Self::NO_SOLUTION => Some("no-solution"),
            Self::NOT_AVAILABLE => Some("not-available"),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}({})", name, self.0),
            None => write!(f, "unknown({})", self.0),
        }
    }
}
