//! # Solver Facade
//!
//! Typed `create` / `solve` / `destroy` over any engine connection.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gridwire::ErrorCode;
use gridwire::Payload;
use gridwire::PayloadKind;
use gridwire::RequestBody;
use gridwire::RequestKind;

use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::error::Result;

/// Engine-side identifier of a live solver.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct SolverHandle(pub i32);

impl fmt::Display for SolverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "solver-{}", self.0)
    }
}

/// The solver operations, independent of how the engine is reached.
#[async_trait]
pub trait SolverService: Send + Sync {
    /// Creates a solver for `grid`.
    async fn create(&self, grid: &str) -> Result<SolverHandle>;

    /// Solves the solver's grid.
    ///
    /// `Error::NoSolution` when the engine answers `ErrorCode::NO_SOLUTION`;
    /// a `SolveResult` is returned as is.
    async fn solve(&self, handle: SolverHandle) -> Result<String>;

    /// Releases the solver.
    async fn destroy(&self, handle: SolverHandle) -> Result<()>;
}

/// `SolverService` over a `Dispatcher`.
///
/// Applies the configured call timeout; an expired call is cancelled and its
/// late response, if any, is discarded.
#[derive(Clone)]
pub struct DispatchSolver {
    dispatcher: Arc<Dispatcher>,
    timeout: Option<Duration>,
}

impl DispatchSolver {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        let timeout = dispatcher.config().get_call_timeout();
        Self { dispatcher, timeout }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    async fn call(&self, body: RequestBody) -> Result<Payload> {
        let reply = self.dispatcher.dispatch(body)?;
        match self.timeout {
            None => reply.await,
            Some(limit) => tokio::time::timeout(limit, reply)
                .await
                .map_err(|_| Error::Timeout(limit))?,
        }
    }
}

fn unexpected(expected: RequestKind, found: &Payload) -> Error {
    Error::UnexpectedVariant { expected, found: found.kind() }
}

#[async_trait]
impl SolverService for DispatchSolver {
    async fn create(&self, grid: &str) -> Result<SolverHandle> {
        let payload = self.call(RequestBody::CreateSolver { grid: grid.to_string() }).await?;
        let Payload::SolverCreated { id } = payload else {
            return Err(unexpected(RequestKind::CreateSolver, &payload));
        };
        Ok(SolverHandle(id))
    }

    async fn solve(&self, handle: SolverHandle) -> Result<String> {
        let payload = match self.call(RequestBody::Solve { id: handle.0 }).await {
            Err(Error::Engine(ErrorCode::NO_SOLUTION)) => return Err(Error::NoSolution),
            outcome => outcome?,
        };
        match payload {
            Payload::SolveResult { solution } => Ok(solution),
            other => Err(unexpected(RequestKind::Solve, &other)),
        }
    }

    async fn destroy(&self, handle: SolverHandle) -> Result<()> {
        let payload = self.call(RequestBody::Destroy { id: handle.0 }).await?;
        if payload.kind() != PayloadKind::SolverDestroyed {
            return Err(unexpected(RequestKind::Destroy, &payload));
        }
        Ok(())
    }
}
