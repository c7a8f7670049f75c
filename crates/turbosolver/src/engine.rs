//! # Loopback Engine
//!
//! The engine side of the wire protocol, run as an actor on a background thread.
//!
//! `Executor` is itself a `Transport`: requests handed to `send` are queued for
//! the thread, which answers each one through a reply callback. Answers are
//! therefore delivered from a thread the dispatcher does not own, in the order
//! the engine finishes them.

use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

use gridwire::ErrorCode;
use gridwire::Payload;
use gridwire::Request;
use gridwire::RequestBody;
use gridwire::Response;
use gridwire::ResponseBody;
use tracing::debug;
use tracing::warn;

use crate::transport;
use crate::transport::Inbox;
use crate::transport::Transport;
use crate::transport::TransportError;

/// The solving algorithm behind the engine.
pub trait Strategy: Send + 'static {
    /// Whether `grid` can be parsed at all.
    fn accepts(&self, grid: &str) -> bool;

    /// The solution of `grid`, or `None` if there is none.
    fn solve(&self, grid: &str) -> Option<String>;
}

/// Solver instances owned by the engine thread.
struct Registry<S> {
    strategy: S,
    grids: HashMap<i32, String>,
    next_id: i32,
}

impl<S: Strategy> Registry<S> {
    fn new(strategy: S) -> Self {
        Self { strategy, grids: HashMap::new(), next_id: 0 }
    }

    fn handle(&mut self, request: Request) -> Response {
        let outcome = match request.body {
            RequestBody::CreateSolver { grid } => self.create(grid),
            RequestBody::Solve { id } => self.solve(id),
            RequestBody::Destroy { id } => self.destroy(id),
        };
        let body = match outcome {
            Ok(payload) => ResponseBody::Ok(payload),
            Err(code) => ResponseBody::Err(code),
        };
        Response { id: request.id, body }
    }

    fn create(&mut self, grid: String) -> Result<Payload, ErrorCode> {
        if !self.strategy.accepts(&grid) {
            return Err(ErrorCode::BAD_GRID);
        }
        let next = self.next_id.checked_add(1).ok_or(ErrorCode::INTERNAL)?;
        let id = std::mem::replace(&mut self.next_id, next);
        self.grids.insert(id, grid);
        Ok(Payload::SolverCreated { id })
    }

    fn solve(&self, id: i32) -> Result<Payload, ErrorCode> {
        let grid = self.grids.get(&id).ok_or(ErrorCode::NOT_AVAILABLE)?;
        let solution = self.strategy.solve(grid).ok_or(ErrorCode::NO_SOLUTION)?;
        Ok(Payload::SolveResult { solution })
    }

    fn destroy(&mut self, id: i32) -> Result<Payload, ErrorCode> {
        self.grids
            .remove(&id)
            .map(|_| Payload::SolverDestroyed)
            .ok_or(ErrorCode::NOT_AVAILABLE)
    }
}

/// Handle to a running engine thread.
///
/// The thread exits once this handle is dropped and its queue drains.
pub struct Executor {
    tx: mpsc::Sender<Request>,
}

impl Executor {
    /// Starts the engine thread. Every encoded response is passed to `reply`.
    pub fn spawn<S, R>(strategy: S, reply: R) -> transport::Result<Self>
    where
        S: Strategy,
        R: FnMut(Vec<u8>) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Request>();
        thread::Builder::new()
            .name("solver-engine".into())
            .spawn(move || run(Registry::new(strategy), rx, reply))
            .map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(Self { tx })
    }

    /// Starts the engine thread answering straight into `inbox`.
    pub fn attach<S: Strategy>(strategy: S, inbox: Inbox) -> transport::Result<Self> {
        Self::spawn(strategy, move |envelope| inbox.on_message(&envelope))
    }
}

fn run<S, R>(mut registry: Registry<S>, rx: mpsc::Receiver<Request>, mut reply: R)
where
    S: Strategy,
    R: FnMut(Vec<u8>),
{
    for request in rx {
        let response = registry.handle(request);
        match gridwire::encode_response(&response) {
            Ok(envelope) => reply(envelope),
            Err(e) => warn!(request_id = %response.id, error = %e, "engine failed to encode response"),
        }
    }
    debug!(live_solvers = registry.grids.len(), "engine stopped");
}

impl Transport for Executor {
    fn send(&self, envelope: Vec<u8>) -> transport::Result<()> {
        let request = gridwire::decode_request(&envelope).map_err(|e| {
            warn!(error = %e, "engine refused undecodable request");
            TransportError::Io(e.to_string())
        })?;
        self.tx
            .send(request)
            .map_err(|_| TransportError::ConnectionLost("engine stopped".into()))
    }
}
