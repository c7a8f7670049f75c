//! # Turbosolver
//!
//! Drives an external solver engine over an asynchronous, message-passing transport.
//!
//! ## Layers
//!
//! - **Transport**: moves opaque envelopes. Outbound via `Transport::send`, inbound
//!   via `Inbox::on_message`, which may be invoked from any thread.
//! - **Dispatcher**: assigns a `RequestId`, registers a pending call, transmits, and
//!   later matches each inbound response to exactly one caller.
//! - **Facade**: `SolverService` exposes `create`, `solve` and `destroy` with typed
//!   results, independent of the transport behind it.

pub mod classify;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod facade;
pub mod logging;
pub mod pending;
pub mod transport;

pub use config::Config;
pub use dispatcher::DispatchStats;
pub use dispatcher::Dispatcher;
pub use error::Error;
pub use error::Result;
pub use facade::DispatchSolver;
pub use facade::SolverHandle;
pub use facade::SolverService;
pub use pending::PendingReply;
pub use transport::ChannelTransport;
pub use transport::Inbox;
pub use transport::Transport;
pub use transport::TransportError;

pub use gridwire::ErrorCode;
pub use gridwire::Payload;
pub use gridwire::RequestBody;
pub use gridwire::RequestId;
