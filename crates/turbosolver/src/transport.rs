//! # Transport Abstraction
//!
//! The boundary between the dispatcher and whatever carries envelopes to the engine.
//!
//! ## Philosophy
//!
//! - **Byte-Oriented**: A transport moves whole, opaque envelopes. Framing is its
//!   job; it never looks inside.
//! - **Fire-and-Forget Out, Callback In**: `send` only submits. Answers come back
//!   through `Inbox::on_message`, on whatever thread the transport owns.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::dispatcher::Shared;
use crate::error::Error;

/// Errors raised by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The engine is unreachable or the channel was dropped.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    /// The envelope exceeds what the transport can carry.
    #[error("payload too large for transport")]
    PayloadTooLarge,
    /// Generic I/O or internal transport failure.
    #[error("i/o error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Submits encoded request envelopes to the engine.
///
/// Object safe, so a dispatcher can hold any transport as `Box<dyn Transport>`.
pub trait Transport: Send + Sync + 'static {
    /// Hands one complete envelope to the transport.
    ///
    /// # invariants
    /// - Must not block waiting for the engine's answer.
    /// - Must not interpret the envelope.
    /// - `Err` means the envelope was definitely not submitted.
    fn send(&self, envelope: Vec<u8>) -> Result<()>;
}

/// Inbound side of a dispatcher, handed to the transport at connect time.
///
/// Cheap to clone and safe to call from any thread.
#[derive(Clone)]
pub struct Inbox {
    shared: Arc<Shared>,
}

impl Inbox {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Delivers one complete response envelope.
    ///
    /// Malformed and unmatched envelopes are logged and dropped; they never
    /// affect other pending calls.
    pub fn on_message(&self, envelope: &[u8]) {
        self.shared.deliver(envelope);
    }

    /// Feeds every envelope from `rx` into `on_message` on a tokio task.
    ///
    /// When the stream ends, outstanding calls fail with `ConnectionLost` and
    /// the dispatcher refuses new ones.
    pub fn spawn_pump(self, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                self.on_message(&envelope);
            }
            let lost = TransportError::ConnectionLost("inbound stream closed".into());
            self.shared.close(Error::Transport(lost));
        })
    }
}

/// Transport over a tokio unbounded channel.
///
/// Pairs with `Inbox::spawn_pump` for engines that live on the same runtime.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self { tx }
    }

    /// Creates a transport and the receiver the engine reads requests from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, envelope: Vec<u8>) -> Result<()> {
        self.tx
            .send(envelope)
            .map_err(|_| TransportError::ConnectionLost("channel closed".into()))
    }
}
