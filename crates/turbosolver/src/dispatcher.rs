//! # Request Dispatcher
//!
//! Correlates asynchronous responses with the calls that caused them.
//!
//! Each dispatch generates a fresh `RequestId`, encodes the request, registers a
//! pending call, and only then transmits. Responses arrive through the `Inbox`
//! on any thread and resolve the matching call exactly once. Responses with no
//! matching call are stale and dropped.

use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use gridwire::Payload;
use gridwire::Request;
use gridwire::RequestBody;
use gridwire::RequestId;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::classify::classify;
use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::pending::PendingCall;
use crate::pending::PendingReply;
use crate::pending::PendingTable;
use crate::transport;
use crate::transport::Inbox;
use crate::transport::Transport;

/// Snapshot of a dispatcher's traffic counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Envelopes handed to the transport.
    pub sent: u64,
    /// Inbound responses that resolved a pending call.
    pub resolved: u64,
    /// Inbound responses whose id matched nothing.
    pub stale: u64,
    /// Inbound envelopes that were oversized or failed to decode.
    pub malformed: u64,
}

#[derive(Default)]
struct Counters {
    sent: AtomicU64,
    resolved: AtomicU64,
    stale: AtomicU64,
    malformed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            sent: self.sent.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
        }
    }
}

/// State shared between a dispatcher and its inbox.
pub(crate) struct Shared {
    name: String,
    max_envelope_len: usize,
    table: Arc<PendingTable>,
    counters: Counters,
}

impl Shared {
    /// Routes one inbound envelope to its pending call.
    pub(crate) fn deliver(&self, envelope: &[u8]) {
        if envelope.len() > self.max_envelope_len {
            self.counters.malformed.fetch_add(1, Ordering::Relaxed);
            warn!(
                dispatcher = %self.name,
                len = envelope.len(),
                max = self.max_envelope_len,
                "discarding oversized envelope"
            );
            return;
        }

        let response = match gridwire::decode_response(envelope) {
            Ok(response) => response,
            Err(e) => {
                self.counters.malformed.fetch_add(1, Ordering::Relaxed);
                warn!(dispatcher = %self.name, error = %e, "discarding malformed envelope");
                return;
            }
        };

        let Some(call) = self.table.take(response.id) else {
            self.counters.stale.fetch_add(1, Ordering::Relaxed);
            debug!(dispatcher = %self.name, request_id = %response.id, "discarding stale response");
            return;
        };

        let outcome = classify(call.expects(), response.body);
        match &outcome {
            Ok(payload) => {
                debug!(dispatcher = %self.name, request_id = %response.id, payload = %payload.kind(), "resolved")
            }
            Err(e) => debug!(dispatcher = %self.name, request_id = %response.id, error = %e, "resolved with error"),
        }

        self.counters.resolved.fetch_add(1, Ordering::Relaxed);
        if !call.resolve(outcome) {
            debug!(dispatcher = %self.name, request_id = %response.id, "caller went away before resolution");
        }
    }

    pub(crate) fn close(&self, reason: Error) -> usize {
        self.table.close(reason)
    }
}

/// Issues requests over a transport and resolves each one from its response.
///
/// Safe to share across tasks and threads; wrap it in an `Arc` to do so.
/// Dropping the dispatcher shuts it down.
pub struct Dispatcher {
    config: Config,
    shared: Arc<Shared>,
    transport: Box<dyn Transport>,
    next_id: AtomicU32,
}

impl Dispatcher {
    /// Builds a dispatcher and its transport.
    ///
    /// `connect` receives the dispatcher's `Inbox`, which the transport must
    /// feed with every inbound envelope.
    pub fn connect<T, F>(config: Config, connect: F) -> Result<Self>
    where
        T: Transport,
        F: FnOnce(Inbox) -> transport::Result<T>,
    {
        let shared = Arc::new(Shared {
            name: config.name.clone(),
            max_envelope_len: config.max_envelope_len,
            table: Arc::new(PendingTable::new()),
            counters: Counters::default(),
        });
        let transport = connect(Inbox::new(shared.clone()))?;

        info!(dispatcher = %config.name, "dispatcher connected");
        Ok(Self {
            config,
            shared,
            transport: Box::new(transport),
            next_id: AtomicU32::new(1),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Another handle to this dispatcher's inbound side.
    pub fn inbox(&self) -> Inbox {
        Inbox::new(self.shared.clone())
    }

    /// Number of calls awaiting a response.
    pub fn pending_len(&self) -> usize {
        self.shared.table.len()
    }

    pub fn stats(&self) -> DispatchStats {
        self.shared.counters.snapshot()
    }

    /// Ids are issued in strictly increasing order and never wrap.
    fn next_request_id(&self) -> Result<RequestId> {
        self.next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
            .map(RequestId)
            .map_err(|_| Error::IdsExhausted)
    }

    /// Transmits `body` and returns the future of its answer.
    ///
    /// Errors here mean nothing is pending for the request: it was either
    /// never encoded, refused by the table, or refused by the transport.
    pub fn dispatch(&self, body: RequestBody) -> Result<PendingReply> {
        let id = self.next_request_id()?;
        let expects = body.kind();
        let request = Request { id, body };

        let envelope = gridwire::encode_request(&request).map_err(|e| {
            warn!(dispatcher = %self.config.name, request_id = %id, error = %e, "failed to encode request");
            Error::MalformedRequest(e)
        })?;

        let (call, rx) = PendingCall::new(expects);
        self.shared.table.register(id, call)?;

        if let Err(e) = self.transport.send(envelope) {
            self.shared.table.cancel(id);
            warn!(dispatcher = %self.config.name, request_id = %id, error = %e, "transport refused request");
            return Err(Error::Transport(e));
        }

        self.shared.counters.sent.fetch_add(1, Ordering::Relaxed);
        debug!(dispatcher = %self.config.name, request_id = %id, kind = %expects, "dispatched");
        Ok(PendingReply::new(id, rx, self.shared.table.clone()))
    }

    /// Dispatches `body` and waits for its answer, however long that takes.
    pub async fn call(&self, body: RequestBody) -> Result<Payload> {
        self.dispatch(body)?.await
    }

    /// Fails every pending call with `Shutdown` and refuses new dispatches.
    ///
    /// Idempotent. Returns how many calls this invocation failed.
    pub fn shutdown(&self) -> usize {
        let first = !self.shared.table.is_closed();
        let failed = self.shared.close(Error::Shutdown);
        if first {
            info!(dispatcher = %self.config.name, failed, "dispatcher shut down");
        }
        failed
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
