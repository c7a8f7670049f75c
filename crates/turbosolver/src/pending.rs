//! # Pending-Call Table
//!
//! Maps each in-flight `RequestId` to the single-resolution handle of its caller.
//!
//! ## Invariants
//! - An id present in the table has not been resolved.
//! - Removal and resolution are one step: `take` hands the handle out of the map
//!   atomically, and `PendingCall::resolve` consumes it, so no handle can be
//!   resolved twice and no response can resolve two handles.
//! - Once closed, the table refuses registrations and holds nothing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::OnceLock;
use std::task::Context;
use std::task::Poll;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use gridwire::Payload;
use gridwire::RequestId;
use gridwire::RequestKind;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::Error;
use crate::error::Result;

/// Completion handle for one in-flight request.
pub struct PendingCall {
    expects: RequestKind,
    tx: oneshot::Sender<Result<Payload>>,
}

impl PendingCall {
    /// Creates a handle and the receiver its caller awaits.
    pub fn new(expects: RequestKind) -> (Self, oneshot::Receiver<Result<Payload>>) {
        let (tx, rx) = oneshot::channel();
        (Self { expects, tx }, rx)
    }

    /// The kind of request this call was made with.
    pub fn expects(&self) -> RequestKind {
        self.expects
    }

    /// Resolves the call. Returns `false` if the caller already went away.
    pub fn resolve(self, outcome: Result<Payload>) -> bool {
        self.tx.send(outcome).is_ok()
    }
}

/// Concurrent table of pending calls.
pub struct PendingTable {
    calls: DashMap<RequestId, PendingCall>,
    closed: OnceLock<Error>,
}

impl Default for PendingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
            closed: OnceLock::new(),
        }
    }

    /// Adds a call under `id`.
    ///
    /// Fails with `DuplicateId` if the id is already pending, or with the close
    /// reason once the table has been closed.
    pub fn register(&self, id: RequestId, call: PendingCall) -> Result<()> {
        if let Some(reason) = self.closed.get() {
            return Err(reason.clone());
        }

        match self.calls.entry(id) {
            Entry::Occupied(_) => return Err(Error::DuplicateId(id)),
            Entry::Vacant(slot) => {
                slot.insert(call);
            }
        }

        // close() may have drained the shard before our insert landed
        if let Some(reason) = self.closed.get() {
            if self.calls.remove(&id).is_some() {
                return Err(reason.clone());
            }
        }
        Ok(())
    }

    /// Removes and returns the call for `id`, if it is still pending.
    pub fn take(&self, id: RequestId) -> Option<PendingCall> {
        self.calls.remove(&id).map(|(_, call)| call)
    }

    /// Drops the call for `id` without resolving it.
    pub fn cancel(&self, id: RequestId) -> bool {
        self.take(id).is_some()
    }

    /// Refuses further registrations and fails every pending call with `reason`.
    ///
    /// The first reason wins; later calls only sweep stragglers. Returns how
    /// many calls were failed by this invocation.
    pub fn close(&self, reason: Error) -> usize {
        let _ = self.closed.set(reason);
        let Some(reason) = self.closed.get() else {
            return 0;
        };

        let ids: Vec<RequestId> = self.calls.iter().map(|entry| *entry.key()).collect();
        let mut failed = 0;
        for id in ids {
            if let Some(call) = self.take(id) {
                call.resolve(Err(reason.clone()));
                failed += 1;
            }
        }
        failed
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get().is_some()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Future side of a dispatched call.
///
/// Resolves exactly once. Dropping it before resolution cancels the call: its
/// entry is removed, and a late response for the id is discarded as stale.
pub struct PendingReply {
    id: RequestId,
    rx: oneshot::Receiver<Result<Payload>>,
    table: Arc<PendingTable>,
    done: bool,
}

impl PendingReply {
    pub(crate) fn new(
        id: RequestId,
        rx: oneshot::Receiver<Result<Payload>>,
        table: Arc<PendingTable>,
    ) -> Self {
        Self { id, rx, table, done: false }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Future for PendingReply {
    type Output = Result<Payload>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(outcome) => {
                self.done = true;
                // a handle dropped unresolved only happens when the table itself is gone
                Poll::Ready(outcome.unwrap_or(Err(Error::Shutdown)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        if !self.done && self.table.cancel(self.id) {
            debug!(request_id = %self.id, "cancelled pending call");
        }
    }
}
