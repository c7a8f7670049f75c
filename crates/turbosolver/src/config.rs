//! # Dispatcher Configuration

use std::time::Duration;

/// Tunables for a `Dispatcher` and the facade built on it.
///
/// The dispatcher itself never times out; `call_timeout` is applied by the facade.
#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) name: String,
    pub(crate) call_timeout: Option<Duration>,
    pub(crate) max_envelope_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "turbosolver".to_string(),
            call_timeout: None,
            max_envelope_len: 1 << 20,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label attached to every log line of this dispatcher.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Deadline for each facade call. `None` waits for the engine indefinitely.
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Inbound envelopes longer than this are discarded without decoding.
    pub fn max_envelope_len(mut self, len: usize) -> Self {
        self.max_envelope_len = len;
        self
    }

    pub fn get_call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }
}
