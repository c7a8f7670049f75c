//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;

use gridwire::Request;
use gridwire::RequestBody;
use gridwire::RequestId;
use gridwire::Response;
use gridwire::ResponseBody;
use turbosolver::Config;
use turbosolver::Dispatcher;
use turbosolver::Inbox;
use turbosolver::Transport;
use turbosolver::TransportError;
use turbosolver::engine::Strategy;

pub const SOLVABLE: &str = "53..7....6..195....98....6.";
pub const SOLUTION: &str = "534678912672195348198342567";
pub const UNSOLVABLE: &str = "55..7....6..195....98....6.";

pub fn config(name: &str) -> Config {
    turbosolver::logging::try_init();
    Config::new().name(name)
}

// ==========================================================================
// Recording transport: captures requests, the test answers by hand
// ==========================================================================

struct RecordingTransport {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    refuse: Arc<AtomicBool>,
}

impl Transport for RecordingTransport {
    fn send(&self, envelope: Vec<u8>) -> Result<(), TransportError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionLost("refused by test".into()));
        }
        self.sent.lock().unwrap().push(envelope);
        Ok(())
    }
}

/// The engine end of a recording transport.
#[derive(Clone)]
pub struct Remote {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    refuse: Arc<AtomicBool>,
    inbox: Inbox,
}

impl Remote {
    /// Every request transmitted so far, in transmission order.
    pub fn requests(&self) -> Vec<Request> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|envelope| gridwire::decode_request(envelope).unwrap())
            .collect()
    }

    pub fn respond(&self, id: RequestId, body: ResponseBody) {
        let envelope = gridwire::encode_response(&Response { id, body }).unwrap();
        self.inbox.on_message(&envelope);
    }

    pub fn deliver_raw(&self, envelope: &[u8]) {
        self.inbox.on_message(envelope);
    }

    pub fn refuse_sends(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

pub fn recording(config: Config) -> (Dispatcher, Remote) {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let refuse = Arc::new(AtomicBool::new(false));

    let mut remote = None;
    let dispatcher = Dispatcher::connect(config, |inbox| {
        remote = Some(Remote { sent: sent.clone(), refuse: refuse.clone(), inbox });
        Ok(RecordingTransport { sent, refuse })
    })
    .unwrap();

    (dispatcher, remote.unwrap())
}

// ==========================================================================
// Scripted transport: answers every request from a fresh thread
// ==========================================================================

pub type Script = Arc<dyn Fn(&RequestBody) -> Option<ResponseBody> + Send + Sync>;

struct ScriptedTransport {
    script: Script,
    inbox: Inbox,
}

impl Transport for ScriptedTransport {
    fn send(&self, envelope: Vec<u8>) -> Result<(), TransportError> {
        let request = gridwire::decode_request(&envelope).unwrap();
        let script = self.script.clone();
        let inbox = self.inbox.clone();
        thread::spawn(move || {
            if let Some(body) = script(&request.body) {
                let envelope = gridwire::encode_response(&Response { id: request.id, body }).unwrap();
                inbox.on_message(&envelope);
            }
        });
        Ok(())
    }
}

pub fn scripted<F>(config: Config, script: F) -> Dispatcher
where
    F: Fn(&RequestBody) -> Option<ResponseBody> + Send + Sync + 'static,
{
    let script: Script = Arc::new(script);
    Dispatcher::connect(config, |inbox| Ok(ScriptedTransport { script, inbox })).unwrap()
}

// ==========================================================================
// Strategies for the loopback engine
// ==========================================================================

/// Knows a fixed set of grids; anything else fails to parse.
pub struct TableStrategy {
    solutions: HashMap<String, Option<String>>,
}

impl TableStrategy {
    pub fn sample() -> Self {
        let mut solutions = HashMap::new();
        solutions.insert(SOLVABLE.to_string(), Some(SOLUTION.to_string()));
        solutions.insert(UNSOLVABLE.to_string(), None);
        Self { solutions }
    }
}

impl Strategy for TableStrategy {
    fn accepts(&self, grid: &str) -> bool {
        self.solutions.contains_key(grid)
    }

    fn solve(&self, grid: &str) -> Option<String> {
        self.solutions.get(grid).cloned().flatten()
    }
}
