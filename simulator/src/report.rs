//! Result messages and listener publication.
//!
//! The result of an invocation is an in-process message, not a serialized
//! payload: the service hands it to whichever listener the call selected.
//! Publication is fire-and-forget — the service neither retries nor recovers
//! a listener fault; a panicking listener surfaces to the invoker.

use serde::{Deserialize, Serialize};

/// One failed assertion: the human-readable cause plus a JSON detail payload
/// (step index, expected vs actual, given snapshot).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Failure {
    pub description: String,
    pub detail: String,
}

/// Structured result published after an invocation.
///
/// `run_time_ms` carries the measured elapsed time, except on the
/// module-wide path where it is the fixed sentinel `1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestResultMessage {
    pub identifier: String,
    pub run_count: u32,
    pub run_time_ms: u64,
    pub failures: Vec<Failure>,
}

impl TestResultMessage {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Receiver for published results. The service holds a default listener;
/// the module-wide path accepts an explicit override.
pub trait ResultListener: Send + Sync {
    fn on_result(&self, message: TestResultMessage);
}

/// Listener printing result lines to stdout; the CLI's default channel.
#[derive(Debug, Default)]
pub struct PrintListener;

impl ResultListener for PrintListener {
    fn on_result(&self, message: TestResultMessage) {
        println!(
            "result: id={} passed={} run_count={} run_time_ms={} failures={}",
            message.identifier,
            message.passed(),
            message.run_count,
            message.run_time_ms,
            message.failures.len()
        );
        for failure in &message.failures {
            println!("failure: {}", failure.description);
        }
    }
}
