use std::sync::mpsc;

use crate::worker::WorkerEvent;

/// Sink for human readable status lines emitted while a render runs.
///
/// Messages arrive in emission order; nothing is buffered.
pub trait ProgressReporter {
    fn report(&mut self, message: &str);
}

impl<F: FnMut(&str)> ProgressReporter for F {
    fn report(&mut self, message: &str) {
        self(message)
    }
}

/// Forwards progress to `tracing` at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&mut self, message: &str) {
        tracing::info!("{message}");
    }
}

/// Keeps every message, mostly useful in tests and for after-the-fact logs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectingReporter {
    pub messages: Vec<String>,
}

impl ProgressReporter for CollectingReporter {
    fn report(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Sends each message to a front end as [`WorkerEvent::Progress`].
///
/// A closed receiver is ignored; the render keeps going.
#[derive(Clone, Debug)]
pub struct ChannelReporter {
    tx: mpsc::Sender<WorkerEvent>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::Sender<WorkerEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&mut self, message: &str) {
        let _ = self.tx.send(WorkerEvent::Progress(message.to_string()));
    }
}
