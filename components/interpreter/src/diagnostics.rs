//! Fault reporting to the embedding host.

use core_types::Diagnostic;
use crossbeam::channel::{self, Receiver, Sender};

/// Host callback invoked for every faulted context.
pub type DiagnosticsHandler = Box<dyn FnMut(&Diagnostic) + Send>;

/// Delivers diagnostics to a handler and any subscribed channels.
///
/// Without a handler or subscriber, faults are emitted as `tracing` errors.
#[derive(Default)]
pub(crate) struct DiagnosticsSink {
    handler: Option<DiagnosticsHandler>,
    subscribers: Vec<Sender<Diagnostic>>,
}

impl DiagnosticsSink {
    pub(crate) fn set_handler(&mut self, handler: DiagnosticsHandler) {
        self.handler = Some(handler);
    }

    pub(crate) fn subscribe(&mut self) -> Receiver<Diagnostic> {
        let (tx, rx) = channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn report(&mut self, diagnostic: &Diagnostic) {
        // Disconnected receivers are dropped.
        self.subscribers
            .retain(|tx| tx.send(diagnostic.clone()).is_ok());

        match self.handler.as_mut() {
            Some(handler) => handler(diagnostic),
            None if self.subscribers.is_empty() => {
                tracing::error!(
                    kind = %diagnostic.kind,
                    context = %diagnostic.context,
                    offset = ?diagnostic.offset,
                    "{}",
                    diagnostic.message
                );
            }
            None => {}
        }
    }
}

impl std::fmt::Debug for DiagnosticsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticsSink")
            .field("has_handler", &self.handler.is_some())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
