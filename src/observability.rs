use std::sync::Mutex;

use crate::domain::Flow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamStage {
    Token,
    Dispatch,
}

/// Operator-facing happenings that must never change the response already
/// owed to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum OpsEvent {
    AcknowledgementSkipped { flow: Flow, reason: &'static str },
    AcknowledgementFailed { flow: Flow, detail: String },
    UpstreamFailure {
        flow: Flow,
        stage: UpstreamStage,
        detail: String,
    },
}

pub trait OpsSink: Send + Sync {
    fn record(&self, event: OpsEvent);
}

/// Production sink: structured tracing events.
pub struct TracingOpsSink;

impl OpsSink for TracingOpsSink {
    fn record(&self, event: OpsEvent) {
        match event {
            OpsEvent::AcknowledgementSkipped { flow, reason } => {
                tracing::info!(flow = %flow, reason, "acknowledgement email skipped");
            }
            OpsEvent::AcknowledgementFailed { flow, detail } => {
                tracing::warn!(flow = %flow, detail = %detail, "acknowledgement email failed to send");
            }
            OpsEvent::UpstreamFailure { flow, stage, detail } => {
                tracing::error!(
                    flow = %flow,
                    stage = ?stage,
                    detail = %detail,
                    "upstream mail provider call failed"
                );
            }
        }
    }
}

/// Buffering sink; tests assert on the recorded events.
#[derive(Default)]
pub struct MemoryOpsSink {
    events: Mutex<Vec<OpsEvent>>,
}

impl MemoryOpsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OpsEvent> {
        self.events.lock().expect("ops sink mutex poisoned").clone()
    }
}

impl OpsSink for MemoryOpsSink {
    fn record(&self, event: OpsEvent) {
        self.events.lock().expect("ops sink mutex poisoned").push(event);
    }
}
