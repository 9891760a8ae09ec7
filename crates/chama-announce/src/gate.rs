//! Per-display announcement deduplication.

use chama_types::CallRecord;

/// What the gate remembers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GateState {
    /// Nothing announced since the display session started.
    #[default]
    Idle,
    /// The ID of the most recently announced call.
    Announced(String),
}

/// Decides whether the current call should be announced.
///
/// Each display session owns one gate. A call ID is admitted at most once
/// in a row: the ID is recorded the moment it is admitted, before any
/// rendering or speech starts, and it stays recorded if the announcement
/// later fails. An empty feed leaves the memory untouched, so a call that
/// reappears after a reset under the same ID is still suppressed.
#[derive(Debug, Default)]
pub struct DedupGate {
    state: GateState,
}

impl DedupGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `current` should be announced, and marks it as
    /// announced in that case.
    pub fn admit(&mut self, current: Option<&CallRecord>) -> bool {
        let Some(call) = current else {
            return false;
        };

        if let GateState::Announced(last) = &self.state {
            if *last == call.id {
                tracing::trace!(call_id = %call.id, "call already announced, skipping");
                return false;
            }
        }

        tracing::debug!(call_id = %call.id, "call admitted for announcement");
        self.state = GateState::Announced(call.id.clone());
        true
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn last_announced(&self) -> Option<&str> {
        match &self.state {
            GateState::Idle => None,
            GateState::Announced(id) => Some(id),
        }
    }
}
