//! Runtime observability events.
//!
//! Agents report noteworthy occurrences on a bounded channel the platform
//! owns. Emission is best-effort (`try_send`): a slow or absent observer
//! never backpressures message dispatch, so under load events may be lost
//! while the underlying counters stay exact.

use colloquy_acl::{AgentId, Message};

use crate::dispatch::BehaviorId;

/// Status updates emitted by running agents.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A message reached an agent but no registered behavior matched it.
    /// The message was discarded; it travels with the event for diagnosis.
    MessageUnmatched { agent: AgentId, message: Message },

    /// A delivery failed (template predicate or behavior handling logic).
    /// `behavior` is set when a behavior had already been selected.
    DeliveryFailed {
        agent: AgentId,
        behavior: Option<BehaviorId>,
        error: String,
    },

    /// A behavior reported done after a successful handling and was retired.
    BehaviorCompleted { agent: AgentId, behavior: BehaviorId },

    /// An agent's run loop exited, with its lifetime delivery counters.
    AgentStopped {
        agent: AgentId,
        delivered: u64,
        unmatched: u64,
    },
}
