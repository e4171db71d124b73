//! Owner-side façade over a spawned agent's channels.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use colloquy_acl::{AgentId, Message};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::agent::ControlOp;
use crate::behavior::Behavior;
use crate::dispatch::BehaviorId;
use crate::platform::PostError;

/// The agent's execution context has already terminated.
#[derive(Debug, Clone, Error)]
#[error("agent {agent} has stopped")]
pub struct AgentStopped {
    agent: AgentId,
}

/// Handle to an agent whose execution context runs elsewhere.
///
/// Clonable; all operations go through the agent's channels, so they respect
/// the serialization guarantee of the agent's run loop. Obtained from
/// [`crate::agent::Agent::new`] or platform registration.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    agent_id: AgentId,
    inbox: mpsc::Sender<Message>,
    control: mpsc::UnboundedSender<ControlOp>,
    next_behavior_id: Arc<AtomicU64>,
}

impl AgentHandle {
    pub(crate) fn new(
        agent_id: AgentId,
        inbox: mpsc::Sender<Message>,
        control: mpsc::UnboundedSender<ControlOp>,
        next_behavior_id: Arc<AtomicU64>,
    ) -> Self {
        Self {
            agent_id,
            inbox,
            control,
            next_behavior_id,
        }
    }

    /// Identity of the agent behind this handle.
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Enqueues a message into the agent's bounded inbox.
    ///
    /// Awaits when the inbox is full; this is the fabric's backpressure.
    ///
    /// # Errors
    ///
    /// [`PostError::Closed`] once the agent has stopped.
    pub async fn post(&self, message: Message) -> Result<(), PostError> {
        self.inbox
            .send(message)
            .await
            .map_err(|_| PostError::Closed {
                agent_type: self.agent_id.agent_type.clone(),
            })
    }

    /// Registers a behavior on the agent; returns its id immediately.
    ///
    /// Applied by the run loop between deliveries.
    ///
    /// # Errors
    ///
    /// [`AgentStopped`] once the agent has stopped.
    pub fn add_behavior(&self, behavior: Box<dyn Behavior>) -> Result<BehaviorId, AgentStopped> {
        let id = BehaviorId::new(self.next_behavior_id.fetch_add(1, Ordering::Relaxed));
        self.control
            .send(ControlOp::Add { id, behavior })
            .map_err(|_| AgentStopped {
                agent: self.agent_id.clone(),
            })?;
        Ok(id)
    }

    /// Deregisters a behavior from the agent.
    ///
    /// Idempotent on the agent side; unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// [`AgentStopped`] once the agent has stopped.
    pub fn remove_behavior(&self, id: BehaviorId) -> Result<(), AgentStopped> {
        self.control
            .send(ControlOp::Remove { id })
            .map_err(|_| AgentStopped {
                agent: self.agent_id.clone(),
            })
    }

    /// Asks the agent to stop: its inbox closes, already queued messages are
    /// still delivered, then the run loop exits.
    ///
    /// Idempotent; safe to call on an agent that already stopped.
    pub fn stop(&self) {
        let _ = self.control.send(ControlOp::Stop);
    }

    pub(crate) fn inbox_sender(&self) -> mpsc::Sender<Message> {
        self.inbox.clone()
    }
}
