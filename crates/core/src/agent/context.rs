//! The capability handle a behavior receives while handling a message.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use colloquy_acl::{AgentId, Message, MessageBuilder};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::agent::ControlOp;
use crate::behavior::Behavior;
use crate::dispatch::BehaviorId;
use crate::platform::{MessageSink, PostError};
use crate::storage::{KeyValueStore, PrefixStore, StorageError};

/// Runtime affordances granted to behavior logic.
///
/// Cheap to clone; every delivery hands the behavior a context scoped to the
/// delivered message's conversation thread, so replies, follow-up templates
/// and thread storage all land in the right exchange without the behavior
/// tracking ids itself.
///
/// Index mutations issued here are deferred: they travel over the agent's
/// control channel and are applied when the current delivery completes,
/// before the next queued message is dispatched. They are therefore visible
/// to every subsequent `find`, but never mid-flight to the current one.
#[derive(Clone)]
pub struct AgentContext {
    pub(crate) agent_id: AgentId,
    pub(crate) thread_id: Option<Uuid>,
    pub(crate) sink: Arc<dyn MessageSink>,
    pub(crate) control: mpsc::UnboundedSender<ControlOp>,
    pub(crate) next_behavior_id: Arc<AtomicU64>,
    pub(crate) storage: Arc<dyn KeyValueStore>,
}

impl AgentContext {
    /// Identity of the agent this context belongs to.
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Conversation thread this context is scoped to, if any.
    pub fn thread_id(&self) -> Option<Uuid> {
        self.thread_id
    }

    /// Posts a message into the fabric the agent is attached to.
    ///
    /// # Errors
    ///
    /// Propagates the fabric's [`PostError`] (unknown receiver, stopped
    /// receiver, or detached agent).
    pub async fn send(&self, message: Message) -> Result<(), PostError> {
        self.sink.post(message).await
    }

    /// Starts an outbound message: sender set to this agent, scoped to this
    /// context's thread (when any).
    pub fn message(&self, performative: impl Into<String>) -> MessageBuilder {
        let mut builder = MessageBuilder::new(performative).from_agent(self.agent_id.clone());
        if let Some(thread_id) = self.thread_id {
            builder = builder.in_thread(thread_id);
        }
        builder
    }

    /// Starts an `inform` message to `receiver` within this context's thread.
    pub fn inform(&self, receiver: AgentId) -> MessageBuilder {
        self.message(colloquy_acl::performative::INFORM)
            .to_agent(receiver)
    }

    /// Starts a `request` message to `receiver` within this context's thread.
    pub fn request(&self, receiver: AgentId) -> MessageBuilder {
        self.message(colloquy_acl::performative::REQUEST)
            .to_agent(receiver)
    }

    /// Registers a behavior on the owning agent; returns its id immediately.
    ///
    /// Deferred: applied once the current delivery completes.
    pub fn add_behavior(&self, behavior: Box<dyn Behavior>) -> BehaviorId {
        let id = self.allocate_id();
        let _ = self.control.send(ControlOp::Add { id, behavior });
        id
    }

    /// Deregisters a behavior from the owning agent.
    ///
    /// Deferred, and idempotent like every removal: unknown or already
    /// removed ids are ignored.
    pub fn remove_behavior(&self, id: BehaviorId) {
        let _ = self.control.send(ControlOp::Remove { id });
    }

    /// Returns a context scoped to a freshly minted conversation thread.
    ///
    /// The usual way to start an exchange: fork, register a continuation for
    /// the new thread, send the opening message through the forked context.
    #[must_use]
    pub fn fork_thread(&self) -> AgentContext {
        self.for_thread(Some(Uuid::new_v4()))
    }

    /// Returns a context scoped to an existing conversation thread.
    #[must_use]
    pub fn in_thread(&self, thread_id: Uuid) -> AgentContext {
        self.for_thread(Some(thread_id))
    }

    /// Agent-scoped key-value state.
    pub fn storage(&self) -> Arc<dyn KeyValueStore> {
        self.storage.clone()
    }

    /// Key-value state scoped to this context's thread, if any.
    pub fn thread_storage(&self) -> Option<PrefixStore> {
        self.thread_id
            .map(|thread_id| PrefixStore::new(self.storage.clone(), thread_id.to_string()))
    }

    /// Clears every storage entry owned by this context's thread.
    ///
    /// A no-op for an unthreaded context.
    ///
    /// # Errors
    ///
    /// Propagates storage backend failures.
    pub async fn close_thread(&self) -> Result<(), StorageError> {
        match self.thread_storage() {
            Some(store) => store.close().await,
            None => Ok(()),
        }
    }

    pub(crate) fn for_thread(&self, thread_id: Option<Uuid>) -> AgentContext {
        let mut ctx = self.clone();
        ctx.thread_id = thread_id;
        ctx
    }

    pub(crate) fn allocate_id(&self) -> BehaviorId {
        BehaviorId::new(self.next_behavior_id.fetch_add(1, Ordering::Relaxed))
    }
}
