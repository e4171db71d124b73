//! The agent: one dispatch index, one sequential execution context.
//!
//! This module provides:
//! - [`Agent`]: owns the two-level dispatch index and the behavior registry,
//!   implements the per-message delivery protocol, and runs the per-agent
//!   event loop
//! - [`AgentContext`]: the capability handle behaviors receive
//! - [`AgentHandle`]: the owner-side façade over a spawned agent
//!
//! Delivery to one agent is strictly serialized: the run loop owns the
//! `Agent` value outright and processes its bounded inbox one message at a
//! time, awaiting each delivery to completion. That serialization, rather
//! than a lock, is what lets behavior logic mutate the dispatch index freely.

pub mod context;
pub mod handle;

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use colloquy_acl::{AgentId, Message};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

pub use context::AgentContext;
pub use handle::{AgentHandle, AgentStopped};

use crate::behavior::{Behavior, BehaviorError};
use crate::dispatch::{BehaviorId, RegisteredBehavior, ThreadDispatcher};
use crate::platform::{MessageSink, NullSink, RuntimeEvent};
use crate::storage::{InMemoryStore, KeyValueStore};
use crate::template::PredicateError;

/// Requests applied by the run loop between deliveries.
pub(crate) enum ControlOp {
    Add {
        id: BehaviorId,
        behavior: Box<dyn Behavior>,
    },
    Remove {
        id: BehaviorId,
    },
    Stop,
}

/// Outcome of delivering one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A behavior received the message.
    Handled {
        /// The behavior that handled it.
        behavior: BehaviorId,
        /// Whether the behavior reported done afterwards and was retired.
        completed: bool,
    },

    /// No registered behavior matched; the message was discarded.
    ///
    /// Not a failure: the agent counts it and surfaces a runtime event.
    Unmatched,
}

/// Errors surfaced by the delivery protocol.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A custom template predicate failed during `find`; delivery of this
    /// message was aborted with the dispatch index unchanged.
    #[error("template predicate failed during dispatch")]
    Predicate(#[from] PredicateError),

    /// The matched behavior's handling logic failed. The behavior stays
    /// registered; its completion flag was not queried.
    #[error("behavior {id} failed while handling a message")]
    Behavior {
        id: BehaviorId,
        #[source]
        source: BehaviorError,
    },

    /// The index yielded an id the registry does not know; indicates a bug
    /// in index maintenance, not in caller code.
    #[error("dispatch index references unknown behavior {id}")]
    MissingBehavior { id: BehaviorId },
}

/// An addressable actor: dispatch index, behavior registry, and inbox.
///
/// Construct with [`Agent::new`], install initial behaviors with
/// [`Agent::add_behavior`], then either drive [`Agent::deliver`] directly
/// (tests, custom runtimes) or hand the value to [`Agent::run`] on its own
/// task and talk to it through the [`AgentHandle`]; platform registration
/// does the latter.
pub struct Agent {
    id: AgentId,
    dispatcher: ThreadDispatcher,
    behaviors: HashMap<BehaviorId, Box<dyn Behavior>>,
    inbox: mpsc::Receiver<Message>,
    control: mpsc::UnboundedReceiver<ControlOp>,
    ctx: AgentContext,
    events: Option<mpsc::Sender<RuntimeEvent>>,
    delivered: u64,
    unmatched: u64,
}

impl Agent {
    /// Creates an agent with a bounded inbox and returns it together with
    /// its handle.
    ///
    /// The agent starts detached (posting from behaviors fails) with its own
    /// in-memory storage; attach a fabric with [`Agent::with_sink`].
    /// `inbox_capacity` must be at least 1.
    pub fn new(id: AgentId, inbox_capacity: usize) -> (Self, AgentHandle) {
        let (inbox_tx, inbox_rx) = mpsc::channel(inbox_capacity);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let ctx = AgentContext {
            agent_id: id.clone(),
            thread_id: None,
            sink: Arc::new(NullSink),
            control: control_tx.clone(),
            next_behavior_id: Arc::new(AtomicU64::new(0)),
            storage: Arc::new(InMemoryStore::new()),
        };
        let handle = AgentHandle::new(
            id.clone(),
            inbox_tx,
            control_tx,
            ctx.next_behavior_id.clone(),
        );
        let agent = Self {
            id,
            dispatcher: ThreadDispatcher::new(),
            behaviors: HashMap::new(),
            inbox: inbox_rx,
            control: control_rx,
            ctx,
            events: None,
            delivered: 0,
            unmatched: 0,
        };
        (agent, handle)
    }

    /// Attaches the egress sink behaviors post through.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.ctx.sink = sink;
        self
    }

    /// Replaces the agent-scoped key-value storage.
    #[must_use]
    pub fn with_storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.ctx.storage = storage;
        self
    }

    /// Attaches the runtime event channel (best-effort observability).
    #[must_use]
    pub fn with_events(mut self, events: mpsc::Sender<RuntimeEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Identity of this agent.
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    /// An unthreaded context for this agent, as behaviors receive it.
    pub fn context(&self) -> AgentContext {
        self.ctx.clone()
    }

    /// Number of currently registered behaviors.
    pub fn behavior_count(&self) -> usize {
        self.behaviors.len()
    }

    /// Messages delivered to a behavior so far.
    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }

    /// Messages discarded because nothing matched.
    pub fn unmatched_count(&self) -> u64 {
        self.unmatched
    }

    /// Registers a behavior, immediately visible to the next `find`.
    pub fn add_behavior(&mut self, behavior: Box<dyn Behavior>) -> BehaviorId {
        let id = self.ctx.allocate_id();
        self.insert_behavior(id, behavior);
        id
    }

    /// Deregisters a behavior. Idempotent: unknown ids are ignored.
    pub fn remove_behavior(&mut self, id: BehaviorId) {
        if let Some(behavior) = self.behaviors.remove(&id) {
            self.dispatcher.remove(id, behavior.template());
            trace!(agent = %self.id, behavior = %id, "behavior removed");
        }
    }

    /// Delivers one message: find, handle, retire-if-done.
    ///
    /// 1. `find` walks the two-level index (exact thread, then wildcard;
    ///    exact performative, then wildcard; insertion order within a slot).
    /// 2. No match: the message is discarded and counted, and
    ///    `Ok(Delivery::Unmatched)` is returned.
    /// 3. A match: the behavior's `on_message` runs to completion within this
    ///    call; no other message for this agent is processed meanwhile.
    /// 4. After a successful handling, `is_done()` decides whether the
    ///    behavior is retired from index and registry.
    ///
    /// Deferred context ops (behavior add/remove issued during handling) are
    /// applied before this call returns, so they are visible to the next
    /// `deliver` regardless of how the agent is driven.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`]; failures never leave the index half-mutated.
    pub async fn deliver(&mut self, message: Message) -> Result<Delivery, DispatchError> {
        let outcome = self.dispatch(message).await;
        self.drain_control();
        outcome
    }

    /// Consumes the agent, processing its inbox until stopped.
    ///
    /// Control traffic is preferred over inbox traffic; each message is
    /// delivered to completion before the next is taken. Spawn this on its
    /// own task:
    ///
    /// ```no_run
    /// # use colloquy_acl::AgentId;
    /// # use colloquy_core::agent::Agent;
    /// let (agent, handle) = Agent::new(AgentId::new("echo", "e-1"), 50);
    /// tokio::spawn(agent.run());
    /// ```
    pub async fn run(mut self) {
        info!(agent = %self.id, "agent started");
        loop {
            tokio::select! {
                biased;
                Some(op) = self.control.recv() => self.apply(op),
                message = self.inbox.recv() => match message {
                    Some(message) => self.process(message).await,
                    None => break,
                },
            }
        }
        info!(
            agent = %self.id,
            delivered = self.delivered,
            unmatched = self.unmatched,
            "agent stopped"
        );
        self.emit(RuntimeEvent::AgentStopped {
            agent: self.id.clone(),
            delivered: self.delivered,
            unmatched: self.unmatched,
        });
    }

    async fn process(&mut self, message: Message) {
        match self.deliver(message).await {
            Ok(Delivery::Handled {
                behavior,
                completed,
            }) => {
                trace!(agent = %self.id, behavior = %behavior, completed, "message handled");
            }
            Ok(Delivery::Unmatched) => {}
            Err(error) => {
                // Failure policy of this runtime: report and move on; the
                // behavior (if any) stays registered.
                let behavior = match &error {
                    DispatchError::Behavior { id, .. } => Some(*id),
                    _ => None,
                };
                warn!(agent = %self.id, error = %error, "delivery failed");
                self.emit(RuntimeEvent::DeliveryFailed {
                    agent: self.id.clone(),
                    behavior,
                    error: error.to_string(),
                });
            }
        }
    }

    async fn dispatch(&mut self, message: Message) -> Result<Delivery, DispatchError> {
        let Some(behavior_id) = self.dispatcher.find(&message)? else {
            self.unmatched += 1;
            debug!(
                agent = %self.id,
                performative = %message.performative,
                thread = ?message.thread_id,
                "no behavior matched; message dropped"
            );
            self.emit(RuntimeEvent::MessageUnmatched {
                agent: self.id.clone(),
                message,
            });
            return Ok(Delivery::Unmatched);
        };

        let ctx = self.ctx.for_thread(message.thread_id);
        let done = {
            let behavior = self
                .behaviors
                .get_mut(&behavior_id)
                .ok_or(DispatchError::MissingBehavior { id: behavior_id })?;
            behavior
                .on_message(&ctx, &message)
                .await
                .map_err(|source| DispatchError::Behavior {
                    id: behavior_id,
                    source,
                })?;
            behavior.is_done()
        };
        self.delivered += 1;

        if done {
            self.remove_behavior(behavior_id);
            self.emit(RuntimeEvent::BehaviorCompleted {
                agent: self.id.clone(),
                behavior: behavior_id,
            });
        }
        Ok(Delivery::Handled {
            behavior: behavior_id,
            completed: done,
        })
    }

    fn insert_behavior(&mut self, id: BehaviorId, behavior: Box<dyn Behavior>) {
        self.dispatcher
            .add(RegisteredBehavior::new(id, behavior.template().clone()));
        self.behaviors.insert(id, behavior);
        trace!(agent = %self.id, behavior = %id, "behavior registered");
    }

    fn apply(&mut self, op: ControlOp) {
        match op {
            ControlOp::Add { id, behavior } => self.insert_behavior(id, behavior),
            ControlOp::Remove { id } => self.remove_behavior(id),
            ControlOp::Stop => {
                debug!(agent = %self.id, "stop requested; closing inbox");
                self.inbox.close();
            }
        }
    }

    fn drain_control(&mut self) {
        while let Ok(op) = self.control.try_recv() {
            self.apply(op);
        }
    }

    fn emit(&self, event: RuntimeEvent) {
        if let Some(events) = &self.events {
            // Best-effort: observers never slow dispatch down.
            let _ = events.try_send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{Completable, CompletionPolicy, Matchable, ReactiveBehavior};
    use crate::template::MessageTemplate;
    use async_trait::async_trait;
    use colloquy_acl::MessageBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Scripted behavior recording how the engine drives it.
    struct Probe {
        template: MessageTemplate,
        complete_after: Option<usize>,
        fail: bool,
        handled: Arc<AtomicUsize>,
        done_queries: Arc<AtomicUsize>,
    }

    impl Probe {
        fn standing(template: MessageTemplate) -> Self {
            Self {
                template,
                complete_after: None,
                fail: false,
                handled: Arc::new(AtomicUsize::new(0)),
                done_queries: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn one_shot(template: MessageTemplate) -> Self {
            Self {
                complete_after: Some(1),
                ..Self::standing(template)
            }
        }

        fn failing(template: MessageTemplate) -> Self {
            Self {
                fail: true,
                ..Self::standing(template)
            }
        }

        fn handled(&self) -> Arc<AtomicUsize> {
            self.handled.clone()
        }

        fn done_queries(&self) -> Arc<AtomicUsize> {
            self.done_queries.clone()
        }
    }

    impl Matchable for Probe {
        fn template(&self) -> &MessageTemplate {
            &self.template
        }
    }

    impl Completable for Probe {
        fn is_done(&self) -> bool {
            self.done_queries.fetch_add(1, Ordering::SeqCst);
            self.complete_after
                .map_or(false, |n| self.handled.load(Ordering::SeqCst) >= n)
        }
    }

    #[async_trait]
    impl Behavior for Probe {
        async fn on_message(
            &mut self,
            _ctx: &AgentContext,
            _message: &Message,
        ) -> Result<(), BehaviorError> {
            if self.fail {
                return Err(BehaviorError::failed("probe failure"));
            }
            self.handled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn agent() -> Agent {
        Agent::new(AgentId::new("worker", "w-1"), 8).0
    }

    fn msg(performative: &str) -> Message {
        MessageBuilder::new(performative)
            .from_agent(AgentId::new("peer", "p-1"))
            .to_agent(AgentId::new("worker", "w-1"))
            .with_content("{}")
            .expect("complete message")
    }

    fn msg_in_thread(performative: &str, thread: Uuid) -> Message {
        MessageBuilder::new(performative)
            .from_agent(AgentId::new("peer", "p-1"))
            .to_agent(AgentId::new("worker", "w-1"))
            .in_thread(thread)
            .with_content("{}")
            .expect("complete message")
    }

    #[tokio::test]
    async fn unmatched_message_is_discarded_and_counted() {
        let mut agent = agent();

        let outcome = agent.deliver(msg("inform")).await.expect("not an error");

        assert_eq!(outcome, Delivery::Unmatched);
        assert_eq!(agent.unmatched_count(), 1);
        assert_eq!(agent.delivered_count(), 0);
    }

    #[tokio::test]
    async fn one_shot_behavior_is_retired_after_first_delivery() {
        let mut agent = agent();
        let probe = Probe::one_shot(MessageTemplate::inform());
        let handled = probe.handled();
        let id = agent.add_behavior(Box::new(probe));

        let outcome = agent.deliver(msg("inform")).await.expect("delivered");
        assert_eq!(
            outcome,
            Delivery::Handled {
                behavior: id,
                completed: true
            }
        );
        assert_eq!(handled.load(Ordering::SeqCst), 1);
        assert_eq!(agent.behavior_count(), 0);

        // The next matching message finds nothing.
        let outcome = agent.deliver(msg("inform")).await.expect("not an error");
        assert_eq!(outcome, Delivery::Unmatched);
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn standing_behavior_keeps_matching() {
        let mut agent = agent();
        let probe = Probe::standing(MessageTemplate::inform());
        let handled = probe.handled();
        agent.add_behavior(Box::new(probe));

        for _ in 0..3 {
            agent.deliver(msg("inform")).await.expect("delivered");
        }

        assert_eq!(handled.load(Ordering::SeqCst), 3);
        assert_eq!(agent.behavior_count(), 1);
    }

    #[tokio::test]
    async fn failed_handling_skips_completion_and_removal() {
        let mut agent = agent();
        let probe = Probe::failing(MessageTemplate::inform());
        let done_queries = probe.done_queries();
        let id = agent.add_behavior(Box::new(probe));

        let err = agent.deliver(msg("inform")).await.expect_err("handler fails");

        assert!(matches!(err, DispatchError::Behavior { id: failed, .. } if failed == id));
        assert_eq!(done_queries.load(Ordering::SeqCst), 0);
        assert_eq!(agent.behavior_count(), 1);
        assert_eq!(agent.delivered_count(), 0);
    }

    #[tokio::test]
    async fn predicate_error_aborts_delivery_with_index_unchanged() {
        let mut agent = agent();
        agent.add_behavior(Box::new(Probe::standing(
            MessageTemplate::inform().with_predicate(|_| Err(PredicateError::new("broken"))),
        )));

        let err = agent.deliver(msg("inform")).await.expect_err("predicate fails");

        assert!(matches!(err, DispatchError::Predicate(_)));
        assert_eq!(agent.behavior_count(), 1);
        assert_eq!(agent.unmatched_count(), 0);
    }

    #[tokio::test]
    async fn follow_up_registered_during_handling_is_visible_to_next_delivery() {
        let mut agent = agent();
        let follow_up_handled = Arc::new(AtomicUsize::new(0));
        let follow_up_probe = follow_up_handled.clone();

        agent.add_behavior(Box::new(ReactiveBehavior::one_shot(
            MessageTemplate::request(),
            move |ctx, message| {
                let follow_up_probe = follow_up_probe.clone();
                async move {
                    let thread = message.thread_id.ok_or_else(|| {
                        BehaviorError::failed("request must carry a thread")
                    })?;
                    ctx.add_behavior(Box::new(ReactiveBehavior::one_shot(
                        MessageTemplate::inform().in_thread(thread),
                        move |_, _| {
                            let follow_up_probe = follow_up_probe.clone();
                            async move {
                                follow_up_probe.fetch_add(1, Ordering::SeqCst);
                                Ok(())
                            }
                        },
                    )));
                    Ok(())
                }
            },
        )));

        let thread = Uuid::new_v4();
        agent
            .deliver(msg_in_thread("request", thread))
            .await
            .expect("opener delivered");
        // The opener completed; only the follow-up remains.
        assert_eq!(agent.behavior_count(), 1);

        agent
            .deliver(msg_in_thread("inform", thread))
            .await
            .expect("continuation delivered");

        assert_eq!(follow_up_handled.load(Ordering::SeqCst), 1);
        assert_eq!(agent.behavior_count(), 0);
    }

    #[tokio::test]
    async fn context_removal_is_deferred_and_idempotent() {
        let mut agent = agent();
        let standing = agent.add_behavior(Box::new(Probe::standing(MessageTemplate::inform())));

        agent.add_behavior(Box::new(ReactiveBehavior::one_shot(
            MessageTemplate::request(),
            move |ctx, _message| async move {
                ctx.remove_behavior(standing);
                ctx.remove_behavior(standing);
                Ok(())
            },
        )));

        agent.deliver(msg("request")).await.expect("remover ran");

        assert_eq!(agent.behavior_count(), 0);
        let outcome = agent.deliver(msg("inform")).await.expect("not an error");
        assert_eq!(outcome, Delivery::Unmatched);
    }

    #[tokio::test]
    async fn direct_removal_is_idempotent() {
        let mut agent = agent();
        let id = agent.add_behavior(Box::new(Probe::standing(MessageTemplate::inform())));

        agent.remove_behavior(id);
        agent.remove_behavior(id);

        assert_eq!(agent.behavior_count(), 0);
    }

    #[tokio::test]
    async fn deliveries_reach_behaviors_in_order() {
        let mut agent = agent();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        agent.add_behavior(Box::new(ReactiveBehavior::standing(
            MessageTemplate::new(),
            move |_, message| {
                let sink = sink.clone();
                async move {
                    sink.lock()
                        .map_err(|_| BehaviorError::failed("poisoned log"))?
                        .push(message.content.clone());
                    Ok(())
                }
            },
        )));

        for content in ["first", "second", "third"] {
            let message = MessageBuilder::inform()
                .from_agent(AgentId::new("peer", "p-1"))
                .to_agent(AgentId::new("worker", "w-1"))
                .with_content(content)
                .expect("complete message");
            agent.deliver(message).await.expect("delivered");
        }

        let seen = log.lock().expect("log intact").clone();
        assert_eq!(seen, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn unmatched_messages_surface_as_runtime_events() {
        let (events_tx, mut events_rx) = mpsc::channel(8);
        let (agent, _handle) = Agent::new(AgentId::new("worker", "w-1"), 8);
        let mut agent = agent.with_events(events_tx);

        agent.deliver(msg("inform")).await.expect("not an error");

        match events_rx.try_recv().expect("event emitted") {
            RuntimeEvent::MessageUnmatched { agent: id, message } => {
                assert_eq!(id, AgentId::new("worker", "w-1"));
                assert_eq!(message.performative, "inform");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn completion_policy_names_the_two_lifecycles() {
        // Spot check that the closure-backed construction picks the policy up.
        let one_shot = ReactiveBehavior::one_shot(MessageTemplate::new(), |_, _| async { Ok(()) });
        let standing = ReactiveBehavior::standing(MessageTemplate::new(), |_, _| async { Ok(()) });
        assert_eq!(one_shot.policy(), CompletionPolicy::OneShot);
        assert_eq!(standing.policy(), CompletionPolicy::Standing);
    }
}
