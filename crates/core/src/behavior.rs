//! Behaviors: the reactive units an agent registers against its dispatch
//! index.
//!
//! A behavior couples three capabilities, expressed as separate traits so
//! concrete types compose them structurally instead of inheriting them:
//! - [`Matchable`]: which messages it wants (a [`MessageTemplate`]);
//! - [`Completable`]: whether it has finished and should be retired;
//! - [`Behavior::on_message`]: what it does with a matched message.
//!
//! The engine never encodes "one-shot vs. standing" structurally; it only
//! consults `is_done()` after each successful handling. For the common cases
//! [`ReactiveBehavior`] wraps an async closure and a [`CompletionPolicy`]
//! chosen at construction.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use colloquy_acl::{Message, MessageBuildError};
use thiserror::Error;

use crate::agent::AgentContext;
use crate::platform::PostError;
use crate::storage::StorageError;
use crate::template::MessageTemplate;

/// Errors a behavior may surface from its handling logic.
///
/// A failed handling leaves the behavior registered: the engine does not
/// query `is_done()` and performs no removal for that delivery, so the
/// behavior keeps receiving matching messages unless the surrounding runtime
/// decides otherwise.
#[derive(Debug, Error)]
pub enum BehaviorError {
    /// An outbound message could not be posted to the fabric.
    #[error("failed to post outbound message")]
    Post(#[from] PostError),

    /// An outbound message could not be assembled.
    #[error("failed to build outbound message")]
    Build(#[from] MessageBuildError),

    /// A storage operation failed.
    #[error("storage operation failed")]
    Storage(#[from] StorageError),

    /// The message payload could not be interpreted.
    #[error("failed to interpret message payload")]
    Payload(#[from] serde_json::Error),

    /// Domain-specific failure described by the behavior itself.
    #[error("{0}")]
    Failed(String),
}

impl BehaviorError {
    /// Creates a domain-specific failure with the given description.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Exposes the template a unit wants its messages filtered by.
pub trait Matchable {
    /// The filter this unit registered with; fixed for its lifetime.
    fn template(&self) -> &MessageTemplate;
}

/// Exposes whether a unit has completed its work.
pub trait Completable {
    /// Queried by the engine immediately after each successful handling;
    /// `true` retires the unit from the dispatch index.
    fn is_done(&self) -> bool;
}

/// A registered reactive unit: template, completion flag, and handling logic.
///
/// Implementations may keep internal state across invocations; the engine
/// guarantees `on_message` is never called concurrently for the same agent,
/// so no internal locking is needed.
#[async_trait]
pub trait Behavior: Matchable + Completable + Send {
    /// Reacts to one matched message.
    ///
    /// Called at most once per matched message, synchronously with respect to
    /// the owning agent's execution context. The context carries the current
    /// message's thread, so replies and follow-up registrations land in the
    /// right conversation.
    ///
    /// # Errors
    ///
    /// An error aborts this delivery only; see [`BehaviorError`] for the
    /// lifecycle consequences.
    async fn on_message(
        &mut self,
        ctx: &AgentContext,
        message: &Message,
    ) -> Result<(), BehaviorError>;
}

/// When a closure-backed behavior considers itself done.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Never done; the behavior persists until explicitly removed.
    Standing,

    /// Done after the first successfully handled message.
    OneShot,
}

type BoxedHandler = Box<
    dyn FnMut(
            AgentContext,
            Message,
        ) -> Pin<Box<dyn Future<Output = Result<(), BehaviorError>> + Send>>
        + Send,
>;

/// Closure-backed behavior with a completion policy chosen at construction.
///
/// Covers the two ubiquitous shapes without new types: a standing listener
/// (`CompletionPolicy::Standing`) and a one-shot continuation
/// (`CompletionPolicy::OneShot`).
///
/// # Example
///
/// ```no_run
/// use colloquy_core::behavior::ReactiveBehavior;
/// use colloquy_core::template::MessageTemplate;
///
/// let echo = ReactiveBehavior::standing(MessageTemplate::request(), |ctx, msg| async move {
///     ctx.send(
///         ctx.message("inform")
///             .to_agent(msg.sender.clone())
///             .with_content(msg.content.clone())?,
///     )
///     .await?;
///     Ok(())
/// });
/// ```
pub struct ReactiveBehavior {
    template: MessageTemplate,
    policy: CompletionPolicy,
    handled: bool,
    handler: BoxedHandler,
}

impl ReactiveBehavior {
    /// Creates a behavior from a template, a completion policy, and an async
    /// handler closure.
    pub fn new<F, Fut>(template: MessageTemplate, policy: CompletionPolicy, mut handler: F) -> Self
    where
        F: FnMut(AgentContext, Message) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BehaviorError>> + Send + 'static,
    {
        Self {
            template,
            policy,
            handled: false,
            handler: Box::new(move |ctx, message| Box::pin(handler(ctx, message))),
        }
    }

    /// Creates a standing behavior (never done).
    pub fn standing<F, Fut>(template: MessageTemplate, handler: F) -> Self
    where
        F: FnMut(AgentContext, Message) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BehaviorError>> + Send + 'static,
    {
        Self::new(template, CompletionPolicy::Standing, handler)
    }

    /// Creates a one-shot behavior (done after the first handled message).
    pub fn one_shot<F, Fut>(template: MessageTemplate, handler: F) -> Self
    where
        F: FnMut(AgentContext, Message) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BehaviorError>> + Send + 'static,
    {
        Self::new(template, CompletionPolicy::OneShot, handler)
    }

    /// The completion policy this behavior was built with.
    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }
}

impl Matchable for ReactiveBehavior {
    fn template(&self) -> &MessageTemplate {
        &self.template
    }
}

impl Completable for ReactiveBehavior {
    fn is_done(&self) -> bool {
        self.policy == CompletionPolicy::OneShot && self.handled
    }
}

#[async_trait]
impl Behavior for ReactiveBehavior {
    async fn on_message(
        &mut self,
        ctx: &AgentContext,
        message: &Message,
    ) -> Result<(), BehaviorError> {
        // The closure gets owned copies so its future is independent of the
        // engine's borrows.
        (self.handler)(ctx.clone(), message.clone()).await?;
        self.handled = true;
        Ok(())
    }
}
