//! # colloquy-core
//!
//! Message dispatch core and in-process agent runtime for colloquy.
//!
//! This crate provides:
//! - Message templates and the two-level dispatch index (thread, then
//!   performative) that routes messages to behaviors
//! - The agent: behavior registry, delivery protocol, and serialized
//!   per-agent run loop
//! - The platform: agent hosting, in-process routing, and runtime events
//! - Conversation state storage with per-thread namespacing
//!
//! ## Modules
//!
//! - [`template`]: Message templates and predicates
//! - [`behavior`]: Behavior traits and the closure-backed [`ReactiveBehavior`]
//! - [`dispatch`]: Performative- and thread-level dispatch indexes
//! - [`agent`]: The agent, its context, and its handle
//! - [`platform`]: Agent hosting, routing, and runtime events
//! - [`storage`]: Key-value conversation state
//! - [`config`]: Runtime configuration loading

pub mod agent;
pub mod behavior;
pub mod config;
pub mod dispatch;
pub mod platform;
pub mod storage;
pub mod template;

pub use agent::{Agent, AgentContext, AgentHandle, AgentStopped, Delivery, DispatchError};
pub use behavior::{
    Behavior, BehaviorError, Completable, CompletionPolicy, Matchable, ReactiveBehavior,
};
pub use config::{ConfigError, ConfigResult, RuntimeConfig};
pub use dispatch::{BehaviorId, PerformativeDispatcher, RegisteredBehavior, ThreadDispatcher};
pub use platform::{MessageSink, Platform, PostError, Router, RuntimeEvent};
pub use storage::{InMemoryStore, KeyValueStore, PrefixStore, StorageError};
pub use template::{MessagePredicate, MessageTemplate, PredicateError};
