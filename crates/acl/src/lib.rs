//! # colloquy-acl
//!
//! Agent communication language (ACL) definitions for colloquy.
//!
//! This crate defines the shared message vocabulary agents exchange:
//! - [`identity`]: Agent addressing (`AgentId`)
//! - [`message`]: The immutable ACL message value
//! - [`performative`]: Standard speech-act labels used as type-tags
//! - [`builder`]: Fluent construction of messages and replies
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, serde_json, thiserror, and uuid
//! - Pure data: No async, no I/O, no runtime types
//! - Independent compilation: No dependencies on other colloquy crates

pub mod builder;
pub mod identity;
pub mod message;
pub mod performative;

// Re-export all public types for convenience
pub use builder::*;
pub use identity::*;
pub use message::*;
