//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality across all integration tests
//! including:
//! - Test fixtures (agent identities, canned messages)
//! - Scripted probe behaviors that record what the runtime does with them

pub mod fixtures;
pub mod probes;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use probes::*;
