//! Tessera Core
//!
//! Shared plumbing for the Tessera crates: logging setup, profiling scopes,
//! hash collections and the math re-exports used by the renderer.

pub mod alloc;
pub mod logging;
pub mod math;
pub mod profiling;
