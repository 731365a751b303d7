//! Instanced sprite batching.
//!
//! Each frame the [`BatchRenderer`] turns the scene queues into a
//! [`FramePlan`], uploads the packed [`SpriteInstance`]s and records at most
//! two passes:
//!
//! 1. **Opaque**: depth test `Less`, no blending, submission order.
//! 2. **Transparent**: depth test `LessEqual`, alpha blending, farthest first.
//!
//! In the default texture-array mode each pass is a single instanced draw.

mod plan;
mod renderer;
mod sort;
mod types;

pub use plan::FramePlan;
pub use renderer::BatchRenderer;
pub use sort::back_to_front;
pub use types::{DrawGroup, FrameStats, SpriteInstance};
