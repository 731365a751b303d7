//! Math types used across Tessera.
//!
//! Re-exports the [`glam`] types the sprite pipeline works with so downstream
//! crates do not need their own `glam` dependency.
//!
//! ```
//! use tessera_core::math::{Mat4, Vec2, Vec3};
//!
//! let position = Vec2::new(10.0, 20.0);
//! let transform = Mat4::from_translation(Vec3::new(-position.x, -position.y, 0.0));
//! assert_eq!(transform.transform_point3(Vec3::new(10.0, 20.0, 0.5)), Vec3::new(0.0, 0.0, 0.5));
//! ```
//!
//! [`glam`]: https://docs.rs/glam

pub use glam::{Mat2, Mat4, Vec2, Vec3, Vec4};
