//! Core engine types shared by the disaster simulator crates.
//!
//! This crate provides the foundational types used across all systems:
//! - Transform and bounding volumes
//! - Time management
//! - Common component types for ECS

pub mod bounds;
pub mod components;
pub mod time;
pub mod transform;

pub use bounds::*;
pub use components::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{EulerRot, Quat, Vec2, Vec3};
pub use hecs::{Entity, World};
