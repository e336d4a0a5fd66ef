//! Physics system using Rapier2D for Textroll.

pub mod collision;
pub mod error;
pub mod physics_world;
pub mod soft_body;
pub mod terrain_body;

pub use collision::*;
pub use error::PhysicsError;
pub use physics_world::*;
pub use soft_body::*;
pub use terrain_body::*;

// Re-export Rapier for downstream crates
pub use rapier2d;

// Re-export common Rapier types
pub use rapier2d::prelude::{ColliderHandle, ImpulseJointHandle, RigidBodyHandle};
