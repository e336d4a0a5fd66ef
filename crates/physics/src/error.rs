//! Physics adapter errors.

use rapier2d::prelude::{ImpulseJointHandle, RigidBodyHandle};
use thiserror::Error;

/// Failures the solver adapter cannot recover from locally. Any of these
/// ends the current run; callers propagate them.
#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("rigid body {0:?} is not in the world")]
    MissingBody(RigidBodyHandle),
    #[error("joint {0:?} is not in the world")]
    MissingJoint(ImpulseJointHandle),
    #[error("chain collider needs at least 2 points, got {0}")]
    DegenerateChain(usize),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
