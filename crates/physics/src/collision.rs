//! Collision groups and filtering.

use rapier2d::prelude::*;

/// Collision groups for the two kinds of colliders in the world.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Static terrain chains
    Terrain = 1 << 0,
    /// Soft-body core and rim masses
    Ball = 1 << 1,
}

impl CollisionGroup {
    /// Terrain collides with everything.
    pub fn terrain() -> InteractionGroups {
        InteractionGroups::new(Group::from_bits_retain(Self::Terrain as u32), Group::ALL)
    }

    /// Ball parts only touch terrain, never each other. Ring and spoke
    /// joints already disable contacts between connected pairs; this also
    /// covers non-adjacent rims squeezed together during compression.
    pub fn ball() -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_retain(Self::Ball as u32),
            Group::from_bits_retain(Self::Terrain as u32),
        )
    }
}
