//! Static chain colliders for streamed terrain segments.

use crate::error::Result;
use crate::PhysicsWorld;
use engine_core::Vec2;
use rapier2d::prelude::RigidBodyHandle;

/// Terrain surface friction.
pub const TERRAIN_FRICTION: f32 = 1.0;
/// Terrain surface restitution.
pub const TERRAIN_RESTITUTION: f32 = 0.1;

/// Owns one static body per terrain segment so a restart can drop all of
/// them at once.
#[derive(Debug, Default)]
pub struct TerrainBody {
    segment_bodies: Vec<RigidBodyHandle>,
}

impl TerrainBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a segment as an open chain. Expects right-to-left winding so the
    /// surface normal faces up. Chains shorter than 2 points are skipped.
    pub fn add_segment(&mut self, world: &mut PhysicsWorld, points: &[Vec2]) -> Result<()> {
        if points.len() < 2 {
            log::debug!("skipping terrain chain with {} point(s)", points.len());
            return Ok(());
        }
        let body = world.add_static_body(Vec2::ZERO);
        if let Err(e) = world.add_chain_collider(body, points, TERRAIN_FRICTION, TERRAIN_RESTITUTION) {
            world.remove_body(body);
            return Err(e);
        }
        self.segment_bodies.push(body);
        Ok(())
    }

    /// Remove every segment (for restart).
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        for body in self.segment_bodies.drain(..) {
            world.remove_body(body);
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segment_bodies.len()
    }
}
