//! Deformable ring-and-spoke ball.
//!
//! A heavy core body sits in the middle of `RIM_COUNT` light rim bodies laid
//! out on a circle. Neighbouring rims are joined by ring springs and every
//! rim is joined to the core by a spoke spring. All springs are soft with
//! hard length limits, so the ball squashes on impact and recovers.
//!
//! Jumping is a three-phase charge: `start_compression` begins the charge,
//! `update_compression` shortens the spokes while the button is held, and
//! `release_jump` restores them and launches the ball if it is touching
//! terrain.

use crate::error::Result;
use crate::physics_world::{BodyDesc, DistanceSpring, Material};
use crate::PhysicsWorld;
use engine_core::Vec2;
use rapier2d::prelude::{ColliderHandle, ImpulseJointHandle, RigidBodyHandle};

/// Number of rim masses.
pub const RIM_COUNT: usize = 12;
/// Nominal distance from the core to each rim mass.
pub const BALL_RADIUS: f32 = 0.5;

/// Tuning for the soft body. Defaults are the shipped values.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftBodyConfig {
    pub radius: f32,
    pub core_radius: f32,
    pub rim_radius: f32,
    pub core_material: Material,
    pub rim_material: Material,
    pub core_linear_damping: f32,
    pub core_angular_damping: f32,
    pub rim_linear_damping: f32,
    /// Resonance frequency of ring and spoke springs (Hz).
    pub spring_hertz: f32,
    pub spring_damping: f32,
    /// Ring spring limits as fractions of rest length.
    pub ring_limits: (f32, f32),
    /// Spoke spring limits as fractions of rest length.
    pub spoke_limits: (f32, f32),
    pub move_force: f32,
    pub roll_torque: f32,
    pub max_compression_time: f32,
    /// Fraction of spoke length removed at full charge.
    pub compression_rate: f32,
    /// Per-tick multiplier on core horizontal velocity while charging.
    pub compression_velocity_damping: f32,
    pub jump_impulse: f32,
    /// Extra impulse scale gained at full charge.
    pub jump_charge_bonus: f32,
    pub jump_directional_impulse: f32,
    /// Share of current horizontal velocity carried into a steered jump.
    pub jump_momentum_carry: f32,
    /// Share of current horizontal velocity carried into a neutral jump.
    pub jump_idle_momentum_carry: f32,
    pub input_dead_zone: f32,
}

impl Default for SoftBodyConfig {
    fn default() -> Self {
        Self {
            radius: BALL_RADIUS,
            core_radius: 0.15,
            rim_radius: 0.15,
            core_material: Material {
                density: 2.0,
                friction: 0.6,
                restitution: 0.3,
            },
            rim_material: Material {
                density: 0.5,
                friction: 1.0,
                restitution: 0.3,
            },
            core_linear_damping: 0.5,
            core_angular_damping: 0.3,
            rim_linear_damping: 0.3,
            spring_hertz: 12.0,
            spring_damping: 0.9,
            ring_limits: (0.5, 1.5),
            spoke_limits: (0.5, 1.2),
            move_force: 8.0,
            roll_torque: 7.5,
            max_compression_time: 0.5,
            compression_rate: 0.3,
            compression_velocity_damping: 0.95,
            jump_impulse: 3.0,
            jump_charge_bonus: 1.15,
            jump_directional_impulse: 1.15,
            jump_momentum_carry: 0.3,
            jump_idle_momentum_carry: 0.2,
            input_dead_zone: 0.1,
        }
    }
}

/// The player's ball. Owns its bodies and joints inside a `PhysicsWorld`
/// and must be torn down with `destroy`.
#[derive(Debug)]
pub struct SoftBody {
    config: SoftBodyConfig,
    core: RigidBodyHandle,
    rims: [RigidBodyHandle; RIM_COUNT],
    rim_colliders: [ColliderHandle; RIM_COUNT],
    /// `ring_joints[i]` joins rim `i` to rim `(i + 1) % RIM_COUNT`.
    ring_joints: [ImpulseJointHandle; RIM_COUNT],
    /// `spoke_joints[i]` joins the core to rim `i`.
    spoke_joints: [ImpulseJointHandle; RIM_COUNT],
    /// Seconds of charge while compressing, `None` otherwise.
    compression: Option<f32>,
    spoke_rest_length: f32,
}

impl SoftBody {
    /// Build the ball centred on `start`.
    pub fn spawn(world: &mut PhysicsWorld, start: Vec2, config: SoftBodyConfig) -> Self {
        let core = world.add_dynamic_body(BodyDesc {
            position: start,
            linear_damping: config.core_linear_damping,
            angular_damping: config.core_angular_damping,
            ccd: false,
        });
        world.add_ball_collider(core, config.core_radius, config.core_material);

        let rim_positions: [Vec2; RIM_COUNT] = std::array::from_fn(|i| {
            let angle = std::f32::consts::TAU * i as f32 / RIM_COUNT as f32;
            start + Vec2::from_angle(angle) * config.radius
        });

        let mut rim_colliders = Vec::with_capacity(RIM_COUNT);
        let rims: [RigidBodyHandle; RIM_COUNT] = std::array::from_fn(|i| {
            let rim = world.add_dynamic_body(BodyDesc {
                position: rim_positions[i],
                linear_damping: config.rim_linear_damping,
                angular_damping: 0.0,
                ccd: true,
            });
            rim_colliders.push(world.add_ball_collider(rim, config.rim_radius, config.rim_material));
            rim
        });
        let rim_colliders: [ColliderHandle; RIM_COUNT] = std::array::from_fn(|i| rim_colliders[i]);

        let (ring_min, ring_max) = config.ring_limits;
        let ring_joints = std::array::from_fn(|i| {
            let next = (i + 1) % RIM_COUNT;
            let length = rim_positions[i].distance(rim_positions[next]);
            world.add_distance_spring(
                rims[i],
                rims[next],
                DistanceSpring::bounded(length, config.spring_hertz, config.spring_damping, ring_min, ring_max),
            )
        });

        let (spoke_min, spoke_max) = config.spoke_limits;
        let spoke_joints = std::array::from_fn(|i| {
            world.add_distance_spring(
                core,
                rims[i],
                DistanceSpring::bounded(
                    config.radius,
                    config.spring_hertz,
                    config.spring_damping,
                    spoke_min,
                    spoke_max,
                ),
            )
        });

        log::debug!("spawned soft body at ({:.2}, {:.2})", start.x, start.y);

        Self {
            spoke_rest_length: config.radius,
            config,
            core,
            rims,
            rim_colliders,
            ring_joints,
            spoke_joints,
            compression: None,
        }
    }

    /// Push the core sideways. `direction` is -1.0 for left, 1.0 for right.
    /// Rolling comes from rim friction against the terrain, not from
    /// setting velocities.
    pub fn apply_movement(&self, world: &mut PhysicsWorld, direction: f32) -> Result<()> {
        world.apply_force(self.core, Vec2::new(direction * self.config.move_force, 0.0))?;
        world.apply_torque(self.core, direction * self.config.roll_torque)
    }

    /// Begin charging a jump. Restarts the charge if already compressing.
    pub fn start_compression(&mut self) {
        self.compression = Some(0.0);
    }

    /// Advance the charge while the jump button is held.
    pub fn update_compression(&mut self, world: &mut PhysicsWorld, dt: f32) -> Result<()> {
        let Some(elapsed) = self.compression else {
            return Ok(());
        };
        let elapsed = (elapsed + dt).min(self.config.max_compression_time);
        self.compression = Some(elapsed);

        let progress = elapsed / self.config.max_compression_time;
        let length = self.config.radius * (1.0 - progress * self.config.compression_rate);
        self.set_spoke_lengths(world, length)?;

        // Bleed horizontal speed so the jump can be aimed.
        let mut velocity = world.linear_velocity(self.core)?;
        velocity.x *= self.config.compression_velocity_damping;
        world.set_linear_velocity(self.core, velocity)
    }

    /// Finish the charge. Spokes snap back to full length; the ball is
    /// launched only if a rim is touching terrain. Returns whether an
    /// impulse was applied.
    pub fn release_jump(&mut self, world: &mut PhysicsWorld, input_direction: f32) -> Result<bool> {
        let Some(elapsed) = self.compression.take() else {
            return Ok(false);
        };
        self.set_spoke_lengths(world, self.config.radius)?;

        if !self.is_on_ground(world) {
            return Ok(false);
        }

        let velocity = world.linear_velocity(self.core)?;
        let scale = 1.0 + (elapsed / self.config.max_compression_time) * self.config.jump_charge_bonus;
        let vertical = self.config.jump_impulse * scale;
        let horizontal = if input_direction.abs() > self.config.input_dead_zone {
            input_direction * self.config.jump_directional_impulse * scale
                + velocity.x * self.config.jump_momentum_carry
        } else {
            velocity.x * self.config.jump_idle_momentum_carry
        };

        world.apply_impulse(self.core, Vec2::new(horizontal, vertical))?;
        log::debug!("jump released after {elapsed:.2}s: impulse ({horizontal:.2}, {vertical:.2})");
        Ok(true)
    }

    fn set_spoke_lengths(&mut self, world: &mut PhysicsWorld, length: f32) -> Result<()> {
        for joint in self.spoke_joints {
            world.set_joint_rest_length(joint, length)?;
        }
        self.spoke_rest_length = length;
        Ok(())
    }

    /// True if any rim mass is touching terrain.
    pub fn is_on_ground(&self, world: &PhysicsWorld) -> bool {
        self.rim_colliders
            .iter()
            .any(|&collider| world.has_active_contact(collider))
    }

    pub fn center_position(&self, world: &PhysicsWorld) -> Result<Vec2> {
        world.body_position(self.core)
    }

    /// Rim positions in rim-index order.
    pub fn rim_positions(&self, world: &PhysicsWorld) -> Result<Vec<Vec2>> {
        self.rims
            .iter()
            .map(|&rim| world.body_position(rim))
            .collect()
    }

    /// Rim positions sorted by angle around the core. Rims can cross over
    /// each other under heavy deformation; sorting keeps the hull simple.
    pub fn outline(&self, world: &PhysicsWorld) -> Result<Vec<Vec2>> {
        let center = self.center_position(world)?;
        let mut rims = self.rim_positions(world)?;
        rims.sort_by(|a, b| {
            let angle_a = (*a - center).to_angle();
            let angle_b = (*b - center).to_angle();
            angle_a.total_cmp(&angle_b)
        });
        Ok(rims)
    }

    /// Magnitude of the core's linear velocity.
    pub fn speed(&self, world: &PhysicsWorld) -> Result<f32> {
        Ok(world.linear_velocity(self.core)?.length())
    }

    pub fn core_handle(&self) -> RigidBodyHandle {
        self.core
    }

    pub fn is_compressing(&self) -> bool {
        self.compression.is_some()
    }

    /// Seconds of charge, 0 when not compressing.
    pub fn compression_time(&self) -> f32 {
        self.compression.unwrap_or(0.0)
    }

    /// Rest length last applied to every spoke.
    pub fn spoke_rest_length(&self) -> f32 {
        self.spoke_rest_length
    }

    pub fn spoke_joints(&self) -> &[ImpulseJointHandle; RIM_COUNT] {
        &self.spoke_joints
    }

    pub fn config(&self) -> &SoftBodyConfig {
        &self.config
    }

    /// Remove every joint and body belonging to the ball.
    pub fn destroy(self, world: &mut PhysicsWorld) {
        self.remove_parts(world);
    }

    /// Replace this ball with a fresh one at `start`. The old parts leave
    /// the world before the new ones are added.
    pub fn respawn(&mut self, world: &mut PhysicsWorld, start: Vec2) {
        self.remove_parts(world);
        *self = Self::spawn(world, start, self.config.clone());
    }

    fn remove_parts(&self, world: &mut PhysicsWorld) {
        for &joint in self.ring_joints.iter().chain(&self.spoke_joints) {
            world.remove_joint(joint);
        }
        world.remove_body(self.core);
        for &rim in &self.rims {
            world.remove_body(rim);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TerrainBody;

    const DT: f32 = 1.0 / 60.0;

    fn flat_ground(world: &mut PhysicsWorld) -> TerrainBody {
        let mut terrain = TerrainBody::new();
        let points = [Vec2::new(40.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(-40.0, 0.0)];
        terrain.add_segment(world, &points).unwrap();
        terrain
    }

    fn settled_ball(world: &mut PhysicsWorld) -> SoftBody {
        let ball = SoftBody::spawn(world, Vec2::new(0.0, 1.0), SoftBodyConfig::default());
        for _ in 0..90 {
            world.step(DT);
        }
        ball
    }

    #[test]
    fn spawn_builds_ring_and_spokes() {
        let mut world = PhysicsWorld::new();
        let ball = SoftBody::spawn(&mut world, Vec2::new(5.0, 3.0), SoftBodyConfig::default());
        assert_eq!(world.body_count(), RIM_COUNT + 1);
        assert_eq!(world.joint_count(), RIM_COUNT * 2);

        let center = ball.center_position(&world).unwrap();
        assert_eq!(center, Vec2::new(5.0, 3.0));
        for rim in ball.rim_positions(&world).unwrap() {
            assert!((rim.distance(center) - BALL_RADIUS).abs() < 1e-4);
        }
        for &joint in ball.spoke_joints() {
            assert_eq!(world.joint_rest_length(joint).unwrap(), BALL_RADIUS);
        }
    }

    #[test]
    fn destroy_removes_everything() {
        let mut world = PhysicsWorld::new();
        let ball = SoftBody::spawn(&mut world, Vec2::ZERO, SoftBodyConfig::default());
        ball.destroy(&mut world);
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.joint_count(), 0);
        assert_eq!(world.collider_set.len(), 0);
    }

    #[test]
    fn respawn_replaces_parts_in_place() {
        let mut world = PhysicsWorld::new();
        let mut ball = SoftBody::spawn(&mut world, Vec2::ZERO, SoftBodyConfig::default());
        let old_core = ball.core_handle();
        ball.respawn(&mut world, Vec2::new(7.0, 4.0));

        assert_eq!(world.body_count(), RIM_COUNT + 1);
        assert_eq!(world.joint_count(), RIM_COUNT * 2);
        assert_eq!(world.collider_set.len(), RIM_COUNT + 1);
        assert!(world.rigid_body_set.get(old_core).is_none());
        assert_eq!(ball.center_position(&world).unwrap(), Vec2::new(7.0, 4.0));
    }

    #[test]
    fn compression_shrinks_spokes_and_caps() {
        let mut world = PhysicsWorld::new();
        let mut ball = SoftBody::spawn(&mut world, Vec2::new(0.0, 10.0), SoftBodyConfig::default());

        ball.start_compression();
        ball.update_compression(&mut world, 0.25).unwrap();
        assert!((ball.spoke_rest_length() - 0.425).abs() < 1e-5);

        ball.update_compression(&mut world, 1.0).unwrap();
        assert_eq!(ball.compression_time(), 0.5);
        assert!((ball.spoke_rest_length() - 0.35).abs() < 1e-5);
        let joint = ball.spoke_joints()[3];
        assert!((world.joint_rest_length(joint).unwrap() - 0.35).abs() < 1e-5);
    }

    #[test]
    fn update_without_start_is_ignored() {
        let mut world = PhysicsWorld::new();
        let mut ball = SoftBody::spawn(&mut world, Vec2::ZERO, SoftBodyConfig::default());
        ball.update_compression(&mut world, 0.3).unwrap();
        assert!(!ball.is_compressing());
        assert_eq!(ball.spoke_rest_length(), BALL_RADIUS);
    }

    #[test]
    fn compression_damps_horizontal_velocity() {
        let mut world = PhysicsWorld::new();
        let mut ball = SoftBody::spawn(&mut world, Vec2::new(0.0, 10.0), SoftBodyConfig::default());
        world
            .set_linear_velocity(ball.core_handle(), Vec2::new(4.0, -1.0))
            .unwrap();
        ball.start_compression();
        ball.update_compression(&mut world, DT).unwrap();
        let velocity = world.linear_velocity(ball.core_handle()).unwrap();
        assert!((velocity.x - 3.8).abs() < 1e-5);
        assert_eq!(velocity.y, -1.0);
    }

    #[test]
    fn airborne_release_restores_spokes_without_impulse() {
        let mut world = PhysicsWorld::new();
        let mut ball = SoftBody::spawn(&mut world, Vec2::new(0.0, 10.0), SoftBodyConfig::default());
        world.step(DT);
        assert!(!ball.is_on_ground(&world));

        ball.start_compression();
        ball.update_compression(&mut world, 0.3).unwrap();
        let before = world.linear_velocity(ball.core_handle()).unwrap();

        let jumped = ball.release_jump(&mut world, 1.0).unwrap();
        let after = world.linear_velocity(ball.core_handle()).unwrap();

        assert!(!jumped);
        assert_eq!(after.y, before.y);
        assert_eq!(after.x, before.x);
        assert_eq!(ball.spoke_rest_length(), BALL_RADIUS);
        for &joint in ball.spoke_joints() {
            assert_eq!(world.joint_rest_length(joint).unwrap(), BALL_RADIUS);
        }
        assert!(!ball.is_compressing());
    }

    #[test]
    fn grounded_release_launches_upward() {
        let mut world = PhysicsWorld::new();
        let _terrain = flat_ground(&mut world);
        let mut ball = settled_ball(&mut world);
        assert!(ball.is_on_ground(&world));

        ball.start_compression();
        for _ in 0..30 {
            ball.update_compression(&mut world, DT).unwrap();
            world.step(DT);
        }
        let before = world.linear_velocity(ball.core_handle()).unwrap();
        let jumped = ball.release_jump(&mut world, 0.0).unwrap();
        let after = world.linear_velocity(ball.core_handle()).unwrap();

        assert!(jumped);
        assert!(after.y > before.y + 1.0);
        assert!(!ball.is_compressing());
    }

    #[test]
    fn release_without_compression_is_noop() {
        let mut world = PhysicsWorld::new();
        let _terrain = flat_ground(&mut world);
        let mut ball = settled_ball(&mut world);
        assert!(!ball.release_jump(&mut world, 1.0).unwrap());
    }

    #[test]
    fn movement_rolls_ball_forward() {
        let mut world = PhysicsWorld::new();
        let _terrain = flat_ground(&mut world);
        let ball = settled_ball(&mut world);
        let start = ball.center_position(&world).unwrap();
        for _ in 0..60 {
            ball.apply_movement(&mut world, 1.0).unwrap();
            world.step(DT);
        }
        let end = ball.center_position(&world).unwrap();
        assert!(end.x > start.x + 0.5, "ball moved from {start:?} to {end:?}");
        assert!(ball.speed(&world).unwrap() > 0.0);
    }

    #[test]
    fn outline_is_sorted_by_angle() {
        let mut world = PhysicsWorld::new();
        let ball = SoftBody::spawn(&mut world, Vec2::new(1.0, 2.0), SoftBodyConfig::default());
        let center = ball.center_position(&world).unwrap();
        let outline = ball.outline(&world).unwrap();
        assert_eq!(outline.len(), RIM_COUNT);
        let angles: Vec<f32> = outline.iter().map(|p| (*p - center).to_angle()).collect();
        assert!(angles.windows(2).all(|w| w[0] <= w[1]));
    }
}
