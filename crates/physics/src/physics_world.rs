//! Physics world management with Rapier2D.

use crate::collision::CollisionGroup;
use crate::error::{PhysicsError, Result};
use engine_core::Vec2;
use rapier2d::prelude::*;

/// World gravity along Y, in m/s².
pub const GRAVITY: f32 = -20.0;
/// Solver sub-steps per `step` call, independent of frame rate.
pub const SUB_STEPS: usize = 4;

#[inline]
fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

#[inline]
fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Parameters for a dynamic rigid body.
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub position: Vec2,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Continuous collision detection; stops small fast bodies tunnelling
    /// through thin terrain chains.
    pub ccd: bool,
}

impl BodyDesc {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            linear_damping: 0.0,
            angular_damping: 0.0,
            ccd: false,
        }
    }
}

/// Surface and mass properties of a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

/// A spring-damped distance constraint between two body centres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSpring {
    pub rest_length: f32,
    /// Resonance frequency in Hz.
    pub hertz: f32,
    /// 1.0 = critically damped.
    pub damping_ratio: f32,
    pub min_length: Option<f32>,
    pub max_length: Option<f32>,
}

impl DistanceSpring {
    /// Spring with limits expressed as fractions of the rest length.
    pub fn bounded(rest_length: f32, hertz: f32, damping_ratio: f32, min_scale: f32, max_scale: f32) -> Self {
        Self {
            rest_length,
            hertz,
            damping_ratio,
            min_length: Some(rest_length * min_scale),
            max_length: Some(rest_length * max_scale),
        }
    }

    /// Acceleration-based stiffness and damping for the configured
    /// frequency. Independent of the attached masses.
    fn motor_gains(&self) -> (Real, Real) {
        let omega = std::f32::consts::TAU * self.hertz;
        (omega * omega, 2.0 * self.damping_ratio * omega)
    }
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with the game's gravity.
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, GRAVITY],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Advance the simulation by `dt` seconds in `SUB_STEPS` equal sub-steps.
    ///
    /// Forces and torques added since the previous call act for the whole
    /// of `dt` and are cleared afterwards.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt / SUB_STEPS as Real;
        for _ in 0..SUB_STEPS {
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &(),
                &(),
            );
        }
        for (_, body) in self.rigid_body_set.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }
    }

    /// Add a dynamic rigid body and return its handle.
    pub fn add_dynamic_body(&mut self, desc: BodyDesc) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(to_vector(desc.position))
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .ccd_enabled(desc.ccd)
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Add a static rigid body (terrain anchors).
    pub fn add_static_body(&mut self, position: Vec2) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::fixed()
            .translation(to_vector(position))
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Add a circle collider belonging to the soft body.
    pub fn add_ball_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        radius: f32,
        material: Material,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::ball(radius)
            .density(material.density)
            .friction(material.friction)
            .restitution(material.restitution)
            .collision_groups(CollisionGroup::ball())
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Add an open chain of segments attached to a static body.
    /// Points are used in the given order.
    pub fn add_chain_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        points: &[Vec2],
        friction: f32,
        restitution: f32,
    ) -> Result<ColliderHandle> {
        if points.len() < 2 {
            return Err(PhysicsError::DegenerateChain(points.len()));
        }
        let vertices: Vec<Point<Real>> = points.iter().map(|p| point![p.x, p.y]).collect();
        let collider = ColliderBuilder::polyline(vertices, None)
            .friction(friction)
            .restitution(restitution)
            .collision_groups(CollisionGroup::terrain())
            .build();
        Ok(self
            .collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set))
    }

    /// Join two body centres with a spring-damped distance constraint.
    /// Contacts between the two bodies are disabled.
    pub fn add_distance_spring(
        &mut self,
        body1: RigidBodyHandle,
        body2: RigidBodyHandle,
        spring: DistanceSpring,
    ) -> ImpulseJointHandle {
        let (stiffness, damping) = spring.motor_gains();
        let mut builder = GenericJointBuilder::new(JointAxesMask::empty())
            .coupled_axes(JointAxesMask::LIN_AXES)
            .motor_position(JointAxis::LinX, spring.rest_length, stiffness, damping)
            .motor_model(JointAxis::LinX, MotorModel::AccelerationBased)
            .contacts_enabled(false);
        if spring.min_length.is_some() || spring.max_length.is_some() {
            let min = spring.min_length.unwrap_or(0.0);
            let max = spring.max_length.unwrap_or(Real::MAX);
            builder = builder.limits(JointAxis::LinX, [min, max]);
        }
        self.impulse_joint_set
            .insert(body1, body2, builder.build(), true)
    }

    /// Current spring rest length of a distance constraint.
    pub fn joint_rest_length(&self, handle: ImpulseJointHandle) -> Result<f32> {
        let joint = self
            .impulse_joint_set
            .get(handle)
            .ok_or(PhysicsError::MissingJoint(handle))?;
        Ok(joint
            .data
            .motor(JointAxis::LinX)
            .map(|motor| motor.target_pos)
            .unwrap_or(0.0))
    }

    /// Retarget the spring rest length, keeping its stiffness and damping.
    pub fn set_joint_rest_length(&mut self, handle: ImpulseJointHandle, rest_length: f32) -> Result<()> {
        let joint = self
            .impulse_joint_set
            .get_mut(handle)
            .ok_or(PhysicsError::MissingJoint(handle))?;
        let (stiffness, damping) = joint
            .data
            .motor(JointAxis::LinX)
            .map(|motor| (motor.stiffness, motor.damping))
            .unwrap_or((0.0, 0.0));
        joint
            .data
            .set_motor_position(JointAxis::LinX, rest_length, stiffness, damping);
        Ok(())
    }

    fn body(&self, handle: RigidBodyHandle) -> Result<&RigidBody> {
        self.rigid_body_set
            .get(handle)
            .ok_or(PhysicsError::MissingBody(handle))
    }

    fn body_mut(&mut self, handle: RigidBodyHandle) -> Result<&mut RigidBody> {
        self.rigid_body_set
            .get_mut(handle)
            .ok_or(PhysicsError::MissingBody(handle))
    }

    /// World position of a body's origin.
    pub fn body_position(&self, handle: RigidBodyHandle) -> Result<Vec2> {
        Ok(to_vec2(self.body(handle)?.translation()))
    }

    pub fn linear_velocity(&self, handle: RigidBodyHandle) -> Result<Vec2> {
        Ok(to_vec2(self.body(handle)?.linvel()))
    }

    pub fn set_linear_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec2) -> Result<()> {
        self.body_mut(handle)?.set_linvel(to_vector(velocity), true);
        Ok(())
    }

    /// Add a force at the centre of mass for the next `step`.
    pub fn apply_force(&mut self, handle: RigidBodyHandle, force: Vec2) -> Result<()> {
        self.body_mut(handle)?.add_force(to_vector(force), true);
        Ok(())
    }

    /// Add a torque for the next `step`. Positive is counter-clockwise.
    pub fn apply_torque(&mut self, handle: RigidBodyHandle, torque: f32) -> Result<()> {
        self.body_mut(handle)?.add_torque(torque, true);
        Ok(())
    }

    /// Apply an impulse to a dynamic body.
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec2) -> Result<()> {
        self.body_mut(handle)?.apply_impulse(to_vector(impulse), true);
        Ok(())
    }

    /// Whether the collider currently has at least one touching contact
    /// with any other collider.
    pub fn has_active_contact(&self, collider: ColliderHandle) -> bool {
        self.narrow_phase
            .contact_pairs_with(collider)
            .any(|pair| pair.has_any_active_contact)
    }

    /// Remove a joint by its handle.
    pub fn remove_joint(&mut self, handle: ImpulseJointHandle) {
        self.impulse_joint_set.remove(handle, true);
    }

    /// Remove a rigid body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joint_set.len()
    }
}
