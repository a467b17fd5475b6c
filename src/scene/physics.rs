use crossbeam_channel::Receiver;
use rapier3d::prelude::*;
use std::collections::HashMap;
use std::ops::{BitAnd, BitOr, Not};

use super::constants::physics as consts;
use super::contact::{ContactEvent, ContactHooks};

/// Per-body collision flag bits.
///
/// `STATIC_OBJECT` and `KINEMATIC_OBJECT` mirror the body type and are
/// read-only. `NO_CONTACT_RESPONSE` turns every collider of the body into a
/// sensor. `CUSTOM_MATERIAL_CALLBACK` opts the body into contact-processed
/// callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CollisionFlags(u32);

impl CollisionFlags {
    pub const NONE: Self = Self(0);
    pub const STATIC_OBJECT: Self = Self(1);
    pub const KINEMATIC_OBJECT: Self = Self(1 << 1);
    pub const NO_CONTACT_RESPONSE: Self = Self(1 << 2);
    pub const CUSTOM_MATERIAL_CALLBACK: Self = Self(1 << 3);

    /// Bits that follow the body type and are ignored on write.
    const BODY_TYPE_BITS: Self = Self(Self::STATIC_OBJECT.0 | Self::KINEMATIC_OBJECT.0);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for CollisionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for CollisionFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for CollisionFlags {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Shape and mass of a box body. A mass of zero makes the body fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub half_extents: [f32; 3],
    pub mass: f32,
    /// Collider translation relative to the body origin
    pub collider_offset: [f32; 3],
}

/// Wrapper around the Rapier3D pipeline.
/// Colliders carry their owning entity index in `user_data`, which is what
/// contact callbacks report back as user values.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,

    /// Maps rigid body handle to the user value stored on its colliders
    body_to_user: HashMap<RigidBodyHandle, usize>,
    /// Installed while a contact-processed listener is registered
    contact_hooks: Option<ContactHooks>,
}

impl PhysicsWorld {
    /// Creates a new physics world with default gravity
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, -consts::DEFAULT_GRAVITY, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            body_to_user: HashMap::new(),
            contact_hooks: None,
        }
    }

    /// Sets the downward gravity magnitude
    pub fn set_gravity(&mut self, gravity_y: f32) {
        self.gravity = vector![0.0, -gravity_y, 0.0];
    }

    /// Steps the physics simulation forward by dt seconds.
    /// Contact events are only produced while callbacks are enabled.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        let hooks: &dyn PhysicsHooks = match &self.contact_hooks {
            Some(hooks) => hooks,
            None => &(),
        };
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
            None,
            hooks,
            &(),
        );
    }

    /// Installs the contact hooks and returns the queue they feed.
    /// Replaces any previous queue.
    pub fn enable_contact_callbacks(&mut self) -> Receiver<ContactEvent> {
        let (hooks, receiver) = ContactHooks::new();
        self.contact_hooks = Some(hooks);
        receiver
    }

    /// Uninstalls the contact hooks. Returns false if none were installed.
    pub fn disable_contact_callbacks(&mut self) -> bool {
        self.contact_hooks.take().is_some()
    }

    pub fn contact_callbacks_enabled(&self) -> bool {
        self.contact_hooks.is_some()
    }

    /// Adds a cuboid body tagged with `user_value`.
    /// - mass == 0 creates a fixed body
    /// - mass > 0 creates a dynamic body with that mass
    pub fn add_body(
        &mut self,
        user_value: usize,
        position: [f32; 3],
        desc: &BodyDesc,
        flags: CollisionFlags,
    ) -> RigidBodyHandle {
        let body = if desc.mass > 0.0 {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        }
        .translation(vector![position[0], position[1], position[2]])
        .build();

        let handle = self.rigid_body_set.insert(body);

        let [hx, hy, hz] = desc.half_extents;
        let [ox, oy, oz] = desc.collider_offset;
        let mut builder = ColliderBuilder::cuboid(hx, hy, hz)
            .translation(vector![ox, oy, oz])
            .user_data(user_value as u128)
            .sensor(flags.contains(CollisionFlags::NO_CONTACT_RESPONSE))
            .active_hooks(hooks_for(flags));
        if desc.mass > 0.0 {
            builder = builder.mass(desc.mass);
        }

        self.collider_set
            .insert_with_parent(builder.build(), handle, &mut self.rigid_body_set);
        self.body_to_user.insert(handle, user_value);

        handle
    }

    /// Removes a body and its colliders
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        if self.body_to_user.remove(&handle).is_none() {
            return false;
        }
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    /// Number of live bodies
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Reads the collision flags of a body from its type and first collider
    pub fn collision_flags(&self, handle: RigidBodyHandle) -> Option<CollisionFlags> {
        let body = self.rigid_body_set.get(handle)?;
        let mut flags = CollisionFlags::NONE;
        if body.is_fixed() {
            flags.insert(CollisionFlags::STATIC_OBJECT);
        } else if body.is_kinematic() {
            flags.insert(CollisionFlags::KINEMATIC_OBJECT);
        }

        if let Some(collider) = body
            .colliders()
            .first()
            .and_then(|&ch| self.collider_set.get(ch))
        {
            if collider.is_sensor() {
                flags.insert(CollisionFlags::NO_CONTACT_RESPONSE);
            }
            if collider
                .active_hooks()
                .contains(ActiveHooks::MODIFY_SOLVER_CONTACTS)
            {
                flags.insert(CollisionFlags::CUSTOM_MATERIAL_CALLBACK);
            }
        }
        Some(flags)
    }

    /// Applies collision flags to every collider of a body.
    /// Body-type bits are ignored. Returns false for an unknown handle.
    pub fn set_collision_flags(&mut self, handle: RigidBodyHandle, flags: CollisionFlags) -> bool {
        let Some(body) = self.rigid_body_set.get(handle) else {
            return false;
        };
        let flags = flags & !CollisionFlags::BODY_TYPE_BITS;
        let colliders: Vec<_> = body.colliders().to_vec();
        for collider_handle in colliders {
            if let Some(collider) = self.collider_set.get_mut(collider_handle) {
                collider.set_sensor(flags.contains(CollisionFlags::NO_CONTACT_RESPONSE));
                collider.set_active_hooks(hooks_for(flags));
            }
        }
        true
    }

    /// Sets the linear velocity of a dynamic body
    pub fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: [f32; 3]) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_dynamic() {
                body.set_linvel(vector![velocity[0], velocity[1], velocity[2]], true);
            }
        }
    }

    /// Gets the position of a rigid body
    pub fn get_position(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            [pos.x, pos.y, pos.z]
        })
    }

    /// Gets the velocity of a rigid body
    pub fn get_velocity(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let vel = body.linvel();
            [vel.x, vel.y, vel.z]
        })
    }

    /// Looks up the user value stored for a body
    pub fn user_value(&self, handle: RigidBodyHandle) -> Option<usize> {
        self.body_to_user.get(&handle).copied()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn hooks_for(flags: CollisionFlags) -> ActiveHooks {
    if flags.contains(CollisionFlags::CUSTOM_MATERIAL_CALLBACK) {
        ActiveHooks::MODIFY_SOLVER_CONTACTS
    } else {
        ActiveHooks::empty()
    }
}
