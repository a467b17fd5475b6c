pub mod constants;
pub mod contact;
pub mod demo;
pub mod entity;
pub mod physics;

use crossbeam_channel::Receiver;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rapier3d::prelude::RigidBodyHandle;
use std::collections::HashMap;

use crate::config::SceneConfig;
use crate::error::SceneError;
use contact::{drain_events, ContactEvent, ContactProcessedListener};
use entity::{Entity, EntityConstructor};
use physics::{CollisionFlags, PhysicsWorld};

/// Entities and the physics world backing them.
///
/// An entity's index in `entities` is the user value stored on its
/// colliders, so indices stay stable for the lifetime of the world.
pub struct World {
    pub physics: PhysicsWorld,
    pub entities: Vec<Entity>,
}

impl World {
    pub fn new() -> Self {
        Self {
            physics: PhysicsWorld::new(),
            entities: Vec::new(),
        }
    }

    /// Creates a body from `constructor` and appends its entity
    pub fn spawn(
        &mut self,
        name: &str,
        constructor: &EntityConstructor,
        position: [f32; 3],
        flags: CollisionFlags,
    ) -> usize {
        let index = self.entities.len();
        let body = self
            .physics
            .add_body(index, position, &constructor.body, flags);
        self.entities.push(Entity::new(name, body));
        index
    }

    pub fn entity(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    pub fn entity_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.entities.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Collision flags of an entity's body
    pub fn collision_flags(&self, index: usize) -> Option<CollisionFlags> {
        let entity = self.entities.get(index)?;
        self.physics.collision_flags(entity.body)
    }

    /// Overwrites the collision flags of an entity's body
    pub fn set_collision_flags(&mut self, index: usize, flags: CollisionFlags) -> bool {
        match self.entities.get(index) {
            Some(entity) => self.physics.set_collision_flags(entity.body, flags),
            None => false,
        }
    }

    pub fn position(&self, index: usize) -> Option<[f32; 3]> {
        let entity = self.entities.get(index)?;
        self.physics.get_position(entity.body)
    }

    /// Removes every body, then forgets the entities. Returns the number of
    /// bodies released.
    pub fn clear(&mut self) -> usize {
        let handles: Vec<RigidBodyHandle> = self.entities.drain(..).map(|e| e.body).collect();
        handles
            .into_iter()
            .filter(|&handle| self.physics.remove_body(handle))
            .count()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Registered contact listener plus the event queue feeding it
struct ListenerSlot {
    listener: Box<dyn ContactProcessedListener>,
    events: Receiver<ContactEvent>,
}

/// A physics scene: named entity constructors, a world, and at most one
/// contact-processed listener.
///
/// Dropping the scene releases the listener before any body.
pub struct Scene {
    config: SceneConfig,
    constructors: HashMap<String, EntityConstructor>,
    world: World,
    listener: Option<ListenerSlot>,
    rng: StdRng,
}

impl Scene {
    /// Creates an empty scene with the "ground" and "box" constructors
    /// registered from `config`
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;

        let mut world = World::new();
        world.physics.set_gravity(config.gravity);

        let mut constructors = HashMap::new();
        constructors.insert(
            constants::constructors::GROUND.to_string(),
            EntityConstructor::ground(config.ground.half_extents),
        );
        constructors.insert(
            constants::constructors::BOX.to_string(),
            EntityConstructor::cuboid(config.boxes.half_extents, config.boxes.mass),
        );

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        tracing::info!(gravity = config.gravity, timestep = config.timestep, "scene created");

        Ok(Self {
            config,
            constructors,
            world,
            listener: None,
            rng,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Adds an entity built by the named constructor
    pub fn add(&mut self, constructor: &str, position: [f32; 3]) -> Result<usize, SceneError> {
        let ctor = *self
            .constructors
            .get(constructor)
            .ok_or_else(|| SceneError::UnknownConstructor(constructor.to_string()))?;
        Ok(self
            .world
            .spawn(constructor, &ctor, position, CollisionFlags::NONE))
    }

    pub fn entity(&self, index: usize) -> Result<&Entity, SceneError> {
        self.world.entity(index).ok_or(SceneError::UnknownEntity(index))
    }

    pub fn entity_mut(&mut self, index: usize) -> Result<&mut Entity, SceneError> {
        self.world
            .entity_mut(index)
            .ok_or(SceneError::UnknownEntity(index))
    }

    /// Collision flags of an entity's body
    pub fn collision_flags(&self, index: usize) -> Result<CollisionFlags, SceneError> {
        self.world
            .collision_flags(index)
            .ok_or(SceneError::UnknownEntity(index))
    }

    pub fn set_collision_flags(&mut self, index: usize, flags: CollisionFlags) -> Result<(), SceneError> {
        if self.world.set_collision_flags(index, flags) {
            Ok(())
        } else {
            Err(SceneError::UnknownEntity(index))
        }
    }

    /// Registers the contact listener and enables contact callbacks.
    /// Returns the previously registered listener, if any.
    pub fn set_contact_listener(
        &mut self,
        listener: Box<dyn ContactProcessedListener>,
    ) -> Option<Box<dyn ContactProcessedListener>> {
        let events = self.world.physics.enable_contact_callbacks();
        let previous = self.listener.replace(ListenerSlot { listener, events });
        tracing::info!(replaced = previous.is_some(), "contact listener registered");
        previous.map(|slot| slot.listener)
    }

    /// Unregisters the contact listener and disables contact callbacks
    pub fn remove_contact_listener(&mut self) -> Option<Box<dyn ContactProcessedListener>> {
        let slot = self.listener.take()?;
        self.world.physics.disable_contact_callbacks();
        tracing::info!("contact listener removed");
        Some(slot.listener)
    }

    pub fn has_contact_listener(&self) -> bool {
        self.listener.is_some()
    }

    /// Advances the simulation and dispatches the contacts it processed
    /// to the listener before returning. Returns the number of contact
    /// points dispatched.
    pub fn step(&mut self, dt: f32) -> usize {
        self.world.physics.step(dt);

        let Some(slot) = self.listener.as_mut() else {
            return 0;
        };
        let events = drain_events(&slot.events);
        for event in &events {
            slot.listener.on_contact_processed(
                &event.point,
                event.user_value0,
                event.user_value1,
                &mut self.world,
            );
        }
        events.len()
    }

    /// Advances by the configured fixed timestep
    pub fn update(&mut self) -> usize {
        self.step(self.config.timestep)
    }

    /// Launches a box from `origin` along `direction` at the configured
    /// shoot speed
    pub fn shoot(&mut self, origin: [f32; 3], direction: [f32; 3]) -> Result<usize, SceneError> {
        let dir = Vector3::new(direction[0], direction[1], direction[2])
            .try_normalize(constants::physics::EPSILON)
            .ok_or(SceneError::InvalidDirection(direction))?;
        let velocity = dir * self.config.shoot_speed;

        let index = self.add(constants::constructors::BOX, origin)?;
        let body = self.world.entities[index].body;
        self.world
            .physics
            .set_velocity(body, [velocity.x, velocity.y, velocity.z]);
        tracing::debug!(index, ?origin, ?direction, "box shot");
        Ok(index)
    }

    /// Releases the listener, then every body. Returns the number of
    /// bodies released.
    pub fn dispose(mut self) -> usize {
        self.teardown()
    }

    fn teardown(&mut self) -> usize {
        self.remove_contact_listener();
        let released = self.world.clear();
        if released > 0 {
            tracing::info!(released, "scene disposed");
        }
        released
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.teardown();
    }
}
