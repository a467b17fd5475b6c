//! Contact callback demo: a grid of boxes that turn the marker color the
//! first time they touch something other than the ground.

use super::constants::constructors;
use super::contact::{ContactPoint, ContactProcessedListener};
use super::entity::Color;
use super::physics::CollisionFlags;
use super::{Scene, World};
use crate::config::SceneConfig;
use crate::error::SceneError;

/// Marks entities that collide while opted into contact callbacks.
///
/// Contacts involving the ground are ignored. Each opted-in participant has
/// `CUSTOM_MATERIAL_CALLBACK` cleared and takes the marker color, so later
/// contacts of the same entity have no effect.
pub struct CollisionMarker {
    pub ground: usize,
    pub marker: Color,
}

impl CollisionMarker {
    pub fn new(ground: usize, marker: Color) -> Self {
        Self { ground, marker }
    }

    fn mark(&self, world: &mut World, index: usize) {
        let Some(mut flags) = world.collision_flags(index) else {
            return;
        };
        if !flags.contains(CollisionFlags::CUSTOM_MATERIAL_CALLBACK) {
            return;
        }
        flags.remove(CollisionFlags::CUSTOM_MATERIAL_CALLBACK);
        world.set_collision_flags(index, flags);
        if let Some(entity) = world.entity_mut(index) {
            entity.color = self.marker;
        }
        tracing::debug!(index, "entity marked as collided");
    }
}

impl ContactProcessedListener for CollisionMarker {
    fn on_contact_processed(
        &mut self,
        _point: &ContactPoint,
        user_value0: usize,
        user_value1: usize,
        world: &mut World,
    ) -> bool {
        if world.entity(user_value0).is_none() || world.entity(user_value1).is_none() {
            tracing::warn!(user_value0, user_value1, "contact with unknown user value");
            return false;
        }
        if user_value0 == self.ground || user_value1 == self.ground {
            tracing::trace!(user_value0, user_value1, "ground contact skipped");
            return false;
        }

        // The first body is usually the one that triggered the callback,
        // but the second may have opted in as well.
        self.mark(world, user_value0);
        self.mark(world, user_value1);
        false
    }
}

/// The populated demo scene
pub struct ContactCallbackDemo {
    scene: Scene,
    ground: usize,
    boxes: Vec<usize>,
}

impl ContactCallbackDemo {
    /// Adds the ground and the box grid, opts every box into contact
    /// callbacks, and registers a [`CollisionMarker`].
    pub fn create(config: SceneConfig) -> Result<Self, SceneError> {
        let marker = config.marker_color;
        let mut scene = Scene::new(config)?;
        let positions = scene.config().boxes.positions();

        let ground = scene.add(constructors::GROUND, [0.0, 0.0, 0.0])?;
        let color = Color::random(scene.rng(), 0.25, 0.5);
        scene.entity_mut(ground)?.color = color;

        let mut boxes = Vec::with_capacity(positions.len());
        for position in positions {
            let index = scene.add(constructors::BOX, position)?;
            let color = Color::random(scene.rng(), 0.5, 0.5);
            scene.entity_mut(index)?.color = color;
            let flags = scene.collision_flags(index)?;
            scene.set_collision_flags(index, flags | CollisionFlags::CUSTOM_MATERIAL_CALLBACK)?;
            boxes.push(index);
        }

        scene.set_contact_listener(Box::new(CollisionMarker::new(ground, marker)));
        tracing::info!(boxes = boxes.len(), "contact callback demo populated");

        Ok(Self {
            scene,
            ground,
            boxes,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn ground(&self) -> usize {
        self.ground
    }

    /// Indices of the grid boxes, excluding shot boxes
    pub fn boxes(&self) -> &[usize] {
        &self.boxes
    }

    /// Shoots a box, standing in for a tap on the screen
    pub fn tap(&mut self, origin: [f32; 3], direction: [f32; 3]) -> Result<usize, SceneError> {
        self.scene.shoot(origin, direction)
    }

    pub fn update(&mut self) -> usize {
        self.scene.update()
    }

    /// Indices of entities showing the marker color
    pub fn collided(&self) -> Vec<usize> {
        let marker = self.scene.config().marker_color;
        self.scene
            .world()
            .entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.color == marker)
            .map(|(i, _)| i)
            .collect()
    }

    /// Removes the listener, then tears the scene down
    pub fn dispose(self) -> usize {
        self.scene.dispose()
    }
}
