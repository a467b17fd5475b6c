//! Contact-processed callbacks.
//!
//! Rapier only exposes contacts to user code through [`PhysicsHooks`] while
//! the step holds the world borrowed, so the hooks forward every processed
//! contact point into a channel. The scene drains that channel before `step`
//! returns and hands each event to the registered
//! [`ContactProcessedListener`] together with mutable access to the world.

use crossbeam_channel::{unbounded, Receiver, Sender};
use rapier3d::prelude::*;
use serde::Serialize;

use super::World;

/// One processed contact point of a manifold, in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContactPoint {
    pub position: [f32; 3],
    /// Contact normal pointing from the first body toward the second
    pub normal: [f32; 3],
    /// Signed separation; negative while penetrating
    pub distance: f32,
}

/// A contact between two tagged bodies, valid for a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub user_value0: usize,
    pub user_value1: usize,
    pub point: ContactPoint,
}

/// Receives every processed contact point where at least one body has
/// `CUSTOM_MATERIAL_CALLBACK` set.
///
/// `user_value0` is usually the body that triggered the callback. The return
/// value reports whether the contact was altered.
pub trait ContactProcessedListener {
    fn on_contact_processed(
        &mut self,
        point: &ContactPoint,
        user_value0: usize,
        user_value1: usize,
        world: &mut World,
    ) -> bool;
}

/// Physics hooks that queue contact events for later dispatch.
pub struct ContactHooks {
    sender: Sender<ContactEvent>,
}

impl ContactHooks {
    pub fn new() -> (Self, Receiver<ContactEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl PhysicsHooks for ContactHooks {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let (Some(c1), Some(c2)) = (
            context.colliders.get(context.collider1),
            context.colliders.get(context.collider2),
        ) else {
            return;
        };
        let user_value0 = c1.user_data as usize;
        let user_value1 = c2.user_data as usize;
        let normal = *context.normal;

        for contact in context.solver_contacts.iter() {
            let event = ContactEvent {
                user_value0,
                user_value1,
                point: ContactPoint {
                    position: [contact.point.x, contact.point.y, contact.point.z],
                    normal: [normal.x, normal.y, normal.z],
                    distance: contact.dist,
                },
            };
            // The receiver is gone once the listener was removed mid-step.
            if self.sender.send(event).is_err() {
                return;
            }
        }
    }
}

/// Drains every queued event without blocking.
pub fn drain_events(receiver: &Receiver<ContactEvent>) -> Vec<ContactEvent> {
    receiver.try_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::constants::physics::TIMESTEP;
    use crate::scene::physics::{BodyDesc, CollisionFlags, PhysicsWorld};

    const FLOOR: BodyDesc = BodyDesc {
        half_extents: [10.0, 0.5, 10.0],
        mass: 0.0,
        collider_offset: [0.0, -0.5, 0.0],
    };

    const UNIT_BOX: BodyDesc = BodyDesc {
        half_extents: [0.5, 0.5, 0.5],
        mass: 1.0,
        collider_offset: [0.0, 0.0, 0.0],
    };

    fn drop_box_on_floor(flags: CollisionFlags) -> Vec<ContactEvent> {
        let mut world = PhysicsWorld::new();
        let receiver = world.enable_contact_callbacks();
        world.add_body(0, [0.0, 0.0, 0.0], &FLOOR, CollisionFlags::NONE);
        world.add_body(1, [0.0, 1.0, 0.0], &UNIT_BOX, flags);

        let mut events = Vec::new();
        for _ in 0..60 {
            world.step(TIMESTEP);
            events.extend(drain_events(&receiver));
        }
        events
    }

    #[test]
    fn test_flagged_body_produces_contact_events() {
        let events = drop_box_on_floor(CollisionFlags::CUSTOM_MATERIAL_CALLBACK);
        assert!(!events.is_empty(), "Expected contact events for a flagged box");

        for event in &events {
            let mut pair = [event.user_value0, event.user_value1];
            pair.sort_unstable();
            assert_eq!(pair, [0, 1]);
            // Contact points sit on the floor surface.
            assert!(event.point.position[1].abs() < 0.1, "got {:?}", event.point);
            assert!(event.point.normal[1].abs() > 0.9, "got {:?}", event.point);
        }
    }

    #[test]
    fn test_unflagged_bodies_produce_no_events() {
        let events = drop_box_on_floor(CollisionFlags::NONE);
        assert!(events.is_empty());
    }

    #[test]
    fn test_disabled_callbacks_produce_no_events() {
        let mut world = PhysicsWorld::new();
        let receiver = world.enable_contact_callbacks();
        world.disable_contact_callbacks();
        world.add_body(0, [0.0, 0.0, 0.0], &FLOOR, CollisionFlags::NONE);
        world.add_body(1, [0.0, 1.0, 0.0], &UNIT_BOX, CollisionFlags::CUSTOM_MATERIAL_CALLBACK);

        for _ in 0..60 {
            world.step(TIMESTEP);
        }
        assert!(drain_events(&receiver).is_empty());
    }
}
