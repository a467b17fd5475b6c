use rand::Rng;
use rapier3d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};

use super::physics::BodyDesc;

/// RGBA color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color with each channel drawn from `[min, min + span)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, min: f32, span: f32) -> Self {
        Self::new(
            min + span * rng.gen::<f32>(),
            min + span * rng.gen::<f32>(),
            min + span * rng.gen::<f32>(),
            1.0,
        )
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// Named template used by `Scene::add`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityConstructor {
    pub body: BodyDesc,
}

impl EntityConstructor {
    /// Fixed box whose top face sits at the entity position.
    pub fn ground(half_extents: [f32; 3]) -> Self {
        Self {
            body: BodyDesc {
                half_extents,
                mass: 0.0,
                collider_offset: [0.0, -half_extents[1], 0.0],
            },
        }
    }

    /// Dynamic box centered on the entity position.
    pub fn cuboid(half_extents: [f32; 3], mass: f32) -> Self {
        Self {
            body: BodyDesc {
                half_extents,
                mass,
                collider_offset: [0.0, 0.0, 0.0],
            },
        }
    }
}

/// A scene object: a rigid body plus the color it is drawn with.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Constructor the entity was built from
    pub name: String,
    pub body: RigidBodyHandle,
    pub color: Color,
}

impl Entity {
    pub fn new(name: impl Into<String>, body: RigidBodyHandle) -> Self {
        Self {
            name: name.into(),
            body,
            color: Color::WHITE,
        }
    }
}
