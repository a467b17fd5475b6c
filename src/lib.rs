//! Contact callback scene library
//!
//! Builds a rapier3d scene of boxes on a ground plane and reports processed
//! contacts to a registered listener, which marks boxes that have collided.

pub mod config;
pub mod error;
pub mod scene;

pub use config::SceneConfig;
pub use error::{ConfigError, SceneError};
pub use scene::contact::{ContactPoint, ContactProcessedListener};
pub use scene::demo::{CollisionMarker, ContactCallbackDemo};
pub use scene::entity::{Color, Entity};
pub use scene::physics::CollisionFlags;
pub use scene::{Scene, World};
