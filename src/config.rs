//! Scene configuration parsing from scene.toml files

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::scene::constants::{constructors, grid, physics, SHOOT_SPEED};
use crate::scene::entity::Color;

/// File name looked up by [`SceneConfig::from_dir`]
pub const CONFIG_FILE: &str = "scene.toml";

/// Ground section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub half_extents: [f32; 3],
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            half_extents: constructors::GROUND_HALF_EXTENTS,
        }
    }
}

/// Box grid section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxGridConfig {
    /// Number of boxes along x, y and z
    pub count: [u32; 3],
    /// Position of the first box
    pub offset: [f32; 3],
    pub spacing: f32,
    pub half_extents: [f32; 3],
    pub mass: f32,
}

impl Default for BoxGridConfig {
    fn default() -> Self {
        Self {
            count: grid::COUNT,
            offset: grid::OFFSET,
            spacing: grid::SPACING,
            half_extents: constructors::BOX_HALF_EXTENTS,
            mass: constructors::BOX_MASS,
        }
    }
}

impl BoxGridConfig {
    /// Box center positions in x-major, then y, then z order
    pub fn positions(&self) -> Vec<[f32; 3]> {
        let [nx, ny, nz] = self.count;
        let mut positions = Vec::with_capacity(self.box_count().unwrap_or(0).min(grid::MAX_BOXES));
        for x in 0..nx {
            for y in 0..ny {
                for z in 0..nz {
                    positions.push([
                        self.offset[0] + x as f32 * self.spacing,
                        self.offset[1] + y as f32 * self.spacing,
                        self.offset[2] + z as f32 * self.spacing,
                    ]);
                }
            }
        }
        positions
    }

    /// Total box count, or None if it does not fit in usize
    pub fn box_count(&self) -> Option<usize> {
        self.count
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n as usize))
    }
}

/// Scene configuration from scene.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Downward gravity magnitude in m/s²
    pub gravity: f32,
    /// Fixed step used by `Scene::update`
    pub timestep: f32,
    /// RNG seed for entity colors; random when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Launch speed of shot boxes
    pub shoot_speed: f32,
    /// Color given to entities that have collided
    pub marker_color: Color,
    pub ground: GroundConfig,
    pub boxes: BoxGridConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            gravity: physics::DEFAULT_GRAVITY,
            timestep: physics::TIMESTEP,
            seed: None,
            shoot_speed: SHOOT_SPEED,
            marker_color: Color::RED,
            ground: GroundConfig::default(),
            boxes: BoxGridConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Load scene configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load scene configuration from a directory.
    /// Looks for scene.toml in the given directory
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Self::from_file(&dir.join(CONFIG_FILE))
    }

    /// Checks values that parse but cannot drive a simulation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.timestep > 0.0 && self.timestep.is_finite()) {
            return Err(invalid(
                "timestep",
                format!("must be positive and finite, got {}", self.timestep),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(invalid("gravity", "must be finite".to_string()));
        }
        if !(self.shoot_speed > 0.0) {
            return Err(invalid(
                "shoot_speed",
                format!("must be positive, got {}", self.shoot_speed),
            ));
        }
        if !(self.boxes.mass > 0.0) {
            return Err(invalid("boxes.mass", format!("must be positive, got {}", self.boxes.mass)));
        }
        if self.boxes.count.contains(&0) {
            return Err(invalid("boxes.count", format!("all counts must be non-zero, got {:?}", self.boxes.count)));
        }
        match self.boxes.box_count() {
            Some(n) if n <= grid::MAX_BOXES => {}
            _ => {
                return Err(invalid(
                    "boxes.count",
                    format!("at most {} boxes, got {:?}", grid::MAX_BOXES, self.boxes.count),
                ));
            }
        }
        if !(self.boxes.spacing > 0.0 && self.boxes.spacing.is_finite()) {
            return Err(invalid(
                "boxes.spacing",
                format!("must be positive and finite, got {}", self.boxes.spacing),
            ));
        }
        if self.boxes.offset.iter().any(|o| !o.is_finite()) {
            return Err(invalid("boxes.offset", format!("must be finite, got {:?}", self.boxes.offset)));
        }
        for (key, extents) in [
            ("ground.half_extents", self.ground.half_extents),
            ("boxes.half_extents", self.boxes.half_extents),
        ] {
            if extents.iter().any(|&e| !(e > 0.0)) {
                return Err(invalid(key, format!("must be positive, got {:?}", extents)));
            }
        }
        Ok(())
    }

    /// Renders the config as TOML, used by `init`
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn invalid(key: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { key, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config: SceneConfig = toml::from_str("").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.boxes.count, [5, 1, 5]);
        assert_eq!(config.marker_color, Color::RED);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            gravity = 9.81
            timestep = 0.01
            seed = 42
            shoot_speed = 12.0
            marker_color = [0.0, 1.0, 0.0, 1.0]

            [ground]
            half_extents = [20.0, 1.0, 20.0]

            [boxes]
            count = [2, 2, 1]
            offset = [0.0, 1.0, 0.0]
            spacing = 3.0
            mass = 2.5
        "#;
        let config: SceneConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.gravity, 9.81);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.marker_color, Color::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(config.ground.half_extents, [20.0, 1.0, 20.0]);
        assert_eq!(config.boxes.count, [2, 2, 1]);
        assert_eq!(config.boxes.half_extents, constructors::BOX_HALF_EXTENTS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_grid_positions() {
        let boxes = BoxGridConfig {
            count: [2, 1, 3],
            ..BoxGridConfig::default()
        };
        let positions = boxes.positions();
        assert_eq!(positions.len(), 6);
        assert_eq!(positions[0], [-5.0, 0.5, -5.0]);
        assert_eq!(positions[1], [-5.0, 0.5, -3.0]);
        assert_eq!(positions[5], [-3.0, 0.5, -1.0]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SceneConfig::default();
        config.timestep = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "timestep", .. })
        ));

        let mut config = SceneConfig::default();
        config.boxes.count = [5, 0, 5];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "boxes.count", .. })
        ));

        let mut config = SceneConfig::default();
        config.ground.half_extents = [10.0, -1.0, 10.0];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "ground.half_extents", .. })
        ));

        let mut config = SceneConfig::default();
        config.timestep = f32::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "timestep", .. })
        ));

        let mut config = SceneConfig::default();
        config.boxes.spacing = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "boxes.spacing", .. })
        ));

        let mut config = SceneConfig::default();
        config.boxes.offset = [0.0, f32::INFINITY, 0.0];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "boxes.offset", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_grid() {
        let mut config = SceneConfig::default();
        config.boxes.count = [70_000, 70_000, 1];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "boxes.count", .. })
        ));

        config.boxes.count = [u32::MAX, u32::MAX, u32::MAX];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "boxes.count", .. })
        ));

        config.boxes.count = [100, 1, 100];
        assert!(config.validate().is_ok());
        assert_eq!(config.boxes.box_count(), Some(grid::MAX_BOXES));
    }

    #[test]
    fn test_oversized_grid_fails_scene_creation() {
        let mut config = SceneConfig::default();
        config.boxes.count = [70_000, 70_000, 1];
        let err = crate::ContactCallbackDemo::create(config).err();
        assert!(matches!(err, Some(crate::SceneError::Config(_))));
    }

    #[test]
    fn test_from_dir_reads_scene_toml() {
        let dir = std::env::temp_dir().join(format!("contact-scene-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), "seed = 4\n[boxes]\ncount = [2, 1, 2]\n").unwrap();

        let config = SceneConfig::from_dir(&dir);
        std::fs::remove_dir_all(&dir).unwrap();

        let config = config.unwrap();
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.boxes.count, [2, 1, 2]);
    }

    #[test]
    fn test_toml_string_parses_back() {
        let mut config = SceneConfig::default();
        config.seed = Some(9);
        let text = config.to_toml_string().unwrap();
        let parsed: SceneConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = SceneConfig::from_file(Path::new("/nonexistent/scene.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/scene.toml"));
    }
}
