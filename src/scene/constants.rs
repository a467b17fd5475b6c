//! Scene and physics defaults.
//! Config defaults and tests read from here so the values stay in one place.

/// Physics constants
pub mod physics {
    /// Default gravity in m/s²
    pub const DEFAULT_GRAVITY: f32 = 10.0;

    /// Fixed timestep for physics simulation (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Small epsilon for float comparisons
    pub const EPSILON: f32 = 0.001;
}

/// Entity constructor defaults
pub mod constructors {
    /// Name of the static ground constructor
    pub const GROUND: &str = "ground";

    /// Name of the dynamic box constructor
    pub const BOX: &str = "box";

    /// Ground half extents; the top face sits at the body origin
    pub const GROUND_HALF_EXTENTS: [f32; 3] = [10.0, 0.5, 10.0];

    /// Box half extents (1x1x1 box)
    pub const BOX_HALF_EXTENTS: [f32; 3] = [0.5, 0.5, 0.5];

    /// Box mass in kg
    pub const BOX_MASS: f32 = 1.0;
}

/// Box grid layout of the contact callback demo
pub mod grid {
    pub const COUNT: [u32; 3] = [5, 1, 5];

    pub const OFFSET: [f32; 3] = [-5.0, 0.5, -5.0];

    /// Distance between neighbouring box centers
    pub const SPACING: f32 = 2.0;

    /// Upper bound on the number of grid boxes
    pub const MAX_BOXES: usize = 10_000;
}

/// Launch speed of shot boxes in m/s
pub const SHOOT_SPEED: f32 = 30.0;
