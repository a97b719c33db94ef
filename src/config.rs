/// Tuning knobs for gestures, projection and rendering. Defaults match the
/// production views this engine was extracted from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Movement below this (pixels from press) still counts as a tap.
    pub movement_threshold_px: f32,
    /// Screen-space radius for selecting a projected anchor.
    pub hit_test_radius_px: f32,
    /// Degrees of turntable rotation per horizontal pixel.
    pub turn_sensitivity: f32,
    /// Degrees of x/y tilt per pixel of two-finger centroid travel.
    pub tilt_sensitivity: f32,
    pub near: f32,
    pub far: f32,
    /// Base billboard scale; width is additionally multiplied by the
    /// content's aspect ratio.
    pub base_scale: f32,
    pub clear_color: [f32; 4],
    /// Clear color used while the session is in the failed state.
    pub error_clear_color: [f32; 4],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            movement_threshold_px: 15.0,
            hit_test_radius_px: 150.0,
            turn_sensitivity: 0.8,
            tilt_sensitivity: 0.5,
            near: 0.1,
            far: 100.0,
            base_scale: 0.3,
            clear_color: [0.1, 0.1, 0.1, 1.0],
            error_clear_color: [0.2, 0.0, 0.0, 1.0],
        }
    }
}

impl EngineConfig {
    pub fn with_movement_threshold(mut self, pixels: f32) -> Self {
        self.movement_threshold_px = pixels;
        self
    }

    pub fn with_hit_test_radius(mut self, pixels: f32) -> Self {
        self.hit_test_radius_px = pixels;
        self
    }

    pub fn with_turn_sensitivity(mut self, degrees_per_px: f32) -> Self {
        self.turn_sensitivity = degrees_per_px;
        self
    }

    pub fn with_tilt_sensitivity(mut self, degrees_per_px: f32) -> Self {
        self.tilt_sensitivity = degrees_per_px;
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn with_base_scale(mut self, scale: f32) -> Self {
        self.base_scale = scale;
        self
    }
}
