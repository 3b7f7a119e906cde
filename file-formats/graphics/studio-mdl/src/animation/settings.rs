/// Which renderer consumes the bone transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderPath {
    /// Render and light matrices are identical in world space
    #[default]
    Hardware,
    /// Render matrices are in view space via the alias transform
    Software,
}

/// Knobs controlling the animation pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct AnimationSettings {
    /// Interpolate frames, controllers and blends between updates
    pub interpolate: bool,
    /// Estimate player movement from origin deltas instead of reported velocity
    pub gait_estimation: bool,
    pub render_path: RenderPath,
    /// Seed for the render fx jitter
    pub fx_seed: u32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            interpolate: true,
            gait_estimation: true,
            render_path: RenderPath::Hardware,
            fx_seed: 1312,
        }
    }
}
