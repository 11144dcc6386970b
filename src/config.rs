use std::time::Duration;

pub const GRID_SIZE: usize = 32;
pub const FALLOFF: f32 = 0.1;
pub const PEAK_HEIGHT: f32 = 1.5;
pub const PERIOD_FRAMES: u32 = 600;
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);

pub const TITLE: &str = "32x32 Grid of Points with NURBS Surface Influence";

/// Everything the animation and the scene are built from.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceConfig {
    pub grid_size: usize,
    pub falloff: f32,
    pub peak_height: f32,
    pub period_frames: u32,
    pub frame_interval: Duration,
    /// Half extent of a point marker in display units.
    pub marker_size: f32,
    pub z_limits: (f32, f32),
    pub point_color: [f32; 3],
    pub line_color: [f32; 3],
    pub frame_color: [f32; 3],
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            falloff: FALLOFF,
            peak_height: PEAK_HEIGHT,
            period_frames: PERIOD_FRAMES,
            frame_interval: FRAME_INTERVAL,
            marker_size: 0.012,
            z_limits: (-2.0, 2.0),
            point_color: [0.0, 0.0, 1.0],
            line_color: [1.0, 0.0, 0.0],
            frame_color: [0.6, 0.6, 0.6],
        }
    }
}

impl SurfaceConfig {
    /// Lattice extent along x and y; the grid spans `0..=extent`.
    pub fn xy_limits(&self) -> (f32, f32) {
        (0.0, self.grid_size.saturating_sub(1) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo() {
        let config = SurfaceConfig::default();
        assert_eq!(config.grid_size, 32);
        assert_eq!(config.period_frames, 600);
        assert_eq!(config.frame_interval, Duration::from_millis(100));
        assert_eq!(config.xy_limits(), (0.0, 31.0));
        assert_eq!(config.z_limits, (-2.0, 2.0));
    }
}
