//! Player configuration

use std::time::Duration;

use crate::display::layout::Point;
use crate::error::{Error, Result};
use crate::media::ColorMode;

/// Largest rewind history accepted
pub const MAX_CACHE_CAPACITY: usize = 100_000;

/// Player configuration options
///
/// Validated once at startup with [`validate`](Self::validate) and never
/// changed while playing.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Stream identifiers, in registration order
    pub streams: Vec<String>,

    /// Ticks per second
    pub fps: f64,

    /// Downsample factor applied to every frame
    pub scale: f64,

    /// Colour or grayscale output
    pub color: ColorMode,

    /// Window height used for layout, in pixels
    pub frame_height: u32,

    /// Window width used for layout, in pixels
    pub frame_width: u32,

    /// Number of frame sets kept for rewinding
    pub cache_capacity: usize,

    /// Freeze right after the first frame is shown
    pub freeze_on_start: bool,

    /// Rows in the window grid
    pub layout_rows: usize,

    /// Top-left corner of the window grid
    pub layout_origin: Point,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            streams: Vec::new(),
            fps: 6.0,
            scale: 1.0,
            color: ColorMode::Color,
            frame_height: 480,
            frame_width: 704,
            cache_capacity: 10,
            freeze_on_start: false,
            layout_rows: 2,
            layout_origin: Point::new(0, 100),
        }
    }
}

impl PlayerConfig {
    /// Create a config playing the given streams with default options
    pub fn with_streams(streams: Vec<String>) -> Self {
        Self {
            streams,
            ..Default::default()
        }
    }

    /// Set the frame rate
    pub fn fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    /// Set the downsample factor
    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the colour mode
    pub fn color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    /// Set the window size used for layout
    pub fn frame_size(mut self, height: u32, width: u32) -> Self {
        self.frame_height = height;
        self.frame_width = width;
        self
    }

    /// Set the rewind history size (clamped to at least one)
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    /// Freeze after the first frame
    pub fn freeze_on_start(mut self, freeze: bool) -> Self {
        self.freeze_on_start = freeze;
        self
    }

    /// Set the number of grid rows
    pub fn layout_rows(mut self, rows: usize) -> Self {
        self.layout_rows = rows;
        self
    }

    /// Set the grid origin
    pub fn layout_origin(mut self, origin: Point) -> Self {
        self.layout_origin = origin;
        self
    }

    /// Check every option, clamping the cache capacity
    pub fn validate(mut self) -> Result<Self> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(Error::Config(format!("fps must be positive, got {}", self.fps)));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::Config(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if self.frame_height == 0 || self.frame_width == 0 {
            return Err(Error::Config(format!(
                "frame size must be positive, got {}x{}",
                self.frame_height, self.frame_width
            )));
        }
        if self.layout_rows == 0 {
            return Err(Error::Config("layout needs at least one row".into()));
        }
        if self.streams.is_empty() {
            return Err(Error::Config("no streams to play".into()));
        }
        if self.cache_capacity > MAX_CACHE_CAPACITY {
            return Err(Error::Config(format!(
                "cache size must be at most {}, got {}",
                MAX_CACHE_CAPACITY, self.cache_capacity
            )));
        }
        self.cache_capacity = self.cache_capacity.max(1);
        Ok(self)
    }

    /// Tick period: `1000 / fps` milliseconds, truncated, at least 1ms
    pub fn tick_period(&self) -> Duration {
        let millis = (1000.0 / self.fps) as u64;
        Duration::from_millis(millis.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streams() -> Vec<String> {
        vec!["a.y4m".into(), "b.y4m".into()]
    }

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();

        assert_eq!(config.fps, 6.0);
        assert_eq!(config.scale, 1.0);
        assert_eq!(config.color, ColorMode::Color);
        assert_eq!((config.frame_height, config.frame_width), (480, 704));
        assert_eq!(config.cache_capacity, 10);
        assert!(!config.freeze_on_start);
        assert_eq!(config.layout_rows, 2);
        assert_eq!(config.layout_origin, Point::new(0, 100));
    }

    #[test]
    fn test_tick_period() {
        let config = PlayerConfig::default();
        assert_eq!(config.tick_period(), Duration::from_millis(166));

        let config = PlayerConfig::default().fps(25.0);
        assert_eq!(config.tick_period(), Duration::from_millis(40));

        let config = PlayerConfig::default().fps(5000.0);
        assert_eq!(config.tick_period(), Duration::from_millis(1));
    }

    #[test]
    fn test_builder_chaining() {
        let config = PlayerConfig::with_streams(streams())
            .fps(30.0)
            .scale(2.0)
            .color(ColorMode::Grayscale)
            .frame_size(240, 352)
            .cache_capacity(50)
            .freeze_on_start(true)
            .layout_rows(1)
            .layout_origin(Point::new(10, 20));

        assert_eq!(config.streams.len(), 2);
        assert_eq!(config.fps, 30.0);
        assert_eq!(config.scale, 2.0);
        assert_eq!(config.color, ColorMode::Grayscale);
        assert_eq!((config.frame_height, config.frame_width), (240, 352));
        assert_eq!(config.cache_capacity, 50);
        assert!(config.freeze_on_start);
        assert_eq!(config.layout_rows, 1);
        assert_eq!(config.layout_origin, Point::new(10, 20));
    }

    #[test]
    fn test_cache_capacity_clamped() {
        let config = PlayerConfig::with_streams(streams()).cache_capacity(0);
        assert_eq!(config.cache_capacity, 1);

        let mut config = PlayerConfig::with_streams(streams());
        config.cache_capacity = 0;
        assert_eq!(config.validate().unwrap().cache_capacity, 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            PlayerConfig::with_streams(streams()).fps(0.0),
            PlayerConfig::with_streams(streams()).fps(f64::NAN),
            PlayerConfig::with_streams(streams()).scale(-1.0),
            PlayerConfig::with_streams(streams()).frame_size(0, 10),
            PlayerConfig::with_streams(streams()).layout_rows(0),
            PlayerConfig::with_streams(streams()).cache_capacity(MAX_CACHE_CAPACITY + 1),
            PlayerConfig::default(),
        ];

        for config in bad {
            assert!(matches!(config.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_validate_accepts_defaults_with_streams() {
        assert!(PlayerConfig::with_streams(streams()).validate().is_ok());
    }
}
