//! On-screen size of the content canvas.

use crate::config::EngineConfig;
use kurbo::Size;

/// Bounds the display size is fitted into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayBounds {
    pub min_width: f64,
    pub min_height: f64,
    pub max_width: f64,
    pub max_height: f64,
}

impl Default for DisplayBounds {
    fn default() -> Self {
        Self {
            min_width: 780.0,
            min_height: 520.0,
            max_width: 960.0,
            max_height: 640.0,
        }
    }
}

impl DisplayBounds {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            min_width: config.display_min_width,
            min_height: config.display_min_height,
            max_width: config.display_max_width,
            max_height: config.display_max_height,
        }
    }
}

/// Fit a native frame size into the display bounds, keeping its aspect
/// ratio.
///
/// The width starts at least at the minimum width and is capped at the
/// maximum; the height is then capped and finally raised to the minimum, each
/// step recomputing the other axis. The minimum height wins over the maximum
/// width for very wide frames. A missing (zero) dimension falls back to the
/// corresponding minimum.
pub fn compute_display_size(native_width: u32, native_height: u32, bounds: &DisplayBounds) -> Size {
    let natural_width = if native_width > 0 {
        f64::from(native_width)
    } else {
        bounds.min_width
    };
    let natural_height = if native_height > 0 {
        f64::from(native_height)
    } else {
        bounds.min_height
    };
    let aspect = natural_width / natural_height;

    let mut width = natural_width.max(bounds.min_width);
    let mut height = width / aspect;

    if width > bounds.max_width {
        width = bounds.max_width;
        height = width / aspect;
    }
    if height > bounds.max_height {
        height = bounds.max_height;
        width = height * aspect;
    }
    if height < bounds.min_height {
        height = bounds.min_height;
        width = height * aspect;
    }

    Size::new(width, height)
}
