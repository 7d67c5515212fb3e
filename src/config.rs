// Surface and export settings.

use image::Rgba;

use crate::error::{Error, Result};
use crate::types::Bounds;

/// Points a stroke may accumulate before it is flattened mid-stroke.
pub const DEFAULT_MAX_POINTS: usize = 2500;
/// Points kept as the seed of the live segment after an overflow flatten.
pub const DEFAULT_KEEP_LAST: usize = 2;
/// Upper bound for one raster allocation (256 MiB).
pub const DEFAULT_MAX_RASTER_BYTES: usize = 256 << 20;

#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceConfig {
    /// Logical size of the surface.
    pub width: u32,
    pub height: u32,
    /// Physical pixels per logical unit.
    pub scale: f32,
    pub max_points: usize,
    pub keep_last: usize,
    pub max_raster_bytes: usize,
    /// Fill used when an opaque image is exported.
    pub background: Rgba<u8>,
    /// Default for `ExportOptions::opaque`.
    pub opaque: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            scale: 1.0,
            max_points: DEFAULT_MAX_POINTS,
            keep_last: DEFAULT_KEEP_LAST,
            max_raster_bytes: DEFAULT_MAX_RASTER_BYTES,
            background: Rgba([255, 255, 255, 255]),
            opaque: false,
        }
    }
}

impl SurfaceConfig {
    pub fn new(width: u32, height: u32, scale: f32) -> Self {
        Self { width, height, scale, ..Self::default() }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height, self.scale)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "surface size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::InvalidConfig(format!("scale {} must be positive", self.scale)));
        }
        // Fewer than two seed points leaves a gap (or a sharp corner) where the
        // live segment resumes after a flatten.
        if self.keep_last < 2 {
            return Err(Error::InvalidConfig(format!("keep_last {} must be at least 2", self.keep_last)));
        }
        if self.keep_last >= self.max_points {
            return Err(Error::InvalidConfig(format!(
                "keep_last {} must be below max_points {}",
                self.keep_last, self.max_points
            )));
        }
        if self.max_raster_bytes == 0 {
            return Err(Error::InvalidConfig("max_raster_bytes must be non-zero".into()));
        }
        // Snapshots allocate a full-size raster without a fallible path, so the
        // surface itself must fit the budget.
        let (w, h) = self.bounds().checked_pixel_size().ok_or_else(|| {
            Error::InvalidConfig(format!(
                "{}x{} at scale {} overflows the pixel size",
                self.width, self.height, self.scale
            ))
        })?;
        let bytes = (w as usize).checked_mul(h as usize).and_then(|n| n.checked_mul(4));
        if !bytes.is_some_and(|n| n <= self.max_raster_bytes) {
            return Err(Error::InvalidConfig(format!(
                "{w}x{h} raster exceeds max_raster_bytes {}",
                self.max_raster_bytes
            )));
        }
        Ok(())
    }
}

/// Pixel density of an exported image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ExportScale {
    /// Same pixels as the surface raster.
    #[default]
    Native,
    /// One pixel per logical unit.
    Unit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct ExportOptions {
    /// Composite over the configured background instead of keeping transparency.
    pub opaque: bool,
    pub scale: ExportScale,
}
