// Core value types shared by the buffer, rasterizer and surface.

use image::Rgba;
use std::ops;

use crate::error::{Error, Result};

/// A captured stroke position in surface-local (logical) coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Point {
        Point { x, y }
    }

    #[inline]
    pub fn dot(self, other: Point) -> f32 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }

    /// Distance from `self` to the closest point of the segment `a`-`b`.
    /// A zero-length segment degrades to the distance to `a`.
    pub fn distance_to_segment(self, a: Point, b: Point) -> f32 {
        let ab = b - a;
        let len2 = ab.dot(ab);
        if len2 == 0.0 {
            return self.distance(a);
        }
        let t = ((self - a).dot(ab) / len2).clamp(0.0, 1.0);
        self.distance(a + ab * t)
    }
}

impl ops::Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl ops::Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl ops::Mul<f32> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Point {
        Point::new(x, y)
    }
}

/// Logical surface size plus the device scale factor.
/// Visual: a 400x300 surface at scale 2.0 is backed by an 800x600 raster.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

impl Bounds {
    pub fn new(width: u32, height: u32, scale: f32) -> Self {
        Self { width, height, scale }
    }

    /// Size of the backing raster in physical pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.scale).ceil() as u32,
            (self.height as f32 * self.scale).ceil() as u32,
        )
    }

    /// `pixel_size` that reports `None` instead of saturating when the scaled
    /// size does not fit in `u32`.
    pub fn checked_pixel_size(&self) -> Option<(u32, u32)> {
        // Same f32 math as `pixel_size`; `u32::MAX as f32` rounds up to 2^32.
        let fit = |logical: u32| {
            let px = (logical as f32 * self.scale).ceil();
            (px.is_finite() && px < u32::MAX as f32).then_some(px as u32)
        };
        Some((fit(self.width)?, fit(self.height)?))
    }

    /// The whole surface as a dirty rect.
    pub fn rect(&self) -> DirtyRect {
        DirtyRect {
            x: 0.0,
            y: 0.0,
            width: self.width as f32,
            height: self.height as f32,
        }
    }
}

/// Region of the surface (logical coordinates) that needs repainting.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DirtyRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DirtyRect {
    /// Rect spanning two consecutive stroke points, grown by half the line
    /// width so the round caps are included.
    pub fn between(last: Point, new: Point, line_width: f32) -> Self {
        let half = line_width / 2.0;
        let min_x = last.x.min(new.x) - half;
        let min_y = last.y.min(new.y) - half;
        let max_x = last.x.max(new.x) + half;
        let max_y = last.y.max(new.y) + half;
        DirtyRect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn union(&self, other: &DirtyRect) -> DirtyRect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        DirtyRect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x <= self.x + self.width && p.y <= self.y + self.height
    }
}

/// Stroke style owned by the caller. The surface reads it when a stroke
/// starts; edits made mid-stroke apply to the next stroke.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StyleState {
    pub line_width: f32,
    pub color: Rgba<u8>,
    /// Soft one-pixel edge when true, hard edge when false.
    pub antialias: bool,
}

impl StyleState {
    pub fn new(line_width: f32, color: Rgba<u8>) -> Self {
        Self { line_width, color, antialias: true }
    }

    pub fn validate(&self) -> Result<()> {
        if self.line_width.is_finite() && self.line_width > 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidStyle(self.line_width))
        }
    }
}

impl Default for StyleState {
    fn default() -> Self {
        Self::new(5.0, Rgba([0, 0, 0, 255]))
    }
}
