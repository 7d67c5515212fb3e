// Bakes stroked segments into the single persistent raster layer.
// Visual: everything drawn before the current live segment lives here; each
// flatten copies the old pixels as-is and paints the new segment on top.

use std::sync::Arc;

use image::{RgbaImage, imageops};
use log::{debug, error, warn};

use crate::error::{Error, Result};
use crate::rasterize::VectorPath;
use crate::types::Bounds;

/// Committed drawing. Immutable once built; a flatten produces a new layer
/// instead of editing this one, so a clone handed to a reader stays complete.
#[derive(Clone, Debug)]
pub struct RasterLayer {
    image: Arc<RgbaImage>,
}

impl RasterLayer {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// True when no pixel has been painted.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p[3] == 0)
    }
}

/// Allocate a transparent `width` x `height` buffer without aborting when the
/// allocator says no.
pub(crate) fn allocate(width: u32, height: u32, max_bytes: usize) -> Result<RgbaImage> {
    let bytes = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .filter(|&n| n <= max_bytes)
        .ok_or(Error::RasterTooLarge { width, height })?;

    let mut data = Vec::new();
    data.try_reserve_exact(bytes)
        .map_err(|_| Error::RasterAlloc { width, height, bytes })?;
    data.resize(bytes, 0);

    RgbaImage::from_raw(width, height, data).ok_or(Error::RasterAlloc { width, height, bytes })
}

/// Merge `segment` into `prior`, returning the replacement layer.
///
/// 1) allocate a new buffer at the surface's pixel size,
/// 2) copy the prior layer at the origin (a replace, never a blend, so
///    repeated flattens cannot darken committed pixels),
/// 3) stroke the segment on top with source-over.
///
/// Nothing is touched on failure; the caller still owns `prior`.
pub fn flatten(
    prior: Option<&RasterLayer>,
    segment: &VectorPath,
    bounds: Bounds,
    max_bytes: usize,
) -> Result<RasterLayer> {
    let (width, height) = bounds.pixel_size();
    let mut canvas = allocate(width, height, max_bytes)?;

    if let Some(prior) = prior {
        if prior.dimensions() == (width, height) {
            imageops::replace(&mut canvas, prior.image(), 0, 0);
        } else {
            debug_assert!(
                false,
                "raster layer is {:?}, surface expects {:?}",
                prior.dimensions(),
                (width, height)
            );
            error!(
                "raster layer is {:?} but surface expects {}x{}; old drawing skipped",
                prior.dimensions(),
                width,
                height
            );
        }
    }

    segment.stroke_into(&mut canvas);

    Ok(RasterLayer { image: Arc::new(canvas) })
}

/// Owner of the one persistent raster layer of a surface.
#[derive(Debug)]
pub struct FlattenCompositor {
    bounds: Bounds,
    max_bytes: usize,
    layer: Option<RasterLayer>,
}

impl FlattenCompositor {
    pub fn new(bounds: Bounds, max_bytes: usize) -> Self {
        Self { bounds, max_bytes, layer: None }
    }

    pub fn layer(&self) -> Option<&RasterLayer> {
        self.layer.as_ref()
    }

    /// Replace the layer with `layer + segment`. On error the current layer
    /// stays in place and keeps being displayed.
    pub fn flatten(&mut self, segment: &VectorPath) -> Result<&RasterLayer> {
        match flatten(self.layer.as_ref(), segment, self.bounds, self.max_bytes) {
            Ok(layer) => {
                debug!(
                    "flattened {} path commands into {:?} raster",
                    segment.commands().len(),
                    layer.dimensions()
                );
                let layer: &RasterLayer = self.layer.insert(layer);
                Ok(layer)
            }
            Err(e) => {
                warn!("flatten failed, keeping previous raster: {e}");
                Err(e)
            }
        }
    }

    pub fn set_max_bytes(&mut self, max_bytes: usize) {
        self.max_bytes = max_bytes;
    }

    /// Drop the layer (the next flatten creates a fresh one).
    pub fn release(&mut self) {
        self.layer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterize::rasterize;
    use crate::types::{Point, StyleState};
    use image::Rgba;

    const BUDGET: usize = 1 << 20;

    fn segment(from: (f32, f32), to: (f32, f32), color: Rgba<u8>) -> VectorPath {
        let style = StyleState { line_width: 2.0, color, antialias: false };
        rasterize(&[Point::from(from), Point::from(to)], &style, 1.0)
    }

    #[test]
    fn first_flatten_creates_the_layer() {
        let mut comp = FlattenCompositor::new(Bounds::new(16, 16, 1.0), BUDGET);
        assert!(comp.layer().is_none());

        let layer = comp.flatten(&segment((2.0, 4.0), (14.0, 4.0), Rgba([0, 0, 0, 255]))).unwrap();
        assert_eq!(layer.dimensions(), (16, 16));
        assert!(!layer.is_blank());
    }

    #[test]
    fn layer_follows_device_scale() {
        let mut comp = FlattenCompositor::new(Bounds::new(10, 5, 2.0), BUDGET);
        let layer = comp.flatten(&segment((1.0, 1.0), (2.0, 1.0), Rgba([0, 0, 0, 255]))).unwrap();
        assert_eq!(layer.dimensions(), (20, 10));
    }

    #[test]
    fn prior_pixels_are_copied_not_blended() {
        let translucent = Rgba([0, 128, 0, 100]);
        let mut comp = FlattenCompositor::new(Bounds::new(16, 16, 1.0), BUDGET);
        comp.flatten(&segment((2.0, 4.0), (14.0, 4.0), translucent)).unwrap();
        let before = *comp.layer().unwrap().image().get_pixel(8, 4);

        // Three more flattens far from the first stroke.
        for _ in 0..3 {
            comp.flatten(&segment((2.0, 12.0), (14.0, 12.0), translucent)).unwrap();
        }
        assert_eq!(*comp.layer().unwrap().image().get_pixel(8, 4), before);
    }

    #[test]
    fn old_handles_keep_their_version() {
        let mut comp = FlattenCompositor::new(Bounds::new(16, 16, 1.0), BUDGET);
        comp.flatten(&segment((2.0, 4.0), (14.0, 4.0), Rgba([0, 0, 0, 255]))).unwrap();
        let old = comp.layer().cloned().unwrap();

        comp.flatten(&segment((2.0, 12.0), (14.0, 12.0), Rgba([0, 0, 0, 255]))).unwrap();
        assert_eq!(old.image().get_pixel(8, 12)[3], 0);
        assert_eq!(comp.layer().unwrap().image().get_pixel(8, 12)[3], 255);
    }

    #[test]
    fn failure_keeps_the_previous_layer() {
        let mut comp = FlattenCompositor::new(Bounds::new(16, 16, 1.0), BUDGET);
        comp.flatten(&segment((2.0, 4.0), (14.0, 4.0), Rgba([0, 0, 0, 255]))).unwrap();
        let before = comp.layer().unwrap().image().clone();

        comp.set_max_bytes(16);
        let err = comp.flatten(&segment((2.0, 12.0), (14.0, 12.0), Rgba([0, 0, 0, 255])));
        assert!(matches!(err, Err(Error::RasterTooLarge { width: 16, height: 16 })));
        assert_eq!(comp.layer().unwrap().image(), &before);
    }

    #[test]
    fn oversized_allocation_is_rejected() {
        assert!(matches!(
            allocate(u32::MAX, u32::MAX, usize::MAX),
            Err(Error::RasterTooLarge { .. }) | Err(Error::RasterAlloc { .. })
        ));
        assert!(allocate(4, 4, 64).is_ok());
        assert!(allocate(4, 4, 63).is_err());
    }

    #[test]
    fn release_drops_the_layer() {
        let mut comp = FlattenCompositor::new(Bounds::new(8, 8, 1.0), BUDGET);
        comp.flatten(&segment((1.0, 1.0), (6.0, 1.0), Rgba([0, 0, 0, 255]))).unwrap();
        comp.release();
        assert!(comp.layer().is_none());
    }
}
