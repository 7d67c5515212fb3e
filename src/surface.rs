// The drawing surface: point ingestion, flatten policy, redraw requests and
// the composite image.
//
// Visual: what you see is always `raster layer + live stroke`. The live stroke
// is re-rendered from the point buffer every frame; once the buffer grows past
// `max_points` (or the finger lifts) it is baked into the raster and the buffer
// is emptied, so redraw cost never grows with stroke length.

use image::{RgbaImage, imageops};
use log::{debug, trace};

use crate::buffer::PointBuffer;
use crate::config::{ExportOptions, ExportScale, SurfaceConfig};
use crate::error::Result;
use crate::flatten::{FlattenCompositor, RasterLayer};
use crate::rasterize::{VectorPath, blend_over, rasterize};
use crate::types::{Bounds, DirtyRect, Point, StyleState};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SurfaceState {
    /// No stroke in progress; the point buffer is empty.
    Idle,
    /// Points are being appended to the live stroke.
    Drawing,
}

/// Pending repaint, drained once per frame by the render loop.
/// Requests made before the next drain merge into one dirty rect.
#[derive(Debug, Default)]
pub struct RedrawQueue {
    pending: Option<DirtyRect>,
    scheduled: u64,
}

impl RedrawQueue {
    pub fn request(&mut self, rect: DirtyRect) {
        self.pending = Some(match self.pending {
            Some(pending) => pending.union(&rect),
            None => {
                self.scheduled += 1;
                rect
            }
        });
    }

    pub fn take(&mut self) -> Option<DirtyRect> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of distinct redraws scheduled so far (coalesced requests count once).
    pub fn scheduled(&self) -> u64 {
        self.scheduled
    }
}

pub struct DrawSurface {
    config: SurfaceConfig,
    style: StyleState,
    // Style captured when the current stroke started.
    stroke_style: Option<StyleState>,
    buffer: PointBuffer,
    // Leading buffer points already baked into the raster (the overflow seed).
    committed: usize,
    compositor: FlattenCompositor,
    redraw: RedrawQueue,
    flattens: u64,
}

impl DrawSurface {
    pub fn new(config: SurfaceConfig) -> Result<Self> {
        config.validate()?;
        let compositor = FlattenCompositor::new(config.bounds(), config.max_raster_bytes);
        Ok(Self {
            config,
            style: StyleState::default(),
            stroke_style: None,
            buffer: PointBuffer::new(),
            committed: 0,
            compositor,
            redraw: RedrawQueue::default(),
            flattens: 0,
        })
    }

    pub fn with_style(config: SurfaceConfig, style: StyleState) -> Result<Self> {
        let mut surface = Self::new(config)?;
        surface.set_style(style)?;
        Ok(surface)
    }

    /* ---------- Input ---------- */

    /// Add a point to the current stroke (starting one when Idle).
    ///
    /// When the buffer overflows, the uncommitted part is flattened and the
    /// buffer drained down to the last `keep_last` points, which seed the live
    /// segment that continues the stroke. If that flatten fails nothing is
    /// drained and the error is returned; the point stays buffered and the next
    /// append retries.
    pub fn begin_or_continue_stroke(&mut self, point: Point) -> Result<()> {
        let style = *self.stroke_style.get_or_insert(self.style);
        let from = self.buffer.last().unwrap_or(point);

        self.buffer.append(point);
        trace!("point ({}, {}), {} buffered", point.x, point.y, self.buffer.len());
        self.redraw.request(DirtyRect::between(from, point, style.line_width));

        if self.buffer.overflows(self.config.max_points) {
            self.flatten_buffer(&style)?;
            let drained = self.buffer.drain_except(self.config.keep_last);
            self.committed = self.buffer.len();
            debug!("overflow: drained {} points, {} kept as seed", drained.len(), self.buffer.len());
        }
        Ok(())
    }

    /// Finish the stroke: bake what is still live into the raster and go Idle.
    /// On failure the buffer is kept, so nothing drawn is lost.
    pub fn end_stroke(&mut self) -> Result<()> {
        if self.buffer.len() > self.committed {
            let style = self.active_style();
            self.flatten_buffer(&style)?;
        }
        self.buffer.clear();
        self.committed = 0;
        self.stroke_style = None;
        Ok(())
    }

    /// Drop all drawing, committed and live. Safe to call when already Idle.
    pub fn clear(&mut self) {
        self.compositor.release();
        self.buffer.clear();
        self.committed = 0;
        self.stroke_style = None;
        self.redraw.request(self.bounds().rect());
        debug!("surface cleared");
    }

    fn flatten_buffer(&mut self, style: &StyleState) -> Result<()> {
        let segment = rasterize(self.uncommitted(), style, self.config.scale);
        self.compositor.flatten(&segment)?;
        self.flattens += 1;
        self.redraw.request(self.bounds().rect());
        Ok(())
    }

    /* ---------- Style ---------- */

    pub fn style(&self) -> &StyleState {
        &self.style
    }

    /// Replace the style. A stroke in progress keeps the style it started with.
    pub fn set_style(&mut self, style: StyleState) -> Result<()> {
        style.validate()?;
        self.style = style;
        Ok(())
    }

    fn active_style(&self) -> StyleState {
        self.stroke_style.unwrap_or(self.style)
    }

    /* ---------- Output ---------- */

    /// Points still to be painted: everything after the committed seed, joined
    /// to the last seed point. Only that point's cap overlaps the raster.
    fn uncommitted(&self) -> &[Point] {
        let points = self.buffer.points();
        match self.committed {
            0 => points,
            n if n >= points.len() => &[],
            n => &points[n - 1..],
        }
    }

    /// Path of the live (not yet flattened) part of the stroke.
    pub fn live_path(&self) -> VectorPath {
        rasterize(self.uncommitted(), &self.active_style(), self.config.scale)
    }

    /// Raster layer plus live stroke, as a fresh image. Never changes the surface.
    pub fn snapshot(&self) -> RgbaImage {
        let mut image = match self.compositor.layer() {
            Some(layer) => layer.image().clone(),
            None => {
                let (w, h) = self.bounds().pixel_size();
                RgbaImage::new(w, h)
            }
        };
        self.live_path().stroke_into(&mut image);
        image
    }

    /// The composite for export or sharing, including any stroke in progress.
    pub fn image_representation(&self, options: &ExportOptions) -> RgbaImage {
        let mut image = self.snapshot();

        if options.opaque {
            let bg = self.config.background;
            for px in image.pixels_mut() {
                let mut out = image::Rgba([bg[0], bg[1], bg[2], 255]);
                blend_over(&mut out, *px, 255);
                *px = out;
            }
        }

        if options.scale == ExportScale::Unit && image.dimensions() != (self.config.width, self.config.height) {
            image = imageops::resize(
                &image,
                self.config.width,
                self.config.height,
                imageops::FilterType::Triangle,
            );
        }
        image
    }

    /// Export using the surface's configured opacity at native scale.
    pub fn default_image_representation(&self) -> RgbaImage {
        self.image_representation(&ExportOptions {
            opaque: self.config.opaque,
            scale: ExportScale::Native,
        })
    }

    /// Drain the pending redraw, if any.
    pub fn take_redraw(&mut self) -> Option<DirtyRect> {
        self.redraw.take()
    }

    pub fn redraw_queue(&self) -> &RedrawQueue {
        &self.redraw
    }

    /* ---------- Inspection ---------- */

    pub fn state(&self) -> SurfaceState {
        if self.buffer.is_empty() { SurfaceState::Idle } else { SurfaceState::Drawing }
    }

    pub fn raster(&self) -> Option<&RasterLayer> {
        self.compositor.layer()
    }

    pub fn live_points(&self) -> &[Point] {
        self.buffer.points()
    }

    /// Successful flattens since the surface was created.
    pub fn flatten_count(&self) -> u64 {
        self.flattens
    }

    pub fn bounds(&self) -> Bounds {
        self.config.bounds()
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Lower (or restore) the byte budget for raster allocations, e.g. when the
    /// host reports memory pressure. Flattens over budget fail without losing
    /// the buffered points.
    pub fn set_raster_budget(&mut self, bytes: usize) {
        self.compositor.set_max_bytes(bytes);
    }
}
