//! Freehand drawing surface with incremental flattening.
//!
//! Points go into a capped buffer and are drawn as a live polyline every
//! frame. When the buffer overflows, or the stroke ends, the polyline is baked
//! into a single raster layer and the buffer is emptied, so both memory and
//! per-frame work stay bounded however long the stroke gets.

pub mod auto;
pub mod buffer;
pub mod config;
pub mod error;
pub mod flatten;
pub mod rasterize;
pub mod surface;
pub mod types;

pub use auto::{AutoState, AutoStroke, Spiral, SpiralParams};
pub use buffer::PointBuffer;
pub use config::{ExportOptions, ExportScale, SurfaceConfig};
pub use error::{Error, Result};
pub use flatten::{FlattenCompositor, RasterLayer, flatten};
pub use rasterize::{PathCommand, VectorPath, rasterize};
pub use surface::{DrawSurface, RedrawQueue, SurfaceState};
pub use types::{Bounds, DirtyRect, Point, StyleState};
