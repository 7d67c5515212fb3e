// Every variant states *where* things went wrong.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid surface config: {0}")]
    InvalidConfig(String),

    #[error("invalid stroke style: line width {0} must be positive and finite")]
    InvalidStyle(f32),

    // The pixel size of the raster does not fit the byte budget (or usize).
    #[error("raster of {width}x{height} pixels exceeds the raster byte budget")]
    RasterTooLarge { width: u32, height: u32 },

    // The allocator refused the buffer; the previous raster is still valid.
    #[error("failed to allocate {bytes} bytes for a {width}x{height} raster")]
    RasterAlloc { width: u32, height: u32, bytes: usize },

    /* --- Demo binary only --- */
    #[error("window init error: {0}")]
    WindowInit(String),

    #[error("window update error: {0}")]
    WindowUpdate(String),

    #[error("export error: {0}")]
    Export(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
