//! Rendering and export of experiment runs.
//!
//! Grids are rasterized into RGBA frames (discs per active cell, coloured by
//! class byte) with a progress bar strip, then either written as PNG or
//! collected into an infinitely looping GIF.

mod frame;
mod recorder;

pub use frame::{
    BACKGROUND, PROGRESS_BAR, class_color, draw_progress_bar, grid_mosaic, mosaic, render_frame,
    render_grid, save_png,
};
pub use recorder::{GifRecorder, RecorderConfig, RecordingStats};

/// Errors raised while rendering or writing images.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("No frames were recorded")]
    NoFrames,
}
