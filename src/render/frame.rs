//! Rasterizing grids into RGBA frames.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage, imageops};

use super::RenderError;
use crate::compute::Grid;
use crate::schema::RenderConfig;

pub const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const PROGRESS_BAR: Rgba<u8> = Rgba([0, 0, 255, 255]);

const CLASS_COLORS: [Rgba<u8>; 6] = [
    Rgba([255, 255, 255, 255]),
    Rgba([230, 60, 60, 255]),
    Rgba([70, 200, 90, 255]),
    Rgba([240, 200, 40, 255]),
    Rgba([200, 90, 220, 255]),
    Rgba([60, 200, 220, 255]),
];

/// Colour for a cell byte. `255` (the first class) is white; lower class
/// bytes cycle through a fixed palette.
pub fn class_color(value: u8) -> Rgba<u8> {
    CLASS_COLORS[(255 - value) as usize % CLASS_COLORS.len()]
}

/// Draw every active cell as a filled disc of diameter `scale`.
///
/// At `scale == 1` each cell becomes exactly one pixel.
pub fn render_grid(grid: &Grid, scale: u32) -> RgbaImage {
    let side = grid.size() as u32 * scale;
    let mut image = RgbaImage::from_pixel(side, side, BACKGROUND);
    let half = scale as f64 / 2.0;

    for cell in grid.active_cells() {
        let color = class_color(grid.get(cell));
        let x0 = cell.x as u32 * scale;
        let y0 = cell.y as u32 * scale;

        for py in 0..scale {
            for px in 0..scale {
                let dx = px as f64 + 0.5 - half;
                let dy = py as f64 + 0.5 - half;
                if 2.0 * (dx * dx + dy * dy).sqrt() / (scale as f64) < 1.0 {
                    image.put_pixel(x0 + px, y0 + py, color);
                }
            }
        }
    }
    image
}

/// Fill the bottom `height` rows from the left, proportionally to
/// `step / total_steps`.
pub fn draw_progress_bar(image: &mut RgbaImage, step: usize, total_steps: usize, height: u32) {
    if total_steps == 0 {
        return;
    }
    let width = image.width();
    let filled = ((step.min(total_steps) as u64 * width as u64) / total_steps as u64) as u32;
    let top = image.height().saturating_sub(height);

    for y in top..image.height() {
        for x in 0..filled {
            image.put_pixel(x, y, PROGRESS_BAR);
        }
    }
}

/// A grid frame with a progress bar strip added beneath it.
pub fn render_frame(
    grid: &Grid,
    step: usize,
    total_steps: usize,
    config: &RenderConfig,
) -> RgbaImage {
    let cells = render_grid(grid, config.scale);
    let mut frame = RgbaImage::from_pixel(
        cells.width(),
        cells.height() + config.progress_bar_height,
        BACKGROUND,
    );
    imageops::replace(&mut frame, &cells, 0, 0);
    draw_progress_bar(&mut frame, step, total_steps, config.progress_bar_height);
    frame
}

/// Lay equally sized tiles out row-major, `columns` per row.
pub fn mosaic(tiles: &[RgbaImage], columns: usize) -> RgbaImage {
    let Some(first) = tiles.first() else {
        return RgbaImage::new(0, 0);
    };
    let columns = columns.clamp(1, tiles.len());
    let rows = tiles.len().div_ceil(columns);
    let (tile_w, tile_h) = first.dimensions();

    let mut canvas = RgbaImage::from_pixel(
        tile_w * columns as u32,
        tile_h * rows as u32,
        BACKGROUND,
    );
    for (i, tile) in tiles.iter().enumerate() {
        let x = (i % columns) as i64 * tile_w as i64;
        let y = (i / columns) as i64 * tile_h as i64;
        imageops::replace(&mut canvas, tile, x, y);
    }
    canvas
}

/// Square tiling of one-pixel-per-cell renders, for worker ensembles.
pub fn grid_mosaic<'a>(grids: impl IntoIterator<Item = &'a Grid>) -> RgbaImage {
    let tiles: Vec<RgbaImage> = grids.into_iter().map(|g| render_grid(g, 1)).collect();
    let columns = (tiles.len() as f64).sqrt().ceil() as usize;
    mosaic(&tiles, columns)
}

pub fn save_png<P: AsRef<Path>>(image: &RgbaImage, path: P) -> Result<(), RenderError> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
