//! Colour-mapped PNG previews of index grids.
//!
//! Values are mapped onto a red-white-blue diverging scale spanning [-1, 1]:
//! strongly negative values are dark red, zero is near white and strongly
//! positive values are dark blue. No-data cells are transparent.

use crate::types::{IndexGrid, SadarError, SadarResult};
use image::{ImageFormat, Rgba, RgbaImage};
use std::path::Path;

/// Horizontal gap between composite panels, in pixels
pub const PANEL_GAP: u32 = 8;

const NODATA: Rgba<u8> = Rgba([0, 0, 0, 0]);
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Eleven-stop red to blue scale, evenly spaced over [0, 1]
const RED_BLUE: [[u8; 3]; 11] = [
    [103, 0, 31],
    [178, 24, 43],
    [214, 96, 77],
    [244, 165, 130],
    [253, 219, 199],
    [247, 247, 247],
    [209, 229, 240],
    [146, 197, 222],
    [67, 147, 195],
    [33, 102, 172],
    [5, 48, 97],
];

/// Colour of one index value; NaN is transparent
pub fn colorize(value: f64) -> Rgba<u8> {
    if value.is_nan() {
        return NODATA;
    }

    let t = ((value.clamp(-1.0, 1.0) + 1.0) / 2.0) * (RED_BLUE.len() - 1) as f64;
    let lower = (t.floor() as usize).min(RED_BLUE.len() - 2);
    let frac = t - lower as f64;

    let lo = RED_BLUE[lower];
    let hi = RED_BLUE[lower + 1];
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;

    Rgba([mix(lo[0], hi[0]), mix(lo[1], hi[1]), mix(lo[2], hi[2]), 255])
}

fn image_size(values: &IndexGrid) -> SadarResult<(u32, u32)> {
    let (rows, cols) = values.dim();
    let width = u32::try_from(cols)
        .map_err(|_| SadarError::Processing(format!("Preview too wide: {} columns", cols)))?;
    let height = u32::try_from(rows)
        .map_err(|_| SadarError::Processing(format!("Preview too tall: {} rows", rows)))?;
    Ok((width, height))
}

fn paint(canvas: &mut RgbaImage, values: &IndexGrid, x_offset: u32) {
    for ((row, col), &v) in values.indexed_iter() {
        canvas.put_pixel(x_offset + col as u32, row as u32, colorize(v));
    }
}

/// One pixel per cell
pub fn render_index(values: &IndexGrid) -> SadarResult<RgbaImage> {
    let (width, height) = image_size(values)?;
    let mut canvas = RgbaImage::new(width, height);
    paint(&mut canvas, values, 0);
    Ok(canvas)
}

/// Panels side by side on a white background, separated by [`PANEL_GAP`]
pub fn render_composite(panels: &[&IndexGrid]) -> SadarResult<RgbaImage> {
    let sizes = panels
        .iter()
        .map(|p| image_size(p))
        .collect::<SadarResult<Vec<_>>>()?;

    let gaps = PANEL_GAP * sizes.len().saturating_sub(1) as u32;
    let width = sizes.iter().map(|(w, _)| w).sum::<u32>() + gaps;
    let height = sizes.iter().map(|(_, h)| *h).max().unwrap_or(0);

    let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
    let mut x_offset = 0;
    for (panel, (w, _)) in panels.iter().zip(&sizes) {
        paint(&mut canvas, panel, x_offset);
        x_offset += w + PANEL_GAP;
    }
    Ok(canvas)
}

/// Save as PNG regardless of the file extension
pub fn save_png<P: AsRef<Path>>(image: &RgbaImage, output_path: P) -> SadarResult<()> {
    log::info!(
        "Saving {}x{} preview: {}",
        image.width(),
        image.height(),
        output_path.as_ref().display()
    );
    image.save_with_format(output_path.as_ref(), ImageFormat::Png)?;
    Ok(())
}
