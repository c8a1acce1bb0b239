//! Overlay canvas drawing.

use image::{Rgba, RgbaImage};

/// Rectangle outline thickness in pixels
pub const LINE_WIDTH: u32 = 2;

/// Reset the canvas to fully transparent
pub fn clear(canvas: &mut RgbaImage) {
    for pixel in canvas.pixels_mut() {
        *pixel = Rgba([0, 0, 0, 0]);
    }
}

/// Draw an unfilled rectangle outline.
///
/// Coordinates may fall partially or fully outside the canvas; out-of-range
/// pixels are clipped rather than wrapped.
pub fn stroke_rect(canvas: &mut RgbaImage, x: i32, y: i32, w: u32, h: u32, color: [u8; 3]) {
    let rgba = Rgba([color[0], color[1], color[2], 255]);
    let line = LINE_WIDTH as i32;

    fill_rect(canvas, x, y, w, LINE_WIDTH, rgba);
    fill_rect(canvas, x, y + h as i32 - line, w, LINE_WIDTH, rgba);
    fill_rect(canvas, x, y, LINE_WIDTH, h, rgba);
    fill_rect(canvas, x + w as i32 - line, y, LINE_WIDTH, h, rgba);
}

fn fill_rect(canvas: &mut RgbaImage, x: i32, y: i32, w: u32, h: u32, color: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    let x0 = x.clamp(0, cw as i32) as u32;
    let y0 = y.clamp(0, ch as i32) as u32;
    let x1 = (x.saturating_add(w as i32)).clamp(0, cw as i32) as u32;
    let y1 = (y.saturating_add(h as i32)).clamp(0, ch as i32) as u32;

    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px, py, color);
        }
    }
}
