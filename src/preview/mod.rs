//! # Label to PNG Preview
//!
//! Paints [`LabelDescriptor`]s onto a 1-bit canvas and encodes them as PNG.
//!
//! ## Architecture
//!
//! ```text
//! LabelDescriptor → paint_label → Canvas ─┐
//! LabelDescriptor → paint_label → Canvas ─┼→ sheet grid → PNG bytes
//! LabelDescriptor → paint_label → Canvas ─┘
//! ```
//!
//! Nodes are stacked in a column with the free space spread between them
//! (first node at the top, last at the bottom) and centered horizontally.
//! Everything is drawn at `scale` device pixels per CSS pixel so small labels
//! stay legible.
//!
//! ## Example
//!
//! ```
//! use pricetag::barcode::BarcodersRenderer;
//! use pricetag::label::LabelData;
//! use pricetag::preview::{PreviewOptions, render_png};
//! use pricetag::render::render;
//!
//! let mut data = LabelData::default();
//! data.name = "Soap".into();
//! data.barcode.value = "12345678".into();
//!
//! let label = render(&data, &BarcodersRenderer);
//! let png = render_png(&label, &PreviewOptions::default()).unwrap();
//! assert_eq!(&png[1..4], b"PNG");
//! ```

mod font;

pub use font::{Glyph, glyph, text_width};

use image::{GrayImage, Luma};

use crate::error::{PricetagError, Result};
use crate::layout::PADDING_PX;
use crate::render::{LabelDescriptor, Node};

/// Space between the bars and the human-readable text, in CSS px.
const BARCODE_TEXT_MARGIN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Device pixels per CSS pixel.
    pub scale: usize,
    /// Labels per row on a sheet.
    pub columns: usize,
    /// Gap between labels on a sheet, in device pixels.
    pub gap: usize,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            scale: 3,
            columns: 3,
            gap: 8,
        }
    }
}

// ============================================================================
// CANVAS
// ============================================================================

/// Binary pixel buffer (1 = black).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pub width: usize,
    pub height: usize,
    buffer: Vec<u8>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buffer: vec![0u8; width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.buffer[y * self.width + x] != 0
    }

    /// Set a pixel. Out-of-bounds writes are clipped.
    fn set(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            self.buffer[y * self.width + x] = 1;
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize) {
        for yy in y..(y + h).min(self.height) {
            for xx in x..(x + w).min(self.width) {
                self.buffer[yy * self.width + xx] = 1;
            }
        }
    }

    fn outline(&mut self) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        for x in 0..self.width {
            self.set(x, 0);
            self.set(x, self.height - 1);
        }
        for y in 0..self.height {
            self.set(0, y);
            self.set(self.width - 1, y);
        }
    }

    fn blit(&mut self, src: &Canvas, ox: usize, oy: usize) {
        for y in 0..src.height {
            for x in 0..src.width {
                if src.get(x, y) {
                    self.set(ox + x, oy + y);
                }
            }
        }
    }

    fn ink(&self) -> usize {
        self.buffer.iter().filter(|&&b| b != 0).count()
    }

    /// Encode as an 8-bit grayscale PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        use image::ImageEncoder;

        let mut img = GrayImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                let color = if self.get(x, y) { 0u8 } else { 255u8 };
                img.put_pixel(x as u32, y as u32, Luma([color]));
            }
        }

        let mut png_bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(
                img.as_raw(),
                self.width as u32,
                self.height as u32,
                image::ExtendedColorType::L8,
            )
            .map_err(|e: image::ImageError| PricetagError::Image(e.to_string()))?;

        Ok(png_bytes)
    }
}

// ============================================================================
// PAINTING
// ============================================================================

fn draw_text(canvas: &mut Canvas, text: &str, x: usize, y: usize, height: usize, bold: bool) {
    let mut cursor_x = x;
    for ch in text.chars() {
        let g = glyph(ch, height);
        for gy in 0..g.height {
            for gx in 0..g.width {
                if g.bits[gy * g.width + gx] != 0 {
                    canvas.set(cursor_x + gx, y + gy);
                    if bold {
                        canvas.set(cursor_x + gx + 1, y + gy);
                    }
                }
            }
        }
        cursor_x += g.width;
    }
}

/// Height of a node in device pixels.
fn node_height(node: &Node, scale: usize) -> usize {
    match node {
        Node::Text { size, .. } => *size as usize * scale,
        Node::DateRow { spans } => {
            spans.iter().map(|s| s.size as usize).max().unwrap_or(0) * scale
        }
        Node::Barcode { options, .. } => {
            let text = if options.display_value {
                (options.font_size as usize + BARCODE_TEXT_MARGIN) * scale
            } else {
                0
            };
            options.height as usize * scale + text
        }
        Node::Placeholder { .. } => 0,
    }
}

fn centered(container: usize, item: usize) -> usize {
    container.saturating_sub(item) / 2
}

fn paint_node(canvas: &mut Canvas, node: &Node, x0: usize, inner_w: usize, y: usize, scale: usize, bold_all: bool) {
    match node {
        Node::Text {
            text, size, bold, ..
        } => {
            let h = *size as usize * scale;
            let x = x0 + centered(inner_w, text_width(text, h));
            draw_text(canvas, text, x, y, h, *bold || bold_all);
        }
        Node::DateRow { spans } => {
            let row_h = spans.iter().map(|s| s.size as usize).max().unwrap_or(0) * scale;
            let gap = 4 * scale;
            let total: usize = spans
                .iter()
                .map(|s| text_width(&s.text, s.size as usize * scale))
                .sum::<usize>()
                + gap * spans.len().saturating_sub(1);
            let mut x = x0 + centered(inner_w, total);
            for span in spans {
                let h = span.size as usize * scale;
                // Bottom-align spans of different sizes.
                draw_text(canvas, &span.text, x, y + row_h - h, h, bold_all);
                x += text_width(&span.text, h) + gap;
            }
        }
        Node::Barcode {
            symbol, options, ..
        } => {
            let modules = symbol.modules.len().max(1);
            let wanted = options.width as f64 * scale as f64;
            let module_w = wanted.min(inner_w as f64 / modules as f64);
            let bars_w = (module_w * modules as f64) as usize;
            let left = x0 + centered(inner_w, bars_w);
            let bar_h = options.height as usize * scale;
            for (i, &on) in symbol.modules.iter().enumerate() {
                if on {
                    let start = (i as f64 * module_w) as usize;
                    let end = (((i + 1) as f64 * module_w) as usize).max(start + 1);
                    canvas.fill_rect(left + start, y, end - start, bar_h);
                }
            }
            if options.display_value {
                let h = options.font_size as usize * scale;
                let x = x0 + centered(inner_w, text_width(&symbol.text, h));
                draw_text(canvas, &symbol.text, x, y + bar_h + BARCODE_TEXT_MARGIN * scale, h, false);
            }
        }
        Node::Placeholder { .. } => {}
    }
}

/// Largest canvas a preview may allocate, in pixels.
pub const MAX_CANVAS_PIXELS: usize = 40_000_000;

/// Device-pixel size of one painted label.
fn label_canvas_size(label: &LabelDescriptor, scale: usize) -> (usize, usize) {
    let scale = scale.max(1) as f64;
    (
        (label.width_px * scale).round() as usize,
        (label.height_px * scale).round() as usize,
    )
}

fn check_canvas(width: usize, height: usize) -> Result<()> {
    match width.checked_mul(height) {
        Some(pixels) if pixels <= MAX_CANVAS_PIXELS => Ok(()),
        _ => Err(PricetagError::InvalidInput(format!(
            "preview of {}x{} px is too large, lower the scale or label count",
            width, height
        ))),
    }
}

/// Paint one label onto its own canvas.
pub fn paint_label(label: &LabelDescriptor, scale: usize) -> Canvas {
    let (width, height) = label_canvas_size(label, scale);
    let scale = scale.max(1);
    let pad = (PADDING_PX * scale as f64) as usize;
    let inner_w = width.saturating_sub(2 * pad);
    let inner_h = height.saturating_sub(2 * pad);

    let mut canvas = Canvas::new(width, height);
    let heights: Vec<usize> = label.nodes.iter().map(|n| node_height(n, scale)).collect();
    let used: usize = heights.iter().sum();
    let spacing = match heights.iter().filter(|&&h| h > 0).count() {
        0 | 1 => 0,
        n => inner_h.saturating_sub(used) / (n - 1),
    };

    let mut y = pad;
    for (node, &h) in label.nodes.iter().zip(&heights) {
        if h == 0 {
            continue;
        }
        paint_node(&mut canvas, node, pad, inner_w, y, scale, label.bold_text);
        y += h + spacing;
    }
    canvas
}

/// Render one label to PNG.
pub fn render_png(label: &LabelDescriptor, options: &PreviewOptions) -> Result<Vec<u8>> {
    let (width, height) = label_canvas_size(label, options.scale);
    check_canvas(width, height)?;
    let mut canvas = paint_label(label, options.scale);
    canvas.outline();
    canvas.to_png()
}

/// Render labels as a grid sheet (the on-screen preview).
pub fn render_sheet(labels: &[LabelDescriptor], options: &PreviewOptions) -> Result<Vec<u8>> {
    sheet_canvas(labels, options)?.to_png()
}

fn sheet_canvas(labels: &[LabelDescriptor], options: &PreviewOptions) -> Result<Canvas> {
    if labels.is_empty() {
        return Err(PricetagError::InvalidInput("no labels to preview".into()));
    }
    let columns = options.columns.clamp(1, labels.len());
    let rows = labels.len().div_ceil(columns);
    let gap = options.gap;
    let (cell_w, cell_h) = labels
        .iter()
        .map(|l| label_canvas_size(l, options.scale))
        .fold((0, 0), |(w, h), (lw, lh)| (w.max(lw), h.max(lh)));
    let span = |n: usize, cell: usize| n.saturating_mul(cell).saturating_add((n + 1).saturating_mul(gap));
    let (sheet_w, sheet_h) = (span(columns, cell_w), span(rows, cell_h));
    check_canvas(sheet_w, sheet_h)?;

    let tiles: Vec<Canvas> = labels
        .iter()
        .map(|l| {
            let mut c = paint_label(l, options.scale);
            c.outline();
            c
        })
        .collect();

    let mut sheet = Canvas::new(sheet_w, sheet_h);
    for (i, tile) in tiles.iter().enumerate() {
        let (col, row) = (i % columns, i / columns);
        sheet.blit(tile, gap + col * (cell_w + gap), gap + row * (cell_h + gap));
    }
    Ok(sheet)
}
