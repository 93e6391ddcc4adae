//! Bitmap glyphs for preview rendering.
//!
//! Uses the Spleen bitmap font family, picking the closest source size and
//! scaling with nearest neighbor. Characters Spleen does not cover (Bengali,
//! the taka sign) are drawn as boxes.

use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};

/// A glyph bitmap, one byte per pixel (1 = black).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub width: usize,
    pub height: usize,
    pub bits: Vec<u8>,
}

/// Spleen source font whose cell height is closest to `height` from above.
fn source_for(height: usize) -> (&'static [u8], usize, usize) {
    if height <= 12 {
        (FONT_6X12, 6, 12)
    } else if height <= 16 {
        (FONT_8X16, 8, 16)
    } else {
        (FONT_12X24, 12, 24)
    }
}

/// Advance width of a glyph drawn at `height` px.
pub fn advance(height: usize) -> usize {
    let (_, w, h) = source_for(height.max(1));
    (height.max(1) * w / h).max(1)
}

/// Width of `text` drawn at `height` px.
pub fn text_width(text: &str, height: usize) -> usize {
    text.chars().count() * advance(height)
}

/// Generate the glyph for `ch` at `height` px.
pub fn glyph(ch: char, height: usize) -> Glyph {
    let height = height.max(1);
    let (data, src_w, src_h) = source_for(height);
    let width = advance(height);

    let mut src = vec![0u8; src_w * src_h];
    let found = PSF2Font::new(data).ok().and_then(|mut font| {
        let utf8 = ch.to_string();
        let spleen_glyph = font.glyph_for_utf8(utf8.as_bytes())?;
        for (row_y, row) in spleen_glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                if row_y < src_h && col_x < src_w {
                    src[row_y * src_w + col_x] = u8::from(on);
                }
            }
        }
        Some(())
    });

    let mut bits = vec![0u8; width * height];
    if found.is_some() {
        scale_bitmap(&src, src_w, src_h, &mut bits, width, height);
    } else if !ch.is_whitespace() {
        draw_box(&mut bits, width, height);
    }

    Glyph {
        width,
        height,
        bits,
    }
}

/// Scale a bitmap from src dimensions to dst dimensions using nearest neighbor.
fn scale_bitmap(src: &[u8], src_w: usize, src_h: usize, dst: &mut [u8], dst_w: usize, dst_h: usize) {
    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx * src_w / dst_w;
            let sy = dy * src_h / dst_h;
            if let (Some(&bit), Some(out)) = (src.get(sy * src_w + sx), dst.get_mut(dy * dst_w + dx)) {
                *out = bit;
            }
        }
    }
}

/// Box outline for characters the font does not have, inset by one pixel
/// so neighboring boxes stay apart.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    if width < 3 || height < 3 {
        glyph.fill(1);
        return;
    }
    let (left, right) = (1, width - 2);
    let (top, bottom) = (1, height - 1);
    for x in left..=right {
        glyph[top * width + x] = 1;
        glyph[(bottom - 1) * width + x] = 1;
    }
    for y in top..bottom {
        glyph[y * width + left] = 1;
        glyph[y * width + right] = 1;
    }
}
