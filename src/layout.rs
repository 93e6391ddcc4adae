//! # Layout & Auto-Scale
//!
//! Decides which rows a label shows and how big everything is drawn.
//!
//! ## Model
//!
//! A label is a column of text [`Row`]s above an optional barcode. Each row
//! holds one or more [`Span`]s (the date row holds packaging, separator and
//! expiry). A row's height is estimated as `weight × font size` where the
//! weight approximates the rendered line height of that kind of row.
//!
//! ## Auto-scale
//!
//! 1. Label size in mm → px (`× 3.78`), minus 4 px padding on every side.
//! 2. A drawable barcode reserves `min(barcode height, 40 % of usable height)`
//!    plus a 2 px gap.
//! 3. `scale = min(text height / required height, width ceiling, 1)`.
//! 4. Below 0.95 the scale is applied: sizes are floored, never below 6 px
//!    (text) or 10 px (barcode).
//!
//! Step 4 redistributes the space freed up by rows pinned at the 6 px floor,
//! so a layout computed from an already-scaled record never shrinks again.

use serde::Serialize;

use crate::label::{Field, LabelData};
use crate::locale::Captions;
use crate::normalize::format_date;

pub const MM_TO_PX: f64 = 3.78;
pub const PADDING_PX: f64 = 4.0;
pub const BARCODE_GAP_PX: f64 = 2.0;
pub const BARCODE_SHARE: f64 = 0.4;
pub const SCALE_THRESHOLD: f64 = 0.95;
pub const MIN_FONT_PX: u32 = 6;
pub const MIN_BARCODE_PX: u32 = 10;
/// Average glyph advance, in em.
pub const GLYPH_ADVANCE_EM: f64 = 0.55;
/// A row may overflow the usable width by this factor.
pub const WIDTH_TOLERANCE: f64 = 1.1;

/// Shown in place of a packaging or expiry date that was not entered.
pub const PLACEHOLDER_DATE: &str = "dd/mm/yyyy";
pub const DATE_SEPARATOR: &str = "|";
/// Separator width in characters (the bar plus padding on both sides).
const SEPARATOR_CHARS: usize = 3;

const EPSILON: f64 = 1e-6;

// ============================================================================
// ROWS
// ============================================================================

/// Kind of text row, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RowKind {
    Business,
    Name,
    Variation,
    Qty,
    Price,
    Dates,
}

impl RowKind {
    /// Height weight per px of font size.
    pub fn weight(self) -> f64 {
        match self {
            RowKind::Business => 1.2,
            RowKind::Name => 1.0,
            RowKind::Variation => 0.8,
            RowKind::Qty => 0.7,
            RowKind::Price => 0.9,
            RowKind::Dates => 0.6,
        }
    }
}

/// A run of text at one font size. `field` is `None` for the date separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub field: Option<Field>,
    pub text: String,
    pub size: u32,
}

impl Span {
    fn field(field: Field, text: String, size: u32) -> Self {
        Self {
            field: Some(field),
            text,
            size,
        }
    }

    fn separator(size: u32) -> Self {
        Self {
            field: None,
            text: DATE_SEPARATOR.to_string(),
            size,
        }
    }

    pub fn is_separator(&self) -> bool {
        self.field.is_none()
    }

    fn advance_chars(&self) -> usize {
        if self.is_separator() {
            SEPARATOR_CHARS
        } else {
            self.text.chars().count()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub kind: RowKind,
    pub spans: Vec<Span>,
}

impl Row {
    fn single(kind: RowKind, field: Field, text: String, size: u32) -> Option<Self> {
        (!text.trim().is_empty()).then(|| Self {
            kind,
            spans: vec![Span::field(field, text, size)],
        })
    }

    /// Largest span size.
    pub fn size(&self) -> u32 {
        self.spans.iter().map(|s| s.size).max().unwrap_or(0)
    }

    /// Estimated rendered height.
    pub fn height(&self) -> f64 {
        self.kind.weight() * f64::from(self.size())
    }

    /// Estimated rendered width.
    pub fn width(&self) -> f64 {
        self.spans
            .iter()
            .map(|s| s.advance_chars() as f64 * f64::from(s.size) * GLYPH_ADVANCE_EM)
            .sum()
    }

    fn scale_to(&mut self, k: f64, pinned: bool) {
        for span in &mut self.spans {
            span.size = if pinned {
                MIN_FONT_PX
            } else {
                scaled(span.size, k).max(MIN_FONT_PX)
            };
        }
        if self.kind == RowKind::Dates {
            self.resize_separator();
        }
    }

    fn resize_separator(&mut self) {
        let Some(min) = self
            .spans
            .iter()
            .filter(|s| !s.is_separator())
            .map(|s| s.size)
            .min()
        else {
            return;
        };
        for span in self.spans.iter_mut().filter(|s| s.is_separator()) {
            span.size = min;
        }
    }
}

fn scaled(size: u32, k: f64) -> u32 {
    (f64::from(size) * k + EPSILON).floor() as u32
}

fn date_text(date: Option<chrono::NaiveDate>) -> String {
    date.map(format_date)
        .unwrap_or_else(|| PLACEHOLDER_DATE.to_string())
}

/// The rows `data` shows, with captions and unscaled font sizes.
///
/// Packaging shows whenever its flag is on (with a placeholder date when
/// none was entered). Expiry shows when its flag is on or a date was entered.
pub fn visible_rows(data: &LabelData, captions: &Captions) -> Vec<Row> {
    let fonts = &data.fonts;
    let show = &data.show;
    let mut rows = Vec::new();

    if show.business {
        rows.extend(Row::single(
            RowKind::Business,
            Field::Business,
            data.business_name.clone(),
            fonts.business,
        ));
    }
    if show.name {
        rows.extend(Row::single(RowKind::Name, Field::Name, data.name.clone(), fonts.name));
    }
    if show.variation {
        rows.extend(Row::single(
            RowKind::Variation,
            Field::Variation,
            data.variation.clone(),
            fonts.variation,
        ));
    }
    if show.qty {
        let text = format!("{}: {} {}", captions.qty, data.qty_text(), data.qty_unit.value());
        rows.extend(Row::single(
            RowKind::Qty,
            Field::Qty,
            text.trim_end().to_string(),
            fonts.qty,
        ));
    }
    if show.price && data.price > 0.0 {
        let text = format!("{}: {}৳", captions.price, data.price_text());
        rows.extend(Row::single(RowKind::Price, Field::Price, text, fonts.price));
    }

    let mut dates = Vec::new();
    if show.pack_date {
        let text = format!("{}: {}", captions.packaging, date_text(data.pack_date));
        dates.push(Span::field(Field::PackDate, text, fonts.pack_date));
    }
    if show.exp_date || data.exp_date.is_some() {
        let text = format!("{}: {}", captions.expiry, date_text(data.exp_date));
        dates.push(Span::field(Field::ExpDate, text, fonts.exp_date));
    }
    if dates.len() == 2 {
        dates.insert(1, Span::separator(fonts.pack_date.min(fonts.exp_date)));
    }
    if !dates.is_empty() {
        rows.push(Row {
            kind: RowKind::Dates,
            spans: dates,
        });
    }

    rows
}

// ============================================================================
// LAYOUT
// ============================================================================

/// Result of the auto-scale pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub width_px: f64,
    pub height_px: f64,
    /// Visible rows with their final font sizes.
    pub rows: Vec<Row>,
    /// Applied factor when `applied`, otherwise the computed fit ratio.
    pub scale: f64,
    pub applied: bool,
    /// Final barcode height, `None` when no barcode is drawn.
    pub barcode_height: Option<u32>,
}

impl Layout {
    /// Final font size of a visible field.
    pub fn font_size(&self, field: Field) -> Option<u32> {
        self.rows
            .iter()
            .flat_map(|r| &r.spans)
            .find(|s| s.field == Some(field))
            .map(|s| s.size)
    }

    /// `data` with the scaled font sizes and barcode height written back.
    pub fn apply(&self, data: &LabelData) -> LabelData {
        let mut out = data.clone();
        if !self.applied {
            return out;
        }
        for span in self.rows.iter().flat_map(|r| &r.spans) {
            if let Some(field) = span.field {
                out.fonts.set(field, span.size);
            }
        }
        if let Some(height) = self.barcode_height {
            out.barcode.height_px = height;
        }
        out
    }
}

/// `avail / need`, treating anything that fits as 1.
fn fit_ratio(avail: f64, need: f64) -> f64 {
    if need <= avail + EPSILON {
        1.0
    } else {
        (avail / need).max(0.0)
    }
}

/// Lay out `data`. `has_barcode` is whether a barcode symbol will be drawn.
pub fn compute_layout(data: &LabelData, captions: &Captions, has_barcode: bool) -> Layout {
    let width_px = data.label_size.width_mm * MM_TO_PX;
    let height_px = data.label_size.height_mm * MM_TO_PX;
    let usable_w = (width_px - 2.0 * PADDING_PX).max(0.0);
    let usable_h = (height_px - 2.0 * PADDING_PX).max(0.0);

    let barcode_reserve = if has_barcode {
        f64::from(data.barcode.height_px).min(usable_h * BARCODE_SHARE)
    } else {
        0.0
    };
    let text_h = (usable_h - barcode_reserve - BARCODE_GAP_PX).max(0.0);

    let mut rows = visible_rows(data, captions);
    let required: f64 = rows.iter().map(Row::height).sum();
    let ceiling = width_ceiling(&rows, usable_w);
    let fit = fit_ratio(text_h, required).min(ceiling).min(1.0);

    let barcode_height = has_barcode.then_some(data.barcode.height_px);
    if fit >= SCALE_THRESHOLD {
        return Layout {
            width_px,
            height_px,
            rows,
            scale: fit,
            applied: false,
            barcode_height,
        };
    }

    let (k, pinned) = water_fill(&rows, text_h, ceiling);
    for (row, pinned) in rows.iter_mut().zip(pinned) {
        row.scale_to(k, pinned);
    }
    tracing::debug!(fit, applied = k, "auto-scaled label");

    Layout {
        width_px,
        height_px,
        rows,
        scale: k,
        applied: true,
        barcode_height: barcode_height.map(|h| scaled(h, k).max(MIN_BARCODE_PX)),
    }
}

/// Smallest per-row width ratio, ignoring rows too long to fit even at the
/// minimum font size (shrinking everything would not save them).
fn width_ceiling(rows: &[Row], usable_w: f64) -> f64 {
    let limit = usable_w * WIDTH_TOLERANCE;
    rows.iter()
        .filter_map(|row| {
            let width = row.width();
            if width <= 0.0 {
                return None;
            }
            let ratio = fit_ratio(limit, width);
            (f64::from(row.size()) * ratio + EPSILON >= f64::from(MIN_FONT_PX)).then_some(ratio)
        })
        .fold(1.0, f64::min)
}

/// Find the factor that fills `text_h` given that rows which would drop
/// below the minimum are pinned at it. Returns the factor and which rows
/// are pinned.
fn water_fill(rows: &[Row], text_h: f64, ceiling: f64) -> (f64, Vec<bool>) {
    let mut pinned = vec![false; rows.len()];
    loop {
        let (fixed, flexible) = rows.iter().zip(&pinned).fold(
            (0.0, 0.0),
            |(fixed, flexible), (row, &pin)| {
                if pin {
                    (fixed + row.kind.weight() * f64::from(MIN_FONT_PX), flexible)
                } else {
                    (fixed, flexible + row.height())
                }
            },
        );

        let k = if flexible > 0.0 {
            (text_h - fixed) / flexible
        } else if fixed <= text_h + EPSILON {
            ceiling
        } else {
            0.0
        };
        let k = k.min(ceiling).min(1.0).max(0.0);

        let mut changed = false;
        for (row, pin) in rows.iter().zip(pinned.iter_mut()) {
            if !*pin && scaled(row.size(), k) < MIN_FONT_PX {
                *pin = true;
                changed = true;
            }
        }
        if !changed {
            return (k, pinned);
        }
    }
}
