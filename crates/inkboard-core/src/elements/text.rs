//! Text extent estimation.

use super::{DrawingElement, Geometry};
use kurbo::Rect;

/// Average glyph width relative to the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.55;

/// Line height relative to the font size.
const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Narrowest box a text element occupies, so empty text stays hittable.
const MIN_TEXT_WIDTH: f64 = 20.0;

/// Approximate `(width, height)` of `content` at `font_size`.
pub fn approximate_extent(content: &str, font_size: f64) -> (f64, f64) {
    let widest = content.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut line_count = content.lines().count().max(1);
    if content.ends_with('\n') {
        line_count += 1;
    }
    (
        (widest as f64 * font_size * CHAR_WIDTH_FACTOR).max(MIN_TEXT_WIDTH),
        line_count as f64 * font_size * LINE_HEIGHT_FACTOR,
    )
}

/// Bounding box of a text element: anchor at top-left plus its extent.
///
/// Uses the renderer-measured extent when one was recorded.
pub fn text_bounds(element: &DrawingElement) -> Rect {
    let Geometry::Text { x1, y1, text } = &element.geometry else {
        return element.bounds();
    };
    let (width, height) = element
        .measured_extent()
        .unwrap_or_else(|| approximate_extent(text, element.style.size));
    Rect::new(*x1, *y1, x1 + width, y1 + height)
}
