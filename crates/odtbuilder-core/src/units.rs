//! Unit conversion and CSS value normalization
//!
//! The editor works in CSS pixels, rem and spacing units; the document
//! model works in points and centimeters.

use odtbuilder_ast::PropValue;
use odtbuilder_odf::{FontWeight, TextAlign};

/// Points per CSS pixel (72 / 96)
pub const PT_PER_PX: f64 = 0.75;

/// Font size used when a size prop is not numeric
pub const FALLBACK_POINTS: f64 = 12.0;

/// Centimeters per CSS pixel (2.54 / 96)
pub const CM_PER_PX: f64 = 2.54 / 96.0;

/// CSS pixels per rem
pub const PX_PER_REM: f64 = 16.0;

/// CSS pixels per editor spacing unit (0.25rem)
pub const PX_PER_SPACING_UNIT: f64 = 4.0;

/// Font family used for empty or inherited families
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Largest font size written to a style
pub const MAX_FONT_POINTS: f64 = 400.0;

/// Largest padding, gap or margin accepted, in pixels
pub const MAX_SPACING_PX: f64 = 256.0;

/// Largest line height written to a style, in percent
pub const MAX_LINE_HEIGHT_PCT: f64 = 1000.0;

/// Convert a pixel value to points
///
/// Non-numeric and non-positive values yield [`FALLBACK_POINTS`]; large
/// sizes are capped at [`MAX_FONT_POINTS`].
pub fn to_points(value: &PropValue) -> f64 {
    value
        .as_number()
        .filter(|px| *px > 0.0)
        .map(|px| (px * PT_PER_PX).min(MAX_FONT_POINTS))
        .unwrap_or(FALLBACK_POINTS)
}

/// Clamp a spacing length to `0..=MAX_SPACING_PX`
pub fn spacing_px(px: f64) -> f64 {
    if px.is_nan() {
        return 0.0;
    }
    px.clamp(0.0, MAX_SPACING_PX)
}

/// Convert pixels to centimeters
pub fn px_to_cm(px: f64) -> f64 {
    px * CM_PER_PX
}

/// Normalize a CSS font-family list to a single family name
///
/// ```
/// use odtbuilder_core::units::normalize_font_family;
///
/// assert_eq!(normalize_font_family(Some("'Open Sans', sans-serif")), "Open Sans");
/// assert_eq!(normalize_font_family(Some("inherit")), "Arial");
/// ```
pub fn normalize_font_family(value: Option<&str>) -> String {
    let first = value
        .and_then(|list| list.split(',').next())
        .map(|family| family.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .unwrap_or("");

    if first.is_empty() || first.eq_ignore_ascii_case("inherit") {
        DEFAULT_FONT_FAMILY.to_string()
    } else {
        first.to_string()
    }
}

/// Map a CSS font-weight to bold or normal
pub fn font_weight(value: Option<&PropValue>) -> FontWeight {
    let Some(value) = value else {
        return FontWeight::Normal;
    };
    if let Some(weight) = value.as_number() {
        return if weight >= 600.0 {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        };
    }
    match value.as_str().map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("bold") | Some("bolder") => FontWeight::Bold,
        _ => FontWeight::Normal,
    }
}

/// Map a CSS text-align value
pub fn text_align(value: Option<&str>) -> TextAlign {
    TextAlign::from_css(value.unwrap_or("left"))
}

/// Normalize a CSS color, expanding `#rgb` shorthand
///
/// Anything other than a short hex color is passed through unchanged.
pub fn normalize_color(value: &str) -> String {
    let value = value.trim();
    match value.strip_prefix('#') {
        Some(hex) if hex.len() == 3 && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            let mut expanded = String::with_capacity(7);
            expanded.push('#');
            for c in hex.chars() {
                expanded.push(c.to_ascii_lowercase());
                expanded.push(c.to_ascii_lowercase());
            }
            expanded
        }
        _ => value.to_string(),
    }
}

/// Parse a percentage such as `"50%"` or `"33.33%"`
pub fn parse_percentage(value: &str) -> Option<f64> {
    value
        .trim()
        .strip_suffix('%')?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|pct| pct.is_finite() && *pct > 0.0)
}

/// Relative width in percent for an image width prop
///
/// `"auto"`, absent or unparsable values mean full width; percentages are
/// capped at 100.
pub fn relative_width(value: Option<&PropValue>) -> f64 {
    let pct = match value {
        Some(PropValue::Text(text)) => parse_percentage(text),
        Some(PropValue::Number(n)) if n.is_finite() && *n > 0.0 => Some(*n),
        _ => None,
    };
    pct.map(|pct| pct.min(100.0)).unwrap_or(100.0)
}

/// Line height as a percentage of the font size
///
/// Accepts a multiplier (`1.5`) or a percentage string (`"150%"`).
pub fn line_height_pct(value: Option<&PropValue>, default_multiplier: f64) -> f64 {
    let from_prop = value.and_then(|value| match value {
        PropValue::Text(text) if text.trim().ends_with('%') => parse_percentage(text),
        other => other
            .as_number()
            .filter(|m| *m > 0.0)
            .map(|multiplier| multiplier * 100.0),
    });
    from_prop
        .unwrap_or(default_multiplier * 100.0)
        .min(MAX_LINE_HEIGHT_PCT)
}
