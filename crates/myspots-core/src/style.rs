//! Marker style and visibility policy
//!
//! Style ids follow the Google My Maps convention `icon-{code}-{color}-nodesc`.
//! See: https://github.com/kitchen/kml-icon-converter/blob/master/style_map.csv

use crate::models::Flag;

/// Style id shared by every marker without category styling
pub const FALLBACK_STYLE_ID: &str = "icon-1899-757575-nodesc";

/// Icon image referenced by every style definition
pub const ICON_HREF: &str = "https://www.gstatic.com/mapspro/images/stock/503-wht-blank_maps.png";

/// Marker color band, selected by flag priority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBand {
    Yellow,
    Green,
    Blue,
    Gray,
}

impl ColorBand {
    /// Every band, in the order style definitions are emitted
    pub const ALL: [ColorBand; 4] = [
        ColorBand::Blue,
        ColorBand::Yellow,
        ColorBand::Green,
        ColorBand::Gray,
    ];

    /// Hex color used in the style id
    pub fn hex(self) -> &'static str {
        match self {
            ColorBand::Yellow => "F9A825",
            ColorBand::Green => "558B2F",
            ColorBand::Blue => "0288D1",
            ColorBand::Gray => "757575",
        }
    }
}

/// Pick the color band for a set of flags
///
/// First match wins: Favorite, then Queued, then Visited. A place can carry
/// several of these at once; favorites outrank queued, which outrank
/// merely-visited.
pub fn color_band(flags: &[Flag]) -> ColorBand {
    if flags.contains(&Flag::Favorite) {
        ColorBand::Yellow
    } else if flags.contains(&Flag::Queued) {
        ColorBand::Green
    } else if flags.contains(&Flag::Visited) {
        ColorBand::Blue
    } else {
        ColorBand::Gray
    }
}

/// Compose a style id from an icon code and color band
pub fn style_id(icon_code: &str, color: ColorBand) -> String {
    format!("icon-{}-{}-nodesc", icon_code, color.hex())
}

/// Style reference for a marker
///
/// Falls back to the shared generic pin when styling is disabled or the
/// category has no icon code.
pub fn marker_style(flags: &[Flag], icon_code: Option<&str>, styles_enabled: bool) -> String {
    match icon_code {
        Some(code) if styles_enabled => format!("#{}", style_id(code, color_band(flags))),
        _ => format!("#{}", FALLBACK_STYLE_ID),
    }
}

/// Whether a place is excluded from export entirely
pub fn is_excluded(flags: &[Flag]) -> bool {
    flags
        .iter()
        .any(|flag| matches!(flag, Flag::PermanentlyClosed | Flag::Lame))
}

/// Initial visibility for folders
///
/// The root document is always visible; folders start hidden only when the
/// export runs with `--default-invisible`.
pub fn folder_visibility(default_invisible: bool) -> bool {
    !default_invisible
}
