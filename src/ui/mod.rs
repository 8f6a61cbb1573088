/// iced widgets drawn from the headless presentation state
///
/// - `gallery.rs` - image cards, list/grid layouts, enlarged overlay
/// - `toolbar.rs` - layout buttons, filter stars, import button

pub mod gallery;
pub mod toolbar;

/// Filled and empty star glyphs
pub const STAR_FULL: &str = "★";
pub const STAR_EMPTY: &str = "☆";

pub fn star_glyph(star: u8, filled: u8) -> &'static str {
    if star <= filled {
        STAR_FULL
    } else {
        STAR_EMPTY
    }
}
