use crate::geometry::Size;
use crate::source::{
    is_placeholder, resolve_source, ElementView, PageLocation, EMPTY_DATA_URI,
    PLACEHOLDER_GIF_PREFIX, PLACEHOLDER_MARKER,
};

/// A rendered box at or above this share of the intrinsic size on both axes
/// is already "full size" and gets no preview.
pub const FULL_SIZE_COVERAGE: f64 = 0.9;

const INLINE_SVG_MARKER: &str = "data:image/svg";

pub fn is_eligible(element: &impl ElementView, page: &PageLocation) -> bool {
    if element.is_image() {
        return resolve_source(element, page)
            .map(|src| is_eligible_source(&src))
            .unwrap_or(false);
    }
    element
        .background_image()
        .map(|value| is_eligible_background(&value))
        .unwrap_or(false)
}

pub fn is_eligible_source(src: &str) -> bool {
    !src.starts_with(INLINE_SVG_MARKER) && !is_placeholder(src)
}

pub fn is_eligible_background(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "none" && !value.contains(INLINE_SVG_MARKER)
}

/// Check applied right before a load starts.
pub fn passes_early_check(src: &str) -> bool {
    !src.starts_with(PLACEHOLDER_GIF_PREFIX)
        && src != EMPTY_DATA_URI
        && !src.contains(PLACEHOLDER_MARKER)
}

/// True when the element is already displayed at (nearly) its intrinsic size.
/// An unknown or collapsed box never suppresses the preview.
pub fn covers_intrinsic(display: Size, intrinsic: Size) -> bool {
    if display.is_empty() || intrinsic.is_empty() {
        return false;
    }
    display.width >= intrinsic.width * FULL_SIZE_COVERAGE
        && display.height >= intrinsic.height * FULL_SIZE_COVERAGE
}
