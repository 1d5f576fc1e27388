/// Gap between the cursor and the overlay's nearest corner.
pub const CURSOR_OFFSET_PX: f64 = 15.0;
/// Distance from the right/bottom viewport edge that triggers a flip.
pub const EDGE_MARGIN_PX: f64 = 20.0;
/// Minimum distance kept from the top-left viewport origin.
pub const MIN_INSET_PX: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Overlay box in viewport pixels, ready for a fixed-position element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverlayGeometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Places the preview next to the cursor, capped per axis to
/// `viewport * size_ratio` and flipped away from the right/bottom edges.
pub fn compute_geometry(
    cursor: Point,
    intrinsic: Size,
    viewport: Size,
    size_ratio: f64,
) -> OverlayGeometry {
    let width = intrinsic.width.min(viewport.width * size_ratio);
    let height = intrinsic.height.min(viewport.height * size_ratio);

    let mut left = cursor.x + CURSOR_OFFSET_PX;
    let mut top = cursor.y + CURSOR_OFFSET_PX;

    if left + width > viewport.width - EDGE_MARGIN_PX {
        left = cursor.x - width - CURSOR_OFFSET_PX;
    }
    if top + height > viewport.height - EDGE_MARGIN_PX {
        top = cursor.y - height - CURSOR_OFFSET_PX;
    }

    OverlayGeometry {
        left: left.max(MIN_INSET_PX),
        top: top.max(MIN_INSET_PX),
        width,
        height,
    }
}
