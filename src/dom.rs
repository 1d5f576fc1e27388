use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, HtmlImageElement};

use image_hover_core::{ElementView, PageLocation, Size};

/// Selector for candidates inside freshly inserted subtrees.
pub const CANDIDATE_SELECTOR: &str = "img, [style*=\"background-image\"]";

/// Borrowed DOM element seen through the resolver's eyes.
pub struct DomElement<'a>(pub &'a Element);

impl ElementView for DomElement<'_> {
    fn is_image(&self) -> bool {
        self.0.dyn_ref::<HtmlImageElement>().is_some()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn current_src(&self) -> Option<String> {
        self.0.dyn_ref::<HtmlImageElement>().map(HtmlImageElement::src)
    }

    fn background_image(&self) -> Option<String> {
        computed_style(self.0, "background-image")
    }
}

pub fn computed_style(element: &Element, property: &str) -> Option<String> {
    let window = web_sys::window()?;
    let style = window.get_computed_style(element).ok()??;
    style.get_property_value(property).ok()
}

pub fn page_location() -> Option<PageLocation> {
    let href = web_sys::window()?.location().href().ok()?;
    PageLocation::parse(&href).ok()
}

pub fn viewport() -> Size {
    let Some(window) = web_sys::window() else {
        return Size::default();
    };
    let width = window
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or_default();
    let height = window
        .inner_height()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or_default();
    Size::new(width, height)
}

/// Rendered box of an element: layout size, or the `width`/`height`
/// attributes of an image that has not been laid out yet.
pub fn display_size(element: &Element) -> Option<Size> {
    let html = element.dyn_ref::<HtmlElement>()?;
    let mut width = html.offset_width() as f64;
    let mut height = html.offset_height() as f64;
    if let Some(image) = element.dyn_ref::<HtmlImageElement>() {
        if width <= 0.0 {
            width = image.width() as f64;
        }
        if height <= 0.0 {
            height = image.height() as f64;
        }
    }
    Some(Size::new(width, height))
}
