use wasm_bindgen::JsCast;
use web_sys::{Element, Event, MouseEvent};

use image_hover_core::Point;

/// Viewport coordinates of a mouse event.
pub(crate) fn cursor_of(event: &Event) -> Option<Point> {
    let mouse = event.dyn_ref::<MouseEvent>()?;
    Some(Point::new(mouse.client_x() as f64, mouse.client_y() as f64))
}

pub(crate) fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}
