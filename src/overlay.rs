use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, HtmlImageElement};

use crate::chrome::js_err;
use image_hover_core::{OverlayGeometry, Size};

pub const OVERLAY_ID: &str = "image-hover-preview";
pub const OVERLAY_SELECTOR: &str = "#image-hover-preview";

const OVERLAY_STYLE: &str = "position: fixed !important; \
    z-index: 2147483647 !important; \
    pointer-events: none !important; \
    opacity: 0; \
    transition: opacity 0.2s ease-in-out; \
    border-radius: 8px; \
    box-shadow: 0 10px 25px rgba(0, 0, 0, 0.3); \
    background: #fff; \
    border: 2px solid #ddd; \
    overflow: hidden; \
    display: block !important; \
    visibility: visible !important;";

const IMAGE_STYLE: &str = "display: block; \
    max-width: 100%; \
    max-height: 100%; \
    width: auto; \
    height: auto;";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecodeOutcome {
    Loaded { generation: u64, intrinsic: Size },
    Failed { generation: u64 },
}

struct OverlayNode {
    generation: u64,
    root: HtmlElement,
    image: HtmlImageElement,
    _on_load: Closure<dyn FnMut()>,
    _on_error: Closure<dyn FnMut()>,
}

impl OverlayNode {
    fn detach(&self) {
        self.image.set_onload(None);
        self.image.set_onerror(None);
        self.root.remove();
    }
}

/// Owns the single overlay node. A node is created per hover cycle and never reused.
pub struct OverlayController {
    node: Option<OverlayNode>,
    on_decode: Rc<dyn Fn(DecodeOutcome)>,
}

impl OverlayController {
    pub fn new(on_decode: impl Fn(DecodeOutcome) + 'static) -> Self {
        Self {
            node: None,
            on_decode: Rc::new(on_decode),
        }
    }

    pub fn generation(&self) -> Option<u64> {
        self.node.as_ref().map(|node| node.generation)
    }

    pub fn is_attached(&self) -> bool {
        self.node
            .as_ref()
            .map(|node| node.root.is_connected())
            .unwrap_or(false)
    }

    /// Builds a fresh, transparent overlay and starts decoding `url` into it.
    pub fn load(&mut self, generation: u64, url: &str) -> Result<(), String> {
        if let Some(previous) = self.node.take() {
            previous.detach();
        }
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| "missing document".to_string())?;
        let body = document.body().ok_or_else(|| "missing body".to_string())?;

        let root = document
            .create_element("div")
            .map_err(js_err)?
            .dyn_into::<HtmlElement>()
            .map_err(|element| js_err(element.into()))?;
        root.set_id(OVERLAY_ID);
        root.style().set_css_text(OVERLAY_STYLE);

        let image = document
            .create_element("img")
            .map_err(js_err)?
            .dyn_into::<HtmlImageElement>()
            .map_err(|element| js_err(element.into()))?;
        image.style().set_css_text(IMAGE_STYLE);

        let on_load = {
            let image = image.clone();
            let on_decode = self.on_decode.clone();
            Closure::<dyn FnMut()>::new(move || {
                let intrinsic =
                    Size::new(image.natural_width() as f64, image.natural_height() as f64);
                on_decode(DecodeOutcome::Loaded {
                    generation,
                    intrinsic,
                });
            })
        };
        let on_error = {
            let on_decode = self.on_decode.clone();
            Closure::<dyn FnMut()>::new(move || {
                on_decode(DecodeOutcome::Failed { generation });
            })
        };
        image.set_onload(Some(on_load.as_ref().unchecked_ref()));
        image.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        root.append_child(&image).map_err(js_err)?;
        body.append_child(&root).map_err(js_err)?;
        image.set_src(url);

        self.node = Some(OverlayNode {
            generation,
            root,
            image,
            _on_load: on_load,
            _on_error: on_error,
        });
        Ok(())
    }

    pub fn apply_geometry(&self, generation: u64, geometry: OverlayGeometry) {
        let Some(node) = self.node_for(generation) else {
            return;
        };
        let style = node.root.style();
        let applied = style
            .set_property("left", &px(geometry.left))
            .and_then(|_| style.set_property("top", &px(geometry.top)))
            .and_then(|_| style.set_property("max-width", &px(geometry.width)))
            .and_then(|_| style.set_property("max-height", &px(geometry.height)));
        if let Err(err) = applied {
            gloo::console::warn!("image hover: could not position overlay", js_err(err));
        }
    }

    pub fn reveal(&self, generation: u64, geometry: OverlayGeometry) {
        self.apply_geometry(generation, geometry);
        self.set_opacity(generation, "1");
    }

    pub fn fade_out(&self, generation: u64) {
        self.set_opacity(generation, "0");
    }

    /// Removes the node of `generation`. Returns false when it is already gone.
    pub fn remove(&mut self, generation: u64) -> bool {
        if self.generation() != Some(generation) {
            return false;
        }
        match self.node.take() {
            Some(node) => {
                node.detach();
                true
            }
            None => false,
        }
    }

    fn set_opacity(&self, generation: u64, opacity: &str) {
        if let Some(node) = self.node_for(generation) {
            let _ = node.root.style().set_property("opacity", opacity);
        }
    }

    fn node_for(&self, generation: u64) -> Option<&OverlayNode> {
        self.node.as_ref().filter(|node| node.generation == generation)
    }
}

impl Drop for OverlayController {
    fn drop(&mut self) {
        if let Some(node) = self.node.take() {
            node.detach();
        }
    }
}

fn px(value: f64) -> String {
    format!("{value}px")
}
