mod chrome;
mod content;
pub mod dom;
mod input;
pub mod overlay;
mod persisted_store;
mod popup;

use wasm_bindgen::prelude::*;

/// Installs the hover preview on the current page.
#[wasm_bindgen]
pub fn start_content() {
    content::start();
}

/// Wires the toolbar popup controls.
#[wasm_bindgen]
pub fn start_popup() {
    popup::start();
}
