use std::cell::RefCell;

use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement};

use crate::chrome;
use crate::persisted_store::{load_popup_settings, save_disabled, save_size_percent};
use image_hover_core::{Debounce, Notification, PageLocation, SIZE_SAVE_DEBOUNCE_MS};

const TOGGLE_ID: &str = "toggle";
const SITE_ID: &str = "currentSite";
const STATUS_ID: &str = "status";
const SLIDER_ID: &str = "sizeSlider";
const SIZE_LABEL_ID: &str = "sizeValue";

const ENABLED_COLOR: &str = "#4CAF50";
const WARNING_COLOR: &str = "#ff6b35";

const REFRESH_HINT: &str = "Settings saved, refresh page to take effect";

thread_local! {
    static POPUP: RefCell<Option<PopupState>> = RefCell::new(None);
}

struct PopupState {
    hostname: String,
    tab_id: f64,
    enabled: bool,
    pending_size: Debounce<i64>,
    save_timer: Option<Timeout>,
    _listeners: Vec<EventListener>,
}

fn with_popup<R>(f: impl FnOnce(&mut PopupState) -> R) -> Option<R> {
    POPUP.with(|cell| {
        let mut slot = cell.try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    })
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn element(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

fn set_text(id: &str, text: &str) {
    if let Some(element) = element(id) {
        element.set_text_content(Some(text));
    }
}

fn set_status(text: &str, color: &str) {
    let Some(status) = element(STATUS_ID).and_then(|el| el.dyn_into::<HtmlElement>().ok()) else {
        return;
    };
    status.set_text_content(Some(text));
    let _ = status.style().set_property("color", color);
}

fn render_enabled(enabled: bool) {
    if let Some(toggle) = element(TOGGLE_ID) {
        let _ = toggle.class_list().toggle_with_force("active", enabled);
    }
    if enabled {
        set_status("Preview enabled", ENABLED_COLOR);
    } else {
        set_status("Preview disabled", WARNING_COLOR);
    }
}

fn render_size(percent: u32) {
    if let Some(slider) = element(SLIDER_ID).and_then(|el| el.dyn_into::<HtmlInputElement>().ok()) {
        slider.set_value(&percent.to_string());
    }
    set_text(SIZE_LABEL_ID, &format!("{percent}%"));
}

async fn toggle_preview() {
    let Some((hostname, tab_id, enabled)) = with_popup(|popup| {
        popup.enabled = !popup.enabled;
        (popup.hostname.clone(), popup.tab_id, popup.enabled)
    }) else {
        return;
    };
    render_enabled(enabled);

    if let Err(err) = save_disabled(&hostname, !enabled).await {
        gloo::console::warn!("image hover: could not save site setting", err);
        with_popup(|popup| popup.enabled = !enabled);
        render_enabled(!enabled);
        set_status("Error occurred, please try again", WARNING_COLOR);
        return;
    }
    let message = Notification::TogglePreview {
        enabled,
        hostname: Some(hostname),
    };
    if let Err(err) = chrome::send_to_tab(tab_id, &message).await {
        gloo::console::log!("image hover: content script unreachable, page may need refresh", err);
        set_status(REFRESH_HINT, WARNING_COLOR);
    }
}

fn on_size_input(raw: &str) {
    let Ok(value) = raw.trim().parse::<i64>() else {
        return;
    };
    set_text(SIZE_LABEL_ID, &format!("{value}%"));
    with_popup(|popup| {
        let token = popup.pending_size.push(value);
        popup.save_timer = Some(Timeout::new(SIZE_SAVE_DEBOUNCE_MS, move || {
            spawn_local(save_size(token));
        }));
    });
}

/// Persists the slider value if `token` is still the latest input.
async fn save_size(token: u64) {
    let latest = with_popup(|popup| {
        let tab_id = popup.tab_id;
        popup.pending_size.fire(token).map(|value| (value, tab_id))
    });
    let Some((value, tab_id)) = latest.flatten() else {
        return;
    };
    let percent = match save_size_percent(value).await {
        Ok(percent) => percent,
        Err(err) => {
            gloo::console::warn!("image hover: size save failed", err);
            set_status("Failed to save size setting", WARNING_COLOR);
            return;
        }
    };
    render_size(percent);
    let message = Notification::UpdateSize {
        max_size: i64::from(percent),
    };
    if let Err(err) = chrome::send_to_tab(tab_id, &message).await {
        gloo::console::log!("image hover: content script unreachable, page may need refresh", err);
        set_status(REFRESH_HINT, WARNING_COLOR);
    }
}

fn popup_listeners() -> Vec<EventListener> {
    let mut listeners = Vec::new();
    if let Some(toggle) = element(TOGGLE_ID) {
        listeners.push(EventListener::new(&toggle, "click", |_event: &Event| {
            spawn_local(toggle_preview());
        }));
    }
    if let Some(slider) = element(SLIDER_ID).and_then(|el| el.dyn_into::<HtmlInputElement>().ok()) {
        let source = slider.clone();
        listeners.push(EventListener::new(&slider, "input", move |_event: &Event| {
            on_size_input(&source.value());
        }));
    }
    listeners
}

async fn init() -> Result<(), String> {
    let tab = chrome::active_tab().await?;
    let page = PageLocation::parse(&tab.url).map_err(|err| err.to_string())?;
    let hostname = page.hostname().to_string();
    set_text(SITE_ID, &hostname);

    let settings = load_popup_settings(&hostname).await?;
    render_enabled(settings.enabled);
    render_size(settings.size_percent);

    let state = PopupState {
        hostname,
        tab_id: tab.id,
        enabled: settings.enabled,
        pending_size: Debounce::new(),
        save_timer: None,
        _listeners: popup_listeners(),
    };
    POPUP.with(|cell| *cell.borrow_mut() = Some(state));
    Ok(())
}

/// Entry point of the toolbar popup page.
pub fn start() {
    spawn_local(async {
        if let Err(err) = init().await {
            gloo::console::warn!("image hover: popup failed to initialize", err);
            set_text(SITE_ID, "Unable to get site information");
            set_status("Error occurred, please try again", WARNING_COLOR);
        }
    });
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn attach(id: &str) -> Element {
        let document = document().unwrap();
        let element = document.create_element("div").unwrap();
        element.set_id(id);
        document.body().unwrap().append_child(&element).unwrap();
        element
    }

    // Outside an extension page the storage write always fails.
    #[wasm_bindgen_test(async)]
    async fn failed_toggle_write_restores_previous_state() {
        let toggle = attach(TOGGLE_ID);
        let status = attach(STATUS_ID);
        render_enabled(true);
        POPUP.with(|cell| {
            *cell.borrow_mut() = Some(PopupState {
                hostname: "a.test".to_string(),
                tab_id: 1.0,
                enabled: true,
                pending_size: Debounce::new(),
                save_timer: None,
                _listeners: Vec::new(),
            })
        });

        toggle_preview().await;

        assert_eq!(with_popup(|popup| popup.enabled), Some(true));
        assert!(toggle.class_list().contains("active"));
        assert_eq!(
            status.text_content().as_deref(),
            Some("Error occurred, please try again")
        );
        toggle.remove();
        status.remove();
    }
}
