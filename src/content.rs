//! Content-script runtime: feeds page events into the hover scheduler and
//! interprets the effects it returns against the live DOM.

use std::cell::RefCell;
use std::collections::VecDeque;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::timers::callback::Timeout;
use js_sys::{Array, Object, WeakSet};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Element, Event, MouseEvent, MutationObserver, MutationObserverInit, MutationRecord, Node,
};

use crate::chrome;
use crate::dom::{self, DomElement, CANDIDATE_SELECTOR};
use crate::input::{cursor_of, target_element};
use crate::overlay::{DecodeOutcome, OverlayController, OVERLAY_SELECTOR};
use crate::persisted_store::load_page_settings;
use image_hover_core::{
    is_eligible, parse_notification, resolve_source, Effect, HoverEvent, HoverScheduler,
    NotificationResponse, PageLocation, PreviewConfig, PreviewHost, PreviewState, SettingsBridge,
    Size,
};

thread_local! {
    static RUNTIME: RefCell<Option<ContentRuntime>> = RefCell::new(None);
}

/// The page as the scheduler sees it.
struct PageHost {
    page: PageLocation,
    settings: SettingsBridge,
}

impl PreviewHost<Element> for PageHost {
    fn enabled(&self) -> bool {
        self.settings.enabled()
    }

    fn size_ratio(&self) -> f64 {
        self.settings.size_ratio()
    }

    fn viewport(&self) -> Size {
        dom::viewport()
    }

    fn resolve(&self, target: &Element) -> Option<String> {
        resolve_source(&DomElement(target), &self.page)
    }

    fn display_size(&self, target: &Element) -> Option<Size> {
        dom::display_size(target)
    }
}

type MutationCallback = Closure<dyn FnMut(Array, MutationObserver)>;
type ElementCallback = Closure<dyn FnMut(Event)>;

/// One `mouseenter` and one `mouseleave` callback shared by every bound
/// element. They read `currentTarget`, so no element is kept alive by them.
struct BoundCallbacks {
    enter: ElementCallback,
    leave: ElementCallback,
}

impl BoundCallbacks {
    fn new() -> Self {
        let enter = Closure::<dyn FnMut(Event)>::new(|event: Event| {
            let (Some(target), Some(cursor)) = (current_element(&event), cursor_of(&event)) else {
                return;
            };
            dispatch(HoverEvent::Enter { target, cursor });
        });
        let leave = Closure::<dyn FnMut(Event)>::new(|event: Event| {
            if let Some(target) = current_element(&event) {
                dispatch(HoverEvent::Leave { target });
            }
        });
        Self { enter, leave }
    }
}

fn current_element(event: &Event) -> Option<Element> {
    event.current_target()?.dyn_into::<Element>().ok()
}

struct ContentRuntime {
    scheduler: HoverScheduler<Element>,
    host: PageHost,
    overlay: OverlayController,
    hover_timer: Option<Timeout>,
    fade_timer: Option<Timeout>,
    bound: WeakSet,
    callbacks: BoundCallbacks,
    _listeners: Vec<EventListener>,
    observer: Option<(MutationObserver, MutationCallback)>,
}

impl Drop for ContentRuntime {
    fn drop(&mut self) {
        if let Some((observer, _)) = &self.observer {
            observer.disconnect();
        }
    }
}

impl ContentRuntime {
    /// Applies one effect; returns an event to feed back when the effect failed.
    fn apply(&mut self, effect: Effect) -> Option<HoverEvent<Element>> {
        match effect {
            Effect::StartTimer {
                generation,
                delay_ms,
            } => {
                self.hover_timer = Some(Timeout::new(delay_ms, move || {
                    dispatch(HoverEvent::TimerFired { generation });
                }));
            }
            Effect::CancelTimer => self.hover_timer = None,
            Effect::LoadImage { generation, url } => {
                if let Err(err) = self.overlay.load(generation, &url) {
                    gloo::console::warn!("image hover: overlay creation failed", err);
                    return Some(HoverEvent::DecodeFailed { generation });
                }
            }
            Effect::Reveal {
                generation,
                geometry,
            } => {
                if let PreviewState::Visible { url, intrinsic, .. } = self.scheduler.state() {
                    gloo::console::log!(
                        "image hover: preview",
                        url.clone(),
                        format!("{}x{}", intrinsic.width, intrinsic.height),
                        format!(
                            "at {},{} max {}x{}",
                            geometry.left, geometry.top, geometry.width, geometry.height
                        )
                    );
                }
                self.overlay.reveal(generation, geometry);
            }
            Effect::Reposition {
                generation,
                geometry,
            } => self.overlay.apply_geometry(generation, geometry),
            Effect::FadeOut {
                generation,
                fade_ms,
            } => {
                self.overlay.fade_out(generation);
                self.fade_timer = Some(Timeout::new(fade_ms, move || {
                    dispatch(HoverEvent::HideElapsed { generation });
                }));
            }
            Effect::RemoveOverlay { generation } => {
                self.overlay.remove(generation);
            }
        }
        None
    }

    fn bind_subtree(&mut self, node: &Node) {
        let Some(element) = node.dyn_ref::<Element>() else {
            return;
        };
        if element.matches(CANDIDATE_SELECTOR).unwrap_or(false) {
            self.bind(element);
        }
        let Ok(found) = element.query_selector_all(CANDIDATE_SELECTOR) else {
            return;
        };
        for index in 0..found.length() {
            let candidate = found.item(index).and_then(|node| node.dyn_into::<Element>().ok());
            if let Some(candidate) = candidate {
                self.bind(&candidate);
            }
        }
    }

    /// Attaches the shared enter/leave callbacks to an eligible element, once.
    /// Returns whether the element was newly bound.
    fn bind(&mut self, element: &Element) -> bool {
        let key: &Object = element.as_ref();
        if self.bound.has(key)
            || inside_overlay(element)
            || !is_eligible(&DomElement(element), &self.host.page)
        {
            return false;
        }
        let attached = element
            .add_event_listener_with_callback(
                "mouseenter",
                self.callbacks.enter.as_ref().unchecked_ref(),
            )
            .and_then(|_| {
                element.add_event_listener_with_callback(
                    "mouseleave",
                    self.callbacks.leave.as_ref().unchecked_ref(),
                )
            });
        if let Err(err) = attached {
            gloo::console::warn!("image hover: could not bind element", chrome::js_err(err));
            return false;
        }
        self.bound.add(key);
        true
    }
}

fn inside_overlay(element: &Element) -> bool {
    matches!(element.closest(OVERLAY_SELECTOR), Ok(Some(_)))
}

/// `mouseout` bubbles from descendants; this reports when it means the
/// pointer left `tracked` altogether.
fn leaves(tracked: &Element, origin: &Node, related: Option<&Node>) -> bool {
    tracked.contains(Some(origin))
        && !related
            .map(|related| tracked.contains(Some(related)))
            .unwrap_or(false)
}

fn with_runtime<R>(f: impl FnOnce(&mut ContentRuntime) -> R) -> Option<R> {
    RUNTIME.with(|cell| {
        let mut slot = cell.try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    })
}

/// Runs an event through the scheduler and interprets the resulting effects.
/// The runtime borrow is released between steps.
fn dispatch(event: HoverEvent<Element>) {
    let mut queue = VecDeque::from([event]);
    while let Some(event) = queue.pop_front() {
        let Some(effects) = with_runtime(|runtime| runtime.scheduler.handle(event, &runtime.host))
        else {
            return;
        };
        for effect in effects {
            if let Some(follow_up) = with_runtime(|runtime| runtime.apply(effect)).flatten() {
                queue.push_back(follow_up);
            }
        }
    }
}

fn on_decode(outcome: DecodeOutcome) {
    let event = match outcome {
        DecodeOutcome::Loaded {
            generation,
            intrinsic,
        } => HoverEvent::DecodeLoaded {
            generation,
            intrinsic,
        },
        DecodeOutcome::Failed { generation } => {
            gloo::console::log!("image hover: image failed to load");
            HoverEvent::DecodeFailed { generation }
        }
    };
    dispatch(event);
}

fn on_message(request: &JsValue) -> JsValue {
    let response = match handle_message(request) {
        Ok(response) => response,
        Err(err) => {
            gloo::console::warn!("image hover: rejected message", err);
            NotificationResponse::failed()
        }
    };
    chrome::from_json(&response).unwrap_or(JsValue::NULL)
}

fn handle_message(request: &JsValue) -> Result<NotificationResponse, String> {
    let raw = chrome::to_json(request)?.to_string();
    let notification = parse_notification(&raw).map_err(|err| err.to_string())?;
    let outcome = with_runtime(|runtime| runtime.host.settings.handle(&notification))
        .ok_or_else(|| "runtime busy".to_string())?;
    if outcome.dismiss {
        dispatch(HoverEvent::Dismiss);
    }
    Ok(outcome.response)
}

fn document_listeners(document: &web_sys::Document) -> Vec<EventListener> {
    let mut listeners = Vec::new();

    listeners.push(EventListener::new(document, "mouseover", |event: &Event| {
        let (Some(target), Some(cursor)) = (target_element(event), cursor_of(event)) else {
            return;
        };
        let eligible =
            with_runtime(|runtime| is_eligible(&DomElement(&target), &runtime.host.page))
                .unwrap_or(false);
        if eligible {
            dispatch(HoverEvent::Enter { target, cursor });
        }
    }));

    listeners.push(EventListener::new(document, "mouseout", |event: &Event| {
        let tracked = with_runtime(|runtime| runtime.scheduler.state().target().cloned());
        let Some(tracked) = tracked.flatten() else {
            return;
        };
        let Some(origin) = event.target().and_then(|origin| origin.dyn_into::<Node>().ok()) else {
            return;
        };
        let related = event
            .dyn_ref::<MouseEvent>()
            .and_then(MouseEvent::related_target)
            .and_then(|related| related.dyn_into::<Node>().ok());
        if leaves(&tracked, &origin, related.as_ref()) {
            dispatch(HoverEvent::Leave { target: tracked });
        }
    }));

    listeners.push(EventListener::new(document, "mousemove", |event: &Event| {
        if let Some(cursor) = cursor_of(event) {
            dispatch(HoverEvent::Move { cursor });
        }
    }));

    listeners.push(EventListener::new_with_options(
        document,
        "scroll",
        EventListenerOptions {
            phase: EventListenerPhase::Capture,
            passive: true,
        },
        |_event: &Event| dispatch(HoverEvent::Scroll),
    ));

    listeners
}

fn observe_insertions(body: &Node) -> Result<(MutationObserver, MutationCallback), String> {
    let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
        |records: Array, _observer: MutationObserver| {
            for record in records.iter() {
                let Ok(record) = record.dyn_into::<MutationRecord>() else {
                    continue;
                };
                let added = record.added_nodes();
                for index in 0..added.length() {
                    if let Some(node) = added.item(index) {
                        with_runtime(|runtime| runtime.bind_subtree(&node));
                    }
                }
            }
        },
    );
    let observer =
        MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(chrome::js_err)?;
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    observer
        .observe_with_options(body, &options)
        .map_err(chrome::js_err)?;
    Ok((observer, callback))
}

fn install_runtime(page: PageLocation, settings: SettingsBridge) -> Result<(), String> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| "missing document".to_string())?;
    let observer = match document.body() {
        Some(body) => Some(observe_insertions(&body)?),
        None => None,
    };
    let runtime = ContentRuntime {
        scheduler: HoverScheduler::new(PreviewConfig::from_build_env()),
        host: PageHost { page, settings },
        overlay: OverlayController::new(on_decode),
        hover_timer: None,
        fade_timer: None,
        bound: WeakSet::new(),
        callbacks: BoundCallbacks::new(),
        _listeners: document_listeners(&document),
        observer,
    };
    let previous = RUNTIME.with(|cell| cell.borrow_mut().replace(runtime));
    drop(previous);
    Ok(())
}

fn install(page: PageLocation, settings: SettingsBridge) -> Result<(), String> {
    install_runtime(page, settings)?;
    chrome::add_message_listener(on_message)
}

async fn boot() {
    let Some(page) = dom::page_location() else {
        gloo::console::warn!("image hover: page has no usable location");
        return;
    };
    let settings = load_page_settings(page.hostname()).await;
    gloo::console::log!(
        "image hover: settings",
        page.hostname().to_string(),
        settings.enabled(),
        settings.max_size_percent()
    );
    if let Err(err) = install(page, settings) {
        gloo::console::warn!("image hover: content runtime not installed", err);
    }
}

/// Entry point of the content script.
pub fn start() {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    if document.ready_state() == "loading" {
        EventListener::once(&document, "DOMContentLoaded", |_event: &Event| {
            spawn_local(boot());
        })
        .forget();
    } else {
        spawn_local(boot());
    }
}
