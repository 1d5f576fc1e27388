use js_sys::{Array, Function, Object, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use image_hover_core::{decode, encode};

#[derive(Clone, Debug)]
pub(crate) struct ActiveTab {
    pub(crate) id: f64,
    pub(crate) url: String,
}

pub(crate) fn js_err(error: JsValue) -> String {
    if let Some(value) = error.as_string() {
        return value;
    }
    if let Some(message) = Reflect::get(&error, &JsValue::from_str("message"))
        .ok()
        .and_then(|value| value.as_string())
    {
        return message;
    }
    if let Ok(json) = js_sys::JSON::stringify(&error) {
        if let Some(value) = json.as_string() {
            return value;
        }
    }
    "js error".to_string()
}

pub(crate) fn to_json(value: &JsValue) -> Result<Value, String> {
    if value.is_undefined() {
        return Ok(Value::Null);
    }
    let raw = js_sys::JSON::stringify(value)
        .map_err(js_err)?
        .as_string()
        .unwrap_or_default();
    decode::<Value>(&raw).ok_or_else(|| "value is not valid json".to_string())
}

pub(crate) fn from_json<T: Serialize>(value: &T) -> Result<JsValue, String> {
    let raw = encode(value).ok_or_else(|| "value is not serializable".to_string())?;
    js_sys::JSON::parse(&raw).map_err(js_err)
}

pub(crate) async fn storage_get(keys: &[String]) -> Result<Value, String> {
    let array = Array::new();
    for key in keys {
        array.push(&JsValue::from_str(key));
    }
    let result = call_async(&["storage", "local", "get"], &[array.into()])
        .await
        .map_err(js_err)?;
    to_json(&result)
}

pub(crate) async fn storage_set(payload: &Value) -> Result<(), String> {
    let items = from_json(payload)?;
    call_async(&["storage", "local", "set"], &[items])
        .await
        .map_err(js_err)?;
    Ok(())
}

pub(crate) async fn active_tab() -> Result<ActiveTab, String> {
    let query = from_json(&serde_json::json!({ "active": true, "currentWindow": true }))?;
    let tabs = call_async(&["tabs", "query"], &[query])
        .await
        .map_err(js_err)?;
    let tab = Array::from(&tabs).get(0);
    if tab.is_undefined() {
        return Err("no active tab".to_string());
    }
    let id = Reflect::get(&tab, &JsValue::from_str("id"))
        .map_err(js_err)?
        .as_f64()
        .ok_or_else(|| "active tab has no id".to_string())?;
    let url = Reflect::get(&tab, &JsValue::from_str("url"))
        .map_err(js_err)?
        .as_string()
        .ok_or_else(|| "active tab has no url".to_string())?;
    Ok(ActiveTab { id, url })
}

pub(crate) async fn send_to_tab<T: Serialize>(tab_id: f64, message: &T) -> Result<Value, String> {
    let message = from_json(message)?;
    let response = call_async(&["tabs", "sendMessage"], &[JsValue::from_f64(tab_id), message])
        .await
        .map_err(js_err)?;
    to_json(&response)
}

/// Registers a synchronous `chrome.runtime.onMessage` handler for the page's lifetime.
pub(crate) fn add_message_listener<F>(handler: F) -> Result<(), String>
where
    F: Fn(&JsValue) -> JsValue + 'static,
{
    let chrome = chrome().map_err(js_err)?;
    let on_message = lookup(&chrome, &["runtime", "onMessage"]).map_err(js_err)?;
    let add = Reflect::get(&on_message, &JsValue::from_str("addListener"))
        .map_err(js_err)?
        .dyn_into::<Function>()
        .map_err(js_err)?;
    let listener = Closure::<dyn FnMut(JsValue, JsValue, JsValue) -> bool>::new(
        move |request: JsValue, _sender: JsValue, send_response: JsValue| {
            let response = handler(&request);
            if let Some(send_response) = send_response.dyn_ref::<Function>() {
                let _ = send_response.call1(&JsValue::NULL, &response);
            }
            false
        },
    );
    add.call1(&on_message, listener.as_ref().unchecked_ref())
        .map_err(js_err)?;
    listener.forget();
    Ok(())
}

fn chrome() -> Result<Object, JsValue> {
    let value = Reflect::get(&js_sys::global(), &JsValue::from_str("chrome"))?;
    if value.is_null() || value.is_undefined() {
        return Err(JsValue::from_str("extension api unavailable"));
    }
    value.dyn_into::<Object>()
}

fn lookup(root: &JsValue, path: &[&str]) -> Result<JsValue, JsValue> {
    let mut current = root.clone();
    for segment in path {
        current = Reflect::get(&current, &JsValue::from_str(segment))?;
        if current.is_null() || current.is_undefined() {
            return Err(JsValue::from_str(&format!("missing chrome.{}", path.join("."))));
        }
    }
    Ok(current)
}

async fn call_async(path: &[&str], args: &[JsValue]) -> Result<JsValue, JsValue> {
    let (method, owner_path) = path
        .split_last()
        .ok_or_else(|| JsValue::from_str("empty api path"))?;
    let chrome = chrome()?;
    let owner = lookup(&chrome, owner_path)?;
    let func = Reflect::get(&owner, &JsValue::from_str(method))?.dyn_into::<Function>()?;
    let array = Array::new();
    for arg in args {
        array.push(arg);
    }
    let result = func.apply(&owner, &array)?;
    JsFuture::from(Promise::resolve(&result)).await
}
