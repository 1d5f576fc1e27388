use wasm_bindgen_futures::spawn_local;

use crate::chrome;
use image_hover_core::settings::{disabled_payload, size_payload};
use image_hover_core::{
    clamp_size_percent, disabled_key, load_from_storage, verify_size_write, SettingsBridge,
    MAX_SIZE_KEY,
};

/// Settings for the current page. Storage failures fall back to enabled/default size.
pub(crate) async fn load_page_settings(hostname: &str) -> SettingsBridge {
    let keys = [disabled_key(hostname), MAX_SIZE_KEY.to_string()];
    let stored = match chrome::storage_get(&keys).await {
        Ok(stored) => stored,
        Err(err) => {
            gloo::console::log!("image hover: could not read storage, using defaults", err);
            return SettingsBridge::with_defaults(hostname);
        }
    };
    let loaded = match load_from_storage(hostname, &stored) {
        Ok(loaded) => loaded,
        Err(err) => {
            gloo::console::log!(
                "image hover: unreadable settings, using defaults",
                err.to_string()
            );
            return SettingsBridge::with_defaults(hostname);
        }
    };
    if let Some(percent) = loaded.repaired_size {
        spawn_local(async move {
            if let Err(err) = chrome::storage_set(&size_payload(percent)).await {
                gloo::console::warn!("image hover: size repair failed", err);
            }
        });
    }
    SettingsBridge::new(hostname, loaded.settings)
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PopupSettings {
    pub(crate) enabled: bool,
    pub(crate) size_percent: u32,
}

pub(crate) async fn load_popup_settings(hostname: &str) -> Result<PopupSettings, String> {
    let keys = [disabled_key(hostname), MAX_SIZE_KEY.to_string()];
    let stored = chrome::storage_get(&keys).await?;
    let loaded = load_from_storage(hostname, &stored).map_err(|err| err.to_string())?;
    Ok(PopupSettings {
        enabled: loaded.settings.is_enabled(hostname),
        size_percent: loaded.settings.max_size_percent(),
    })
}

pub(crate) async fn save_disabled(hostname: &str, disabled: bool) -> Result<(), String> {
    chrome::storage_set(&disabled_payload(hostname, disabled)).await
}

/// Clamps, persists and reads the size back; returns the stored percentage.
pub(crate) async fn save_size_percent(percent: i64) -> Result<u32, String> {
    let percent = clamp_size_percent(percent);
    chrome::storage_set(&size_payload(percent)).await?;
    let stored = chrome::storage_get(&[MAX_SIZE_KEY.to_string()]).await?;
    verify_size_write(percent, &stored).map_err(|err| err.to_string())
}
