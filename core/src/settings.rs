use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::protocol::{Notification, NotificationResponse};

pub const DISABLED_KEY_PREFIX: &str = "disabled_";
pub const MAX_SIZE_KEY: &str = "previewMaxSize";

pub const MIN_SIZE_PERCENT: u32 = 20;
pub const MAX_SIZE_PERCENT: u32 = 100;
pub const DEFAULT_SIZE_PERCENT: u32 = 80;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("stored settings are not an object")]
    NotAnObject,
    #[error("size verification failed: wrote {written}, read {read:?}")]
    SizeMismatch { written: u32, read: Option<u64> },
}

pub fn disabled_key(hostname: &str) -> String {
    format!("{DISABLED_KEY_PREFIX}{hostname}")
}

pub fn clamp_size_percent(percent: i64) -> u32 {
    percent.clamp(MIN_SIZE_PERCENT as i64, MAX_SIZE_PERCENT as i64) as u32
}

/// Reads a stored size, returning the value to use and whether storage
/// needs the corrected value written back.
pub fn read_size_percent(stored: Option<&Value>) -> (u32, bool) {
    let Some(raw) = stored.and_then(Value::as_f64).filter(|raw| raw.is_finite()) else {
        return (DEFAULT_SIZE_PERCENT, true);
    };
    let percent = clamp_size_percent(raw.round() as i64);
    (percent, percent as f64 != raw)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SizeSettings {
    enabled_per_host: HashMap<String, bool>,
    max_size_percent: u32,
}

impl Default for SizeSettings {
    fn default() -> Self {
        Self {
            enabled_per_host: HashMap::new(),
            max_size_percent: DEFAULT_SIZE_PERCENT,
        }
    }
}

impl SizeSettings {
    pub fn is_enabled(&self, hostname: &str) -> bool {
        self.enabled_per_host.get(hostname).copied().unwrap_or(true)
    }

    pub fn set_enabled(&mut self, hostname: &str, enabled: bool) {
        self.enabled_per_host.insert(hostname.to_string(), enabled);
    }

    pub fn max_size_percent(&self) -> u32 {
        self.max_size_percent
    }

    /// Stores the clamped percentage and returns it.
    pub fn set_max_size_percent(&mut self, percent: i64) -> u32 {
        self.max_size_percent = clamp_size_percent(percent);
        self.max_size_percent
    }

    pub fn size_ratio(&self) -> f64 {
        self.max_size_percent as f64 / 100.0
    }
}

/// Result of reading the two stored keys for one page.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedSettings {
    pub settings: SizeSettings,
    /// Set when the stored size was missing or invalid and must be rewritten.
    pub repaired_size: Option<u32>,
}

pub fn load_from_storage(hostname: &str, stored: &Value) -> Result<LoadedSettings, SettingsError> {
    let map = stored.as_object().ok_or(SettingsError::NotAnObject)?;
    let disabled = map
        .get(&disabled_key(hostname))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let (percent, needs_repair) = read_size_percent(map.get(MAX_SIZE_KEY));
    let mut settings = SizeSettings::default();
    settings.set_enabled(hostname, !disabled);
    settings.set_max_size_percent(percent as i64);
    Ok(LoadedSettings {
        settings,
        repaired_size: needs_repair.then_some(percent),
    })
}

pub fn size_payload(percent: u32) -> Value {
    let mut map = Map::new();
    map.insert(MAX_SIZE_KEY.to_string(), Value::from(percent));
    Value::Object(map)
}

/// Checks a read-back of [`MAX_SIZE_KEY`] against the percentage just written.
pub fn verify_size_write(written: u32, stored: &Value) -> Result<u32, SettingsError> {
    let read = stored.get(MAX_SIZE_KEY).and_then(Value::as_u64);
    if read == Some(u64::from(written)) {
        Ok(written)
    } else {
        Err(SettingsError::SizeMismatch { written, read })
    }
}

pub fn disabled_payload(hostname: &str, disabled: bool) -> Value {
    let mut map = Map::new();
    map.insert(disabled_key(hostname), Value::Bool(disabled));
    Value::Object(map)
}

/// What a notification asks the content runtime to do besides replying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeOutcome {
    pub response: NotificationResponse,
    pub dismiss: bool,
}

/// In-memory settings of one page, updated by popup notifications.
#[derive(Clone, Debug)]
pub struct SettingsBridge {
    hostname: String,
    settings: SizeSettings,
}

impl SettingsBridge {
    pub fn new(hostname: impl Into<String>, settings: SizeSettings) -> Self {
        Self {
            hostname: hostname.into(),
            settings,
        }
    }

    pub fn with_defaults(hostname: impl Into<String>) -> Self {
        Self::new(hostname, SizeSettings::default())
    }

    pub fn enabled(&self) -> bool {
        self.settings.is_enabled(&self.hostname)
    }

    pub fn size_ratio(&self) -> f64 {
        self.settings.size_ratio()
    }

    pub fn max_size_percent(&self) -> u32 {
        self.settings.max_size_percent()
    }

    pub fn handle(&mut self, notification: &Notification) -> BridgeOutcome {
        match notification {
            Notification::TogglePreview { enabled, .. } => {
                self.settings.set_enabled(&self.hostname, *enabled);
                BridgeOutcome {
                    response: NotificationResponse::ok(),
                    dismiss: !*enabled,
                }
            }
            Notification::UpdateSize { max_size } => {
                self.settings.set_max_size_percent(*max_size);
                BridgeOutcome {
                    response: NotificationResponse::ok(),
                    dismiss: true,
                }
            }
        }
    }
}
