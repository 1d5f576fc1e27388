pub mod codec;
pub mod config;
pub mod debounce;
pub mod eligibility;
pub mod geometry;
pub mod protocol;
pub mod scheduler;
pub mod settings;
pub mod source;

pub use codec::{decode, encode};
pub use config::{PreviewConfig, DEFAULT_FADE_MS, DEFAULT_HOVER_DELAY_MS, SIZE_SAVE_DEBOUNCE_MS};
pub use debounce::Debounce;
pub use eligibility::{covers_intrinsic, is_eligible, is_eligible_background, is_eligible_source};
pub use geometry::{compute_geometry, OverlayGeometry, Point, Size};
pub use protocol::{parse_notification, Notification, NotificationResponse, ProtocolError};
pub use scheduler::{Effect, HoverEvent, HoverScheduler, PreviewHost, PreviewState};
pub use settings::{
    clamp_size_percent, disabled_key, load_from_storage, verify_size_write, BridgeOutcome,
    LoadedSettings, SettingsBridge, SettingsError, SizeSettings, DEFAULT_SIZE_PERCENT,
    MAX_SIZE_KEY, MAX_SIZE_PERCENT, MIN_SIZE_PERCENT,
};
pub use source::{extract_css_url, is_placeholder, resolve_source, ElementView, PageLocation};
