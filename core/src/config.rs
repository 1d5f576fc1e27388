pub const DEFAULT_HOVER_DELAY_MS: u32 = 150;
/// Matches the overlay's CSS opacity transition.
pub const DEFAULT_FADE_MS: u32 = 200;
pub const SIZE_SAVE_DEBOUNCE_MS: u32 = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreviewConfig {
    pub hover_delay_ms: u32,
    pub fade_ms: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            hover_delay_ms: DEFAULT_HOVER_DELAY_MS,
            fade_ms: DEFAULT_FADE_MS,
        }
    }
}

impl PreviewConfig {
    /// Defaults, overridable at build time through `IMAGE_HOVER_DELAY_MS`
    /// and `IMAGE_HOVER_FADE_MS`.
    pub fn from_build_env() -> Self {
        Self {
            hover_delay_ms: parse_ms(option_env!("IMAGE_HOVER_DELAY_MS"), DEFAULT_HOVER_DELAY_MS),
            fade_ms: parse_ms(option_env!("IMAGE_HOVER_FADE_MS"), DEFAULT_FADE_MS),
        }
    }
}

fn parse_ms(raw: Option<&str>, fallback: u32) -> u32 {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
        .unwrap_or(fallback)
}
