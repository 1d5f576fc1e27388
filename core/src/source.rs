use url::Url;

pub const PLACEHOLDER_GIF_PREFIX: &str = "data:image/gif;base64,R0lGOD";
pub const SVG_DATA_PREFIX: &str = "data:image/svg+xml";
pub const EMPTY_DATA_URI: &str = "data:,";
pub const PLACEHOLDER_MARKER: &str = "placeholder";

pub const LAZY_SRC_ATTRIBUTE: &str = "data-src";
/// Tried in order when the primary source is a lazy-load stand-in.
pub const LAZY_FALLBACK_ATTRIBUTES: &[&str] = &["data-lazy-src", "data-original"];

/// What the resolver needs to know about a hovered element.
pub trait ElementView {
    fn is_image(&self) -> bool;
    fn attribute(&self, name: &str) -> Option<String>;
    /// Live `src` of an image element.
    fn current_src(&self) -> Option<String>;
    /// Computed `background-image` value.
    fn background_image(&self) -> Option<String>;
}

/// The page the content script runs in; relative sources resolve against it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLocation {
    url: Url,
}

impl PageLocation {
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(href)?,
        })
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn normalize(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with("data:") || Url::parse(raw).is_ok() {
            return Some(raw.to_string());
        }
        self.url.join(raw).ok().map(String::from)
    }
}

pub fn is_placeholder(src: &str) -> bool {
    src.starts_with(PLACEHOLDER_GIF_PREFIX)
        || src.starts_with(SVG_DATA_PREFIX)
        || src == EMPTY_DATA_URI
        || src.contains(PLACEHOLDER_MARKER)
}

pub fn resolve_source(element: &impl ElementView, page: &PageLocation) -> Option<String> {
    if element.is_image() {
        let raw = image_candidate(element)?;
        return page.normalize(&raw);
    }
    element
        .background_image()
        .and_then(|value| extract_css_url(&value))
}

fn image_candidate(element: &impl ElementView) -> Option<String> {
    let primary = non_empty(element.attribute(LAZY_SRC_ATTRIBUTE))
        .or_else(|| non_empty(element.current_src()));
    match primary {
        Some(src) if !is_placeholder(&src) => Some(src),
        _ => LAZY_FALLBACK_ATTRIBUTES
            .iter()
            .find_map(|name| non_empty(element.attribute(name))),
    }
}

/// First `url(...)` token of a CSS image value, quoted or not.
pub fn extract_css_url(value: &str) -> Option<String> {
    let start = value.find("url(")? + "url(".len();
    let rest = value[start..].trim_start();
    let url = match rest.chars().next()? {
        quote @ ('"' | '\'') => {
            let body = &rest[1..];
            let end = body.find(quote)?;
            &body[..end]
        }
        _ => {
            let end = rest.find(')')?;
            rest[..end].trim_end()
        }
    };
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
