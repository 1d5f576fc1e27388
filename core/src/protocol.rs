use serde::{Deserialize, Serialize};

/// Messages the popup pushes to the content script of the active tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Notification {
    #[serde(rename = "togglePreview")]
    TogglePreview {
        enabled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hostname: Option<String>,
    },
    #[serde(rename = "updateSize")]
    UpdateSize {
        #[serde(rename = "maxSize")]
        max_size: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub success: bool,
}

impl NotificationResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }

    pub fn failed() -> Self {
        Self { success: false }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed notification: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub fn parse_notification(raw: &str) -> Result<Notification, ProtocolError> {
    Ok(serde_json::from_str(raw)?)
}
