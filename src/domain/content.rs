//! 站点只读内容：活动列表与社交媒体

use serde::{Deserialize, Serialize};

/// 活动条目（`events.json`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventItem {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub linkedin: String,
}

/// 社交媒体条目（`media.json`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialMedia {
    pub platform: String,
    #[serde(default)]
    pub description: String,
    pub link: String,
    #[serde(default)]
    pub color: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_optional_fields() {
        let event: EventItem =
            serde_json::from_str(r#"{"title": "Industry Day", "date": "2025-03-12"}"#).unwrap();
        assert_eq!(event.title, "Industry Day");
        assert!(event.linkedin.is_empty());
    }

    #[test]
    fn test_social_media() {
        let media: SocialMedia = serde_json::from_str(
            r##"{"platform": "LinkedIn", "description": "Follow us", "link": "https://linkedin.com/company/x", "color": "#0A66C2"}"##,
        )
        .unwrap();
        assert_eq!(media.platform, "LinkedIn");
        assert_eq!(media.color, "#0A66C2");
    }
}
