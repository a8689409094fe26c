//! Normalized notification descriptor and the presentation options derived
//! from it.

use pushline_core::config::NotificationConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Accepted spellings for the title, first present wins.
const TITLE_KEYS: [&str; 2] = ["title", "head"];
/// Accepted spellings for the body, first present wins.
const BODY_KEYS: [&str; 2] = ["body", "message"];
const REQUIRE_INTERACTION_KEYS: [&str; 2] = ["requireInteraction", "require_interaction"];

/// Normalized form of an inbound push payload.
///
/// `title` and `body` are never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDescriptor {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub tag: String,
    pub require_interaction: bool,
    /// Application data; carries `url` for click routing.
    pub data: Map<String, Value>,
}

/// Options handed to the display primitive.
///
/// Absent optional fields are omitted from the serialized form entirely,
/// never sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub tag: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub require_interaction: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl NotificationDescriptor {
    /// The full default descriptor, used when no payload is present.
    pub fn defaults(config: &NotificationConfig) -> Self {
        Self {
            title: config.default_title.clone(),
            body: config.default_body.clone(),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            tag: config.default_tag.clone(),
            require_interaction: config.require_interaction,
            data: Map::new(),
        }
    }

    /// Default descriptor with the raw payload text as body.
    pub fn from_text(text: &str, config: &NotificationConfig) -> Self {
        let mut descriptor = Self::defaults(config);
        if !text.trim().is_empty() {
            descriptor.body = text.to_string();
        }
        descriptor
    }

    /// Map a decoded payload object onto a descriptor, tolerating the
    /// upstream field synonyms.
    pub fn from_payload(payload: &Map<String, Value>, config: &NotificationConfig) -> Self {
        let mut data = payload
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        if !data.contains_key("url") {
            if let Some(url) = non_empty_str(payload, "url") {
                data.insert("url".to_string(), Value::String(url.to_string()));
            }
        }

        Self {
            title: first_str(payload, &TITLE_KEYS).unwrap_or(&config.default_title).to_string(),
            body: first_str(payload, &BODY_KEYS).unwrap_or(&config.default_body).to_string(),
            icon: non_empty_str(payload, "icon")
                .map(str::to_string)
                .or_else(|| config.icon.clone()),
            badge: non_empty_str(payload, "badge")
                .map(str::to_string)
                .or_else(|| config.badge.clone()),
            tag: non_empty_str(payload, "tag").unwrap_or(&config.default_tag).to_string(),
            require_interaction: REQUIRE_INTERACTION_KEYS
                .iter()
                .find_map(|key| payload.get(*key).and_then(Value::as_bool))
                .unwrap_or(config.require_interaction),
            data,
        }
    }

    /// Click target carried in `data.url`, if any.
    pub fn url(&self) -> Option<&str> {
        self.data.get("url").and_then(Value::as_str)
    }

    pub fn options(&self) -> NotificationOptions {
        NotificationOptions {
            body: self.body.clone(),
            icon: self.icon.clone(),
            badge: self.badge.clone(),
            tag: self.tag.clone(),
            require_interaction: self.require_interaction,
            data: self.data.clone(),
        }
    }

    /// Title and options for the single fallback presentation attempt:
    /// generic title, decoded body, distinct tag, nothing else.
    pub fn fallback(&self, config: &NotificationConfig) -> (String, NotificationOptions) {
        let body = if self.body.is_empty() {
            config.default_body.clone()
        } else {
            self.body.clone()
        };
        (
            config.default_title.clone(),
            NotificationOptions {
                body,
                icon: None,
                badge: None,
                tag: config.fallback_tag.clone(),
                require_interaction: false,
                data: Map::new(),
            },
        )
    }
}

fn non_empty_str<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn first_str<'a>(payload: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| non_empty_str(payload, key))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn plain_payload_uses_default_tag() {
        let config = NotificationConfig::default();
        let d = NotificationDescriptor::from_payload(&obj(json!({"title":"T","body":"B"})), &config);
        assert_eq!(d.title, "T");
        assert_eq!(d.body, "B");
        assert_eq!(d.tag, "notification");
        assert!(!d.require_interaction);
        assert!(d.icon.is_none());
    }

    #[test]
    fn synonyms_are_accepted() {
        let config = NotificationConfig::default();
        let d = NotificationDescriptor::from_payload(
            &obj(json!({"head":"T2","message":"B2"})),
            &config,
        );
        assert_eq!(d.title, "T2");
        assert_eq!(d.body, "B2");
    }

    #[test]
    fn primary_key_wins_over_synonym() {
        let config = NotificationConfig::default();
        let d = NotificationDescriptor::from_payload(
            &obj(json!({"title":"T","head":"H","body":"B","message":"M"})),
            &config,
        );
        assert_eq!(d.title, "T");
        assert_eq!(d.body, "B");
    }

    #[test]
    fn empty_title_is_defaulted() {
        let config = NotificationConfig::default();
        let d = NotificationDescriptor::from_payload(&obj(json!({"title":"","body":"  "})), &config);
        assert_eq!(d.title, config.default_title);
        assert_eq!(d.body, config.default_body);
    }

    #[test]
    fn top_level_url_moves_into_data() {
        let config = NotificationConfig::default();
        let d = NotificationDescriptor::from_payload(
            &obj(json!({"title":"T","url":"/hr/announcements","data":{"type":"announcement_published"}})),
            &config,
        );
        assert_eq!(d.url(), Some("/hr/announcements"));
        assert_eq!(d.data["type"], "announcement_published");
    }

    #[test]
    fn nested_url_wins_over_top_level() {
        let config = NotificationConfig::default();
        let d = NotificationDescriptor::from_payload(
            &obj(json!({"url":"/top","data":{"url":"/nested"}})),
            &config,
        );
        assert_eq!(d.url(), Some("/nested"));
    }

    #[test]
    fn null_icon_is_omitted_from_options() {
        let config = NotificationConfig::default();
        let d = NotificationDescriptor::from_payload(
            &obj(json!({"title":"T","icon":null,"badge":"/badge.png"})),
            &config,
        );
        let json = serde_json::to_value(d.options()).unwrap();
        assert!(json.get("icon").is_none());
        assert_eq!(json["badge"], "/badge.png");
        assert_eq!(json["tag"], "notification");
    }

    #[test]
    fn config_icon_used_when_payload_has_none() {
        let config = NotificationConfig {
            icon: Some("/icons/icon-192.png".into()),
            ..NotificationConfig::default()
        };
        let d = NotificationDescriptor::from_payload(&obj(json!({"title":"T"})), &config);
        assert_eq!(d.icon.as_deref(), Some("/icons/icon-192.png"));
    }

    #[test]
    fn require_interaction_accepts_both_spellings() {
        let config = NotificationConfig::default();
        let a = NotificationDescriptor::from_payload(&obj(json!({"requireInteraction":true})), &config);
        let b = NotificationDescriptor::from_payload(&obj(json!({"require_interaction":true})), &config);
        assert!(a.require_interaction && b.require_interaction);
    }

    #[test]
    fn from_text_keeps_default_title() {
        let config = NotificationConfig::default();
        let d = NotificationDescriptor::from_text("plain text", &config);
        assert_eq!(d.title, config.default_title);
        assert_eq!(d.body, "plain text");

        let blank = NotificationDescriptor::from_text("", &config);
        assert_eq!(blank.body, config.default_body);
    }

    #[test]
    fn fallback_is_minimal_and_distinctly_tagged() {
        let config = NotificationConfig::default();
        let d = NotificationDescriptor::from_payload(
            &obj(json!({"title":"T","body":"B","icon":"/i.png","tag":"announcement-7"})),
            &config,
        );
        let (title, options) = d.fallback(&config);
        assert_eq!(title, config.default_title);
        assert_eq!(options.body, "B");
        assert_eq!(options.tag, "notification-fallback");

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 2, "only body and tag: {json}");
    }
}
