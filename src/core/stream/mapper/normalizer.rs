// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a decoded `update` payload into a [`Post`].
//!
//! Upstream data is untrusted. Anything that does not carry the fields a post
//! needs is dropped here instead of being propagated as an error.

use crate::core::event::{Author, Post};
use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize)]
struct RawStatus {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    account: Option<RawAccount>,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EventNormalizer;

impl EventNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Validate and convert a raw status.
    ///
    /// Identity is the status `url`, falling back to `uri` for statuses that
    /// have no public page. `content` and `display_name` must be present but
    /// may be empty; identity, profile url and `created_at` must be non-empty.
    pub fn normalize(&self, raw: &JsonValue) -> Option<Post> {
        let status = RawStatus::deserialize(raw).ok()?;
        let account = status.account?;

        let id = non_empty(status.url).or_else(|| non_empty(status.uri))?;
        let content = status.content?;
        let created_at = non_empty(status.created_at)?;
        let display_name = account.display_name?;
        let profile_url = non_empty(account.url)?;

        Some(Post::new(
            id,
            content,
            Author {
                display_name,
                url: profile_url,
            },
            created_at,
        ))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status() -> JsonValue {
        json!({
            "id": "109876",
            "url": "https://mastodon.social/@alice/109876",
            "uri": "https://mastodon.social/users/alice/statuses/109876",
            "content": "<p>I love cats</p>",
            "created_at": "2022-11-05T10:00:00.000Z",
            "account": {
                "display_name": "Alice",
                "url": "https://mastodon.social/@alice"
            }
        })
    }

    #[test]
    fn test_normalize_full_status() {
        let post = EventNormalizer::new().normalize(&status()).unwrap();
        assert_eq!(post.id, "https://mastodon.social/@alice/109876");
        assert_eq!(post.content, "<p>I love cats</p>");
        assert_eq!(post.author.display_name, "Alice");
        assert_eq!(post.author.url, "https://mastodon.social/@alice");
        assert_eq!(post.created_at, "2022-11-05T10:00:00.000Z");
    }

    #[test]
    fn test_uri_used_when_url_missing() {
        let mut raw = status();
        raw["url"] = JsonValue::Null;
        let post = EventNormalizer::new().normalize(&raw).unwrap();
        assert_eq!(post.id, "https://mastodon.social/users/alice/statuses/109876");
    }

    #[test]
    fn test_empty_display_name_and_content_are_kept() {
        let mut raw = status();
        raw["content"] = json!("");
        raw["account"]["display_name"] = json!("");
        let post = EventNormalizer::new().normalize(&raw).unwrap();
        assert!(post.content.is_empty());
        assert!(post.author.display_name.is_empty());
    }

    #[test]
    fn test_missing_required_fields_are_dropped() {
        let normalizer = EventNormalizer::new();
        for path in ["content", "created_at", "account"] {
            let mut raw = status();
            raw.as_object_mut().unwrap().remove(path);
            assert!(normalizer.normalize(&raw).is_none(), "missing {}", path);
        }

        let mut raw = status();
        raw.as_object_mut().unwrap().remove("url");
        raw.as_object_mut().unwrap().remove("uri");
        assert!(normalizer.normalize(&raw).is_none(), "missing identity");

        let mut raw = status();
        raw["account"].as_object_mut().unwrap().remove("url");
        assert!(normalizer.normalize(&raw).is_none(), "missing profile url");

        let mut raw = status();
        raw["account"].as_object_mut().unwrap().remove("display_name");
        assert!(normalizer.normalize(&raw).is_none(), "missing display name");
    }

    #[test]
    fn test_wrongly_typed_fields_are_dropped() {
        let mut raw = status();
        raw["content"] = json!(42);
        assert!(EventNormalizer::new().normalize(&raw).is_none());

        assert!(EventNormalizer::new().normalize(&json!("a string")).is_none());
    }
}
