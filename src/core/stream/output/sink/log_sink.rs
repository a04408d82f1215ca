// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::Post;
use crate::core::stream::output::sink::sink_trait::Sink;
use std::sync::{Arc, Mutex, PoisonError};

/// Everything a [`LogSink`] has been told, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkRecord {
    Reset { active: bool },
    Match(Post),
}

/// LogSink - Debug sink that logs every call and keeps a record of it
///
/// Used for development, headless runs and tests.
#[derive(Debug, Clone)]
pub struct LogSink {
    pub records: Arc<Mutex<Vec<SinkRecord>>>,
    prefix: String,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink {
    pub fn new() -> Self {
        Self::with_prefix("[LOG]")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            prefix: prefix.into(),
        }
    }

    pub fn records(&self) -> Vec<SinkRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every matched post ever delivered, oldest first
    pub fn matches(&self) -> Vec<Post> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                SinkRecord::Match(post) => Some(post),
                SinkRecord::Reset { .. } => None,
            })
            .collect()
    }

    pub fn resets(&self) -> Vec<bool> {
        self.records()
            .into_iter()
            .filter_map(|record| match record {
                SinkRecord::Reset { active } => Some(active),
                SinkRecord::Match(_) => None,
            })
            .collect()
    }

    /// What a display would currently show: posts since the last reset,
    /// newest first.
    pub fn displayed(&self) -> Vec<Post> {
        let records = self.records();
        let start = records
            .iter()
            .rposition(|r| matches!(r, SinkRecord::Reset { .. }))
            .map_or(0, |i| i + 1);

        records[start..]
            .iter()
            .rev()
            .filter_map(|record| match record {
                SinkRecord::Match(post) => Some(post.clone()),
                SinkRecord::Reset { .. } => None,
            })
            .collect()
    }

    fn push(&self, record: SinkRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

impl Sink for LogSink {
    fn on_filter_reset(&self, active: bool) {
        if active {
            log::info!("{} Filter changed, clearing output", self.prefix);
        } else {
            log::info!("{} No filter set", self.prefix);
        }
        self.push(SinkRecord::Reset { active });
    }

    fn on_match(&self, post: Post) {
        log::info!("{} {}", self.prefix, post);
        self.push(SinkRecord::Match(post));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Author;

    fn post(id: &str) -> Post {
        Post::new(
            id,
            "<p>cats</p>",
            Author {
                display_name: "Alice".to_string(),
                url: "https://a.example/@alice".to_string(),
            },
            "2022-11-05T10:00:00Z",
        )
    }

    #[test]
    fn test_displayed_is_newest_first_since_last_reset() {
        let sink = LogSink::new();
        sink.on_filter_reset(true);
        sink.on_match(post("u1"));
        sink.on_filter_reset(true);
        sink.on_match(post("u2"));
        sink.on_match(post("u3"));

        let shown: Vec<String> = sink.displayed().into_iter().map(|p| p.id).collect();
        assert_eq!(shown, vec!["u3", "u2"]);
        assert_eq!(sink.matches().len(), 3);
        assert_eq!(sink.resets(), vec![true, true]);
    }

    #[test]
    fn test_clones_share_records() {
        let sink = LogSink::with_prefix("[TEST]");
        let observer = sink.clone();
        sink.on_filter_reset(false);
        assert_eq!(observer.records(), vec![SinkRecord::Reset { active: false }]);
        assert!(observer.displayed().is_empty());
    }
}
