// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::Serialize;
use std::fmt;

/// Account that published a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub display_name: String,
    /// Profile URL
    pub url: String,
}

/// A single public status received from one of the instances.
///
/// Posts are never mutated after normalization. `id` is the status URL and
/// is used as the dedup key within a filter session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: String,
    /// Raw markup as delivered by the instance.
    pub content: String,
    pub author: Author,
    /// Timestamp string exactly as delivered upstream.
    pub created_at: String,
}

impl Post {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        author: Author,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            author,
            created_at: created_at.into(),
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}", self.author.display_name, self.created_at, self.id)
    }
}
