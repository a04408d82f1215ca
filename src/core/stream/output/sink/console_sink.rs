// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain text rendering of the feed for terminals and pipes.

use crate::core::event::Post;
use crate::core::stream::output::sink::sink_trait::Sink;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

pub const PLACEHOLDER: &str = "Enter a filter to drink from the fire hose";

/// Writes each matched post as a short text block.
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSink").finish_non_exhaustive()
    }
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn write_block(&self, block: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let result = out.write_all(block.as_bytes()).and_then(|_| out.flush());
        if let Err(e) = result {
            log::warn!("[ConsoleSink] Failed to write output: {}", e);
        }
    }
}

impl Sink for ConsoleSink {
    fn on_filter_reset(&self, active: bool) {
        if active {
            self.write_block("\n---- new filter ----\n\n");
        } else {
            self.write_block(&format!("{}\n", PLACEHOLDER));
        }
    }

    fn on_match(&self, post: Post) {
        self.write_block(&render_post(&post));
    }
}

/// Render a post as text: author line, stripped content, link.
pub fn render_post(post: &Post) -> String {
    format!(
        "{} <{}> {}\n{}\n{}\n\n",
        post.author.display_name,
        post.author.url,
        post.created_at,
        strip_markup(&post.content),
        post.id
    )
}

/// Drop tags, turn paragraph and line breaks into newlines and decode the
/// handful of entities statuses commonly contain.
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match (in_tag, c) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split(|ch: char| ch.is_whitespace() || ch == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if name == "br" || (name == "p" && tag.starts_with('/')) {
                    text.push('\n');
                }
            }
            (true, _) => tag.push(c),
            (false, _) => text.push(c),
        }
    }

    decode_entities(text.trim_end())
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
