// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod dedupe;
pub mod filter;

pub use dedupe::Deduplicator;
pub use filter::{FilterSession, QueryFilter, SessionClock};
