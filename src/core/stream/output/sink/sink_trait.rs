// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::Post;
use std::fmt::Debug;

/// Consumer of the filtered feed.
///
/// The aggregator calls into the sink from its event loop only, so calls
/// never overlap. Sinks own the presentation of posts; the aggregator
/// ignores anything a sink does with them.
pub trait Sink: Debug + Send + Sync {
    /// The query changed.
    ///
    /// `active == false` means filtering is disabled and the sink should show
    /// its placeholder. `active == true` means prior output should be cleared.
    fn on_filter_reset(&self, active: bool);

    /// A post matched the active query and was not delivered before in this
    /// session. Consumers display newest first.
    fn on_match(&self, post: Post);
}
