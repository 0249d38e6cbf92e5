//! Chat session client for campusbot.
//!
//! Matches questions against the offline FAQ table first, falls back to the
//! remote query endpoint, mirrors every exchange to server-side history,
//! and pages that history back into the view.

pub mod context;
pub mod error;
pub mod matcher;
pub mod pager;
pub mod service;
pub mod session;
pub mod suggestions;
pub mod view;

#[cfg(test)]
mod test_support;

pub use context::FollowUpResolver;
pub use error::ChatError;
pub use matcher::{FaqMatch, FaqMatcher, DEFAULT_THRESHOLD, QUICK_ACCESS_THRESHOLD};
pub use pager::HistoryPager;
pub use service::{ChatRequest, ChatService, ChatServiceHandle};
pub use session::{ChatSession, ChatSettings, MessageState, SendOutcome};
pub use suggestions::SuggestionList;
pub use view::{ChatView, ViewEvent};
