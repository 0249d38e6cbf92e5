//! Follow-up resolution for "give me the website link" style questions.
//!
//! Such a question only makes sense relative to the previous bot answer:
//! after an answer about the university the user wants the university
//! site, after one about the college the college site.

use std::sync::LazyLock;

use regex::Regex;

use campusbot_core::config::LinkRule;

static LINK_REQUEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(website link|website|link of the website|give me the website link|website link please|link)\b",
    )
    .expect("Invalid link request regex")
});

/// Resolves link requests against the last bot message.
#[derive(Debug, Clone, Default)]
pub struct FollowUpResolver {
    rules: Vec<LinkRule>,
}

impl FollowUpResolver {
    pub fn new(rules: Vec<LinkRule>) -> Self {
        Self { rules }
    }

    /// Whether `text` asks for a website or link.
    pub fn is_link_request(text: &str) -> bool {
        LINK_REQUEST.is_match(text)
    }

    /// Answer a link request from context, if any rule applies.
    ///
    /// Rules are tried in order; the first whose keyword appears in the
    /// last bot message wins.
    pub fn resolve(&self, text: &str, last_bot: Option<&str>) -> Option<&str> {
        if !Self::is_link_request(text) {
            return None;
        }
        let last_bot = last_bot?.to_lowercase();
        self.rules
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|k| !k.is_empty() && last_bot.contains(&k.to_lowercase()))
            })
            .map(|rule| rule.answer.as_str())
    }
}
