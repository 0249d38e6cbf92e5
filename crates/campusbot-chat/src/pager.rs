//! Paging stored history back into the view.
//!
//! The server returns history newest first. Within a page the view shows
//! oldest first; the first page replaces the view and each earlier page is
//! stacked above what is already shown.

use tracing::debug;

use campusbot_core::backend::ChatBackend;
use campusbot_core::error::Result;
use campusbot_core::types::Message;

#[derive(Debug, Clone)]
pub struct HistoryPager {
    /// Last page loaded; 0 before the first load.
    page: u32,
    size: u32,
    has_more: bool,
}

impl HistoryPager {
    pub fn new(size: u32) -> Self {
        Self {
            page: 0,
            size: size.max(1),
            has_more: true,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Whether the last page came back full, so an earlier one may exist.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn reset(&mut self) {
        self.page = 0;
        self.has_more = true;
    }

    /// Fetch the newest page. Returned oldest first.
    pub async fn load_latest(
        &mut self,
        backend: &dyn ChatBackend,
        token: Option<&str>,
        user: &str,
    ) -> Result<Vec<Message>> {
        self.reset();
        self.load_page(backend, token, user, 1).await
    }

    /// Fetch the page before the last one loaded. Returned oldest first.
    pub async fn load_earlier(
        &mut self,
        backend: &dyn ChatBackend,
        token: Option<&str>,
        user: &str,
    ) -> Result<Vec<Message>> {
        let next = self.page + 1;
        self.load_page(backend, token, user, next).await
    }

    async fn load_page(
        &mut self,
        backend: &dyn ChatBackend,
        token: Option<&str>,
        user: &str,
        page: u32,
    ) -> Result<Vec<Message>> {
        let fetched = backend.fetch_history(token, user, page, self.size).await?;
        let count = fetched.history.len();
        self.page = page;
        self.has_more = count as u32 >= self.size;
        debug!(page, count, has_more = self.has_more, "History page loaded");

        let mut messages: Vec<Message> = fetched.history.into_iter().map(Message::from).collect();
        messages.reverse();
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockBackend;
    use campusbot_core::types::Sender;

    fn texts(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_latest_page_is_oldest_first() {
        let backend = MockBackend::new().with_history_texts(&["m1", "m2", "m3", "m4", "m5"]);
        let mut pager = HistoryPager::new(2);
        let page = pager.load_latest(&backend, None, "guest").await.unwrap();
        assert_eq!(texts(&page), vec!["m4", "m5"]);
        assert_eq!(pager.page(), 1);
        assert!(pager.has_more());
    }

    #[tokio::test]
    async fn test_load_earlier_walks_back() {
        let backend = MockBackend::new().with_history_texts(&["m1", "m2", "m3", "m4", "m5"]);
        let mut pager = HistoryPager::new(2);
        pager.load_latest(&backend, None, "guest").await.unwrap();
        let second = pager.load_earlier(&backend, None, "guest").await.unwrap();
        assert_eq!(texts(&second), vec!["m2", "m3"]);
        let third = pager.load_earlier(&backend, None, "guest").await.unwrap();
        assert_eq!(texts(&third), vec!["m1"]);
        assert_eq!(pager.page(), 3);
        assert!(!pager.has_more());
    }

    #[tokio::test]
    async fn test_load_earlier_before_latest_loads_first_page() {
        let backend = MockBackend::new().with_history_texts(&["only"]);
        let mut pager = HistoryPager::new(50);
        let page = pager.load_earlier(&backend, None, "guest").await.unwrap();
        assert_eq!(texts(&page), vec!["only"]);
        assert_eq!(pager.page(), 1);
        assert!(!pager.has_more());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_page_counter() {
        let backend = MockBackend::new()
            .with_history_texts(&["m1", "m2", "m3"])
            .failing_reads();
        let mut pager = HistoryPager::new(1);
        assert!(pager.load_earlier(&backend, None, "guest").await.is_err());
        assert_eq!(pager.page(), 0);
    }

    #[tokio::test]
    async fn test_history_senders_survive() {
        let backend = MockBackend::new().with_history_texts(&["q", "a"]);
        let mut pager = HistoryPager::new(10);
        let page = pager.load_latest(&backend, None, "guest").await.unwrap();
        assert_eq!(page[0].from, Sender::User);
        assert_eq!(page[1].from, Sender::Bot);
    }
}
