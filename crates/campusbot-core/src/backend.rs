//! The seam between the chat flow and the remote API.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    AiStatus, FaqTable, HistoryAppend, HistoryDelete, HistoryPage, LogRecord, QueryReply,
    QueryRequest,
};

/// Remote operations the chat session depends on.
///
/// Implemented over HTTP by the API client; tests substitute a recording
/// double. Every call carries the session token when one is given.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `GET /api/offline_faq`.
    async fn offline_faq(&self) -> Result<FaqTable>;

    /// `POST /api/query`.
    async fn query(&self, token: Option<&str>, request: &QueryRequest) -> Result<QueryReply>;

    /// `POST /api/history`.
    async fn append_history(&self, token: Option<&str>, record: &HistoryAppend) -> Result<()>;

    /// `GET /api/history?user=&page=&size=`.
    async fn fetch_history(
        &self,
        token: Option<&str>,
        user: &str,
        page: u32,
        size: u32,
    ) -> Result<HistoryPage>;

    /// `DELETE /api/history`.
    async fn delete_history(&self, token: Option<&str>, request: &HistoryDelete) -> Result<()>;

    /// `POST /api/logs`.
    async fn write_log(&self, token: Option<&str>, record: &LogRecord) -> Result<()>;

    /// `GET /api/status`.
    async fn status(&self, token: Option<&str>) -> Result<AiStatus>;
}
