//! Recording backend double shared by the chat crate's unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use campusbot_core::backend::ChatBackend;
use campusbot_core::error::{CampusError, Result};
use campusbot_core::types::{
    AiStatus, FaqEntry, FaqTable, HistoryAppend, HistoryDelete, HistoryPage, HistoryRecord,
    LogRecord, QueryReply, QueryRequest, Sender,
};

/// Every call the backend received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    OfflineFaq,
    Query(QueryRequest),
    AppendHistory(HistoryAppend),
    FetchHistory { user: String, page: u32, size: u32 },
    DeleteHistory(HistoryDelete),
    WriteLog(LogRecord),
    Status,
}

/// How `POST /api/query` should respond.
#[derive(Debug, Clone)]
pub enum QueryBehavior {
    Answer(String),
    ServerError(u16, String),
    Unreachable,
}

#[derive(Debug, Clone)]
pub enum StatusBehavior {
    Allowed(bool),
    Unreachable,
    ServerError,
}

pub struct MockBackend {
    calls: Mutex<Vec<Call>>,
    history: Mutex<Vec<HistoryRecord>>,
    faq: Option<FaqTable>,
    query: QueryBehavior,
    status: StatusBehavior,
    fail_writes: bool,
    fail_reads: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            faq: None,
            query: QueryBehavior::Answer("remote answer".to_string()),
            status: StatusBehavior::Allowed(true),
            fail_writes: false,
            fail_reads: false,
        }
    }

    pub fn with_faq(mut self, entries: &[(&str, &[&str], &str)]) -> Self {
        self.faq = Some(FaqTable::new(
            entries
                .iter()
                .map(|(category, questions, answer)| FaqEntry {
                    category: category.to_string(),
                    questions: questions.iter().map(|q| q.to_string()).collect(),
                    answer: answer.to_string(),
                })
                .collect(),
        ));
        self
    }

    pub fn with_query(mut self, behavior: QueryBehavior) -> Self {
        self.query = behavior;
        self
    }

    pub fn with_status(mut self, behavior: StatusBehavior) -> Self {
        self.status = behavior;
        self
    }

    /// Seed stored history, oldest first, alternating user and bot.
    pub fn with_history_texts(self, texts: &[&str]) -> Self {
        {
            let mut history = self.history.lock().unwrap();
            for (i, text) in texts.iter().enumerate() {
                history.push(HistoryRecord {
                    from: if i % 2 == 0 { Sender::User } else { Sender::Bot },
                    text: text.to_string(),
                    ts: format!("2024-01-01T00:00:{:02}Z", i),
                });
            }
        }
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn query_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Query(_)))
    }

    pub fn history_append_count(&self) -> usize {
        self.count(|c| matches!(c, Call::AppendHistory(_)))
    }

    pub fn log_count(&self) -> usize {
        self.count(|c| matches!(c, Call::WriteLog(_)))
    }

    pub fn stored_history(&self) -> Vec<HistoryRecord> {
        self.history.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn offline_faq(&self) -> Result<FaqTable> {
        self.record(Call::OfflineFaq);
        self.faq
            .clone()
            .ok_or_else(|| CampusError::server(404, "not found"))
    }

    async fn query(&self, _token: Option<&str>, request: &QueryRequest) -> Result<QueryReply> {
        self.record(Call::Query(request.clone()));
        match &self.query {
            QueryBehavior::Answer(answer) => Ok(QueryReply {
                answer: answer.clone(),
                source: Some("ai".to_string()),
            }),
            QueryBehavior::ServerError(status, msg) => {
                Err(CampusError::server(*status, msg.clone()))
            }
            QueryBehavior::Unreachable => Err(CampusError::Transport("connection refused".into())),
        }
    }

    async fn append_history(&self, _token: Option<&str>, record: &HistoryAppend) -> Result<()> {
        self.record(Call::AppendHistory(record.clone()));
        if self.fail_writes {
            return Err(CampusError::Transport("connection reset".into()));
        }
        self.history.lock().unwrap().push(HistoryRecord {
            from: record.from,
            text: record.text.clone(),
            ts: record.ts.clone(),
        });
        Ok(())
    }

    async fn fetch_history(
        &self,
        _token: Option<&str>,
        user: &str,
        page: u32,
        size: u32,
    ) -> Result<HistoryPage> {
        self.record(Call::FetchHistory {
            user: user.to_string(),
            page,
            size,
        });
        if self.fail_reads {
            return Err(CampusError::Transport("timed out".into()));
        }
        let newest_first: Vec<HistoryRecord> =
            self.history.lock().unwrap().iter().rev().cloned().collect();
        let start = (page.saturating_sub(1) * size) as usize;
        let items = newest_first
            .into_iter()
            .skip(start)
            .take(size as usize)
            .collect();
        Ok(HistoryPage {
            history: items,
            page,
            size,
            total: None,
        })
    }

    async fn delete_history(&self, _token: Option<&str>, request: &HistoryDelete) -> Result<()> {
        self.record(Call::DeleteHistory(request.clone()));
        if self.fail_writes {
            return Err(CampusError::server(500, "db error"));
        }
        let mut history = self.history.lock().unwrap();
        match &request.ts {
            Some(ts) => history.retain(|r| &r.ts != ts),
            None => history.clear(),
        }
        Ok(())
    }

    async fn write_log(&self, _token: Option<&str>, record: &LogRecord) -> Result<()> {
        self.record(Call::WriteLog(record.clone()));
        if self.fail_writes {
            return Err(CampusError::Transport("connection reset".into()));
        }
        Ok(())
    }

    async fn status(&self, _token: Option<&str>) -> Result<AiStatus> {
        self.record(Call::Status);
        match self.status {
            StatusBehavior::Allowed(allowed) => Ok(AiStatus {
                allow_external_queries: allowed,
                ai_provider_available: None,
            }),
            StatusBehavior::Unreachable => Err(CampusError::Transport("offline".into())),
            StatusBehavior::ServerError => Err(CampusError::server(502, "bad gateway")),
        }
    }
}
