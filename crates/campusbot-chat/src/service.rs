//! Message-passing front end for a [`ChatSession`].
//!
//! The session runs on its own task and owns all mutable chat state.
//! Callers hold a cloneable [`ChatServiceHandle`], send [`ChatRequest`]s
//! over an mpsc channel, and get answers back on oneshot channels. View
//! changes are broadcast as [`ViewEvent`]s to any number of subscribers.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use campusbot_core::types::{AiAvailability, HistoryRecord, Message, Session};

use crate::error::ChatError;
use crate::session::{ChatSession, SendOutcome};
use crate::view::ViewEvent;

const REQUEST_CAPACITY: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, ChatError>>;

/// Requests understood by the chat service task.
pub enum ChatRequest {
    LoadFaq { response: oneshot::Sender<bool> },
    Greet { text: String, response: oneshot::Sender<()> },
    Send { text: String, response: Reply<SendOutcome> },
    QuickAsk { text: String, response: Reply<SendOutcome> },
    LoadHistory { response: Reply<usize> },
    LoadEarlier { response: Reply<usize> },
    HasEarlier { response: oneshot::Sender<bool> },
    HistoryListing { page: u32, response: Reply<Vec<HistoryRecord>> },
    DeleteHistoryItem { ts: String, response: Reply<()> },
    ClearHistory { response: Reply<()> },
    AiStatus { response: oneshot::Sender<AiAvailability> },
    Autocomplete { input: String, response: oneshot::Sender<Vec<String>> },
    RemoveSuggestion { query: String, response: oneshot::Sender<bool> },
    Messages { response: oneshot::Sender<Vec<Message>> },
    CurrentSession { response: oneshot::Sender<Option<Session>> },
    Logout { response: Reply<()> },
    Shutdown,
}

impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadFaq { .. } => write!(f, "LoadFaq"),
            Self::Greet { .. } => write!(f, "Greet"),
            Self::Send { text, .. } => f.debug_struct("Send").field("len", &text.len()).finish(),
            Self::QuickAsk { text, .. } => f.debug_struct("QuickAsk").field("text", text).finish(),
            Self::LoadHistory { .. } => write!(f, "LoadHistory"),
            Self::LoadEarlier { .. } => write!(f, "LoadEarlier"),
            Self::HasEarlier { .. } => write!(f, "HasEarlier"),
            Self::HistoryListing { page, .. } => {
                f.debug_struct("HistoryListing").field("page", page).finish()
            }
            Self::DeleteHistoryItem { ts, .. } => {
                f.debug_struct("DeleteHistoryItem").field("ts", ts).finish()
            }
            Self::ClearHistory { .. } => write!(f, "ClearHistory"),
            Self::AiStatus { .. } => write!(f, "AiStatus"),
            Self::Autocomplete { .. } => write!(f, "Autocomplete"),
            Self::RemoveSuggestion { .. } => write!(f, "RemoveSuggestion"),
            Self::Messages { .. } => write!(f, "Messages"),
            Self::CurrentSession { .. } => write!(f, "CurrentSession"),
            Self::Logout { .. } => write!(f, "Logout"),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// The task that owns a [`ChatSession`].
pub struct ChatService {
    session: ChatSession,
    requests: mpsc::Receiver<ChatRequest>,
}

impl ChatService {
    /// Move `session` onto a new task and return a handle to it.
    pub fn spawn(session: ChatSession) -> (ChatServiceHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(REQUEST_CAPACITY);
        let events = session.event_sender();
        let service = ChatService {
            session,
            requests: rx,
        };
        let task = tokio::spawn(service.run());
        (ChatServiceHandle { tx, events }, task)
    }

    async fn run(mut self) {
        info!("Chat service started");
        while let Some(request) = self.requests.recv().await {
            debug!(?request, "Chat request");
            if !self.handle(request).await {
                break;
            }
        }
        info!("Chat service stopped");
    }

    /// Returns `false` when the loop should stop. A dropped response
    /// channel means the caller gave up; the work still completes.
    async fn handle(&mut self, request: ChatRequest) -> bool {
        let s = &mut self.session;
        match request {
            ChatRequest::LoadFaq { response } => {
                let _ = response.send(s.load_faq().await);
            }
            ChatRequest::Greet { text, response } => {
                s.greet(&text);
                let _ = response.send(());
            }
            ChatRequest::Send { text, response } => {
                let _ = response.send(s.send(&text).await);
            }
            ChatRequest::QuickAsk { text, response } => {
                let _ = response.send(s.quick_ask(&text).await);
            }
            ChatRequest::LoadHistory { response } => {
                let _ = response.send(s.load_history().await);
            }
            ChatRequest::LoadEarlier { response } => {
                let _ = response.send(s.load_earlier().await);
            }
            ChatRequest::HasEarlier { response } => {
                let _ = response.send(s.has_earlier());
            }
            ChatRequest::HistoryListing { page, response } => {
                let _ = response.send(s.history_listing(page).await);
            }
            ChatRequest::DeleteHistoryItem { ts, response } => {
                let _ = response.send(s.delete_history_item(&ts).await);
            }
            ChatRequest::ClearHistory { response } => {
                let _ = response.send(s.clear_history().await);
            }
            ChatRequest::AiStatus { response } => {
                let _ = response.send(s.ai_status().await);
            }
            ChatRequest::Autocomplete { input, response } => {
                let _ = response.send(s.autocomplete(&input));
            }
            ChatRequest::RemoveSuggestion { query, response } => {
                let _ = response.send(s.remove_suggestion(&query));
            }
            ChatRequest::Messages { response } => {
                let _ = response.send(s.view().messages().to_vec());
            }
            ChatRequest::CurrentSession { response } => {
                let _ = response.send(s.context().session().cloned());
            }
            ChatRequest::Logout { response } => {
                let _ = response.send(s.logout());
            }
            ChatRequest::Shutdown => return false,
        }
        true
    }
}

/// Cloneable handle to a running [`ChatService`].
#[derive(Clone)]
pub struct ChatServiceHandle {
    tx: mpsc::Sender<ChatRequest>,
    events: broadcast::Sender<ViewEvent>,
}

impl ChatServiceHandle {
    /// Receive every view change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ChatRequest,
    ) -> Result<T, ChatError> {
        let (response, rx) = oneshot::channel();
        self.tx
            .send(build(response))
            .await
            .map_err(|_| ChatError::ServiceClosed)?;
        rx.await.map_err(|_| ChatError::ServiceClosed)
    }

    pub async fn load_faq(&self) -> Result<bool, ChatError> {
        self.request(|response| ChatRequest::LoadFaq { response })
            .await
    }

    pub async fn greet(&self, text: impl Into<String>) -> Result<(), ChatError> {
        let text = text.into();
        self.request(|response| ChatRequest::Greet { text, response })
            .await
    }

    pub async fn send(&self, text: impl Into<String>) -> Result<SendOutcome, ChatError> {
        let text = text.into();
        self.request(|response| ChatRequest::Send { text, response })
            .await?
    }

    pub async fn quick_ask(&self, text: impl Into<String>) -> Result<SendOutcome, ChatError> {
        let text = text.into();
        self.request(|response| ChatRequest::QuickAsk { text, response })
            .await?
    }

    pub async fn load_history(&self) -> Result<usize, ChatError> {
        self.request(|response| ChatRequest::LoadHistory { response })
            .await?
    }

    pub async fn load_earlier(&self) -> Result<usize, ChatError> {
        self.request(|response| ChatRequest::LoadEarlier { response })
            .await?
    }

    pub async fn has_earlier(&self) -> Result<bool, ChatError> {
        self.request(|response| ChatRequest::HasEarlier { response })
            .await
    }

    pub async fn history_listing(&self, page: u32) -> Result<Vec<HistoryRecord>, ChatError> {
        self.request(|response| ChatRequest::HistoryListing { page, response })
            .await?
    }

    pub async fn delete_history_item(&self, ts: impl Into<String>) -> Result<(), ChatError> {
        let ts = ts.into();
        self.request(|response| ChatRequest::DeleteHistoryItem { ts, response })
            .await?
    }

    pub async fn clear_history(&self) -> Result<(), ChatError> {
        self.request(|response| ChatRequest::ClearHistory { response })
            .await?
    }

    pub async fn ai_status(&self) -> Result<AiAvailability, ChatError> {
        self.request(|response| ChatRequest::AiStatus { response })
            .await
    }

    pub async fn autocomplete(&self, input: impl Into<String>) -> Result<Vec<String>, ChatError> {
        let input = input.into();
        self.request(|response| ChatRequest::Autocomplete { input, response })
            .await
    }

    pub async fn remove_suggestion(&self, query: impl Into<String>) -> Result<bool, ChatError> {
        let query = query.into();
        self.request(|response| ChatRequest::RemoveSuggestion { query, response })
            .await
    }

    /// Snapshot of the current view.
    pub async fn messages(&self) -> Result<Vec<Message>, ChatError> {
        self.request(|response| ChatRequest::Messages { response })
            .await
    }

    /// The signed-in session, or `None` for a guest.
    pub async fn current_session(&self) -> Result<Option<Session>, ChatError> {
        self.request(|response| ChatRequest::CurrentSession { response })
            .await
    }

    /// Sign out and clear the view.
    pub async fn logout(&self) -> Result<(), ChatError> {
        self.request(|response| ChatRequest::Logout { response })
            .await?
    }

    /// Ask the service to stop after the requests already queued.
    pub async fn shutdown(&self) -> Result<(), ChatError> {
        self.tx
            .send(ChatRequest::Shutdown)
            .await
            .map_err(|_| ChatError::ServiceClosed)
    }
}
