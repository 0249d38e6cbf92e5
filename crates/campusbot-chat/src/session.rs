//! Chat session: the offline-first send flow, history mirroring, and
//! history paging for the signed-in user.
//!
//! Each outgoing message moves through
//! `composing -> sent -> {offline-answered | awaiting-remote -> answered | errored}`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use campusbot_core::backend::ChatBackend;
use campusbot_core::config::CampusConfig;
use campusbot_core::error::{CampusError, FailureKind, NETWORK_ERROR_TEXT};
use campusbot_core::session::SessionContext;
use campusbot_core::types::{
    AiAvailability, FaqTable, HistoryAppend, HistoryDelete, HistoryRecord, LogRecord, Message,
    QueryRequest,
};

use crate::context::FollowUpResolver;
use crate::error::ChatError;
use crate::matcher::FaqMatcher;
use crate::pager::HistoryPager;
use crate::suggestions::SuggestionList;
use crate::view::{ChatView, ViewEvent};

/// Tunables for a chat session, taken from [`CampusConfig`].
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub offline_threshold: f64,
    pub quick_access_threshold: f64,
    pub max_message_length: usize,
    pub history_page_size: u32,
    pub listing_size: u32,
    pub autocomplete_limit: usize,
}

impl From<&CampusConfig> for ChatSettings {
    fn from(config: &CampusConfig) -> Self {
        Self {
            offline_threshold: config.chat.offline_threshold,
            quick_access_threshold: config.chat.quick_access_threshold,
            max_message_length: config.chat.max_message_length,
            history_page_size: config.history.page_size,
            listing_size: config.history.listing_size,
            autocomplete_limit: config.suggestions.autocomplete_limit,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from(&CampusConfig::default())
    }
}

/// Where a sent message ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageState {
    /// Answered from the offline FAQ table; the remote query was skipped.
    OfflineAnswered,
    /// Answered by the remote query endpoint.
    Answered,
    /// The remote query failed; the view shows `error`.
    Errored { kind: FailureKind, error: String },
}

/// Outcome of sending one message.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub state: MessageState,
    /// The bot message appended to the view (answer or error text).
    pub reply: Message,
}

pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    ctx: SessionContext,
    settings: ChatSettings,
    matcher: FaqMatcher,
    follow_up: FollowUpResolver,
    faq: Option<FaqTable>,
    view: ChatView,
    suggestions: SuggestionList,
    pager: HistoryPager,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, ctx: SessionContext, config: &CampusConfig) -> Self {
        let settings = ChatSettings::from(config);
        let suggestions = SuggestionList::new(
            ctx.suggestions().to_vec(),
            config.chat.builtin_suggestions.clone(),
            config.suggestions.cap,
        );
        Self {
            backend,
            ctx,
            pager: HistoryPager::new(settings.history_page_size),
            settings,
            matcher: FaqMatcher::new(),
            follow_up: FollowUpResolver::new(config.links.rules.clone()),
            faq: None,
            view: ChatView::new(),
            suggestions,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ViewEvent> {
        self.view.subscribe()
    }

    pub(crate) fn event_sender(&self) -> tokio::sync::broadcast::Sender<ViewEvent> {
        self.view.event_sender()
    }

    pub fn faq_loaded(&self) -> bool {
        self.faq.is_some()
    }

    /// Install a FAQ table directly, bypassing the server.
    pub fn set_faq(&mut self, table: FaqTable) {
        self.faq = Some(table);
    }

    /// Fetch the offline FAQ table. On failure the session keeps working
    /// without it and every question goes to the remote endpoint.
    pub async fn load_faq(&mut self) -> bool {
        match self.backend.offline_faq().await {
            Ok(table) => {
                info!(categories = table.len(), "Offline FAQ loaded");
                self.faq = Some(table);
                true
            }
            Err(e) => {
                warn!(error = %e, "Offline FAQ unavailable");
                false
            }
        }
    }

    /// Show a greeting if the view is empty.
    pub fn greet(&mut self, text: &str) {
        if self.view.is_empty() {
            self.view.append(Message::bot(text));
        }
    }

    /// Send a typed message.
    pub async fn send(&mut self, text: &str) -> Result<SendOutcome, ChatError> {
        let text = self.validate(text)?;

        let user = Message::user(&text);
        self.view.append(user.clone());

        let offline = self
            .follow_up
            .resolve(&text, self.view.last_bot_text())
            .or_else(|| {
                self.matcher
                    .find(self.faq.as_ref(), &text, self.settings.offline_threshold)
            })
            .map(str::to_string);

        if let Some(answer) = offline {
            let reply = Message::bot(answer);
            self.view.append(reply.clone());
            self.persist(&user, &reply, true).await;
            self.remember(&text);
            debug!("Answered offline");
            return Ok(SendOutcome {
                state: MessageState::OfflineAnswered,
                reply,
            });
        }

        Ok(self.ask_remote(user).await)
    }

    /// Ask a quick-access question. A lenient offline match replaces the
    /// view with just this exchange; otherwise the normal send flow runs.
    pub async fn quick_ask(&mut self, query: &str) -> Result<SendOutcome, ChatError> {
        let query = self.validate(query)?;
        let answer = self
            .matcher
            .find(
                self.faq.as_ref(),
                &query,
                self.settings.quick_access_threshold,
            )
            .map(str::to_string);

        match answer {
            Some(answer) => {
                let user = Message::user(&query);
                let reply = Message::bot(answer);
                self.view.clear();
                self.view.append(user.clone());
                self.view.append(reply.clone());
                self.persist(&user, &reply, true).await;
                Ok(SendOutcome {
                    state: MessageState::OfflineAnswered,
                    reply,
                })
            }
            None => self.send(&query).await,
        }
    }

    async fn ask_remote(&mut self, user: Message) -> SendOutcome {
        self.view.show_thinking();
        let request = QueryRequest {
            message: user.text.clone(),
            role: self.ctx.role(),
        };
        let result = self.backend.query(self.ctx.token(), &request).await;
        self.view.clear_thinking();

        match result {
            Ok(reply) => {
                let bot = Message::bot(reply.answer);
                self.view.append(bot.clone());
                self.persist(&user, &bot, false).await;
                self.remember(&user.text);
                debug!(source = ?reply.source, "Answered remotely");
                SendOutcome {
                    state: MessageState::Answered,
                    reply: bot,
                }
            }
            Err(e) => {
                warn!(error = %e, "Query failed");
                let text = error_bubble(&e);
                let bot = Message::bot(text);
                self.view.append(bot.clone());
                SendOutcome {
                    state: MessageState::Errored {
                        kind: e.kind(),
                        error: e.user_message(),
                    },
                    reply: bot,
                }
            }
        }
    }

    fn validate(&self, text: &str) -> Result<String, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.settings.max_message_length {
            return Err(ChatError::MessageTooLong(self.settings.max_message_length));
        }
        Ok(text.to_string())
    }

    /// Mirror an exchange to server history: one append per party, then
    /// one log record. Failures are logged and otherwise dropped.
    async fn persist(&self, user: &Message, bot: &Message, offline: bool) {
        let key = self.ctx.user_key();
        let token = self.ctx.token();

        for message in [user, bot] {
            let record = HistoryAppend::for_message(key, message);
            if let Err(e) = self.backend.append_history(token, &record).await {
                warn!(error = %e, from = message.from.as_str(), "History append dropped");
            }
        }

        let log = LogRecord {
            user: key.to_string(),
            user_msg: user.text.clone(),
            bot_msg: bot.text.clone(),
            offline,
        };
        if let Err(e) = self.backend.write_log(token, &log).await {
            warn!(error = %e, "Log write dropped");
        }
    }

    fn remember(&mut self, query: &str) {
        if self.suggestions.record(query) {
            self.save_suggestions();
        }
    }

    fn save_suggestions(&mut self) {
        if let Err(e) = self.ctx.save_suggestions(self.suggestions.saved().to_vec()) {
            warn!(error = %e, "Failed to persist suggestions");
        }
    }

    // -- Suggestions --

    pub fn autocomplete(&self, input: &str) -> Vec<String> {
        self.suggestions
            .autocomplete(input, self.settings.autocomplete_limit)
    }

    pub fn remove_suggestion(&mut self, query: &str) -> bool {
        let changed = self.suggestions.remove(query);
        if changed {
            self.save_suggestions();
        }
        changed
    }

    pub fn saved_suggestions(&self) -> &[String] {
        self.suggestions.saved()
    }

    // -- History --

    /// Replace the view with the newest page of history.
    pub async fn load_history(&mut self) -> Result<usize, ChatError> {
        let messages = self
            .pager
            .load_latest(
                self.backend.as_ref(),
                self.ctx.token(),
                self.ctx.user_key(),
            )
            .await?;
        let count = messages.len();
        self.view.replace(messages);
        Ok(count)
    }

    /// Stack the next-older page above the current view.
    pub async fn load_earlier(&mut self) -> Result<usize, ChatError> {
        let messages = self
            .pager
            .load_earlier(
                self.backend.as_ref(),
                self.ctx.token(),
                self.ctx.user_key(),
            )
            .await?;
        let count = messages.len();
        if self.pager.page() == 1 {
            self.view.replace(messages);
        } else {
            self.view.prepend(messages);
        }
        Ok(count)
    }

    pub fn has_earlier(&self) -> bool {
        self.pager.has_more()
    }

    /// One page of the full history listing, newest first.
    pub async fn history_listing(&self, page: u32) -> Result<Vec<HistoryRecord>, ChatError> {
        let fetched = self
            .backend
            .fetch_history(
                self.ctx.token(),
                self.ctx.user_key(),
                page.max(1),
                self.settings.listing_size,
            )
            .await?;
        Ok(fetched.history)
    }

    pub async fn delete_history_item(&self, ts: &str) -> Result<(), ChatError> {
        let request = HistoryDelete {
            user: self.ctx.user_key().to_string(),
            ts: Some(ts.to_string()),
        };
        self.backend
            .delete_history(self.ctx.token(), &request)
            .await?;
        Ok(())
    }

    pub async fn clear_history(&self) -> Result<(), ChatError> {
        let request = HistoryDelete {
            user: self.ctx.user_key().to_string(),
            ts: None,
        };
        self.backend
            .delete_history(self.ctx.token(), &request)
            .await?;
        info!(user = %self.ctx.user_key(), "History cleared");
        Ok(())
    }

    // -- Status and session --

    pub async fn ai_status(&self) -> AiAvailability {
        match self.backend.status(self.ctx.token()).await {
            Ok(status) if status.allow_external_queries => AiAvailability::Enabled,
            Ok(_) => AiAvailability::Disabled,
            Err(e) if e.kind() == FailureKind::Transport => AiAvailability::Offline,
            Err(e) => {
                debug!(error = %e, "Status check failed");
                AiAvailability::Disabled
            }
        }
    }

    /// Sign out and clear the view.
    pub fn logout(&mut self) -> Result<(), ChatError> {
        self.ctx.sign_out()?;
        self.view.clear();
        self.pager.reset();
        Ok(())
    }
}

/// Text shown in the view for a failed remote query.
fn error_bubble(err: &CampusError) -> String {
    match err.kind() {
        FailureKind::Transport => NETWORK_ERROR_TEXT.to_string(),
        _ => format!("Error: {}", err.user_message()),
    }
}
