//! In-memory message view.
//!
//! The ordered list of messages the user sees, plus the transient
//! "thinking" placeholder. Every change is also published as a
//! [`ViewEvent`] so a UI layer can render without polling.

use tokio::sync::broadcast;

use campusbot_core::types::{Message, Sender};

const EVENT_CAPACITY: usize = 256;

/// A change to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Appended(Message),
    ThinkingShown,
    ThinkingCleared,
    /// Earlier messages inserted above the existing ones, oldest first.
    Prepended(Vec<Message>),
    /// The whole view replaced, oldest first.
    Replaced(Vec<Message>),
    Cleared,
}

#[derive(Debug)]
pub struct ChatView {
    messages: Vec<Message>,
    thinking: bool,
    events: broadcast::Sender<ViewEvent>,
}

impl Default for ChatView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            messages: Vec::new(),
            thinking: false,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<ViewEvent> {
        self.events.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// Text of the most recent bot message, if any.
    pub fn last_bot_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.from == Sender::Bot)
            .map(|m| m.text.as_str())
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message.clone());
        self.publish(ViewEvent::Appended(message));
    }

    pub fn show_thinking(&mut self) {
        if !self.thinking {
            self.thinking = true;
            self.publish(ViewEvent::ThinkingShown);
        }
    }

    pub fn clear_thinking(&mut self) {
        if self.thinking {
            self.thinking = false;
            self.publish(ViewEvent::ThinkingCleared);
        }
    }

    pub fn prepend(&mut self, earlier: Vec<Message>) {
        if earlier.is_empty() {
            return;
        }
        let mut merged = earlier.clone();
        merged.append(&mut self.messages);
        self.messages = merged;
        self.publish(ViewEvent::Prepended(earlier));
    }

    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages.clone();
        self.thinking = false;
        self.publish(ViewEvent::Replaced(messages));
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.thinking = false;
        self.publish(ViewEvent::Cleared);
    }

    fn publish(&self, event: ViewEvent) {
        // No subscribers is fine; the view itself is the source of truth.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_last_bot_text() {
        let mut view = ChatView::new();
        assert!(view.last_bot_text().is_none());
        view.append(Message::bot("first answer"));
        view.append(Message::user("question"));
        assert_eq!(view.last_bot_text(), Some("first answer"));
        assert_eq!(view.messages().len(), 2);
    }

    #[test]
    fn test_prepend_keeps_order() {
        let mut view = ChatView::new();
        view.append(Message::user("newest"));
        view.prepend(vec![Message::user("oldest"), Message::bot("older")]);
        let texts: Vec<&str> = view.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["oldest", "older", "newest"]);
    }

    #[test]
    fn test_thinking_toggles_once() {
        let mut view = ChatView::new();
        let mut rx = view.subscribe();
        view.show_thinking();
        view.show_thinking();
        assert!(view.is_thinking());
        view.clear_thinking();
        assert!(!view.is_thinking());

        assert_eq!(rx.try_recv().unwrap(), ViewEvent::ThinkingShown);
        assert_eq!(rx.try_recv().unwrap(), ViewEvent::ThinkingCleared);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clear_empties_view_and_publishes() {
        let mut view = ChatView::new();
        let mut rx = view.subscribe();
        view.append(Message::user("hi"));
        view.clear();
        assert!(view.is_empty());
        assert!(matches!(rx.try_recv().unwrap(), ViewEvent::Appended(_)));
        assert_eq!(rx.try_recv().unwrap(), ViewEvent::Cleared);
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let mut view = ChatView::new();
        view.append(Message::user("nobody listening"));
        assert_eq!(view.messages().len(), 1);
    }
}
