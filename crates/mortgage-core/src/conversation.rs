//! Conversation history owned by the front end.

use crate::chat::{ChatMessage, ChatRequest, ChatResponse};
use crate::config::DEFAULT_MAX_MESSAGES;
use crate::error::ApiError;

/// Turn-ordered chat history bound to one session
#[derive(Debug, Clone)]
pub struct Conversation {
    session_id: String,
    messages: Vec<ChatMessage>,
    max_messages: usize,
}

impl Conversation {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }

    /// Cap history to the most recent `max_messages` turns (at least one)
    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages.max(1);
        self.trim();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
        self.trim();
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
        self.trim();
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Snapshot of the history as a request to the agent
    pub fn to_request(&self) -> ChatRequest {
        ChatRequest::new(self.session_id.clone(), self.messages.clone())
    }

    pub fn record_reply(&mut self, response: &ChatResponse) {
        self.push_assistant(response.output_text.clone());
    }

    /// Append an apology turn for failures the user should see inline.
    /// Returns false for timeouts and transport failures, which are left to
    /// a retry prompt.
    pub fn record_failure(&mut self, error: &ApiError) -> bool {
        if !error.shows_in_conversation() {
            return false;
        }
        self.push_assistant(format!(
            "I apologize, but I encountered an error: {}. Please try again.",
            error.message
        ));
        true
    }

    fn trim(&mut self) {
        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatRole;

    #[test]
    fn test_history_keeps_turn_order() {
        let mut conversation = Conversation::new("session_1");
        conversation.push_user("Hi");
        conversation.push_assistant("Hello! How can I help?");
        conversation.push_user("What's my rate?");

        let request = conversation.to_request();
        assert_eq!(request.session_id, "session_1");
        let roles: Vec<ChatRole> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant, ChatRole::User]);
    }

    #[test]
    fn test_history_is_capped_to_most_recent() {
        let mut conversation = Conversation::new("session_1").with_max_messages(3);
        for i in 0..5 {
            conversation.push_user(format!("message {}", i));
        }
        let contents: Vec<&str> = conversation
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["message 2", "message 3", "message 4"]);
    }

    #[test]
    fn test_record_reply_appends_assistant_turn() {
        let mut conversation = Conversation::new("session_1");
        conversation.push_user("Hi");
        conversation.record_reply(&ChatResponse {
            output_text: "Welcome".to_string(),
            meta: None,
        });
        assert_eq!(conversation.messages()[1], ChatMessage::assistant("Welcome"));
    }

    #[test]
    fn test_record_failure_only_for_visible_errors() {
        let mut conversation = Conversation::new("session_1");
        conversation.push_user("Hi");

        assert!(!conversation.record_failure(&ApiError::network("offline")));
        assert!(!conversation.record_failure(&ApiError::timeout(1000)));
        assert_eq!(conversation.messages().len(), 1);

        let err = ApiError::from_server(502, "AI service is unavailable", "SERVICE_ERROR", None);
        assert!(conversation.record_failure(&err));
        assert_eq!(
            conversation.messages()[1].content,
            "I apologize, but I encountered an error: AI service is unavailable. Please try again."
        );
    }

    #[test]
    fn test_clear() {
        let mut conversation = Conversation::new("session_1");
        conversation.push_user("Hi");
        conversation.clear();
        assert!(conversation.is_empty());
        assert_eq!(conversation.session_id(), "session_1");
    }
}
