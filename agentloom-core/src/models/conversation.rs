use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A citation attached to an assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Source {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

impl Source {
    pub fn display_name(&self) -> &str {
        if !self.title.is_empty() {
            &self.title
        } else if let Some(url) = &self.url {
            url
        } else {
            self.document_id.as_deref().unwrap_or("source")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Body of a chat-stream request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub conversation_id: Option<&'a str>,
    pub timezone: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serializes_null_conversation() {
        let req = ChatRequest {
            message: "hello",
            conversation_id: None,
            timezone: "UTC",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["message"], "hello");
        assert!(json["conversation_id"].is_null());
        assert_eq!(json["timezone"], "UTC");
    }

    #[test]
    fn test_source_display_name_fallbacks() {
        let src = Source {
            url: Some("https://docs.example.com".into()),
            ..Default::default()
        };
        assert_eq!(src.display_name(), "https://docs.example.com");
        assert_eq!(Source::default().display_name(), "source");
    }
}
