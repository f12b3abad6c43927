use serde::Deserialize;
use serde_json::Value;

use crate::models::Source;

/// One decoded `data:` frame of a chat stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Thinking(String),
    ToolCall(Value),
    ToolResult(Value),
    ConversationId(String),
    Content(String),
    Sources(Vec<Source>),
    Done,
    Error(String),
    /// A well-formed frame with a `type` this client does not know.
    Other { kind: String, content: Value },
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Value,
}

impl StreamEvent {
    /// Parse the JSON payload of a `data:` line.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        let raw: RawFrame = serde_json::from_str(payload)?;
        Ok(Self::from_parts(raw.kind, raw.content))
    }

    fn from_parts(kind: String, content: Value) -> Self {
        match kind.as_str() {
            "thinking" => StreamEvent::Thinking(value_text(&content)),
            "tool_call" => StreamEvent::ToolCall(content),
            "tool_result" => StreamEvent::ToolResult(content),
            "conversation_id" => StreamEvent::ConversationId(value_text(&content)),
            "content" => StreamEvent::Content(value_text(&content)),
            "sources" => StreamEvent::Sources(parse_sources(content)),
            "done" => StreamEvent::Done,
            "error" => {
                let text = value_text(&content);
                StreamEvent::Error(if text.is_empty() {
                    "Unknown error".to_string()
                } else {
                    text
                })
            }
            _ => StreamEvent::Other { kind, content },
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error(_))
    }

    /// Text for the single in-place status line, for the event kinds that drive it.
    pub fn status_text(&self) -> Option<String> {
        match self {
            StreamEvent::Thinking(text) => Some(text.clone()),
            StreamEvent::ToolCall(content) => Some(match tool_name(content) {
                Some(name) => format!("Using {}...", name),
                None => format!("Using tool {}", value_text(content)),
            }),
            StreamEvent::ToolResult(content) => Some(match tool_name(content) {
                Some(name) => format!("Got result from {}", name),
                None => "Processing tool result...".to_string(),
            }),
            _ => None,
        }
    }
}

fn tool_name(content: &Value) -> Option<&str> {
    content
        .get("tool")
        .or_else(|| content.get("name"))
        .and_then(|v| v.as_str())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_sources(content: Value) -> Vec<Source> {
    let Value::Array(items) = content else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(title) => Some(Source {
                title,
                ..Default::default()
            }),
            Value::Object(_) => serde_json::from_value(item).ok(),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!(
            StreamEvent::parse(r#"{"type":"content","content":"Hi"}"#).unwrap(),
            StreamEvent::Content("Hi".into())
        );
        assert_eq!(
            StreamEvent::parse(r#"{"type":"conversation_id","content":"c-9"}"#).unwrap(),
            StreamEvent::ConversationId("c-9".into())
        );
        assert_eq!(
            StreamEvent::parse(r#"{"type":"done"}"#).unwrap(),
            StreamEvent::Done
        );
    }

    #[test]
    fn test_error_without_text() {
        assert_eq!(
            StreamEvent::parse(r#"{"type":"error","content":null}"#).unwrap(),
            StreamEvent::Error("Unknown error".into())
        );
    }

    #[test]
    fn test_numeric_conversation_id_is_stringified() {
        assert_eq!(
            StreamEvent::parse(r#"{"type":"conversation_id","content":42}"#).unwrap(),
            StreamEvent::ConversationId("42".into())
        );
    }

    #[test]
    fn test_unknown_kind_is_kept() {
        let event = StreamEvent::parse(r#"{"type":"usage","content":{"tokens":3}}"#).unwrap();
        assert!(matches!(event, StreamEvent::Other { ref kind, .. } if kind == "usage"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_missing_type_is_an_error() {
        assert!(StreamEvent::parse(r#"{"content":"x"}"#).is_err());
    }

    #[test]
    fn test_sources_mixed_shapes() {
        let event = StreamEvent::parse(
            r#"{"type":"sources","content":["Handbook",{"title":"FAQ","url":"https://x/faq"},7]}"#,
        )
        .unwrap();
        let StreamEvent::Sources(sources) = event else {
            panic!("expected sources");
        };
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "Handbook");
        assert_eq!(sources[1].url.as_deref(), Some("https://x/faq"));
    }

    #[test]
    fn test_status_text() {
        let call = StreamEvent::ToolCall(serde_json::json!({"tool": "weather"}));
        assert_eq!(call.status_text().as_deref(), Some("Using weather..."));

        let result = StreamEvent::ToolResult(serde_json::json!("ok"));
        assert_eq!(
            result.status_text().as_deref(),
            Some("Processing tool result...")
        );

        assert!(StreamEvent::Done.status_text().is_none());
    }
}
