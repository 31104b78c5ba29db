use serde::{Deserialize, Deserializer, Serialize};

use crate::db::models::UserType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of `POST /api/chat`, as sent by the chat widget.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default, deserialize_with = "lenient_user_type")]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub system_context: Option<String>,
}

/// Widgets send free-form strings here; anything but `student` or `teacher` chats as a guest.
fn lenient_user_type<'de, D>(deserializer: D) -> Result<Option<UserType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|value| match value.as_str() {
        "student" => UserType::Student,
        "teacher" => UserType::Teacher,
        _ => UserType::Guest,
    }))
}

impl ChatRequest {
    /// Content of the last message, or "" for an empty conversation.
    pub fn latest_query(&self) -> &str {
        self.messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_payload_parses() {
        let req: ChatRequest = serde_json::from_str(
            r#"{
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"},
                    {"role": "user", "content": "How do I mark attendance?"}
                ],
                "userType": "student",
                "userName": "Alice Johnson",
                "userId": 1,
                "sessionId": "session_1"
            }"#,
        )
        .unwrap();
        assert_eq!(req.user_type, Some(UserType::Student));
        assert_eq!(req.latest_query(), "How do I mark attendance?");
        assert!(req.system_context.is_none());
    }

    #[test]
    fn empty_conversation_has_empty_query() {
        let req: ChatRequest = serde_json::from_str(r#"{"messages": []}"#).unwrap();
        assert_eq!(req.latest_query(), "");
        assert!(req.user_type.is_none());
    }

    #[test]
    fn unknown_user_type_chats_as_guest() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"messages": [], "userType": "admin"}"#).unwrap();
        assert_eq!(req.user_type, Some(UserType::Guest));
        let req: ChatRequest =
            serde_json::from_str(r#"{"messages": [], "userType": null}"#).unwrap();
        assert!(req.user_type.is_none());
    }
}
