//! OpenAI-compatible chat-completion wire types (the streaming subset).

use serde::{Deserialize, Serialize};

use super::chat::ChatMessage;

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

/// One `data:` event of a streamed completion.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionChunk {
    /// Concatenated text of every choice's delta; `None` when the event carries no text.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .choices
            .iter()
            .filter_map(|c| c.delta.content.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_text_is_extracted() {
        let chunk: CompletionChunk = serde_json::from_str(
            r#"{"id":"c1","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.text().as_deref(), Some("Hel"));
    }

    #[test]
    fn role_only_and_final_chunks_have_no_text() {
        let role: CompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap();
        assert!(role.text().is_none());
        let last: CompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#).unwrap();
        assert!(last.text().is_none());
        assert_eq!(last.choices[0].finish_reason.as_deref(), Some("stop"));
    }
}
