//! OpenAI-compatible chat completion backend.
//!
//! Every provider in the catalog speaks the `/chat/completions` dialect,
//! so one backend covers them all; only verification differs per vendor.

use async_trait::async_trait;
use openconv_core::backend::{ChatBackend, ModelConfig, PromptMessage};
use openconv_core::error::{ConvError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Backend that posts completions to the configured provider.
#[derive(Clone, Default)]
pub struct HttpChatBackend {
    client: Client,
}

impl HttpChatBackend {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send_completion(
        &self,
        messages: &[PromptMessage],
        model: &ModelConfig,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", model.base_url);
        let body = CompletionRequest {
            model: &model.model,
            messages,
        };

        let mut request = self.client.post(&url).json(&body);
        if !model.api_key.is_empty() {
            request = request.bearer_auth(&model.api_key);
        }

        let response = request.send().await.map_err(|err| {
            ConvError::network(format!("Completion request failed: {err}"), None)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_completion_error(status, body_text));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|err| {
            ConvError::network(format!("Failed to parse completion response: {err}"), None)
        })?;

        extract_completion_text(parsed)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_completion_text(response: CompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .ok_or_else(|| ConvError::network("Completion response contained no text", None))
}

fn map_completion_error(status: StatusCode, body: String) -> ConvError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    ConvError::network(
        format!("Completion failed ({}): {}", status.as_u16(), message),
        Some(status.as_u16()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use openconv_core::session::MessageRole;

    #[test]
    fn test_request_serializes_to_wire_shape() {
        let messages = vec![
            PromptMessage::new(MessageRole::System, "You are helpful."),
            PromptMessage::new(MessageRole::User, "hi"),
        ];
        let body = CompletionRequest {
            model: "gpt-4o",
            messages: &messages,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_response_text_comes_from_first_choice() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hello!"}}
            ]
        }"#;

        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_completion_text(parsed).unwrap(), "Hello!");
    }

    #[test]
    fn test_empty_choices_is_a_network_error() {
        let parsed: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let err = extract_completion_text(parsed).unwrap_err();
        assert!(err.is_network());
    }

    #[test]
    fn test_error_mapping_keeps_status() {
        let body = r#"{"error":{"message":"Rate limit exceeded"}}"#.to_string();
        let err = map_completion_error(StatusCode::TOO_MANY_REQUESTS, body);

        match err {
            ConvError::Network { message, status } => {
                assert_eq!(status, Some(429));
                assert!(message.contains("Rate limit exceeded"));
            }
            other => panic!("expected network error, got {other:?}"),
        }
    }
}
