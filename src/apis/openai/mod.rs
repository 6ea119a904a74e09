//! Chat-completions client shared by the search source and the coverage
//! extractor.

pub mod extract;
pub mod search;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::OpenAiConfig;
use crate::error::{PolicyWeatherError, Result};

pub use extract::OpenAiCoverageExtractor;
pub use search::{parse_search_response, OpenAiSearchSource};

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_image(url: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(vec![ContentPart::ImageUrl {
                image_url: ImageUrl { url: url.into() },
            }]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self { kind: "json_object" }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if the model produced any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
            .filter(|content| !content.trim().is_empty())
    }
}

pub struct OpenAiClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Send a chat-completions request and return the first choice's text.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| PolicyWeatherError::Config("OpenAI API key not configured".to_string()))?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("OpenAI API error {}: {}", status, body);
            return Err(PolicyWeatherError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let data: ChatResponse = response.json().await?;
        let content = data
            .first_content()
            .ok_or_else(|| PolicyWeatherError::InvalidResponse("No content in OpenAI response".to_string()))?;
        debug!("OpenAI response content: {}", content);
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![
                ChatMessage::system("extract"),
                ChatMessage::user_image("data:image/jpeg;base64,AAAA"),
            ],
            temperature: 0.1,
            max_tokens: 1000,
            response_format: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0], json!({"role": "system", "content": "extract"}));
        assert_eq!(
            value["messages"][1]["content"],
            json!([{"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AAAA"}}])
        );
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_first_content() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"events\": []}"}}]
        }))
        .unwrap();
        assert_eq!(response.first_content(), Some("{\"events\": []}"));

        let empty: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(empty.first_content(), None);

        let blank: ChatResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": "  "}}]})).unwrap();
        assert_eq!(blank.first_content(), None);
    }
}
