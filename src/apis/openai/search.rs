use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{ChatMessage, ChatRequest, OpenAiClient, ResponseFormat};
use crate::apis::llm_json;
use crate::apis::prompts::{weather_search_user_prompt, WEATHER_SEARCH_SYSTEM_PROMPT};
use crate::app::ports::EventSource;
use crate::domain::RawEventCandidate;
use crate::error::{Result, SourceError};

/// Parse the model's reply into raw candidates without validating them.
pub fn parse_search_response(content: &str) -> Result<Vec<RawEventCandidate>> {
    llm_json::parse_candidate_list(content)
}

/// Lower-trust, higher-recall event source backed by a generative model.
pub struct OpenAiSearchSource {
    client: Arc<OpenAiClient>,
}

impl OpenAiSearchSource {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }

    fn request(&self, location: &str, start_date: &str, end_date: &str) -> ChatRequest {
        let config = self.client.config();
        ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage::system(WEATHER_SEARCH_SYSTEM_PROMPT),
                ChatMessage::user(weather_search_user_prompt(location, start_date, end_date)),
            ],
            temperature: config.search_temperature,
            max_tokens: config.max_tokens,
            response_format: Some(ResponseFormat::json_object()),
        }
    }
}

#[async_trait]
impl EventSource for OpenAiSearchSource {
    fn name(&self) -> &'static str {
        "openai_search"
    }

    #[instrument(skip(self), fields(source = "openai_search"))]
    async fn search(
        &self,
        location: &str,
        start_date: &str,
        end_date: &str,
    ) -> std::result::Result<Vec<RawEventCandidate>, SourceError> {
        if !self.client.is_configured() {
            return Err(SourceError::NotConfigured("OpenAI API key not configured".to_string()));
        }

        let timeout = self.client.config().timeout();
        let content = self
            .client
            .complete(&self.request(location, start_date, end_date))
            .await
            .map_err(|e| SourceError::from_collaborator(e, timeout))?;
        let candidates =
            parse_search_response(&content).map_err(|e| SourceError::from_collaborator(e, timeout))?;
        info!("Model returned {} candidate events", candidates.len());
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;

    #[test]
    fn test_parse_search_response_keeps_raw_candidates() {
        let content = "```json\n{\"events\": [\
            {\"date\": \"2024-04-09\", \"type\": \"hail\", \"details\": \"golf ball hail\"},\
            {\"date\": \"April 9\", \"type\": \"tornado\"}\
        ]}\n```";

        let candidates = parse_search_response(content).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1]["type"], "tornado");
    }

    #[test]
    fn test_parse_search_response_rejects_prose() {
        assert!(parse_search_response("No events were found.").is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_source_fails_without_network() {
        let client = Arc::new(OpenAiClient::new(OpenAiConfig::default()).unwrap());
        let source = OpenAiSearchSource::new(client);

        let outcome = source.search("Dallas, TX", "04/01/2024", "04/01/2025").await;
        assert!(matches!(outcome, Err(SourceError::NotConfigured(_))));
    }

    #[test]
    fn test_request_uses_search_settings() {
        let client = Arc::new(OpenAiClient::new(OpenAiConfig::default()).unwrap());
        let request = OpenAiSearchSource::new(client).request("Dallas, TX", "04/01/2024", "04/01/2025");

        assert_eq!(request.temperature, 0.7);
        assert!(request.response_format.is_some());
        assert_eq!(request.messages.len(), 2);
    }
}
