use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{ChatMessage, ChatRequest, OpenAiClient};
use crate::apis::llm_json;
use crate::apis::prompts::extraction_system_prompt;
use crate::app::ports::{CoverageExtractor, ExtractionKind};
use crate::domain::PolicyDetails;
use crate::observability::metrics;

/// Reads declaration-page images with a vision-capable chat model.
pub struct OpenAiCoverageExtractor {
    client: Arc<OpenAiClient>,
}

impl OpenAiCoverageExtractor {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }

    fn request(&self, image_data_url: &str, kind: ExtractionKind) -> ChatRequest {
        let config = self.client.config();
        ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage::system(extraction_system_prompt(kind)),
                ChatMessage::user_image(image_data_url),
            ],
            temperature: config.extract_temperature,
            max_tokens: config.max_tokens,
            response_format: None,
        }
    }
}

/// Interpret a model reply as policy fields.
pub fn parse_policy_response(content: &str) -> anyhow::Result<PolicyDetails> {
    let value = llm_json::extract_json_object(content)?;
    serde_json::from_value(value).context("Reply did not match the policy field structure")
}

#[async_trait]
impl CoverageExtractor for OpenAiCoverageExtractor {
    #[instrument(skip(self, image_data_url, kind), fields(kind = kind.as_str()))]
    async fn extract(&self, image_data_url: &str, kind: ExtractionKind) -> anyhow::Result<PolicyDetails> {
        info!("Analyzing image for {}", kind.as_str());
        let result = match self.client.complete(&self.request(image_data_url, kind)).await {
            Ok(content) => parse_policy_response(&content),
            Err(e) => Err(e.into()),
        };

        match &result {
            Ok(_) => metrics::extract::success(kind.as_str()),
            Err(_) => metrics::extract::error(kind.as_str()),
        }
        result.with_context(|| format!("Failed to extract {} from image", kind.as_str()))
    }
}
