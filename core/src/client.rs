use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::AuraConfig;
use crate::conversation::ChatMessage;
use crate::errors::{AuraError, AuraResult};
use crate::reply::response_schema;
use crate::types::*;

/// The two calls the dispatcher makes against a language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// One conversational turn over the full history. Returns the raw JSON text.
    async fn converse(&self, history: &[ChatMessage]) -> AuraResult<String>;

    /// Resolve a deferred lookup. Returns plain text.
    async fn lookup(&self, query: &str) -> AuraResult<String>;
}

/// Client for interacting with the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    model: GeminiModel,
    api_base: String,
    system_prompt: String,
}

impl GeminiClient {
    /// Create a new Gemini API client
    pub fn new(config: &AuraConfig) -> AuraResult<Self> {
        let api_key = config.resolve_api_key()?;
        let model = GeminiModel::new(api_key, config.model_name.clone());

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuraError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            model,
            api_base: config.api_base().to_string(),
            system_prompt: config.system_prompt().to_string(),
        })
    }

    /// Get the generateContent URL for the configured model
    fn get_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model.model_name, self.model.api_key
        )
    }

    /// Generate content using the Gemini API
    pub async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> AuraResult<GenerateContentResponse> {
        let url = self.get_url();

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AuraError::RequestError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                AuraError::ResponseError(format!("Failed to read error response: {}", e))
            })?;

            return Err(AuraError::HttpError {
                status_code: status.as_u16(),
                message: format!("API request failed: {}", error_body),
            });
        }

        let response_body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| AuraError::ResponseError(format!("Failed to decode response: {}", e)))?;

        Ok(response_body)
    }

    /// Builds the structured chat-turn request for `history`.
    pub(crate) fn create_chat_request(&self, history: &[ChatMessage]) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: history.iter().map(Content::from_message).collect(),
            system_instruction: Some(Content {
                parts: vec![Part::text(self.system_prompt.clone())],
                role: None,
            }),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(response_schema()),
            }),
        }
    }

    /// Builds an unstructured single-turn request.
    pub(crate) fn create_lookup_request(&self, query: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(query)],
            system_instruction: None,
            generation_config: None,
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn converse(&self, history: &[ChatMessage]) -> AuraResult<String> {
        debug!(turns = history.len(), model = %self.model.model_name, "Sending chat turn");
        let request = self.create_chat_request(history);
        let response = self.generate_content(request).await?;
        response.first_text().ok_or(AuraError::EmptyResponse)
    }

    async fn lookup(&self, query: &str) -> AuraResult<String> {
        debug!(query = query, "Sending deferred lookup");
        let request = self.create_lookup_request(query);
        let response = self.generate_content(request).await?;
        response.first_text().ok_or(AuraError::EmptyResponse)
    }
}
