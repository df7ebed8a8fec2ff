use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::completion_interface::{ChatMessage, CompletionInterface};
use crate::config::CompletionConfig;
use crate::error::{TranslateError, TranslateResult};
use crate::provider::{network_error, provider_error};

const SERVICE: &str = "Completion API";

/// Azure OpenAI chat completions client
pub struct AzureOpenAILLM {
    client: Client,
    endpoint: String,
    api_key: String,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl AzureOpenAILLM {
    pub fn new(client: Client, config: &CompletionConfig) -> Self {
        info!(
            "Initialized AzureOpenAILLM: endpoint={}, max_tokens={}",
            config.endpoint, config.max_tokens
        );
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionInterface for AzureOpenAILLM {
    async fn complete(&self, messages: Vec<ChatMessage>) -> TranslateResult<String> {
        let body = CompletionBody {
            messages: &messages,
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        };

        debug!("Sending completion request with {} messages", messages.len());
        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(provider_error(SERVICE, response).await);
        }

        let status = response.status().as_u16();
        let parsed: CompletionResponse = response.json().await.map_err(|e| TranslateError::Provider {
            status,
            message: format!("unexpected completion response: {}", e),
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| TranslateError::Provider {
                status,
                message: "the model returned an empty completion".to_string(),
            })?;

        debug!("Completion returned {} characters", content.len());
        Ok(content)
    }
}
