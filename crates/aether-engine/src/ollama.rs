//! Adapter for an Ollama-compatible local server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::InferenceEngine;
use crate::error::EngineError;
use crate::types::{ChatMessage, CompletionOptions, EngineConfig};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// How long the server keeps the model loaded after a request.
const KEEP_ALIVE_CACHED: &str = "30m";
const KEEP_ALIVE_UNCACHED: &str = "0";

pub struct OllamaEngine {
    endpoint: String,
    client: Arc<dyn OllamaHttpClient>,
    loaded: Mutex<Option<LoadedModel>>,
}

#[derive(Debug, Clone)]
struct LoadedModel {
    name: String,
    keep_alive: &'static str,
}

impl OllamaEngine {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_http_client(endpoint, Arc::new(ReqwestOllamaHttpClient::default()))
    }

    fn with_http_client(endpoint: impl Into<String>, client: Arc<dyn OllamaHttpClient>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            loaded: Mutex::new(None),
        }
    }

    fn loaded(&self) -> Option<LoadedModel> {
        self.loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn build_chat_request(
        model: &LoadedModel,
        history: &[ChatMessage],
        options: &CompletionOptions,
    ) -> OllamaChatRequest {
        OllamaChatRequest {
            model: model.name.clone(),
            messages: history.to_vec(),
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
            stream: false,
            keep_alive: model.keep_alive.to_string(),
        }
    }
}

/// `phi3.5` matches a listed `phi3.5:latest`.
fn model_listed(models: &[OllamaModel], wanted: &str) -> bool {
    models.iter().any(|m| {
        m.name == wanted
            || m
                .name
                .strip_suffix(":latest")
                .is_some_and(|base| base == wanted)
    })
}

#[async_trait]
impl InferenceEngine for OllamaEngine {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn initialize(&self, model_id: &str, config: &EngineConfig) -> Result<(), EngineError> {
        let url = format!("{}/api/tags", self.endpoint);
        let tags = self.client.get_models(&url).await?;
        if !model_listed(&tags.models, model_id) {
            return Err(EngineError::ModelUnavailable {
                model: model_id.to_string(),
                endpoint: self.endpoint.clone(),
            });
        }

        let keep_alive = if config.cache_enabled {
            KEEP_ALIVE_CACHED
        } else {
            KEEP_ALIVE_UNCACHED
        };
        *self
            .loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(LoadedModel {
            name: model_id.to_string(),
            keep_alive,
        });
        tracing::debug!(model = %model_id, endpoint = %self.endpoint, "Ollama model available");
        Ok(())
    }

    async fn complete(
        &self,
        history: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, EngineError> {
        let model = self.loaded().ok_or(EngineError::NotReady)?;
        let request = Self::build_chat_request(&model, history, options);
        let url = format!("{}/api/chat", self.endpoint);
        let response = self.client.post_chat(&url, &request).await?;

        let content = response.message.content.trim();
        if content.is_empty() {
            return Err(EngineError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}

#[derive(Debug, Serialize, Clone)]
pub(crate) struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    options: OllamaOptions,
    stream: bool,
    keep_alive: String,
}

#[derive(Debug, Serialize, Clone)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub(crate) struct OllamaChatResponse {
    message: OllamaReply,
}

#[derive(Debug, Deserialize, Clone)]
struct OllamaReply {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize, Clone)]
pub(crate) struct OllamaModelsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize, Clone)]
struct OllamaModel {
    name: String,
}

#[async_trait]
pub(crate) trait OllamaHttpClient: Send + Sync {
    async fn post_chat(
        &self,
        url: &str,
        request: &OllamaChatRequest,
    ) -> Result<OllamaChatResponse, EngineError>;
    async fn get_models(&self, url: &str) -> Result<OllamaModelsResponse, EngineError>;
}

struct ReqwestOllamaHttpClient {
    client: reqwest::Client,
}

impl Default for ReqwestOllamaHttpClient {
    fn default() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

fn transport(url: &str, err: reqwest::Error) -> EngineError {
    EngineError::Transport {
        endpoint: url.to_string(),
        reason: err.to_string(),
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, EngineError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EngineError::Http {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await.map_err(|e| transport(url, e))?;
    serde_json::from_slice(&bytes).map_err(|e| EngineError::Decode(e.to_string()))
}

#[async_trait]
impl OllamaHttpClient for ReqwestOllamaHttpClient {
    async fn post_chat(
        &self,
        url: &str,
        request: &OllamaChatRequest,
    ) -> Result<OllamaChatResponse, EngineError> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport(url, e))?;
        decode(url, response).await
    }

    async fn get_models(&self, url: &str) -> Result<OllamaModelsResponse, EngineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport(url, e))?;
        decode(url, response).await
    }
}
