use crate::embeddings::{Embedder, Embedding};
use crate::error::{RagError, Result, Service};
use crate::rag::ChatModel;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Maximum number of inputs sent in one embeddings request
const EMBEDDING_BATCH_SIZE: usize = 96;

/// Configuration for the OpenAI API
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_base: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub request_timeout: Duration,
}

impl OpenAiConfig {
    /// Create a configuration with default models for the given key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::Configuration(
                "OPENAI_API_KEY must not be empty".to_string(),
            ));
        }

        Ok(OpenAiConfig {
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            request_timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::Configuration("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }
}

// The key is a secret and must never reach the logs
impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Client for the OpenAI embeddings and chat completions endpoints
#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize, Debug)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a new client; every request inherits the configured timeout
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RagError::Configuration(format!("cannot build HTTP client: {}", e)))?;
        Ok(OpenAiClient { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        service: Service,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| RagError::from_http(service, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RagError::remote(
                service,
                format!("API request failed: {} {}", status, error_text),
            ));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| RagError::from_http(service, e))
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: texts,
        };
        let response: EmbeddingResponse =
            self.post(Service::Embedding, "embeddings", &request).await?;
        parse_embeddings(response, texts.len())
    }
}

fn parse_embeddings(response: EmbeddingResponse, expected: usize) -> Result<Vec<Embedding>> {
    let mut data = response.data;
    if data.len() != expected {
        return Err(RagError::remote(
            Service::Embedding,
            format!("expected {} embeddings, received {}", expected, data.len()),
        ));
    }
    data.sort_by_key(|d| d.index);
    Ok(data
        .into_iter()
        .map(|d| Embedding::new(d.embedding))
        .collect())
}

fn parse_answer(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| RagError::remote(Service::Completion, "No response generated"))
}

impl Embedder for OpenAiClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBEDDING_BATCH_SIZE) {
            debug!("Embedding batch of {} texts", batch.len());
            embeddings.extend(self.embed_chunk(batch).await?);
        }
        Ok(embeddings)
    }
}

impl ChatModel for OpenAiClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };
        let response: ChatResponse = self
            .post(Service::Completion, "chat/completions", &request)
            .await?;
        parse_answer(response)
    }
}
