//! Estimator backed by the Anthropic Messages API.

use async_trait::async_trait;
use chantier_ai::{SYSTEM_PROMPT, build_user_prompt};
use chantier_core::EstimateRequest;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{EstimationBackend, UpstreamError};

const API_VERSION: &str = "2023-06-01";

/// Connection settings for [`AnthropicClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".into(),
            api_key: None,
            model: "claude-sonnet-4-5".into(),
            max_tokens: 4096,
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Text { text: String },
    Image { source: ImageSource<'a> },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// HTTP client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl AnthropicClient {
    /// `config.base_url` should be like `https://api.anthropic.com`; a
    /// trailing slash is dropped.
    pub fn new(mut config: ClientConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_body<'a>(&'a self, request: &'a EstimateRequest) -> Result<MessagesRequest<'a>, UpstreamError> {
        let catalog = request.catalog()?;
        let mut content: Vec<ContentBlock<'a>> = request
            .images
            .iter()
            .map(|image| ContentBlock::Image {
                source: ImageSource {
                    kind: "base64",
                    media_type: &image.media_type,
                    data: &image.data,
                },
            })
            .collect();
        content.push(ContentBlock::Text {
            text: build_user_prompt(&request.job, &catalog),
        });

        Ok(MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content,
            }],
        })
    }
}

#[async_trait]
impl EstimationBackend for AnthropicClient {
    async fn generate(&self, request: &EstimateRequest) -> Result<String, UpstreamError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(UpstreamError::MissingApiKey)?;
        let url = format!("{}/v1/messages", self.config.base_url);
        let body = self.build_body(request)?;

        info!(
            url = %url,
            model = %self.config.model,
            images = request.images.len(),
            "requesting estimate"
        );
        let resp = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = resp.json().await?;
        let text = collect_text(parsed);
        info!(chars = text.len(), "estimate received");
        Ok(text)
    }
}

fn collect_text(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("")
}
