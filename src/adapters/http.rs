use crate::config::{FetchSettings, LlmSettings};
use crate::domain::model::LlmRequest;
use crate::domain::ports::{LlmBackend, PageLoader};
use crate::utils::error::{AgentError, BackendError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::{Html, Node};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg"];

fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    matches!(mime, "text/html" | "application/xhtml+xml")
}

/// Fetches a job listing and returns the visible text of the page.
pub struct HttpPageLoader {
    client: Client,
}

impl HttpPageLoader {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self { client })
    }

    fn visible_text(html: &str) -> String {
        let document = Html::parse_document(html);
        let mut parts = Vec::new();

        for node in document.root_element().descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(element) => SKIPPED_ELEMENTS.contains(&element.name()),
                _ => false,
            });
            let text = text.trim();
            if !hidden && !text.is_empty() {
                parts.push(text);
            }
        }

        parts.join("\n")
    }
}

#[async_trait]
impl PageLoader for HttpPageLoader {
    async fn load(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching job listing: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::fetch(url, "request timed out")
            } else {
                AgentError::fetch(url, e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::fetch(url, format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();
        if !is_html_content_type(&content_type) {
            return Err(AgentError::fetch(
                url,
                format!("expected an HTML page, got {}", content_type),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AgentError::fetch(url, format!("failed to read body: {}", e)))?;

        let text = Self::visible_text(&body);
        tracing::debug!("Fetched {} characters of page text", text.len());
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint (Groq by default).
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl ChatCompletionsClient {
    /// `api_key` may be `None`; requests then fail with `MissingApiKey`.
    pub fn new(settings: &LlmSettings, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key,
            api_key_env: settings.api_key_env.clone(),
        })
    }
}

#[async_trait]
impl LlmBackend for ChatCompletionsClient {
    async fn generate(&self, request: LlmRequest) -> std::result::Result<String, BackendError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| BackendError::MissingApiKey {
                var: self.api_key_env.clone(),
            })?;

        let body = ChatCompletionRequest {
            model: &request.model,
            temperature: request.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        tracing::debug!("POST {} (model {})", self.endpoint, request.model);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("LLM backend error {}: {}", status, error_text);
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(BackendError::EmptyResponse)
    }

    fn name(&self) -> &str {
        &self.endpoint
    }
}
