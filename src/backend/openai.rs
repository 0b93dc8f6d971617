#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use crate::backend::{ArcBackend, Backend};
use crate::config::user_agent;
use crate::models::ChatMessage;
use async_trait::async_trait;
use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::{fmt::Display, time};
use thiserror::Error;

/// Client for an OpenAI-compatible `/chat/completions` endpoint. Gemini is
/// reached through the same client pointed at its compatibility endpoint.
pub struct OpenAI {
    alias: String,
    endpoint: String,
    api_key: Option<String>,
    timeout: Option<time::Duration>,
}

#[async_trait]
impl Backend for OpenAI {
    fn name(&self) -> &str {
        &self.alias
    }

    async fn chat_completion(&self, model: &str, messages: Vec<ChatMessage>) -> Result<String> {
        if model.is_empty() {
            bail!("no model is set");
        }

        let completion_req = CompletionRequest {
            model: model.to_string(),
            messages: messages.iter().map(MessageRequest::from).collect(),
        };

        let mut req = reqwest::Client::new()
            .post(format!(
                "{}/chat/completions",
                self.endpoint.trim_end_matches('/')
            ))
            .header("Content-Type", "application/json")
            .header("User-Agent", user_agent());

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        if let Some(token) = &self.api_key {
            req = req.bearer_auth(token);
        }

        log::trace!("Sending completion request: {:?}", completion_req);

        let res = req
            .json(&completion_req)
            .send()
            .await
            .wrap_err("sending completion request")?;

        if !res.status().is_success() {
            let http_code = res.status().as_u16();
            let resp = res.text().await.wrap_err("reading error response")?;
            log::error!("{} error response: {}", self.alias, resp);
            let mut err = parse_error(&resp).unwrap_or_else(|| OpenAIError {
                message: resp,
                ..Default::default()
            });
            err.http_code = http_code;
            err.provider = self.alias.clone();
            return Err(err.into());
        }

        let resp = res.text().await.wrap_err("reading completion response")?;
        let data = serde_json::from_str::<CompletionResponse>(&resp)
            .wrap_err(format!("parsing completion response: {}", resp))?;

        if let Some(usage) = &data.usage {
            log::debug!(
                "{} usage for {}: prompt {} completion {} total {}",
                self.alias,
                model,
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        let choice = match data.choices.into_iter().next() {
            Some(choice) => choice,
            None => bail!("completion response has no choices"),
        };

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => bail!(
                "completion response has no content (finish reason: {})",
                choice.finish_reason.as_deref().unwrap_or("unknown")
            ),
        }
    }
}

impl From<OpenAI> for ArcBackend {
    fn from(value: OpenAI) -> Self {
        Arc::new(value)
    }
}

impl OpenAI {
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = alias.to_string();
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for OpenAI {
    fn default() -> Self {
        Self {
            alias: "OpenAI".to_string(),
            endpoint: crate::config::constants::OPENAI_ENDPOINT.to_string(),
            api_key: None,
            timeout: None,
        }
    }
}

/// Error bodies come back either as an object or, from the Gemini
/// compatibility layer, as a one-element list.
fn parse_error(body: &str) -> Option<OpenAIError> {
    if let Ok(resp) = serde_json::from_str::<ErrorResponse>(body) {
        return Some(resp.error);
    }
    serde_json::from_str::<Vec<ErrorResponse>>(body)
        .ok()?
        .into_iter()
        .next()
        .map(|resp| resp.error)
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<MessageRequest>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionMessageResponse {
    content: Option<String>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    message: CompletionMessageResponse,
    finish_reason: Option<String>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoiceResponse>,
    usage: Option<CompletionUsageResponse>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct CompletionUsageResponse {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: OpenAIError,
}

#[derive(Default, Error, Debug, Serialize, Deserialize)]
pub struct OpenAIError {
    #[serde(skip)]
    pub http_code: u16,
    #[serde(skip)]
    pub provider: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub err_type: Option<String>,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

impl Display for OpenAIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error ({}): {}", self.provider, self.http_code, self.message)
    }
}

impl From<&ChatMessage> for MessageRequest {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }
}
