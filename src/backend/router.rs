#[cfg(test)]
#[path = "router_test.rs"]
mod tests;

use crate::backend::{ArcBackend, OpenAI};
use crate::config::ProviderConfig;
use crate::config::constants::GEMINI_MODELS;
use crate::error::{Error, Result};
use crate::models::{ChatMessage, ProviderKind};
use crate::prompt::GEMINI_SYSTEM_PROMPT;

/// Returns the Gemini profile when the lowercased model name contains any of
/// `gemini_models`, the OpenAI profile otherwise.
pub fn classify(model: &str, gemini_models: &[String]) -> ProviderKind {
    let model = model.to_lowercase();
    if gemini_models
        .iter()
        .any(|name| !name.is_empty() && model.contains(&name.to_lowercase()))
    {
        return ProviderKind::Gemini;
    }
    ProviderKind::OpenAI
}

/// Dispatches completions to one of the two provider profiles.
///
/// A profile without a credential has no backend; invoking it fails with
/// [`Error::MissingCredential`] at call time, never at construction.
pub struct ProviderRouter {
    gemini_models: Vec<String>,
    openai: Option<ArcBackend>,
    gemini: Option<ArcBackend>,
}

impl ProviderRouter {
    pub fn new(config: &ProviderConfig) -> Self {
        let connect = |alias: &str, endpoint: &str, api_key: Option<&str>| {
            api_key.map(|key| {
                let mut backend = OpenAI::default()
                    .with_alias(alias)
                    .with_endpoint(endpoint)
                    .with_api_key(key);
                if let Some(timeout) = config.timeout() {
                    backend = backend.with_timeout(timeout);
                }
                ArcBackend::from(backend)
            })
        };

        let openai = connect(
            &ProviderKind::OpenAI.to_string(),
            config.openai_endpoint(),
            config.openai.api_key(),
        );
        let gemini = connect(
            &ProviderKind::Gemini.to_string(),
            config.gemini_endpoint(),
            config.gemini.api_key(),
        );

        for (kind, backend) in [(ProviderKind::OpenAI, &openai), (ProviderKind::Gemini, &gemini)] {
            match backend {
                Some(backend) => log::debug!("{} profile served by {}", kind, backend.name()),
                None => log::warn!(
                    "{} profile has no API key, requests routed to it will fail",
                    kind
                ),
            }
        }

        Self {
            gemini_models: config.gemini_models.clone(),
            openai,
            gemini,
        }
    }

    pub fn with_backend(mut self, kind: ProviderKind, backend: ArcBackend) -> Self {
        match kind {
            ProviderKind::OpenAI => self.openai = Some(backend),
            ProviderKind::Gemini => self.gemini = Some(backend),
        }
        self
    }

    pub fn with_gemini_models(mut self, gemini_models: Vec<String>) -> Self {
        self.gemini_models = gemini_models;
        self
    }

    pub fn classify(&self, model: &str) -> ProviderKind {
        classify(model, &self.gemini_models)
    }

    /// Framing of a one-shot request: Gemini gets a fixed system message in
    /// front of the user content, OpenAI gets the user content alone.
    pub fn frame(kind: ProviderKind, content: &str) -> Vec<ChatMessage> {
        match kind {
            ProviderKind::Gemini => vec![
                ChatMessage::new_system(GEMINI_SYSTEM_PROMPT),
                ChatMessage::new_user(content),
            ],
            ProviderKind::OpenAI => vec![ChatMessage::new_user(content)],
        }
    }

    pub async fn complete(
        &self,
        kind: ProviderKind,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<String> {
        let backend = match kind {
            ProviderKind::OpenAI => self.openai.as_ref(),
            ProviderKind::Gemini => self.gemini.as_ref(),
        }
        .ok_or_else(|| Error::missing_credential(kind))?;

        log::debug!("Requesting completion from {} with model {}", kind, model);
        backend
            .chat_completion(model, messages)
            .await
            .map_err(|err| Error::Provider(format!("{:#}", err)))
    }
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self {
            gemini_models: GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
            openai: None,
            gemini: None,
        }
    }
}
