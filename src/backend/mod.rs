pub mod openai;
pub mod router;

pub use openai::OpenAI;
pub use router::{ProviderRouter, classify};

#[cfg(test)]
use mockall::automock;

use crate::models::ChatMessage;
use async_trait::async_trait;
use eyre::Result;
use std::sync::Arc;

/// A chat-completion endpoint.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait Backend {
    fn name(&self) -> &str;

    /// Sends `messages` to `model` and returns the text of the first choice.
    async fn chat_completion(&self, model: &str, messages: Vec<ChatMessage>) -> Result<String>;
}

pub type ArcBackend = Arc<dyn Backend + Send + Sync>;
