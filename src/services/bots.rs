#[cfg(test)]
#[path = "bots_test.rs"]
mod tests;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::ProviderRouter;
use crate::error::{Error, Resource, Result};
use crate::models::{Bot, BotParams, BotPatch, FilterBot};
use crate::prompt::build_prompt_for;
use crate::storage::ArcStorage;

/// Result of a generation request. `bot_id` is set when the persona was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generated {
    pub reply: String,
    pub bot_id: Option<i64>,
}

pub struct BotService {
    storage: ArcStorage,
    router: Arc<ProviderRouter>,
}

impl BotService {
    pub fn new(storage: ArcStorage, router: Arc<ProviderRouter>) -> Self {
        Self { storage, router }
    }

    /// Asks the model for a persona prompt and, when `save` is set, stores a
    /// new bot whose prompt is exactly the reply.
    pub async fn generate(&self, params: &BotParams, save: bool) -> Result<Generated> {
        params.validate()?;
        log::debug!("Generating persona: {:?}", params);

        let reply = self.author_prompt(params).await?;

        let bot_id = if save {
            let bot = self.storage.create_bot(params, &reply).await?;
            log::info!("Created bot {} ({})", bot.id, bot.params.name);
            Some(bot.id)
        } else {
            None
        };

        Ok(Generated { reply, bot_id })
    }

    pub async fn get(&self, id: i64) -> Result<Bot> {
        self.storage
            .get_bot(id)
            .await?
            .ok_or(Error::NotFound(Resource::Bot))
    }

    pub async fn list(&self, filter: FilterBot) -> Result<Vec<Bot>> {
        Ok(self.storage.list_bots(filter).await?)
    }

    /// Applies `patch` and regenerates the prompt from the merged parameters.
    pub async fn update(&self, id: i64, patch: &BotPatch) -> Result<Bot> {
        let current = self.get(id).await?;
        let params = current.params.merge(patch);
        params.validate()?;

        let prompt = self.author_prompt(&params).await?;

        let bot = self
            .storage
            .update_bot(id, patch, &prompt)
            .await?
            .ok_or(Error::NotFound(Resource::Bot))?;
        log::info!("Regenerated prompt of bot {}", id);
        Ok(bot)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.storage.delete_bot(id).await? {
            return Err(Error::NotFound(Resource::Bot));
        }
        log::info!("Deleted bot {}", id);
        Ok(())
    }

    /// The persona prompt for `params`. An empty reply is a provider failure,
    /// so nothing is ever stored without a prompt.
    async fn author_prompt(&self, params: &BotParams) -> Result<String> {
        let kind = self.router.classify(&params.model);
        let messages = ProviderRouter::frame(kind, &build_prompt_for(params));
        let prompt = self.router.complete(kind, &params.model, messages).await?;
        if prompt.trim().is_empty() {
            return Err(Error::Provider(format!("{} returned an empty prompt", params.model)));
        }
        Ok(prompt)
    }
}
