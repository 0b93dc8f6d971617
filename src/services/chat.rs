#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::ProviderRouter;
use crate::error::{Error, Resource, Result};
use crate::models::{Bot, ChatMessage, Conversation, NewConversation, NewMessage, Page};
use crate::prompt::{chat_system_prompt, chat_user_prompt, conversation_title, render_transcript};
use crate::storage::ArcStorage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub bot_id: i64,
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<i64>,
    #[serde(default)]
    pub user_identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub conversation_id: i64,
}

/// Runs chat turns and manages the conversations they live in.
pub struct ChatService {
    storage: ArcStorage,
    router: Arc<ProviderRouter>,
}

impl ChatService {
    pub fn new(storage: ArcStorage, router: Arc<ProviderRouter>) -> Self {
        Self { storage, router }
    }

    /// One chat turn. The user message is stored before the model is called
    /// and stays stored if the call fails.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
        let bot = self.bot(request.bot_id).await?;

        let conversation_id = match request.conversation_id {
            Some(id) => {
                let owner = self
                    .storage
                    .conversation_owner(id)
                    .await?
                    .ok_or(Error::NotFound(Resource::Conversation))?;
                if owner != bot.id {
                    return Err(Error::OwnershipMismatch {
                        conversation_id: id,
                        bot_id: bot.id,
                    });
                }
                id
            }
            None => {
                let conversation = self
                    .storage
                    .create_conversation(
                        &NewConversation::new(bot.id)
                            .with_user_identifier(request.user_identifier.clone())
                            .with_title(conversation_title(&request.message)),
                    )
                    .await?;
                log::debug!("Started conversation {} with bot {}", conversation.id, bot.id);
                conversation.id
            }
        };

        self.storage
            .add_message(conversation_id, &NewMessage::new_user(&request.message))
            .await?;

        let history = self
            .storage
            .get_messages(conversation_id, Page::all())
            .await?;
        let transcript = render_transcript(&history);

        let kind = self.router.classify(bot.model());
        let messages = vec![
            ChatMessage::new_system(chat_system_prompt(&bot.prompt)),
            ChatMessage::new_user(chat_user_prompt(&transcript)),
        ];

        let reply = match self.router.complete(kind, bot.model(), messages).await {
            Ok(reply) => reply,
            Err(Error::Provider(msg)) => {
                return Err(Error::Provider(format!("Error generating response: {}", msg)));
            }
            Err(err) => return Err(err),
        };

        self.storage
            .add_message(conversation_id, &NewMessage::new_bot(&reply))
            .await?;

        Ok(ChatReply {
            reply,
            conversation_id,
        })
    }

    pub async fn create_conversation(
        &self,
        conversation: &NewConversation,
    ) -> Result<Conversation> {
        self.bot(conversation.bot_id).await?;
        Ok(self.storage.create_conversation(conversation).await?)
    }

    pub async fn get_conversation(&self, id: i64) -> Result<Conversation> {
        self.storage
            .get_conversation(id)
            .await?
            .ok_or(Error::NotFound(Resource::Conversation))
    }

    pub async fn list_conversations(&self, bot_id: i64, page: Page) -> Result<Vec<Conversation>> {
        self.bot(bot_id).await?;
        Ok(self.storage.list_conversations(bot_id, page).await?)
    }

    pub async fn delete_conversation(&self, id: i64) -> Result<()> {
        if !self.storage.delete_conversation(id).await? {
            return Err(Error::NotFound(Resource::Conversation));
        }
        Ok(())
    }

    async fn bot(&self, id: i64) -> Result<Bot> {
        self.storage
            .get_bot(id)
            .await?
            .ok_or(Error::NotFound(Resource::Bot))
    }
}
