pub mod sqlite;

use std::sync::Arc;

use crate::{
    config::StorageConfig,
    models::{
        Bot, BotParams, BotPatch, Conversation, FilterBot, Message, NewConversation, NewMessage,
        Page, Table, TableDump,
    },
};
use async_trait::async_trait;
use eyre::Result;
use sqlite::Sqlite;

/// Persistence for bots, their conversations and the messages within them.
///
/// Each call is its own unit of work. Lookups return `None` and deletes
/// return `false` when the row does not exist.
#[async_trait]
pub trait Storage {
    async fn create_bot(&self, params: &BotParams, prompt: &str) -> Result<Bot>;
    async fn get_bot(&self, id: i64) -> Result<Option<Bot>>;
    /// Newest first.
    async fn list_bots(&self, filter: FilterBot) -> Result<Vec<Bot>>;
    /// Writes the fields set in `patch` together with the new prompt.
    async fn update_bot(&self, id: i64, patch: &BotPatch, prompt: &str) -> Result<Option<Bot>>;
    /// Removes the bot and, transitively, its conversations and messages.
    async fn delete_bot(&self, id: i64) -> Result<bool>;

    async fn create_conversation(&self, conversation: &NewConversation) -> Result<Conversation>;
    /// The conversation with its messages in chronological order.
    async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>>;
    /// The id of the bot owning the conversation, without loading messages.
    async fn conversation_owner(&self, id: i64) -> Result<Option<i64>>;
    /// Newest first, each with its messages.
    async fn list_conversations(&self, bot_id: i64, page: Page) -> Result<Vec<Conversation>>;
    async fn delete_conversation(&self, id: i64) -> Result<bool>;

    async fn add_message(&self, conversation_id: i64, message: &NewMessage) -> Result<Message>;
    /// Oldest first, ties broken by id.
    async fn get_messages(&self, conversation_id: i64, page: Page) -> Result<Vec<Message>>;

    async fn dump_table(&self, table: Table, limit: usize) -> Result<TableDump>;
}

pub type ArcStorage = Arc<dyn Storage + Send + Sync>;

pub async fn new_storage(config: &StorageConfig) -> Result<ArcStorage> {
    let storage: ArcStorage = match config {
        StorageConfig::Sqlite(sqlite_config) => Arc::new(Sqlite::new(sqlite_config.path()).await?),
    };
    Ok(storage)
}
