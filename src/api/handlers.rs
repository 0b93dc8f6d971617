use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Html,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::AppState;
use crate::config::constants::{DEFAULT_BOT_LIMIT, DEFAULT_CONVERSATION_LIMIT, DEFAULT_TABLE_LIMIT};
use crate::error::Result;
use crate::models::{
    Bot, BotParams, BotPatch, Conversation, FilterBot, NewConversation, Page, Table, TableDump,
};
use crate::services::{ChatReply, ChatRequest, Generated};

const INDEX_HTML: &str = "<html><body><h1>AI Teaching Assistant Generator</h1><p>POST /generate to create a bot, POST /chat to talk to it.</p></body></html>";

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    #[serde(default = "default_save")]
    pub save_to_db: bool,
}

#[derive(Debug, Deserialize)]
pub struct BotListQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_bot_limit")]
    pub limit: usize,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationListQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_conversation_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct TableQuery {
    #[serde(default = "default_table_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Deleted {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TableList {
    pub tables: Vec<String>,
}

fn default_save() -> bool {
    true
}

fn default_bot_limit() -> usize {
    DEFAULT_BOT_LIMIT
}

fn default_conversation_limit() -> usize {
    DEFAULT_CONVERSATION_LIMIT
}

fn default_table_limit() -> usize {
    DEFAULT_TABLE_LIMIT
}

impl Deleted {
    fn new(what: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: format!("{} deleted", what),
        }
    }
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// POST /generate
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GenerateQuery>,
    Json(params): Json<BotParams>,
) -> Result<Json<Generated>> {
    let generated = state.bots.generate(&params, query.save_to_db).await?;
    Ok(Json(generated))
}

/// GET /bots
pub async fn list_bots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BotListQuery>,
) -> Result<Json<Vec<Bot>>> {
    let mut filter = FilterBot::default().with_page(Page::new(query.skip, query.limit));
    if let Some(user_id) = query.user_id.filter(|u| !u.is_empty()) {
        filter = filter.with_user_id(user_id);
    }
    Ok(Json(state.bots.list(filter).await?))
}

pub async fn get_bot(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Result<Json<Bot>> {
    Ok(Json(state.bots.get(id).await?))
}

pub async fn update_bot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<BotPatch>,
) -> Result<Json<Bot>> {
    Ok(Json(state.bots.update(id, &patch).await?))
}

pub async fn delete_bot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>> {
    state.bots.delete(id).await?;
    Ok(Json(Deleted::new("Bot")))
}

/// POST /chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>> {
    Ok(Json(state.chat.chat(request).await?))
}

pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    Json(conversation): Json<NewConversation>,
) -> Result<Json<Conversation>> {
    Ok(Json(state.chat.create_conversation(&conversation).await?))
}

pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Conversation>> {
    Ok(Json(state.chat.get_conversation(id).await?))
}

pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Path(bot_id): Path<i64>,
    Query(query): Query<ConversationListQuery>,
) -> Result<Json<Vec<Conversation>>> {
    let page = Page::new(query.skip, query.limit);
    Ok(Json(state.chat.list_conversations(bot_id, page).await?))
}

pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Deleted>> {
    state.chat.delete_conversation(id).await?;
    Ok(Json(Deleted::new("Conversation")))
}

/// GET /admin/tables
pub async fn list_tables() -> Json<TableList> {
    Json(TableList {
        tables: Table::ALL.iter().map(|t| t.name().to_string()).collect(),
    })
}

/// GET /admin/tables/{table}. Only the enumerated tables can be read.
pub async fn view_table(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(query): Query<TableQuery>,
) -> Result<Json<TableDump>> {
    let table = table.parse::<Table>()?;
    Ok(Json(state.storage.dump_table(table, query.limit).await?))
}
