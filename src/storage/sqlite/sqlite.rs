#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde_json::{Map, Value};
use tokio_rusqlite::{Connection, OpenFlags, Row, ToSql, named_params, params, types::ValueRef};

use crate::models::{
    Bot, BotParams, BotPatch, Conversation, FilterBot, Message, NewConversation, NewMessage, Page,
    Table, TableDump,
};
use crate::storage::Storage;

use super::migration::MIGRATION;

type CallResult<T> = std::result::Result<T, tokio_rusqlite::Error>;

type QueryParams = Vec<(&'static str, Box<dyn ToSql>)>;

const BOT_COLUMNS: &str = "id, name, role, goal, object, activity, format, responsestyle, description, model, prompt, user_id, created_at, updated_at";

const CONVERSATION_COLUMNS: &str = "id, bot_id, user_identifier, title, created_at";

const MESSAGE_COLUMNS: &str = "id, conversation_id, content, is_bot, created_at";

pub struct Sqlite {
    conn: Connection,
}

impl Sqlite {
    /// Opens (or creates) the database at `path`, in memory when `None`,
    /// and brings the schema up to date.
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(path) => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
            )
            .await
            .wrap_err(format!("opening database path: {}", path))?,
            None => Connection::open_in_memory()
                .await
                .wrap_err("opening in-memory database")?,
        };

        let ret = Self { conn };
        ret.run_migration().await.wrap_err("running migration")?;
        Ok(ret)
    }

    async fn run_migration(&self) -> Result<()> {
        self.conn
            .call(|conn| Ok(conn.execute_batch(MIGRATION)?))
            .await
            .wrap_err("executing migration")?;
        Ok(())
    }
}

#[async_trait]
impl Storage for Sqlite {
    async fn create_bot(&self, params: &BotParams, prompt: &str) -> Result<Bot> {
        let params = params.clone();
        let prompt = prompt.to_string();
        let bot = self
            .conn
            .call(move |conn| {
                let now = Utc::now().timestamp_millis();
                conn.execute(
                    r#"INSERT INTO bots (name, role, goal, object, activity, format, responsestyle, description, model, prompt, user_id, created_at)
                VALUES (:name, :role, :goal, :object, :activity, :format, :responsestyle, :description, :model, :prompt, :user_id, :created_at)
                "#,
                    named_params! {
                        ":name": params.name,
                        ":role": params.role,
                        ":goal": params.goal,
                        ":object": params.object,
                        ":activity": params.activity,
                        ":format": params.format,
                        ":responsestyle": params.responsestyle,
                        ":description": params.description,
                        ":model": params.model,
                        ":prompt": prompt,
                        ":user_id": params.user_id,
                        ":created_at": now,
                    },
                )?;

                Ok(Bot {
                    id: conn.last_insert_rowid(),
                    params,
                    prompt,
                    created_at: timestamp(now)?,
                    updated_at: None,
                })
            })
            .await
            .wrap_err("inserting bot")?;
        Ok(bot)
    }

    async fn get_bot(&self, id: i64) -> Result<Option<Bot>> {
        let bot = self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {} FROM bots WHERE id = ?", BOT_COLUMNS))?;
                let mut rows = stmt.query(params![id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(bot_from_row(row)?)),
                    None => Ok(None),
                }
            })
            .await
            .wrap_err(format!("getting bot {}", id))?;
        Ok(bot)
    }

    async fn list_bots(&self, filter: FilterBot) -> Result<Vec<Bot>> {
        let bots = self
            .conn
            .call(move |conn| {
                let (query, params) = filter_to_query(&filter);
                let mut stmt = conn.prepare(&query)?;
                let params: Vec<(&str, &dyn ToSql)> =
                    params.iter().map(|(n, v)| (*n, v.as_ref())).collect();
                let mut rows = stmt.query(params.as_slice())?;

                let mut bots = vec![];
                while let Some(row) = rows.next()? {
                    bots.push(bot_from_row(row)?);
                }
                Ok(bots)
            })
            .await
            .wrap_err("listing bots")?;
        Ok(bots)
    }

    async fn update_bot(&self, id: i64, patch: &BotPatch, prompt: &str) -> Result<Option<Bot>> {
        let patch = patch.clone();
        let prompt = prompt.to_string();
        let updated = self
            .conn
            .call(move |conn| {
                let (query, params) = patch_to_query(&patch, prompt, id);
                let params: Vec<(&str, &dyn ToSql)> =
                    params.iter().map(|(n, v)| (*n, v.as_ref())).collect();

                let tx = conn.transaction()?;
                let affected_rows = tx.execute(&query, params.as_slice())?;
                tx.commit()?;
                Ok(affected_rows > 0)
            })
            .await
            .wrap_err(format!("updating bot {}", id))?;

        if !updated {
            return Ok(None);
        }
        self.get_bot(id).await
    }

    async fn delete_bot(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let affected_rows = tx.execute("DELETE FROM bots WHERE id = ?", params![id])?;
                tx.commit()?;
                Ok(affected_rows > 0)
            })
            .await
            .wrap_err(format!("deleting bot {}", id))?;
        Ok(deleted)
    }

    async fn create_conversation(&self, conversation: &NewConversation) -> Result<Conversation> {
        let conversation = conversation.clone();
        let created = self
            .conn
            .call(move |conn| {
                let now = Utc::now().timestamp_millis();
                conn.execute(
                    r#"INSERT INTO conversations (bot_id, user_identifier, title, created_at)
                VALUES (:bot_id, :user_identifier, :title, :created_at)
                "#,
                    named_params! {
                        ":bot_id": conversation.bot_id,
                        ":user_identifier": conversation.user_identifier,
                        ":title": conversation.title,
                        ":created_at": now,
                    },
                )?;

                Ok(Conversation {
                    id: conn.last_insert_rowid(),
                    bot_id: conversation.bot_id,
                    user_identifier: conversation.user_identifier,
                    title: conversation.title,
                    created_at: timestamp(now)?,
                    messages: vec![],
                })
            })
            .await
            .wrap_err("inserting conversation")?;
        Ok(created)
    }

    async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>> {
        let conversation = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM conversations WHERE id = ?",
                    CONVERSATION_COLUMNS
                ))?;
                let mut rows = stmt.query(params![id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(conversation_from_row(row)?)),
                    None => Ok(None),
                }
            })
            .await
            .wrap_err(format!("getting conversation {}", id))?;

        let conversation = match conversation {
            Some(conversation) => conversation,
            None => return Ok(None),
        };
        let messages = self.get_messages(conversation.id, Page::all()).await?;
        Ok(Some(conversation.with_messages(messages)))
    }

    async fn conversation_owner(&self, id: i64) -> Result<Option<i64>> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT bot_id FROM conversations WHERE id = ?")?;
                let mut rows = stmt.query(params![id])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get(0)?)),
                    None => Ok(None),
                }
            })
            .await
            .wrap_err(format!("getting owner of conversation {}", id))
    }

    async fn list_conversations(&self, bot_id: i64, page: Page) -> Result<Vec<Conversation>> {
        let conversations = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"SELECT {} FROM conversations WHERE bot_id = :bot_id
                ORDER BY created_at DESC, id DESC LIMIT :limit OFFSET :skip"#,
                    CONVERSATION_COLUMNS
                ))?;
                let mut rows = stmt.query(named_params! {
                    ":bot_id": bot_id,
                    ":limit": sql_limit(&page),
                    ":skip": page.skip() as i64,
                })?;

                let mut conversations = vec![];
                while let Some(row) = rows.next()? {
                    conversations.push(conversation_from_row(row)?);
                }
                Ok(conversations)
            })
            .await
            .wrap_err(format!("listing conversations of bot {}", bot_id))?;

        let mut ret = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let messages = self.get_messages(conversation.id, Page::all()).await?;
            ret.push(conversation.with_messages(messages));
        }
        Ok(ret)
    }

    async fn delete_conversation(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let affected_rows =
                    tx.execute("DELETE FROM conversations WHERE id = ?", params![id])?;
                tx.commit()?;
                Ok(affected_rows > 0)
            })
            .await
            .wrap_err(format!("deleting conversation {}", id))?;
        Ok(deleted)
    }

    async fn add_message(&self, conversation_id: i64, message: &NewMessage) -> Result<Message> {
        let message = message.clone();
        let created = self
            .conn
            .call(move |conn| {
                let now = Utc::now().timestamp_millis();
                conn.execute(
                    r#"INSERT INTO messages (conversation_id, content, is_bot, created_at)
                VALUES (:conversation_id, :content, :is_bot, :created_at)
                "#,
                    named_params! {
                        ":conversation_id": conversation_id,
                        ":content": message.content,
                        ":is_bot": message.is_bot as i32,
                        ":created_at": now,
                    },
                )?;

                Ok(Message {
                    id: conn.last_insert_rowid(),
                    conversation_id,
                    content: message.content,
                    is_bot: message.is_bot,
                    created_at: timestamp(now)?,
                })
            })
            .await
            .wrap_err(format!("adding message to conversation {}", conversation_id))?;
        Ok(created)
    }

    async fn get_messages(&self, conversation_id: i64, page: Page) -> Result<Vec<Message>> {
        let messages = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"SELECT {} FROM messages WHERE conversation_id = :conversation_id
                ORDER BY created_at ASC, id ASC LIMIT :limit OFFSET :skip"#,
                    MESSAGE_COLUMNS
                ))?;
                let mut rows = stmt.query(named_params! {
                    ":conversation_id": conversation_id,
                    ":limit": sql_limit(&page),
                    ":skip": page.skip() as i64,
                })?;

                let mut messages = vec![];
                while let Some(row) = rows.next()? {
                    messages.push(message_from_row(row)?);
                }
                Ok(messages)
            })
            .await
            .wrap_err(format!("getting messages of conversation {}", conversation_id))?;
        Ok(messages)
    }

    async fn dump_table(&self, table: Table, limit: usize) -> Result<TableDump> {
        let dump = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(dump_query(table))?;
                let columns = stmt
                    .column_names()
                    .into_iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>();

                let mut rows = stmt.query(params![limit as i64])?;
                let mut data = vec![];
                while let Some(row) = rows.next()? {
                    let mut item = Map::new();
                    for (i, column) in columns.iter().enumerate() {
                        item.insert(column.clone(), json_value(column, row.get_ref(i)?));
                    }
                    data.push(item);
                }

                let count = data.len();
                Ok(TableDump {
                    table,
                    columns,
                    data,
                    count,
                })
            })
            .await
            .wrap_err(format!("dumping table {}", table))?;
        Ok(dump)
    }
}

fn bot_from_row(row: &Row) -> CallResult<Bot> {
    let updated_at: Option<i64> = row.get(13)?;
    let updated_at = match updated_at {
        Some(millis) => Some(timestamp(millis)?),
        None => None,
    };

    Ok(Bot {
        id: row.get(0)?,
        params: BotParams {
            name: row.get(1)?,
            role: row.get(2)?,
            goal: row.get(3)?,
            object: row.get(4)?,
            activity: row.get(5)?,
            format: row.get(6)?,
            responsestyle: row.get(7)?,
            description: row.get(8)?,
            model: row.get(9)?,
            user_id: row.get(11)?,
        },
        prompt: row.get(10)?,
        created_at: timestamp(row.get(12)?)?,
        updated_at,
    })
}

fn conversation_from_row(row: &Row) -> CallResult<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        bot_id: row.get(1)?,
        user_identifier: row.get(2)?,
        title: row.get(3)?,
        created_at: timestamp(row.get(4)?)?,
        messages: vec![],
    })
}

fn message_from_row(row: &Row) -> CallResult<Message> {
    let is_bot: i32 = row.get(3)?;
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        content: row.get(2)?,
        is_bot: is_bot != 0,
        created_at: timestamp(row.get(4)?)?,
    })
}

fn timestamp(millis: i64) -> CallResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or(tokio_rusqlite::Error::Other(
        eyre::eyre!("invalid timestamp: {}", millis).into(),
    ))
}

/// SQLite treats a negative LIMIT as no limit.
fn sql_limit(page: &Page) -> i64 {
    page.limit().map(|l| l as i64).unwrap_or(-1)
}

fn filter_to_query(filter: &FilterBot) -> (String, QueryParams) {
    let mut query = format!("SELECT {} FROM bots WHERE 1=1", BOT_COLUMNS);
    let mut params: QueryParams = vec![];

    if let Some(user_id) = filter.user_id() {
        query.push_str(" AND user_id = :user_id");
        params.push((":user_id", Box::new(user_id.to_string())));
    }

    let page = filter.page();
    query.push_str(" ORDER BY created_at DESC, id DESC LIMIT :limit OFFSET :skip");
    params.push((":limit", Box::new(sql_limit(&page))));
    params.push((":skip", Box::new(page.skip() as i64)));

    (query, params)
}

fn patch_to_query(patch: &BotPatch, prompt: String, id: i64) -> (String, QueryParams) {
    let mut query = String::from("UPDATE bots SET prompt = :prompt, updated_at = :updated_at");
    let mut params: QueryParams = vec![
        (":prompt", Box::new(prompt)),
        (":updated_at", Box::new(Utc::now().timestamp_millis())),
    ];

    let fields: [(&'static str, &'static str, &Option<String>); 10] = [
        ("name", ":name", &patch.name),
        ("role", ":role", &patch.role),
        ("goal", ":goal", &patch.goal),
        ("object", ":object", &patch.object),
        ("activity", ":activity", &patch.activity),
        ("format", ":format", &patch.format),
        ("responsestyle", ":responsestyle", &patch.responsestyle),
        ("description", ":description", &patch.description),
        ("model", ":model", &patch.model),
        ("user_id", ":user_id", &patch.user_id),
    ];
    for (column, name, value) in fields {
        if let Some(value) = value {
            query.push_str(&format!(", {} = {}", column, name));
            params.push((name, Box::new(value.clone())));
        }
    }

    query.push_str(" WHERE id = :id");
    params.push((":id", Box::new(id)));

    (query, params)
}

fn dump_query(table: Table) -> &'static str {
    match table {
        Table::Bots => "SELECT * FROM bots ORDER BY id LIMIT ?",
        Table::Conversations => "SELECT * FROM conversations ORDER BY id LIMIT ?",
        Table::Messages => "SELECT * FROM messages ORDER BY id LIMIT ?",
    }
}

/// Timestamp columns are rendered as RFC 3339 strings, everything else as is.
fn json_value(column: &str, value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) if column.ends_with("_at") => DateTime::from_timestamp_millis(v)
            .map(|t| Value::String(t.to_rfc3339()))
            .unwrap_or(Value::from(v)),
        ValueRef::Integer(v) => Value::from(v),
        ValueRef::Real(v) => Value::from(v),
        ValueRef::Text(v) | ValueRef::Blob(v) => {
            Value::String(String::from_utf8_lossy(v).into_owned())
        }
    }
}
