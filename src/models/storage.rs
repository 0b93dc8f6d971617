use std::{fmt::Display, str::FromStr};

use serde::Serialize;

use crate::error::Error;

/// Offset/limit window over a listing. `limit: None` means everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    skip: usize,
    limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct FilterBot {
    page: Page,
    user_id: Option<String>,
}

/// The tables exposed by the read-only admin views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Bots,
    Conversations,
    Messages,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableDump {
    pub table: Table,
    pub columns: Vec<String>,
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
    pub count: usize,
}

impl Page {
    pub fn new(skip: usize, limit: usize) -> Self {
        Self {
            skip,
            limit: Some(limit),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl FilterBot {
    pub fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Bots, Table::Conversations, Table::Messages];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Bots => "bots",
            Table::Conversations => "conversations",
            Table::Messages => "messages",
        }
    }
}

impl FromStr for Table {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::Validation("Invalid table name".to_string()))
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
