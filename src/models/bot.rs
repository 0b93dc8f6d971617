#[cfg(test)]
#[path = "bot_test.rs"]
mod tests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::constants::DEFAULT_MODEL;
use crate::error::{Error, Result};

const NAME_LENGTH: std::ops::RangeInclusive<usize> = 2..=100;

/// A persona definition. `prompt` is always the reply of a generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    pub id: i64,
    #[serde(flatten)]
    pub params: BotParams,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The pedagogical parameters a persona is generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotParams {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub object: String,
    pub activity: String,
    pub format: String,
    pub responsestyle: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Partial update of a bot; only the fields that are set are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub responsestyle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl BotParams {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            goal: String::new(),
            object: String::new(),
            activity: String::new(),
            format: String::new(),
            responsestyle: String::new(),
            description: None,
            model: default_model(),
            user_id: None,
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = object.into();
        self
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = activity.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_responsestyle(mut self, responsestyle: impl Into<String>) -> Self {
        self.responsestyle = responsestyle.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_length("name", &self.name)?;
        check_length("role", &self.role)?;
        if self.model.trim().is_empty() {
            return Err(Error::Validation("model must not be empty".to_string()));
        }
        Ok(())
    }

    /// Returns a copy with every field set in `patch` overwritten.
    pub fn merge(&self, patch: &BotPatch) -> BotParams {
        let pick = |value: &Option<String>, current: &String| {
            value.clone().unwrap_or_else(|| current.clone())
        };
        BotParams {
            name: pick(&patch.name, &self.name),
            role: pick(&patch.role, &self.role),
            goal: pick(&patch.goal, &self.goal),
            object: pick(&patch.object, &self.object),
            activity: pick(&patch.activity, &self.activity),
            format: pick(&patch.format, &self.format),
            responsestyle: pick(&patch.responsestyle, &self.responsestyle),
            description: patch.description.clone().or_else(|| self.description.clone()),
            model: pick(&patch.model, &self.model),
            user_id: patch.user_id.clone().or_else(|| self.user_id.clone()),
        }
    }
}

impl From<BotParams> for BotPatch {
    fn from(params: BotParams) -> Self {
        Self {
            name: Some(params.name),
            role: Some(params.role),
            goal: Some(params.goal),
            object: Some(params.object),
            activity: Some(params.activity),
            format: Some(params.format),
            responsestyle: Some(params.responsestyle),
            description: params.description,
            model: Some(params.model),
            user_id: params.user_id,
        }
    }
}

impl Bot {
    pub fn model(&self) -> &str {
        &self.params.model
    }
}

fn check_length(field: &str, value: &str) -> Result<()> {
    let len = value.chars().count();
    if !NAME_LENGTH.contains(&len) {
        return Err(Error::Validation(format!(
            "{} must be between {} and {} characters",
            field,
            NAME_LENGTH.start(),
            NAME_LENGTH.end()
        )));
    }
    Ok(())
}
