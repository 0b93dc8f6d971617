use std::fmt::Display;

use thiserror::Error;

use crate::models::ProviderKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Bot,
    Conversation,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{0}_API_KEY not found in environment variables")]
    MissingCredential(CredentialName),

    #[error("{0} not found")]
    NotFound(Resource),

    #[error("Conversation does not belong to this bot")]
    OwnershipMismatch { conversation_id: i64, bot_id: i64 },

    #[error("{0}")]
    Provider(String),

    #[error("storage: {0:#}")]
    Storage(eyre::Report),
}

/// Environment-style name of a provider credential, e.g. `GEMINI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialName(pub ProviderKind);

impl Error {
    pub fn missing_credential(kind: ProviderKind) -> Self {
        Error::MissingCredential(CredentialName(kind))
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::MissingCredential(_)
                | Error::NotFound(_)
                | Error::OwnershipMismatch { .. }
        )
    }
}

impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Storage(err)
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Bot => write!(f, "Bot"),
            Resource::Conversation => write!(f, "Conversation"),
        }
    }
}

impl Display for CredentialName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            ProviderKind::OpenAI => write!(f, "OPENAI"),
            ProviderKind::Gemini => write!(f, "GEMINI"),
        }
    }
}
