pub mod bots;
pub mod chat;

pub use bots::{BotService, Generated};
pub use chat::{ChatReply, ChatRequest, ChatService};
