pub mod backend;
pub mod bot;
pub mod conversation;
pub mod message;
pub mod storage;

pub use backend::*;
pub use bot::{Bot, BotParams, BotPatch};
pub use conversation::{Conversation, NewConversation};
pub use message::{Message, NewMessage};
pub use storage::{FilterBot, Page, Table, TableDump};
