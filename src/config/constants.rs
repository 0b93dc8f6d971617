/// Model used when a generation request does not name one
pub const DEFAULT_MODEL: &str = "gpt-4o";

pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// Gemini served through its OpenAI compatibility layer
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Model name fragments that route a request to the Gemini profile
pub const GEMINI_MODELS: &[&str] = &[
    "gemini-pro",
    "gemini-1.0-pro",
    "gemini-1.5-pro",
    "gemini-2.0-flash",
];

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const LISTEN_ADDR: &str = "0.0.0.0:5000";

pub const LOG_LEVEL: &str = "info";

pub const MAX_TITLE_CHARS: usize = 50;

pub const DEFAULT_BOT_LIMIT: usize = 100;

pub const DEFAULT_CONVERSATION_LIMIT: usize = 20;

pub const DEFAULT_TABLE_LIMIT: usize = 100;
