use super::constants::*;

pub(crate) fn listen_addr() -> String {
    LISTEN_ADDR.to_string()
}

pub(crate) fn cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

pub(crate) fn log_level() -> Option<String> {
    Some(LOG_LEVEL.to_string())
}

pub(crate) fn gemini_models() -> Vec<String> {
    GEMINI_MODELS.iter().map(|m| m.to_string()).collect()
}
