use std::collections::HashMap;

use crate::config::{
    StorageConfig,
    constants::{GEMINI_ENDPOINT, LISTEN_ADDR, OPENAI_ENDPOINT},
};

use super::*;

#[test]
fn test_load_configuration() {
    let config = load_configuration("./testdata/config.toml").expect("failed to load config");

    assert_eq!(config.server.listen, "127.0.0.1:8080");
    assert_eq!(
        config.server.cors_origins,
        vec!["https://school.example.com", "http://localhost:3000"]
    );

    let log = &config.log;
    assert_eq!(log.level.as_deref(), Some("info"));
    let log_filters = log.filters.as_deref().unwrap_or_default();
    assert_eq!(log_filters.len(), 1);
    assert_eq!(log_filters[0].module.as_deref(), Some("teachbot::backend"));
    assert_eq!(log_filters[0].level.as_deref(), Some("debug"));

    let log_file = log.file.as_ref().unwrap();
    assert_eq!(log_file.path, "/var/log/teachbot.log");
    assert_eq!(log_file.append, true);

    let provider = &config.provider;
    assert_eq!(provider.timeout_secs, Some(60));
    assert_eq!(provider.gemini_models.len(), 4);
    assert_eq!(provider.openai.api_key.as_deref(), Some("sk-test"));
    assert_eq!(provider.openai_endpoint(), OPENAI_ENDPOINT);
    assert_eq!(provider.gemini.api_key.as_deref(), Some("gm-test"));
    assert_eq!(
        provider.gemini_endpoint(),
        "http://localhost:9000/v1beta/openai"
    );

    match &config.storage {
        StorageConfig::Sqlite(sqlite) => {
            assert_eq!(sqlite.path(), Some("/var/lib/teachbot/teachbot.db"));
        }
    }
}

#[test]
fn test_load_configuration_with_some_default_fields() {
    let config =
        load_configuration("./testdata/config_with_default.toml").expect("failed to load config");

    assert_eq!(config.server.listen, LISTEN_ADDR);
    assert_eq!(config.server.cors_origins, vec!["*"]);
    assert_eq!(config.log.level.as_deref(), Some("debug"));
    assert!(config.log.file.is_none());

    let provider = &config.provider;
    assert_eq!(provider.gemini_models, vec!["gemini-2.5"]);
    assert_eq!(provider.timeout(), None);
    assert_eq!(provider.gemini_endpoint(), GEMINI_ENDPOINT);
    assert!(provider.openai.api_key.is_none());

    match &config.storage {
        StorageConfig::Sqlite(sqlite) => assert!(sqlite.path().is_none()),
    }
}

#[test]
fn test_with_env_fills_missing_keys_only() {
    let env = HashMap::from([
        ("OPENAI_API_KEY", "sk-env"),
        ("GEMINI_API_KEY", "gm-env"),
    ]);
    let lookup = |key: &str| env.get(key).map(|v| v.to_string());

    let config = Configuration::default().with_env(lookup);
    assert_eq!(config.provider.openai.api_key.as_deref(), Some("sk-env"));
    assert_eq!(config.provider.gemini.api_key.as_deref(), Some("gm-env"));

    let config = load_configuration("./testdata/config.toml")
        .expect("failed to load config")
        .with_env(lookup);
    assert_eq!(config.provider.openai.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.provider.gemini.api_key.as_deref(), Some("gm-test"));
}

#[test]
fn test_with_env_ignores_empty_values() {
    let config = Configuration::default().with_env(|_| Some(String::new()));
    assert!(config.provider.openai.api_key.is_none());
    assert!(config.provider.gemini.api_key.is_none());
}

#[test]
fn test_with_env_replaces_empty_file_keys() {
    let mut config = Configuration::default();
    config.provider.gemini.api_key = Some(String::new());

    let config = config.with_env(|key| (key == "GEMINI_API_KEY").then(|| "gm-env".to_string()));
    assert_eq!(config.provider.gemini.api_key(), Some("gm-env"));

    let mut config = Configuration::default();
    config.provider.openai.api_key = Some(String::new());
    let config = config.with_env(|_| None);
    assert_eq!(config.provider.openai.api_key(), None);
}

#[test]
fn test_resolve_path() {
    let ret = resolve_path("/$TEACHBOT_TEST_DIR/${TEACHBOT_TEST_FILE}.db")
        .expect("failed to resolve path");
    assert_eq!(ret, "//.db");

    unsafe {
        std::env::set_var("TEACHBOT_TEST_DIR", "/tmp/teachbot");
        std::env::set_var("TEACHBOT_TEST_FILE", "bots");
    }
    let ret = resolve_path("$TEACHBOT_TEST_DIR/${TEACHBOT_TEST_FILE}.db")
        .expect("failed to resolve path");
    assert_eq!(ret, "/tmp/teachbot/bots.db");
}

#[test]
fn test_basename() {
    assert_eq!(basename("src/backend/router.rs"), "router.rs");
    assert_eq!(basename("main.rs"), "main.rs");
}
