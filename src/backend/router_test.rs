use std::sync::Arc;

use super::*;
use crate::backend::MockBackend;
use crate::config::ProviderConnection;
use crate::models::Role;

fn default_names() -> Vec<String> {
    GEMINI_MODELS.iter().map(|m| m.to_string()).collect()
}

#[test]
fn test_classify() {
    let names = default_names();

    assert_eq!(classify("gemini-1.5-pro", &names), ProviderKind::Gemini);
    assert_eq!(classify("GEMINI-1.5-PRO", &names), ProviderKind::Gemini);
    assert_eq!(classify("models/gemini-1.5-pro-latest", &names), ProviderKind::Gemini);
    assert_eq!(classify("my-Gemini-1.5-Pro-002", &names), ProviderKind::Gemini);
    assert_eq!(classify("gemini-2.0-flash", &names), ProviderKind::Gemini);
    assert_eq!(classify("gemini-pro", &names), ProviderKind::Gemini);

    assert_eq!(classify("gpt-4o", &names), ProviderKind::OpenAI);
    assert_eq!(classify("gemini-1.5-flash", &names), ProviderKind::OpenAI);
    assert_eq!(classify("gemini", &names), ProviderKind::OpenAI);
    assert_eq!(classify("", &names), ProviderKind::OpenAI);
}

#[test]
fn test_classify_with_custom_names() {
    let router = ProviderRouter::default().with_gemini_models(vec!["Gemini-2.5".to_string()]);
    assert_eq!(router.classify("gemini-2.5-pro"), ProviderKind::Gemini);
    assert_eq!(router.classify("gemini-1.5-pro"), ProviderKind::OpenAI);

    let router = ProviderRouter::default().with_gemini_models(vec![String::new()]);
    assert_eq!(router.classify("gpt-4o"), ProviderKind::OpenAI);
}

#[test]
fn test_frame() {
    let messages = ProviderRouter::frame(ProviderKind::OpenAI, "build a persona");
    assert_eq!(messages, vec![ChatMessage::new_user("build a persona")]);

    let messages = ProviderRouter::frame(ProviderKind::Gemini, "build a persona");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[0].content, GEMINI_SYSTEM_PROMPT);
    assert_eq!(messages[1], ChatMessage::new_user("build a persona"));
}

#[tokio::test]
async fn test_complete_missing_credential() {
    let router = ProviderRouter::new(&ProviderConfig {
        openai: ProviderConnection {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        },
        ..Default::default()
    });

    let err = router
        .complete(
            ProviderKind::Gemini,
            "gemini-2.0-flash",
            ProviderRouter::frame(ProviderKind::Gemini, "hi"),
        )
        .await
        .expect_err("expected missing credential");

    assert!(matches!(err, Error::MissingCredential(_)));
    assert!(err.is_client_error());
    assert_eq!(
        err.to_string(),
        "GEMINI_API_KEY not found in environment variables"
    );

    let err = ProviderRouter::default()
        .complete(ProviderKind::OpenAI, "gpt-4o", vec![ChatMessage::new_user("hi")])
        .await
        .expect_err("expected missing credential");
    assert_eq!(
        err.to_string(),
        "OPENAI_API_KEY not found in environment variables"
    );
}

#[tokio::test]
async fn test_complete_empty_api_key_is_missing() {
    let router = ProviderRouter::new(&ProviderConfig {
        gemini: ProviderConnection {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            api_key: Some(String::new()),
        },
        ..Default::default()
    });

    let err = router
        .complete(
            ProviderKind::Gemini,
            "gemini-2.0-flash",
            ProviderRouter::frame(ProviderKind::Gemini, "hi"),
        )
        .await
        .expect_err("expected missing credential");

    assert!(matches!(err, Error::MissingCredential(_)));
    assert_eq!(
        err.to_string(),
        "GEMINI_API_KEY not found in environment variables"
    );
}

#[tokio::test]
async fn test_complete_dispatches_to_profile() {
    let mut gemini = MockBackend::new();
    gemini
        .expect_chat_completion()
        .times(1)
        .returning(|model, messages| {
            let model = model.to_string();
            Box::pin(async move {
                assert_eq!(model, "gemini-2.0-flash");
                assert_eq!(messages[0].content, GEMINI_SYSTEM_PROMPT);
                Ok("from gemini".to_string())
            })
        });

    let mut openai = MockBackend::new();
    openai.expect_chat_completion().never();

    let router = ProviderRouter::default()
        .with_backend(ProviderKind::OpenAI, Arc::new(openai))
        .with_backend(ProviderKind::Gemini, Arc::new(gemini));

    let kind = router.classify("gemini-2.0-flash");
    let reply = router
        .complete(kind, "gemini-2.0-flash", ProviderRouter::frame(kind, "hi"))
        .await
        .expect("Failed to complete");
    assert_eq!(reply, "from gemini");
}

#[tokio::test]
async fn test_complete_does_not_fall_back() {
    let mut gemini = MockBackend::new();
    gemini
        .expect_chat_completion()
        .times(1)
        .returning(|_, _| Box::pin(async { Err(eyre::eyre!("quota exceeded")) }));

    let mut openai = MockBackend::new();
    openai.expect_chat_completion().never();

    let router = ProviderRouter::default()
        .with_backend(ProviderKind::OpenAI, Arc::new(openai))
        .with_backend(ProviderKind::Gemini, Arc::new(gemini));

    let err = router
        .complete(ProviderKind::Gemini, "gemini-pro", vec![ChatMessage::new_user("hi")])
        .await
        .expect_err("expected provider error");

    assert!(matches!(err, Error::Provider(_)));
    assert!(!err.is_client_error());
    assert_eq!(err.to_string(), "quota exceeded");
}
