use super::*;

fn params(name: &str) -> BotParams {
    BotParams::new(name, "Math Teacher")
        .with_goal("teach fractions")
        .with_object("grade 4")
        .with_activity("guided questions")
        .with_format("short answers")
        .with_responsestyle("encouraging")
}

async fn setup() -> Sqlite {
    Sqlite::new(None).await.expect("Failed to open database")
}

#[test]
fn test_filter_to_query() {
    let (query, params) = filter_to_query(&FilterBot::default());
    assert_eq!(
        query,
        format!(
            "SELECT {} FROM bots WHERE 1=1 ORDER BY created_at DESC, id DESC LIMIT :limit OFFSET :skip",
            BOT_COLUMNS
        )
    );
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].0, ":limit");
    assert_eq!(params[1].0, ":skip");

    let filter = FilterBot::default()
        .with_user_id("teacher-1")
        .with_page(Page::new(10, 5));
    let (query, params) = filter_to_query(&filter);
    assert_eq!(
        query,
        format!(
            "SELECT {} FROM bots WHERE 1=1 AND user_id = :user_id ORDER BY created_at DESC, id DESC LIMIT :limit OFFSET :skip",
            BOT_COLUMNS
        )
    );
    assert_eq!(params.len(), 3);
    assert_eq!(params[0].0, ":user_id");
}

#[test]
fn test_patch_to_query() {
    let (query, params) = patch_to_query(&BotPatch::default(), "prompt".to_string(), 7);
    assert_eq!(
        query,
        "UPDATE bots SET prompt = :prompt, updated_at = :updated_at WHERE id = :id"
    );
    assert_eq!(params.len(), 3);

    let patch = BotPatch {
        goal: Some("new goal".to_string()),
        model: Some("gemini-pro".to_string()),
        ..Default::default()
    };
    let (query, params) = patch_to_query(&patch, "prompt".to_string(), 7);
    assert_eq!(
        query,
        "UPDATE bots SET prompt = :prompt, updated_at = :updated_at, goal = :goal, model = :model WHERE id = :id"
    );
    let names = params.iter().map(|(n, _)| *n).collect::<Vec<_>>();
    assert_eq!(names, vec![":prompt", ":updated_at", ":goal", ":model", ":id"]);
}

#[tokio::test]
async fn test_create_and_get_bot() {
    let db = setup().await;

    let created = db
        .create_bot(&params("Fraction Friend").with_user_id("u1"), "generated prompt")
        .await
        .expect("Failed to create bot");
    assert!(created.id > 0);
    assert_eq!(created.updated_at, None);

    let actual = db
        .get_bot(created.id)
        .await
        .expect("Failed to get bot")
        .expect("bot should exist");
    assert_eq!(actual, created);
    assert_eq!(actual.prompt, "generated prompt");
    assert_eq!(actual.params.user_id.as_deref(), Some("u1"));
    assert_eq!(actual.model(), "gpt-4o");

    assert!(db.get_bot(created.id + 100).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_bots() {
    let db = setup().await;

    let first = db.create_bot(&params("First"), "p1").await.unwrap();
    let second = db
        .create_bot(&params("Second").with_user_id("owner"), "p2")
        .await
        .unwrap();
    let third = db.create_bot(&params("Third"), "p3").await.unwrap();

    let bots = db.list_bots(FilterBot::default()).await.unwrap();
    let ids = bots.iter().map(|b| b.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![third.id, second.id, first.id]);

    let bots = db
        .list_bots(FilterBot::default().with_page(Page::new(1, 1)))
        .await
        .unwrap();
    assert_eq!(bots.len(), 1);
    assert_eq!(bots[0].id, second.id);

    let bots = db
        .list_bots(FilterBot::default().with_user_id("owner"))
        .await
        .unwrap();
    assert_eq!(bots.len(), 1);
    assert_eq!(bots[0].params.name, "Second");

    let bots = db
        .list_bots(FilterBot::default().with_page(Page::new(5, 10)))
        .await
        .unwrap();
    assert!(bots.is_empty());
}

#[tokio::test]
async fn test_update_bot() {
    let db = setup().await;
    let bot = db
        .create_bot(&params("Fraction Friend").with_description("old"), "p1")
        .await
        .unwrap();

    let patch = BotPatch {
        goal: Some("teach decimals".to_string()),
        ..Default::default()
    };
    let updated = db
        .update_bot(bot.id, &patch, "p2")
        .await
        .unwrap()
        .expect("bot should exist");

    assert_eq!(updated.prompt, "p2");
    assert_eq!(updated.params.goal, "teach decimals");
    assert_eq!(updated.params.name, "Fraction Friend");
    assert_eq!(updated.params.description.as_deref(), Some("old"));
    assert_eq!(updated.created_at, bot.created_at);
    assert!(updated.updated_at.is_some());

    assert!(db.update_bot(bot.id + 1, &patch, "p3").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_bot_cascades() {
    let db = setup().await;
    let bot = db.create_bot(&params("Doomed"), "p").await.unwrap();
    let other = db.create_bot(&params("Survivor"), "p").await.unwrap();

    let convo = db
        .create_conversation(&NewConversation::new(bot.id))
        .await
        .unwrap();
    let message = db
        .add_message(convo.id, &NewMessage::new_user("hello"))
        .await
        .unwrap();
    let kept = db
        .create_conversation(&NewConversation::new(other.id))
        .await
        .unwrap();

    assert!(db.delete_bot(bot.id).await.unwrap());
    assert!(db.get_bot(bot.id).await.unwrap().is_none());
    assert!(db.get_conversation(convo.id).await.unwrap().is_none());
    assert!(db.conversation_owner(convo.id).await.unwrap().is_none());
    assert!(
        db.get_messages(message.conversation_id, Page::all())
            .await
            .unwrap()
            .is_empty()
    );
    assert!(db.get_conversation(kept.id).await.unwrap().is_some());

    assert!(!db.delete_bot(bot.id).await.unwrap());
}

#[tokio::test]
async fn test_conversation_lifecycle() {
    let db = setup().await;
    let bot = db.create_bot(&params("Tutor"), "p").await.unwrap();

    let convo = db
        .create_conversation(
            &NewConversation::new(bot.id)
                .with_user_identifier(Some("student-9".to_string()))
                .with_title("What is 1/2?"),
        )
        .await
        .unwrap();
    assert_eq!(convo.bot_id, bot.id);
    assert!(convo.messages.is_empty());

    db.add_message(convo.id, &NewMessage::new_user("What is 1/2?"))
        .await
        .unwrap();
    db.add_message(convo.id, &NewMessage::new_bot("One half."))
        .await
        .unwrap();

    assert_eq!(db.conversation_owner(convo.id).await.unwrap(), Some(bot.id));
    assert_eq!(db.conversation_owner(convo.id + 1).await.unwrap(), None);

    let actual = db.get_conversation(convo.id).await.unwrap().unwrap();
    assert_eq!(actual.title.as_deref(), Some("What is 1/2?"));
    assert_eq!(actual.user_identifier.as_deref(), Some("student-9"));
    assert_eq!(actual.messages().len(), 2);
    assert!(!actual.messages()[0].is_bot);
    assert!(actual.messages()[1].is_bot);
    assert_eq!(actual.last_message().map(|m| m.content.as_str()), Some("One half."));

    assert!(db.delete_conversation(convo.id).await.unwrap());
    assert!(db.get_conversation(convo.id).await.unwrap().is_none());
    assert!(db.get_messages(convo.id, Page::all()).await.unwrap().is_empty());
    assert!(db.get_bot(bot.id).await.unwrap().is_some());
    assert!(!db.delete_conversation(convo.id).await.unwrap());
}

#[tokio::test]
async fn test_list_conversations() {
    let db = setup().await;
    let bot = db.create_bot(&params("Tutor"), "p").await.unwrap();
    let other = db.create_bot(&params("Other"), "p").await.unwrap();

    let mut ids = vec![];
    for _ in 0..3 {
        let convo = db
            .create_conversation(&NewConversation::new(bot.id))
            .await
            .unwrap();
        db.add_message(convo.id, &NewMessage::new_user("hi"))
            .await
            .unwrap();
        ids.push(convo.id);
    }
    db.create_conversation(&NewConversation::new(other.id))
        .await
        .unwrap();

    let convos = db.list_conversations(bot.id, Page::new(0, 20)).await.unwrap();
    assert_eq!(
        convos.iter().map(|c| c.id).collect::<Vec<_>>(),
        ids.iter().rev().copied().collect::<Vec<_>>()
    );
    assert!(convos.iter().all(|c| c.messages().len() == 1));

    let convos = db.list_conversations(bot.id, Page::new(2, 20)).await.unwrap();
    assert_eq!(convos.len(), 1);
    assert_eq!(convos[0].id, ids[0]);
}

#[tokio::test]
async fn test_get_messages_order() {
    let db = setup().await;
    let bot = db.create_bot(&params("Tutor"), "p").await.unwrap();
    let convo = db
        .create_conversation(&NewConversation::new(bot.id))
        .await
        .unwrap();

    for i in 0..5 {
        let message = if i % 2 == 0 {
            NewMessage::new_user(format!("m{}", i))
        } else {
            NewMessage::new_bot(format!("m{}", i))
        };
        db.add_message(convo.id, &message).await.unwrap();
    }

    let messages = db.get_messages(convo.id, Page::all()).await.unwrap();
    let contents = messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>();
    assert_eq!(contents, vec!["m0", "m1", "m2", "m3", "m4"]);

    let messages = db.get_messages(convo.id, Page::new(1, 2)).await.unwrap();
    let contents = messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>();
    assert_eq!(contents, vec!["m1", "m2"]);
}

#[tokio::test]
async fn test_message_requires_conversation() {
    let db = setup().await;
    let res = db.add_message(42, &NewMessage::new_user("orphan")).await;
    assert!(res.is_err());
}

#[tokio::test]
async fn test_dump_table() {
    let db = setup().await;
    let bot = db.create_bot(&params("Tutor"), "p").await.unwrap();
    db.create_bot(&params("Tutor 2"), "p").await.unwrap();

    let dump = db.dump_table(Table::Bots, 100).await.unwrap();
    assert_eq!(dump.table, Table::Bots);
    assert_eq!(dump.count, 2);
    assert_eq!(dump.columns.len(), 14);
    assert_eq!(dump.columns[0], "id");
    assert_eq!(dump.data[0]["id"], serde_json::json!(bot.id));
    assert_eq!(dump.data[0]["name"], serde_json::json!("Tutor"));
    assert_eq!(dump.data[0]["updated_at"], serde_json::Value::Null);
    assert!(dump.data[0]["created_at"].is_string());

    let dump = db.dump_table(Table::Bots, 1).await.unwrap();
    assert_eq!(dump.count, 1);

    let dump = db.dump_table(Table::Messages, 100).await.unwrap();
    assert_eq!(dump.count, 0);
    assert_eq!(
        dump.columns,
        vec!["id", "conversation_id", "content", "is_bot", "created_at"]
    );
}
