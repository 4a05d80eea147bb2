//! Registration, routing, introspection, expiry and concurrency.

use std::time::Duration;

use anyhow::Result;
use talkflow::widget::CallbackData;
use talkflow::{
    Error, FlowService, FlowServiceConfig, MemorySessionStore, MessageContent, TurnStatus, UserId,
    Values,
};

use crate::support::flows::{Backwards, Note, ResetNote, Saved, Signup, SignupHandler, Tally};
use crate::support::helpers::{Chat, Fixture, LogCapture, init_test_tracing};

// =============================================================================
// Registration
// =============================================================================

#[test]
fn duplicate_registration_is_rejected() {
    init_test_tracing();
    let result = FlowService::builder(MemorySessionStore::new(), FlowServiceConfig::default())
        .register(SignupHandler::default())
        .register(SignupHandler::default())
        .build();
    assert!(matches!(result, Err(Error::DuplicateFlow(name)) if name == "signup"));
}

#[test]
fn definition_errors_surface_at_build() {
    init_test_tracing();
    let result = FlowService::builder(MemorySessionStore::new(), FlowServiceConfig::default())
        .register(Saved::<Backwards>::new())
        .build();
    let Err(err) = result else {
        panic!("expected a definition error");
    };
    assert!(err.is_definition_error());
    assert!(matches!(err, Error::ForwardReference { ref field, .. } if field == "early"));
}

#[test]
fn skip_keyword_may_not_shadow_a_trigger() {
    init_test_tracing();
    let config = FlowServiceConfig {
        skip_keyword: "/cancel".into(),
        ..Default::default()
    };
    let result = FlowService::builder(MemorySessionStore::new(), config)
        .register(Saved::<Note>::new())
        .build();
    assert!(matches!(
        result,
        Err(Error::ConflictingTrigger { first: "skip", second: "cancel", .. })
    ));
}

#[tokio::test]
async fn unknown_flow_is_an_error() -> Result<()> {
    let fx = Fixture::new()?;
    let result = fx
        .service
        .launch(UserId::new("u-unknown"), "nope", "/nope", Values::new())
        .await;
    assert!(matches!(result, Err(Error::UnknownFlow(name)) if name == "nope"));
    assert!(matches!(fx.service.describe("nope"), Err(Error::UnknownFlow(_))));
    Ok(())
}

#[tokio::test]
async fn registered_flows_are_listed() -> Result<()> {
    let fx = Fixture::new()?;
    assert_eq!(fx.service.flow_count(), 11);
    let names = fx.service.flow_names();
    assert_eq!(names.first(), Some(&"assign"));
    assert!(names.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn message_without_session_reports_no_session() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-idle");
    let turn = chat.say("hello").await?;
    assert_eq!(turn.status, TurnStatus::NoSession);
    assert!(turn.replies.is_empty());
    Ok(())
}

#[tokio::test]
async fn message_goes_to_most_recent_session() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-two-flows");

    chat.launch("note").await?;
    tokio::time::sleep(Duration::from_millis(5)).await;
    chat.launch("reset_note").await?;

    chat.say("Shopping").await?;
    let reset = chat.inspect::<ResetNote>().await?.expect("session is active");
    let note = chat.inspect::<Note>().await?.expect("session is active");
    assert_eq!(reset.answered.len(), 1);
    assert!(note.answered.is_empty());
    Ok(())
}

#[tokio::test]
async fn callbacks_route_by_flow_hash() -> Result<()> {
    let fx = Fixture::new()?;
    let mut signup = fx.chat("u-hash");

    signup.start::<Signup>().await?;
    signup.say("Ada").await?;
    // A newer session does not capture callbacks of the older one.
    signup.launch("note").await?;
    let raw = CallbackData::new(fx.service.describe("signup")?.hash, "counter:done").encode()?;
    let turn = signup.press_raw(&raw).await?;
    assert_eq!(turn.replies[0].text, "How old are you?\n\nValue: 30");
    Ok(())
}

#[tokio::test]
async fn stale_and_malformed_callbacks_are_ignored() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-stale");
    chat.start::<Signup>().await?;

    let stale = CallbackData::new("deadbeef", "x").encode()?;
    let turn = chat.press_raw(&stale).await?;
    assert_eq!(turn.status, TurnStatus::Ignored);

    let turn = chat.press_raw("garbage").await?;
    assert_eq!(turn.status, TurnStatus::Ignored);

    // The session is untouched.
    let info = chat.inspect::<Signup>().await?.expect("session is active");
    assert_eq!(info.current.as_deref(), Some("name"));
    Ok(())
}

#[tokio::test]
async fn stale_callback_is_logged() -> Result<()> {
    let fx = Fixture::new()?;
    let logs = LogCapture::default();
    let _guard = logs.install();

    let mut chat = fx.chat("u-stale-log");
    chat.start::<Signup>().await?;
    let stale = CallbackData::new("0badf00d", "x").encode()?;
    chat.press_raw(&stale).await?;

    let out = logs.contents();
    assert!(out.contains("stale callback ignored"), "{out}");
    assert!(out.contains("hash=0badf00d"), "{out}");
    assert!(out.contains("session started"), "{out}");
    Ok(())
}

#[tokio::test]
async fn media_message_reaches_text_field_as_rejection() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-media");
    chat.start::<Signup>().await?;

    let turn = chat
        .send(MessageContent::Location {
            latitude: 52.52,
            longitude: 13.40,
        })
        .await?;
    assert_eq!(turn.status, TurnStatus::Active);
    assert!(chat.last_text().ends_with("What's your name?\n\nPlease send a text message."));
    Ok(())
}

#[tokio::test]
async fn undecodable_record_keeps_session() -> Result<()> {
    init_test_tracing();
    let service = FlowService::builder(MemorySessionStore::new(), FlowServiceConfig::default())
        .register(Saved::<Tally>::new())
        .build()?;
    let mut chat = Chat::new(&service, "u-tally");

    chat.start::<Tally>().await?;
    let err = chat.say("3").await.expect_err("record should not decode");
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::RecordDecode { flow: "tally", .. })
    ));

    let info = chat.inspect::<Tally>().await?.expect("session is still active");
    assert_eq!(info.current.as_deref(), Some("count"));
    assert!(info.answered.is_empty());
    Ok(())
}

// =============================================================================
// Introspection
// =============================================================================

#[tokio::test]
async fn describe_outlines_fields() -> Result<()> {
    let fx = Fixture::new()?;
    let outline = fx.service.describe("signup")?;

    assert_eq!(outline.flow, "signup");
    assert_eq!(outline.transforms, vec!["cancel", "back", "progress"]);
    let names: Vec<_> = outline.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["name", "age", "plan", "promo_code", "newsletter"]);
    assert_eq!(outline.unconditional().count(), 4);

    let text = outline.to_string();
    assert!(text.contains("  4. promo_code (text) when plan\n"));
    assert!(outline.to_mermaid().contains("    plan -.-> promo_code"));

    let assign = fx.service.describe("assign")?;
    assert!(assign.fields[0].dynamic_options);
    let invite = fx.service.describe("invite")?;
    assert!(invite.fields[0].prefilled);
    assert_eq!(invite.fields[0].widget, None);
    Ok(())
}

#[tokio::test]
async fn inspect_reports_progress() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-inspect");

    assert!(chat.inspect::<Signup>().await?.is_none());
    chat.start::<Signup>().await?;
    chat.say("Ada").await?;

    let info = chat.inspect::<Signup>().await?.expect("session is active");
    assert_eq!(info.status, "filling");
    assert_eq!(info.current.as_deref(), Some("age"));
    assert_eq!(info.progress, Some((2, 4)));
    assert_eq!(info.answered, vec![("name".to_string(), "Ada".to_string())]);
    assert!(info.started_at <= info.updated_at);
    Ok(())
}

// =============================================================================
// Expiry
// =============================================================================

#[tokio::test]
async fn expired_session_is_gone() -> Result<()> {
    let fx = Fixture::with_config(FlowServiceConfig {
        session_ttl: Some(Duration::from_millis(1)),
        ..Default::default()
    })?;
    let mut chat = fx.chat("u-ttl");

    chat.start::<Signup>().await?;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let turn = chat.say("Ada").await?;
    assert_eq!(turn.status, TurnStatus::NoSession);
    assert!(chat.inspect::<Signup>().await?.is_none());

    // A fresh launch starts over.
    let turn = chat.start::<Signup>().await?;
    assert!(turn.texts()[0].ends_with("1/4\n\nWhat's your name?"));
    Ok(())
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_presses_are_serialized() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-race");

    chat.start::<Signup>().await?;
    chat.say("Ada").await?;
    let inc = chat.callback_for("counter:inc")?;

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let service = fx.service.clone();
        let user = chat.user.clone();
        let raw = inc.clone();
        tasks.push(tokio::spawn(async move { service.callback(user, &raw).await }));
    }
    for task in tasks {
        let turn = task.await??;
        assert_eq!(turn.status, TurnStatus::Active);
    }

    let turn = chat.press("counter:done").await?;
    assert_eq!(turn.replies[0].text, "How old are you?\n\nValue: 40");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn users_run_in_parallel() -> Result<()> {
    let fx = Fixture::new()?;

    let mut tasks = Vec::new();
    for i in 0..8 {
        let service = fx.service.clone();
        tasks.push(tokio::spawn(async move {
            let user = UserId::new(format!("u-parallel-{i}"));
            service
                .launch(user.clone(), "note", "/note", Values::new())
                .await?;
            service
                .message(user.clone(), &MessageContent::text(format!("Title {i}")))
                .await?;
            service
                .message(user, &MessageContent::text("Body"))
                .await
        }));
    }
    for task in tasks {
        let turn = task.await??;
        assert_eq!(turn.status, TurnStatus::Completed);
        assert_eq!(turn.texts(), vec!["Saved /note."]);
    }
    Ok(())
}
