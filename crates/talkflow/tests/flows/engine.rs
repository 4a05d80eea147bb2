//! Field sequencing, widget results, validators and dynamic options.

use anyhow::Result;
use talkflow::{Delivery, MessageContent, TurnStatus};

use crate::support::flows::{Assign, Signup, recorded};
use crate::support::helpers::Fixture;

// =============================================================================
// Conditional fields
// =============================================================================

#[tokio::test]
async fn free_plan_skips_hidden_promo_code() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-free");

    let turn = chat.start::<Signup>().await?;
    assert_eq!(turn.status, TurnStatus::Active);
    assert_eq!(turn.texts(), vec!["\u{2588}\u{2591}\u{2591}\u{2591} 1/4\n\nWhat's your name?"]);

    chat.say("Ada").await?;
    chat.press("counter:done").await?;
    let turn = chat.press("free").await?;
    assert_eq!(turn.replies[0].text, "Pick a plan:\n\nSelected: Free");
    assert!(chat.last_text().ends_with("4/4\n\nSubscribe to the newsletter?"));

    let turn = chat.press("yes").await?;
    assert_eq!(turn.status, TurnStatus::Completed);
    assert_eq!(turn.last().map(|r| r.text.as_str()), Some("Welcome, Ada!"));

    let finished = recorded(&fx.signups);
    assert_eq!(
        finished,
        vec![Signup {
            name: "Ada".into(),
            age: 30,
            plan: "free".into(),
            promo_code: None,
            newsletter: true,
        }]
    );
    Ok(())
}

#[tokio::test]
async fn pro_plan_prompts_promo_code() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-pro");

    chat.start::<Signup>().await?;
    chat.say("Grace").await?;
    chat.press("counter:done").await?;
    chat.press("pro").await?;
    assert_eq!(
        chat.last_text(),
        "\u{2588}\u{2588}\u{2588}\u{2588}\u{2591} 4/5\n\nPromo code?"
    );

    chat.say("SPRING").await?;
    chat.press("no").await?;

    let finished = recorded(&fx.signups);
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].promo_code.as_deref(), Some("SPRING"));
    assert!(!finished[0].newsletter);
    Ok(())
}

// =============================================================================
// Widget results
// =============================================================================

#[tokio::test]
async fn counter_stays_until_done() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-counter");

    chat.start::<Signup>().await?;
    chat.say("Ada").await?;
    for _ in 0..3 {
        let turn = chat.press("counter:inc").await?;
        assert_eq!(turn.status, TurnStatus::Active);
        assert_eq!(turn.replies.len(), 1);
        assert_eq!(turn.replies[0].delivery, Delivery::Edit);
    }
    chat.press("counter:dec").await?;

    // Stay never commits.
    let info = chat.inspect::<Signup>().await?.expect("session is active");
    assert_eq!(info.current.as_deref(), Some("age"));
    assert_eq!(info.answered.len(), 1);

    let turn = chat.press("counter:done").await?;
    assert_eq!(turn.replies[0].text, "How old are you?\n\nValue: 32");
    assert_eq!(turn.replies[0].delivery, Delivery::Edit);
    Ok(())
}

#[tokio::test]
async fn noop_callback_is_ignored() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-noop");

    chat.start::<Signup>().await?;
    chat.say("Ada").await?;
    let turn = chat.press("counter:noop").await?;
    assert_eq!(turn.status, TurnStatus::Ignored);
    assert!(turn.replies.is_empty());
    Ok(())
}

#[tokio::test]
async fn wrong_modality_rejects_with_message() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-modality");

    chat.start::<Signup>().await?;
    chat.say("Ada").await?;
    let turn = chat.say("forty").await?;
    assert_eq!(turn.status, TurnStatus::Active);
    assert!(chat.last_text().ends_with("How old are you?\n\nPlease use the buttons above."));

    let turn = chat
        .send(MessageContent::Photo {
            file_id: "photo-1".into(),
        })
        .await?;
    assert_eq!(turn.status, TurnStatus::Active);
    let info = chat.inspect::<Signup>().await?.expect("session is active");
    assert_eq!(info.current.as_deref(), Some("age"));
    Ok(())
}

// =============================================================================
// Validators
// =============================================================================

#[tokio::test]
async fn validator_failure_keeps_field() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-validate");

    chat.start::<Signup>().await?;
    chat.say("A").await?;
    assert_eq!(
        chat.last_text(),
        "\u{2588}\u{2591}\u{2591}\u{2591} 1/4\n\nWhat's your name?\n\nInvalid: Too short (min 2 chars). Try again:"
    );
    let info = chat.inspect::<Signup>().await?.expect("session is active");
    assert!(info.answered.is_empty());

    // Retrying is unlimited.
    chat.say("B").await?;
    chat.say("Bo").await?;
    let info = chat.inspect::<Signup>().await?.expect("session is active");
    assert_eq!(info.answered, vec![("name".to_string(), "Bo".to_string())]);
    assert_eq!(info.current.as_deref(), Some("age"));
    Ok(())
}

#[tokio::test]
async fn validator_on_conditional_field() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-promo-len");

    chat.start::<Signup>().await?;
    chat.say("Ada").await?;
    chat.press("counter:done").await?;
    chat.press("pro").await?;
    chat.say("WAYTOOLONGCODE").await?;
    assert!(chat.last_text().ends_with("Invalid: Too long (max 8 chars). Try again:"));
    Ok(())
}

// =============================================================================
// Dynamic options
// =============================================================================

#[tokio::test]
async fn loaded_options_render_as_buttons() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-teams");

    chat.start::<Assign>().await?;
    assert_eq!(chat.last_text(), "Which team?");
    chat.press("infra").await?;
    assert_eq!(chat.last_text(), "Any note?");
    chat.say("welcome aboard").await?;

    let finished = recorded(&fx.assignments);
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].team.as_deref(), Some("infra"));
    Ok(())
}

#[tokio::test]
async fn empty_options_auto_skip_optional_field() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("nobody-1");

    let turn = chat.start::<Assign>().await?;
    assert_eq!(turn.texts(), vec!["Any note?"]);
    let info = chat.inspect::<Assign>().await?.expect("session is active");
    assert_eq!(info.answered, vec![("team".to_string(), "(skipped)".to_string())]);

    chat.say("nothing to add").await?;
    let finished = recorded(&fx.assignments);
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].team, None);
    Ok(())
}

#[tokio::test]
async fn failed_option_load_retries_on_next_event() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("flaky-1");

    chat.start::<Assign>().await?;
    assert_eq!(
        chat.last_text(),
        "Which team?\n\nCould not load options. Send any message to retry."
    );
    let info = chat.inspect::<Assign>().await?.expect("session is active");
    assert_eq!(info.current.as_deref(), Some("team"));

    chat.say("retry").await?;
    assert_eq!(chat.last_text(), "Which team?");
    chat.press("core").await?;
    assert_eq!(chat.last_text(), "Any note?");
    Ok(())
}

#[tokio::test]
async fn skip_keyword_stores_absence() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-skip-team");

    chat.start::<Assign>().await?;
    chat.say("/skip").await?;
    assert_eq!(chat.last_text(), "Any note?");
    chat.say("later").await?;

    let finished = recorded(&fx.assignments);
    assert_eq!(finished[0].team, None);
    assert_eq!(finished[0].note, "later");
    Ok(())
}

#[tokio::test]
async fn skip_keyword_on_required_field_goes_to_widget() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-skip-required");

    chat.start::<Signup>().await?;
    chat.say("/skip").await?;
    // A text widget takes it as the answer.
    let info = chat.inspect::<Signup>().await?.expect("session is active");
    assert_eq!(info.answered, vec![("name".to_string(), "/skip".to_string())]);
    Ok(())
}
