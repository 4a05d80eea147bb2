//! Cancel, back, summary, show mode and launch modes.

use anyhow::Result;
use talkflow::{Delivery, TurnStatus};

use crate::support::flows::{ExclusiveNote, Feedback, ResetNote, Signup, SingleTopNote, recorded};
use crate::support::helpers::Fixture;

// =============================================================================
// Cancel
// =============================================================================

#[tokio::test]
async fn cancel_discards_session() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-cancel");

    chat.start::<Signup>().await?;
    chat.say("Ada").await?;
    let stale = chat.callback_for("counter:inc")?;

    let turn = chat.say("/cancel").await?;
    assert_eq!(turn.status, TurnStatus::Cancelled);
    assert_eq!(turn.texts(), vec!["Cancelled."]);
    assert!(chat.inspect::<Signup>().await?.is_none());

    let turn = chat.say("hello?").await?;
    assert_eq!(turn.status, TurnStatus::NoSession);

    // Buttons of the cancelled session no longer reach anything.
    let turn = chat.press_raw(&stale).await?;
    assert_eq!(turn.status, TurnStatus::NoSession);
    assert!(recorded(&fx.signups).is_empty());
    Ok(())
}

#[tokio::test]
async fn cancel_is_checked_before_the_widget() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-cancel-first");

    // A text field would otherwise accept "/cancel" as a name.
    chat.start::<Signup>().await?;
    let turn = chat.say("  /cancel  ").await?;
    assert_eq!(turn.status, TurnStatus::Cancelled);
    Ok(())
}

// =============================================================================
// Back
// =============================================================================

#[tokio::test]
async fn back_on_first_field_rerenders_prompt() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-back-first");

    chat.start::<Signup>().await?;
    let turn = chat.say("/back").await?;
    assert_eq!(turn.status, TurnStatus::Active);
    assert_eq!(
        turn.texts(),
        vec!["\u{2588}\u{2591}\u{2591}\u{2591} 1/4\n\nWhat's your name?"]
    );
    Ok(())
}

#[tokio::test]
async fn back_reopens_previous_field() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-back");

    chat.start::<Signup>().await?;
    chat.say("Ada").await?;
    chat.press("counter:inc").await?;
    chat.press("counter:done").await?;

    let turn = chat.say("/back").await?;
    assert!(turn.texts()[0].ends_with("2/4\n\nHow old are you?"));
    let info = chat.inspect::<Signup>().await?.expect("session is active");
    assert_eq!(info.current.as_deref(), Some("age"));
    assert_eq!(info.answered.len(), 1);

    // The counter resumes from the value it held before going back.
    let turn = chat.press("counter:inc").await?;
    assert_eq!(turn.status, TurnStatus::Active);
    let turn = chat.press("counter:done").await?;
    assert_eq!(turn.replies[0].text, "How old are you?\n\nValue: 32");
    Ok(())
}

#[tokio::test]
async fn back_past_hidden_field_replays_visibility() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-back-hidden");

    chat.start::<Signup>().await?;
    chat.say("Ada").await?;
    chat.press("counter:done").await?;
    chat.press("pro").await?;
    chat.say("SPRING").await?;
    assert!(chat.last_text().ends_with("5/5\n\nSubscribe to the newsletter?"));

    chat.say("/back").await?;
    assert!(chat.last_text().ends_with("4/5\n\nPromo code?"));
    chat.say("/back").await?;
    assert!(chat.last_text().ends_with("3/4\n\nPick a plan:"));

    // Switching to free hides the promo code again.
    chat.press("free").await?;
    assert!(chat.last_text().ends_with("4/4\n\nSubscribe to the newsletter?"));
    chat.press("yes").await?;

    let finished = recorded(&fx.signups);
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].plan, "free");
    assert_eq!(finished[0].promo_code, None);
    Ok(())
}

// =============================================================================
// Summary
// =============================================================================

#[tokio::test]
async fn summary_confirms_before_finish() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-summary");

    chat.start::<Feedback>().await?;
    let turn = chat.press("bug").await?;
    assert_eq!(turn.replies[0].text, "What is it about?\n\nSelected: Bug report");
    assert_eq!(chat.last_text(), "Anything else to add?");

    let turn = chat.say("/skip").await?;
    assert_eq!(turn.status, TurnStatus::Active);
    assert_eq!(chat.last_text(), "Review your answers:\n\n  Topic: bug");
    let info = chat.inspect::<Feedback>().await?.expect("session is active");
    assert_eq!(info.status, "reviewing");
    assert!(recorded(&fx.feedback).is_empty());

    let turn = chat.press("_summary:ok").await?;
    assert_eq!(turn.status, TurnStatus::Completed);
    assert_eq!(turn.texts(), vec!["Thanks for the feedback!"]);

    let finished = recorded(&fx.feedback);
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].topic, "bug");
    assert_eq!(finished[0].comment, None);
    Ok(())
}

#[tokio::test]
async fn summary_restart_clears_answers() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-restart");

    chat.start::<Feedback>().await?;
    chat.press("idea").await?;
    chat.say("dark mode please").await?;
    assert_eq!(
        chat.last_text(),
        "Review your answers:\n\n  Topic: idea\n  Comment: dark mode please"
    );

    chat.press("_summary:restart").await?;
    assert_eq!(chat.last_text(), "What is it about?");
    let info = chat.inspect::<Feedback>().await?.expect("session is active");
    assert_eq!(info.status, "filling");
    assert!(info.answered.is_empty());
    Ok(())
}

#[tokio::test]
async fn summary_asks_for_buttons_on_text() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-review-text");

    chat.start::<Feedback>().await?;
    chat.press("bug").await?;
    chat.say("/skip").await?;
    chat.say("looks good").await?;
    assert_eq!(
        chat.last_text(),
        "Review your answers:\n\n  Topic: bug\n\nPlease use the buttons above."
    );
    assert!(recorded(&fx.feedback).is_empty());
    Ok(())
}

#[tokio::test]
async fn back_leaves_review() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-review-back");

    chat.start::<Feedback>().await?;
    chat.press("bug").await?;
    chat.say("/skip").await?;
    chat.say("/back").await?;
    assert_eq!(chat.last_text(), "Anything else to add?");

    chat.say("crashes on login").await?;
    chat.press("_summary:ok").await?;
    let finished = recorded(&fx.feedback);
    assert_eq!(finished[0].comment.as_deref(), Some("crashes on login"));
    Ok(())
}

// =============================================================================
// Show mode
// =============================================================================

#[tokio::test]
async fn edit_show_mode_edits_after_first_prompt() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-show-edit");

    let turn = chat.start::<Feedback>().await?;
    assert_eq!(turn.replies[0].delivery, Delivery::Send);

    let turn = chat.press("bug").await?;
    assert!(turn.replies.iter().all(|r| r.delivery == Delivery::Edit));
    Ok(())
}

#[tokio::test]
async fn send_show_mode_always_sends_new_prompts() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-show-send");

    chat.start::<Signup>().await?;
    let turn = chat.say("Ada").await?;
    assert_eq!(turn.replies[0].delivery, Delivery::Send);
    Ok(())
}

// =============================================================================
// Launch modes
// =============================================================================

#[tokio::test]
async fn standard_launch_feeds_command_to_active_field() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-standard");

    let turn = chat.launch("note").await?;
    assert_eq!(turn.texts(), vec!["Title?"]);
    let turn = chat.launch("note").await?;
    assert_eq!(turn.texts(), vec!["Body?"]);

    let turn = chat.say("Remember the milk").await?;
    assert_eq!(turn.status, TurnStatus::Completed);
    assert_eq!(turn.texts(), vec!["Saved /note."]);
    Ok(())
}

#[tokio::test]
async fn exclusive_launch_refuses_while_active() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-exclusive");

    chat.launch("exclusive_note").await?;
    chat.say("Groceries").await?;
    let turn = chat.launch("exclusive_note").await?;
    assert_eq!(turn.status, TurnStatus::Active);
    assert_eq!(
        turn.texts(),
        vec!["Already in /exclusive_note. Send /cancel to abort."]
    );

    let info = chat.inspect::<ExclusiveNote>().await?.expect("session is active");
    assert_eq!(info.current.as_deref(), Some("body"));
    Ok(())
}

#[tokio::test]
async fn reset_launch_starts_over() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-reset");

    chat.launch("reset_note").await?;
    chat.say("Groceries").await?;
    let turn = chat.launch("reset_note").await?;
    assert_eq!(turn.texts(), vec!["Title?"]);

    let info = chat.inspect::<ResetNote>().await?.expect("session is active");
    assert!(info.answered.is_empty());
    assert_eq!(info.current.as_deref(), Some("title"));
    Ok(())
}

#[tokio::test]
async fn single_top_launch_resends_current_prompt() -> Result<()> {
    let fx = Fixture::new()?;
    let mut chat = fx.chat("u-single-top");

    chat.launch("single_top_note").await?;
    chat.say("Groceries").await?;
    let turn = chat.launch("single_top_note").await?;
    assert_eq!(turn.status, TurnStatus::Active);
    assert_eq!(turn.texts(), vec!["Body?"]);
    assert_eq!(turn.replies[0].delivery, Delivery::Send);

    let info = chat.inspect::<SingleTopNote>().await?.expect("session is active");
    assert_eq!(
        info.answered,
        vec![("title".to_string(), "Groceries".to_string())]
    );
    Ok(())
}
