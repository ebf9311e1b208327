mod common;

use chatwidget_core::protocol::{ImageGenerated, MessageReceived};
use chatwidget_core::speech::SPEECH_UNAVAILABLE_NOTICE;
use chatwidget_core::{ChatMessage, OutgoingEvent, RequestKind, WidgetError};
use common::{image, reply, TestFixtures};
use pretty_assertions::assert_eq;

#[test]
fn hello_round_trip() {
    let mut f = TestFixtures::new();

    f.widget.submit_message("hello").unwrap();
    assert!(f.widget.is_pending(RequestKind::Chat));

    f.widget.on_message_received(reply("hello", "hi")).unwrap();

    assert_eq!(
        f.widget.messages(),
        &[ChatMessage {
            text: "hello".to_string(),
            reply: "hi".to_string(),
        }]
    );
    assert!(!f.widget.is_pending(RequestKind::Chat));
    assert!(!f.widget.is_loading());
}

#[test]
fn submit_emits_exactly_one_event_with_text_as_given() {
    let mut f = TestFixtures::new();
    let id = f.widget.submit_message("  hello  ").unwrap();

    let emitted = f.emitted();
    assert_eq!(emitted.len(), 1);
    match &emitted[0] {
        OutgoingEvent::SendMessage(payload) => {
            assert_eq!(payload.message, "  hello  ");
            assert_eq!(payload.user_id, 1);
            assert_eq!(payload.request_id, id);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn empty_submit_does_nothing() {
    let mut f = TestFixtures::new();

    assert_eq!(f.widget.submit_message(""), Err(WidgetError::EmptyInput));
    assert_eq!(f.widget.submit_message(" \t\n"), Err(WidgetError::EmptyInput));

    assert!(f.emitted().is_empty());
    assert!(f.widget.messages().is_empty());
    assert!(!f.widget.is_loading());
}

#[test]
fn image_round_trip() {
    let mut f = TestFixtures::new();

    f.widget.submit_image_prompt("cat").unwrap();
    match &f.emitted()[0] {
        OutgoingEvent::GenerateImage(payload) => assert_eq!(payload.prompt, "cat"),
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(f.widget.is_pending(RequestKind::Image));

    f.widget.on_image_received(image("http://x/cat.png")).unwrap();

    assert_eq!(f.widget.image_url(), Some("http://x/cat.png"));
    assert!(!f.widget.is_pending(RequestKind::Image));
}

#[test]
fn image_result_overwrites() {
    let mut f = TestFixtures::new();

    f.widget.submit_image_prompt("cat").unwrap();
    f.widget.on_image_received(image("http://x/cat.png")).unwrap();
    f.widget.submit_image_prompt("dog").unwrap();
    f.widget.on_image_received(image("http://x/dog.png")).unwrap();

    assert_eq!(f.widget.image_url(), Some("http://x/dog.png"));
}

#[test]
fn two_round_trips_keep_submission_order() {
    let mut f = TestFixtures::new();

    f.widget.submit_message("first").unwrap();
    f.widget.on_message_received(reply("first", "one")).unwrap();
    f.widget.submit_message("second").unwrap();
    f.widget.on_message_received(reply("second", "two")).unwrap();

    let texts: Vec<_> = f.widget.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(f.widget.messages()[1].reply, "two");
}

#[test]
fn second_chat_rejected_while_pending() {
    let mut f = TestFixtures::new();

    f.widget.submit_message("hello").unwrap();
    assert_eq!(
        f.widget.submit_message("again"),
        Err(WidgetError::RequestPending(RequestKind::Chat))
    );
    assert_eq!(f.emitted().len(), 1);
}

#[test]
fn image_reply_does_not_clear_chat_pending() {
    let mut f = TestFixtures::new();

    f.widget.submit_message("hello").unwrap();
    f.widget.on_image_received(image("http://x/stray.png")).unwrap();

    assert!(f.widget.is_pending(RequestKind::Chat));
    assert!(f.widget.messages().is_empty());
}

#[test]
fn chat_reply_does_not_clear_image_pending() {
    let mut f = TestFixtures::new();

    f.widget.submit_image_prompt("cat").unwrap();
    f.widget.on_message_received(reply("pushed", "hi")).unwrap();

    assert!(f.widget.is_pending(RequestKind::Image));
    assert_eq!(f.widget.image_url(), None);
}

#[test]
fn echoed_request_id_resolves_that_request() {
    let mut f = TestFixtures::new();

    let chat = f.widget.submit_message("hello").unwrap();
    let cat = f.widget.submit_image_prompt("cat").unwrap();

    f.widget
        .on_image_received(ImageGenerated {
            image_url: "http://x/cat.png".to_string(),
            request_id: Some(cat.to_string()),
        })
        .unwrap();
    assert!(!f.widget.is_pending(RequestKind::Image));
    assert!(f.widget.is_pending(RequestKind::Chat));

    f.widget
        .on_message_received(MessageReceived {
            message: String::new(),
            bot_reply: "hi".to_string(),
            request_id: Some(chat.to_string()),
        })
        .unwrap();
    assert_eq!(f.widget.messages()[0].text, "hello");
    assert!(!f.widget.is_loading());
}

#[test]
fn reply_with_foreign_request_id_keeps_pending() {
    let mut f = TestFixtures::new();
    let cat = f.widget.submit_image_prompt("cat").unwrap();
    f.widget.submit_message("hello").unwrap();

    // an image id on a chat reply matches no chat request
    f.widget
        .on_message_received(MessageReceived {
            message: "other".to_string(),
            bot_reply: "hi".to_string(),
            request_id: Some(cat.to_string()),
        })
        .unwrap();

    assert!(f.widget.is_pending(RequestKind::Chat));
    assert!(f.widget.is_pending(RequestKind::Image));
    assert_eq!(f.widget.messages().len(), 1);
}

#[test]
fn reply_with_non_uuid_request_id_keeps_pending() {
    let mut f = TestFixtures::new();
    f.widget.submit_message("hello").unwrap();

    f.widget
        .on_message_received(MessageReceived {
            message: "other user".to_string(),
            bot_reply: "not for you".to_string(),
            request_id: Some("42".to_string()),
        })
        .unwrap();

    assert!(f.widget.is_pending(RequestKind::Chat));
    assert_eq!(
        f.widget.messages(),
        &[ChatMessage {
            text: "other user".to_string(),
            reply: "not for you".to_string(),
        }]
    );
}

#[test]
fn image_with_non_uuid_request_id_keeps_pending() {
    let mut f = TestFixtures::new();
    f.widget.submit_image_prompt("cat").unwrap();

    f.widget
        .on_image_received(ImageGenerated {
            image_url: "http://x/dog.png".to_string(),
            request_id: Some("42".to_string()),
        })
        .unwrap();

    assert!(f.widget.is_pending(RequestKind::Image));
    assert_eq!(f.widget.image_url(), Some("http://x/dog.png"));
}

#[test]
fn every_reply_is_spoken() {
    let mut f = TestFixtures::new();

    f.widget.submit_message("hello").unwrap();
    f.widget.on_message_received(reply("hello", "hi")).unwrap();
    f.widget.submit_image_prompt("cat").unwrap();
    f.widget.on_image_received(image("http://x/cat.png")).unwrap();

    assert_eq!(f.spoken_texts(), vec!["hi".to_string()]);
    assert!(f.notices().is_empty());
}

#[test]
fn missing_speech_shows_notice() {
    let mut f = TestFixtures::without_speech();

    f.widget.submit_message("hello").unwrap();
    f.widget.on_message_received(reply("hello", "hi")).unwrap();

    assert_eq!(f.notices(), vec![SPEECH_UNAVAILABLE_NOTICE.to_string()]);
    assert_eq!(f.widget.messages().len(), 1);
}

#[test]
fn no_response_stays_pending() {
    let mut f = TestFixtures::new();
    f.widget.submit_message("hello").unwrap();

    // nothing arrives; pending never times out
    assert!(f.widget.is_pending(RequestKind::Chat));
    assert!(!f.widget.can_submit(RequestKind::Chat));
}
