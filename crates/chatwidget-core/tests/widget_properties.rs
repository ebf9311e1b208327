mod common;

use chatwidget_core::{OutgoingEvent, RequestKind, WidgetError};
use common::{reply, TestFixtures};
use proptest::prelude::*;

proptest! {
    #[test]
    fn non_blank_input_emits_one_event(text in ".*\\S.*") {
        let mut f = TestFixtures::new();
        f.widget.submit_message(&text).unwrap();

        let emitted = f.emitted();
        prop_assert_eq!(emitted.len(), 1);
        match &emitted[0] {
            OutgoingEvent::SendMessage(p) => prop_assert_eq!(&p.message, &text),
            other => prop_assert!(false, "unexpected event: {:?}", other),
        }
        prop_assert!(f.widget.is_pending(RequestKind::Chat));
    }

    #[test]
    fn blank_input_emits_nothing(text in "[ \\t\\n\\r]*") {
        let mut f = TestFixtures::new();
        prop_assert_eq!(f.widget.submit_message(&text), Err(WidgetError::EmptyInput));
        prop_assert_eq!(f.widget.submit_image_prompt(&text), Err(WidgetError::EmptyInput));
        prop_assert!(f.emitted().is_empty());
        prop_assert!(!f.widget.is_loading());
    }

    #[test]
    fn message_count_matches_replies(texts in prop::collection::vec("[a-z]{1,8}", 1..10)) {
        let mut f = TestFixtures::new();
        for (i, text) in texts.iter().enumerate() {
            f.widget.submit_message(text).unwrap();
            f.widget.on_message_received(reply(text, &format!("reply {}", i))).unwrap();
            prop_assert!(!f.widget.is_pending(RequestKind::Chat));
            prop_assert_eq!(f.widget.messages().len(), i + 1);
        }

        let sent: Vec<&str> = f.widget.messages().iter().map(|m| m.text.as_str()).collect();
        let expected: Vec<&str> = texts.iter().map(String::as_str).collect();
        prop_assert_eq!(sent, expected);
    }
}
