#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use chatwidget_core::protocol::{ImageGenerated, MessageReceived};
use chatwidget_core::{
    ChatWidget, EventEmitter, Notifier, OutgoingEvent, SpeechAnnouncer, SpeechConfig, SpeechEngine,
    SpeechError, TransportError, Utterance,
};

/// Shared log of everything the widget did to its collaborators
#[derive(Default)]
pub struct Recorder {
    pub emitted: RefCell<Vec<OutgoingEvent>>,
    pub spoken: RefCell<Vec<Utterance>>,
    pub notices: RefCell<Vec<String>>,
}

struct RecordingEmitter(Rc<Recorder>);

impl EventEmitter for RecordingEmitter {
    fn emit(&self, event: OutgoingEvent) -> Result<(), TransportError> {
        self.0.emitted.borrow_mut().push(event);
        Ok(())
    }
}

struct RecordingEngine(Rc<Recorder>);

impl SpeechEngine for RecordingEngine {
    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        self.0.spoken.borrow_mut().push(utterance.clone());
        Ok(())
    }
}

struct RecordingNotifier(Rc<Recorder>);

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.0.notices.borrow_mut().push(message.to_string());
    }
}

/// Test fixtures for widget scenarios
pub struct TestFixtures {
    pub recorder: Rc<Recorder>,
    pub widget: ChatWidget,
}

impl TestFixtures {
    /// Widget with a working speech engine
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Widget on a host without speech synthesis
    pub fn without_speech() -> Self {
        Self::build(false)
    }

    fn build(with_engine: bool) -> Self {
        let recorder = Rc::new(Recorder::default());
        let engine: Option<Box<dyn SpeechEngine>> = if with_engine {
            Some(Box::new(RecordingEngine(recorder.clone())))
        } else {
            None
        };
        let announcer = SpeechAnnouncer::new(
            engine,
            Box::new(RecordingNotifier(recorder.clone())),
            SpeechConfig::default(),
        );
        let widget = ChatWidget::new(1, Box::new(RecordingEmitter(recorder.clone())), announcer);
        Self { recorder, widget }
    }

    pub fn emitted(&self) -> Vec<OutgoingEvent> {
        self.recorder.emitted.borrow().clone()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.recorder
            .spoken
            .borrow()
            .iter()
            .map(|u| u.text.clone())
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.recorder.notices.borrow().clone()
    }
}

pub fn reply(message: &str, bot_reply: &str) -> MessageReceived {
    MessageReceived {
        message: message.to_string(),
        bot_reply: bot_reply.to_string(),
        request_id: None,
    }
}

pub fn image(url: &str) -> ImageGenerated {
    ImageGenerated {
        image_url: url.to_string(),
        request_id: None,
    }
}
