//! Text-to-speech for bot replies
//!
//! [`SpeechAnnouncer`] turns reply text into an [`Utterance`] and hands it to
//! the host's [`SpeechEngine`]. When the host has no engine the user gets a
//! blocking notice instead. Whether overlapping utterances queue or interrupt
//! each other is up to the engine.

use crate::config::SpeechConfig;
use crate::error::SpeechError;

/// Notice shown when the host cannot speak
pub const SPEECH_UNAVAILABLE_NOTICE: &str = "Text-to-Speech is not supported in this browser.";

/// A single piece of text to speak
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

/// Host speech capability
#[cfg_attr(test, mockall::automock)]
pub trait SpeechEngine {
    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError>;
}

/// Blocking user-visible notice (`alert` in a browser)
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Notifier that only logs, for hosts without a UI
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::warn!("{}", message);
    }
}

/// Outcome of an announce call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announcement {
    Spoken,
    Unavailable,
    Skipped,
}

pub struct SpeechAnnouncer {
    engine: Option<Box<dyn SpeechEngine>>,
    notifier: Box<dyn Notifier>,
    config: SpeechConfig,
}

impl SpeechAnnouncer {
    pub fn new(
        engine: Option<Box<dyn SpeechEngine>>,
        notifier: Box<dyn Notifier>,
        config: SpeechConfig,
    ) -> Self {
        Self {
            engine,
            notifier,
            config,
        }
    }

    /// Announcer that never speaks
    pub fn disabled() -> Self {
        Self::new(
            None,
            Box::new(LogNotifier),
            SpeechConfig {
                enabled: false,
                ..Default::default()
            },
        )
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn announce(&self, text: &str) -> Announcement {
        if !self.config.enabled || text.trim().is_empty() {
            return Announcement::Skipped;
        }

        let Some(engine) = &self.engine else {
            self.notifier.notify(SPEECH_UNAVAILABLE_NOTICE);
            return Announcement::Unavailable;
        };

        let utterance = Utterance {
            text: text.to_string(),
            rate: self.config.rate,
            pitch: self.config.pitch,
        };

        match engine.speak(&utterance) {
            Ok(()) => Announcement::Spoken,
            Err(SpeechError::Unavailable) => {
                self.notifier.notify(SPEECH_UNAVAILABLE_NOTICE);
                Announcement::Unavailable
            }
            Err(e) => {
                log::error!("Speech failed: {}", e);
                Announcement::Skipped
            }
        }
    }
}
