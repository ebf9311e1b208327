use wasm_bindgen::JsValue;
use web_sys::{SpeechSynthesis, SpeechSynthesisUtterance};

use chatwidget_core::{Notifier, SpeechEngine, SpeechError, Utterance};

/// Speech through `window.speechSynthesis`
pub struct WebSpeechEngine {
    synth: SpeechSynthesis,
}

impl WebSpeechEngine {
    /// `None` when the browser has no speech synthesis
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let supported = js_sys::Reflect::has(&window, &JsValue::from_str("speechSynthesis")).unwrap_or(false);
        if !supported {
            log::warn!("speechSynthesis is not available");
            return None;
        }
        window.speech_synthesis().ok().map(|synth| Self { synth })
    }
}

impl SpeechEngine for WebSpeechEngine {
    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        let spoken = SpeechSynthesisUtterance::new_with_text(&utterance.text)
            .map_err(|e| SpeechError::Engine(format!("{:?}", e)))?;
        spoken.set_rate(utterance.rate);
        spoken.set_pitch(utterance.pitch);
        self.synth.speak(&spoken);
        Ok(())
    }
}

/// Blocking notice through `window.alert`
pub struct AlertNotifier;

impl Notifier for AlertNotifier {
    fn notify(&self, message: &str) {
        let shown = web_sys::window().map(|w| w.alert_with_message(message));
        if !matches!(shown, Some(Ok(()))) {
            log::warn!("{}", message);
        }
    }
}
