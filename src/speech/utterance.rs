/// Synthesis parameters applied to every utterance.
#[derive(Clone, Debug, PartialEq)]
pub struct VoiceSettings {
    /// BCP-47 voice locale, e.g. `en-US`.
    pub locale: String,
    /// Normalized speech rate in (0, 1]; 0.5 is a typical conversational pace.
    pub rate: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            rate: 0.45,
        }
    }
}

/// One sentence ready for the audio engine. Discarded after playback.
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: VoiceSettings,
}

impl Utterance {
    pub fn new(text: impl Into<String>, voice: &VoiceSettings) -> Self {
        Self {
            text: text.into(),
            voice: voice.clone(),
        }
    }
}
