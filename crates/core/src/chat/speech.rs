/// Voice parameters used when reading an explanation aloud.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechStyle {
    /// BCP 47 language tag of the voice.
    pub lang: String,
    /// Speaking rate, `1.0` being the platform default.
    pub rate: f32,
    /// Voice pitch, `1.0` being the platform default.
    pub pitch: f32,
}

impl Default for SpeechStyle {
    fn default() -> Self {
        Self {
            lang: "fr-FR".to_owned(),
            rate: 0.9,
            pitch: 1.1,
        }
    }
}

/// Callback invoked with the final transcript of a voice capture.
pub type OnTranscript = Box<dyn FnOnce(String) + Send>;

/// Callback invoked once a capture or an utterance is over.
pub type OnEnd = Box<dyn FnOnce() + Send>;

/// Speech-to-text and text-to-speech as provided by the host platform.
///
/// Both features are best-effort. An implementation that lacks one of them
/// returns `false` from the matching start method and does nothing else.
pub trait SpeechCapability: Send + Sync + 'static {
    /// Starts capturing one utterance. `on_transcript` is called at most
    /// once with the final transcript, then `on_end` is called.
    ///
    /// Returns `false` if voice capture is unavailable.
    fn start_capture(&self, on_transcript: OnTranscript, on_end: OnEnd)
    -> bool;

    /// Stops an ongoing capture.
    fn stop_capture(&self);

    /// Reads `text` aloud, calling `on_end` when done.
    ///
    /// Returns `false` if speech synthesis is unavailable.
    fn speak(&self, text: &str, style: &SpeechStyle, on_end: OnEnd) -> bool;

    /// Stops reading aloud.
    fn cancel_speech(&self);
}

/// A platform with no speech features at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSpeech;

impl SpeechCapability for NoSpeech {
    #[inline]
    fn start_capture(&self, _: OnTranscript, _: OnEnd) -> bool {
        false
    }

    #[inline]
    fn stop_capture(&self) {}

    #[inline]
    fn speak(&self, _: &str, _: &SpeechStyle, _: OnEnd) -> bool {
        false
    }

    #[inline]
    fn cancel_speech(&self) {}
}
