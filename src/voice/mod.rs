//! Speech synthesis
//!
//! Maps a language code to a voice profile and forwards cleaned text to the
//! upstream TTS API. Speech capture and playback stay on the client.

mod profile;
mod tts;

pub use profile::{DEFAULT_LANGUAGE, VOICE_PROFILES, VoiceGender, VoiceProfile};
pub use tts::{
    AUDIO_ENCODING, DEFAULT_BASE_URL as DEFAULT_TTS_BASE_URL, GoogleTts, PITCH, SPEAKING_RATE,
    SpeechSynthesizer,
};
