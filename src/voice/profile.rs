//! Voice profiles keyed by language code

use serde::Serialize;

/// Language code used when a request names an unknown language
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// SSML gender of a synthetic voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceGender {
    Male,
    Female,
}

/// A named synthetic voice for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceProfile {
    pub language_code: &'static str,
    pub voice_name: &'static str,
    pub gender: VoiceGender,
}

/// Supported voices; the first entry is the fallback
pub const VOICE_PROFILES: [VoiceProfile; 4] = [
    VoiceProfile {
        language_code: "en-US",
        voice_name: "en-US-Wavenet-F",
        gender: VoiceGender::Female,
    },
    VoiceProfile {
        language_code: "hi-IN",
        voice_name: "hi-IN-Wavenet-A",
        gender: VoiceGender::Male,
    },
    VoiceProfile {
        language_code: "ko-KR",
        voice_name: "ko-KR-Wavenet-B",
        gender: VoiceGender::Male,
    },
    VoiceProfile {
        language_code: "cmn-CN",
        voice_name: "cmn-CN-Wavenet-A",
        gender: VoiceGender::Female,
    },
];

impl VoiceProfile {
    /// Resolve a language code, falling back to the `en-US` voice
    #[must_use]
    pub fn for_language(language_code: &str) -> &'static Self {
        VOICE_PROFILES
            .iter()
            .find(|p| p.language_code == language_code)
            .unwrap_or(&VOICE_PROFILES[0])
    }

    /// Whether a language code has its own profile
    #[must_use]
    pub fn is_supported(language_code: &str) -> bool {
        VOICE_PROFILES.iter().any(|p| p.language_code == language_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_languages_resolve() {
        assert_eq!(VoiceProfile::for_language("hi-IN").voice_name, "hi-IN-Wavenet-A");
        assert_eq!(VoiceProfile::for_language("ko-KR").gender, VoiceGender::Male);
        assert_eq!(VoiceProfile::for_language("cmn-CN").gender, VoiceGender::Female);
    }

    #[test]
    fn unknown_language_falls_back() {
        for code in ["fr-FR", "", "EN-us", "xx"] {
            let profile = VoiceProfile::for_language(code);
            assert_eq!(profile.language_code, DEFAULT_LANGUAGE);
            assert_eq!(profile.voice_name, "en-US-Wavenet-F");
            assert!(!VoiceProfile::is_supported(code));
        }
    }

    #[test]
    fn gender_serializes_upper() {
        assert_eq!(serde_json::to_value(VoiceGender::Female).unwrap(), "FEMALE");
    }
}
