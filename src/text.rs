//! Text cleanup for assistant replies and speech input

use std::sync::LazyLock;

use regex::Regex;

/// Markdown bold markers and the ASCII smiley, stripped from LLM replies
static REPLY_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*|:\)").expect("valid regex"));

/// Emoticons and emoji that TTS engines read out literally
static EMOTICONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("(?::\\)|\u{1F60A}|\u{1F604}|\u{1F609})").expect("valid regex")
});

/// Clean an LLM reply before it is stored and shown
#[must_use]
pub fn clean_reply(text: &str) -> String {
    REPLY_NOISE.replace_all(text, "").into_owned()
}

/// Remove emoticons before text is sent for synthesis
#[must_use]
pub fn strip_emoticons(text: &str) -> String {
    EMOTICONS.replace_all(text, "").into_owned()
}

/// Remove markdown bold markers, applied again on the client before rendering
#[must_use]
pub fn strip_emphasis(text: &str) -> String {
    text.replace("**", "")
}
