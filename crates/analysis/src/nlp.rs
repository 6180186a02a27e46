//! Per-message text signals.

use once_cell::sync::Lazy;
use regex::Regex;

/// Flags (regional indicator pairs) count once; skin-tone modifiers never count.
static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[\x{1F1E6}-\x{1F1FF}]{2}|[[\x{1F300}-\x{1F64F}\x{1F680}-\x{1F6FF}\x{1F900}-\x{1F9FF}\x{1FA70}-\x{1FAFF}\x{2600}-\x{27BF}\x{2B50}\x{2B55}]--[\x{1F3FB}-\x{1F3FF}]]",
    )
    .expect("emoji pattern is valid")
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("url pattern is valid"));

/// Signals measured on a single message body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextSignals {
    /// Length in Unicode scalar values.
    pub chars: usize,
    /// Emoji count.
    pub emoji: usize,
    /// `!` count.
    pub exclamations: usize,
    /// `?` count.
    pub questions: usize,
    /// Uppercase letters over alphabetic letters, 0 without letters.
    pub uppercase_ratio: f64,
    /// Whether the body contains a link.
    pub has_link: bool,
}

impl TextSignals {
    /// Measure a message body.
    pub fn measure(text: &str) -> Self {
        let mut chars = 0;
        let mut exclamations = 0;
        let mut questions = 0;
        let mut letters = 0usize;
        let mut upper = 0usize;

        for c in text.chars() {
            chars += 1;
            match c {
                '!' => exclamations += 1,
                '?' => questions += 1,
                _ if c.is_alphabetic() => {
                    letters += 1;
                    if c.is_uppercase() {
                        upper += 1;
                    }
                }
                _ => {}
            }
        }

        Self {
            chars,
            emoji: count_emoji(text),
            exclamations,
            questions,
            uppercase_ratio: if letters == 0 {
                0.0
            } else {
                upper as f64 / letters as f64
            },
            has_link: contains_link(text),
        }
    }
}

/// Count emoji in text.
pub fn count_emoji(text: &str) -> usize {
    EMOJI_RE.find_iter(text).count()
}

/// Whether text contains an `http(s)://` or `www.` link.
pub fn contains_link(text: &str) -> bool {
    URL_RE.is_match(text)
}
