//! Seeded generator for synthetic group chat exports.
//!
//! Participants get one of six behavior templates so that the analysis has
//! distinct groups to find. Output uses the Android export layout
//! `DD/MM/YYYY, hh:mm AM - Name: text`.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

const USER_NAMES: [&str; 15] = [
    "Alex Chen",
    "Sam Johnson",
    "Jordan Lee",
    "Taylor Smith",
    "Morgan Brown",
    "Casey Davis",
    "Riley Wilson",
    "Avery Martinez",
    "Quinn Anderson",
    "Blake Taylor",
    "Cameron White",
    "Dakota Harris",
    "Emery Clark",
    "Finley Lewis",
    "Harper Walker",
];

const SHORT_MESSAGES: [&str; 15] = [
    "Okay", "Sure", "Thanks", "Got it", "Sounds good", "Agreed", "Yes", "No", "Maybe", "I see",
    "Interesting", "Cool", "Nice", "Haha", "Lol",
];

const MEDIUM_MESSAGES: [&str; 10] = [
    "That makes sense to me",
    "I think we should consider this option",
    "Let me check and get back to you",
    "We could try a different approach",
    "Has anyone looked into this yet?",
    "I'll follow up on that",
    "Good point, we should discuss this",
    "What do others think about this?",
    "I have some thoughts on this topic",
    "Let's schedule a meeting to discuss",
];

const LONG_MESSAGES: [&str; 3] = [
    "I've been thinking about this issue and I believe we need to take a comprehensive approach. There are several factors to consider including timing, resources, and potential impact on the team. What do you all think?",
    "Based on my research, I found some interesting information that might be relevant. The key points are: first, we need to understand the context better; second, we should evaluate all options; and third, we need stakeholder buy-in before proceeding.",
    "I wanted to share an update on the project. We've made good progress but there are a few challenges we need to address. The main concern is around timeline and we might need to adjust our expectations. Let me know your thoughts.",
];

const LINK_MESSAGES: [&str; 5] = [
    "Check this out: https://example.com/article",
    "Found this interesting: https://example.com/resource",
    "This might be useful: https://example.com/reference",
    "Worth reading: https://example.com/guide",
    "Shared a link: https://example.com/tutorial",
];

const EMOJI_MESSAGES: [&str; 12] = [
    "That's great! 😊",
    "Awesome! 🎉",
    "Love it! ❤️",
    "So excited! 🚀",
    "Amazing work! 👏",
    "Perfect! ✅",
    "Well done! 🎊",
    "Fantastic! 🌟",
    "This is cool! 😎",
    "Nice one! 👍",
    "Haha that's funny! 😂",
    "Wow! 🤩",
];

const NIGHT_MESSAGES: [&str; 6] = [
    "Still working on this",
    "Late night thoughts",
    "Anyone else up?",
    "Just finished reviewing",
    "Working late tonight",
    "Can't sleep, thinking about this",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy)]
struct Template {
    message_prob: f64,
    verbosity: Verbosity,
    emoji: f64,
    links: f64,
    night: f64,
}

/// Silent, dominant, night owl, link sharer, emoji heavy, regular.
const TEMPLATES: [Template; 6] = [
    Template {
        message_prob: 0.05,
        verbosity: Verbosity::Short,
        emoji: 0.1,
        links: 0.0,
        night: 0.1,
    },
    Template {
        message_prob: 0.25,
        verbosity: Verbosity::Long,
        emoji: 0.2,
        links: 0.3,
        night: 0.2,
    },
    Template {
        message_prob: 0.15,
        verbosity: Verbosity::Medium,
        emoji: 0.3,
        links: 0.1,
        night: 0.7,
    },
    Template {
        message_prob: 0.12,
        verbosity: Verbosity::Medium,
        emoji: 0.1,
        links: 0.6,
        night: 0.2,
    },
    Template {
        message_prob: 0.18,
        verbosity: Verbosity::Short,
        emoji: 0.8,
        links: 0.0,
        night: 0.3,
    },
    Template {
        message_prob: 0.10,
        verbosity: Verbosity::Medium,
        emoji: 0.3,
        links: 0.1,
        night: 0.2,
    },
];

/// Minimum participant count.
pub const MIN_USERS: usize = 2;
/// Maximum participant count, limited by the name pool.
pub const MAX_USERS: usize = USER_NAMES.len();

/// Parameters of a generated transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOptions {
    /// Random seed; equal seeds give identical transcripts.
    pub seed: u64,
    /// Participants, clamped to `MIN_USERS..=MAX_USERS`.
    pub users: usize,
    /// Messages to emit.
    pub messages: usize,
    /// Time of the first candidate message.
    pub start: NaiveDateTime,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            users: 12,
            messages: 550,
            start: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .unwrap_or_default(),
        }
    }
}

fn pick<'a>(rng: &mut fastrand::Rng, pool: &[&'a str]) -> &'a str {
    pool[rng.usize(0..pool.len())]
}

fn compose(rng: &mut fastrand::Rng, template: &Template, at: NaiveDateTime) -> &'static str {
    let roll = rng.f64();
    let hour = at.hour();
    if roll < template.links {
        pick(rng, &LINK_MESSAGES)
    } else if roll < template.links + template.emoji {
        pick(rng, &EMOJI_MESSAGES)
    } else if template.night > 0.5 && (hour >= 22 || hour < 6) {
        pick(rng, &NIGHT_MESSAGES)
    } else {
        match template.verbosity {
            Verbosity::Short => pick(rng, &SHORT_MESSAGES),
            Verbosity::Medium => pick(rng, &MEDIUM_MESSAGES),
            Verbosity::Long => pick(rng, &LONG_MESSAGES),
        }
    }
}

/// Generate a transcript, one message per line.
pub fn generate_sample_chat(options: &SampleOptions) -> String {
    let mut rng = fastrand::Rng::with_seed(options.seed);
    let user_count = options.users.clamp(MIN_USERS, MAX_USERS);

    let mut pool: Vec<usize> = (0..USER_NAMES.len()).collect();
    rng.shuffle(&mut pool);
    pool.truncate(user_count);

    let mut at = options.start;
    let mut out = String::new();
    let mut written = 0;

    while written < options.messages {
        at += Duration::minutes(rng.i64(5..=240));
        if rng.f64() < 0.1 {
            at += Duration::hours(rng.i64(2..=12));
        }

        let user = pool[rng.usize(0..pool.len())];
        let template = &TEMPLATES[user % TEMPLATES.len()];
        if rng.f64() > template.message_prob {
            continue;
        }

        let text = compose(&mut rng, template, at);
        out.push_str(&format!(
            "{} - {}: {}\n",
            at.format("%d/%m/%Y, %I:%M %p"),
            USER_NAMES[user],
            text
        ));
        written += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_transcript() {
        let options = SampleOptions {
            messages: 40,
            ..SampleOptions::default()
        };
        assert_eq!(generate_sample_chat(&options), generate_sample_chat(&options));

        let other = SampleOptions {
            seed: 7,
            ..options.clone()
        };
        assert_ne!(generate_sample_chat(&options), generate_sample_chat(&other));
    }

    #[test]
    fn emits_requested_message_count_from_known_users() {
        let options = SampleOptions {
            users: 4,
            messages: 60,
            ..SampleOptions::default()
        };
        let text = generate_sample_chat(&options);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 60);

        let mut senders: Vec<&str> = lines
            .iter()
            .filter_map(|line| line.split(" - ").nth(1))
            .filter_map(|rest| rest.split(": ").next())
            .collect();
        senders.sort_unstable();
        senders.dedup();
        assert!(senders.len() <= 4);
        assert!(senders.iter().all(|s| USER_NAMES.contains(s)));
    }

    #[test]
    fn lines_use_android_layout() {
        let text = generate_sample_chat(&SampleOptions {
            messages: 1,
            ..SampleOptions::default()
        });
        let line = text.lines().next().expect("one line");
        assert_eq!(&line[2..3], "/");
        assert!(line.contains("/2024, "));
        assert!(line.contains(" AM - ") || line.contains(" PM - "));
    }
}
