//! Canned chat replies picked by keyword.

use rand::seq::IndexedRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Fixed(&'static str),
    OneOf(&'static [&'static str]),
}

/// An ordered matching rule: any of `terms` appearing in the case-folded
/// input selects `reply`.
#[derive(Debug, Clone, Copy)]
pub struct KeywordGroup {
    pub name: &'static str,
    pub terms: &'static [&'static str],
    pub reply: Reply,
}

const GREETINGS: &[&str] = &[
    "Hey there! 🍁 Ready for another great conversation?",
    "Hello! It's wonderful to see you again! How's your day going?",
    "Hi friend! What adventures shall we embark on today? 🌟",
];

// Order matters: the first group with a matching term wins.
const GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        name: "greeting",
        terms: &["hello", "hi"],
        reply: Reply::OneOf(GREETINGS),
    },
    KeywordGroup {
        name: "wellbeing",
        terms: &["how are you"],
        reply: Reply::Fixed(
            "I'm feeling energetic and ready to help! Like a crisp autumn day 🍂 What's on your mind?",
        ),
    },
    KeywordGroup {
        name: "help",
        terms: &["help"],
        reply: Reply::Fixed(
            "I'm here to assist you with anything you need! Whether it's answering questions, having a chat, or just being a friendly companion. What can I do for you? 💫",
        ),
    },
    KeywordGroup {
        name: "name",
        terms: &["maple"],
        reply: Reply::Fixed(
            "You called? 🍁 That's me! I chose the name Maple because it represents growth, beauty, and the changing seasons - just like our conversations!",
        ),
    },
    KeywordGroup {
        name: "companion",
        terms: &["companion"],
        reply: Reply::Fixed(
            "As your AI companion, I'm here to chat, help, and make your day a little brighter! You can customize my appearance and personality any time. 🎨",
        ),
    },
];

const FALLBACK_COUNT: usize = 4;

fn fallback(template: usize, input: &str) -> String {
    match template {
        0 => format!("That's fascinating! Tell me more about {}. I love learning new things! 🤔", input),
        1 => format!("I appreciate you sharing \"{}\" with me. Let's explore this topic together! 🌟", input),
        2 => format!("Interesting perspective on {}! Here's what I think about that... 💭", input),
        _ => format!("Great question about {}! Let me think about this for a moment... 🍁", input),
    }
}

#[derive(Debug, Clone)]
pub struct ResponseGenerator {
    groups: &'static [KeywordGroup],
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseGenerator {
    pub fn new() -> Self {
        ResponseGenerator { groups: GROUPS }
    }

    /// First keyword group matching the case-folded input, if any.
    pub fn classify(&self, input: &str) -> Option<&'static KeywordGroup> {
        let lowered = input.to_lowercase();
        self.groups
            .iter()
            .find(|group| group.terms.iter().any(|term| lowered.contains(term)))
    }

    pub fn respond<R: Rng>(&self, input: &str, rng: &mut R) -> String {
        match self.classify(input) {
            Some(group) => match group.reply {
                Reply::Fixed(text) => text.to_string(),
                Reply::OneOf(candidates) => candidates
                    .choose(rng)
                    .copied()
                    .unwrap_or(candidates[0])
                    .to_string(),
            },
            None => fallback(rng.random_range(0..FALLBACK_COUNT), input),
        }
    }
}
