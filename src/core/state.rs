use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Companion mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Neutral,
    Thoughtful,
    Excited,
    Sleepy,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Neutral,
        Mood::Thoughtful,
        Mood::Excited,
        Mood::Sleepy,
    ];

    /// Text shown next to the mood on the status card.
    pub fn label(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy & Energetic",
            Mood::Neutral => "Calm & Ready",
            Mood::Thoughtful => "Deep in Thought",
            Mood::Excited => "Super Excited!",
            Mood::Sleepy => "A bit Sleepy",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Neutral => "😐",
            Mood::Thoughtful => "🤔",
            Mood::Excited => "🤩",
            Mood::Sleepy => "😴",
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mood::Happy => write!(f, "happy"),
            Mood::Neutral => write!(f, "neutral"),
            Mood::Thoughtful => write!(f, "thoughtful"),
            Mood::Excited => write!(f, "excited"),
            Mood::Sleepy => write!(f, "sleepy"),
        }
    }
}

/// Energy level, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Energy(u8);

impl Energy {
    pub const MAX: u8 = 100;

    /// Clamps any integer into the valid range.
    pub fn new(value: i64) -> Self {
        Energy(value.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Applies a signed delta, saturating at both ends.
    pub fn apply(self, delta: i16) -> Self {
        Energy::new(self.0 as i64 + delta as i64)
    }
}

impl From<i64> for Energy {
    fn from(value: i64) -> Self {
        Energy::new(value)
    }
}

impl From<Energy> for u8 {
    fn from(energy: Energy) -> Self {
        energy.0
    }
}

impl std::fmt::Display for Energy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Personality traits, each in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    pub friendliness: f32,
    pub helpfulness: f32,
    pub humor: f32,
    pub empathy: f32,
}

impl PersonalityTraits {
    pub fn new(friendliness: f32, helpfulness: f32, humor: f32, empathy: f32) -> Self {
        PersonalityTraits {
            friendliness: clamp_trait(friendliness),
            helpfulness: clamp_trait(helpfulness),
            humor: clamp_trait(humor),
            empathy: clamp_trait(empathy),
        }
    }

    /// Re-applies the `[0.0, 1.0]` bounds, e.g. after deserializing.
    pub fn clamped(self) -> Self {
        Self::new(self.friendliness, self.helpfulness, self.humor, self.empathy)
    }

    pub fn is_within_bounds(&self) -> bool {
        [self.friendliness, self.helpfulness, self.humor, self.empathy]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> {
        [
            ("friendliness", self.friendliness),
            ("helpfulness", self.helpfulness),
            ("humor", self.humor),
            ("empathy", self.empathy),
        ]
        .into_iter()
    }
}

impl Default for PersonalityTraits {
    fn default() -> Self {
        PersonalityTraits::new(0.9, 0.85, 0.7, 0.95)
    }
}

fn clamp_trait(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionState {
    pub mood: Mood,
    pub energy: Energy,
    pub last_interaction: DateTime<Utc>,
    pub personality: PersonalityTraits,
}

impl CompanionState {
    pub fn new(mood: Mood, energy: Energy, personality: PersonalityTraits, now: DateTime<Utc>) -> Self {
        CompanionState {
            mood,
            energy,
            last_interaction: now,
            personality: personality.clamped(),
        }
    }

    /// Replaces all four traits at once, clamping each into range.
    pub fn edit_personality(&mut self, traits: PersonalityTraits) {
        self.personality = traits.clamped();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_clamps() {
        assert_eq!(Energy::new(-5).value(), 0);
        assert_eq!(Energy::new(250).value(), 100);
        assert_eq!(Energy::new(42).apply(-50).value(), 0);
        assert_eq!(Energy::new(95).apply(20).value(), 100);
        assert_eq!(Energy::new(50).apply(0).value(), 50);
    }

    #[test]
    fn test_energy_deserialize_clamps() {
        let energy: Energy = serde_json::from_str("140").unwrap();
        assert_eq!(energy.value(), 100);
        let energy: Energy = serde_json::from_str("-3").unwrap();
        assert_eq!(energy.value(), 0);
    }

    #[test]
    fn test_personality_clamps() {
        let traits = PersonalityTraits::new(1.5, -0.2, f32::NAN, 0.4);
        assert_eq!(traits.friendliness, 1.0);
        assert_eq!(traits.helpfulness, 0.0);
        assert_eq!(traits.humor, 0.0);
        assert_eq!(traits.empathy, 0.4);
        assert!(traits.is_within_bounds());
    }

    #[test]
    fn test_edit_personality() {
        let mut state = CompanionState::new(
            Mood::Happy,
            Energy::new(85),
            PersonalityTraits::default(),
            Utc::now(),
        );
        let before = state.clone();

        state.edit_personality(PersonalityTraits {
            friendliness: 2.0,
            helpfulness: 0.5,
            humor: 0.25,
            empathy: -1.0,
        });

        assert_eq!(state.personality, PersonalityTraits::new(1.0, 0.5, 0.25, 0.0));
        assert_eq!(state.mood, before.mood);
        assert_eq!(state.energy, before.energy);
        assert_eq!(state.last_interaction, before.last_interaction);
    }

    #[test]
    fn test_mood_serde_names() {
        for mood in Mood::ALL {
            let json = serde_json::to_string(&mood).unwrap();
            assert_eq!(json, format!("\"{}\"", mood));
        }
    }
}
