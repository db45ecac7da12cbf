use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{CompanionState, Energy, Mood, PersonalityTraits};

/// Something the user does to the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionAction {
    Play,
    Feed,
    Chat,
    Rest,
}

/// Fixed outcome of one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionEffect {
    pub energy_delta: i16,
    pub mood: Mood,
    pub cue: AnimationCue,
    pub line: &'static str,
}

impl InteractionAction {
    pub const ALL: [InteractionAction; 4] = [
        InteractionAction::Play,
        InteractionAction::Feed,
        InteractionAction::Chat,
        InteractionAction::Rest,
    ];

    pub fn effect(&self) -> ActionEffect {
        match self {
            InteractionAction::Play => ActionEffect {
                energy_delta: -10,
                mood: Mood::Excited,
                cue: AnimationCue::Jump,
                line: "Let's play together! This is so much fun!",
            },
            InteractionAction::Feed => ActionEffect {
                energy_delta: 20,
                mood: Mood::Happy,
                cue: AnimationCue::Happy,
                line: "Yummy! Thank you for the energy boost!",
            },
            InteractionAction::Chat => ActionEffect {
                energy_delta: 0,
                mood: Mood::Thoughtful,
                cue: AnimationCue::Talking,
                line: "I'd love to chat with you. What's on your mind?",
            },
            InteractionAction::Rest => ActionEffect {
                energy_delta: 30,
                mood: Mood::Sleepy,
                cue: AnimationCue::Sleeping,
                line: "A little rest sounds perfect. Sweet dreams!",
            },
        }
    }
}

impl std::fmt::Display for InteractionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionAction::Play => write!(f, "play"),
            InteractionAction::Feed => write!(f, "feed"),
            InteractionAction::Chat => write!(f, "chat"),
            InteractionAction::Rest => write!(f, "rest"),
        }
    }
}

impl std::str::FromStr for InteractionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "play" => Ok(InteractionAction::Play),
            "feed" => Ok(InteractionAction::Feed),
            "chat" => Ok(InteractionAction::Chat),
            "rest" => Ok(InteractionAction::Rest),
            other => Err(format!("unknown action '{}' (expected play, feed, chat or rest)", other)),
        }
    }
}

/// Transient presentation state for the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationCue {
    #[default]
    Idle,
    Happy,
    Jump,
    Talking,
    Sleeping,
}

impl std::fmt::Display for AnimationCue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnimationCue::Idle => write!(f, "idle"),
            AnimationCue::Happy => write!(f, "happy"),
            AnimationCue::Jump => write!(f, "jump"),
            AnimationCue::Talking => write!(f, "talking"),
            AnimationCue::Sleeping => write!(f, "sleeping"),
        }
    }
}

/// What happens to a pending animation reset when a newer interaction arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Every reset fires, even if it clobbers a newer cue.
    #[default]
    FireAndForget,
    /// A new interaction cancels the previous pending reset.
    CancelSuperseded,
}

/// The companion: its state plus the transient avatar flags.
#[derive(Debug, Clone)]
pub struct Companion {
    pub name: String,
    pub avatar: String,
    state: CompanionState,
    cue: AnimationCue,
    is_speaking: bool,
    total_interactions: u32,
}

/// Outcome of one interaction, before and after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionReaction {
    pub action: InteractionAction,
    pub line: &'static str,
    pub cue: AnimationCue,
    pub previous_mood: Mood,
    pub mood: Mood,
    pub previous_energy: Energy,
    pub energy: Energy,
    pub at: DateTime<Utc>,
}

impl Companion {
    pub fn new(name: String, avatar: String, state: CompanionState) -> Self {
        Companion {
            name,
            avatar,
            state,
            cue: AnimationCue::Idle,
            is_speaking: false,
            total_interactions: 0,
        }
    }

    pub fn state(&self) -> &CompanionState {
        &self.state
    }

    pub fn cue(&self) -> AnimationCue {
        self.cue
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    pub fn total_interactions(&self) -> u32 {
        self.total_interactions
    }

    /// Applies the synchronous half of an interaction: timestamp, energy,
    /// mood and cue. Deferred effects are the caller's to schedule.
    pub fn interact(&mut self, action: InteractionAction, now: DateTime<Utc>) -> InteractionReaction {
        let effect = action.effect();
        let previous_mood = self.state.mood;
        let previous_energy = self.state.energy;

        self.state.last_interaction = now;
        self.state.energy = self.state.energy.apply(effect.energy_delta);
        self.state.mood = effect.mood;
        self.cue = effect.cue;
        self.total_interactions += 1;

        InteractionReaction {
            action,
            line: effect.line,
            cue: effect.cue,
            previous_mood,
            mood: self.state.mood,
            previous_energy,
            energy: self.state.energy,
            at: now,
        }
    }

    /// Returns true if the cue actually changed.
    pub fn reset_cue(&mut self) -> bool {
        let changed = self.cue != AnimationCue::Idle;
        self.cue = AnimationCue::Idle;
        changed
    }

    pub fn begin_speaking(&mut self) {
        self.is_speaking = true;
    }

    /// Ends speech. A lingering `talking` cue drops back to idle; returns
    /// true if that happened.
    pub fn finish_speaking(&mut self) -> bool {
        self.is_speaking = false;
        if self.cue == AnimationCue::Talking {
            self.cue = AnimationCue::Idle;
            true
        } else {
            false
        }
    }

    pub fn edit_personality(&mut self, traits: PersonalityTraits) {
        self.state.edit_personality(traits);
    }
}

/// Terminal rendering for reactions and the status card.
pub struct CompanionFormatter;

impl CompanionFormatter {
    pub fn format_reaction(companion: &Companion, reaction: &InteractionReaction) -> String {
        let delta = reaction.energy.value() as i16 - reaction.previous_energy.value() as i16;
        format!(
            "{} {}: \"{}\"\n   mood {} → {} | energy {} ({:+}) | animation {}",
            reaction.mood.emoji(),
            companion.name,
            reaction.line,
            reaction.previous_mood,
            reaction.mood,
            reaction.energy,
            delta,
            reaction.cue,
        )
    }

    /// Status card shown by `maple status` and `/status`.
    pub fn format_status(companion: &Companion, owner: &str, messages: usize) -> String {
        let state = companion.state();
        let traits: Vec<String> = state
            .personality
            .iter()
            .map(|(name, value)| format!("  {:<13} {}", name, Self::format_bar(value, 10)))
            .collect();

        format!(
            r#"
╔══════════════════════════════════════════════╗
║  🍁 {} ({})
╚══════════════════════════════════════════════╝
{} Mood:    {}
⚡ Energy:  {}
🎬 Animation: {}{}
👤 Companion of: {}
💬 Messages: {}  🤝 Interactions: {}
🕐 Last interaction: {}

Personality
{}
"#,
            companion.name,
            companion.avatar,
            state.mood.emoji(),
            state.mood.label(),
            Self::format_energy_bar(state.energy),
            companion.cue(),
            if companion.is_speaking() { " (speaking)" } else { "" },
            owner,
            messages,
            companion.total_interactions(),
            state.last_interaction.format("%Y-%m-%d %H:%M:%S"),
            traits.join("\n"),
        )
    }

    fn format_energy_bar(energy: Energy) -> String {
        Self::format_bar(energy.value() as f32 / Energy::MAX as f32, 10)
    }

    fn format_bar(ratio: f32, width: usize) -> String {
        let filled = ((ratio.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
        format!(
            "{}{} {:.0}%",
            "█".repeat(filled),
            "░".repeat(width - filled),
            ratio * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn companion_with_energy(energy: i64) -> Companion {
        let state = CompanionState::new(
            Mood::Neutral,
            Energy::new(energy),
            PersonalityTraits::default(),
            Utc::now(),
        );
        Companion::new("Maple".to_string(), "robot".to_string(), state)
    }

    #[test]
    fn test_action_table() {
        let expected = [
            (InteractionAction::Play, 40, Mood::Excited, AnimationCue::Jump),
            (InteractionAction::Feed, 70, Mood::Happy, AnimationCue::Happy),
            (InteractionAction::Chat, 50, Mood::Thoughtful, AnimationCue::Talking),
            (InteractionAction::Rest, 80, Mood::Sleepy, AnimationCue::Sleeping),
        ];

        for (action, energy, mood, cue) in expected {
            let mut companion = companion_with_energy(50);
            let reaction = companion.interact(action, Utc::now());
            assert_eq!(companion.state().energy.value(), energy, "{}", action);
            assert_eq!(companion.state().mood, mood, "{}", action);
            assert_eq!(companion.cue(), cue, "{}", action);
            assert_eq!(reaction.line, action.effect().line);
        }
    }

    #[test]
    fn test_feed_saturates() {
        let mut companion = companion_with_energy(85);
        for _ in 0..10 {
            companion.interact(InteractionAction::Feed, Utc::now());
            assert!(companion.state().energy.value() <= 100);
        }
        assert_eq!(companion.state().energy.value(), 100);
    }

    #[test]
    fn test_play_floors() {
        let mut companion = companion_with_energy(25);
        for _ in 0..10 {
            companion.interact(InteractionAction::Play, Utc::now());
        }
        assert_eq!(companion.state().energy.value(), 0);
        assert_eq!(companion.total_interactions(), 10);
    }

    #[test]
    fn test_interact_leaves_personality() {
        let mut companion = companion_with_energy(50);
        let before = companion.state().personality;
        for action in InteractionAction::ALL {
            companion.interact(action, Utc::now());
        }
        assert_eq!(companion.state().personality, before);
    }

    #[test]
    fn test_finish_speaking_only_clears_talking() {
        let mut companion = companion_with_energy(50);
        companion.interact(InteractionAction::Play, Utc::now());
        companion.begin_speaking();
        assert!(!companion.finish_speaking());
        assert_eq!(companion.cue(), AnimationCue::Jump);

        companion.interact(InteractionAction::Chat, Utc::now());
        companion.begin_speaking();
        assert!(companion.finish_speaking());
        assert_eq!(companion.cue(), AnimationCue::Idle);
        assert!(!companion.is_speaking());
    }

    #[test]
    fn test_parse_action() {
        assert_eq!("PLAY".parse::<InteractionAction>(), Ok(InteractionAction::Play));
        assert_eq!(" rest ".parse::<InteractionAction>(), Ok(InteractionAction::Rest));
        assert!("dance".parse::<InteractionAction>().is_err());
    }

    #[test]
    fn test_status_card() {
        let companion = companion_with_energy(60);
        let card = CompanionFormatter::format_status(&companion, "Guest", 3);
        assert!(card.contains("Calm & Ready"));
        assert!(card.contains("██████░░░░ 60%"));
        assert!(card.contains("Guest"));
    }
}
