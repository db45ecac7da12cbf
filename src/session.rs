//! The one object a front end talks to.
//!
//! A [`Session`] owns the companion, the chat log, the identity, the random
//! source and the timer queue. Every mutation goes through it on a single
//! thread and is published as a [`SessionEvent`].

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::ChatSession;
use crate::companion::{AnimationCue, Companion, InteractionAction, InteractionReaction, ResetPolicy};
use crate::config::{Config, TimingConfig};
use crate::core::{CompanionState, Energy, Message, PersonalityTraits, Result};
use crate::identity::Identity;
use crate::response::ResponseGenerator;
use crate::scheduler::{EventLoop, Scheduler, TimerHandle};
use crate::speech::{SimulatedSpeech, SpeechOutput};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    CompanionChanged { state: CompanionState },
    CueChanged { cue: AnimationCue },
    SpeakingChanged { speaking: bool },
    Spoke { text: String, success: bool },
    MessageAppended { message: Message },
    TypingChanged { typing: bool },
    IdentityChanged { display_name: String, authenticated: bool },
}

pub struct Session {
    scheduler: Scheduler<Session>,
    origin: DateTime<Utc>,
    timing: TimingConfig,
    reset_policy: ResetPolicy,
    rng: StdRng,
    companion: Companion,
    chat: ChatSession,
    identity: Identity,
    responder: ResponseGenerator,
    speech: Box<dyn SpeechOutput>,
    pending_reset: Option<TimerHandle>,
    events: broadcast::Sender<SessionEvent>,
}

// Manual Debug implementation since trait objects can't derive Debug
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("scheduler", &self.scheduler)
            .field("companion", &self.companion)
            .field("identity", &self.identity)
            .field("messages", &self.chat.total_messages())
            .field("speech", &"Box<dyn SpeechOutput>")
            .finish()
    }
}

impl EventLoop for Session {
    fn scheduler(&mut self) -> &mut Scheduler<Self> {
        &mut self.scheduler
    }
}

impl Session {
    /// Builds a session from `config`, rejecting values the timers cannot use.
    pub fn new(config: &Config) -> Result<Self> {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let speech = SimulatedSpeech::new(config.timing.speech_latency());
        Self::with_parts(config, rng, Box::new(speech), Utc::now())
    }

    /// Full constructor with every collaborator injected.
    pub fn with_parts(
        config: &Config,
        rng: StdRng,
        speech: Box<dyn SpeechOutput>,
        origin: DateTime<Utc>,
    ) -> Result<Self> {
        config.validate()?;
        let companion_config = &config.companion;
        let state = CompanionState::new(
            companion_config.initial_mood,
            Energy::new(companion_config.initial_energy as i64),
            companion_config.personality,
            origin,
        );
        let companion = Companion::new(
            companion_config.name.clone(),
            companion_config.avatar.clone(),
            state,
        );
        let chat = ChatSession::new(&companion_config.name, origin);
        let (events, _) = broadcast::channel(config.event_capacity);

        info!(
            companion = %companion_config.name,
            reset_policy = ?config.reset_policy,
            "Session started"
        );

        Ok(Session {
            scheduler: Scheduler::new(),
            origin,
            timing: config.timing.clone(),
            reset_policy: config.reset_policy,
            rng,
            companion,
            chat,
            identity: Identity::guest(),
            responder: ResponseGenerator::new(),
            speech,
            pending_reset: None,
            events,
        })
    }

    /// Session clock: the start time plus elapsed virtual time. Never goes
    /// backwards.
    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = self.scheduler.now();
        self.origin + TimeDelta::microseconds(elapsed.as_micros().min(i64::MAX as u128) as i64)
    }

    pub fn elapsed(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn companion(&self) -> &Companion {
        &self.companion
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn time_until_next(&mut self) -> Option<Duration> {
        self.scheduler.time_until_next()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn publish_companion(&self) {
        self.publish(SessionEvent::CompanionChanged {
            state: self.companion.state().clone(),
        });
    }

    // --- Companion interactions ---

    /// Applies `action` now and schedules its deferred effects: the spoken
    /// line's completion and the animation reset.
    pub fn interact(&mut self, action: InteractionAction) -> InteractionReaction {
        let now = self.now();
        let reaction = self.companion.interact(action, now);

        info!(
            action = %action,
            mood = %reaction.mood,
            energy = reaction.energy.value(),
            cue = %reaction.cue,
            "Companion interaction"
        );

        self.publish_companion();
        self.publish(SessionEvent::CueChanged { cue: reaction.cue });

        self.speak(reaction.line);

        if self.reset_policy == ResetPolicy::CancelSuperseded {
            if let Some(previous) = self.pending_reset.take() {
                debug!(timer = previous.id(), "Cancelling superseded animation reset");
                previous.cancel();
            }
        }
        let handle = self
            .scheduler
            .schedule(self.timing.animation_reset(), "companion.reset_cue", |s: &mut Session| {
                s.reset_cue()
            });
        self.pending_reset = Some(handle);

        reaction
    }

    fn reset_cue(&mut self) {
        if self.companion.reset_cue() {
            debug!("Animation cue reset to idle");
            self.publish(SessionEvent::CueChanged { cue: AnimationCue::Idle });
        }
    }

    /// Hands `text` to the speech backend and marks the companion as
    /// speaking until the backend's completion fires.
    pub fn speak(&mut self, text: &str) {
        self.companion.begin_speaking();
        self.publish(SessionEvent::SpeakingChanged { speaking: true });

        let job = self.speech.synthesize(text);
        let text = text.to_string();
        self.scheduler
            .schedule(job.latency, "speech.complete", move |s: &mut Session| {
                s.finish_speech(text, job.success)
            });
    }

    fn finish_speech(&mut self, text: String, success: bool) {
        let cue_reset = self.companion.finish_speaking();
        debug!(success, cue_reset, "Speech finished");
        self.publish(SessionEvent::Spoke { text, success });
        self.publish(SessionEvent::SpeakingChanged { speaking: false });
        if cue_reset {
            self.publish(SessionEvent::CueChanged { cue: AnimationCue::Idle });
        }
    }

    pub fn edit_personality(&mut self, traits: PersonalityTraits) {
        self.companion.edit_personality(traits);
        info!(personality = ?self.companion.state().personality, "Personality edited");
        self.publish_companion();
    }

    // --- Chat ---

    /// Appends the user's message and schedules the companion's reply after
    /// a random "thinking" delay. Whitespace-only input is ignored.
    pub fn send_message(&mut self, text: &str) -> Option<Uuid> {
        if text.trim().is_empty() {
            return None;
        }

        let now = self.now();
        let message = self.chat.push_user(text, now).clone();
        let id = message.id;
        self.publish(SessionEvent::MessageAppended { message });

        if self.chat.set_typing(true) {
            self.publish(SessionEvent::TypingChanged { typing: true });
        }

        let delay = self.reply_delay();
        debug!(delay_ms = delay.as_millis() as u64, "Reply scheduled");
        let input = text.to_string();
        self.scheduler
            .schedule(delay, "chat.reply", move |s: &mut Session| s.deliver_reply(&input));

        Some(id)
    }

    fn reply_delay(&mut self) -> Duration {
        let (min, max) = self.timing.reply_delay_bounds();
        Duration::from_secs_f64(self.rng.random_range(min..=max))
    }

    fn deliver_reply(&mut self, input: &str) {
        if self.chat.set_typing(false) {
            self.publish(SessionEvent::TypingChanged { typing: false });
        }
        let reply = self.responder.respond(input, &mut self.rng);
        let now = self.now();
        let message = self.chat.push_companion(reply, now).clone();
        info!(reply = %message.content, "Companion replied");
        self.publish(SessionEvent::MessageAppended { message });
    }

    // --- Identity ---

    pub fn continue_as_guest(&mut self) {
        self.identity.continue_as_guest();
        self.publish_identity();
    }

    /// Mocked login: always succeeds after the configured latency.
    pub fn login(&mut self, email: &str) {
        self.schedule_login(email.to_string(), None);
    }

    pub fn signup(&mut self, email: &str, username: &str) {
        self.schedule_login(email.to_string(), Some(username.to_string()));
    }

    fn schedule_login(&mut self, email: String, username: Option<String>) {
        info!(email = %email, "Login requested");
        self.scheduler
            .schedule(self.timing.login_latency(), "identity.login", move |s: &mut Session| {
                let now = s.now();
                s.identity.complete_login(&email, username.as_deref(), now);
                s.publish_identity();
            });
    }

    pub fn logout(&mut self) {
        self.identity.logout();
        self.publish_identity();
    }

    fn publish_identity(&self) {
        self.publish(SessionEvent::IdentityChanged {
            display_name: self.identity.display_name().to_string(),
            authenticated: self.identity.is_authenticated(),
        });
    }
}
