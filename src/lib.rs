//! Companion state and interaction engine for the Maple AI companion.
//!
//! The crate models a simulated companion: a small mood/energy state
//! machine driven by user actions, canned chat replies, and a
//! single-threaded timer queue that defers typing indicators, speech
//! completion and animation resets. Front ends construct one [`Session`]
//! and subscribe to its [`SessionEvent`]s.

pub mod chat;
pub mod companion;
pub mod config;
pub mod core;
pub mod identity;
pub mod response;
pub mod scheduler;
pub mod session;
pub mod speech;

pub use companion::{AnimationCue, Companion, InteractionAction, ResetPolicy};
pub use config::Config;
pub use session::{Session, SessionEvent};
