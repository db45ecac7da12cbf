pub mod error;
pub mod message;
pub mod state;

pub use error::{MapleError, Result};
pub use message::{Message, MessageKind, MessageLog, Sender};
pub use state::{CompanionState, Energy, Mood, PersonalityTraits};
