//! Chat session controller and transcript.
//!
//! A [`ChatSession`] owns the only mutable state in the system: its
//! transcript. Tools and the agent only ever read it.

mod session;
mod transcript;

pub use session::{ChatError, ChatSession, TurnOutcome, GREETING};
pub use transcript::{ChatRole, Message, Transcript};
