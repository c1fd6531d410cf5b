//! Client session and interaction layer for floorplan
//!
//! A [`Session`] owns the [`StateStore`] of one connected client for as long
//! as the connection lives. Gestures become proposals through the pure
//! mapping in [`gesture`]; actions that need user input go through a
//! [`Prompter`] instead of blocking dialogs.
//!
//! [`StateStore`]: floorplan_core::StateStore

pub mod gesture;
pub mod interaction;
pub mod prompt;
pub mod session;

pub use gesture::{
    parse_meters, parse_rotation, propose, BoxForm, Gesture, DUPLICATE_OFFSET,
};
pub use interaction::format_meters;
pub use prompt::{PromptOutcome, Prompter, ScriptedPrompter};
pub use session::{ProposalSink, Session};
