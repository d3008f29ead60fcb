//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the interaction loop that feeds key presses to the prompt
//!   and stream messages to the session.
//! - [`renderer`] and [`scroll`]: transcript and prompt composition.
//! - [`input`]: the single-line prompt buffer.
//!
//! This layer presents and captures interaction state, while [`crate::core`]
//! owns the transcript and the streaming state machine.

pub mod chat_loop;
pub mod input;
pub mod renderer;
pub mod scroll;
