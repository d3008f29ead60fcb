//! Main chat event loop and UI rendering
//!
//! This module contains the main event loop that handles user input, renders the UI,
//! and manages the chat session.

mod event_loop;
mod keybindings;
mod lifecycle;

pub use event_loop::run_chat;
