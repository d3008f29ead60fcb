//! streamchat is a terminal chat client for a streaming chat endpoint.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the transcript, the server-sent event decoder, the stream
//!   transport, and the [`core::session::StreamSession`] state machine that
//!   folds stream messages into the transcript.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`api`] defines the request and event payloads exchanged with the
//!   endpoint.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions and [`cli::say`] for one-shot messages.

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
