pub mod app;
pub mod chat_stream;
pub mod config;
pub mod constants;
pub mod message;
pub mod session;
pub mod sse;
pub mod transcript;
