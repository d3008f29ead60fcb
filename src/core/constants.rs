//! Shared constants used across the application

/// Endpoint used when neither the command line, the environment nor the
/// config file names one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable that overrides the configured endpoint.
pub const BASE_URL_ENV_VAR: &str = "STREAMCHAT_BASE_URL";

/// Path of the streaming chat route, relative to the base URL.
pub const CHAT_STREAM_PATH: &str = "chat/stream";

/// Prefix for server-reported failures shown in place of the reply.
pub const SERVER_ERROR_PREFIX: &str = "Error: ";

/// Shown in place of the reply when the stream breaks without a structured error.
pub const CONNECTION_ERROR_TEXT: &str = "Sorry, a connection error occurred.";
