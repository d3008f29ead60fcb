//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod say;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::say::run_say;
use crate::core::config::Config;
use crate::core::constants::BASE_URL_ENV_VAR;
use crate::core::session::Endpoint;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_logging, LogTarget};
use crate::utils::url::normalize_base_url;


#[derive(Parser)]
#[command(name = "streamchat")]
#[command(about = "A terminal chat client for a streaming chat endpoint")]
#[command(
    long_about = "streamchat is a full-screen terminal chat client. Each message is POSTed to \
{base-url}/chat/stream together with the conversation so far, and the reply is shown as it \
streams back over server-sent events.\n\n\
Endpoint selection (first match wins):\n\
  --base-url              Command-line flag\n\
  STREAMCHAT_BASE_URL     Environment variable\n\
  base-url                Value saved with 'streamchat set base-url <URL>'\n\
  http://localhost:8000   Built-in default\n\n\
Controls:\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Up/Down           Scroll through chat history\n\
  PgUp/PgDn         Scroll by a page\n\
  Esc or Ctrl+C     Quit the application\n\n\
Logging:\n\
  RUST_LOG          Log filter (default: info for --log files, warn on stderr)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the chat endpoint
    #[arg(short = 'b', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write diagnostic logs to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one message and print the streamed reply
    Say {
        /// The message to send (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set (base-url, connect-timeout)
        key: String,
        /// Value to set for the key
        value: Option<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset (base-url, connect-timeout)
        key: String,
    },
    /// Print the current configuration
    Config,
}

/// Applies `streamchat set <key> <value>` to `config`.
///
/// Returns the confirmation to print.
pub fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("A value is required for {key}"));
    }

    match key {
        "base-url" => {
            let url = normalize_base_url(value);
            reqwest::Url::parse(&url).map_err(|e| format!("Invalid base URL '{value}': {e}"))?;
            config.base_url = Some(url.clone());
            Ok(format!("✅ Set base-url to: {url}"))
        }
        "connect-timeout" => {
            let secs = value
                .trim_end_matches('s')
                .parse::<u64>()
                .map_err(|_| format!("Invalid connect-timeout '{value}': expected seconds"))?;
            config.connect_timeout_secs = Some(secs);
            Ok(format!("✅ Set connect-timeout to: {secs}s"))
        }
        _ => Err(format!("Unknown config key: {key}")),
    }
}

/// Applies `streamchat unset <key>` to `config`.
pub fn unset_config_value(config: &mut Config, key: &str) -> Result<String, String> {
    match key {
        "base-url" => {
            config.base_url = None;
            Ok("✅ Unset base-url".to_string())
        }
        "connect-timeout" => {
            config.connect_timeout_secs = None;
            Ok("✅ Unset connect-timeout".to_string())
        }
        _ => Err(format!("Unknown config key: {key}")),
    }
}

fn log_target(args: &Args) -> LogTarget<'_> {
    match (&args.log, &args.command) {
        (Some(path), _) => LogTarget::File(path),
        (None, Some(Commands::Say { .. })) => LogTarget::Stderr,
        (None, _) => LogTarget::Disabled,
    }
}

fn resolve_endpoint(config: &Config, cli_base_url: Option<&str>) -> Result<Endpoint, Box<dyn Error>> {
    let base_url = normalize_base_url(&config.effective_base_url(cli_base_url));
    let client = config.build_client()?;
    Ok(Endpoint::with_client(client, base_url))
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(log_target(&args))?;

    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let command = args.command.unwrap_or(Commands::Chat);

    match command {
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let Some(value) = value else {
                config.print_all(&config.effective_base_url(args.base_url.as_deref()));
                return Ok(());
            };
            match set_config_value(&mut config, &key, &value) {
                Ok(message) => {
                    config.save()?;
                    println!("{message}");
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            match unset_config_value(&mut config, &key) {
                Ok(message) => {
                    config.save()?;
                    println!("{message}");
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Config => {
            let config = Config::load()?;
            config.print_all(&config.effective_base_url(args.base_url.as_deref()));
            if args.base_url.is_none() && std::env::var_os(BASE_URL_ENV_VAR).is_some() {
                println!("  ({BASE_URL_ENV_VAR} is set and overrides base-url)");
            }
            Ok(())
        }
        Commands::Say { prompt } => {
            let config = Config::load()?;
            let endpoint = resolve_endpoint(&config, args.base_url.as_deref())?;
            run_say(prompt, endpoint).await
        }
        Commands::Chat => {
            let config = Config::load()?;
            let endpoint = resolve_endpoint(&config, args.base_url.as_deref())?;
            run_chat(endpoint).await
        }
    }
}
