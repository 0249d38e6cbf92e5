//! CLI argument definitions for the campusbot client.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// campusbot - ask the college chatbot from the terminal.
#[derive(Parser, Debug)]
#[command(name = "campusbot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the chatbot server.
    #[arg(short = 'u', long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Directory for the local session store.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Sign in with e-mail and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in with it.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        password: String,
        #[arg(long = "question")]
        security_question: String,
        #[arg(long)]
        answer: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show who is signed in.
    Whoami,
    /// Ask a single question.
    Ask {
        /// Use the lenient quick-access matching.
        #[arg(long)]
        quick: bool,
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Interactive chat.
    Chat,
    /// List, delete, or clear stored chat history.
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Delete the item with this timestamp.
        #[arg(long, conflicts_with = "clear")]
        delete: Option<String>,
        /// Delete the whole history.
        #[arg(long)]
        clear: bool,
    },
    /// Show whether the remote AI fallback is enabled.
    Status,
    /// List remembered queries, or autocomplete a prefix.
    Suggestions {
        prefix: Option<String>,
        /// Forget a remembered query.
        #[arg(long)]
        remove: Option<String>,
    },
    /// Admin console.
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Write the default configuration file if none exists.
    InitConfig,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum AdminAction {
    /// Upload a file into the knowledge base.
    Upload {
        path: PathBuf,
        #[arg(long)]
        target: Option<String>,
    },
    /// List uploaded files.
    Files,
    /// Flip the external AI switch.
    ToggleAi,
    /// List registered students.
    Students,
    /// Set a student's marks.
    UpdateStudent {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        marks: String,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CAMPUSBOT_CONFIG env var > ~/.campusbot/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CAMPUSBOT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the server base URL.
    ///
    /// Priority: --api-url flag > CAMPUSBOT_API_URL env var > config file value.
    pub fn resolve_api_url(&self, config_url: &str) -> String {
        if let Some(ref url) = self.api_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var("CAMPUSBOT_API_URL") {
            if !url.trim().is_empty() {
                return url;
            }
        }
        config_url.to_string()
    }

    /// Resolve the data directory.
    ///
    /// Priority: --data-dir flag > config file value (with `~` expanded).
    pub fn resolve_data_dir(&self, config_dir: &str) -> PathBuf {
        match self.data_dir {
            Some(ref p) => p.clone(),
            None => expand_home(config_dir),
        }
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value. `RUST_LOG` still
    /// overrides both when the subscriber is built.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") || path.starts_with("~\\") {
        if let Some(home) = home_dir() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".campusbot").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}
