//! campusbot binary - composition root.
//!
//! 1. Parse the command line and load configuration from TOML
//! 2. Initialize tracing
//! 3. Open the local session store and build the API client
//! 4. Run one command, or the interactive chat loop

mod cli;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use campusbot_chat::{ChatError, ChatService, ChatSession, MessageState};
use campusbot_client::{AdminConsole, ApiClient, Authenticator};
use campusbot_core::config::CampusConfig;
use campusbot_core::session::SessionContext;
use campusbot_core::store::LocalStore;
use campusbot_core::types::Registration;

use cli::{AdminAction, CliArgs, Command};

const STORE_FILE: &str = "state.json";

/// The text to show the user for a failed command.
pub(crate) fn describe(err: &ChatError) -> String {
    match err {
        ChatError::Backend(e) => e.user_message(),
        other => other.to_string(),
    }
}

fn chat_session(api: &ApiClient, ctx: SessionContext, config: &CampusConfig) -> ChatSession {
    ChatSession::new(Arc::new(api.clone()), ctx, config)
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // Config.
    let config_path = args.resolve_config_path();
    let mut config = if config_path.exists() {
        CampusConfig::load_or_default(&config_path)
    } else {
        CampusConfig::default()
    };
    config.api.base_url = args.resolve_api_url(&config.api.base_url);

    // Tracing. Logs go to stderr so answers stay clean on stdout.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting campusbot v{}", env!("CARGO_PKG_VERSION"));
    info!(path = %config_path.display(), api = %config.api.base_url, "Configuration resolved");

    if let Err(e) = run(args, config, config_path).await {
        eprintln!("error: {}", describe(&e));
        std::process::exit(1);
    }
}

async fn run(args: CliArgs, config: CampusConfig, config_path: PathBuf) -> Result<(), ChatError> {
    let data_dir = args.resolve_data_dir(&config.general.data_dir);
    let mut ctx = SessionContext::new(LocalStore::open(data_dir.join(STORE_FILE)));
    let api = ApiClient::new(&config.api)?;

    match args.command {
        Command::Login { email, password } => {
            let session = Authenticator::new(api)
                .login(&mut ctx, &email, &password)
                .await?;
            println!("Signed in as {} ({})", session.display_name, session.role);
        }

        Command::Register {
            name,
            email,
            mobile,
            password,
            security_question,
            answer,
        } => {
            let form = Registration {
                name,
                email,
                mobile,
                password,
                security_question,
                answer,
            };
            match Authenticator::new(api).register(&mut ctx, form).await? {
                Some(session) => println!(
                    "Registration successful. Signed in as {}",
                    session.display_name
                ),
                None => println!("Registration successful. Please log in."),
            }
        }

        Command::Logout => {
            Authenticator::new(api).logout(&mut ctx)?;
            println!("Signed out.");
        }

        Command::Whoami => match ctx.session() {
            Some(s) => println!("{} <{}> ({})", s.display_name, s.user_key, s.role),
            None => println!("{} (not signed in)", ctx.display_name()),
        },

        Command::Ask { quick, question } => {
            let text = question.join(" ");
            let mut session = chat_session(&api, ctx, &config);
            session.load_faq().await;
            let outcome = if quick {
                session.quick_ask(&text).await?
            } else {
                session.send(&text).await?
            };
            println!("{}", outcome.reply.text);
            if let MessageState::Errored { kind, .. } = outcome.state {
                warn!(?kind, "Question was not answered");
            }
        }

        Command::Chat => {
            let session = chat_session(&api, ctx, &config);
            let (handle, task) = ChatService::spawn(session);
            repl::run(handle, &config.chat.quick_access, &config.chat.greeting).await?;
            if let Err(e) = task.await {
                warn!(error = %e, "Chat service task failed");
            }
        }

        Command::History {
            page,
            delete,
            clear,
        } => {
            let session = chat_session(&api, ctx, &config);
            if clear {
                session.clear_history().await?;
                println!("History cleared.");
            } else if let Some(ts) = delete {
                session.delete_history_item(&ts).await?;
                println!("Deleted.");
            } else {
                let records = session.history_listing(page).await?;
                if records.is_empty() {
                    println!("(no history)");
                }
                for r in records {
                    println!("{}  {:<4} {}", r.ts, r.from.as_str(), r.text);
                }
            }
        }

        Command::Status => {
            let session = chat_session(&api, ctx, &config);
            println!("{}", session.ai_status().await);
        }

        Command::Suggestions { prefix, remove } => {
            let mut session = chat_session(&api, ctx, &config);
            if let Some(query) = remove {
                if session.remove_suggestion(&query) {
                    println!("Forgot \"{}\".", query);
                } else {
                    println!("\"{}\" was not remembered.", query);
                }
            } else if let Some(prefix) = prefix {
                for s in session.autocomplete(&prefix) {
                    println!("{}", s);
                }
            } else {
                for s in session.saved_suggestions() {
                    println!("{}", s);
                }
            }
        }

        Command::Admin { action } => {
            let console = AdminConsole::open(api, &ctx)?;
            match action {
                AdminAction::Upload { path, target } => {
                    let receipt = console.upload(&path, target.as_deref()).await?;
                    println!("Uploaded: {}", receipt.files.join(", "));
                }
                AdminAction::Files => {
                    for f in console.list_uploads().await? {
                        println!("{}", f);
                    }
                }
                AdminAction::ToggleAi => {
                    println!("AI allowed: {}", console.toggle_ai().await?);
                }
                AdminAction::Students => {
                    for s in console.students().await? {
                        println!(
                            "{} ({}) - Marks: {}, Notes: {}",
                            s.name,
                            s.email,
                            s.marks.as_deref().unwrap_or("N/A"),
                            s.notes.as_deref().unwrap_or("N/A")
                        );
                    }
                }
                AdminAction::UpdateStudent { email, marks } => {
                    console.update_student(&email, &marks).await?;
                    println!("Updated successfully");
                }
            }
        }

        Command::InitConfig => {
            if config_path.exists() {
                println!("{} already exists", config_path.display());
            } else {
                CampusConfig::default().save(&config_path)?;
                println!("Wrote {}", config_path.display());
            }
        }
    }

    Ok(())
}
