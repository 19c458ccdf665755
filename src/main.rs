#![forbid(unsafe_code)]

//! `rocketchat-tab`: course chat tab backend binary.
//!
//! Loads configuration and credentials, then either serves the launch
//! endpoint for the host platform, runs a single launch, or prints what the
//! chat server knows about a room or user.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use rocketchat_tab::chat::{ChatEndpoints, ChatTransport, HttpChatClient};
use rocketchat_tab::config::GlobalConfig;
use rocketchat_tab::service::{self, ServiceState};
use rocketchat_tab::tab::open_chat_tab;
use rocketchat_tab::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "rocketchat-tab", about = "Course chat tab backend", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the launch endpoint for the host platform.
    Serve {
        /// Override `service.http_port`.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Provision the course room for one user and print the outcome.
    Launch {
        /// Course key, e.g. `course-v1:ORG+NUMBER+TERM`.
        #[arg(long)]
        course_key: String,
        /// Platform username.
        #[arg(long)]
        username: String,
        /// Email address used when the chat account is created.
        #[arg(long, default_value = "")]
        email: String,
        /// Full name used when the chat account is created.
        #[arg(long, default_value = "")]
        display_name: String,
        /// Make the user an owner of the room.
        #[arg(long)]
        staff: bool,
        /// Launch as a visitor who is not enrolled.
        #[arg(long)]
        not_enrolled: bool,
    },

    /// Print the chat server's view of a room or user.
    Inspect {
        #[command(subcommand)]
        target: InspectTarget,
    },
}

#[derive(Debug, Subcommand)]
enum InspectTarget {
    /// `groups.info` for a room name.
    Room {
        /// Room name, e.g. `edx-ORG-NUMBER-TERM`.
        name: String,
    },
    /// `users.info` for a username.
    User {
        /// Username on the chat server.
        username: String,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.apply_env_overrides()?;
    config.load_credentials().await?;
    info!(base_url = %config.chat.base_url, "configuration loaded");

    let client = HttpChatClient::new(&config.chat)?;

    match args.command {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.service.http_port);
            let transport: Arc<dyn ChatTransport> = Arc::new(client);
            let state = ServiceState {
                config: Arc::new(config.chat),
                transport,
            };

            let ct = CancellationToken::new();
            let server_ct = ct.clone();
            let server = tokio::spawn(async move {
                let result = service::serve(port, state, server_ct.clone()).await;
                server_ct.cancel();
                result
            });

            tokio::select! {
                () = shutdown_signal() => {
                    info!("shutdown signal received");
                    ct.cancel();
                }
                () = ct.cancelled() => {}
            }

            server
                .await
                .map_err(|err| AppError::Http(format!("service task failed: {err}")))??;
        }
        Command::Launch {
            course_key,
            username,
            email,
            display_name,
            staff,
            not_enrolled,
        } => {
            let bundle = json!({
                "course": { "key": course_key },
                "user": {
                    "username": username,
                    "email": email,
                    "display_name": display_name,
                    "is_staff": staff,
                    "is_enrolled": !not_enrolled,
                },
            });
            let outcome = open_chat_tab(&bundle, &config.chat, Arc::new(client)).await;
            let rendered = serde_json::to_string_pretty(&outcome)
                .map_err(|err| AppError::Io(format!("failed to render outcome: {err}")))?;
            println!("{rendered}");
        }
        Command::Inspect { target } => {
            let endpoints = ChatEndpoints::new(&config.chat.base_url);
            let url = match target {
                InspectTarget::Room { name } => endpoints.group_info(&name),
                InspectTarget::User { username } => endpoints.user_info(&username.to_lowercase()),
            };
            println!("{}", client.get_pretty(&url).await);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
