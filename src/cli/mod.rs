//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the
//! appropriate commands, dispatching into the TUI screens for interactive
//! sessions.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth;
use crate::core::bot::{AvatarUpload, Bot, BotDraft, Privacy};
use crate::core::config::Config;
use crate::core::session::{Session, SessionState};
use crate::ui::chat_loop::{run_chat, ChatOutcome};
use crate::ui::dashboard::{run_dashboard, DashboardOutcome};
use crate::utils::url::resolve_avatar_url;

#[derive(Parser)]
#[command(name = "botline")]
#[command(about = "A terminal client for creating and chatting with bot personas")]
#[command(
    long_about = "Botline is a full-screen terminal client for a bot-persona platform. \
Sign up, create configurable bots, browse the public catalog, and chat with \
them from your terminal.\n\n\
Getting started:\n\
  botline signup    Create an account (email verification via the backend)\n\
  botline login     Store your session identity\n\
  botline           Open the dashboard\n\n\
Controls (dashboard):\n\
  Tab               Switch between My Bots and Public Bots\n\
  Up/Down           Select a bot\n\
  Enter             Chat with the selected bot\n\
  e                 Edit the selected bot (own bots only)\n\
  q                 Quit\n\n\
Controls (chat):\n\
  Type              Enter your message in the input field\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a newline\n\
  Up/Down/Mouse     Scroll through the transcript\n\
  Ctrl+R            Restart the chat (deletes history)\n\
  Ctrl+D            Delete the chat history\n\
  Ctrl+L            Reload the bot profile and history\n\
  Esc               Back to the dashboard"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend origin (overrides the configured server)
    #[arg(short = 's', long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Append tracing output to the given file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Signup,
    /// Log in and store the session identity
    Login,
    /// Forget the stored session identity
    Logout,
    /// Open the dashboard (default)
    Dashboard,
    /// Chat with a bot directly
    Chat {
        /// Bot identifier
        bot_id: String,
    },
    /// List your bots and the public catalog
    Bots,
    /// Create a new bot persona
    CreateBot {
        #[command(flatten)]
        fields: BotFieldArgs,
    },
    /// Update one of your bots
    EditBot {
        /// Bot identifier
        bot_id: String,
        #[command(flatten)]
        fields: BotFieldArgs,
    },
    /// Delete the chat history for a bot
    Restart {
        /// Bot identifier
        bot_id: String,
    },
}

/// Persona fields shared by create and edit. On create, unset fields default
/// to empty; on edit, unset fields keep their current value.
#[derive(ClapArgs)]
pub struct BotFieldArgs {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Short biography shown on the bot card
    #[arg(long)]
    pub bio: Option<String>,

    /// Opening line shown when a chat has no history
    #[arg(long)]
    pub first_message: Option<String>,

    /// Scenario the bot is placed in
    #[arg(long)]
    pub situation: Option<String>,

    /// Backstory fed to the persona
    #[arg(long)]
    pub back_story: Option<String>,

    /// Personality description
    #[arg(long)]
    pub personality: Option<String>,

    /// Chatting style description
    #[arg(long)]
    pub chatting_way: Option<String>,

    /// Category label (e.g. Companion, Tutor)
    #[arg(long = "type", value_name = "TYPE")]
    pub type_of_bot: Option<String>,

    /// Visibility: public or private
    #[arg(long)]
    pub privacy: Option<Privacy>,

    /// Avatar image file to upload
    #[arg(long, value_name = "PATH")]
    pub avatar: Option<PathBuf>,
}

impl clap::ValueEnum for Privacy {
    fn value_variants<'a>() -> &'a [Self] {
        &[Privacy::Public, Privacy::Private]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.log.as_deref())?;

    let config = Config::load()?;
    let server = args
        .server
        .as_deref()
        .unwrap_or_else(|| config.server_url());
    let api = ApiClient::new(server);

    match args.command {
        Some(Commands::Signup) => auth::signup(&api).await,
        Some(Commands::Login) => auth::login(&api).await,
        Some(Commands::Logout) => auth::logout(),
        Some(Commands::Chat { bot_id }) => {
            let session = require_session()?;
            match run_chat(&api, &session, &bot_id).await? {
                ChatOutcome::Back => run_interactive(&api, &session).await,
                ChatOutcome::Quit => Ok(()),
            }
        }
        Some(Commands::Bots) => {
            let session = require_session()?;
            list_bots(&api, &session).await
        }
        Some(Commands::CreateBot { fields }) => {
            let session = require_session()?;
            create_bot(&api, &session, fields).await
        }
        Some(Commands::EditBot { bot_id, fields }) => {
            let session = require_session()?;
            edit_bot(&api, &session, &bot_id, fields).await
        }
        Some(Commands::Restart { bot_id }) => {
            let session = require_session()?;
            restart_history(&api, &session, &bot_id).await
        }
        Some(Commands::Dashboard) | None => {
            let session = require_session()?;
            run_interactive(&api, &session).await
        }
    }
}

fn init_logging(log: Option<&str>) -> Result<(), Box<dyn Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    match log {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Screens that need an identity get it typed; anonymous callers are sent to
/// the login flow instead of hitting the backend with null ids.
fn require_session() -> Result<Session, Box<dyn Error>> {
    match SessionState::load()? {
        SessionState::Authenticated(session) => Ok(session),
        SessionState::Anonymous => {
            Err("Not logged in. Run 'botline login' first (or 'botline signup').".into())
        }
    }
}

/// Dashboard → chat → dashboard until the user quits.
async fn run_interactive(api: &ApiClient, session: &Session) -> Result<(), Box<dyn Error>> {
    loop {
        match run_dashboard(api, session).await? {
            DashboardOutcome::OpenChat(bot) => {
                match run_chat(api, session, &bot.bot_id).await? {
                    ChatOutcome::Back => continue,
                    ChatOutcome::Quit => break,
                }
            }
            DashboardOutcome::EditBot(bot) => {
                println!("To edit '{}', run:", bot.name);
                println!(
                    "  botline edit-bot {} --name \"{}\" [--bio ... --type ... --privacy ...]",
                    bot.bot_id, bot.name
                );
                break;
            }
            DashboardOutcome::Quit => break,
        }
    }
    Ok(())
}

async fn list_bots(api: &ApiClient, session: &Session) -> Result<(), Box<dyn Error>> {
    let (my_bots, public_bots) =
        tokio::join!(api.my_bots(&session.user_id), api.public_bots());
    let my_bots = my_bots?;
    let public_bots = public_bots?;

    println!("My bots ({}):", my_bots.len());
    for bot in &my_bots {
        print_bot_line(api.base_url(), bot);
    }
    if my_bots.is_empty() {
        println!("  (none; create one with 'botline create-bot')");
    }

    println!();
    println!("Public bots ({}):", public_bots.len());
    for bot in &public_bots {
        print_bot_line(api.base_url(), bot);
    }
    if public_bots.is_empty() {
        println!("  (none)");
    }

    Ok(())
}

fn print_bot_line(base_url: &str, bot: &Bot) {
    let avatar = bot
        .avatar
        .as_deref()
        .map(|avatar| format!("  [{}]", resolve_avatar_url(base_url, avatar)))
        .unwrap_or_default();
    println!(
        "  {} - {} ({}, {}){}",
        bot.bot_id,
        bot.name,
        bot.type_of_bot,
        bot.privacy.as_str(),
        avatar
    );
}

async fn create_bot(
    api: &ApiClient,
    session: &Session,
    fields: BotFieldArgs,
) -> Result<(), Box<dyn Error>> {
    let name = fields
        .name
        .clone()
        .ok_or("create-bot requires --name")?;

    let draft = BotDraft {
        name,
        bio: fields.bio.clone().unwrap_or_default(),
        first_message: fields.first_message.clone().unwrap_or_default(),
        situation: fields.situation.clone().unwrap_or_default(),
        back_story: fields.back_story.clone().unwrap_or_default(),
        personality: fields.personality.clone().unwrap_or_default(),
        chatting_way: fields.chatting_way.clone().unwrap_or_default(),
        type_of_bot: fields.type_of_bot.clone().unwrap_or_default(),
        privacy: fields.privacy.unwrap_or_default(),
        avatar: read_avatar(fields.avatar.as_deref())?,
    };

    let ack = api.create_bot(&session.user_id, draft).await?;
    match (ack.bot_id, ack.message) {
        (Some(bot_id), _) => println!("✅ Bot created: {bot_id}"),
        (None, Some(message)) => println!("✅ {message}"),
        (None, None) => println!("✅ Bot created."),
    }
    Ok(())
}

async fn edit_bot(
    api: &ApiClient,
    session: &Session,
    bot_id: &str,
    fields: BotFieldArgs,
) -> Result<(), Box<dyn Error>> {
    // The backend requires every form field on update, so fetch the current
    // record and resubmit it with the overrides applied.
    let cancel = tokio_util::sync::CancellationToken::new();
    let bot = api.bot(bot_id, &cancel).await?;
    let mut draft = BotDraft::from_bot(&bot);

    if let Some(name) = fields.name {
        draft.name = name;
    }
    if let Some(bio) = fields.bio {
        draft.bio = bio;
    }
    if let Some(first_message) = fields.first_message {
        draft.first_message = first_message;
    }
    if let Some(situation) = fields.situation {
        draft.situation = situation;
    }
    if let Some(back_story) = fields.back_story {
        draft.back_story = back_story;
    }
    if let Some(personality) = fields.personality {
        draft.personality = personality;
    }
    if let Some(chatting_way) = fields.chatting_way {
        draft.chatting_way = chatting_way;
    }
    if let Some(type_of_bot) = fields.type_of_bot {
        draft.type_of_bot = type_of_bot;
    }
    if let Some(privacy) = fields.privacy {
        draft.privacy = privacy;
    }
    draft.avatar = read_avatar(fields.avatar.as_deref())?;

    let ack = api.update_bot(bot_id, &session.user_id, draft).await?;
    match ack.message {
        Some(message) => println!("✅ {message}"),
        None => println!("✅ Bot updated."),
    }
    Ok(())
}

fn read_avatar(path: Option<&std::path::Path>) -> Result<Option<AvatarUpload>, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = std::fs::read(path)
        .map_err(|err| format!("Failed to read avatar {}: {err}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| format!("Avatar path {} has no file name", path.display()))?;
    Ok(Some(AvatarUpload { file_name, bytes }))
}

async fn restart_history(
    api: &ApiClient,
    session: &Session,
    bot_id: &str,
) -> Result<(), Box<dyn Error>> {
    if !auth::confirm("Delete the chat history for this bot?")? {
        println!("Cancelled.");
        return Ok(());
    }
    api.restart_history(&session.user_id, bot_id).await?;
    println!("✅ Chat history cleared.");
    Ok(())
}
