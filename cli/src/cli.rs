use std::path::PathBuf;

use clap::{Parser, Subcommand};

use survbot_core::command::Command;
use survbot_core::types::protocol::Event;
use survbot_core::types::session::UserId;

#[derive(Debug, Parser, Clone)]
#[command(name = "survbot")]
#[command(about = "Surveillance bot configuration daemon and client")]
pub struct Cli {
    /// Override the config directory (default: $SURVBOT_CONFIG_DIR or ~/.config/survbot).
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Override the daemon socket path.
    #[arg(long, global = true)]
    pub socket: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum Commands {
    /// Run the daemon in the foreground.
    Daemon,
    /// Ask a running daemon to stop.
    Stop,
    /// Open the configuration menu for a user (`/config`).
    Start {
        #[arg(long)]
        user: i64,
    },
    /// Abort a user's configuration session (`/stop_config`).
    Cancel {
        #[arg(long)]
        user: i64,
    },
    /// Press a button by its action token, e.g. `general` or `edit:timestamp`.
    Press {
        #[arg(long)]
        user: i64,
        token: String,
    },
    /// Send typed text as the user.
    Text {
        #[arg(long)]
        user: i64,
        #[arg(required = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Print one config value.
    Get { name: String },
    /// Print every config value.
    Show,
    /// Interactive console against an in-process engine.
    Chat {
        #[arg(long, default_value_t = 1)]
        user: i64,
    },
}

impl Commands {
    /// The daemon request for this subcommand. `Daemon` and `Chat` run
    /// locally and have none.
    pub fn to_command(&self) -> Option<Command> {
        let event = |event: Event| Some(Command::Event { event });
        match self {
            Commands::Daemon | Commands::Chat { .. } => None,
            Commands::Stop => Some(Command::DaemonStop),
            Commands::Start { user } => event(Event::Start { user: UserId(*user) }),
            Commands::Cancel { user } => event(Event::Cancel { user: UserId(*user) }),
            Commands::Press { user, token } => event(Event::Press {
                user: UserId(*user),
                token: token.clone(),
            }),
            Commands::Text { user, text } => event(Event::Text {
                user: UserId(*user),
                text: text.join(" "),
            }),
            Commands::Get { name } => Some(Command::ConfigGet { name: name.clone() }),
            Commands::Show => Some(Command::ConfigShow),
        }
    }
}
