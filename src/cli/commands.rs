use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// `turnwise` - run and inspect conversational turns.
#[derive(Parser, Debug)]
#[command(name = "turnwise")]
#[command(version)]
#[command(about = "Scoped turn state and plan execution for conversational bots.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.turnwise/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Identifies the conversation a command works on.
#[derive(Args, Debug, Clone)]
pub struct ConversationArgs {
    /// Channel id, e.g. "console"
    #[arg(long, default_value = "console")]
    pub channel: String,

    /// Conversation id within the channel
    #[arg(long)]
    pub conversation: String,

    /// User id within the channel
    #[arg(long, default_value = "local-user")]
    pub user: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a plan file and list its commands
    Validate {
        /// JSON plan: a command array or {"type": "plan", "commands": [...]}
        plan: PathBuf,
    },

    /// Run one turn with a recorded plan against the configured storage
    Replay {
        /// Plan file; non-JSON contents are treated as model text
        #[arg(long)]
        plan: PathBuf,

        #[command(flatten)]
        target: ConversationArgs,

        /// Inbound message text
        #[arg(long, default_value = "")]
        text: String,
    },

    /// Inspect or clear persisted state
    State {
        #[command(subcommand)]
        state_command: StateCommands,
    },

    /// Render the persisted conversation history
    History {
        #[command(flatten)]
        target: ConversationArgs,

        /// Budget override (default: history.render_max_chars)
        #[arg(long)]
        max_chars: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// Print the conversation and user layers as JSON
    Show {
        #[command(flatten)]
        target: ConversationArgs,
    },

    /// Delete the conversation layer (and the user layer with --include-user)
    Clear {
        #[command(flatten)]
        target: ConversationArgs,

        #[arg(long)]
        include_user: bool,
    },
}
