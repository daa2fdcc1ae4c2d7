use clap::{Parser, Subcommand, ValueEnum};
use ganster_client::VoteAction;

#[derive(Parser)]
#[command(name = "ganster")]
#[command(about = "Ask, answer and search questions on GAN-ster", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the API base URL (also read from GANSTER_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new account and log in
    Register,
    /// Log in and remember the session
    Login,
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List recent questions
    Questions {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        /// Only questions carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show a question and its answers
    Show {
        id: String,
    },
    /// Ask a new question
    Ask {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete one of your questions
    Delete {
        id: String,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Answer a question
    Answer {
        question_id: String,
        /// Answer text (prompted for when omitted)
        content: Option<String>,
    },
    /// Ask the server to generate an AI answer for a question
    AiAnswer {
        question_id: String,
    },
    /// Search questions
    Search {
        query: String,
    },
    /// Vote on an answer
    Vote {
        answer_id: String,
        #[arg(value_enum)]
        direction: Vote,
    },
    /// Accept an answer to one of your questions
    Accept {
        answer_id: String,
    },
    /// Delete one of your answers
    DeleteAnswer {
        answer_id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// List your notifications
    Notifications {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Mark a notification as read
    Read {
        notification_id: String,
    },
    /// Mark every notification as read
    ReadAll,
    /// Poll the question list and print new questions as they arrive
    Watch {
        #[arg(long)]
        tag: Option<String>,
        /// Seconds between polls (defaults to the config file value)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Vote {
    Up,
    Down,
    Remove,
}

impl From<Vote> for VoteAction {
    fn from(vote: Vote) -> Self {
        match vote {
            Vote::Up => VoteAction::Upvote,
            Vote::Down => VoteAction::Downvote,
            Vote::Remove => VoteAction::Remove,
        }
    }
}
