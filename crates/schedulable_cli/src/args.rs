use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "schedulable")]
#[command(about = "Posts that stay hidden until their scheduled instant", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database file; overrides `database_path` from the config
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Directory holding schedulable.json and logs (default: ./.schedulable)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a post, optionally hidden until <when>
    Add {
        title: String,

        /// Visibility instant (timestamp, date, epoch seconds or +<n>d|h|m|s)
        #[arg(long)]
        at: Option<String>,
    },

    /// List posts visible now
    #[command(alias = "ls")]
    List(ListArgs),

    /// Hide a post until <when>
    Schedule { id: String, when: String },

    /// Make a post visible immediately
    Unschedule { id: String },

    /// Show the visibility state of one post
    Status { id: String },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only posts still waiting for their instant
    #[arg(long, conflicts_with = "with_scheduled")]
    pub only_scheduled: bool,

    /// Every post, scheduled or not
    #[arg(long)]
    pub with_scheduled: bool,
}
