use clap::{ Parser, Subcommand };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Backend Args ---
    /// Key-value backend type (memory, file, redis)
    #[arg(long, env = "CHAT_BACKEND_TYPE", default_value = "file")]
    pub backend_type: String,

    /// Backend location: a directory for `file`, a URL for `redis` (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "CHAT_BACKEND_HOST", default_value = ".ai-chat")]
    pub backend_host: String,

    /// Prefix prepended to every Redis key.
    #[arg(long, env = "CHAT_REDIS_PREFIX", default_value = "")]
    pub redis_prefix: String,

    // --- Store Args ---
    /// Base key for the persisted conversation.
    #[arg(long, env = "CHAT_STORAGE_KEY", default_value = "aiChatMessages")]
    pub storage_key: String,

    /// Subscription tier (free, premium)
    #[arg(long, env = "CHAT_TIER", default_value = "free")]
    pub tier: String,

    /// Sends allowed per calendar day on the free tier.
    #[arg(long, env = "CHAT_MAX_DAILY_MESSAGES", default_value = "5")]
    pub max_daily_messages: u32,

    /// Exchanges shown on the free tier.
    #[arg(long, env = "CHAT_MAX_HISTORY_ITEMS", default_value = "10")]
    pub max_history_items: usize,

    /// Optional JSON file with `max_daily_messages` and `max_history_items`. Overrides the two flags above.
    #[arg(long, env = "CHAT_LIMITS_PATH")]
    pub limits_path: Option<String>,

    /// Serialize writes to the backend within this process.
    #[arg(long, env = "CHAT_SERIALIZE_WRITES", default_value = "false")]
    pub serialize_writes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the exchanges visible for the configured tier.
    List {
        /// Emit JSON instead of text.
        #[arg(long, default_value = "false")]
        json: bool,
    },
    /// Record a question and its answer.
    Add {
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
    },
    /// Delete the stored conversation.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long, default_value = "false")]
        yes: bool,
    },
    /// Show today's quota usage without consuming a send.
    Quota,
    /// Consume one send from today's quota.
    Check,
}
