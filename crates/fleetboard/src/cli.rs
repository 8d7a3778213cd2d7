//! Clap derive structures for the `fleetboard` CLI.
//!
//! One subcommand per collection, each with the same verbs, plus config
//! and completions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use fleetboard_core::{Locale, MoveDirection, ResourceCategory};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fleetboard -- admin dashboard for the clan site's ordered lists
#[derive(Debug, Parser)]
#[command(
    name = "fleetboard",
    version,
    about = "Manage the clan site's members, games, FAQs and footer links",
    long_about = "Admin command line for the clan website.\n\n\
        Lists, edits and reorders the four admin-ordered collections\n\
        (team members, showcased games, FAQ entries, footer resources)\n\
        stored in the hosted backend.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Project profile to use
    #[arg(long, short = 'p', env = "FLEETBOARD_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Project URL (overrides profile)
    #[arg(long, short = 'u', env = "FLEETBOARD_URL", global = true)]
    pub url: Option<String>,

    /// Project API key
    #[arg(long, env = "FLEETBOARD_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLEETBOARD_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Language for localized columns
    #[arg(long, short = 'l', env = "FLEETBOARD_LANG", global = true)]
    pub lang: Option<Lang>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds
    #[arg(long, env = "FLEETBOARD_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Lang {
    /// Italian
    It,
    /// English
    En,
}

impl From<Lang> for Locale {
    fn from(lang: Lang) -> Self {
        match lang {
            Lang::It => Locale::It,
            Lang::En => Locale::En,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage team members
    #[command(alias = "m")]
    Members(MembersArgs),

    /// Manage showcased games
    #[command(alias = "g")]
    Games(GamesArgs),

    /// Manage FAQ entries
    #[command(alias = "f")]
    Faqs(FaqsArgs),

    /// Manage footer resources (links grouped by category)
    #[command(alias = "r")]
    Resources(ResourcesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Command {
    /// Long-running commands that follow the change feed.
    pub fn is_watch(&self) -> bool {
        matches!(
            self,
            Self::Members(MembersArgs {
                command: MembersCommand::Watch(_)
            }) | Self::Games(GamesArgs {
                command: GamesCommand::Watch(_)
            }) | Self::Faqs(FaqsArgs {
                command: FaqsCommand::Watch(_)
            }) | Self::Resources(ResourcesArgs {
                command: ResourcesCommand::Watch(_)
            })
        )
    }
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Visibility filter for list and watch.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum StatusFilter {
    /// Every row
    #[default]
    All,
    /// Only rows shown on the public site
    Active,
    /// Only hidden rows
    Inactive,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Which rows to show
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,

    /// Show what the public site shows (active rows, read-only view)
    #[arg(long, conflicts_with = "status")]
    pub public: bool,
}

#[derive(Debug, Args)]
pub struct IdArg {
    /// Row id (a unique prefix is enough)
    pub id: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Direction {
    /// One step towards the top
    Up,
    /// One step towards the bottom
    Down,
}

impl From<Direction> for MoveDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => MoveDirection::Up,
            Direction::Down => MoveDirection::Down,
        }
    }
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Row id (a unique prefix is enough)
    pub id: String,

    /// Direction to move
    pub direction: Direction,

    /// Number of single-step moves to make
    #[arg(long, short = 'n', default_value = "1")]
    pub steps: u32,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Row id (a unique prefix is enough)
    pub id: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MEMBERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MembersArgs {
    #[command(subcommand)]
    pub command: MembersCommand,
}

#[derive(Debug, Subcommand)]
pub enum MembersCommand {
    /// List members in display order
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one member
    Get(IdArg),

    /// Add a member at the end of the roster
    Add(MemberAddArgs),

    /// Edit a member's fields (position is never touched)
    Edit {
        /// Member id (a unique prefix is enough)
        id: String,

        #[command(flatten)]
        fields: MemberEditArgs,
    },

    /// Move a member one step up or down
    #[command(alias = "mv")]
    Move(MoveArgs),

    /// Show or hide a member on the public site
    Toggle(IdArg),

    /// Delete a member
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Follow the roster as it changes
    Watch(ListArgs),
}

#[derive(Debug, Args)]
pub struct MemberAddArgs {
    /// Read the member from a JSON file instead of flags
    #[arg(long, short = 'F', conflicts_with_all = ["name", "image", "role", "join_date"])]
    pub from_file: Option<PathBuf>,

    /// Display name
    #[arg(long, required_unless_present = "from_file")]
    pub name: Option<String>,

    /// Portrait URL (imgur links are normalized when shown)
    #[arg(long, required_unless_present = "from_file")]
    pub image: Option<String>,

    /// Role in the team
    #[arg(long, required_unless_present = "from_file")]
    pub role: Option<String>,

    /// Date joined, free text (e.g. "2023-04")
    #[arg(long, required_unless_present = "from_file")]
    pub join_date: Option<String>,

    /// Achievement line (repeatable)
    #[arg(long = "achievement", short = 'a')]
    pub achievements: Vec<String>,

    /// Smogon profile URL
    #[arg(long)]
    pub smogon: Option<String>,

    /// Create hidden from the public site
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Debug, Args)]
pub struct MemberEditArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub image: Option<String>,

    #[arg(long)]
    pub role: Option<String>,

    #[arg(long)]
    pub join_date: Option<String>,

    /// Replace achievements, one per line
    #[arg(long)]
    pub achievements: Option<String>,

    #[arg(long)]
    pub smogon: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GAMES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GamesArgs {
    #[command(subcommand)]
    pub command: GamesCommand,
}

#[derive(Debug, Subcommand)]
pub enum GamesCommand {
    /// List showcased games in display order
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one game
    Get(IdArg),

    /// Add a game at the end of the showcase
    Add(GameAddArgs),

    /// Edit a game's fields (position is never touched)
    Edit {
        /// Game id (a unique prefix is enough)
        id: String,

        #[command(flatten)]
        fields: GameEditArgs,
    },

    /// Move a game one step up or down
    #[command(alias = "mv")]
    Move(MoveArgs),

    /// Delete a game
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Follow the showcase as it changes
    Watch(ListArgs),
}

#[derive(Debug, Args)]
pub struct GameAddArgs {
    /// Read the game from a JSON file instead of flags
    #[arg(long, short = 'F', conflicts_with_all = [
        "tournament", "phase", "format", "players",
        "description_it", "description_en", "image_url", "replay_url",
    ])]
    pub from_file: Option<PathBuf>,

    #[arg(long, required_unless_present = "from_file")]
    pub tournament: Option<String>,

    #[arg(long, required_unless_present = "from_file")]
    pub phase: Option<String>,

    #[arg(long, required_unless_present = "from_file")]
    pub format: Option<String>,

    /// Who played, e.g. "Ash vs Gary"
    #[arg(long, required_unless_present = "from_file")]
    pub players: Option<String>,

    #[arg(long, required_unless_present = "from_file")]
    pub description_it: Option<String>,

    #[arg(long, required_unless_present = "from_file")]
    pub description_en: Option<String>,

    #[arg(long, required_unless_present = "from_file")]
    pub image_url: Option<String>,

    #[arg(long, required_unless_present = "from_file")]
    pub replay_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct GameEditArgs {
    #[arg(long)]
    pub tournament: Option<String>,

    #[arg(long)]
    pub phase: Option<String>,

    #[arg(long)]
    pub format: Option<String>,

    #[arg(long)]
    pub players: Option<String>,

    #[arg(long)]
    pub description_it: Option<String>,

    #[arg(long)]
    pub description_en: Option<String>,

    #[arg(long)]
    pub image_url: Option<String>,

    #[arg(long)]
    pub replay_url: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FAQS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FaqsArgs {
    #[command(subcommand)]
    pub command: FaqsCommand,
}

#[derive(Debug, Subcommand)]
pub enum FaqsCommand {
    /// List FAQ entries in display order
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one FAQ entry
    Get(IdArg),

    /// Add an entry at the end of the FAQ
    Add(FaqAddArgs),

    /// Edit an entry's text (position is never touched)
    Edit {
        /// FAQ id (a unique prefix is enough)
        id: String,

        #[command(flatten)]
        fields: FaqEditArgs,
    },

    /// Move an entry one step up or down
    #[command(alias = "mv")]
    Move(MoveArgs),

    /// Show or hide an entry on the public site
    Toggle(IdArg),

    /// Delete an entry
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Follow the FAQ as it changes
    Watch(ListArgs),
}

#[derive(Debug, Args)]
pub struct FaqAddArgs {
    /// Read the entry from a JSON file instead of flags
    #[arg(long, short = 'F', conflicts_with_all = [
        "question_it", "question_en", "answer_it", "answer_en",
    ])]
    pub from_file: Option<PathBuf>,

    #[arg(long, required_unless_present = "from_file")]
    pub question_it: Option<String>,

    #[arg(long, required_unless_present = "from_file")]
    pub question_en: Option<String>,

    #[arg(long, required_unless_present = "from_file")]
    pub answer_it: Option<String>,

    #[arg(long, required_unless_present = "from_file")]
    pub answer_en: Option<String>,

    /// Create hidden from the public site
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Debug, Args)]
pub struct FaqEditArgs {
    #[arg(long)]
    pub question_it: Option<String>,

    #[arg(long)]
    pub question_en: Option<String>,

    #[arg(long)]
    pub answer_it: Option<String>,

    #[arg(long)]
    pub answer_en: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FOOTER RESOURCES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ResourcesArgs {
    #[command(subcommand)]
    pub command: ResourcesCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Category {
    Links,
    Social,
    Legal,
    Support,
}

impl From<Category> for ResourceCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::Links => ResourceCategory::Links,
            Category::Social => ResourceCategory::Social,
            Category::Legal => ResourceCategory::Legal,
            Category::Support => ResourceCategory::Support,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ResourcesCommand {
    /// List resources, grouped by category
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only this category
        #[arg(long, short = 'c')]
        category: Option<Category>,
    },

    /// Show one resource
    Get(IdArg),

    /// Add a resource at the end of its category
    Add(ResourceAddArgs),

    /// Edit a resource's fields (position is never touched)
    Edit {
        /// Resource id (a unique prefix is enough)
        id: String,

        #[command(flatten)]
        fields: ResourceEditArgs,
    },

    /// Move a resource one step up or down within its category
    #[command(alias = "mv")]
    Move(MoveArgs),

    /// Show or hide a resource on the public site
    Toggle(IdArg),

    /// Delete a resource
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Follow the footer as it changes
    Watch(ListArgs),
}

#[derive(Debug, Args)]
pub struct ResourceAddArgs {
    /// Read the resource from a JSON file instead of flags
    #[arg(long, short = 'F', conflicts_with_all = [
        "title_it", "title_en", "url", "category",
    ])]
    pub from_file: Option<PathBuf>,

    #[arg(long, required_unless_present = "from_file")]
    pub title_it: Option<String>,

    #[arg(long, required_unless_present = "from_file")]
    pub title_en: Option<String>,

    /// Absolute URL or site path starting with '/'
    #[arg(long = "link", required_unless_present = "from_file")]
    pub url: Option<String>,

    /// Icon name
    #[arg(long)]
    pub icon: Option<String>,

    #[arg(long, short = 'c', required_unless_present = "from_file")]
    pub category: Option<Category>,

    /// Create hidden from the public site
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Debug, Args)]
pub struct ResourceEditArgs {
    #[arg(long)]
    pub title_it: Option<String>,

    #[arg(long)]
    pub title_en: Option<String>,

    #[arg(long = "link")]
    pub url: Option<String>,

    #[arg(long)]
    pub icon: Option<String>,

    /// Move to another category (keeps the position value)
    #[arg(long, short = 'c')]
    pub category: Option<Category>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (e.g., "url", "api_key_env", "write_timeout")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the API key or admin access token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,

        /// Store the admin access token instead of the API key
        #[arg(long)]
        access_token: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
