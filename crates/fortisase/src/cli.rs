//! Clap derive structures for the `fortisase` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fortisase -- plan and apply FortiSASE configuration objects
#[derive(Debug, Parser)]
#[command(
    name = "fortisase",
    version,
    about = "Manage FortiSASE configuration objects from the command line",
    long_about = "Drives the FortiSASE resource API through typed resource definitions.\n\n\
        Resources are addressed as `<type>.<name>` (e.g. `fortisase_network_hosts.web01`)\n\
        and tracked in a local JSON state file.",
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
    /// Tenant profile to use
    #[arg(long, short = 'p', env = "FORTISASE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Portal hostname (overrides profile)
    #[arg(long, short = 'H', env = "FORTISASE_HOSTNAME", global = true)]
    pub hostname: Option<String>,

    /// Pre-issued access token (overrides profile credentials)
    #[arg(long, env = "FORTISASE_ACCESS_TOKEN", global = true, hide_env = true)]
    pub access_token: Option<String>,

    /// Local state file
    #[arg(long, env = "FORTISASE_STATE", global = true)]
    pub state: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FORTISASE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Skip TLS certificate verification
    #[arg(long, short = 'k', env = "FORTISASE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "FORTISASE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect the available resource types
    #[command(alias = "res")]
    Resources(ResourcesArgs),

    /// Check a configuration file against its resource schema
    Validate(ConfigFileArgs),

    /// Show what apply would do, without calling the API
    Plan(ConfigFileArgs),

    /// Create or update a resource from a configuration file
    Apply(ConfigFileArgs),

    /// Re-read tracked resources from the API
    Refresh(RefreshArgs),

    /// Delete a tracked resource
    Destroy(AddressArgs),

    /// Start tracking an existing object
    Import(ImportArgs),

    /// Inspect the local state file
    State(StateArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Resources ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ResourcesArgs {
    #[command(subcommand)]
    pub command: ResourcesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ResourcesCommand {
    /// List resource types
    #[command(alias = "ls")]
    List,

    /// Show the attribute schema of a resource type
    Schema {
        /// Resource type name (e.g. fortisase_network_hosts)
        type_name: String,
    },
}

// ── Lifecycle ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AddressArgs {
    /// Resource address: <type>.<name>
    pub address: String,
}

#[derive(Debug, Args)]
pub struct ConfigFileArgs {
    /// Resource address: <type>.<name>
    pub address: String,

    /// JSON file holding the resource configuration
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Only refresh this address (default: everything tracked)
    pub address: Option<String>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Resource address: <type>.<name>
    pub address: String,

    /// Import id, e.g. `web01` or `outbound-profiles/default`
    pub id: String,
}

// ── State ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommand,
}

#[derive(Debug, Subcommand)]
pub enum StateCommand {
    /// List tracked addresses
    #[command(alias = "ls")]
    List,

    /// Show the recorded state of one address (sensitive values redacted)
    Show(AddressArgs),

    /// Stop tracking an address without touching the API
    #[command(alias = "rm")]
    Remove(AddressArgs),
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Set a profile key (hostname, auth_mode, username, ...)
    Set {
        /// Profile key
        key: String,
        /// New value
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },

    /// Store a secret for a profile in the system keyring
    SetPassword {
        /// Store an access token instead of a password
        #[arg(long)]
        token: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
