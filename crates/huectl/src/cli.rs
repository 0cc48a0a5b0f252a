//! Clap derive structures for the `huectl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Only depends on clap so `build.rs` can include it for man pages.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// huectl -- control Philips Hue lights from the command line
#[derive(Debug, Parser)]
#[command(
    name = "huectl",
    version,
    about = "Control Philips Hue lights from the command line",
    long_about = "Discover and pair with a Hue bridge on the local network, then list,\n\
        switch and color lights and rooms, run light shows, or watch live state.\n\n\
        Talks to the bridge's local REST API; no cloud account is needed.",
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
    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "HUECTL_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept the bridge's self-signed TLS certificate
    #[arg(long, short = 'k', env = "HUECTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "HUECTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Config file to use instead of the platform default
    #[arg(long, env = "HUECTL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Credentials file to use instead of the configured one
    #[arg(long, env = "HUECTL_CREDENTIALS", global = true)]
    pub credentials: Option<PathBuf>,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, env = "HUECTL_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Find bridges on the local network
    Discover(DiscoverArgs),

    /// Pair with a bridge (press its link button first)
    Pair(PairArgs),

    /// List and control individual lights
    #[command(alias = "l")]
    Lights(LightsArgs),

    /// List and control rooms, zones and light groups
    #[command(alias = "g", alias = "rooms")]
    Groups(GroupsArgs),

    /// Bridge identity and connection details
    Bridge(BridgeArgs),

    /// Run the startup light show in a room
    Show(ShowArgs),

    /// Periodically print light state until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and stored credentials
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared write arguments ───────────────────────────────────────────

/// State to apply to a light or group.
#[derive(Debug, Args)]
pub struct StateArgs {
    /// Brightness in percent (0-100)
    #[arg(long, short = 'b', value_parser = clap::value_parser!(u8).range(0..=100))]
    pub brightness: Option<u8>,

    /// Color as a hex triplet
    #[arg(long, short = 'c', value_name = "#RRGGBB", conflicts_with = "kelvin")]
    pub hex: Option<String>,

    /// White color temperature in Kelvin (2000-6500)
    #[arg(long, value_parser = clap::value_parser!(u32).range(2000..=6500))]
    pub kelvin: Option<u32>,

    /// Transition time in milliseconds [default: from config]
    #[arg(long, short = 't')]
    pub transition: Option<u64>,
}

// ── Discover / Pair ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Any address inside the /24 to scan if cloud discovery finds nothing
    #[arg(long)]
    pub network: Option<Ipv4Addr>,
}

#[derive(Debug, Args)]
pub struct PairArgs {
    /// Bridge address (discovered automatically when omitted)
    pub address: Option<Ipv4Addr>,

    /// Seconds to wait for the link button
    #[arg(long, default_value = "30")]
    pub window: u64,

    /// Name this installation registers under on the bridge
    #[arg(long)]
    pub name: Option<String>,
}

// ── Lights ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LightsArgs {
    #[command(subcommand)]
    pub command: LightsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LightsCommand {
    /// List all lights
    #[command(alias = "ls")]
    List {
        /// Skip the cache and read from the bridge
        #[arg(long)]
        fresh: bool,
    },

    /// Show one light
    Get { id: String },

    /// Turn a light on
    On {
        id: String,
        #[command(flatten)]
        state: StateArgs,
    },

    /// Turn a light off
    Off {
        id: String,
        /// Transition time in milliseconds
        #[arg(long, short = 't')]
        transition: Option<u64>,
    },

    /// Change brightness or color without switching on or off
    Set {
        id: String,
        #[command(flatten)]
        state: StateArgs,
    },
}

// ── Groups ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List all groups
    #[command(alias = "ls")]
    List {
        /// Skip the cache and read from the bridge
        #[arg(long)]
        fresh: bool,
    },

    /// Show a group and its lights
    Get {
        /// Group id or (partial) name
        name: String,
    },

    /// Turn every light in a group on
    On {
        name: String,
        #[command(flatten)]
        state: StateArgs,
    },

    /// Turn every light in a group off
    Off {
        name: String,
        /// Transition time in milliseconds
        #[arg(long, short = 't')]
        transition: Option<u64>,
    },

    /// Change brightness or color of a group
    Set {
        name: String,
        #[command(flatten)]
        state: StateArgs,
    },

    /// Color each light in a group from an effect palette
    Effect {
        name: String,

        /// Palette to draw colors from
        #[arg(long, short = 'e', default_value = "random")]
        effect: EffectArg,

        /// Brightness in percent
        #[arg(long, short = 'b', default_value = "80",
              value_parser = clap::value_parser!(u8).range(1..=100))]
        brightness: u8,

        /// Rotate a rainbow across the lights this many times instead
        #[arg(long, conflicts_with = "effect")]
        cycle: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EffectArg {
    Random,
    Rainbow,
    Warm,
    Cool,
    Party,
}

// ── Bridge ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BridgeArgs {
    #[command(subcommand)]
    pub command: BridgeCommand,
}

#[derive(Debug, Subcommand)]
pub enum BridgeCommand {
    /// Bridge name, id, model and firmware
    Info,
}

// ── Show / Watch ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Room to light up [default: the front room]
    pub room: Option<String>,

    /// Length of the pattern phase in seconds [default: from config]
    #[arg(long, short = 'd')]
    pub duration: Option<u64>,

    /// Apply one random effect and exit
    #[arg(long, conflicts_with = "duration")]
    pub quick: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only show lights in this group
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Seconds between refreshes [default: from config]
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many refreshes
    #[arg(long, short = 'n')]
    pub count: Option<u32>,

    /// Read from the bridge on every refresh, ignoring the cache
    #[arg(long)]
    pub fresh: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective settings
    Show,

    /// Print the config file path
    Path,

    /// Write a config file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show where the bridge credential is stored
    Credentials,

    /// Delete the stored bridge credential
    Forget,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
