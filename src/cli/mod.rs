//! CLI argument definitions and command dispatch.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Settings;

/// Pot logger - log potentiometer readings from a serial sensor kit.
///
/// Run `init-db` once, then `serve` and `bridge` as two long-running
/// processes. Robot Mode: use --robot for JSON output and JSON logs.
#[derive(Parser, Debug)]
#[command(name = "potlog", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "POTLOG_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: JSON output and JSON log lines
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (repeat for more detail)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Settings file (.toml, .yaml or .yml)
    #[arg(long, short = 'c', global = true, env = "POTLOG_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Roles ===
    /// Delete and recreate the readings database
    InitDb(InitDbArgs),

    /// Serve the reading store HTTP API
    Serve(ServeArgs),

    /// Poll the instrument and forward readings to the API
    Bridge(BridgeArgs),

    // === Discovery ===
    /// List serial ports visible to this machine
    Ports,

    /// Show the effective configuration
    Config(ConfigArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct InitDbArgs {
    /// Database file (discarded and recreated)
    #[arg(long, env = "POTLOG_DB")]
    pub db: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to listen on, e.g. 0.0.0.0:5000
    #[arg(long, short = 'b')]
    pub bind: Option<String>,

    /// Database file created by `potlog init-db`
    #[arg(long, env = "POTLOG_DB")]
    pub db: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct BridgeArgs {
    /// Serial port of the instrument (see `potlog ports`)
    #[arg(long, short = 'p', env = "POTLOG_PORT")]
    pub port: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    pub baud: Option<u32>,

    /// Base URL of the reading store API
    #[arg(long, env = "POTLOG_API_URL")]
    pub api_url: Option<String>,

    /// Milliseconds between readings
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Only print where the settings file is looked up
    #[arg(long)]
    pub path: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

impl InitDbArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(db) = &self.db {
            settings.store.path.clone_from(db);
        }
    }
}

impl ServeArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(bind) = &self.bind {
            settings.api.bind.clone_from(bind);
        }
        if let Some(db) = &self.db {
            settings.store.path.clone_from(db);
        }
    }
}

impl BridgeArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(port) = &self.port {
            settings.device.port.clone_from(port);
        }
        if let Some(baud) = self.baud {
            settings.device.baud_rate = baud;
        }
        if let Some(url) = &self.api_url {
            settings.bridge.api_url.clone_from(url);
        }
        if let Some(interval) = self.interval_ms {
            settings.bridge.interval_ms = interval;
        }
    }
}
