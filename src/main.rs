//! Pot logger CLI - store initializer, reading API server, and device bridge.
//!
//! Each role runs as its own process: `potlog init-db` once, then
//! `potlog serve` and `potlog bridge` side by side.
#![forbid(unsafe_code)]

use std::future::Future;
use std::io::{self, IsTerminal};

use clap::Parser;
use console::style;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use potlog::bridge::{self, Bridge, HttpSink};
use potlog::cli::{self, Cli, Commands};
use potlog::config::{self, Settings};
use potlog::device::{self, SerialInstrument};
use potlog::error::{PotError, Result, ResultExt};
use potlog::store::ReadingStore;
use potlog::{api, logging};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> &'static str {
        option_env!("VERGEN_GIT_DIRTY").unwrap_or("false")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();

    if !io::stdout().is_terminal() {
        console::set_colors_enabled(false);
    }
    logging::init_logging(cli.robot, cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        output_error(&cli, &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::InitDb(args) => cmd_init_db(cli, args),
        Commands::Serve(args) => cmd_serve(cli, args),
        Commands::Bridge(args) => cmd_bridge(cli, args),
        Commands::Ports => cmd_ports(cli),
        Commands::Config(args) => cmd_config(cli, args),
        Commands::Version => cmd_version(cli),
        Commands::Completions(args) => cmd_completions(cli, args),
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    config::load_settings(cli.config.as_deref())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_context(|| "Failed to start async runtime")
}

/// Resolves on the first Ctrl-C.
fn interrupt() -> impl Future<Output = ()> + Send + 'static {
    async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received"),
            Err(e) => {
                error!(error = %e, "Could not listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    }
}

// === Roles ===

fn cmd_init_db(cli: &Cli, args: &cli::InitDbArgs) -> Result<()> {
    let mut settings = load_settings(cli)?;
    args.apply(&mut settings);

    let outcome = ReadingStore::initialize(&settings.store.path)?;

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "path": outcome.path.display().to_string(),
                "removed_existing": outcome.removed_existing,
                "ok": true
            }),
        );
    } else if !cli.quiet {
        if outcome.removed_existing {
            println!("Removed old database file: {}", outcome.path.display());
        }
        println!(
            "Database and 'readings' table created successfully at {}",
            outcome.path.display()
        );
    }
    Ok(())
}

fn cmd_serve(cli: &Cli, args: &cli::ServeArgs) -> Result<()> {
    let mut settings = load_settings(cli)?;
    args.apply(&mut settings);
    settings.validate()?;

    let addr = settings.api.bind_addr()?;
    let store = ReadingStore::new(&settings.store.path);
    store.ensure_exists()?;
    info!(readings = store.count()?, path = %store.path().display(), "Opened reading store");

    runtime()?.block_on(api::serve(addr, store, interrupt()))
}

fn cmd_bridge(cli: &Cli, args: &cli::BridgeArgs) -> Result<()> {
    let mut settings = load_settings(cli)?;
    args.apply(&mut settings);
    settings.validate()?;

    let exit = runtime()?.block_on(async {
        let cancel = CancellationToken::new();
        let signal_token = cancel.clone();
        tokio::spawn(async move {
            interrupt().await;
            signal_token.cancel();
        });

        let instrument = SerialInstrument::new(settings.device.connection_options());
        let sink = HttpSink::new(settings.readings_url(), settings.bridge.api_timeout())?;
        let mut bridge = Bridge::new(
            instrument,
            sink,
            settings.device.identity.clone(),
            settings.bridge.interval(),
        );

        bridge::run_bridge(&mut bridge, &cancel).await
    })?;

    if cli.use_json() {
        output_json(cli, &exit);
    } else if !cli.quiet {
        println!(
            "Bridge stopped after {} readings ({} posted, {} skipped)",
            exit.iterations, exit.delivered, exit.skipped
        );
    }
    Ok(())
}

// === Discovery ===

fn cmd_ports(cli: &Cli) -> Result<()> {
    let ports = device::list_ports()?;

    if cli.use_json() {
        output_json(cli, &ports);
    } else if ports.is_empty() {
        println!("No serial ports found");
    } else {
        for port in &ports {
            println!("{}", port.describe());
        }
    }
    Ok(())
}

fn cmd_config(cli: &Cli, args: &cli::ConfigArgs) -> Result<()> {
    if args.path {
        let path = cli.config.clone().or_else(config::default_config_path);
        match path {
            Some(path) => println!("{}", path.display()),
            None => println!("(no config directory on this platform)"),
        }
        return Ok(());
    }

    let settings = load_settings(cli)?;
    if cli.use_json() {
        output_json(cli, &settings);
    } else {
        let text = toml::to_string_pretty(&settings)
            .map_err(|e| PotError::ConfigParse(format!("TOML: {e}")))?;
        print!("{text}");
    }
    Ok(())
}

// === Utilities ===

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_version(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "version": build_info::VERSION,
                "git_sha": build_info::git_sha(),
                "git_dirty": build_info::git_dirty() == "true",
                "build_timestamp": build_info::build_timestamp(),
                "rustc_version": build_info::rustc_semver(),
                "target": build_info::target(),
            }),
        );
    } else {
        println!("potlog {}", build_info::VERSION);
        println!(
            "git: {}{}",
            build_info::git_sha(),
            if build_info::git_dirty() == "true" {
                " (dirty)"
            } else {
                ""
            }
        );
        println!("built: {}", build_info::build_timestamp());
        println!("rustc: {}", build_info::rustc_semver());
        println!("target: {}", build_info::target());
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(_cli: &Cli, args: &cli::CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "potlog", &mut io::stdout());
    Ok(())
}

// === Output ===

fn output_json<T: Serialize>(cli: &Cli, data: &T) {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}

fn output_error(cli: &Cli, error: &PotError) {
    if cli.use_json() {
        let json = serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        });
        eprintln!("{json:#}");
    } else {
        eprintln!("{}: {}", style("Error").red().bold(), error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{}: {}", style("Hint").yellow(), suggestion);
        }
    }
}
