//! # fern CLI
//!
//! Command-line interface for the Fern UI framework: scaffolds projects,
//! builds them for native or web targets, serves web builds locally and
//! manages the precompiled web library cache.

mod commands;
mod serve;

use clap::{Parser, Subcommand, ValueEnum};
use fern_core::Platform;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fern")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new Fern project
    New {
        /// Project name (letters, digits, '-' and '_')
        name: String,
    },

    /// Build and run a project or a single source file
    Run {
        /// Target platform
        #[arg(short, long, value_enum, default_value_t = PlatformArg::Native)]
        platform: PlatformArg,

        /// Entry source file (defaults to the current project's lib/main.cpp)
        file: Option<PathBuf>,

        /// Preview server port for web builds (overrides fern.yaml)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Build the current project without running it
    Build {
        /// Target platform
        #[arg(value_enum)]
        platform: PlatformArg,
    },

    /// Manage the precompiled web library cache
    Cache {
        #[command(subcommand)]
        command: Option<CacheCommands>,
    },

    /// Check compilers, toolchains and the framework installation
    Doctor,
}

#[derive(Copy, Clone, ValueEnum)]
pub enum PlatformArg {
    Native,
    Web,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Native => Platform::Native,
            PlatformArg::Web => Platform::Web,
        }
    }
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show cache location, size and freshness (default)
    Status,
    /// Remove the cached web library
    Clear,
    /// Force a rebuild of the cached web library
    Rebuild,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        fail(&err.into());
    }

    // Loaded once; every component takes it by reference.
    let config = fern_core::GlobalConfig::load_or_init();

    let result = match cli.command {
        Commands::New { name } => commands::new_project(&name),
        Commands::Run {
            platform,
            file,
            port,
        } => commands::run(&config, platform.into(), file.as_deref(), port).await,
        Commands::Build { platform } => commands::build_project(&config, platform.into()),
        Commands::Cache { command } => {
            commands::cache(command.unwrap_or(CacheCommands::Status))
        }
        Commands::Doctor => commands::doctor(&config),
    };

    if let Err(err) = result {
        fail(&err);
    }
}

/// Expected failures exit through one status line, matching the glyph
/// style of the success paths, with no backtrace.
fn fail(err: &anyhow::Error) -> ! {
    eprintln!("✗ {err:#}");
    std::process::exit(1);
}
