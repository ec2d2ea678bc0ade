use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strata_config::ConfigLoader;

mod commands;
mod logging;

/// Strata artifact repository and dependency resolver.
///
/// Resolves transitive dependencies of artifact coordinates
/// (`group:artifact:version[:classifier]`) against a directory store and
/// prints the resulting classpath.
///
/// EXAMPLES:
///     strata resolve org.example:app:1.0          Print the classpath
///     strata deps org.example:app:1.0             Direct dependencies
///     strata exists org.example:app:1.0 g:a:2     Check presence
///     strata put org.example:app:1.0 app.jar      Store an artifact
///
/// ENVIRONMENT VARIABLES:
///     STRATA_STORE_ROOT   Store root directory
///     STRATA_SCOPES       Comma-separated scopes followed during resolution
///     STRATA_MAX_FETCHES  Concurrent manifest fetches per level
///     STRATA_LOG          Log filter (RUST_LOG takes precedence)
///     STRATA_JSON         Set to '1' for JSON output by default
#[derive(Parser)]
#[command(name = "strata")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Store root directory (overrides configuration)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Configuration file to use instead of searching for strata.toml
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve coordinates and print their classpath
    ///
    /// Each line shows the entry's depth, coordinate and store locator, in
    /// classpath order. Version conflicts are reported on stderr.
    ///
    /// EXAMPLES:
    ///     strata resolve org.example:app:1.0
    ///     strata resolve org.example:app:1.0 --scope compile --scope test
    ///     strata resolve org.example:app:1.0 --json
    #[command(visible_alias = "r")]
    Resolve {
        /// Root coordinates
        #[arg(required = true)]
        coordinates: Vec<String>,
        /// Scopes followed past the roots (can be repeated)
        #[arg(long, short = 's')]
        scope: Vec<String>,
        /// Output in JSON format
        #[arg(long, env = "STRATA_JSON")]
        json: bool,
    },

    /// List the direct dependencies declared by a coordinate's manifest
    Deps {
        coordinate: String,
        /// Output in JSON format
        #[arg(long, env = "STRATA_JSON")]
        json: bool,
    },

    /// Check which coordinates have an artifact in the store
    ///
    /// Exits with status 1 when any coordinate is missing.
    Exists {
        #[arg(required = true)]
        coordinates: Vec<String>,
    },

    /// Print the store locator of an artifact
    ///
    /// EXAMPLES:
    ///     strata locate org.example:app:1.0 --kind source
    ///     strata locate org.example:app:1.0 --signature pgp
    Locate {
        coordinate: String,
        /// Artifact kind (jar, source, manifest, metadata, or an extension)
        #[arg(long, short = 'k')]
        kind: Option<String>,
        /// Signature kind (md5, sha1, pgp)
        #[arg(long)]
        signature: Option<String>,
    },

    /// Store a file as an artifact
    ///
    /// Writing a manifest invalidates cached resolutions that include it.
    Put {
        coordinate: String,
        file: PathBuf,
        /// Artifact kind (default: jar)
        #[arg(long, short = 'k')]
        kind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    let config = match &cli.config {
        Some(path) => loader.load_from_file(path),
        None => loader.load_from_directory(&std::env::current_dir()?),
    }
    .context("Failed to load configuration")?;

    logging::init(config.log_filter());

    let context = commands::Context::new(cli.root, config);

    match cli.command {
        Commands::Resolve {
            coordinates,
            scope,
            json,
        } => {
            commands::resolve::run(&context, &coordinates, &scope, json).await?;
        }
        Commands::Deps { coordinate, json } => {
            commands::deps::run(&context, &coordinate, json).await?;
        }
        Commands::Exists { coordinates } => {
            if !commands::exists::run(&context, &coordinates).await? {
                std::process::exit(1);
            }
        }
        Commands::Locate {
            coordinate,
            kind,
            signature,
        } => {
            commands::locate::run(&context, &coordinate, kind.as_deref(), signature.as_deref())
                .await?;
        }
        Commands::Put {
            coordinate,
            file,
            kind,
        } => {
            commands::put::run(&context, &coordinate, &file, kind.as_deref()).await?;
        }
    }

    Ok(())
}
