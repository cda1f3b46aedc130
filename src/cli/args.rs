use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PHONEBOOK: a small contact directory served over HTTP
///
/// Stores people with a name and a phone number and exposes them through a
/// JSON API next to the bundled front-end.
#[derive(Parser, Debug)]
#[command(name = "phonebook")]
#[command(version = "0.1.0")]
#[command(about = "Serve a contact directory over HTTP")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Generate a sample config file
    Init(InitArgs),
}

/// Every option falls back to its environment variable, then to the config
/// file, then to the built-in default.
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Path to a YAML config file
    #[arg(short, long, env = "PHONEBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on (default: 3001)
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Store connection string, e.g. sqlite://phonebook.db or memory:
    #[arg(long, env = "PHONEBOOK_STORE_URI")]
    pub store_uri: Option<String>,

    /// Directory of front-end assets (default: dist)
    #[arg(long, env = "PHONEBOOK_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Disable static asset serving
    #[arg(long, conflicts_with = "static_dir")]
    pub no_static: bool,

    /// Path prefix for the API routes, e.g. /api (default: none)
    #[arg(long, env = "PHONEBOOK_API_PREFIX")]
    pub api_prefix: Option<String>,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output path for the config file
    #[arg(short, long, default_value = "phonebook.yaml")]
    pub output: PathBuf,
}
