use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::args::ServeArgs;
use crate::store::StoreUri;

/// Server configuration, assembled from the config file and the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Store connection string; startup fails without one
    #[serde(default)]
    pub store_uri: Option<String>,

    /// Directory of front-end assets served for unmatched paths
    #[serde(default = "default_static_dir")]
    pub static_dir: Option<PathBuf>,

    /// Path prefix the API is mounted under, empty for the root
    #[serde(default)]
    pub api_prefix: String,
}

fn default_port() -> u16 {
    3001
}

fn default_static_dir() -> Option<PathBuf> {
    Some(PathBuf::from("dist"))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            store_uri: None,
            static_dir: default_static_dir(),
            api_prefix: String::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: ServerConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .context(format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Build the effective configuration for `serve`.
    ///
    /// Command line and environment override the file.
    pub fn from_args(args: &ServeArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(port) = args.port {
            config.port = port;
        }
        if let Some(uri) = &args.store_uri {
            config.store_uri = Some(uri.clone());
        }
        if let Some(dir) = &args.static_dir {
            config.static_dir = Some(dir.clone());
        }
        if args.no_static {
            config.static_dir = None;
        }
        if let Some(prefix) = &args.api_prefix {
            config.api_prefix = prefix.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<()> {
        self.store_uri()?;

        let prefix = &self.api_prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            bail!(
                "API prefix '{}' must start with '/' and must not end with '/'",
                prefix
            );
        }

        Ok(())
    }

    /// The parsed store connection string
    pub fn store_uri(&self) -> Result<StoreUri> {
        let raw = self
            .store_uri
            .as_deref()
            .context("Store connection string missing: set PHONEBOOK_STORE_URI or --store-uri")?;
        Ok(StoreUri::parse(raw)?)
    }

    /// Generate a sample configuration
    pub fn sample() -> Self {
        Self {
            port: default_port(),
            store_uri: Some("sqlite://phonebook.db".to_string()),
            static_dir: default_static_dir(),
            api_prefix: "/api".to_string(),
        }
    }
}
