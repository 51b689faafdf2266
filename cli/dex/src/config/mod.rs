use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use dex_catalog::LoaderConfig;
use dex_relay::{DEFAULT_UPSTREAM_URL, RelayConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdg::BaseDirectories;

/// Name of dex managed directories
pub const DEX_DIR_NAME: &str = "dex";
pub const DEX_CONFIG_DIR_VAR: &str = "DEX_CONFIG_DIR";
pub const DEX_CONFIG_FILE: &str = "dex.toml";
const DEX_ENV_PREFIX: &str = "DEX_";

pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";

/// Describes the configuration of the dex CLI and relay
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// Base URL of the relay the explorer commands talk to
    pub relay_url: String,
    /// Base URL of the API the relay forwards to
    pub upstream_url: String,
    /// Address `dex serve` listens on
    pub bind_address: SocketAddr,
    /// Number of entries fetched by the first page of `dex browse`
    pub initial_page_size: NonZeroU32,
    /// Number of entries fetched by every further page of `dex browse`
    pub page_size: NonZeroU32,
    /// Timeout for relay requests
    pub request_timeout_secs: Option<u64>,
    /// Maximum number of concurrently handled relay requests
    pub concurrency_limit: Option<usize>,
    /// Directory where dex loads its configuration file from (default:
    /// `$XDG_CONFIG_HOME/dex`)
    pub config_dir: PathBuf,
}

impl Config {
    /// Creates a [Config] from the environment and config files
    pub fn parse() -> Result<Config> {
        let env_vars = env::vars().collect();
        let raw = Self::raw_config(Path::new("/etc").join(DEX_DIR_NAME), env_vars)?;
        raw.try_deserialize().context("Could not parse config")
    }

    /// Layer defaults, system, user and environment configuration
    ///
    /// Later sources override earlier ones:
    /// defaults < `/etc/dex/dex.toml` < XDG config files
    /// < `$DEX_CONFIG_DIR/dex.toml` < `DEX_*` variables
    fn raw_config(
        system_dir: PathBuf,
        env_vars: HashMap<String, String>,
    ) -> Result<HierarchicalConfig> {
        let dex_dirs = BaseDirectories::with_prefix(DEX_DIR_NAME);

        let config_dir = match env_vars.get(DEX_CONFIG_DIR_VAR) {
            Some(v) => {
                debug!("`${DEX_CONFIG_DIR_VAR}` set: {v}");
                PathBuf::from(v)
            },
            None => {
                let config_dir = dex_dirs
                    .get_config_home()
                    .context("Could not determine config directory, is $HOME set?")?;
                debug!("`${DEX_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
                config_dir
            },
        };

        let defaults = LoaderConfig::default();
        let mut builder = HierarchicalConfig::builder()
            .set_default("relay_url", DEFAULT_RELAY_URL)?
            .set_default("upstream_url", DEFAULT_UPSTREAM_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("initial_page_size", i64::from(defaults.initial_page_size.get()))?
            .set_default("page_size", i64::from(defaults.page_size.get()))?
            // Config dir is added to the config for completeness;
            // the config file cannot change the config dir.
            .set_override("config_dir", config_dir.to_string_lossy().into_owned())?;

        // read from /etc
        builder = builder.add_source(
            config::File::from(system_dir.join(DEX_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        // look for files in XDG_CONFIG_DIRS locations
        for file in dex_dirs.find_config_files(DEX_CONFIG_FILE) {
            builder = builder.add_source(config::File::from(file).format(config::FileFormat::Toml));
        }

        // Add explicit DEX_CONFIG_DIR file last
        builder = builder.add_source(
            config::File::from(config_dir.join(DEX_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        // override via env variables
        let dex_envs = env_vars
            .into_iter()
            .filter(|(k, _)| k != DEX_CONFIG_DIR_VAR)
            .filter_map(|(k, v)| {
                k.strip_prefix(DEX_ENV_PREFIX)
                    .map(|k| (k.to_lowercase(), v))
            })
            .collect::<HashMap<_, _>>();

        let builder = builder.add_source(
            Environment::default()
                .source(Some(dex_envs))
                .try_parsing(true),
        );

        Ok(builder.build()?)
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            initial_page_size: self.initial_page_size,
            page_size: self.page_size,
        }
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            upstream_url: self.upstream_url.clone(),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            concurrency_limit: self.concurrency_limit,
            user_agent: None,
        }
    }
}
