//! The run loop's config, read from `haunt.toml`. Every field is optional and a missing file is
//! the same as an empty one.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_CONFIG_PATH: &str = "haunt.toml";

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[display("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// One of `error`, `warn`, `info`, `debug`, or `trace`.
    pub log_level: String,
    /// The number of steps to run before giving up.
    pub max_steps: u64,
    /// Whether to start from the state the boot ROM leaves behind. Otherwise, every register is
    /// zeroed and execution starts at 0x0000.
    pub post_boot: bool,
    /// Log every instruction before it runs.
    pub trace_instructions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            max_steps: 1_000_000,
            post_boot: true,
            trace_instructions: false,
        }
    }
}

impl Config {
    /// Reads the config at the given path. When no path is given, the default path is tried and
    /// its absence is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_owned(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        match std::fs::read_to_string(&path) {
            Ok(data) => Self::parse(&data).map_err(|source| ConfigError::Parse { path, source }),
            Err(_) if !required => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn parse(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }
}
