//! Configuration options, stored in a TOML file.
//!
//! The file holds a single `[config]` table:
//!
//! ```toml
//! [config]
//! session = "client-server"
//! caching = false
//! classkit = false
//! ```

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::error::Error;

/// Name of the configuration file.
pub const FILE_NAME: &str = "MPh.toml";

/// Names of all options, in file order.
pub const OPTIONS: [&str; 3] = ["session", "caching", "classkit"];

/// How the engine session is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    /// Stand-alone on Windows, client-server elsewhere.
    #[default]
    PlatformDependent,
    StandAlone,
    ClientServer,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::PlatformDependent => "platform-dependent",
            SessionKind::StandAlone => "stand-alone",
            SessionKind::ClientServer => "client-server",
        }
    }
}

impl FromStr for SessionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "platform-dependent" => Ok(SessionKind::PlatformDependent),
            "stand-alone" => Ok(SessionKind::StandAlone),
            "client-server" => Ok(SessionKind::ClientServer),
            other => Err(ConfigError::InvalidValue {
                name: "session".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionKind,
    /// Reuse cached results of earlier sessions.
    #[serde(default)]
    pub caching: bool,
    /// Start the engine with the class kit license.
    #[serde(default)]
    pub classkit: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    config: Config,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid value {value} for option \"{name}\"")]
    InvalidValue { name: String, value: String },
    #[error("no configuration folder on this platform")]
    NoLocation,
}

/// Default folder of the configuration file.
///
/// Inside `AppData` on Windows, `.config` on Linux, and
/// `Application Support` on macOS.
pub fn location() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .map(|folder| folder.join("MPh"))
}

impl Config {
    /// Load options from a file. Options the file leaves out keep their
    /// default value.
    pub fn load(file: &Path) -> Result<Config, ConfigError> {
        debug!("Loading configuration from \"{}\".", file.display());
        let content = fs::read_to_string(file).map_err(|source| ConfigError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let parsed: ConfigFile = toml::from_str(&content)?;
        Ok(parsed.config)
    }

    /// Load from `MPh.toml` in the working directory or in [`location()`],
    /// whichever is found first. Defaults if there is none.
    pub fn discover() -> Result<Config, ConfigError> {
        let mut folders = Vec::new();
        if let Ok(cwd) = env::current_dir() {
            folders.push(cwd);
        }
        if let Some(folder) = location() {
            folders.push(folder);
        }
        Self::discover_in(&folders)
    }

    /// Load from the first of `folders` that holds a configuration file.
    pub fn discover_in(folders: &[PathBuf]) -> Result<Config, ConfigError> {
        for folder in folders {
            let file = folder.join(FILE_NAME);
            if file.is_file() {
                return Self::load(&file);
            }
        }
        debug!("Using default configuration.");
        Ok(Config::default())
    }

    /// Save to `file`, or to `MPh.toml` in [`location()`]. Returns the
    /// file written.
    pub fn save(&self, file: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let file = match file {
            Some(file) => file.to_path_buf(),
            None => location().ok_or(ConfigError::NoLocation)?.join(FILE_NAME),
        };
        let content = toml::to_string_pretty(&ConfigFile {
            config: self.clone(),
        })?;
        let io = |source| ConfigError::Io {
            path: file.clone(),
            source,
        };
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(io)?;
        }
        fs::write(&file, content).map_err(io)?;
        info!("Configuration saved to \"{}\".", file.display());
        Ok(file)
    }

    /// Value of the named option.
    pub fn option(&self, name: &str) -> Result<toml::Value, Error> {
        match name {
            "session" => Ok(toml::Value::String(self.session.to_string())),
            "caching" => Ok(toml::Value::Boolean(self.caching)),
            "classkit" => Ok(toml::Value::Boolean(self.classkit)),
            other => Err(unknown_option(other)),
        }
    }

    /// Set the named option. The value must have the option's type.
    pub fn set_option(&mut self, name: &str, value: toml::Value) -> Result<(), Error> {
        let invalid = || ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        match name {
            "session" => {
                let text = value.as_str().ok_or_else(invalid)?;
                self.session = text.parse()?;
            }
            "caching" => self.caching = value.as_bool().ok_or_else(invalid)?,
            "classkit" => self.classkit = value.as_bool().ok_or_else(invalid)?,
            other => return Err(unknown_option(other)),
        }
        Ok(())
    }
}

fn unknown_option(name: &str) -> Error {
    let message = format!("configuration option \"{name}\" does not exist");
    error!("{message}");
    Error::Lookup(message)
}
