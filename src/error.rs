//! Error type for settings persistence.
//!
//! Rendering and export failures never leave their pipelines: the renderer
//! turns them into placeholders and exports report them through the status
//! message. What remains fallible at the application level is reading and
//! writing the settings file.

use log::warn;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The platform has no per-user config directory
    NoConfigDir,
    /// The settings file exists but could not be read
    Read { path: PathBuf, source: io::Error },
    /// The settings file or its directory could not be written
    Write { path: PathBuf, source: io::Error },
    /// The settings file is not valid settings JSON
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Settings could not be turned into JSON
    Serialize(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoConfigDir => write!(f, "No configuration directory on this system"),
            Error::Read { path, source } => {
                write!(f, "Cannot read settings '{}': {}", path.display(), source)
            }
            Error::Write { path, source } => {
                write!(f, "Cannot write settings '{}': {}", path.display(), source)
            }
            Error::Parse { path, source } => {
                write!(f, "Settings '{}' are malformed: {}", path.display(), source)
            }
            Error::Serialize(err) => write!(f, "Cannot serialize settings: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NoConfigDir => None,
            Error::Read { source, .. } | Error::Write { source, .. } => Some(source),
            Error::Parse { source, .. } | Error::Serialize(source) => Some(source),
        }
    }
}

/// Fall back to a default on error, leaving a warning in the log.
pub trait ResultExt<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        self.unwrap_or_else(|err| {
            warn!("{}: {}. Using default.", context, err);
            default
        })
    }
}
