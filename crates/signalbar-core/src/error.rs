//! Error types shared across signalbar.

use std::path::PathBuf;

use crate::registry::SubscriptionId;

/// Result alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// All errors produced by signalbar-core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// One entry per invalid value found by `Config::validate`.
    #[error("invalid configuration:\n  {}", .0.join("\n  "))]
    ConfigValidation(Vec<String>),

    /// A signal source reported a value the store refuses to hold.
    /// The previously stored value is kept.
    #[error("invalid signal data for {field}")]
    InvalidSignalData { field: &'static str },

    /// An update named a subscription that is not registered.
    #[error("unknown subscription {0}")]
    UnknownSubscription(SubscriptionId),

    /// A resolution pass observed a registry that is not self-consistent.
    #[error("inconsistent cluster state: {0}")]
    InconsistentState(String),

    /// The resolution worker is gone; no further passes will run.
    #[error("resolution worker has stopped")]
    BridgeStopped,
}
