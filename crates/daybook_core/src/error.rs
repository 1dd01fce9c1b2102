use serde::Serialize;
use thiserror::Error;

/// Message shown to the user whenever the storage root stops granting access.
pub const ACCESS_LOST_BANNER: &str = "Journal folder access lost. Please re-select it.";

/// Unified error type for daybook operations
#[derive(Debug, Error)]
pub enum DaybookError {
    // Storage errors
    #[error("Storage root is missing or no longer grants access")]
    RootInvalid,

    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("The entry for {0} has not been loaded; select the day again before attaching")]
    EntryNotLoaded(chrono::NaiveDate),

    #[error("Could not read attachment source '{source_name}': {source}")]
    SourceUnreadable {
        source_name: String,
        source: std::io::Error,
    },

    // Date errors
    #[error("Invalid date format: '{0}'. Try 'today', 'yesterday', 'last friday', '3 days ago', or 'YYYY-MM-DD'")]
    InvalidDateFormat(String),

    #[error("Invalid month format: '{0}'. Use 'YYYY-MM' or a date such as 'today'")]
    InvalidMonthFormat(String),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Config IO error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias for daybook operations
pub type Result<T> = std::result::Result<T, DaybookError>;

impl DaybookError {
    /// Map an I/O failure on a read path, treating permission loss as a lost root.
    pub fn read(path: impl Into<String>, source: std::io::Error) -> Self {
        if is_access_denied(&source) {
            return DaybookError::RootInvalid;
        }
        DaybookError::ReadFailed {
            path: path.into(),
            source,
        }
    }

    /// Map an I/O failure on a write path, treating permission loss as a lost root.
    pub fn write(path: impl Into<String>, source: std::io::Error) -> Self {
        if is_access_denied(&source) {
            return DaybookError::RootInvalid;
        }
        DaybookError::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// True when the only recovery is re-selecting the storage root.
    pub fn is_root_invalid(&self) -> bool {
        matches!(self, DaybookError::RootInvalid)
    }

    /// The single human-readable message surfaced to the interactive layer.
    pub fn banner(&self) -> String {
        match self {
            DaybookError::RootInvalid => ACCESS_LOST_BANNER.to_string(),
            DaybookError::WriteFailed { .. } => {
                "Could not save this entry. It will be retried on the next edit.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Convert to a serializable representation for front ends
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}

fn is_access_denied(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::PermissionDenied
}

/// A serializable representation of DaybookError
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable banner message
    pub message: String,
    /// Document path involved (if applicable)
    pub path: Option<String>,
}

impl From<&DaybookError> for SerializableError {
    fn from(err: &DaybookError) -> Self {
        let kind = match err {
            DaybookError::RootInvalid => "RootInvalid",
            DaybookError::ReadFailed { .. } => "ReadFailed",
            DaybookError::WriteFailed { .. } => "WriteFailed",
            DaybookError::EntryNotLoaded(_) => "EntryNotLoaded",
            DaybookError::SourceUnreadable { .. } => "SourceUnreadable",
            DaybookError::InvalidDateFormat(_) => "InvalidDateFormat",
            DaybookError::InvalidMonthFormat(_) => "InvalidMonthFormat",
            DaybookError::ConfigParse(_) => "ConfigParse",
            DaybookError::ConfigSerialize(_) => "ConfigSerialize",
            DaybookError::ConfigIo(_) => "ConfigIo",
            DaybookError::NoConfigDir => "NoConfigDir",
        }
        .to_string();

        let path = match err {
            DaybookError::ReadFailed { path, .. } => Some(path.clone()),
            DaybookError::WriteFailed { path, .. } => Some(path.clone()),
            DaybookError::SourceUnreadable { source_name, .. } => Some(source_name.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.banner(),
            path,
        }
    }
}

impl From<DaybookError> for SerializableError {
    fn from(err: DaybookError) -> Self {
        SerializableError::from(&err)
    }
}
