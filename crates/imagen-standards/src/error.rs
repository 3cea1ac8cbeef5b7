#![deny(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StandardsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML registry {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid registry: {message}")]
    InvalidRegistry { message: String },

    #[error("unknown instrument '{name}' (known: {known})")]
    UnknownInstrument { name: String, known: String },

    #[error("unknown label set '{name}' (known: {known})")]
    UnknownLabelSet { name: String, known: String },
}

impl StandardsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRegistry {
            message: message.into(),
        }
    }

    /// Stable error-kind label for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "RegistryIo",
            Self::Toml { .. } => "RegistryParse",
            Self::InvalidRegistry { .. } => "InvalidRegistry",
            Self::UnknownInstrument { .. } => "UnknownInstrument",
            Self::UnknownLabelSet { .. } => "UnknownLabelSet",
        }
    }
}
