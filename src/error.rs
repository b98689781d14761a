use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Shape or row-count mismatch between inputs.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unsupported latent dimensionality {0} (expected 1, 2 or 3)")]
    UnsupportedDimension(usize),

    #[error("unknown agent type {0:?} (expected \"single\" or \"dual\")")]
    UnknownAgentType(String),

    #[error("no palette registered for label column {0:?}")]
    MissingPalette(String),

    #[error("label table has no label columns")]
    EmptyLabels,

    #[error("no simulator command configured for cache miss")]
    SimulatorUnavailable,

    #[error("simulator exited with {status} for epoch {epoch}: {stderr}")]
    SimulatorFailed {
        epoch: u32,
        status: String,
        stderr: String,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read {}: {source}", path.display())]
    ReadNpy {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    #[error("write {}: {source}", path.display())]
    WriteNpy {
        path: PathBuf,
        #[source]
        source: ndarray_npy::WriteNpyError,
    },

    #[error("plot: {0}")]
    Plot(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn plot(err: impl std::fmt::Display) -> Self {
        Self::Plot(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        assert_eq!(
            Error::UnsupportedDimension(4).to_string(),
            "unsupported latent dimensionality 4 (expected 1, 2 or 3)"
        );
        assert!(Error::UnknownAgentType("triple".into()).to_string().contains("\"triple\""));
        let io = Error::io(
            "/data/a.npy",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(io.to_string(), "/data/a.npy: missing");
    }
}
