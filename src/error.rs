use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SubmissionError>;

/// Everything that can go wrong between the remote form API and the files on disk
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// A credential was missing or empty when the client was built
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("request to form API failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx HTTP status
    #[error("form API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// HTTP succeeded but the body carries an error `responseCode`
    #[error("form API reported error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("could not decode form API response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("response is missing expected data: {0}")]
    Malformed(String),

    #[error("could not write '{}': {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write CSV '{}': {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl SubmissionError {
    /// Network or remote-side failure; the caller gets no data for this call
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::Status { .. } | Self::Api { .. } | Self::Decode(_)
        )
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::Csv { .. })
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let status = SubmissionError::Status {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert!(status.is_transport());
        assert!(!status.is_persistence());

        let io = SubmissionError::persistence(
            "/nope/out.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(io.is_persistence());
        assert!(!io.is_transport());
        assert!(io.to_string().contains("/nope/out.json"));

        let config = SubmissionError::InvalidConfiguration("api key is empty".to_string());
        assert!(!config.is_transport());
        assert!(!config.is_persistence());
    }
}
