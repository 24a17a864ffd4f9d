use std::path::PathBuf;
use thiserror::Error;

/// Boxed failure from a remote store or the S3 API.
pub type RemoteError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can stop a command. None of these are retried.
#[derive(Debug, Error)]
pub enum Error {
    /// A directory or file could not be read
    #[error("unable to read {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Object keys have to be strings
    #[error("path is not valid UTF-8: {0:?}")]
    NonUtf8Path(PathBuf),

    /// The store refused or failed to take an object
    #[error("unable to upload {key:?}: {source}")]
    Upload {
        key: String,
        #[source]
        source: RemoteError,
    },

    /// Bucket creation failed for any reason other than us already owning it
    #[error("unable to create bucket {bucket:?} ({code}): {message}")]
    BucketConflict {
        bucket: String,
        code: String,
        message: String,
    },

    #[error("{operation} failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: RemoteError,
    },

    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Stable identifier for the kind of failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Filesystem { .. } => "FilesystemError",
            Self::NonUtf8Path(_) => "NonUtf8Path",
            Self::Upload { .. } => "UploadError",
            Self::BucketConflict { .. } => "BucketConflict",
            Self::Remote { .. } => "RemoteError",
            Self::Cancelled => "Cancelled",
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn remote(
        operation: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Remote {
            operation,
            source: Box::new(source),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(value: walkdir::Error) -> Self {
        let path = value.path().map(PathBuf::from).unwrap_or_default();
        Self::filesystem(path, value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_the_taxonomy() {
        let fs = Error::filesystem("/nope", std::io::ErrorKind::PermissionDenied.into());
        assert_eq!(fs.code(), "FilesystemError");
        assert!(fs.to_string().contains("/nope"));

        let upload = Error::Upload {
            key: "index.html".into(),
            source: "connection reset".into(),
        };
        assert_eq!(upload.code(), "UploadError");
        assert!(upload.to_string().contains("index.html"));

        assert_eq!(Error::Cancelled.code(), "Cancelled");
    }
}
