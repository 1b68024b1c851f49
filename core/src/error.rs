use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type returned by [crate::SecureFileWriter]. When a write fails, the target path is left
/// as it was before the call (absent, or holding the previous file).
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("permission denied creating {}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} cannot be written as a regular file", .path.display())]
    PathConflict {
        path: PathBuf,
        #[source]
        source: Option<io::Error>,
    },
    #[error("I/O error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The variant of a [WriteError], without its data.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum WriteErrorKind {
    PermissionDenied,
    PathConflict,
    Io,
}

impl WriteError {
    /// Sorts an I/O error from writing `path` into the matching variant.
    pub(crate) fn classify(path: &Path, source: io::Error) -> WriteError {
        use ErrorKind::{AlreadyExists, DirectoryNotEmpty, IsADirectory, NotADirectory};
        let path = path.to_path_buf();
        match source.kind() {
            ErrorKind::PermissionDenied => WriteError::PermissionDenied { path, source },
            IsADirectory | NotADirectory | AlreadyExists | DirectoryNotEmpty => {
                WriteError::PathConflict {
                    path,
                    source: Some(source),
                }
            }
            _ => WriteError::Io { path, source },
        }
    }

    /// A conflict detected before any I/O failed (e.g. the target is a directory).
    pub(crate) fn conflict(path: &Path) -> WriteError {
        WriteError::PathConflict {
            path: path.to_path_buf(),
            source: None,
        }
    }

    pub fn kind(&self) -> WriteErrorKind {
        match self {
            WriteError::PermissionDenied { .. } => WriteErrorKind::PermissionDenied,
            WriteError::PathConflict { .. } => WriteErrorKind::PathConflict,
            WriteError::Io { .. } => WriteErrorKind::Io,
        }
    }

    /// The path the failed write targeted.
    pub fn path(&self) -> &Path {
        match self {
            WriteError::PermissionDenied { path, .. }
            | WriteError::PathConflict { path, .. }
            | WriteError::Io { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify() {
        let kind_of = |kind: ErrorKind| WriteError::classify("a/b".as_ref(), kind.into()).kind();
        assert_eq!(kind_of(ErrorKind::PermissionDenied), WriteErrorKind::PermissionDenied);
        assert_eq!(kind_of(ErrorKind::IsADirectory), WriteErrorKind::PathConflict);
        assert_eq!(kind_of(ErrorKind::NotADirectory), WriteErrorKind::PathConflict);
        assert_eq!(kind_of(ErrorKind::DirectoryNotEmpty), WriteErrorKind::PathConflict);
        assert_eq!(kind_of(ErrorKind::NotFound), WriteErrorKind::Io);
        assert_eq!(kind_of(ErrorKind::StorageFull), WriteErrorKind::Io);
        assert_eq!(WriteError::conflict("a/b".as_ref()).path(), Path::new("a/b"));
    }
}
