//! Creation of files with exact permissions.
//!
//! The file being written is never visible at its final path until it is complete. Each write:
//! 1. Creates a uniquely-named sibling of the target (same directory, `O_CREAT | O_EXCL`), passing
//!    the requested mode to `open`. The umask may strip bits here, but cannot add any.
//! 2. Sets the sibling's mode to exactly the requested bits through its open descriptor. Since
//!    step 1 could only have removed bits, this never makes the file more permissive than
//!    requested.
//! 3. Writes the content through the descriptor.
//! 4. Renames the sibling over the target.
//!
//! So the target path goes directly from "absent, or the previous file" to "the new file, with its
//! final mode and full contents". Nothing ever runs `chmod` on the target path itself.
//!
//! If anything before the rename fails, dropping the sibling unlinks it and the target is left
//! untouched. Once the rename succeeds the write has succeeded; syncing the parent directory
//! afterwards is best-effort and only logged if it fails.


use crate::config::WriteOptions;
use crate::error::WriteError;
use crate::mode::Mode;
use std::fs::{File, metadata as metadata_of, symlink_metadata};
use std::io::{self, ErrorKind, Write as _};
use std::path::{Component, Path};
use tempfile::Builder;
use tracing::{debug, warn};

/// Writes files with exact, caller-specified permissions. See the module docs for how.
#[derive(Clone, Copy, Debug)]
pub struct SecureFileWriter {
    default_mode: Mode,
    sync: bool,
}

impl Default for SecureFileWriter {
    fn default() -> SecureFileWriter {
        SecureFileWriter::new()
    }
}

impl SecureFileWriter {
    /// Creates a writer with the default options (default mode `0600`, sync enabled).
    pub fn new() -> SecureFileWriter {
        SecureFileWriter::from_options(&WriteOptions::default())
    }

    pub fn from_options(options: &WriteOptions) -> SecureFileWriter {
        SecureFileWriter {
            default_mode: options.default_mode,
            sync: options.sync,
        }
    }

    /// The mode `write_default` uses.
    pub fn default_mode(&self) -> Mode {
        self.default_mode
    }

    /// Creates or replaces the file at `path`, giving it exactly `mode` and `content`. Any previous
    /// contents are discarded.
    pub fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(
        &self,
        path: P,
        mode: Mode,
        content: C,
    ) -> Result<(), WriteError> {
        let content = content.as_ref();
        self.write_inner(path.as_ref(), mode, |file| file.write_all(content))
    }

    /// Like [write_file](SecureFileWriter::write_file), using the writer's default mode.
    pub fn write_default<P: AsRef<Path>, C: AsRef<[u8]>>(
        &self,
        path: P,
        content: C,
    ) -> Result<(), WriteError> {
        self.write_file(path, self.default_mode, content)
    }

    /// Creates or replaces the file at `path` with exactly `mode`, letting `write` produce the
    /// contents. `write` receives the new file before it is visible at `path`. If `write` returns
    /// an error, the target is left unchanged and the error is returned as [WriteError::Io].
    ///
    /// # Example
    /// ```
    /// # use tightfile_core::{Mode, SecureFileWriter};
    /// # use std::io::Write as _;
    /// # #[cfg(miri)] fn main() {}
    /// # #[cfg(not(miri))]
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let dir = tempfile::tempdir()?;
    /// # let path = dir.path().join("app.conf");
    /// let (name, retries) = ("worker", 3);
    /// SecureFileWriter::new().write_with(&path, Mode::OWNER_READ_WRITE, |file| {
    ///     writeln!(file, "name = {name:?}")?;
    ///     writeln!(file, "retries = {retries}")
    /// })?;
    /// # assert_eq!(std::fs::read_to_string(&path)?, "name = \"worker\"\nretries = 3\n");
    /// # Ok(())
    /// # }
    /// ```
    pub fn write_with<P, F>(&self, path: P, mode: Mode, write: F) -> Result<(), WriteError>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        self.write_inner(path.as_ref(), mode, write)
    }

    /// The implementation of [write_with]. The only difference is that `path` is not generic.
    fn write_inner<F>(&self, path: &Path, mode: Mode, write: F) -> Result<(), WriteError>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        let classify = |error| WriteError::classify(path, error);
        let parent = target_dir(path).ok_or_else(|| WriteError::conflict(path))?;
        // Refuse targets that a rename cannot (or should not) replace. A symlink is replaced
        // rather than written through, unless it leads to a directory.
        match symlink_metadata(path) {
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => return Err(classify(error)),
            Ok(metadata) if metadata.is_dir() => return Err(WriteError::conflict(path)),
            Ok(metadata) if metadata.is_symlink() => {
                // Dangling or looping links are replaced like any other link.
                if metadata_of(path).is_ok_and(|target| target.is_dir()) {
                    return Err(WriteError::conflict(path));
                }
            }
            Ok(metadata) if !metadata.is_file() => return Err(WriteError::conflict(path)),
            Ok(_) => {}
        }
        debug!("Writing {} with mode {mode}", path.display());
        // The sibling's name does not depend on the target's, so any name that fits in the
        // directory also leaves room for the sibling.
        let mut sibling = Builder::new()
            .prefix(".tightfile")
            .suffix(".tmp")
            .permissions(mode.permissions())
            .tempfile_in(parent)
            .map_err(classify)?;
        // The umask may have removed bits from the requested mode; restore them.
        sibling
            .as_file()
            .set_permissions(mode.permissions())
            .map_err(classify)?;
        write(sibling.as_file_mut()).map_err(|source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if self.sync {
            sibling.as_file().sync_all().map_err(classify)?;
        }
        // On failure, PersistError hands the sibling back; dropping it unlinks the sibling.
        sibling.persist(path).map_err(|e| classify(e.error))?;
        // The file is in place with its final mode and contents, so nothing after this point is
        // reported as a failure to create it.
        if self.sync {
            sync_dir(parent);
        }
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Creates or replaces the file at `path`, giving it exactly `mode` and `content`, using a
/// [SecureFileWriter] with the default options.
pub fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    mode: Mode,
    content: C,
) -> Result<(), WriteError> {
    SecureFileWriter::new().write_file(path, mode, content)
}

/// Writes a configuration file that only its owner can read or modify (mode `0600`).
pub fn write_default_config<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), WriteError> {
    SecureFileWriter::new().write_file(path, Mode::OWNER_READ_WRITE, content)
}

/// Flushes `dir`'s entries to disk. Best-effort: a directory may be writable without being
/// readable (e.g. mode 0300), in which case it cannot be opened.
fn sync_dir(dir: &Path) {
    if let Err(error) = File::open(dir).and_then(|dir| dir.sync_all()) {
        warn!("Could not sync directory {}: {error}", dir.display());
    }
}

/// Returns the directory the file at `path` lives in. Returns `None` if `path` does not end in a
/// normal component (e.g. `/`, `..`, or an empty path), as those can never name a regular file.
fn target_dir(path: &Path) -> Option<&Path> {
    let Some(Component::Normal(name)) = path.components().next_back() else {
        return None;
    };
    // `components` drops a trailing `/` or `/.`, both of which mean the caller expects a
    // directory.
    if !path.as_os_str().as_encoded_bytes().ends_with(name.as_encoded_bytes()) {
        return None;
    }
    let parent = match path.parent() {
        None => Path::new("."),
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
    };
    Some(parent)
}
