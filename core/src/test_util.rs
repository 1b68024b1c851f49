//! Place to put utilities that are only used by tests.

/// Returns a new temporary directory. Unlike the defaults in the `tempdir` and `tempfile` crates,
/// this directory is not world-accessible, so other users cannot observe or interfere with the
/// files a test creates.
#[cfg(not(miri))]
pub fn tempdir() -> std::io::Result<tempfile::TempDir> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;
    tempfile::Builder::new()
        .prefix("tightfile-test")
        .permissions(Permissions::from_mode(0o700))
        .tempdir()
}

/// Returns true if the tests are running with an effective UID of 0. Root ignores directory
/// permissions, so tests of permission failures cannot run as root.
#[cfg(not(miri))]
pub fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}
