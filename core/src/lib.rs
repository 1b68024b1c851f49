//! Creation of files with exact permission bits.
//!
//! Writing a file and then adjusting its permissions leaves a window in which the file exists with
//! whatever mode it was created with (often world-writable, or whatever the umask allowed). This
//! crate only offers the safe alternative: [write_file] makes the file appear at its path with its
//! final mode and full contents at once.
//!
//! ```
//! # #[cfg(miri)] fn main() {}
//! # #[cfg(not(miri))]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let dir = tempfile::tempdir()?;
//! # let path = dir.path().join("app.conf");
//! use tightfile_core::{Mode, write_file};
//! write_file(&path, Mode::OWNER_WRITE | Mode::OWNER_READ, "verbose = false\n")?;
//! # Ok(())
//! # }
//! ```
//!
//! Permission bits are carried by [Mode], which refuses the world-write bit unless it is asked for
//! explicitly through [Mode::world_writable].

pub mod config;
mod error;
mod mode;
#[cfg(test)]
mod test_util;
mod writer;

pub use config::WriteOptions;
pub use error::{WriteError, WriteErrorKind};
pub use mode::{Mode, ModeError};
pub use writer::{SecureFileWriter, write_default_config, write_file};
