//! Validated permission bits for newly created files.

use serde::Deserialize;
use std::fmt::{self, Display, Formatter};
use std::fs::Permissions;
use std::ops::BitOr;
use std::os::unix::fs::PermissionsExt as _;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Owner/group/other read-write-execute bits for a file.
///
/// A `Mode` is never world-writable unless it was built with [Mode::world_writable]. Every other
/// way of obtaining one ([Mode::new], the named constants, [FromStr], deserialization) rejects the
/// other-write bit.
///
/// # Example
/// ```
/// use tightfile_core::Mode;
/// let mode = Mode::OWNER_WRITE | Mode::OWNER_READ;
/// assert_eq!(mode, Mode::OWNER_READ_WRITE);
/// assert_eq!(mode.to_string(), "0600");
/// assert!(Mode::new(0o666).is_err());
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(try_from = "ModeRepr")]
pub struct Mode(u32);

impl Mode {
    pub const OWNER_READ: Mode = Mode(0o400);
    pub const OWNER_WRITE: Mode = Mode(0o200);
    pub const OWNER_EXECUTE: Mode = Mode(0o100);
    pub const GROUP_READ: Mode = Mode(0o040);
    pub const GROUP_WRITE: Mode = Mode(0o020);
    pub const GROUP_EXECUTE: Mode = Mode(0o010);
    pub const OTHER_READ: Mode = Mode(0o004);
    pub const OTHER_EXECUTE: Mode = Mode(0o001);

    /// Readable and writable by the owner, no other permissions.
    pub const OWNER_READ_WRITE: Mode = Mode(0o600);

    /// Every bit a `Mode` may contain.
    const ALL: u32 = 0o777;
    /// The other-write bit.
    const WORLD_WRITE: u32 = 0o002;

    /// Validates `bits`. Fails if `bits` has anything outside `0o777` set (including the setuid,
    /// setgid, and sticky bits) or if it is world-writable.
    pub fn new(bits: u32) -> Result<Mode, ModeError> {
        let mode = Mode::checked(bits)?;
        if mode.is_world_writable() {
            return Err(ModeError::WorldWritable(mode));
        }
        Ok(mode)
    }

    /// Like [Mode::new], but allows the world-writable bit. Only use this when any user on the
    /// system really should be able to modify the file.
    pub fn world_writable(bits: u32) -> Result<Mode, ModeError> {
        let mode = Mode::checked(bits)?;
        if mode.is_world_writable() {
            warn!("Explicitly requested world-writable mode {mode}");
        }
        Ok(mode)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_world_writable(self) -> bool {
        self.0 & Mode::WORLD_WRITE != 0
    }

    /// Returns true if every bit set in `self` is also set in `other`.
    pub fn is_subset_of(self, other: Mode) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn permissions(self) -> Permissions {
        Permissions::from_mode(self.0)
    }

    fn checked(bits: u32) -> Result<Mode, ModeError> {
        match bits & !Mode::ALL {
            0 => Ok(Mode(bits)),
            _ => Err(ModeError::InvalidBits(bits)),
        }
    }
}

impl BitOr for Mode {
    type Output = Mode;
    fn bitor(self, rhs: Mode) -> Mode {
        Mode(self.0 | rhs.0)
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

impl From<Mode> for u32 {
    fn from(mode: Mode) -> u32 {
        mode.0
    }
}

/// Parses octal text such as `600`, `0600`, or `0o600`.
impl FromStr for Mode {
    type Err = ModeError;
    fn from_str(s: &str) -> Result<Mode, ModeError> {
        let digits = s.trim();
        let digits = digits.strip_prefix("0o").unwrap_or(digits);
        match u32::from_str_radix(digits, 8) {
            Ok(bits) => Mode::new(bits),
            Err(_) => Err(ModeError::Parse(s.to_owned())),
        }
    }
}

// What a mode looks like in a config file: octal text, or the raw bits as an integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum ModeRepr {
    Bits(u32),
    Octal(String),
}

impl TryFrom<ModeRepr> for Mode {
    type Error = ModeError;
    fn try_from(repr: ModeRepr) -> Result<Mode, ModeError> {
        match repr {
            ModeRepr::Bits(bits) => Mode::new(bits),
            ModeRepr::Octal(text) => text.parse(),
        }
    }
}

#[derive(Debug, Error, Eq, Hash, PartialEq)]
pub enum ModeError {
    #[error("{0:#o} is not a combination of owner/group/other read-write-execute bits")]
    InvalidBits(u32),
    #[error("could not parse {0:?} as an octal mode")]
    Parse(String),
    #[error("mode {0} is world-writable")]
    WorldWritable(Mode),
}
