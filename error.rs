//! Configuration errors.
//!
//! Runtime drawing never fails from the caller's point of view: a missing
//! surface turns every operation into a no-op. Only settings are validated.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// Palette has no entries
    #[error("particle palette is empty")]
    EmptyPalette,

    /// Palette has more entries than the fixed capacity allows
    #[error("particle palette holds at most {0} colours")]
    PaletteFull(usize),

    /// Colour literal is not `#rgb` or `#rrggbb`
    #[error("invalid hex colour")]
    InvalidColor,

    /// A numeric setting is negative, NaN or infinite
    #[error("setting `{0}` must be a finite, non-negative number")]
    InvalidNumber(&'static str),

    /// A distance setting that is used as a divisor is zero
    #[error("setting `{0}` must be greater than zero")]
    ZeroDistance(&'static str),
}

pub type Result<T> = core::result::Result<T, SettingsError>;
