//! Scale-factor arithmetic.
//!
//! A scale factor is a non-zero signed integer. Negative values shrink an
//! image by `|scale|`; positive values grow it by `1/scale` of its size:
//!
//! ```text
//! scale < 0:  new = original / -scale
//! scale > 0:  new = original + original / scale
//! ```
//!
//! Width and height go through the same formula with the same factor, which
//! is what keeps the aspect ratio (up to integer truncation).

use std::fmt;
use std::num::NonZeroI32;

use crate::error::ConfigError;

/// A validated, non-zero scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactor(NonZeroI32);

impl ScaleFactor {
    /// Validate a raw factor. Zero is rejected.
    pub fn new(value: i32) -> Result<Self, ConfigError> {
        NonZeroI32::new(value).map(Self).ok_or_else(|| {
            ConfigError::ValidationError(
                "scale must be non-zero (negative shrinks, positive grows)".into(),
            )
        })
    }

    pub fn get(self) -> i32 {
        self.0.get()
    }

    /// New `(width, height)` for an image.
    pub fn apply_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        target_dimensions(width, height, self)
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Compute one target dimension.
///
/// Integer division truncates toward zero; a shrink factor larger than the
/// dimension yields 0, which callers must treat as an error.
pub fn new_dimension(original: u32, scale: ScaleFactor) -> u32 {
    let original = i64::from(original);
    let scale = i64::from(scale.get());
    let new = if scale < 0 {
        original / -scale
    } else {
        original + original / scale
    };
    u32::try_from(new).unwrap_or(u32::MAX)
}

/// Compute target `(width, height)` with the same factor on both axes.
pub fn target_dimensions(width: u32, height: u32, scale: ScaleFactor) -> (u32, u32) {
    (new_dimension(width, scale), new_dimension(height, scale))
}
