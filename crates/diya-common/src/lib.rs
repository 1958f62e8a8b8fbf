//! # Diya Common
//!
//! Common types shared by the Diya crates:
//! - Color types (HSL fill styles, packed RGB)
//! - Error types for surface, audio and config failures
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod color;
pub mod error;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::color::*;
    pub use crate::error::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warm_hue_is_saturated() {
        let color = Hsl::warm(30.0);
        assert!((color.saturation - 1.0).abs() < f32::EPSILON);
        assert!((color.lightness - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_error_wraps_audio() {
        let err: DiyaError = AudioError::Released.into();
        assert!(matches!(err, DiyaError::Audio(AudioError::Released)));
    }
}
