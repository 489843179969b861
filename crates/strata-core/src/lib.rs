//! # strata-core
//!
//! Core domain types for the Strata stacked area chart.
//! Implements Strategy pattern for palette generation and tick formatting.

pub mod config;
pub mod error;
pub mod format;
pub mod numfmt;
pub mod palette;
pub mod point;
pub mod viewport;

pub use config::*;
pub use error::*;
pub use format::*;
pub use numfmt::*;
pub use palette::*;
pub use point::*;
pub use viewport::*;

/// Duration of animated axis redraws in milliseconds
pub const ANIMATION_MS: u32 = 500;

// ============================================================================
// COLOR CONSTANTS
// ============================================================================

pub mod colors {
    pub const SERIES_PRIMARY: &str = "#88bb9a";
    pub const SERIES_SECONDARY: &str = "#d9e6df";
    pub const TRANSPARENT: &str = "transparent";
    pub const TOOLTIP_BG: &str = "#ffffff";
    pub const TOOLTIP_LABEL: &str = "#4a4a4a";
    pub const AXIS: &str = "currentColor";

    /// Fill used for the hit rectangle under the pointer
    pub fn hover_fill() -> String {
        black_alpha(0.1)
    }

    pub fn black_alpha(alpha: f64) -> String {
        format!("rgba(0, 0, 0, {})", alpha)
    }

    /// Default palette when no usable base color is configured
    pub fn defaults() -> Vec<String> {
        vec![SERIES_PRIMARY.to_string(), SERIES_SECONDARY.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hover_fill() {
        assert_eq!(colors::hover_fill(), "rgba(0, 0, 0, 0.1)");
    }
}
