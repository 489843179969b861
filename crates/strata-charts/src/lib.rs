//! # strata-charts
//!
//! D3.js-style stacked area chart engine.
//! Draws into a retained scene graph that a host mirrors into the DOM.
//!
//! ## Architecture
//!
//! Uses Strategy pattern for:
//! - Scale computation (linear, time)
//! - Curve interpolation (linear, step, monotone, basis)
//! - Collaborators injected into the controller (palette, time labels,
//!   tooltip display, host environment)
//!
//! ## Modules
//!
//! - `chartkit` - Core primitives: scales, curves, paths
//! - `scene` - Retained node tree with keyed data binding
//! - `stack` - Per-series cumulative bands
//! - `layout` - Pixel dimensions and series colors
//! - `scales` - Time and value scales for one pass
//! - `axis` - X/Y axes and tick policies
//! - `area` - Stacked bands, outlines and gap highlights
//! - `interaction` - Hit rectangles, hover highlighting, tooltips
//! - `controller` - The `AreaChart` lifecycle

pub mod area;
pub mod axis;
pub mod chartkit;
pub mod controller;
pub mod interaction;
pub mod layout;
pub mod scales;
pub mod scene;
pub mod stack;

pub use area::*;
pub use axis::*;
pub use chartkit::*;
pub use controller::*;
pub use interaction::*;
pub use layout::*;
pub use scales::*;
pub use scene::*;
pub use stack::*;

// Re-export colors from strata-core for convenience
pub use strata_core::colors;
use strata_core::ChartMargin;

/// Smallest content width/height the pipeline draws with
pub const MIN_CONTENT_SIZE: f64 = 1.0;

/// Chart dimensions with margin handling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartDimensions {
    pub width: f64,
    pub height: f64,
    pub margin: ChartMargin,
}

impl ChartDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            margin: ChartMargin::default(),
        }
    }

    pub fn with_margin(mut self, margin: ChartMargin) -> Self {
        self.margin = margin;
        self
    }

    /// Inner width (excluding margins)
    pub fn inner_width(&self) -> f64 {
        self.width - self.margin.horizontal()
    }

    /// Inner height (excluding margins)
    pub fn inner_height(&self) -> f64 {
        self.height - self.margin.vertical()
    }

    /// SVG transform for inner chart area
    pub fn inner_transform(&self) -> String {
        format!(
            "translate({},{})",
            fmt_num(self.margin.left),
            fmt_num(self.margin.top)
        )
    }

    /// ViewBox string for SVG
    pub fn viewbox(&self) -> String {
        format!("0 0 {} {}", fmt_num(self.width), fmt_num(self.height))
    }
}

impl Default for ChartDimensions {
    fn default() -> Self {
        Self::new(400.0, 300.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let dims = ChartDimensions::new(800.0, 450.0).with_margin(ChartMargin::new(35.0, 30.0, 35.0, 80.0));
        assert_eq!(dims.inner_width(), 690.0);
        assert_eq!(dims.inner_height(), 380.0);
        assert_eq!(dims.inner_transform(), "translate(80,35)");
        assert_eq!(dims.viewbox(), "0 0 800 450");
    }
}
