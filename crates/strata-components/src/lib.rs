//! # strata-components
//!
//! Browser host for the Strata chart engine.
//!
//! ## Modules
//!
//! - `dom` - Replays the scene journal onto SVG elements
//! - `environment` - Container/window measurement and shared resize events
//! - `tooltip` - Floating HTML tooltip
//! - `host` - A mounted chart wired to its listeners
//! - `area_chart` - Leptos component

pub mod area_chart;
pub mod dom;
pub mod environment;
pub mod host;
pub mod tooltip;

pub use area_chart::*;
pub use dom::*;
pub use environment::*;
pub use host::*;
pub use tooltip::*;
