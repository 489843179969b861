//! Pixel dimensions and per-series colors for one render pass

use strata_core::{AreaConfig, ChartConfig, PaletteGenerator, Viewport};
use tracing::{debug, warn};

use crate::{colors, ChartDimensions, MIN_CONTENT_SIZE};

/// Result of the layout pass
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Outer size and effective margins (axis width applied)
    pub dims: ChartDimensions,
    pub chart_width: f64,
    pub chart_height: f64,
    /// Colors aligned with `area.keys`
    pub keys: Vec<String>,
    pub colors: Vec<String>,
}

impl Layout {
    pub fn color_for(&self, key: &str) -> Option<&str> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|i| self.colors.get(i))
            .map(String::as_str)
    }
}

/// Aspect ratio of the first breakpoint wide enough for the viewport, else the
/// configured default
pub fn aspect_ratio(config: &ChartConfig, viewport_width: f64) -> f64 {
    config
        .container
        .breakpoints
        .iter()
        .find(|bp| bp.screen_width >= viewport_width)
        .map(|bp| bp.aspect_ratio)
        .unwrap_or(config.container.default_aspect_ratio)
}

/// Compute dimensions from the container and viewport. The config itself is
/// never modified.
pub fn compute_layout(config: &ChartConfig, viewport: &Viewport, palette: &dyn PaletteGenerator) -> Layout {
    let width = if viewport.container_width > 0.0 {
        viewport.container_width
    } else {
        config.width
    };

    let ratio = aspect_ratio(config, viewport.viewport_width);
    let height = if ratio > 0.0 { width * ratio } else { config.height };

    let dims = ChartDimensions::new(width, height).with_margin(config.effective_margin());

    let mut chart_width = dims.inner_width();
    if chart_width < MIN_CONTENT_SIZE {
        warn!(width, chart_width, "content width too small, clamping");
        chart_width = MIN_CONTENT_SIZE;
    }
    let mut chart_height = dims.inner_height();
    if chart_height < MIN_CONTENT_SIZE {
        warn!(height, chart_height, "content height too small, clamping");
        chart_height = MIN_CONTENT_SIZE;
    }

    debug!(width, height, chart_width, chart_height, ratio, "layout computed");

    Layout {
        dims,
        chart_width,
        chart_height,
        keys: config.area.keys.clone(),
        colors: series_colors(&config.area, palette),
    }
}

/// One color per key: explicit colors when they cover every key, else a
/// palette generated from the base color, else the built-in defaults.
pub fn series_colors(area: &AreaConfig, palette: &dyn PaletteGenerator) -> Vec<String> {
    let n = area.keys.len();

    if let Some(explicit) = &area.colors {
        if explicit.len() >= n {
            return explicit[..n].to_vec();
        }
        debug!(colors = explicit.len(), keys = n, "explicit colors do not cover all keys");
    }

    if let Some(base) = &area.base_color {
        match palette.generate(base, n) {
            Ok(generated) if generated.len() >= n => return generated[..n].to_vec(),
            Ok(generated) => {
                warn!(generated = generated.len(), keys = n, "palette returned too few colors")
            }
            Err(err) => warn!(%err, "palette generation failed, using default colors"),
        }
    }

    colors::defaults().into_iter().cycle().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{AxisPosition, BrighterPalette, Breakpoint, ChartMargin};

    fn config() -> ChartConfig {
        ChartConfig::default()
            .with_margin(ChartMargin::new(10.0, 20.0, 30.0, 40.0))
            .with_breakpoints(vec![Breakpoint::new(575.0, 0.75), Breakpoint::new(900.0, 0.6)])
            .with_aspect_ratio(0.5)
    }

    #[test]
    fn test_width_from_container_or_config() {
        let cfg = config();
        let measured = compute_layout(&cfg, &Viewport::new(800.0, 1280.0), &BrighterPalette);
        assert_eq!(measured.dims.width, 800.0);
        assert_eq!(measured.dims.height, 400.0);

        let fallback = compute_layout(&cfg, &Viewport::new(0.0, 1280.0), &BrighterPalette);
        assert_eq!(fallback.dims.width, 400.0);
        assert_eq!(fallback.dims.height, 200.0);
    }

    #[test]
    fn test_first_matching_breakpoint_wins() {
        let cfg = config();
        assert_eq!(aspect_ratio(&cfg, 500.0), 0.75);
        assert_eq!(aspect_ratio(&cfg, 575.0), 0.75);
        assert_eq!(aspect_ratio(&cfg, 700.0), 0.6);
        assert_eq!(aspect_ratio(&cfg, 1200.0), 0.5);
    }

    #[test]
    fn test_zero_ratio_keeps_configured_height() {
        let cfg = config().with_aspect_ratio(0.0).with_breakpoints(vec![]);
        let layout = compute_layout(&cfg, &Viewport::new(600.0, 1280.0), &BrighterPalette);
        assert_eq!(layout.dims.height, 300.0);
        assert_eq!(layout.chart_height, 260.0);
    }

    #[test]
    fn test_axis_width_replaces_margin() {
        let mut cfg = config();
        cfg.y_axis.width = Some(60.0);
        let left = compute_layout(&cfg, &Viewport::new(800.0, 1280.0), &BrighterPalette);
        assert_eq!(left.dims.margin.left, 60.0);
        assert_eq!(left.chart_width, 720.0);
        assert_eq!(cfg.margin.left, 40.0);

        cfg.y_axis.position = AxisPosition::Right;
        let right = compute_layout(&cfg, &Viewport::new(800.0, 1280.0), &BrighterPalette);
        assert_eq!(right.dims.margin.left, 40.0);
        assert_eq!(right.dims.margin.right, 60.0);
    }

    #[test]
    fn test_clamps_tiny_content() {
        let cfg = config();
        let layout = compute_layout(&cfg, &Viewport::new(50.0, 1280.0), &BrighterPalette);
        assert_eq!(layout.chart_width, MIN_CONTENT_SIZE);
        assert_eq!(layout.chart_height, MIN_CONTENT_SIZE);
    }

    #[test]
    fn test_color_precedence() {
        let mut area = AreaConfig::default();
        area.colors = Some(vec!["red".into(), "blue".into()]);
        assert_eq!(series_colors(&area, &BrighterPalette), vec!["red", "blue"]);

        area.colors = Some(vec!["red".into()]);
        area.base_color = Some("rgb(70, 70, 70)".into());
        assert_eq!(
            series_colors(&area, &BrighterPalette),
            vec!["rgb(70, 70, 70)", "rgb(100, 100, 100)"]
        );

        area.base_color = Some("not a color".into());
        assert_eq!(series_colors(&area, &BrighterPalette), colors::defaults());
    }

    #[test]
    fn test_color_for() {
        let layout = compute_layout(&config(), &Viewport::new(800.0, 1280.0), &BrighterPalette);
        assert_eq!(layout.color_for("value_a"), Some("rgb(136, 187, 154)"));
        assert_eq!(layout.color_for("missing"), None);
    }
}
