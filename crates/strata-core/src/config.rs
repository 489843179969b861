//! Typed chart configuration with shallow JSON override merging

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{colors, ChartError, ChartResult, NumberFormat};

// ============================================================================
// ENUMS
// ============================================================================

/// Time granularity that drives tick placement and labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    Year,
    /// Any unrecognised granularity; uses the fallback tick policy
    #[serde(other)]
    Other,
}

impl TimePeriod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::Other => "other",
        }
    }

    /// Whether ticks sit in the middle of their bucket instead of its start
    pub fn centers_ticks(&self) -> bool {
        matches!(self, Self::Week | Self::Month | Self::Quarter | Self::Year)
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::Hour,
            Self::Day,
            Self::Week,
            Self::Month,
            Self::Quarter,
            Self::Year,
        ]
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Side of the chart that carries the value axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisPosition {
    #[default]
    Left,
    Right,
}

/// Interpolation curve between points of a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CurveKind {
    #[serde(rename = "curveStep")]
    Step,
    #[serde(rename = "curveStepBefore")]
    StepBefore,
    #[serde(rename = "curveStepAfter")]
    StepAfter,
    #[serde(rename = "curveMonotoneX")]
    MonotoneX,
    #[serde(rename = "curveBasis")]
    Basis,
    /// Also taken for unrecognised curve names
    #[default]
    #[serde(rename = "curveLinear", other)]
    Linear,
}

/// Order in which series are stacked bottom to top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StackOrder {
    #[serde(rename = "stackOrderReverse")]
    Reverse,
    #[serde(rename = "stackOrderAscending")]
    Ascending,
    #[serde(rename = "stackOrderDescending")]
    Descending,
    #[serde(rename = "stackOrderAppearance")]
    Appearance,
    #[serde(rename = "stackOrderInsideOut")]
    InsideOut,
    /// Also taken for unrecognised order names
    #[default]
    #[serde(rename = "stackOrderNone", other)]
    None,
}

// ============================================================================
// SECTIONS
// ============================================================================

/// Outer margins around the plotting area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartMargin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl ChartMargin {
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self { top, right, bottom, left }
    }

    pub const fn uniform(margin: f64) -> Self {
        Self::new(margin, margin, margin, margin)
    }

    /// Standard chart margins
    pub const fn standard() -> Self {
        Self::new(35.0, 30.0, 35.0, 80.0)
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

impl Default for ChartMargin {
    fn default() -> Self {
        Self::standard()
    }
}

/// Responsive aspect ratio override
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    /// Viewport width threshold in pixels (accepts `575` or `"575px"`)
    #[serde(deserialize_with = "de_pixels")]
    pub screen_width: f64,
    pub aspect_ratio: f64,
}

impl Breakpoint {
    pub fn new(screen_width: f64, aspect_ratio: f64) -> Self {
        Self { screen_width, aspect_ratio }
    }
}

fn de_pixels<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Pixels {
        Number(f64),
        Text(String),
    }

    match Pixels::deserialize(deserializer)? {
        Pixels::Number(n) => Ok(n),
        Pixels::Text(s) => s
            .trim()
            .trim_end_matches("px")
            .trim()
            .parse::<f64>()
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerConfig {
    pub default_aspect_ratio: f64,
    pub breakpoints: Vec<Breakpoint>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            default_aspect_ratio: 0.5625,
            breakpoints: vec![Breakpoint::new(575.0, 0.75)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Gridlines {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct XAxisConfig {
    pub visible: bool,
    pub major_gridlines: Gridlines,
    pub minor_gridlines: Gridlines,
}

impl Default for XAxisConfig {
    fn default() -> Self {
        Self {
            visible: true,
            major_gridlines: Gridlines::default(),
            minor_gridlines: Gridlines::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct YAxisConfig {
    pub ticks: usize,
    pub visible: bool,
    pub position: AxisPosition,
    /// Replaces the margin on the axis side when set
    pub width: Option<f64>,
    /// d3-format style specifier, e.g. `",.0f"` or `".2s"`
    pub tick_format: String,
    pub tick_line_width: f64,
    pub major_gridlines: Gridlines,
    pub minor_gridlines: Gridlines,
    pub title: Option<String>,
}

impl Default for YAxisConfig {
    fn default() -> Self {
        Self {
            ticks: 6,
            visible: true,
            position: AxisPosition::Left,
            width: None,
            tick_format: ",".to_string(),
            tick_line_width: 6.0,
            major_gridlines: Gridlines::default(),
            minor_gridlines: Gridlines::default(),
            title: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AreaConfig {
    pub visible: bool,
    /// Series identifiers, bottom of the stack first
    pub keys: Vec<String>,
    /// Explicit colors; used when they cover every key
    pub colors: Option<Vec<String>>,
    /// Seed for the generated palette
    pub base_color: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub curve: CurveKind,
    pub stack_order: StackOrder,
    pub line_color: Option<String>,
}

impl AreaConfig {
    /// Display label for a series key (falls back to the key itself)
    pub fn label_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.labels.get(key).map(String::as_str).unwrap_or(key)
    }
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            visible: true,
            keys: vec!["value_a".to_string(), "value_b".to_string()],
            colors: None,
            base_color: Some(colors::SERIES_PRIMARY.to_string()),
            labels: BTreeMap::new(),
            curve: CurveKind::Linear,
            stack_order: StackOrder::None,
            line_color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TooltipConfig {
    pub show: bool,
    pub background: String,
    pub show_label: bool,
    pub label_color: String,
    pub unit: String,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            show: true,
            background: colors::TOOLTIP_BG.to_string(),
            show_label: true,
            label_color: colors::TOOLTIP_LABEL.to_string(),
            unit: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NullDataConfig {
    pub show: bool,
    pub highlight_gaps: bool,
}

impl NullDataConfig {
    pub fn draws_gap_highlights(&self) -> bool {
        self.show && self.highlight_gaps
    }
}

impl Default for NullDataConfig {
    fn default() -> Self {
        Self {
            show: true,
            highlight_gaps: true,
        }
    }
}

// ============================================================================
// CHART CONFIG
// ============================================================================

/// Fully populated chart configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartConfig {
    /// Fallback width when the container has no rendered width
    pub width: f64,
    /// Height used when no aspect ratio applies
    pub height: f64,
    pub margin: ChartMargin,
    pub time_period: TimePeriod,
    pub container: ContainerConfig,
    pub x_axis: XAxisConfig,
    pub y_axis: YAxisConfig,
    pub area: AreaConfig,
    pub tooltip: TooltipConfig,
    pub null_data: NullDataConfig,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 300.0,
            margin: ChartMargin::standard(),
            time_period: TimePeriod::Day,
            container: ContainerConfig::default(),
            x_axis: XAxisConfig::default(),
            y_axis: YAxisConfig::default(),
            area: AreaConfig::default(),
            tooltip: TooltipConfig::default(),
            null_data: NullDataConfig::default(),
        }
    }
}

impl ChartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a caller-supplied JSON object against the defaults
    pub fn from_json(overrides: &Value) -> ChartResult<Self> {
        Self::default().merged(overrides)
    }

    pub fn from_json_str(json: &str) -> ChartResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    /// Shallow merge: every top-level key present in `overrides` replaces the
    /// whole section. Fields omitted inside a replaced section take that
    /// section's defaults, not the values of `self`.
    pub fn merged(&self, overrides: &Value) -> ChartResult<Self> {
        let Value::Object(overrides) = overrides else {
            return Err(ChartError::config("overrides must be a JSON object"));
        };

        let mut base = serde_json::to_value(self)?;
        if let Value::Object(base) = &mut base {
            for (key, value) in overrides {
                base.insert(key.clone(), value.clone());
            }
        }
        debug!(overrides = overrides.len(), "config merged");

        Ok(serde_json::from_value(base)?)
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.area.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_time_period(mut self, period: TimePeriod) -> Self {
        self.time_period = period;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_margin(mut self, margin: ChartMargin) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: f64) -> Self {
        self.container.default_aspect_ratio = ratio;
        self
    }

    pub fn with_breakpoints(mut self, breakpoints: Vec<Breakpoint>) -> Self {
        self.container.breakpoints = breakpoints;
        self
    }

    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.area.colors = Some(colors.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_curve(mut self, curve: CurveKind) -> Self {
        self.area.curve = curve;
        self
    }

    pub fn with_stack_order(mut self, order: StackOrder) -> Self {
        self.area.stack_order = order;
        self
    }

    pub fn with_y_axis(mut self, y_axis: YAxisConfig) -> Self {
        self.y_axis = y_axis;
        self
    }

    /// Margins as laid out: `yAxis.width`, when set, replaces the margin on
    /// the axis side
    pub fn effective_margin(&self) -> ChartMargin {
        let mut margin = self.margin;
        if let Some(axis_width) = self.y_axis.width {
            match self.y_axis.position {
                AxisPosition::Left => margin.left = axis_width,
                AxisPosition::Right => margin.right = axis_width,
            }
        }
        margin
    }

    /// Check the configuration before it reaches the rendering pipeline.
    ///
    /// Margins are not compared with `width`/`height` here: the rendered size
    /// depends on the container, and layout clamps a crushed content area.
    pub fn validate(&self) -> ChartResult<()> {
        self.check()
            .inspect_err(|err| warn!(%err, "chart config rejected"))?;
        if self.time_period == TimePeriod::Other {
            debug!("unrecognised timePeriod, fallback ticks in use");
        }
        Ok(())
    }

    fn check(&self) -> ChartResult<()> {
        check_positive("width", self.width)?;
        check_positive("height", self.height)?;

        let m = self.effective_margin();
        for (name, value) in [
            ("margin.top", m.top),
            ("margin.right", m.right),
            ("margin.bottom", m.bottom),
            ("margin.left", m.left),
        ] {
            check_non_negative(name, value)?;
        }

        check_non_negative("container.defaultAspectRatio", self.container.default_aspect_ratio)?;
        for bp in &self.container.breakpoints {
            check_positive("container.breakpoints.screenWidth", bp.screen_width)?;
            check_non_negative("container.breakpoints.aspectRatio", bp.aspect_ratio)?;
        }

        if self.y_axis.ticks == 0 {
            return Err(ChartError::config("yAxis.ticks must be at least 1"));
        }
        if let Some(width) = self.y_axis.width {
            check_non_negative("yAxis.width", width)?;
        }
        check_finite("yAxis.tickLineWidth", self.y_axis.tick_line_width)?;
        NumberFormat::parse(&self.y_axis.tick_format)?;

        if self.area.keys.is_empty() {
            return Err(ChartError::config("area.keys must name at least one series"));
        }
        let mut seen = HashSet::new();
        for key in &self.area.keys {
            if key == "timestamp" {
                return Err(ChartError::config("\"timestamp\" cannot be a series key"));
            }
            if !seen.insert(key.as_str()) {
                return Err(ChartError::config(format!("duplicate series key {key:?}")));
            }
        }

        Ok(())
    }
}

fn check_finite(name: &str, value: f64) -> ChartResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ChartError::config(format!("{name} must be finite, got {value}")))
    }
}

fn check_positive(name: &str, value: f64) -> ChartResult<()> {
    check_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ChartError::config(format!("{name} must be positive, got {value}")))
    }
}

fn check_non_negative(name: &str, value: f64) -> ChartResult<()> {
    check_finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ChartError::config(format!("{name} must not be negative, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_validate() {
        assert!(ChartConfig::default().validate().is_ok());
    }

    #[test]
    fn test_shallow_merge_replaces_sections() {
        let base = ChartConfig::default().with_keys(["a", "b", "c"]);
        let merged = base
            .merged(&json!({
                "timePeriod": "week",
                "area": { "keys": ["x"] },
            }))
            .unwrap();

        assert_eq!(merged.time_period, TimePeriod::Week);
        assert_eq!(merged.area.keys, vec!["x".to_string()]);
        // untouched sections survive
        assert_eq!(merged.width, base.width);
        // replaced section falls back to field defaults
        assert!(merged.area.visible);
    }

    #[test]
    fn test_merge_rejects_non_object() {
        assert!(ChartConfig::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_breakpoint_pixel_strings() {
        let cfg = ChartConfig::from_json(&json!({
            "container": {
                "defaultAspectRatio": 0.5,
                "breakpoints": [{ "screenWidth": "575px", "aspectRatio": 0.75 }, { "screenWidth": 900, "aspectRatio": 0.6 }]
            }
        }))
        .unwrap();

        assert_eq!(cfg.container.breakpoints[0].screen_width, 575.0);
        assert_eq!(cfg.container.breakpoints[1].screen_width, 900.0);
    }

    #[test]
    fn test_unknown_enums_fall_back() {
        let cfg = ChartConfig::from_json(&json!({
            "timePeriod": "fortnight",
            "area": { "keys": ["a"], "curve": "curveBumpX", "stackOrder": "stackOrderWiggle" }
        }))
        .unwrap();

        assert_eq!(cfg.time_period, TimePeriod::Other);
        assert_eq!(cfg.area.curve, CurveKind::Linear);
        assert_eq!(cfg.area.stack_order, StackOrder::None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let no_keys = ChartConfig::default().with_keys(Vec::<String>::new());
        assert!(matches!(no_keys.validate(), Err(ChartError::InvalidConfig(_))));

        let dup = ChartConfig::default().with_keys(["a", "a"]);
        assert!(dup.validate().is_err());

        let negative = ChartConfig::default().with_margin(ChartMargin::new(10.0, -1.0, 10.0, 10.0));
        assert!(negative.validate().is_err());

        let mut negative_axis = ChartConfig::default();
        negative_axis.y_axis.width = Some(-5.0);
        assert!(negative_axis.validate().is_err());

        let mut bad_format = ChartConfig::default();
        bad_format.y_axis.tick_format = ".f2".to_string();
        assert!(matches!(bad_format.validate(), Err(ChartError::InvalidFormat { .. })));

        let mut no_ticks = ChartConfig::default();
        no_ticks.y_axis.ticks = 0;
        assert!(no_ticks.validate().is_err());
    }

    #[test]
    fn test_axis_width_replaces_side_margin() {
        let mut cfg = ChartConfig::default().with_margin(ChartMargin::new(35.0, 30.0, 35.0, 500.0));
        cfg.y_axis.width = Some(60.0);
        assert_eq!(cfg.effective_margin().left, 60.0);
        assert!(cfg.validate().is_ok());

        cfg.y_axis.position = AxisPosition::Right;
        assert_eq!(cfg.effective_margin().left, 500.0);
        assert_eq!(cfg.effective_margin().right, 60.0);
    }

    #[test]
    fn test_wide_margins_left_to_layout() {
        // fine in a 1200px container even though the fallback width is 400
        let cfg = ChartConfig::default()
            .with_keys(["a"])
            .with_margin(ChartMargin::new(35.0, 150.0, 35.0, 300.0));
        assert!(cfg.validate().is_ok());

        let small = ChartConfig::default().with_size(100.0, 300.0);
        assert!(small.validate().is_ok());
    }

    #[test]
    fn test_label_fallback() {
        let mut area = AreaConfig::default();
        area.labels.insert("value_a".into(), "Revenue".into());
        assert_eq!(area.label_for("value_a"), "Revenue");
        assert_eq!(area.label_for("value_b"), "value_b");
    }
}
