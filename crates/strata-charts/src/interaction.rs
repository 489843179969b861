//! Hit rectangles, hover highlighting and tooltips
//!
//! Every (series, point) pair gets an invisible rectangle one bucket wide,
//! centered on the drawn point and reaching from the band top down to the
//! chart bottom. Rectangles are bound from the highest stacking index down, so
//! a lower series' rectangle sits on top of the upper ones it overlaps. Inside
//! its own band each series wins; an upper series only catches the pointer
//! above the bands stacked below it.

use std::collections::BTreeMap;

use strata_core::{colors, ChartConfig, TooltipConfig};
use tracing::{debug, trace};

use crate::{bind_keyed, ensure, fmt_num, Frame, NodeId, Scene};

/// Opacity of the series groups that are not hovered
pub const DIMMED_OPACITY: f64 = 0.2;

/// Text shown for a null value
pub const NULL_VALUE_TEXT: &str = "–";

// ============================================================================
// STRATEGY PATTERN: Tooltip display
// ============================================================================

/// What a tooltip says about one hit rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub label: String,
    pub value: Option<f64>,
    pub color: String,
}

impl TooltipContent {
    pub fn value_text(&self) -> String {
        match self.value {
            Some(v) => format!("{v}"),
            None => NULL_VALUE_TEXT.to_string(),
        }
    }

    pub fn to_html(&self, config: &TooltipConfig) -> String {
        let label = if config.show_label {
            format!(
                "<div class=\"CustomTooltip__Label\" style=\"color: {}\">{}</div>",
                escape_html(&self.color),
                escape_html(&self.label)
            )
        } else {
            String::new()
        };

        format!(
            "<div class=\"CustomTooltip\" style=\"background: {}\">{}<div class=\"CustomTooltip__Value\">{}{}</div></div>",
            escape_html(&config.background),
            label,
            self.value_text(),
            escape_html(&config.unit)
        )
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Collaborator that owns the tooltip popups bound to hit rectangles
pub trait TooltipDisplay {
    /// Bind (or rebind) a tooltip to a node
    fn attach(&mut self, node: NodeId, content: &TooltipContent, config: &TooltipConfig);

    fn detach(&mut self, node: NodeId);

    fn show(&mut self, node: NodeId);

    fn hide(&mut self, node: NodeId);
}

/// In-memory tooltip display keeping the rendered HTML per node
#[derive(Debug, Clone, Default)]
pub struct TooltipStore {
    attached: BTreeMap<NodeId, String>,
    visible: Option<NodeId>,
}

impl TooltipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(&self, node: NodeId) -> Option<&str> {
        self.attached.get(&node).map(String::as_str)
    }

    pub fn visible(&self) -> Option<NodeId> {
        self.visible
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}

impl TooltipDisplay for TooltipStore {
    fn attach(&mut self, node: NodeId, content: &TooltipContent, config: &TooltipConfig) {
        self.attached.insert(node, content.to_html(config));
    }

    fn detach(&mut self, node: NodeId) {
        self.attached.remove(&node);
        if self.visible == Some(node) {
            self.visible = None;
        }
    }

    fn show(&mut self, node: NodeId) {
        if self.attached.contains_key(&node) {
            self.visible = Some(node);
        }
    }

    fn hide(&mut self, node: NodeId) {
        if self.visible == Some(node) {
            self.visible = None;
        }
    }
}

// ============================================================================
// HIT TARGETS
// ============================================================================

/// Datum behind one hit rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct HitTarget {
    pub key: String,
    pub label: String,
    /// Stacking position of the series
    pub index: usize,
    /// Source point position
    pub point: usize,
    pub time_ms: i64,
    pub value: Option<f64>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl HitTarget {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Flatten every series into hit targets, highest stacking index first.
/// The sort is stable, so points keep their order within a series.
pub fn hit_targets(config: &ChartConfig, frame: &Frame) -> Vec<HitTarget> {
    let scales = &frame.scales;
    let mut targets: Vec<HitTarget> = frame
        .stack
        .series
        .iter()
        .flat_map(|series| {
            let label = config.area.label_for(&series.key).to_string();
            series.bands.iter().map(move |band| {
                let width = scales.bucket_width(band.time_ms);
                let top = scales.y(band.y1);
                HitTarget {
                    key: series.key.clone(),
                    label: label.clone(),
                    index: series.index,
                    point: band.point,
                    time_ms: band.time_ms,
                    value: band.value,
                    x: scales.point_x(band.time_ms) - width / 2.0,
                    y: top,
                    width,
                    height: frame.chart_height() - top,
                }
            })
        })
        .collect();

    targets.sort_by(|a, b| b.index.cmp(&a.index));
    targets
}

/// Hit rectangles currently in the scene, in document order
#[derive(Debug, Clone, Default)]
pub struct Interactions {
    targets: Vec<(NodeId, HitTarget)>,
}

impl Interactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.targets.iter().map(|(id, _)| *id)
    }

    pub fn target(&self, node: NodeId) -> Option<&HitTarget> {
        self.targets.iter().find(|(id, _)| *id == node).map(|(_, t)| t)
    }

    /// Topmost hit rectangle under a point in chart coordinates
    pub fn target_at(&self, x: f64, y: f64) -> Option<NodeId> {
        self.targets
            .iter()
            .rev()
            .find(|(_, t)| t.contains(x, y))
            .map(|(id, _)| *id)
    }

    /// Bind `g.tooltip-group > rect.tooltip-rect` and refresh every tooltip
    pub fn render(
        &mut self,
        scene: &mut Scene,
        chart: NodeId,
        config: &ChartConfig,
        frame: &Frame,
        tooltip: &mut dyn TooltipDisplay,
    ) {
        let targets = if config.tooltip.show {
            hit_targets(config, frame)
        } else {
            Vec::new()
        };

        let group = ensure(scene, chart, "g", "tooltip-group");
        let rects = bind_keyed(scene, group, "rect", "tooltip-rect", &targets);

        // removed slots may already carry other nodes
        for (old, _) in &self.targets {
            if !rects.contains(old) {
                tooltip.detach(*old);
            }
        }

        for (target, &rect) in targets.iter().zip(&rects) {
            scene.set_attr(rect, "x", fmt_num(target.x));
            scene.set_attr(rect, "y", fmt_num(target.y));
            scene.set_attr(rect, "width", fmt_num(target.width));
            scene.set_attr(rect, "height", fmt_num(target.height));
            scene.set_attr(rect, "fill", colors::TRANSPARENT);

            let content = TooltipContent {
                label: target.label.clone(),
                value: target.value,
                color: config.tooltip.label_color.clone(),
            };
            tooltip.attach(rect, &content, &config.tooltip);
        }

        debug!(rects = rects.len(), "hit rectangles bound");
        self.targets = rects.into_iter().zip(targets).collect();
    }

    /// Highlight the entered rectangle and dim every other series
    pub fn pointer_enter(&self, scene: &mut Scene, node: NodeId, tooltip: &mut dyn TooltipDisplay) -> bool {
        let Some(target) = self.target(node) else {
            return false;
        };

        for (id, _) in &self.targets {
            scene.set_attr(*id, "fill", colors::TRANSPARENT);
        }
        scene.set_attr(node, "fill", colors::hover_fill());

        for group in scene.select_all("area-group") {
            let same = scene.attr(group, "data-name") == Some(target.key.as_str());
            let opacity = if same { 1.0 } else { DIMMED_OPACITY };
            scene.set_attr(group, "opacity", fmt_num(opacity));
        }

        tooltip.show(node);
        trace!(key = %target.key, point = target.point, "pointer enter");
        true
    }

    /// Restore every series and rectangle
    pub fn pointer_leave(&self, scene: &mut Scene, node: NodeId, tooltip: &mut dyn TooltipDisplay) {
        for (id, _) in &self.targets {
            scene.set_attr(*id, "fill", colors::TRANSPARENT);
        }
        for group in scene.select_all("area-group") {
            scene.remove_attr(group, "opacity");
        }
        tooltip.hide(node);
        trace!(node = %node, "pointer leave");
    }

    /// Detach every tooltip and forget the targets
    pub fn clear(&mut self, tooltip: &mut dyn TooltipDisplay) {
        for (id, _) in self.targets.drain(..) {
            tooltip.detach(id);
        }
    }
}

impl crate::Keyed for HitTarget {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tooltip_html() {
        let content = TooltipContent {
            label: "Revenue".into(),
            value: Some(2.5),
            color: "#4a4a4a".into(),
        };
        let mut cfg = TooltipConfig::default();
        cfg.unit = "%".into();

        assert_eq!(
            content.to_html(&cfg),
            "<div class=\"CustomTooltip\" style=\"background: #ffffff\">\
             <div class=\"CustomTooltip__Label\" style=\"color: #4a4a4a\">Revenue</div>\
             <div class=\"CustomTooltip__Value\">2.5%</div></div>"
        );

        cfg.show_label = false;
        let null = TooltipContent { value: None, ..content };
        assert!(!null.to_html(&cfg).contains("CustomTooltip__Label"));
        assert!(null.to_html(&cfg).contains(">–%<"));
    }

    #[test]
    fn test_store_visibility() {
        let mut store = TooltipStore::new();
        let node = NodeId::from_index(3);
        let content = TooltipContent {
            label: "a".into(),
            value: Some(1.0),
            color: "black".into(),
        };

        store.show(node);
        assert_eq!(store.visible(), None);

        store.attach(node, &content, &TooltipConfig::default());
        store.show(node);
        assert_eq!(store.visible(), Some(node));

        store.detach(node);
        assert_eq!(store.visible(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_hit_target_contains() {
        let t = HitTarget {
            key: "a".into(),
            label: "a".into(),
            index: 0,
            point: 0,
            time_ms: 0,
            value: Some(1.0),
            x: 10.0,
            y: 20.0,
            width: 5.0,
            height: 30.0,
        };
        assert!(t.contains(12.0, 25.0));
        assert!(!t.contains(16.0, 25.0));
        assert!(!t.contains(12.0, 10.0));
    }
}
