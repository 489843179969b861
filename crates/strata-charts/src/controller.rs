//! Chart controller: owns the scene and drives the render pipeline
//!
//! Pipeline per pass: layout -> stack -> scales -> axes -> areas -> hit
//! rectangles. Every trigger (render, resize, data or config update) runs the
//! pass to completion before returning.

use strata_core::{
    BrighterPalette, ChartConfig, ChartError, ChartResult, ChronoTimeFormatter, NumberFormat,
    PaletteGenerator, TimeFormatter, TimeSeriesPoint, Viewport,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    build_stack, compute_layout, ensure, fmt_num, render_areas, render_axes, AxisContext, Frame,
    Interactions, Layout, NodeId, Scene, TooltipDisplay, TooltipStore,
};

// ============================================================================
// HOST ENVIRONMENT
// ============================================================================

/// Capabilities the host injects: viewport measurement and resize events
pub trait ChartEnvironment {
    /// Current container and window size plus device class
    fn viewport(&self) -> Viewport;

    /// Start delivering window resizes under `name`. The host calls
    /// [`AreaChart::handle_resize`] for each event.
    fn subscribe_resize(&mut self, name: &str);

    fn unsubscribe_resize(&mut self, name: &str);

    /// Whether the host drains the scene journal after every call. When it
    /// does not, the controller discards the journal at the end of each pass.
    fn consumes_mutations(&self) -> bool {
        false
    }
}

/// Environment with a fixed, settable viewport
#[derive(Debug, Clone, Default)]
pub struct HeadlessEnvironment {
    viewport: Viewport,
    subscriptions: Vec<String>,
}

impl HeadlessEnvironment {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            subscriptions: Vec::new(),
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }
}

impl ChartEnvironment for HeadlessEnvironment {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn subscribe_resize(&mut self, name: &str) {
        self.subscriptions.push(name.to_string());
    }

    fn unsubscribe_resize(&mut self, name: &str) {
        self.subscriptions.retain(|s| s != name);
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartPhase {
    #[default]
    Uninitialized,
    Rendered,
    Resized,
    DataUpdated,
    ConfigUpdated,
    Disposed,
}

/// Mutable state carried between pipeline passes
#[derive(Debug, Clone)]
pub struct ChartState {
    pub config: ChartConfig,
    pub data: Option<Vec<TimeSeriesPoint>>,
    pub number_format: NumberFormat,
    pub phase: ChartPhase,
    pub layout: Option<Layout>,
    pub frame: Option<Frame>,
    pub interactions: Interactions,
    pub hovered: Option<NodeId>,
}

impl ChartState {
    fn new(config: ChartConfig, data: Option<Vec<TimeSeriesPoint>>) -> ChartResult<Self> {
        let number_format = checked_format(&config)?;
        Ok(Self {
            config,
            data,
            number_format,
            phase: ChartPhase::Uninitialized,
            layout: None,
            frame: None,
            interactions: Interactions::new(),
            hovered: None,
        })
    }
}

fn checked_format(config: &ChartConfig) -> ChartResult<NumberFormat> {
    config.validate()?;
    NumberFormat::parse(&config.y_axis.tick_format)
}

// ============================================================================
// AREA CHART
// ============================================================================

/// Stacked area chart bound to one scene and one host environment
pub struct AreaChart<E: ChartEnvironment> {
    id: Uuid,
    resize_handler: String,
    subscribed: bool,
    scene: Scene,
    state: ChartState,
    env: E,
    palette: Box<dyn PaletteGenerator>,
    time_formatter: Box<dyn TimeFormatter>,
    tooltip: Box<dyn TooltipDisplay>,
}

impl<E: ChartEnvironment> AreaChart<E> {
    /// Create a chart with default collaborators. The config is validated
    /// here; data is checked when first drawn.
    pub fn new(env: E, config: ChartConfig, data: Option<Vec<TimeSeriesPoint>>) -> ChartResult<Self> {
        let id = Uuid::new_v4();
        let state = ChartState::new(config, data).inspect_err(|err| {
            error!(%err, "rejected chart config");
        })?;

        Ok(Self {
            id,
            resize_handler: format!("resize.{id}"),
            subscribed: false,
            scene: Scene::new(),
            state,
            env,
            palette: Box::new(BrighterPalette),
            time_formatter: Box::new(ChronoTimeFormatter),
            tooltip: Box::new(TooltipStore::new()),
        })
    }

    pub fn with_palette(mut self, palette: impl PaletteGenerator + 'static) -> Self {
        self.palette = Box::new(palette);
        self
    }

    pub fn with_time_formatter(mut self, formatter: impl TimeFormatter + 'static) -> Self {
        self.time_formatter = Box::new(formatter);
        self
    }

    pub fn with_tooltip(mut self, tooltip: impl TooltipDisplay + 'static) -> Self {
        self.tooltip = Box::new(tooltip);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the window resize subscription
    pub fn resize_handler(&self) -> &str {
        &self.resize_handler
    }

    pub fn phase(&self) -> ChartPhase {
        self.state.phase
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    pub fn config(&self) -> &ChartConfig {
        &self.state.config
    }

    pub fn data(&self) -> Option<&[TimeSeriesPoint]> {
        self.state.data.as_deref()
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.state.layout.as_ref()
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.state.frame.as_ref()
    }

    pub fn interactions(&self) -> &Interactions {
        &self.state.interactions
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn tooltip(&self) -> &dyn TooltipDisplay {
        self.tooltip.as_ref()
    }

    pub fn tooltip_mut(&mut self) -> &mut dyn TooltipDisplay {
        self.tooltip.as_mut()
    }

    /// Initial draw; subscribes to window resizes once
    pub fn render(&mut self) -> ChartResult<&mut Self> {
        self.ensure_live("render")?;

        self.redraw(true).inspect_err(|err| error!(%err, "render failed"))?;
        self.state.phase = ChartPhase::Rendered;

        if !self.subscribed {
            self.env.subscribe_resize(&self.resize_handler);
            self.subscribed = true;
            debug!(handler = %self.resize_handler, "resize subscribed");
        }

        info!(chart = %self.id, "chart rendered");
        Ok(self)
    }

    /// Replace both data and config, then redraw with animation
    pub fn update_data(
        &mut self,
        data: Option<Vec<TimeSeriesPoint>>,
        config: ChartConfig,
    ) -> ChartResult<&mut Self> {
        self.ensure_live("update_data")?;

        let number_format =
            checked_format(&config).inspect_err(|err| error!(%err, "rejected config update"))?;
        let frame = match &data {
            Some(points) => Some(self.build_frame(&config, points)?),
            None => None,
        };

        self.state.config = config;
        self.state.number_format = number_format;
        self.state.data = data;
        self.state.phase = ChartPhase::DataUpdated;

        match frame {
            Some(frame) => self.draw(frame, true),
            None => debug!("update without data, nothing drawn"),
        }
        Ok(self)
    }

    /// Replace the config only, then redraw with animation
    pub fn update_config(&mut self, config: ChartConfig) -> ChartResult<&mut Self> {
        self.ensure_live("update_config")?;

        let number_format =
            checked_format(&config).inspect_err(|err| error!(%err, "rejected config update"))?;
        let frame = match &self.state.data {
            Some(points) => Some(self.build_frame(&config, points)?),
            None => None,
        };

        self.state.config = config;
        self.state.number_format = number_format;
        self.state.phase = ChartPhase::ConfigUpdated;

        if let Some(frame) = frame {
            self.draw(frame, true);
        }
        Ok(self)
    }

    /// Window resize: recompute layout and redraw without animation
    pub fn handle_resize(&mut self) -> ChartResult<()> {
        match self.state.phase {
            ChartPhase::Uninitialized | ChartPhase::Disposed => {
                debug!(phase = ?self.state.phase, "resize ignored");
                return Ok(());
            }
            _ => {}
        }

        self.redraw(false)?;
        self.state.phase = ChartPhase::Resized;
        Ok(())
    }

    /// Release the resize subscription and every tooltip
    pub fn dispose(&mut self) {
        if self.state.phase == ChartPhase::Disposed {
            return;
        }
        if self.subscribed {
            self.env.unsubscribe_resize(&self.resize_handler);
            self.subscribed = false;
            debug!(handler = %self.resize_handler, "resize unsubscribed");
        }
        self.state.interactions.clear(self.tooltip.as_mut());
        self.state.hovered = None;
        self.state.phase = ChartPhase::Disposed;
    }

    // ------------------------------------------------------------------------
    // Pointer events
    // ------------------------------------------------------------------------

    pub fn pointer_enter(&mut self, node: NodeId) -> bool {
        let entered = self
            .state
            .interactions
            .pointer_enter(&mut self.scene, node, self.tooltip.as_mut());
        if entered {
            self.state.hovered = Some(node);
        }
        self.settle_journal();
        entered
    }

    pub fn pointer_leave(&mut self, node: NodeId) {
        if self.state.interactions.target(node).is_none() {
            return;
        }
        self.state
            .interactions
            .pointer_leave(&mut self.scene, node, self.tooltip.as_mut());
        if self.state.hovered == Some(node) {
            self.state.hovered = None;
        }
        self.settle_journal();
    }

    /// Pointer position in svg coordinates; enters and leaves rectangles as
    /// the topmost one under the pointer changes
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<NodeId> {
        let margin = self.state.layout.as_ref()?.dims.margin;
        let target = self
            .state
            .interactions
            .target_at(x - margin.left, y - margin.top);

        if target != self.state.hovered {
            if let Some(previous) = self.state.hovered {
                self.pointer_leave(previous);
            }
            if let Some(node) = target {
                self.pointer_enter(node);
            }
        }
        target
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    fn ensure_live(&self, op: &str) -> ChartResult<()> {
        if self.state.phase == ChartPhase::Disposed {
            error!(op, "chart already disposed");
            return Err(ChartError::Host(format!("{op} called on a disposed chart")));
        }
        Ok(())
    }

    fn build_frame(&self, config: &ChartConfig, points: &[TimeSeriesPoint]) -> ChartResult<Frame> {
        let layout = compute_layout(config, &self.env.viewport(), self.palette.as_ref());
        let stack = build_stack(points, &config.area.keys, config.area.stack_order)?;
        Ok(Frame::new(layout, stack))
    }

    /// Full pass over the current state
    fn redraw(&mut self, animate: bool) -> ChartResult<()> {
        match &self.state.data {
            Some(points) => {
                let frame = self.build_frame(&self.state.config, points)?;
                self.draw(frame, animate);
            }
            None => {
                let layout = compute_layout(
                    &self.state.config,
                    &self.env.viewport(),
                    self.palette.as_ref(),
                );
                self.draw_containers(&layout);
                self.settle_journal();
                self.state.layout = Some(layout);
                warn!("no data, only containers drawn");
            }
        }
        Ok(())
    }

    fn settle_journal(&mut self) {
        if !self.env.consumes_mutations() {
            self.scene.drain_mutations();
        }
    }

    fn draw_containers(&mut self, layout: &Layout) -> (NodeId, NodeId) {
        let svg = self.scene.root();
        let dims = &layout.dims;
        self.scene.set_attr(svg, "width", fmt_num(dims.width));
        self.scene.set_attr(svg, "height", fmt_num(dims.height));
        self.scene.set_attr(svg, "viewBox", dims.viewbox());

        let chart = ensure(&mut self.scene, svg, "g", "chart-group");
        self.scene.set_attr(chart, "transform", dims.inner_transform());
        (svg, chart)
    }

    fn draw(&mut self, frame: Frame, animate: bool) {
        let (svg, chart) = self.draw_containers(&frame.layout);
        let config = &self.state.config;
        let device = self.env.viewport().device;

        let ctx = AxisContext {
            config,
            frame: &frame,
            device,
            formatter: self.time_formatter.as_ref(),
            number_format: &self.state.number_format,
            animate,
        };
        render_axes(&mut self.scene, svg, chart, &ctx);
        render_areas(&mut self.scene, chart, config, &frame);
        self.state
            .interactions
            .render(&mut self.scene, chart, config, &frame, self.tooltip.as_mut());

        if let Some(node) = self.state.hovered {
            if self.state.interactions.target(node).is_none() {
                self.state.hovered = None;
            }
        }
        self.settle_journal();

        debug!(
            chart_width = frame.chart_width(),
            chart_height = frame.chart_height(),
            animate,
            "chart drawn"
        );
        self.state.layout = Some(frame.layout.clone());
        self.state.frame = Some(frame);
    }
}

impl<E: ChartEnvironment> Drop for AreaChart<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}
