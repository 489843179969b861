//! X/Y axes with tick placement and labels driven by the time period

use chrono::Datelike;
use strata_core::{
    from_millis, AxisPosition, ChartConfig, DeviceClass, NumberFormat, TimeFormatter, TimePeriod,
    ANIMATION_MS,
};
use tracing::debug;

use crate::{bind, ensure, ensure_if, fmt_num, BindKey, Frame, NodeId, Scale, Scene};

/// Gap between tick line end and label
pub const TICK_PADDING: f64 = 10.0;
/// Outer tick length at the ends of the value axis
pub const OUTER_TICK_SIZE: f64 = 6.0;

const DAY_TICK_EVERY: usize = 6;
const DAY_TICK_EVERY_MOBILE: usize = 12;

/// One x-axis tick
#[derive(Debug, Clone, PartialEq)]
pub struct XTick {
    /// Where the tick sits on the time axis
    pub value_ms: i64,
    /// Start of the bucket it labels
    pub bucket_ms: i64,
    pub label: String,
}

/// `(bucket, tick position)` pairs for the time period's tick policy.
///
/// Hour and day ticks mark bucket boundaries, half a bucket left of the data
/// point drawn for that bucket. Coarser periods center the tick on it.
pub fn x_tick_values(
    times: &[i64],
    interval_ms: i64,
    period: TimePeriod,
    device: DeviceClass,
) -> Vec<(i64, i64)> {
    let offset = if period.centers_ticks() { interval_ms / 2 } else { 0 };

    times
        .iter()
        .enumerate()
        .filter(|&(i, &t)| match period {
            TimePeriod::Day => {
                let every = if device.is_mobile() {
                    DAY_TICK_EVERY_MOBILE
                } else {
                    DAY_TICK_EVERY
                };
                i % every == 0
            }
            TimePeriod::Month => from_millis(t).is_some_and(|dt| {
                let day = dt.day();
                day == 1 || day % 7 == 0
            }),
            TimePeriod::Year => !device.is_mobile() || i % 2 == 0,
            _ => true,
        })
        .map(|(_, &t)| (t, t + offset))
        .collect()
}

/// Labelled x-axis ticks
pub fn x_ticks(
    times: &[i64],
    interval_ms: i64,
    period: TimePeriod,
    device: DeviceClass,
    formatter: &dyn TimeFormatter,
) -> Vec<XTick> {
    let label = formatter.tick_formatter(period, device);
    x_tick_values(times, interval_ms, period, device)
        .into_iter()
        .map(|(bucket_ms, value_ms)| XTick {
            value_ms,
            bucket_ms,
            label: from_millis(bucket_ms).map(|dt| label(&dt)).unwrap_or_default(),
        })
        .collect()
}

/// Inputs shared by both axes
pub struct AxisContext<'a> {
    pub config: &'a ChartConfig,
    pub frame: &'a Frame,
    pub device: DeviceClass,
    pub formatter: &'a dyn TimeFormatter,
    pub number_format: &'a NumberFormat,
    pub animate: bool,
}

/// Draw the y-axis title (on the svg root) and both axes (in the chart group)
pub fn render_axes(scene: &mut Scene, svg: NodeId, chart: NodeId, ctx: &AxisContext<'_>) {
    render_y_title(scene, svg, ctx);
    render_x_axis(scene, chart, ctx);
    render_y_axis(scene, chart, ctx);
}

fn apply_axis_defaults(scene: &mut Scene, g: NodeId, anchor: &str) {
    scene.set_attr(g, "fill", "none");
    scene.set_attr(g, "font-size", "10");
    scene.set_attr(g, "font-family", "sans-serif");
    scene.set_attr(g, "text-anchor", anchor);
}

fn render_y_title(scene: &mut Scene, svg: NodeId, ctx: &AxisContext<'_>) {
    let title = ctx.config.y_axis.title.as_deref();
    let Some(node) = ensure_if(scene, svg, "text", "y-axis-label", title.is_some()) else {
        return;
    };

    let x = -ctx.frame.chart_height() / 2.0 + ctx.frame.layout.dims.margin.top;
    scene.set_attr(node, "text-anchor", "end");
    scene.set_attr(node, "y", "6");
    scene.set_attr(node, "x", fmt_num(x));
    scene.set_attr(node, "dy", ".75em");
    scene.set_attr(node, "transform", "rotate(-90)");
    scene.set_text(node, title.unwrap_or_default());
}

fn render_x_axis(scene: &mut Scene, chart: NodeId, ctx: &AxisContext<'_>) {
    let frame = ctx.frame;
    let (w, h) = (frame.chart_width(), frame.chart_height());
    let tick_size = if ctx.config.x_axis.major_gridlines.visible {
        -h
    } else {
        0.0
    };

    let g = ensure(scene, chart, "g", "x-axis axis");
    apply_axis_defaults(scene, g, "middle");
    scene.set_attr(g, "transform", format!("translate(0,{})", fmt_num(h)));
    let display = (!ctx.config.x_axis.visible).then_some("none");
    scene.set_style(g, "display", display);

    let domain = ensure(scene, g, "path", "domain");
    scene.set_attr(domain, "stroke", "currentColor");
    scene.set_attr(
        domain,
        "d",
        format!(
            "M0,{s}V0H{w}V{s}",
            s = fmt_num(tick_size),
            w = fmt_num(w)
        ),
    );

    let ticks = x_ticks(
        &frame.stack.times,
        frame.stack.interval_ms,
        ctx.config.time_period,
        ctx.device,
        ctx.formatter,
    );
    let nodes = bind(scene, g, "g", "tick", &ticks, |t, _| {
        BindKey::Id(t.value_ms.to_string())
    });

    for (tick, node) in ticks.iter().zip(nodes) {
        let x = frame.scales.x.scale(tick.value_ms);
        scene.set_attr(node, "opacity", "1");
        scene.set_attr(node, "transform", format!("translate({},0)", fmt_num(x)));

        let line = ensure(scene, node, "line", "tick-line");
        scene.set_attr(line, "stroke", "currentColor");
        scene.set_attr(line, "y2", fmt_num(tick_size));

        let text = ensure(scene, node, "text", "tick-label");
        scene.set_attr(text, "fill", "currentColor");
        scene.set_attr(text, "y", fmt_num(tick_size.max(0.0) + TICK_PADDING));
        scene.set_attr(text, "dy", "0.71em");
        scene.set_text(text, tick.label.as_str());
    }

    debug!(ticks = ticks.len(), period = %ctx.config.time_period, "x axis drawn");
}

fn render_y_axis(scene: &mut Scene, chart: NodeId, ctx: &AxisContext<'_>) {
    let frame = ctx.frame;
    let y_cfg = &ctx.config.y_axis;
    let (w, h) = (frame.chart_width(), frame.chart_height());

    let (k, anchor) = match y_cfg.position {
        AxisPosition::Left => (-1.0, "end"),
        AxisPosition::Right => (1.0, "start"),
    };
    let (inner, outer) = if y_cfg.major_gridlines.visible {
        (-w, -w)
    } else {
        (y_cfg.tick_line_width, OUTER_TICK_SIZE)
    };
    let transition = ctx.animate.then_some(ANIMATION_MS);

    let g = ensure(scene, chart, "g", "y-axis axis");
    scene.set_transition(g, transition);
    apply_axis_defaults(scene, g, anchor);
    let display = (!y_cfg.visible).then_some("none");
    scene.set_style(g, "display", display);
    let translate = match y_cfg.position {
        AxisPosition::Left => None,
        AxisPosition::Right => Some(format!("translate({})", fmt_num(w))),
    };
    scene.set_attr_opt(g, "transform", translate);

    let domain = ensure(scene, g, "path", "domain");
    scene.set_transition(domain, transition);
    scene.set_attr(domain, "stroke", "currentColor");
    scene.set_attr(
        domain,
        "d",
        format!(
            "M{o},{h}H0V0H{o}",
            o = fmt_num(k * outer),
            h = fmt_num(h)
        ),
    );

    let values = frame.scales.y.ticks(y_cfg.ticks);
    let nodes = bind(scene, g, "g", "tick", &values, |v, _| BindKey::Id(fmt_num(*v)));

    for (&value, node) in values.iter().zip(nodes) {
        scene.set_transition(node, transition);
        scene.set_attr(node, "opacity", "1");
        scene.set_attr(
            node,
            "transform",
            format!("translate(0,{})", fmt_num(frame.scales.y(value))),
        );

        let line = ensure(scene, node, "line", "tick-line");
        scene.set_attr(line, "stroke", "currentColor");
        scene.set_attr(line, "x2", fmt_num(k * inner));

        let text = ensure(scene, node, "text", "tick-label");
        scene.set_attr(text, "fill", "currentColor");
        scene.set_attr(text, "x", fmt_num(k * (inner.max(0.0) + TICK_PADDING)));
        scene.set_attr(text, "dy", "0.32em");
        scene.set_text(text, ctx.number_format.format(value));
    }

    debug!(ticks = values.len(), animate = ctx.animate, "y axis drawn");
}
