use std::cell::RefCell;
use std::rc::Rc;

use strata_charts::{
    AreaChart, ChartEnvironment, ChartPhase, HeadlessEnvironment, NodeId, Scene, TooltipContent,
    TooltipDisplay, TooltipStore, DIMMED_OPACITY,
};
use strata_core::{
    points_from_json, ChartConfig, ChartMargin, Gridlines, TimePeriod, TimeSeriesPoint, TooltipConfig,
    Viewport, ANIMATION_MS,
};

/// Tooltip store the test keeps a handle on after the chart takes it
#[derive(Clone, Default)]
struct SharedTooltips(Rc<RefCell<TooltipStore>>);

impl TooltipDisplay for SharedTooltips {
    fn attach(&mut self, node: NodeId, content: &TooltipContent, config: &TooltipConfig) {
        self.0.borrow_mut().attach(node, content, config);
    }

    fn detach(&mut self, node: NodeId) {
        self.0.borrow_mut().detach(node);
    }

    fn show(&mut self, node: NodeId) {
        self.0.borrow_mut().show(node);
    }

    fn hide(&mut self, node: NodeId) {
        self.0.borrow_mut().hide(node);
    }
}

/// Resize subscriptions visible from outside the chart
#[derive(Clone, Default)]
struct SharedSubscriptions(Rc<RefCell<Vec<String>>>);

impl ChartEnvironment for SharedSubscriptions {
    fn viewport(&self) -> Viewport {
        Viewport::new(800.0, 1280.0)
    }

    fn subscribe_resize(&mut self, name: &str) {
        self.0.borrow_mut().push(name.to_string());
    }

    fn unsubscribe_resize(&mut self, name: &str) {
        self.0.borrow_mut().retain(|s| s != name);
    }
}

fn hourly() -> Vec<TimeSeriesPoint> {
    let rows = [
        (Some(1.0), Some(2.0)),
        (Some(2.0), Some(1.0)),
        (None, Some(3.0)),
        (Some(1.0), Some(1.0)),
    ];
    rows.iter()
        .enumerate()
        .map(|(i, (a, b))| {
            TimeSeriesPoint::new(format!("2023-01-01T0{i}:00:00Z"))
                .with_value("a", *a)
                .with_value("b", *b)
        })
        .collect()
}

fn hourly_config() -> ChartConfig {
    ChartConfig::default()
        .with_keys(["a", "b"])
        .with_time_period(TimePeriod::Hour)
}

fn mounted(config: ChartConfig, data: Vec<TimeSeriesPoint>, width: f64) -> AreaChart<HeadlessEnvironment> {
    let env = HeadlessEnvironment::new(Viewport::new(width, 1280.0));
    let mut chart = AreaChart::new(env, config, Some(data)).unwrap();
    chart.render().unwrap();
    chart
}

fn area_group(scene: &Scene, key: &str) -> NodeId {
    scene
        .select_all("area-group")
        .into_iter()
        .find(|&g| scene.attr(g, "data-name") == Some(key))
        .unwrap()
}

fn tick_labels(scene: &Scene, axis: &str) -> Vec<String> {
    let axis = scene.select_all(axis)[0];
    scene
        .select_children(axis, "g", "tick")
        .into_iter()
        .map(|tick| {
            let text = scene.select_children(tick, "text", "tick-label")[0];
            scene.text(text).unwrap_or_default().to_string()
        })
        .collect()
}

#[test]
fn end_to_end_hourly_with_gap() {
    let chart = mounted(hourly_config(), hourly(), 800.0);
    let frame = chart.frame().unwrap();
    assert_eq!(frame.scales.y.domain_bounds(), (0.0, 3.0));

    let scene = chart.scene();
    let group = area_group(scene, "a");
    let line = scene.select_children(group, "path", "line")[0];
    let d = scene.attr(line, "d").unwrap();
    assert_eq!(d.matches('M').count(), 2);

    let gaps = scene.select_children(group, "rect", "null-gap");
    assert_eq!(gaps.len(), 1);

    let b = area_group(scene, "b");
    assert!(scene.select_children(b, "rect", "null-gap").is_empty());

    assert_eq!(tick_labels(scene, "x-axis"), vec!["00:00", "01:00", "02:00", "03:00"]);
}

#[test]
fn gap_highlights_follow_null_data_config() {
    let mut config = hourly_config();
    config.null_data.highlight_gaps = false;
    let chart = mounted(config, hourly(), 800.0);

    let scene = chart.scene();
    let group = area_group(scene, "a");
    assert!(scene.select_children(group, "rect", "null-gap").is_empty());
    let line = scene.select_children(group, "path", "line")[0];
    assert_eq!(scene.attr(line, "d").unwrap().matches('M').count(), 2);
}

#[test]
fn week_ticks_show_weekday_initials() {
    let json = include_str!("../../../fixtures/week.json");
    let data = points_from_json(json).unwrap();
    let config = ChartConfig::default()
        .with_keys(["visits", "signups"])
        .with_time_period(TimePeriod::Week);
    let chart = mounted(config, data, 800.0);

    let frame = chart.frame().unwrap();
    assert_eq!(frame.stack.times.len(), 7);
    assert_eq!(frame.scales.y.domain_bounds().1, 200.0);
    assert_eq!(
        chart.scene().select_children(area_group(chart.scene(), "signups"), "rect", "null-gap").len(),
        1
    );
    assert_eq!(
        tick_labels(chart.scene(), "x-axis"),
        vec!["M", "T", "W", "T", "F", "S", "S"]
    );
}

#[test]
fn resize_narrows_chart_and_keeps_y_ticks() {
    let mut chart = mounted(hourly_config(), hourly(), 800.0);
    let before_width = chart.frame().unwrap().chart_width();
    let before_ticks = tick_labels(chart.scene(), "y-axis");

    chart.env_mut().set_viewport(Viewport::new(600.0, 1280.0));
    chart.handle_resize().unwrap();

    assert_eq!(chart.phase(), ChartPhase::Resized);
    assert!(chart.frame().unwrap().chart_width() < before_width);
    assert_eq!(tick_labels(chart.scene(), "y-axis"), before_ticks);
}

#[test]
fn y_axis_animates_on_render_but_not_on_resize() {
    let mut chart = mounted(hourly_config(), hourly(), 800.0);
    let scene = chart.scene();
    let axis = scene.select_all("y-axis")[0];
    let tick = scene.select_children(axis, "g", "tick")[0];
    assert_eq!(scene.node(tick).unwrap().transition_ms, Some(ANIMATION_MS));

    chart.handle_resize().unwrap();
    let scene = chart.scene();
    assert_eq!(scene.node(tick).unwrap().transition_ms, None);
}

#[test]
fn update_config_is_idempotent() {
    let mut chart = mounted(hourly_config(), hourly(), 800.0);
    let mut config = hourly_config();
    config.y_axis.ticks = 3;

    chart.update_config(config.clone()).unwrap();
    let first = chart.frame().unwrap().scales.clone();
    chart.update_config(config).unwrap();
    let second = chart.frame().unwrap().scales.clone();

    assert_eq!(first, second);
    assert_eq!(chart.phase(), ChartPhase::ConfigUpdated);
}

#[test]
fn update_data_reuses_series_nodes() {
    let mut chart = mounted(hourly_config(), hourly(), 800.0);
    let before = area_group(chart.scene(), "a");

    chart.update_data(Some(hourly()), hourly_config()).unwrap();
    assert_eq!(area_group(chart.scene(), "a"), before);
    assert_eq!(chart.phase(), ChartPhase::DataUpdated);

    chart
        .update_data(Some(hourly()), hourly_config().with_keys(["b"]))
        .unwrap();
    let scene = chart.scene();
    assert_eq!(scene.select_all("area-group"), vec![area_group(scene, "b")]);
    assert_ne!(area_group(scene, "b"), before);
}

#[test]
fn hover_dims_other_series_and_shows_tooltip() {
    let mut chart = mounted(hourly_config(), hourly(), 800.0);
    let rects = chart.scene().select_all("tooltip-rect");
    assert_eq!(rects.len(), 8);

    // highest stacking index first
    let first = chart.interactions().target(rects[0]).unwrap().key.clone();
    assert_eq!(first, "b");

    assert!(chart.pointer_enter(rects[0]));
    let scene = chart.scene();
    let a = area_group(scene, "a");
    let b = area_group(scene, "b");
    assert_eq!(scene.attr(b, "opacity"), Some("1"));
    assert_eq!(scene.attr(a, "opacity"), Some(DIMMED_OPACITY.to_string().as_str()));
    assert_eq!(scene.attr(rects[0], "fill"), Some("rgba(0, 0, 0, 0.1)"));
    assert_eq!(scene.attr(rects[1], "fill"), Some("transparent"));

    chart.pointer_leave(rects[0]);
    let scene = chart.scene();
    assert_eq!(scene.attr(a, "opacity"), None);
    assert_eq!(scene.attr(b, "opacity"), None);
    assert_eq!(scene.attr(rects[0], "fill"), Some("transparent"));
}

#[test]
fn each_band_catches_the_pointer_inside_itself() {
    // point 0 stacks a over [0, 1] and b over [1, 3]
    let mut chart = mounted(hourly_config(), hourly(), 800.0);
    let frame = chart.frame().unwrap().clone();
    let margin = frame.layout.dims.margin;
    let x = margin.left + frame.scales.point_x(frame.stack.times[0]);
    let key_at = |chart: &mut AreaChart<HeadlessEnvironment>, value: f64| {
        let node = chart.pointer_move(x, margin.top + frame.scales.y(value)).unwrap();
        chart.interactions().target(node).unwrap().key.clone()
    };

    assert_eq!(key_at(&mut chart, 0.5), "a");
    assert_eq!(key_at(&mut chart, 2.0), "b");
}

#[test]
fn tooltips_attach_per_rect_and_respect_show_flag() {
    let env = HeadlessEnvironment::new(Viewport::new(800.0, 1280.0));
    let mut config = hourly_config();
    config.area.labels.insert("a".into(), "Alpha".into());
    let tooltips = SharedTooltips::default();
    let mut chart = AreaChart::new(env, config.clone(), Some(hourly()))
        .unwrap()
        .with_tooltip(tooltips.clone());
    chart.render().unwrap();

    assert_eq!(tooltips.0.borrow().len(), 8);
    let target = |chart: &AreaChart<HeadlessEnvironment>, key: &str, point: usize| {
        chart
            .scene()
            .select_all("tooltip-rect")
            .into_iter()
            .find(|&r| {
                let t = chart.interactions().target(r).unwrap();
                t.key == key && t.point == point
            })
            .unwrap()
    };

    let alpha = target(&chart, "a", 0);
    let alpha_null = target(&chart, "a", 2);
    assert!(tooltips.0.borrow().html(alpha).unwrap().contains("Alpha"));
    assert!(tooltips.0.borrow().html(alpha_null).unwrap().contains(">–"));
    assert!(tooltips.0.borrow().html(target(&chart, "b", 2)).unwrap().contains(">3"));

    assert!(chart.pointer_enter(alpha_null));
    assert_eq!(tooltips.0.borrow().visible(), Some(alpha_null));
    chart.pointer_leave(alpha_null);
    assert_eq!(tooltips.0.borrow().visible(), None);

    chart.env_mut().set_viewport(Viewport::new(500.0, 1280.0));
    chart.handle_resize().unwrap();
    let store = tooltips.0.borrow();
    assert_eq!(store.len(), 8);
    for rect in chart.scene().select_all("tooltip-rect") {
        assert!(store.html(rect).is_some());
    }
    drop(store);

    config.tooltip.show = false;
    chart.update_config(config).unwrap();
    assert!(chart.scene().select_all("tooltip-rect").is_empty());
    assert!(chart.interactions().is_empty());
    assert!(tooltips.0.borrow().is_empty());
}

#[test]
fn y_axis_title_and_position() {
    let mut config = hourly_config();
    config.y_axis.title = Some("Requests".into());
    config.y_axis.position = strata_core::AxisPosition::Right;
    config.y_axis.major_gridlines = Gridlines { visible: true };
    let chart = mounted(config, hourly(), 800.0);

    let scene = chart.scene();
    let title = scene.select_all("y-axis-label")[0];
    assert_eq!(scene.parent(title), Some(scene.root()));
    assert_eq!(scene.text(title), Some("Requests"));
    assert_eq!(scene.attr(title, "transform"), Some("rotate(-90)"));

    let axis = scene.select_all("y-axis")[0];
    assert_eq!(scene.attr(axis, "text-anchor"), Some("start"));
    assert_eq!(scene.attr(axis, "transform"), Some("translate(690)"));

    let tick = scene.select_children(axis, "g", "tick")[0];
    let line = scene.select_children(tick, "line", "tick-line")[0];
    assert_eq!(scene.attr(line, "x2"), Some("-690"));
}

#[test]
fn insufficient_data_fails_fast() {
    let env = HeadlessEnvironment::new(Viewport::new(800.0, 1280.0));
    let one = vec![hourly().remove(0)];
    let mut chart = AreaChart::new(env, hourly_config(), Some(one)).unwrap();
    assert!(chart.render().is_err());
    assert!(chart.scene().select_all("area-group").is_empty());
    assert!(chart.env().subscriptions().is_empty());
}

#[test]
fn svg_export_contains_chart_structure() {
    let chart = mounted(hourly_config(), hourly(), 800.0);
    let svg = chart.scene().to_svg();

    assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
    for class in ["chart-group", "x-axis axis", "y-axis axis", "area-group", "tooltip-rect", "null-gap"] {
        assert!(svg.contains(&format!("class=\"{class}\"")), "missing {class}");
    }
}

#[test]
fn dropping_chart_releases_resize_subscription() {
    let env = SharedSubscriptions::default();
    let mut chart = AreaChart::new(env.clone(), hourly_config(), Some(hourly())).unwrap();
    chart.render().unwrap();
    let handler = chart.resize_handler().to_string();
    assert_eq!(*env.0.borrow(), vec![handler]);

    drop(chart);
    assert!(env.0.borrow().is_empty());
}

#[test]
fn wide_margins_fit_a_wide_container() {
    let mut config = hourly_config();
    config.margin = ChartMargin::new(35.0, 150.0, 35.0, 300.0);
    let chart = mounted(config, hourly(), 1200.0);
    assert_eq!(chart.frame().unwrap().chart_width(), 750.0);
}
