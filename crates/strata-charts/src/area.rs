//! Stacked area bands, outline strokes and null-gap highlights

use strata_core::ChartConfig;
use tracing::debug;

use crate::{
    area_path, bind, colors, curve_for, ensure, fmt_num, line_path, BandPoint, BindKey, Curve,
    Frame, NodeId, Scales, Scene, StackedSeries,
};

/// Opacity of the rectangle marking a null bucket
pub const NULL_GAP_OPACITY: f64 = 0.15;

/// Contiguous runs of defined bands in pixel space. A gap ends the current
/// run, so no segment ever spans a null bucket.
pub fn defined_runs(series: &StackedSeries, scales: &Scales) -> Vec<Vec<BandPoint>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for band in &series.bands {
        if band.is_gap() {
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(BandPoint {
            x: scales.point_x(band.time_ms),
            y0: scales.y(band.y0),
            y1: scales.y(band.y1),
        });
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Filled band path, one subpath per defined run
pub fn series_area_path(series: &StackedSeries, scales: &Scales, curve: &dyn Curve) -> String {
    defined_runs(series, scales)
        .iter()
        .map(|run| area_path(run, curve))
        .collect()
}

/// Outline along the top of the band, one subpath per defined run
pub fn series_line_path(series: &StackedSeries, scales: &Scales, curve: &dyn Curve) -> String {
    defined_runs(series, scales)
        .iter()
        .map(|run| line_path(run, curve))
        .collect()
}

/// Draw one `g.area-group` per series inside `g.series`
pub fn render_areas(scene: &mut Scene, chart: NodeId, config: &ChartConfig, frame: &Frame) {
    let area_cfg = &config.area;
    let curve = curve_for(area_cfg.curve);
    let scales = &frame.scales;
    let highlight = config.null_data.draws_gap_highlights();

    let container = ensure(scene, chart, "g", "series");
    let groups = bind(scene, container, "g", "area-group", &frame.stack.series, |s, _| {
        BindKey::Id(s.key.clone())
    });

    for (series, group) in frame.stack.series.iter().zip(groups) {
        let color = frame
            .layout
            .color_for(&series.key)
            .unwrap_or(colors::SERIES_PRIMARY)
            .to_string();
        scene.set_attr(group, "data-name", series.key.as_str());

        let area = ensure(scene, group, "path", "area");
        scene.set_attr(area, "data-name", series.key.as_str());
        scene.set_attr(area, "fill", color.as_str());
        scene.set_attr(area, "d", series_area_path(series, scales, curve.as_ref()));
        let display = (!area_cfg.visible).then(|| "none".to_string());
        scene.set_attr_opt(area, "display", display);

        let line = ensure(scene, group, "path", "line");
        scene.set_attr(line, "fill", "none");
        scene.set_attr(line, "stroke", area_cfg.line_color.as_deref().unwrap_or("none"));
        scene.set_attr(line, "d", series_line_path(series, scales, curve.as_ref()));

        let gaps: Vec<_> = if highlight {
            series.bands.iter().filter(|b| b.is_gap()).collect()
        } else {
            Vec::new()
        };
        let rects = bind(scene, group, "rect", "null-gap", &gaps, |b, _| {
            BindKey::Index(b.point)
        });
        for (band, rect) in gaps.iter().zip(rects) {
            scene.set_attr(rect, "x", fmt_num(scales.x.scale(band.time_ms)));
            scene.set_attr(rect, "y", "0");
            scene.set_attr(rect, "width", fmt_num(scales.bucket_width(band.time_ms)));
            scene.set_attr(rect, "height", fmt_num(frame.chart_height()));
            scene.set_attr(rect, "fill", color.as_str());
            scene.set_attr(rect, "fill-opacity", fmt_num(NULL_GAP_OPACITY));
            scene.set_attr(rect, "pointer-events", "none");
        }

        if !gaps.is_empty() {
            debug!(key = %series.key, gaps = gaps.len(), "null gaps highlighted");
        }
    }

    debug!(series = frame.stack.series.len(), curve = ?area_cfg.curve, "areas drawn");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_stack, LinearCurve, Stack};
    use strata_core::{StackOrder, TimeSeriesPoint};

    fn stack() -> Stack {
        let rows = [(1.0, Some(2.0)), (2.0, Some(1.0)), (1.0, None), (1.0, Some(1.0))];
        let points: Vec<TimeSeriesPoint> = rows
            .iter()
            .enumerate()
            .map(|(i, (a, b))| {
                TimeSeriesPoint::new(format!("2023-01-01T0{i}:00:00Z"))
                    .with_value("a", *a)
                    .with_value("b", *b)
            })
            .collect();
        build_stack(&points, &["a".to_string(), "b".to_string()], StackOrder::None).unwrap()
    }

    #[test]
    fn test_gap_splits_runs() {
        let s = stack();
        let scales = Scales::build(&s, 400.0, 100.0);
        let b = s.series("b").unwrap();

        let runs = defined_runs(b, &scales);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1].len(), 1);

        let line = series_line_path(b, &scales, &LinearCurve);
        assert_eq!(line.matches('M').count(), 2);

        let a = s.series("a").unwrap();
        assert_eq!(defined_runs(a, &scales).len(), 1);
    }

    #[test]
    fn test_runs_use_bucket_centers() {
        let s = stack();
        let scales = Scales::build(&s, 400.0, 100.0);
        let runs = defined_runs(s.series("a").unwrap(), &scales);
        let xs: Vec<f64> = runs[0].iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![50.0, 150.0, 250.0, 350.0]);
    }
}
