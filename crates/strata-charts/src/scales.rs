//! Coordinate mappings for one drawing pass

use tracing::debug;

use crate::{LinearScale, Layout, Scale, Stack, TimeScale};

/// Upper y bound used when every band is zero
const EMPTY_Y_MAX: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Scales {
    /// `[first bucket, last bucket + interval]` onto `[0, chart width]`, clamped
    pub x: TimeScale,
    /// `[0, max band bound]` onto `[chart height, 0]`, niced
    pub y: LinearScale,
    pub interval_ms: i64,
}

impl Scales {
    pub fn build(stack: &Stack, chart_width: f64, chart_height: f64) -> Self {
        let interval_ms = stack.interval_ms;
        let x = TimeScale::new()
            .domain(stack.first_time(), stack.last_time() + interval_ms)
            .range(0.0, chart_width)
            .clamp(true);

        let mut y_max = stack.max_value();
        if !(y_max > 0.0) {
            debug!(y_max, "degenerate value range, using unit domain");
            y_max = EMPTY_Y_MAX;
        }
        let y = LinearScale::new()
            .domain(0.0, y_max)
            .range(chart_height, 0.0)
            .nice();

        debug!(x_domain = ?x.domain_bounds(), y_domain = ?y.domain_bounds(), "scales built");

        Self { x, y, interval_ms }
    }

    /// Horizontal position where a bucket's point is drawn (its center)
    pub fn point_x(&self, time_ms: i64) -> f64 {
        self.x.scale(time_ms + self.interval_ms / 2)
    }

    /// Pixel width of the bucket starting at `time_ms`
    pub fn bucket_width(&self, time_ms: i64) -> f64 {
        self.x.scale(time_ms + self.interval_ms) - self.x.scale(time_ms)
    }

    pub fn y(&self, value: f64) -> f64 {
        self.y.scale(value)
    }
}

/// Everything derived from data and config for one drawing pass
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub layout: Layout,
    pub stack: Stack,
    pub scales: Scales,
}

impl Frame {
    pub fn new(layout: Layout, stack: Stack) -> Self {
        let scales = Scales::build(&stack, layout.chart_width, layout.chart_height);
        Self { layout, stack, scales }
    }

    pub fn chart_width(&self) -> f64 {
        self.layout.chart_width
    }

    pub fn chart_height(&self) -> f64 {
        self.layout.chart_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_stack;
    use strata_core::{StackOrder, TimeSeriesPoint};

    fn stack(values: &[f64]) -> Stack {
        let points: Vec<TimeSeriesPoint> = values
            .iter()
            .enumerate()
            .map(|(i, v)| TimeSeriesPoint::new(format!("2023-01-01T0{i}:00:00Z")).with_value("a", *v))
            .collect();
        build_stack(&points, &["a".to_string()], StackOrder::None).unwrap()
    }

    #[test]
    fn test_domains() {
        let s = stack(&[1.0, 2.7, 0.5]);
        let scales = Scales::build(&s, 300.0, 100.0);

        let (x0, x1) = scales.x.domain_bounds();
        assert_eq!(x1 - x0, 3 * 3_600_000);
        assert_eq!(scales.y.domain_bounds(), (0.0, 2.8));
        assert_eq!(scales.y(0.0), 100.0);
        assert_eq!(scales.y(2.8), 0.0);
    }

    #[test]
    fn test_point_centered_in_bucket() {
        let s = stack(&[1.0, 1.0, 1.0]);
        let scales = Scales::build(&s, 300.0, 100.0);
        assert_eq!(scales.point_x(s.times[0]), 50.0);
        assert_eq!(scales.bucket_width(s.times[1]), 100.0);
    }

    #[test]
    fn test_all_zero_uses_unit_domain() {
        let s = stack(&[0.0, 0.0]);
        let scales = Scales::build(&s, 300.0, 100.0);
        assert_eq!(scales.y.domain_bounds(), (0.0, 1.0));
    }
}
