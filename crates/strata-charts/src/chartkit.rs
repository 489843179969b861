//! # chartkit
//!
//! Core chart primitives: scales, curve interpolators, path builders.
//! Implements Strategy pattern for flexible scale and curve behaviors.

use std::fmt::Write;

use strata_core::CurveKind;

// Thresholds used when rounding a tick step to 1, 2, 5 or 10
const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = 1.4142135623730951; // sqrt(2)

/// Format a coordinate for SVG attributes: integers without a fraction, other
/// values rounded to 1e-6 with trailing zeros dropped.
pub fn fmt_num(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded == 0.0 {
        // collapses -0
        return "0".to_string();
    }
    format!("{}", rounded)
}

// ============================================================================
// STRATEGY PATTERN: Scale Trait
// ============================================================================

/// Strategy trait for scales (maps domain values to range values)
pub trait Scale: Send + Sync {
    /// Scale a value from domain to range
    fn scale(&self, value: f64) -> f64;

    /// Inverse scale (range to domain)
    fn invert(&self, value: f64) -> f64;

    /// Generate tick values
    fn ticks(&self, count: usize) -> Vec<f64>;
}

// ============================================================================
// TICK ARITHMETIC
// ============================================================================

fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let scale = 10f64.powf(-power) / factor;
        i1 = (start * scale).round();
        i2 = (stop * scale).round();
        if i1 / scale < start {
            i1 += 1.0;
        }
        if i2 / scale > stop {
            i2 -= 1.0;
        }
        inc = -scale;
    } else {
        let scale = 10f64.powf(power) * factor;
        i1 = (start / scale).round();
        i2 = (stop / scale).round();
        if i1 * scale < start {
            i1 += 1.0;
        }
        if i2 * scale > stop {
            i2 -= 1.0;
        }
        inc = scale;
    }

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

/// Signed tick step: positive for steps >= 1, negative reciprocal otherwise
pub fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    tick_spec(start, stop, count as f64).2
}

/// Roughly `count` evenly spaced, human friendly values within `[start, stop]`
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }

    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };
    let (i1, i2, inc) = tick_spec(lo, hi, count as f64);
    if !(i2 >= i1) {
        return Vec::new();
    }

    let n = (i2 - i1 + 1.0) as usize;
    let mut out: Vec<f64> = (0..n)
        .map(|i| {
            let k = i1 + i as f64;
            if inc < 0.0 { k / -inc } else { k * inc }
        })
        .collect();

    if reverse {
        out.reverse();
    }
    out
}

// ============================================================================
// LINEAR SCALE
// ============================================================================

/// Linear scale (D3-style continuous scale)
#[derive(Debug, Clone, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
    clamp: bool,
}

impl LinearScale {
    pub fn new() -> Self {
        Self {
            domain: (0.0, 1.0),
            range: (0.0, 1.0),
            clamp: false,
        }
    }

    pub fn domain(mut self, min: f64, max: f64) -> Self {
        self.domain = (min, max);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = (min, max);
        self
    }

    pub fn clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    /// Extend the domain outward to round tick values (d3 `nice(10)`)
    pub fn nice(self) -> Self {
        self.nice_with(10)
    }

    pub fn nice_with(mut self, count: usize) -> Self {
        let (mut start, mut stop) = self.domain;
        let reversed = stop < start;
        if reversed {
            std::mem::swap(&mut start, &mut stop);
        }

        let mut prestep = None;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count);
            if prestep == Some(step) {
                break;
            } else if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            prestep = Some(step);
        }

        self.domain = if reversed { (stop, start) } else { (start, stop) };
        self
    }

    /// Get domain bounds
    pub fn domain_bounds(&self) -> (f64, f64) {
        self.domain
    }

    /// Get range bounds
    pub fn range_bounds(&self) -> (f64, f64) {
        self.range
    }
}

impl Default for LinearScale {
    fn default() -> Self {
        Self::new()
    }
}

impl Scale for LinearScale {
    fn scale(&self, value: f64) -> f64 {
        let (d_min, d_max) = self.domain;
        let (r_min, r_max) = self.range;

        if (d_max - d_min).abs() < f64::EPSILON {
            return (r_min + r_max) / 2.0;
        }

        let mut normalized = (value - d_min) / (d_max - d_min);

        if self.clamp {
            normalized = normalized.clamp(0.0, 1.0);
        }

        r_min + normalized * (r_max - r_min)
    }

    fn invert(&self, value: f64) -> f64 {
        let (d_min, d_max) = self.domain;
        let (r_min, r_max) = self.range;

        if (r_max - r_min).abs() < f64::EPSILON {
            return (d_min + d_max) / 2.0;
        }

        let normalized = (value - r_min) / (r_max - r_min);
        d_min + normalized * (d_max - d_min)
    }

    fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }
}

// ============================================================================
// TIME SCALE
// ============================================================================

/// Time scale (maps timestamps to pixel positions)
#[derive(Debug, Clone, PartialEq)]
pub struct TimeScale {
    domain: (i64, i64), // milliseconds on the wall-clock axis
    range: (f64, f64),
    clamp: bool,
}

impl TimeScale {
    pub fn new() -> Self {
        Self {
            domain: (0, 1),
            range: (0.0, 1.0),
            clamp: false,
        }
    }

    pub fn domain(mut self, min: i64, max: i64) -> Self {
        self.domain = (min, max);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = (min, max);
        self
    }

    pub fn clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn domain_bounds(&self) -> (i64, i64) {
        self.domain
    }

    pub fn range_bounds(&self) -> (f64, f64) {
        self.range
    }

    /// Scale timestamp to pixel position
    pub fn scale(&self, timestamp: i64) -> f64 {
        let (d_min, d_max) = self.domain;
        let (r_min, r_max) = self.range;

        if d_max == d_min {
            return (r_min + r_max) / 2.0;
        }

        let mut normalized = (timestamp - d_min) as f64 / (d_max - d_min) as f64;
        if self.clamp {
            normalized = normalized.clamp(0.0, 1.0);
        }
        r_min + normalized * (r_max - r_min)
    }

    /// Inverse scale (pixel to timestamp)
    pub fn invert(&self, value: f64) -> i64 {
        let (d_min, d_max) = self.domain;
        let (r_min, r_max) = self.range;

        if (r_max - r_min).abs() < f64::EPSILON {
            return (d_min + d_max) / 2;
        }

        let mut normalized = (value - r_min) / (r_max - r_min);
        if self.clamp {
            normalized = normalized.clamp(0.0, 1.0);
        }
        (d_min as f64 + normalized * (d_max - d_min) as f64).round() as i64
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// PATH BUILDER (fluent API)
// ============================================================================

/// SVG path builder with fluent API
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    commands: String,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            commands: String::with_capacity(256),
        }
    }

    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        let _ = write!(self.commands, "M{:.2},{:.2}", x, y);
        self
    }

    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        let _ = write!(self.commands, "L{:.2},{:.2}", x, y);
        self
    }

    pub fn horizontal_to(mut self, x: f64) -> Self {
        let _ = write!(self.commands, "H{:.2}", x);
        self
    }

    pub fn vertical_to(mut self, y: f64) -> Self {
        let _ = write!(self.commands, "V{:.2}", y);
        self
    }

    pub fn cubic_to(mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) -> Self {
        let _ = write!(
            self.commands,
            "C{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
            x1, y1, x2, y2, x, y
        );
        self
    }

    /// Append curve segments that start at the current point
    pub fn segments(self, segments: &[Segment]) -> Self {
        segments.iter().fold(self, |builder, seg| match *seg {
            Segment::Line { x, y } => builder.line_to(x, y),
            Segment::Cubic { c1, c2, to } => builder.cubic_to(c1.0, c1.1, c2.0, c2.1, to.0, to.1),
        })
    }

    pub fn close(mut self) -> Self {
        self.commands.push('Z');
        self
    }

    pub fn build(self) -> String {
        self.commands
    }
}

// ============================================================================
// STRATEGY PATTERN: Curve interpolation
// ============================================================================

/// One drawing command continuing from the previous end point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line { x: f64, y: f64 },
    Cubic {
        c1: (f64, f64),
        c2: (f64, f64),
        to: (f64, f64),
    },
}

impl Segment {
    pub fn end(&self) -> (f64, f64) {
        match *self {
            Self::Line { x, y } => (x, y),
            Self::Cubic { to, .. } => to,
        }
    }
}

/// Strategy trait for curves through a run of points
pub trait Curve: Send + Sync {
    /// Segments leading from `points[0]` through the rest of the run
    fn segments(&self, points: &[(f64, f64)]) -> Vec<Segment>;
}

/// Straight lines between points
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearCurve;

impl Curve for LinearCurve {
    fn segments(&self, points: &[(f64, f64)]) -> Vec<Segment> {
        points.iter().skip(1).map(|&(x, y)| Segment::Line { x, y }).collect()
    }
}

/// Piecewise constant curve. `t` is where the vertical step sits between two
/// points: 0 before, 0.5 midway, 1 after.
#[derive(Debug, Clone, Copy)]
pub struct StepCurve {
    pub t: f64,
}

impl StepCurve {
    pub const MIDDLE: Self = Self { t: 0.5 };
    pub const BEFORE: Self = Self { t: 0.0 };
    pub const AFTER: Self = Self { t: 1.0 };
}

impl Curve for StepCurve {
    fn segments(&self, points: &[(f64, f64)]) -> Vec<Segment> {
        let mut out = Vec::with_capacity(points.len() * 2);
        for pair in points.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            if self.t <= 0.0 {
                out.push(Segment::Line { x: x0, y: y1 });
            } else {
                let xm = x0 * (1.0 - self.t) + x1 * self.t;
                out.push(Segment::Line { x: xm, y: y0 });
                out.push(Segment::Line { x: xm, y: y1 });
            }
            out.push(Segment::Line { x: x1, y: y1 });
        }
        out
    }
}

/// Cubic spline preserving monotonicity in y, assuming monotonic x
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotoneXCurve;

impl MonotoneXCurve {
    fn slope3(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64)) -> f64 {
        let h0 = p1.0 - p0.0;
        let h1 = p2.0 - p1.0;
        let s0 = if h0 != 0.0 { (p1.1 - p0.1) / h0 } else { 0.0 };
        let s1 = if h1 != 0.0 { (p2.1 - p1.1) / h1 } else { 0.0 };
        let p = if h0 + h1 != 0.0 { (s0 * h1 + s1 * h0) / (h0 + h1) } else { 0.0 };
        let sign = |v: f64| if v < 0.0 { -1.0 } else { 1.0 };
        let t = (sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs());
        if t.is_finite() { t } else { 0.0 }
    }

    fn slope2(p0: (f64, f64), p1: (f64, f64), t: f64) -> f64 {
        let h = p1.0 - p0.0;
        if h != 0.0 { (3.0 * (p1.1 - p0.1) / h - t) / 2.0 } else { t }
    }
}

impl Curve for MonotoneXCurve {
    fn segments(&self, points: &[(f64, f64)]) -> Vec<Segment> {
        let n = points.len();
        if n < 3 {
            return LinearCurve.segments(points);
        }

        let mut tangents = vec![0.0; n];
        for i in 1..n - 1 {
            tangents[i] = Self::slope3(points[i - 1], points[i], points[i + 1]);
        }
        tangents[0] = Self::slope2(points[0], points[1], tangents[1]);
        tangents[n - 1] = Self::slope2(points[n - 2], points[n - 1], tangents[n - 2]);

        (0..n - 1)
            .map(|i| {
                let (x0, y0) = points[i];
                let (x1, y1) = points[i + 1];
                let dx = (x1 - x0) / 3.0;
                Segment::Cubic {
                    c1: (x0 + dx, y0 + dx * tangents[i]),
                    c2: (x1 - dx, y1 - dx * tangents[i + 1]),
                    to: (x1, y1),
                }
            })
            .collect()
    }
}

/// Uniform cubic B-spline clamped to the first and last points
#[derive(Debug, Clone, Copy, Default)]
pub struct BasisCurve;

impl BasisCurve {
    fn bezier(p0: (f64, f64), p1: (f64, f64), p: (f64, f64)) -> Segment {
        Segment::Cubic {
            c1: ((2.0 * p0.0 + p1.0) / 3.0, (2.0 * p0.1 + p1.1) / 3.0),
            c2: ((p0.0 + 2.0 * p1.0) / 3.0, (p0.1 + 2.0 * p1.1) / 3.0),
            to: ((p0.0 + 4.0 * p1.0 + p.0) / 6.0, (p0.1 + 4.0 * p1.1 + p.1) / 6.0),
        }
    }
}

impl Curve for BasisCurve {
    fn segments(&self, points: &[(f64, f64)]) -> Vec<Segment> {
        let n = points.len();
        if n < 3 {
            return LinearCurve.segments(points);
        }

        let (p0, p1) = (points[0], points[1]);
        let mut out = vec![Segment::Line {
            x: (5.0 * p0.0 + p1.0) / 6.0,
            y: (5.0 * p0.1 + p1.1) / 6.0,
        }];
        for i in 2..n {
            out.push(Self::bezier(points[i - 2], points[i - 1], points[i]));
        }
        let (last, before) = (points[n - 1], points[n - 2]);
        out.push(Self::bezier(before, last, last));
        out.push(Segment::Line { x: last.0, y: last.1 });
        out
    }
}

/// Curve strategy for a configured curve kind
pub fn curve_for(kind: CurveKind) -> Box<dyn Curve> {
    match kind {
        CurveKind::Linear => Box::new(LinearCurve),
        CurveKind::Step => Box::new(StepCurve::MIDDLE),
        CurveKind::StepBefore => Box::new(StepCurve::BEFORE),
        CurveKind::StepAfter => Box::new(StepCurve::AFTER),
        CurveKind::MonotoneX => Box::new(MonotoneXCurve),
        CurveKind::Basis => Box::new(BasisCurve),
    }
}

/// The same geometry traversed from the last point back to `start`
pub fn reverse_segments(start: (f64, f64), segments: &[Segment]) -> Vec<Segment> {
    let mut ends: Vec<(f64, f64)> = Vec::with_capacity(segments.len() + 1);
    ends.push(start);
    ends.extend(segments.iter().map(Segment::end));

    segments
        .iter()
        .enumerate()
        .rev()
        .map(|(i, seg)| {
            let (x, y) = ends[i];
            match *seg {
                Segment::Line { .. } => Segment::Line { x, y },
                Segment::Cubic { c1, c2, .. } => Segment::Cubic { c1: c2, c2: c1, to: (x, y) },
            }
        })
        .collect()
}

// ============================================================================
// AREA / LINE PATHS
// ============================================================================

/// One defined point of a band: x plus lower and upper y in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPoint {
    pub x: f64,
    pub y0: f64,
    pub y1: f64,
}

/// Closed path filling between the upper and lower edge of a run
pub fn area_path(run: &[BandPoint], curve: &dyn Curve) -> String {
    let (Some(first), Some(last)) = (run.first(), run.last()) else {
        return String::new();
    };

    let top: Vec<(f64, f64)> = run.iter().map(|p| (p.x, p.y1)).collect();
    let bottom: Vec<(f64, f64)> = run.iter().map(|p| (p.x, p.y0)).collect();
    let bottom_segments = curve.segments(&bottom);

    PathBuilder::new()
        .move_to(first.x, first.y1)
        .segments(&curve.segments(&top))
        .line_to(last.x, last.y0)
        .segments(&reverse_segments((first.x, first.y0), &bottom_segments))
        .close()
        .build()
}

/// Open path along the upper edge of a run
pub fn line_path(run: &[BandPoint], curve: &dyn Curve) -> String {
    let Some(first) = run.first() else {
        return String::new();
    };

    let top: Vec<(f64, f64)> = run.iter().map(|p| (p.x, p.y1)).collect();
    PathBuilder::new()
        .move_to(first.x, first.y1)
        .segments(&curve.segments(&top))
        .build()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_scale() {
        let scale = LinearScale::new().domain(0.0, 100.0).range(0.0, 500.0);

        assert_eq!(scale.scale(0.0), 0.0);
        assert_eq!(scale.scale(50.0), 250.0);
        assert_eq!(scale.scale(100.0), 500.0);
        assert_eq!(scale.invert(250.0), 50.0);
    }

    #[test]
    fn test_nice_domain() {
        let scale = LinearScale::new().domain(0.0, 3.0).nice();
        assert_eq!(scale.domain_bounds(), (0.0, 3.0));

        let scale = LinearScale::new().domain(0.0, 97.3).nice();
        assert_eq!(scale.domain_bounds(), (0.0, 100.0));

        let scale = LinearScale::new().domain(0.0, 0.47).nice();
        assert_relative_eq!(scale.domain_bounds().1, 0.5);
    }

    #[test]
    fn test_ticks() {
        assert_eq!(ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(ticks(0.0, 3.0, 6), vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0]);
        assert_eq!(ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(ticks(5.0, 5.0, 5), vec![5.0]);
        assert!(ticks(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_time_scale_clamps() {
        let scale = TimeScale::new().domain(0, 1000).range(0.0, 100.0).clamp(true);
        assert_eq!(scale.scale(500), 50.0);
        assert_eq!(scale.scale(2000), 100.0);
        assert_eq!(scale.scale(-10), 0.0);
        assert_eq!(scale.invert(25.0), 250);
    }

    #[test]
    fn test_path_builder() {
        let path = PathBuilder::new()
            .move_to(0.0, 0.0)
            .line_to(100.0, 100.0)
            .close()
            .build();

        assert_eq!(path, "M0.00,0.00L100.00,100.00Z");
    }

    #[test]
    fn test_step_curves() {
        let pts = [(0.0, 0.0), (10.0, 5.0)];
        assert_eq!(
            StepCurve::MIDDLE.segments(&pts),
            vec![
                Segment::Line { x: 5.0, y: 0.0 },
                Segment::Line { x: 5.0, y: 5.0 },
                Segment::Line { x: 10.0, y: 5.0 },
            ]
        );
        assert_eq!(
            StepCurve::BEFORE.segments(&pts),
            vec![Segment::Line { x: 0.0, y: 5.0 }, Segment::Line { x: 10.0, y: 5.0 }]
        );
    }

    #[test]
    fn test_monotone_stays_flat_on_plateau() {
        let pts = [(0.0, 1.0), (1.0, 1.0), (2.0, 1.0)];
        for seg in MonotoneXCurve.segments(&pts) {
            let Segment::Cubic { c1, c2, .. } = seg else {
                panic!("expected cubic");
            };
            assert_eq!(c1.1, 1.0);
            assert_eq!(c2.1, 1.0);
        }
    }

    #[test]
    fn test_basis_ends_on_last_point() {
        let pts = [(0.0, 0.0), (1.0, 2.0), (2.0, 0.0), (3.0, 2.0)];
        let segs = BasisCurve.segments(&pts);
        assert_eq!(segs.last().map(Segment::end), Some((3.0, 2.0)));
    }

    #[test]
    fn test_reverse_segments() {
        let segs = LinearCurve.segments(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let rev = reverse_segments((0.0, 0.0), &segs);
        assert_eq!(
            rev,
            vec![Segment::Line { x: 1.0, y: 1.0 }, Segment::Line { x: 0.0, y: 0.0 }]
        );
    }

    #[test]
    fn test_area_and_line_paths() {
        let run = [
            BandPoint { x: 0.0, y0: 10.0, y1: 5.0 },
            BandPoint { x: 10.0, y0: 10.0, y1: 2.0 },
        ];
        assert_eq!(
            area_path(&run, &LinearCurve),
            "M0.00,5.00L10.00,2.00L10.00,10.00L0.00,10.00Z"
        );
        assert_eq!(line_path(&run, &LinearCurve), "M0.00,5.00L10.00,2.00");
        assert!(area_path(&[], &LinearCurve).is_empty());
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(270.0), "270");
        assert_eq!(fmt_num(12.5), "12.5");
        assert_eq!(fmt_num(-0.0), "0");
        assert_eq!(fmt_num(1.0 / 3.0), "0.333333");
    }
}
