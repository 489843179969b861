//! Stacking of per-timestamp records into cumulative per-series bands

use strata_core::{to_millis, ChartError, ChartResult, StackOrder, TimeSeriesPoint};
use tracing::{debug, warn};

/// Minimum number of points needed to derive the bucket interval
pub const MIN_POINTS: usize = 2;

/// One series' slice of one time bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// Sum of the series stacked below
    pub y0: f64,
    /// `y0` plus this series' value
    pub y1: f64,
    /// Source value; `None` marks a gap
    pub value: Option<f64>,
    /// Position of the source point
    pub point: usize,
    pub time_ms: i64,
}

impl Band {
    pub fn is_gap(&self) -> bool {
        self.value.is_none()
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackedSeries {
    pub key: String,
    /// Stacking position: 0 sits on the baseline, higher indices on top
    pub index: usize,
    pub bands: Vec<Band>,
}

/// Output of the stack builder, series in key order
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    pub series: Vec<StackedSeries>,
    /// Bucket start times in milliseconds
    pub times: Vec<i64>,
    /// Distance between the first two buckets
    pub interval_ms: i64,
}

impl Stack {
    /// Largest band bound across all series (0 when everything is empty)
    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.bands.iter())
            .map(|b| b.y0.max(b.y1))
            .fold(0.0, f64::max)
    }

    pub fn first_time(&self) -> i64 {
        self.times.first().copied().unwrap_or_default()
    }

    pub fn last_time(&self) -> i64 {
        self.times.last().copied().unwrap_or_default()
    }

    pub fn series(&self, key: &str) -> Option<&StackedSeries> {
        self.series.iter().find(|s| s.key == key)
    }
}

/// Parsed bucket times, checked for count and strict ascending order
pub fn bucket_times(points: &[TimeSeriesPoint]) -> ChartResult<Vec<i64>> {
    if points.len() < MIN_POINTS {
        return Err(ChartError::InsufficientData {
            required: MIN_POINTS,
            actual: points.len(),
        });
    }

    let mut times = Vec::with_capacity(points.len());
    for (index, point) in points.iter().enumerate() {
        let time = point.time().ok_or_else(|| ChartError::InvalidTimestamp {
            index,
            value: point.timestamp.clone(),
        })?;
        let ms = to_millis(&time);
        if times.last().is_some_and(|&prev| ms <= prev) {
            return Err(ChartError::UnsortedData { index });
        }
        times.push(ms);
    }
    Ok(times)
}

/// Stack `keys` of `points` on a zero baseline.
///
/// Nulls and missing fields contribute 0 to the stack and are kept as gaps.
pub fn build_stack(points: &[TimeSeriesPoint], keys: &[String], order: StackOrder) -> ChartResult<Stack> {
    let times = bucket_times(points)?;
    let interval_ms = times[1] - times[0];

    for key in keys {
        if !points.iter().any(|p| p.has_key(key)) {
            warn!(key = %key, "series key missing from every point");
        }
    }

    let values: Vec<Vec<Option<f64>>> = keys
        .iter()
        .map(|key| points.iter().map(|p| p.value(key)).collect())
        .collect();

    let stacking = stack_order(&values, order);

    let mut series: Vec<StackedSeries> = keys
        .iter()
        .map(|key| StackedSeries {
            key: key.clone(),
            index: 0,
            bands: Vec::with_capacity(points.len()),
        })
        .collect();

    let mut baseline = vec![0.0; points.len()];
    for (position, &s) in stacking.iter().enumerate() {
        series[s].index = position;
        for (j, value) in values[s].iter().enumerate() {
            let y0 = baseline[j];
            let y1 = y0 + value.unwrap_or(0.0);
            baseline[j] = y1;
            series[s].bands.push(Band {
                y0,
                y1,
                value: *value,
                point: j,
                time_ms: times[j],
            });
        }
    }

    debug!(
        series = series.len(),
        points = points.len(),
        interval_ms,
        ?order,
        "stack built"
    );

    Ok(Stack {
        series,
        times,
        interval_ms,
    })
}

// ============================================================================
// STACK ORDERS
// ============================================================================

/// Series indices from bottom to top of the stack
pub fn stack_order(values: &[Vec<Option<f64>>], order: StackOrder) -> Vec<usize> {
    let none: Vec<usize> = (0..values.len()).collect();
    match order {
        StackOrder::None => none,
        StackOrder::Reverse => none.into_iter().rev().collect(),
        StackOrder::Ascending => ascending(values),
        StackOrder::Descending => ascending(values).into_iter().rev().collect(),
        StackOrder::Appearance => appearance(values),
        StackOrder::InsideOut => inside_out(values),
    }
}

fn sum(series: &[Option<f64>]) -> f64 {
    series.iter().flatten().sum()
}

/// Index of the largest value (first one on ties)
fn peak(series: &[Option<f64>]) -> usize {
    let mut best = f64::NEG_INFINITY;
    let mut at = 0;
    for (i, v) in series.iter().enumerate() {
        if let Some(v) = *v {
            if v > best {
                best = v;
                at = i;
            }
        }
    }
    at
}

fn ascending(values: &[Vec<Option<f64>>]) -> Vec<usize> {
    let sums: Vec<f64> = values.iter().map(|s| sum(s)).collect();
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| sums[a].total_cmp(&sums[b]));
    order
}

fn appearance(values: &[Vec<Option<f64>>]) -> Vec<usize> {
    let peaks: Vec<usize> = values.iter().map(|s| peak(s)).collect();
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by_key(|&i| peaks[i]);
    order
}

/// Earliest peaks in the middle, later ones alternating outward
fn inside_out(values: &[Vec<Option<f64>>]) -> Vec<usize> {
    let sums: Vec<f64> = values.iter().map(|s| sum(s)).collect();
    let (mut top, mut bottom) = (0.0, 0.0);
    let (mut tops, mut bottoms) = (Vec::new(), Vec::new());

    for j in appearance(values) {
        if top < bottom {
            top += sums[j];
            tops.push(j);
        } else {
            bottom += sums[j];
            bottoms.push(j);
        }
    }

    bottoms.reverse();
    bottoms.extend(tops);
    bottoms
}
