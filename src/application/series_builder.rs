// Series builder - Turns gauge readings into plottable series
use crate::domain::iso8601::parse_date_from_iso8601;
use crate::domain::meter::{Gauge, Meter};
use crate::domain::series::{Bounds, ChangePoint, ChangeSeries, Sample, Series};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Point series and change series of every numeric gauge, in gauge order
#[derive(Debug, Clone, Default)]
pub struct ChartSeries {
    pub series: Vec<Series>,
    pub change_series: Vec<ChangeSeries>,
}

impl ChartSeries {
    /// Combined time range of all point series
    pub fn x_range(&self) -> Option<(i64, i64)> {
        self.series.iter().fold(None, |range, s| match range {
            None => Some((s.bounds.min_x, s.bounds.max_x)),
            Some((min_x, max_x)) => Some((min_x.min(s.bounds.min_x), max_x.max(s.bounds.max_x))),
        })
    }
}

pub fn build_series(meters: &[Meter]) -> ChartSeries {
    let mut chart = ChartSeries::default();
    let mut axis = 1;

    for meter in meters {
        for gauge in meter.gauges() {
            if gauge.is_comment() {
                continue;
            }
            if let Some((series, change)) = build_dataset(Some(gauge), axis) {
                chart.series.push(series);
                chart.change_series.push(change);
                axis += 1;
            }
        }
    }

    tracing::debug!("Built {} series from {} meters", chart.series.len(), meters.len());
    chart
}

/// Build the point and change series of one gauge in a single forward pass.
/// Returns `None` for a missing gauge, a comment gauge or a gauge without usable values.
pub fn build_dataset(gauge: Option<&Gauge>, axis: usize) -> Option<(Series, ChangeSeries)> {
    let gauge = gauge.filter(|g| !g.is_comment())?;
    let mut samples = parse_samples(gauge).into_iter();

    let first = samples.next()?;
    let mut bounds = Bounds::of(first);
    let mut points = vec![first];
    let mut changes = vec![ChangePoint {
        time_ms: first.time_ms,
        value: None,
    }];

    let mut previous = first;
    for sample in samples {
        bounds.include(sample);
        points.push(sample);
        changes.push(ChangePoint {
            time_ms: sample.time_ms,
            value: change_between(previous, sample, gauge.cumulative),
        });
        previous = sample;
    }

    let series = Series {
        gauge_id: gauge.id.clone(),
        label: gauge.name.clone(),
        unit: gauge.unit().to_string(),
        axis,
        bounds,
        samples: points,
    };
    let change = ChangeSeries {
        gauge_id: gauge.id.clone(),
        label: gauge.name.clone(),
        min_x: bounds.min_x,
        max_x: bounds.max_x,
        y_pan_min: gauge.min,
        points: changes,
    };
    Some((series, change))
}

/// Cumulative gauges report the change per day, others the raw difference.
/// Readings sharing a timestamp have no daily change.
fn change_between(previous: Sample, current: Sample, cumulative: bool) -> Option<f64> {
    let difference = current.value - previous.value;
    if !cumulative {
        return Some(difference);
    }
    let elapsed_days = (current.time_ms - previous.time_ms) as f64 / MS_PER_DAY;
    if elapsed_days == 0.0 {
        return None;
    }
    Some(difference / elapsed_days)
}

fn parse_samples(gauge: &Gauge) -> Vec<Sample> {
    gauge
        .values()
        .iter()
        .filter_map(|v| {
            let time_ms = match parse_date_from_iso8601(&v.updated) {
                Ok(time_ms) => time_ms,
                Err(e) => {
                    tracing::warn!("Skipping value of gauge {}: {}", gauge.id, e);
                    return None;
                }
            };
            let Some(reading) = &v.value else {
                tracing::warn!("Skipping reading of gauge {} at {} without value", gauge.id, v.updated);
                return None;
            };
            let Some(value) = reading.as_f64() else {
                tracing::warn!("Skipping non-numeric value '{}' of gauge {}", reading, gauge.id);
                return None;
            };
            Some(Sample::new(time_ms, value))
        })
        .collect()
}
