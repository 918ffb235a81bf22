// Chart series domain models
use serde::Serialize;

/// A parsed reading: epoch milliseconds and numeric value. Serialized as `[time, value]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "(i64, f64)")]
pub struct Sample {
    pub time_ms: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

impl From<Sample> for (i64, f64) {
    fn from(sample: Sample) -> Self {
        (sample.time_ms, sample.value)
    }
}

/// Running min/max of both axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn of(sample: Sample) -> Self {
        Self {
            min_x: sample.time_ms,
            max_x: sample.time_ms,
            min_y: sample.value,
            max_y: sample.value,
        }
    }

    pub fn include(&mut self, sample: Sample) {
        self.min_x = self.min_x.min(sample.time_ms);
        self.max_x = self.max_x.max(sample.time_ms);
        self.min_y = self.min_y.min(sample.value);
        self.max_y = self.max_y.max(sample.value);
    }
}

/// Point series of one numeric gauge, plotted on its own y-axis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub gauge_id: String,
    pub label: String,
    pub unit: String,
    /// 1-based y-axis number in the main chart
    pub axis: usize,
    pub bounds: Bounds,
    #[serde(rename = "data")]
    pub samples: Vec<Sample>,
}

/// Bar point of a change series; the first point has no predecessor and no value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "(i64, Option<f64>)")]
pub struct ChangePoint {
    pub time_ms: i64,
    pub value: Option<f64>,
}

impl From<ChangePoint> for (i64, Option<f64>) {
    fn from(point: ChangePoint) -> Self {
        (point.time_ms, point.value)
    }
}

/// Change between consecutive readings, per day for cumulative gauges
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSeries {
    pub gauge_id: String,
    pub label: String,
    pub min_x: i64,
    pub max_x: i64,
    /// Lower pan limit of the y-axis, the gauge's configured minimum
    pub y_pan_min: Option<f64>,
    #[serde(rename = "data")]
    pub points: Vec<ChangePoint>,
}
