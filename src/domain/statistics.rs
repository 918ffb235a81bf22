// Cost rates derived from cumulative readings
use super::series::Sample;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trailing window used to normalise a cost rate. A month is a fixed 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostWindow {
    Day,
    Week,
    Month,
}

impl CostWindow {
    pub fn millis(self) -> i64 {
        match self {
            CostWindow::Day => 86_400_000,
            CostWindow::Week => 604_800_000,
            CostWindow::Month => 2_592_000_000,
        }
    }
}

/// Price per unit, keyed by the gauge unit string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Vec<UnitPrice>")]
pub struct PriceTable(HashMap<String, f64>);

/// One configured `{ unit, price }` entry
#[derive(Debug, Clone, Deserialize)]
pub struct UnitPrice {
    pub unit: String,
    pub price: f64,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self(HashMap::from([
            ("kWh".to_string(), 0.0449 + 0.0286),
            ("m^3".to_string(), 1.17 + 1.75),
            ("MWh".to_string(), 45.32),
        ]))
    }
}

impl From<Vec<UnitPrice>> for PriceTable {
    fn from(prices: Vec<UnitPrice>) -> Self {
        Self(prices.into_iter().map(|p| (p.unit, p.price)).collect())
    }
}

impl PriceTable {
    pub fn price(&self, unit: &str) -> Option<f64> {
        self.0.get(unit).copied()
    }

    /// Cost per `window` of the increase ending at `index`.
    ///
    /// The increase is measured from the last sample at or before the window start
    /// (or the first sample) and scaled by how many windows it actually spans.
    /// Absent for the first sample, for units without a price and when the reference
    /// sample shares the timestamp of `index`.
    pub fn cost_rate(
        &self,
        samples: &[Sample],
        index: usize,
        unit: &str,
        window: CostWindow,
    ) -> Option<f64> {
        let price = self.price(unit)?;
        if index == 0 || index >= samples.len() {
            return None;
        }

        let current = samples[index];
        let reference = samples[window_reference_index(samples, index, window)];
        let elapsed = current.time_ms - reference.time_ms;
        if elapsed == 0 {
            tracing::debug!(
                "No elapsed time before sample {} in {:?} window, skipping cost",
                index,
                window
            );
            return None;
        }

        let increase = current.value - reference.value;
        let time_factor = elapsed as f64 / window.millis() as f64;
        Some(round_cents(increase * price / time_factor))
    }

    /// Cost of the whole increase from the first sample up to `index`
    pub fn cost_total(&self, samples: &[Sample], index: usize, unit: &str) -> Option<f64> {
        let price = self.price(unit)?;
        if index == 0 || index >= samples.len() {
            return None;
        }
        Some(round_cents((samples[index].value - samples[0].value) * price))
    }
}

/// Walk back from `index - 1` while samples are still inside the window.
/// Stops at index 0 at the latest. `index` must be at least 1.
pub fn window_reference_index(samples: &[Sample], index: usize, window: CostWindow) -> usize {
    let window_start = samples[index].time_ms - window.millis();
    let mut reference = index - 1;
    while reference > 0 && samples[reference].time_ms > window_start {
        reference -= 1;
    }
    reference
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
