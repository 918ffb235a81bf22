use crate::domain::statistics::PriceTable;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChartsConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub measurements: MeasurementSettings,
    #[serde(default)]
    pub chart: ChartSettings,
    #[serde(default)]
    pub prices: PriceTable,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MeasurementSettings {
    pub base_url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_method() -> String {
    "MeasurementInterface".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Viewport and interaction settings of a chart view
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChartSettings {
    /// Length of the initially shown history
    pub history_days: i64,
    /// Margin around the data on the time axis, also the closest zoom
    pub margin_ms: i64,
    /// Pan margin of the change-over-time chart
    pub change_margin_ms: i64,
    pub bar_width_ms: i64,
    pub legend_throttle_ms: i64,
    /// Open chart views untouched for this long are dropped
    pub view_idle_secs: u64,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            history_days: 365 * 2,
            margin_ms: 604_800_000,
            change_margin_ms: 2_592_000_000,
            bar_width_ms: 1_800_000,
            legend_throttle_ms: 100,
            view_idle_secs: 1_800,
        }
    }
}

impl ChartSettings {
    pub fn history_ms(&self) -> i64 {
        self.history_days * 86_400_000
    }

    pub fn view_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.view_idle_secs)
    }
}

/// Header strings used in CSV exports and the point detail table
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Labels {
    pub meter_name: String,
    pub date: String,
    pub value: String,
    pub unit: String,
    pub euro_day: String,
    pub euro_week: String,
    pub euro_month: String,
    pub euro_total: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            meter_name: "Meter Name".to_string(),
            date: "Date".to_string(),
            value: "Value".to_string(),
            unit: "Unit".to_string(),
            euro_day: "€ (daily)".to_string(),
            euro_week: "€ (weekly)".to_string(),
            euro_month: "€ (monthly)".to_string(),
            euro_total: "€ (total)".to_string(),
        }
    }
}

pub fn load_charts_config() -> anyhow::Result<ChartsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/charts"))
        .add_source(config::Environment::with_prefix("CHARTS").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
