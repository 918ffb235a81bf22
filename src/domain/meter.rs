// Meter and gauge domain model, as delivered by the measurement endpoint
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of a measurement query: `{ "meters": [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(default)]
    pub meters: Vec<Meter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meter {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gauges: Option<Vec<Gauge>>,
}

impl Meter {
    pub fn gauges(&self) -> &[Gauge] {
        self.gauges.as_deref().unwrap_or_default()
    }

    pub fn find_gauge(&self, gauge_id: &str) -> Option<&Gauge> {
        self.gauges().iter().find(|g| g.id == gauge_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    String,
    Integer,
    #[default]
    Double,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default = "default_cumulative")]
    pub cumulative: bool,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub gauge_values: Option<Vec<GaugeValue>>,
}

// The backend treats gauges as cumulative unless told otherwise
fn default_cumulative() -> bool {
    true
}

impl Gauge {
    /// Comment gauges carry free text and are never charted
    pub fn is_comment(&self) -> bool {
        self.data_type == DataType::String
    }

    pub fn values(&self) -> &[GaugeValue] {
        self.gauge_values.as_deref().unwrap_or_default()
    }

    pub fn unit(&self) -> &str {
        self.unit.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaugeValue {
    pub updated: String,
    /// Absent when the backend stored a reading without a value
    #[serde(default)]
    pub value: Option<Reading>,
}

/// A raw gauge reading. The backend sends readings as strings, older dumps as numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
}

impl Reading {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Number(n) => Some(*n),
            Reading::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Number(n) => write!(f, "{}", n),
            Reading::Text(s) => f.write_str(s),
        }
    }
}
