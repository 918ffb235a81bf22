// Repository trait for measurement data access
use crate::domain::meter::Meter;
use async_trait::async_trait;

/// How much of each meter the endpoint should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataGroups {
    /// Meters, gauges and every gauge value
    All,
    /// Meters and gauge definitions only
    Gauges,
}

impl DataGroups {
    pub fn as_str(self) -> &'static str {
        match self {
            DataGroups::All => "all",
            DataGroups::Gauges => "gauges",
        }
    }
}

#[async_trait]
pub trait MeasurementRepository: Send + Sync {
    /// Fetch meters, optionally limited to a single meter (tag) id
    async fn fetch_meters(
        &self,
        data_groups: DataGroups,
        tag_id: Option<&str>,
    ) -> anyhow::Result<Vec<Meter>>;
}
