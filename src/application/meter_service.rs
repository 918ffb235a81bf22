// Meter service - Use case for listing meters and their gauges
use crate::application::measurement_repository::{DataGroups, MeasurementRepository};
use crate::domain::meter::Meter;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterListing {
    pub id: String,
    pub name: String,
    pub gauges: Vec<GaugeListing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeListing {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
}

impl MeterListing {
    /// Comment gauges are left out of the listing
    pub fn from_meter(meter: &Meter) -> Self {
        let gauges = meter
            .gauges()
            .iter()
            .filter(|g| !g.is_comment())
            .map(|g| GaugeListing {
                id: g.id.clone(),
                name: g.name.clone(),
                description: g.description.clone(),
                unit: g.unit.clone(),
            })
            .collect();

        Self {
            id: meter.id.clone(),
            name: meter.name.clone(),
            gauges,
        }
    }
}

#[derive(Clone)]
pub struct MeterService {
    repository: Arc<dyn MeasurementRepository>,
}

impl MeterService {
    pub fn new(repository: Arc<dyn MeasurementRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_meters(&self) -> anyhow::Result<Vec<MeterListing>> {
        let meters = self.repository.fetch_meters(DataGroups::Gauges, None).await?;
        Ok(meters.iter().map(MeterListing::from_meter).collect())
    }
}
