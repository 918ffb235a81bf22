// Application state for HTTP handlers
use crate::application::chart_service::ChartService;
use crate::application::meter_service::MeterService;

#[derive(Clone)]
pub struct AppState {
    pub meter_service: MeterService,
    pub chart_service: ChartService,
}
