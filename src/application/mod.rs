// Application layer - Use cases on top of the measurement repository
pub mod chart_service;
pub mod chart_view;
pub mod csv_export;
pub mod measurement_repository;
pub mod meter_service;
pub mod series_builder;
