// Domain layer - Meter data, chart series and the derived metrics
pub mod iso8601;
pub mod locator;
pub mod meter;
pub mod series;
pub mod statistics;
