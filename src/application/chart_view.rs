// Chart view - State of one overview/detail chart pair and its point detail legend
use crate::application::series_builder::{build_series, ChartSeries};
use crate::domain::iso8601::parse_date_from_iso8601;
use crate::domain::locator::locate_nearest;
use crate::domain::meter::Meter;
use crate::domain::series::{ChangeSeries, Series};
use crate::domain::statistics::{CostWindow, PriceTable};
use crate::infrastructure::config::{ChartSettings, Labels};
use serde::{Deserialize, Serialize};

/// Inclusive axis range as sent by the plotting library
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub from: f64,
    pub to: f64,
}

impl AxisRange {
    pub fn contains(&self, x: f64) -> bool {
        x >= self.from && x <= self.to
    }
}

/// Range picked on the overview chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSelection {
    pub xaxis: AxisRange,
    #[serde(default)]
    pub yaxes: Option<Vec<AxisRange>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HoverEvent {
    /// Timestamp the browser attached to the pointer event, in (fractional) milliseconds
    pub timestamp: f64,
    /// Cursor position on the time axis
    pub x: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisPosition {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAxisOptions {
    pub pan_range: (i64, i64),
    pub zoom_range_min: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueAxisOptions {
    pub axis: usize,
    pub position: AxisPosition,
    pub pan_range: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeChartOptions {
    pub gauge_id: String,
    pub pan_range: (i64, i64),
    pub y_pan_min: Option<f64>,
    pub bar_width_ms: i64,
}

/// Current axis limits of one chart; `None` lets the renderer autoscale
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Viewport {
    pub x: Option<AxisRange>,
    pub y: Vec<Option<AxisRange>>,
}

/// Main and change-over-time viewports after a redraw
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewports {
    pub main: Viewport,
    pub change: Viewport,
    pub redraws: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum PointDetail {
    /// Cells refreshed on hover; empty until the cursor first hits the chart
    Numeric {
        unit: String,
        date_ms: Option<i64>,
        value: Option<f64>,
        euro_day: Option<String>,
        euro_week: Option<String>,
        euro_month: Option<String>,
        euro_total: Option<String>,
    },
    /// Latest comment of a text gauge
    Comment { date_ms: Option<i64>, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointDetailRow {
    pub gauge_id: String,
    pub name: String,
    #[serde(flatten)]
    pub detail: PointDetail,
}

/// Everything the browser needs to draw the charts and the point detail table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartModel<'a> {
    pub series: &'a [Series],
    pub change_series: &'a [ChangeSeries],
    pub x_axis: Option<TimeAxisOptions>,
    pub y_axes: Vec<ValueAxisOptions>,
    pub change_charts: Vec<ChangeChartOptions>,
    pub viewports: Viewports,
    pub point_details: &'a [PointDetailRow],
    pub labels: &'a Labels,
}

pub struct ChartView {
    meters: Vec<Meter>,
    chart: ChartSeries,
    settings: ChartSettings,
    prices: PriceTable,
    labels: Labels,
    main: Viewport,
    change: Viewport,
    redraws: u64,
    point_details: Vec<PointDetailRow>,
    legend_blocked_until: Option<f64>,
}

impl ChartView {
    /// Build series and point detail rows from freshly fetched meters and apply the
    /// default viewport: the most recent history window with a margin on both sides.
    pub fn new(meters: Vec<Meter>, settings: ChartSettings, prices: PriceTable, labels: Labels) -> Self {
        let chart = build_series(&meters);
        let point_details = point_detail_rows(&meters);

        let mut view = Self {
            meters,
            chart,
            settings,
            prices,
            labels,
            main: Viewport::default(),
            change: Viewport::default(),
            redraws: 0,
            point_details,
            legend_blocked_until: None,
        };

        if let Some(selection) = view.default_selection() {
            view.select_range(&selection);
        }
        view
    }

    pub fn meters(&self) -> &[Meter] {
        &self.meters
    }

    pub fn default_selection(&self) -> Option<RangeSelection> {
        let (min_x, max_x) = self.chart.x_range()?;
        let margin = self.settings.margin_ms;
        let from = (max_x - self.settings.history_ms()).max(min_x) - margin;
        Some(RangeSelection {
            xaxis: AxisRange {
                from: from as f64,
                to: (max_x + margin) as f64,
            },
            yaxes: None,
        })
    }

    /// Apply an overview selection to the main chart and the change charts, then redraw both.
    /// Y ranges are applied axis by axis; the change charts share the first one.
    pub fn select_range(&mut self, selection: &RangeSelection) -> Viewports {
        self.main.x = Some(selection.xaxis);
        self.change.x = Some(selection.xaxis);

        if let Some(yaxes) = &selection.yaxes {
            self.main.y = yaxes
                .iter()
                .take(self.chart.series.len())
                .map(|range| Some(*range))
                .collect();
            self.change.y = yaxes.first().map(|r| vec![Some(*r)]).unwrap_or_default();
        }

        self.redraws += 1;
        self.viewports()
    }

    pub fn viewports(&self) -> Viewports {
        Viewports {
            main: self.main.clone(),
            change: self.change.clone(),
            redraws: self.redraws,
        }
    }

    /// Pointer moved over one of the charts. Events arriving within the throttle interval
    /// of the last accepted one are dropped. Returns the refreshed rows, if any.
    pub fn hover(&mut self, event: HoverEvent) -> Option<&[PointDetailRow]> {
        if self.legend_blocked_until.is_some_and(|until| event.timestamp <= until) {
            tracing::debug!("Hover at {} throttled", event.timestamp);
            return None;
        }
        self.legend_blocked_until = Some(event.timestamp + self.settings.legend_throttle_ms as f64);

        if self.update_legend(event.x) {
            Some(self.point_details.as_slice())
        } else {
            None
        }
    }

    /// Fill the numeric rows with the samples nearest to `x`. Only positions inside the
    /// main chart's time viewport update the legend.
    pub fn update_legend(&mut self, x: f64) -> bool {
        if !self.main.x.is_some_and(|range| range.contains(x)) {
            return false;
        }

        let cursor = x.ceil() as i64;
        for series in &self.chart.series {
            let Some(nearest) = locate_nearest(&series.samples, cursor) else {
                continue;
            };
            let Some(row) = self
                .point_details
                .iter_mut()
                .find(|row| row.gauge_id == series.gauge_id)
            else {
                continue;
            };

            let euro = |window| {
                self.prices
                    .cost_rate(&series.samples, nearest.index, &series.unit, window)
                    .map(format_euro)
            };
            row.detail = PointDetail::Numeric {
                unit: series.unit.clone(),
                date_ms: Some(nearest.time_ms),
                value: Some(nearest.value),
                euro_day: euro(CostWindow::Day),
                euro_week: euro(CostWindow::Week),
                euro_month: euro(CostWindow::Month),
                euro_total: self
                    .prices
                    .cost_total(&series.samples, nearest.index, &series.unit)
                    .map(format_euro),
            };
        }
        true
    }

    pub fn model(&self) -> ChartModel<'_> {
        let x_axis = self.chart.x_range().map(|(min_x, max_x)| TimeAxisOptions {
            pan_range: (min_x - self.settings.margin_ms, max_x + self.settings.margin_ms),
            zoom_range_min: self.settings.margin_ms,
        });

        let y_axes = self
            .chart
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| ValueAxisOptions {
                axis: s.axis,
                position: if i % 2 == 0 { AxisPosition::Left } else { AxisPosition::Right },
                pan_range: value_pan_range(s.bounds.min_y, s.bounds.max_y),
            })
            .collect();

        let change_charts = self
            .chart
            .change_series
            .iter()
            .map(|c| ChangeChartOptions {
                gauge_id: c.gauge_id.clone(),
                pan_range: (
                    c.min_x - self.settings.change_margin_ms,
                    c.max_x + self.settings.change_margin_ms,
                ),
                y_pan_min: c.y_pan_min,
                bar_width_ms: self.settings.bar_width_ms,
            })
            .collect();

        ChartModel {
            series: &self.chart.series,
            change_series: &self.chart.change_series,
            x_axis,
            y_axes,
            change_charts,
            viewports: self.viewports(),
            point_details: &self.point_details,
            labels: &self.labels,
        }
    }
}

/// One row per gauge. Text gauges only get a row when they have comments.
fn point_detail_rows(meters: &[Meter]) -> Vec<PointDetailRow> {
    meters
        .iter()
        .flat_map(|meter| meter.gauges())
        .filter_map(|gauge| {
            let detail = if gauge.is_comment() {
                let latest = gauge.values().last()?;
                PointDetail::Comment {
                    date_ms: parse_date_from_iso8601(&latest.updated).ok(),
                    value: latest.value.as_ref().map(ToString::to_string).unwrap_or_default(),
                }
            } else {
                PointDetail::Numeric {
                    unit: gauge.unit().to_string(),
                    date_ms: None,
                    value: None,
                    euro_day: None,
                    euro_week: None,
                    euro_month: None,
                    euro_total: None,
                }
            };
            Some(PointDetailRow {
                gauge_id: gauge.id.clone(),
                name: gauge.name.clone(),
                detail,
            })
        })
        .collect()
}

/// Panning stops at zero (or 1.5x below a negative minimum) and 1.5x above the maximum
fn value_pan_range(min_y: f64, max_y: f64) -> (f64, f64) {
    let low = if min_y < 0.0 { min_y * 1.5 } else { 0.0 };
    (low, to_precision(max_y, 2) * 1.5)
}

/// Round to `digits` significant digits
fn to_precision(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits - 1 - magnitude);
    (value * factor).round() / factor
}

fn format_euro(amount: f64) -> String {
    format!("{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::meter::{DataType, Gauge, GaugeValue, Reading};

    const DAY: i64 = 86_400_000;
    // 2015-01-01T00:00:00Z
    const START: i64 = 1_420_070_400_000;

    fn gauge(id: &str, data_type: DataType, unit: &str, values: Vec<(String, Reading)>) -> Gauge {
        Gauge {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: None,
            unit: Some(unit.to_string()),
            data_type,
            cumulative: true,
            min: None,
            max: None,
            gauge_values: Some(
                values
                    .into_iter()
                    .map(|(updated, value)| GaugeValue {
                        updated,
                        value: Some(value),
                    })
                    .collect(),
            ),
        }
    }

    fn daily(days: usize, per_day: f64) -> Vec<(String, Reading)> {
        (0..days)
            .map(|d| {
                let date = chrono::DateTime::from_timestamp_millis(START + d as i64 * DAY).unwrap();
                (
                    date.format("%Y-%m-%dT%H:%M:%S+0000").to_string(),
                    Reading::Number(d as f64 * per_day),
                )
            })
            .collect()
    }

    fn view() -> ChartView {
        let meters = vec![Meter {
            id: "m1".to_string(),
            name: "Pool".to_string(),
            gauges: Some(vec![
                gauge("power", DataType::Double, "kWh", daily(10, 100.0)),
                gauge(
                    "notes",
                    DataType::String,
                    "",
                    vec![("2015-01-05T08:00:00+0000".to_string(), Reading::Text("filter changed".into()))],
                ),
                gauge("silent", DataType::String, "", vec![]),
                gauge("water", DataType::Double, "m^3", daily(10, -2.0)),
            ]),
        }];
        ChartView::new(meters, ChartSettings::default(), PriceTable::default(), Labels::default())
    }

    #[test]
    fn test_default_viewport_covers_history_with_margin() {
        let view = view();
        let margin = ChartSettings::default().margin_ms;
        let last = START + 9 * DAY;

        // Less than two years of data: the window starts at the first sample
        let x = view.viewports().main.x.unwrap();
        assert_eq!(x.from, (START - margin) as f64);
        assert_eq!(x.to, (last + margin) as f64);
        assert_eq!(view.viewports().change.x, Some(x));
        assert_eq!(view.viewports().redraws, 1);
    }

    #[test]
    fn test_default_viewport_limits_history() {
        let settings = ChartSettings {
            history_days: 3,
            ..ChartSettings::default()
        };
        let view = ChartView::new(view().meters().to_vec(), settings, PriceTable::default(), Labels::default());
        let selection = view.default_selection().unwrap();
        assert_eq!(selection.xaxis.from, (START + 6 * DAY - 604_800_000) as f64);
    }

    #[test]
    fn test_select_range_propagates_to_both_charts() {
        let mut view = view();
        let viewports = view.select_range(&RangeSelection {
            xaxis: AxisRange { from: 1.0, to: 2.0 },
            yaxes: Some(vec![AxisRange { from: 0.0, to: 50.0 }, AxisRange { from: -5.0, to: 5.0 }]),
        });

        assert_eq!(viewports.main.x, Some(AxisRange { from: 1.0, to: 2.0 }));
        assert_eq!(viewports.change.x, Some(AxisRange { from: 1.0, to: 2.0 }));
        assert_eq!(viewports.main.y.len(), 2);
        assert_eq!(viewports.main.y[1], Some(AxisRange { from: -5.0, to: 5.0 }));
        assert_eq!(viewports.change.y, vec![Some(AxisRange { from: 0.0, to: 50.0 })]);
        assert_eq!(viewports.redraws, 2);
    }

    #[test]
    fn test_point_detail_rows() {
        let view = view();
        let rows = view.model().point_details;
        let ids: Vec<&str> = rows.iter().map(|r| r.gauge_id.as_str()).collect();
        assert_eq!(ids, vec!["power", "notes", "water"]);

        match &rows[1].detail {
            PointDetail::Comment { date_ms, value } => {
                assert_eq!(*date_ms, Some(START + 4 * DAY + 8 * 3_600_000));
                assert_eq!(value, "filter changed");
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_hover_fills_legend_with_costs() {
        let mut view = view();
        let cursor = (START + 5 * DAY) as f64;

        let rows = view.hover(HoverEvent { timestamp: 1_000.0, x: cursor }).unwrap();
        match &rows[0].detail {
            PointDetail::Numeric { date_ms, value, euro_day, euro_week, euro_month, euro_total, .. } => {
                assert_eq!(*date_ms, Some(START + 5 * DAY));
                assert_eq!(*value, Some(500.0));
                // 100 kWh a day at 0.0735 €/kWh
                assert_eq!(euro_day.as_deref(), Some("7.35"));
                assert_eq!(euro_week.as_deref(), Some("51.45"));
                assert_eq!(euro_month.as_deref(), Some("220.50"));
                assert_eq!(euro_total.as_deref(), Some("36.75"));
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_hover_is_throttled_by_event_timestamp() {
        let mut view = view();
        let x = (START + DAY) as f64;

        assert!(view.hover(HoverEvent { timestamp: 1_000.0, x }).is_some());
        assert!(view.hover(HoverEvent { timestamp: 1_050.0, x }).is_none());
        assert!(view.hover(HoverEvent { timestamp: 1_150.0, x }).is_some());
    }

    #[test]
    fn test_hover_outside_viewport_consumes_throttle_slot() {
        let mut view = view();

        assert!(view.hover(HoverEvent { timestamp: 1_000.0, x: 0.0 }).is_none());
        assert!(view.hover(HoverEvent { timestamp: 1_050.0, x: (START + DAY) as f64 }).is_none());
        assert!(view.hover(HoverEvent { timestamp: 1_101.0, x: (START + DAY) as f64 }).is_some());
    }

    #[test]
    fn test_hover_accepts_fractional_timestamps() {
        let mut view = view();
        let x = (START + DAY) as f64;

        assert!(view.hover(HoverEvent { timestamp: 1_000.25, x }).is_some());
        assert!(view.hover(HoverEvent { timestamp: 1_100.25, x }).is_none());
        assert!(view.hover(HoverEvent { timestamp: 1_100.5, x }).is_some());
    }

    #[test]
    fn test_hover_with_huge_timestamp() {
        let mut view = view();
        let x = (START + DAY) as f64;
        let timestamp = i64::MAX as f64;

        assert!(view.hover(HoverEvent { timestamp, x }).is_some());
        assert!(view.hover(HoverEvent { timestamp, x }).is_none());
        assert!(view.hover(HoverEvent { timestamp: f64::MAX, x }).is_some());
    }

    #[test]
    fn test_axis_options() {
        let view = view();
        let model = view.model();

        assert_eq!(model.y_axes[0].position, AxisPosition::Left);
        assert_eq!(model.y_axes[1].position, AxisPosition::Right);
        assert_eq!(model.y_axes[0].pan_range, (0.0, 1350.0));
        assert_eq!(model.y_axes[1].pan_range, (-27.0, 0.0));

        let x_axis = model.x_axis.unwrap();
        assert_eq!(x_axis.zoom_range_min, 604_800_000);
        assert_eq!(x_axis.pan_range, (START - 604_800_000, START + 9 * DAY + 604_800_000));

        assert_eq!(model.change_charts.len(), 2);
        assert_eq!(model.change_charts[0].bar_width_ms, 1_800_000);
        assert_eq!(model.change_charts[0].pan_range.0, START - 2_592_000_000);
    }

    #[test]
    fn test_to_precision() {
        assert_eq!(to_precision(123.0, 2), 120.0);
        assert_eq!(to_precision(0.0456, 2), 0.046);
        assert_eq!(to_precision(-18.0, 2), -18.0);
        assert_eq!(to_precision(0.0, 2), 0.0);
    }
}
