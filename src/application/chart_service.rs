// Chart service - Opens chart views and keeps them until they are closed
use crate::application::chart_view::ChartView;
use crate::application::csv_export::{export_gauge, CsvExport};
use crate::application::measurement_repository::{DataGroups, MeasurementRepository};
use crate::domain::statistics::PriceTable;
use crate::infrastructure::config::{ChartSettings, Labels};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

pub type ViewId = u64;

struct OpenView {
    view: ChartView,
    last_access: Instant,
}

#[derive(Clone)]
pub struct ChartService {
    repository: Arc<dyn MeasurementRepository>,
    settings: ChartSettings,
    prices: PriceTable,
    labels: Labels,
    views: Arc<Mutex<HashMap<ViewId, OpenView>>>,
    next_id: Arc<AtomicU64>,
}

impl ChartService {
    pub fn new(
        repository: Arc<dyn MeasurementRepository>,
        settings: ChartSettings,
        prices: PriceTable,
        labels: Labels,
    ) -> Self {
        Self {
            repository,
            settings,
            prices,
            labels,
            views: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Fetch all data of the meter (or every meter when `tag_id` is empty) and register
    /// a new chart view for it. Concurrent opens are independent of each other.
    /// Views left idle longer than the configured timeout are dropped first.
    pub async fn open_chart(&self, tag_id: Option<&str>) -> anyhow::Result<ViewId> {
        let meters = self.repository.fetch_meters(DataGroups::All, tag_id).await?;
        let view = ChartView::new(
            meters,
            self.settings.clone(),
            self.prices.clone(),
            self.labels.clone(),
        );

        let now = Instant::now();
        self.evict_idle(now);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock_views().insert(
            id,
            OpenView {
                view,
                last_access: now,
            },
        );
        tracing::debug!("Opened chart view {} for tag {:?}", id, tag_id);
        Ok(id)
    }

    /// Run `f` against an open view; `None` when the view does not exist
    pub fn with_view<R>(&self, id: ViewId, f: impl FnOnce(&mut ChartView) -> R) -> Option<R> {
        self.lock_views().get_mut(&id).map(|open| {
            open.last_access = Instant::now();
            f(&mut open.view)
        })
    }

    /// Drop views nobody touched within the idle timeout; returns how many were dropped
    pub fn evict_idle(&self, now: Instant) -> usize {
        let timeout = self.settings.view_idle_timeout();
        let mut views = self.lock_views();
        let before = views.len();
        views.retain(|_, open| now.saturating_duration_since(open.last_access) <= timeout);

        let evicted = before - views.len();
        if evicted > 0 {
            tracing::info!("Evicted {} idle chart views, {} still open", evicted, views.len());
        }
        evicted
    }

    pub fn close_chart(&self, id: ViewId) -> bool {
        self.lock_views().remove(&id).is_some()
    }

    /// CSV of one gauge of an open view, from the readings the view already holds.
    /// `Ok(None)` when the view or gauge is unknown or the gauge has no values.
    pub fn export_csv(
        &self,
        id: ViewId,
        gauge_id: &str,
        exported_at_ms: i64,
    ) -> anyhow::Result<Option<CsvExport>> {
        self.with_view(id, |view| {
            view.meters()
                .iter()
                .find_map(|meter| meter.find_gauge(gauge_id).map(|gauge| (meter, gauge)))
                .map_or(Ok(None), |(meter, gauge)| {
                    export_gauge(meter, gauge, &self.labels, exported_at_ms)
                })
        })
        .unwrap_or(Ok(None))
    }

    fn lock_views(&self) -> MutexGuard<'_, HashMap<ViewId, OpenView>> {
        self.views.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
