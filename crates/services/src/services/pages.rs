//! Page controllers: what a screen reads, shows, and submits.

use std::sync::Arc;

use domain::{
    aggregates::{self, AccountingSummary, Searchable},
    models::{
        costs::{ExtraCost, FixedCost},
        document::AccountingDocument,
        maintenance::Maintenance,
    },
};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use super::{
    api_client::{ApiClient, ApiError},
    config::Config,
    derived::DerivedView,
    dialog::{DialogError, FormDialog},
    fetchers::{Fetcher, ListFetcher},
    mutations::{MutationCommand, MutationError, MutationOutcome, MutationRequest},
    notification::Notifier,
    query_cache::{CacheEntry, QueryCache, QueryStatus},
    query_key::QueryKey,
    resources::Resource,
};

/// Collaborators every page is built from.
#[derive(Clone)]
pub struct AppContext {
    pub client: ApiClient,
    pub cache: QueryCache,
    pub notifier: Arc<dyn Notifier>,
}

impl AppContext {
    pub fn new(client: ApiClient, cache: QueryCache, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            cache,
            notifier,
        }
    }

    pub fn from_config(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self, ApiError> {
        let client = ApiClient::with_timeout(&config.api_base_url, config.request_timeout())?
            .with_fetch_retries(config.fetch_retries);
        Ok(Self::new(
            client,
            QueryCache::new(config.cache_config()),
            notifier,
        ))
    }
}

/// Rows a list page shows after searching.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<R> {
    pub rows: Vec<R>,
    /// Size of the unfiltered collection
    pub total: usize,
    pub status: QueryStatus,
    pub error: Option<String>,
    pub is_stale: bool,
}

impl<R> ListView<R> {
    /// First load still running: show a placeholder, not an empty table.
    pub fn is_placeholder(&self) -> bool {
        self.total == 0 && self.status == QueryStatus::Loading
    }
}

/// Generic list + create/edit/delete page for one resource.
pub struct ResourcePage<R: Resource> {
    context: AppContext,
    fetcher: ListFetcher<R>,
    search: String,
    dialog: FormDialog<R::Create>,
    command: MutationCommand<R>,
    mounted: CancellationToken,
}

impl<R: Resource + Searchable> ResourcePage<R> {
    pub fn new(context: &AppContext) -> Self {
        Self {
            context: context.clone(),
            fetcher: ListFetcher::new(&context.client),
            search: String::new(),
            dialog: FormDialog::new(),
            command: MutationCommand::new(
                context.client.clone(),
                context.cache.clone(),
                Arc::clone(&context.notifier),
            ),
            mounted: CancellationToken::new(),
        }
    }

    /// Narrows the list request, e.g. by `locationId`.
    pub fn with_filter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fetcher = self.fetcher.with_filter(name, value);
        self
    }

    pub fn list_key(&self) -> QueryKey {
        self.fetcher.key()
    }

    /// Cache entry for the list, scheduling a fetch when needed.
    pub fn entry(&self) -> CacheEntry<Vec<R>> {
        self.context.cache.get(&self.fetcher)
    }

    /// Waits for the list. `None` when the page was unmounted first.
    pub async fn load(&self) -> Option<Result<Arc<Vec<R>>, ApiError>> {
        self.guarded(self.context.cache.fetch(&self.fetcher)).await
    }

    /// User-triggered retry after an error.
    pub async fn retry(&self) -> Option<Result<Arc<Vec<R>>, ApiError>> {
        self.guarded(self.context.cache.refetch(&self.fetcher)).await
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn visible(&self) -> ListView<R> {
        let entry = self.entry();
        let (rows, total) = match entry.data.as_deref() {
            Some(records) => (
                aggregates::search(records, &self.search)
                    .into_iter()
                    .cloned()
                    .collect(),
                records.len(),
            ),
            None => (Vec::new(), 0),
        };
        ListView {
            rows,
            total,
            status: entry.status,
            error: entry.error.as_ref().map(ApiError::user_message),
            is_stale: entry.is_stale,
        }
    }

    pub fn dialog(&self) -> &FormDialog<R::Create> {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut FormDialog<R::Create> {
        &mut self.dialog
    }

    pub fn open_create(&mut self) -> Result<(), DialogError> {
        self.dialog.open_create(R::Create::default())
    }

    pub fn open_create_with(&mut self, form: R::Create) -> Result<(), DialogError> {
        self.dialog.open_create(form)
    }

    /// Opens the dialog pre-filled from `record`.
    pub fn open_edit(&mut self, record: &R) -> Result<(), DialogError> {
        self.dialog.open_edit(record.id(), R::Create::from(record))
    }

    pub fn cancel(&mut self) -> Result<(), DialogError> {
        self.dialog.cancel()
    }

    pub async fn submit(&mut self) -> Result<MutationOutcome<R>, MutationError> {
        self.command.submit(&mut self.dialog).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<MutationOutcome<R>, MutationError> {
        self.command.execute(MutationRequest::Delete { id }).await
    }

    pub fn is_mounted(&self) -> bool {
        !self.mounted.is_cancelled()
    }

    /// Stops the page from accepting results of reads still in flight.
    pub fn unmount(&self) {
        debug!(key = %self.fetcher.key(), "page unmounted");
        self.mounted.cancel();
    }

    async fn guarded<T>(&self, read: impl Future<Output = T>) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.mounted.cancelled() => None,
            value = read => (!self.mounted.is_cancelled()).then_some(value),
        }
    }
}

/// State of one dashboard widget. Widgets load and fail independently.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Widget<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Stale data is still shown while a refetch runs or after it failed.
    fn from_entry<R, F>(entry: Option<CacheEntry<Vec<R>>>, project: F) -> Self
    where
        F: FnOnce(&[R]) -> T,
    {
        let Some(entry) = entry else {
            return Self::Loading;
        };
        match (entry.data.as_deref(), &entry.error) {
            (Some(records), _) => Self::Ready(project(records.as_slice())),
            (None, Some(err)) if entry.status == QueryStatus::Error => {
                Self::Failed(err.user_message())
            }
            _ => Self::Loading,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub monthly_fixed_costs: Widget<Decimal>,
    pub extra_costs: Widget<Decimal>,
    pub pending_maintenances: Widget<usize>,
    pub pending_documents: Widget<usize>,
}

impl DashboardView {
    /// All four figures, once every widget is ready.
    pub fn summary(&self) -> Option<AccountingSummary> {
        Some(AccountingSummary {
            monthly_fixed_costs: *self.monthly_fixed_costs.ready()?,
            extra_costs: *self.extra_costs.ready()?,
            pending_maintenances: *self.pending_maintenances.ready()?,
            pending_documents: *self.pending_documents.ready()?,
        })
    }

    fn from_cache(cache: &QueryCache) -> Self {
        Self {
            monthly_fixed_costs: Widget::from_entry(
                cache.peek::<Vec<FixedCost>>(&FixedCost::list_key()),
                aggregates::monthly_fixed_cost_total,
            ),
            extra_costs: Widget::from_entry(
                cache.peek::<Vec<ExtraCost>>(&ExtraCost::list_key()),
                aggregates::extra_cost_total,
            ),
            pending_maintenances: Widget::from_entry(
                cache.peek::<Vec<Maintenance>>(&Maintenance::list_key()),
                aggregates::pending_maintenance_count,
            ),
            pending_documents: Widget::from_entry(
                cache.peek::<Vec<AccountingDocument>>(&AccountingDocument::list_key()),
                aggregates::pending_document_count,
            ),
        }
    }
}

/// Accounting overview: four collections fetched concurrently.
pub struct AccountingDashboard {
    context: AppContext,
    fixed_costs: ListFetcher<FixedCost>,
    extra_costs: ListFetcher<ExtraCost>,
    maintenances: ListFetcher<Maintenance>,
    documents: ListFetcher<AccountingDocument>,
    mounted: CancellationToken,
}

impl AccountingDashboard {
    pub fn new(context: &AppContext) -> Self {
        Self {
            context: context.clone(),
            fixed_costs: ListFetcher::new(&context.client),
            extra_costs: ListFetcher::new(&context.client),
            maintenances: ListFetcher::new(&context.client),
            documents: ListFetcher::new(&context.client),
            mounted: CancellationToken::new(),
        }
    }

    pub fn input_keys() -> Vec<QueryKey> {
        vec![
            FixedCost::list_key(),
            ExtraCost::list_key(),
            Maintenance::list_key(),
            AccountingDocument::list_key(),
        ]
    }

    /// Current widgets; schedules fetches for anything idle or stale.
    pub fn snapshot(&self) -> DashboardView {
        let cache = &self.context.cache;
        cache.get(&self.fixed_costs);
        cache.get(&self.extra_costs);
        cache.get(&self.maintenances);
        cache.get(&self.documents);
        DashboardView::from_cache(cache)
    }

    /// Loads every widget concurrently. One failing read does not hold back
    /// the others. `None` when unmounted before the reads settle.
    pub async fn refresh(&self) -> Option<DashboardView> {
        let cache = &self.context.cache;
        let reads = async {
            tokio::join!(
                cache.fetch(&self.fixed_costs),
                cache.fetch(&self.extra_costs),
                cache.fetch(&self.maintenances),
                cache.fetch(&self.documents),
            )
        };
        tokio::select! {
            biased;
            _ = self.mounted.cancelled() => None,
            _ = reads => (!self.mounted.is_cancelled()).then(|| DashboardView::from_cache(cache)),
        }
    }

    /// Recomputes the widgets whenever one of the four collections changes.
    pub fn watch(&self) -> DerivedView<DashboardView> {
        DerivedView::new(&self.context.cache, Self::input_keys(), DashboardView::from_cache)
    }

    pub fn unmount(&self) {
        self.mounted.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api_client::ApiError;

    #[test]
    fn test_widget_prefers_data_over_error() {
        let key = QueryKey::new("/api/fixed-costs");
        let entry = CacheEntry {
            key: key.clone(),
            data: Some(Arc::new(vec![1u32, 2, 3])),
            status: QueryStatus::Error,
            error: Some(ApiError::Timeout),
            last_fetched_at: None,
            is_stale: false,
        };
        assert_eq!(
            Widget::from_entry(Some(entry.clone()), |r: &[u32]| r.len()),
            Widget::Ready(3)
        );

        let failed = CacheEntry { data: None, ..entry };
        assert_eq!(
            Widget::from_entry(Some(failed), |r: &[u32]| r.len()),
            Widget::Failed(ApiError::Timeout.user_message())
        );
        assert_eq!(
            Widget::<usize>::from_entry::<u32, _>(None, |r| r.len()),
            Widget::Loading
        );
    }

    #[test]
    fn test_summary_requires_every_widget() {
        let mut view = DashboardView {
            monthly_fixed_costs: Widget::Ready(Decimal::from(700)),
            extra_costs: Widget::Ready(Decimal::ZERO),
            pending_maintenances: Widget::Ready(2),
            pending_documents: Widget::Loading,
        };
        assert!(view.summary().is_none());
        view.pending_documents = Widget::Ready(1);
        assert_eq!(view.summary().unwrap().monthly_fixed_costs, Decimal::from(700));
    }
}
