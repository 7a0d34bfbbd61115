use std::sync::Arc;

use async_trait::async_trait;
use catalog_protocol::{DifficultyTier, Entry, Page, SearchRequest, SearchResponse, WireRequest};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SearchError};
use crate::filter::Epoch;

/// Remote catalog. Implementations own timeouts and retries at the transport level.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// `POST /search` for one page.
    async fn search(&self, request: &SearchRequest, page: Page) -> Result<SearchResponse>;

    /// `GET /byId/:id`; `Ok(None)` on 404.
    async fn by_id(&self, id: u64) -> Result<Option<Entry>>;
}

/// Source of the difficulty catalog.
#[async_trait]
pub trait TaxonomySource: Send + Sync {
    async fn difficulties(&self) -> Result<Vec<DifficultyTier>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageData {
    Search { entries: Vec<Entry>, total: u64 },
    Lookup(Option<Entry>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(PageData),
    Cancelled,
    Failed(SearchError),
}

/// Settled fetch, tagged with the epoch it was dispatched under.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCompletion {
    pub epoch: Epoch,
    pub page: Page,
    pub outcome: FetchOutcome,
}

/// What a completion meant for the current epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    /// Belongs to a superseded epoch, or to no request we are waiting on.
    Stale,
    Cancelled,
    Loaded(PageData),
    Failed(SearchError),
}

/// Fetches one page of `request`. Id lookups ignore `page`.
pub async fn fetch_page(
    client: &dyn CatalogClient,
    request: &WireRequest,
    page: Page,
) -> Result<PageData> {
    match request {
        WireRequest::ById { id } => client.by_id(*id).await.map(PageData::Lookup),
        WireRequest::Search(search) => {
            let response = client.search(search, page).await?;
            Ok(PageData::Search {
                entries: response.results,
                total: response.count,
            })
        }
    }
}

#[derive(Debug)]
struct InFlight {
    epoch: Epoch,
    page: Page,
    cancel: CancellationToken,
}

/// Page cursor plus at most one in-flight request.
///
/// Requests run as tokio tasks and always report back through the completion
/// channel, including when cancelled or when the client panics.
pub struct PageFetcher {
    client: Arc<dyn CatalogClient>,
    limit: u64,
    tx: mpsc::UnboundedSender<FetchCompletion>,
    rx: mpsc::UnboundedReceiver<FetchCompletion>,
    in_flight: Option<InFlight>,
    next_page: u64,
    error: Option<SearchError>,
}

impl PageFetcher {
    #[must_use]
    pub fn new(client: Arc<dyn CatalogClient>, limit: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            limit: limit.max(1),
            tx,
            rx,
            in_flight: None,
            next_page: 0,
            error: None,
        }
    }

    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Number of the next page `load_more` would request.
    #[must_use]
    pub const fn next_page(&self) -> u64 {
        self.next_page
    }

    #[must_use]
    pub const fn error(&self) -> Option<&SearchError> {
        self.error.as_ref()
    }

    /// Cancels whatever is in flight. Never fails; the task still settles.
    pub fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            log::debug!(
                "Cancelling page {} of epoch {}",
                in_flight.page.number(),
                in_flight.epoch.value()
            );
            in_flight.cancel.cancel();
        }
    }

    /// New epoch: drops the cursor and requests page 0.
    pub fn start(&mut self, epoch: Epoch, request: &WireRequest) {
        self.cancel();
        self.next_page = 0;
        self.error = None;
        self.dispatch(epoch, request, Page::nth(0, self.limit));
    }

    /// Next page of the same epoch; refused while busy or when nothing is left.
    pub fn load_more(&mut self, epoch: Epoch, request: &WireRequest, has_more: bool) -> bool {
        if self.in_flight.is_some() || !has_more || request.is_id_lookup() {
            return false;
        }
        self.dispatch(epoch, request, Page::nth(self.next_page, self.limit));
        true
    }

    /// Re-requests the page that failed last.
    pub fn retry(&mut self, epoch: Epoch, request: &WireRequest) -> bool {
        if self.in_flight.is_some() || self.error.is_none() {
            return false;
        }
        self.error = None;
        self.dispatch(epoch, request, Page::nth(self.next_page, self.limit));
        true
    }

    fn dispatch(&mut self, epoch: Epoch, request: &WireRequest, page: Page) {
        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlight {
            epoch,
            page,
            cancel: cancel.clone(),
        });
        log::debug!(
            "Fetching page {} (offset {}) for epoch {}",
            page.number(),
            page.offset,
            epoch.value()
        );

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        let request = request.clone();
        let fetch = tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => FetchOutcome::Cancelled,

                result = fetch_page(client.as_ref(), &request, page) => match result {
                    Ok(data) => FetchOutcome::Loaded(data),
                    Err(err) => FetchOutcome::Failed(err),
                },
            }
        });
        tokio::spawn(async move {
            // A client that panics still settles its page.
            let outcome = match fetch.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    log::error!("Fetch task for page {} died: {err}", page.number());
                    FetchOutcome::Failed(SearchError::Other(format!("fetch task failed: {err}")))
                }
            };
            // The receiver is gone only when the fetcher itself was dropped.
            let _ = tx.send(FetchCompletion {
                epoch,
                page,
                outcome,
            });
        });
    }

    /// Waits for the next settled fetch. `None` when nothing is pending.
    pub async fn next_completion(&mut self) -> Option<FetchCompletion> {
        if self.in_flight.is_none() {
            return self.rx.try_recv().ok();
        }
        self.rx.recv().await
    }

    /// Matches a completion against the request currently awaited for `current`.
    pub fn reconcile(&mut self, completion: FetchCompletion, current: Epoch) -> Reconciled {
        let awaited = self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.epoch == completion.epoch && f.page == completion.page);
        if completion.epoch != current || !awaited {
            log::debug!(
                "Discarding stale page {} of epoch {} (current {})",
                completion.page.number(),
                completion.epoch.value(),
                current.value()
            );
            return Reconciled::Stale;
        }

        self.in_flight = None;
        match completion.outcome {
            FetchOutcome::Loaded(data) => {
                self.next_page = completion.page.number() + 1;
                Reconciled::Loaded(data)
            }
            FetchOutcome::Cancelled => Reconciled::Cancelled,
            FetchOutcome::Failed(err) => {
                log::warn!(
                    "Page {} of epoch {} failed: {err}",
                    completion.page.number(),
                    completion.epoch.value()
                );
                self.error = Some(err.clone());
                Reconciled::Failed(err)
            }
        }
    }
}

impl Drop for PageFetcher {
    fn drop(&mut self) {
        self.cancel();
    }
}
