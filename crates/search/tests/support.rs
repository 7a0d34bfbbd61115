#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use catalog_protocol::{DifficultyTier, Entry, Page, SearchQuery, SearchRequest, SearchResponse};
use catalog_search::{
    BrowseConfig, BrowseUpdate, Browser, CatalogClient, Role, SearchError, TaxonomySource,
};
use tokio::sync::Notify;

/// Request as the catalog saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search {
        query: String,
        offset: u64,
        pgu: (String, String),
        specials: Vec<String>,
    },
    ById(u64),
}

impl Call {
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::Search { offset, .. } => Some(*offset),
            Self::ById(_) => None,
        }
    }
}

/// In-memory catalog of `size` entries, tagged with the query that produced them.
pub struct MockCatalog {
    size: u64,
    overlap: u64,
    calls: Mutex<Vec<Call>>,
    params: Mutex<Vec<SearchQuery>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    failures: AtomicUsize,
    panics: AtomicUsize,
    tiers: Vec<DifficultyTier>,
}

impl MockCatalog {
    pub fn new(size: u64) -> Arc<Self> {
        Self::build(size, 0)
    }

    /// Every page after the first repeats the last `overlap` ids of the previous one.
    pub fn overlapping(size: u64, overlap: u64) -> Arc<Self> {
        Self::build(size, overlap)
    }

    fn build(size: u64, overlap: u64) -> Arc<Self> {
        Arc::new(Self {
            size,
            overlap,
            calls: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
            failures: AtomicUsize::new(0),
            panics: AtomicUsize::new(0),
            tiers: tiers(),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub fn last_call(&self) -> Option<Call> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Query string of the last search, as it would go on the wire.
    pub fn last_params(&self) -> Option<SearchQuery> {
        self.params.lock().unwrap().last().cloned()
    }

    /// Holds searches for `query` until the returned gate is notified.
    pub fn gate(&self, query: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(query.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// The next `count` searches panic inside the client.
    pub fn panic_next(&self, count: usize) {
        self.panics.store(count, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_failure(&self) -> bool {
        take_one(&self.failures)
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn search(
        &self,
        request: &SearchRequest,
        page: Page,
    ) -> catalog_search::Result<SearchResponse> {
        self.record(Call::Search {
            query: request.query.clone(),
            offset: page.offset,
            pgu: (
                request.body.pgu_range.from.clone(),
                request.body.pgu_range.to.clone(),
            ),
            specials: request.body.special_difficulties.clone(),
        });
        self.params.lock().unwrap().push(request.query_params(page));
        if take_one(&self.panics) {
            panic!("catalog client blew up on offset {}", page.offset);
        }

        let gate = self.gates.lock().unwrap().get(&request.query).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.take_failure() {
            return Err(SearchError::Transport("connection reset".to_string()));
        }

        let start = page.offset.saturating_sub(if page.offset == 0 { 0 } else { self.overlap });
        let end = (start + page.limit).min(self.size);
        let results = (start..end)
            .map(|idx| Entry::new(idx + 1).with_field("query", request.query.clone()))
            .collect();
        Ok(SearchResponse {
            results,
            count: self.size,
        })
    }

    async fn by_id(&self, id: u64) -> catalog_search::Result<Option<Entry>> {
        self.record(Call::ById(id));
        if self.take_failure() {
            return Err(SearchError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok((1..=self.size).contains(&id).then(|| Entry::new(id)))
    }
}

#[async_trait]
impl TaxonomySource for MockCatalog {
    async fn difficulties(&self) -> catalog_search::Result<Vec<DifficultyTier>> {
        Ok(self.tiers.clone())
    }
}

/// PGU tiers with gaps, four Quantum tiers and a few specials.
pub fn tiers() -> Vec<DifficultyTier> {
    vec![
        DifficultyTier::pgu(1, "P1", 1),
        DifficultyTier::pgu(2, "P5", 5),
        DifficultyTier::pgu(3, "G1", 10),
        DifficultyTier::pgu(4, "U20", 20),
        DifficultyTier::special(10, "Q1", 101),
        DifficultyTier::special(11, "Q2", 102),
        DifficultyTier::special(12, "Q3", 103),
        DifficultyTier::special(13, "Q4", 104),
        DifficultyTier::special(20, "MP", 200),
        DifficultyTier::special(21, "Gimmick", 201),
        DifficultyTier::special(22, "-2", 300),
    ]
}

pub fn config() -> BrowseConfig {
    BrowseConfig {
        page_limit: 50,
        ..BrowseConfig::default()
    }
}

/// Browser with the taxonomy loaded and its first page settled.
pub async fn loaded_browser(catalog: &Arc<MockCatalog>, role: Role) -> Browser {
    let mut browser = Browser::new(catalog.clone(), config(), role);
    let tiers = catalog.difficulties().await.expect("tiers");
    browser.set_taxonomy(tiers);
    let updates = browser.settle().await;
    assert!(
        updates.contains(&BrowseUpdate::Appended { added: 50.min(catalog.size as usize) }),
        "first page did not land: {updates:?}"
    );
    browser
}

/// Settles the browser and drops updates from superseded fetches.
pub async fn landed(browser: &mut Browser) -> Vec<BrowseUpdate> {
    let mut updates = browser.settle().await;
    updates.retain(|u| *u != BrowseUpdate::Discarded);
    updates
}

pub fn ids(browser: &Browser) -> Vec<u64> {
    browser.entries().iter().map(|e| e.id).collect()
}
