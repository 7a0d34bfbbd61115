use std::sync::Arc;

use tokio::time::Instant;

use catalog_protocol::{
    DifficultyTier, Entry, SortKey, SortMode, SortOrder, Visibility, WireRequest,
};

use crate::accumulator::ResultAccumulator;
use crate::config::BrowseConfig;
use crate::debounce::QueryDebounce;
use crate::error::SearchError;
use crate::fetch::{CatalogClient, FetchCompletion, PageData, PageFetcher, Reconciled};
use crate::filter::{Epoch, FilterState, FilterStore, Role};
use crate::query::build_request;
use crate::range::{family_span, names_in_range, to_indices, to_tier_names, RangeSelection, TierBounds};
use crate::slider::{Knob, RangeCommit, SliderController, SliderKind};
use crate::taxonomy::{Taxonomy, TierFamily};

/// Effect of one settled fetch on the visible list.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowseUpdate {
    /// Superseded or cancelled; nothing changed.
    Discarded,
    Appended { added: usize },
    Found,
    NotFound,
    Failed(SearchError),
}

/// Level browser core: filter state, both sliders, and the paged result list.
///
/// Single-threaded: every method runs on the caller's event loop, fetches run
/// as spawned tasks, and their completions come back through
/// [`next_completion`](Self::next_completion) / [`apply_completion`](Self::apply_completion).
pub struct Browser {
    config: BrowseConfig,
    role: Role,
    taxonomy: Taxonomy,
    filters: FilterStore,
    pgu_slider: SliderController,
    q_slider: SliderController,
    results: ResultAccumulator,
    fetcher: PageFetcher,
    request: Option<WireRequest>,
    debounce: QueryDebounce,
}

impl Browser {
    /// Starts with an empty taxonomy; nothing is fetched until [`set_taxonomy`](Self::set_taxonomy).
    #[must_use]
    pub fn new(client: Arc<dyn CatalogClient>, config: BrowseConfig, role: Role) -> Self {
        let defaults = FilterState::defaults(&config.fallback_bounds());
        let filters = FilterStore::new(defaults);
        let span = config.default_span;
        let debounce = QueryDebounce::new(config.query_debounce(), &filters.state().query);
        Self {
            fetcher: PageFetcher::new(client, config.page_limit),
            results: ResultAccumulator::new(filters.epoch()),
            filters,
            pgu_slider: SliderController::new(SliderKind::Pgu, span),
            q_slider: SliderController::new(SliderKind::Quantum, span),
            taxonomy: Taxonomy::default(),
            config,
            role,
            request: None,
            debounce,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &BrowseConfig {
        &self.config
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub const fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    #[must_use]
    pub const fn filter(&self) -> &FilterState {
        self.filters.state()
    }

    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.filters.epoch()
    }

    #[must_use]
    pub const fn results(&self) -> &ResultAccumulator {
        &self.results
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        self.results.entries()
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.results.has_more()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.fetcher.is_fetching()
    }

    /// Last transient failure of the current epoch, cleared by a successful page.
    #[must_use]
    pub const fn error(&self) -> Option<&SearchError> {
        self.fetcher.error()
    }

    #[must_use]
    pub const fn not_found(&self) -> bool {
        self.results.not_found()
    }

    /// Request the current epoch maps to; `None` until the taxonomy is known.
    #[must_use]
    pub const fn current_request(&self) -> Option<&WireRequest> {
        self.request.as_ref()
    }

    #[must_use]
    pub const fn slider(&self, kind: SliderKind) -> &SliderController {
        match kind {
            SliderKind::Pgu => &self.pgu_slider,
            SliderKind::Quantum => &self.q_slider,
        }
    }

    fn slider_mut(&mut self, kind: SliderKind) -> &mut SliderController {
        match kind {
            SliderKind::Pgu => &mut self.pgu_slider,
            SliderKind::Quantum => &mut self.q_slider,
        }
    }

    fn family(&self, family: TierFamily) -> &[DifficultyTier] {
        self.taxonomy.family(family)
    }

    fn pgu_defaults(&self) -> TierBounds {
        let pgu = self.family(TierFamily::Pgu);
        match (pgu.first(), pgu.last()) {
            (Some(first), Some(last)) => TierBounds::new(&first.name, &last.name),
            _ => self.config.fallback_bounds(),
        }
    }

    fn span_of(&self, family: TierFamily) -> RangeSelection {
        family_span(self.family(family)).unwrap_or(self.config.default_span)
    }

    /// Installs a new taxonomy snapshot.
    ///
    /// The first non-empty snapshot starts the session with one fetch. Later
    /// snapshots re-anchor committed tier names and fetch only if they moved.
    pub fn set_taxonomy(&mut self, tiers: Vec<DifficultyTier>) {
        let was_empty = self.taxonomy.is_empty();
        self.taxonomy = Taxonomy::new(tiers);
        if self.taxonomy.is_empty() {
            log::warn!("Difficulty taxonomy is empty; results stay hidden");
            self.fetcher.cancel();
            self.request = None;
            self.results = ResultAccumulator::new(self.epoch());
            return;
        }

        let pgu_span = self.span_of(TierFamily::Pgu);
        let q_span = self.span_of(TierFamily::Quantum);
        self.pgu_slider.set_span(pgu_span);
        self.q_slider.set_span(q_span);
        let defaults = FilterState::defaults(&self.pgu_defaults());
        self.filters.set_defaults(defaults);

        let (low, high, q_names) = self.reanchored_names();
        let rebased = self.filters.rebase_ranges((low, high), q_names);
        self.sync_pgu_slider();
        // A disabled Quantum filter keeps its slider value, clamped to the new span.
        if was_empty || self.filters.state().q_filter_enabled {
            self.sync_q_slider();
        }

        match rebased {
            Some(epoch) => self.after_commit(epoch),
            None if was_empty => {
                let epoch = self.filters.touch();
                self.after_commit(epoch);
            }
            None => {}
        }
    }

    /// Committed names resolved against the current taxonomy.
    fn reanchored_names(&self) -> (String, String, Option<Vec<String>>) {
        let state = self.filters.state();
        let pgu = self.family(TierFamily::Pgu);
        let (low, high) = match to_indices(pgu, &state.pgu_low_name, &state.pgu_high_name) {
            Some(selection) => to_tier_names(pgu, selection, &self.config.fallback_bounds()),
            None => (state.pgu_low_name.clone(), state.pgu_high_name.clone()),
        };

        let q_names = if !state.q_filter_enabled || state.q_tier_names.is_empty() {
            None
        } else {
            let quantum = self.family(TierFamily::Quantum);
            let first = state.q_tier_names.first().map_or("", String::as_str);
            let last = state.q_tier_names.last().map_or("", String::as_str);
            Some(
                to_indices(quantum, first, last)
                    .map(|selection| names_in_range(quantum, selection))
                    .unwrap_or_default(),
            )
        };
        (low, high, q_names)
    }

    /// Moves both sliders onto the committed state without committing.
    fn sync_sliders(&mut self) {
        self.sync_pgu_slider();
        self.sync_q_slider();
    }

    fn sync_pgu_slider(&mut self) {
        let state = self.filters.state();
        let pgu = to_indices(
            self.family(TierFamily::Pgu),
            &state.pgu_low_name,
            &state.pgu_high_name,
        )
        .unwrap_or(self.config.default_span);
        self.pgu_slider.sync(pgu);
    }

    /// An empty Q run puts the slider back on the full family span.
    fn sync_q_slider(&mut self) {
        let state = self.filters.state();
        let quantum = self.family(TierFamily::Quantum);
        let q = match (state.q_tier_names.first(), state.q_tier_names.last()) {
            (Some(first), Some(last)) => to_indices(quantum, first, last),
            _ => family_span(quantum),
        }
        .unwrap_or(self.config.default_span);
        self.q_slider.sync(q);
    }

    fn after_commit(&mut self, epoch: Epoch) {
        self.results = ResultAccumulator::new(epoch);
        if self.taxonomy.is_empty() {
            log::debug!("Epoch {} committed before taxonomy; fetch deferred", epoch.value());
            self.fetcher.cancel();
            self.request = None;
            return;
        }
        let request = build_request(self.filters.state(), self.role);
        self.fetcher.start(epoch, &request);
        self.request = Some(request);
    }

    pub fn begin_drag(&mut self, kind: SliderKind, knob: Knob) {
        self.slider_mut(kind).begin_drag(knob);
    }

    /// Live slider movement. Never touches the filter state or the network.
    pub fn on_drag(&mut self, kind: SliderKind, selection: RangeSelection) {
        self.slider_mut(kind).on_drag(selection);
    }

    pub fn drag_knob(&mut self, kind: SliderKind, knob: Knob, value: i64) {
        self.slider_mut(kind).drag_knob(knob, value);
    }

    pub fn cancel_drag(&mut self, kind: SliderKind) {
        self.slider_mut(kind).cancel_drag();
    }

    /// Ends a slider interaction at `selection`.
    pub fn on_commit(&mut self, kind: SliderKind, selection: RangeSelection) -> Option<Epoch> {
        let commit = self.slider_mut(kind).on_commit(selection);
        self.apply_range_commit(commit)
    }

    /// Pointer released at the current live value.
    pub fn release(&mut self, kind: SliderKind) -> Option<Epoch> {
        let commit = self.slider_mut(kind).release();
        self.apply_range_commit(commit)
    }

    pub fn track_click(&mut self, kind: SliderKind, value: i64) -> Option<Epoch> {
        let commit = self.slider_mut(kind).track_click(value);
        self.apply_range_commit(commit)
    }

    fn apply_range_commit(&mut self, commit: RangeCommit) -> Option<Epoch> {
        let selection = commit.selection();
        let epoch = match commit.kind() {
            SliderKind::Pgu => {
                let (low, high) = to_tier_names(
                    self.family(TierFamily::Pgu),
                    selection,
                    &self.config.fallback_bounds(),
                );
                Some(self.filters.commit_pgu_range(&commit, low, high))
            }
            SliderKind::Quantum => {
                let names = names_in_range(self.family(TierFamily::Quantum), selection);
                self.filters.commit_q_range(&commit, names)
            }
        };
        self.slider_mut(commit.kind()).settle();
        if let Some(epoch) = epoch {
            self.after_commit(epoch);
        }
        epoch
    }

    pub fn set_query(&mut self, query: impl Into<String>) -> Epoch {
        let epoch = self.filters.set_query(query);
        self.debounce.sync(&self.filters.state().query);
        self.after_commit(epoch);
        epoch
    }

    /// Records a keystroke in the search box. Nothing is committed until the
    /// input has been quiet for `query_debounce_ms`.
    pub fn push_query_text(&mut self, text: impl Into<String>, now: Instant) {
        self.debounce.push(text, now);
    }

    /// When the event loop should call [`commit_due_query`](Self::commit_due_query).
    #[must_use]
    pub fn query_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Commits the typed query once its quiet period is over. Text equal to
    /// the committed query is dropped without a commit.
    pub fn commit_due_query(&mut self, now: Instant) -> Option<Epoch> {
        let text = self.debounce.due(now)?;
        Some(self.set_query(text))
    }

    pub fn set_sort(&mut self, sort: SortMode) -> Epoch {
        let epoch = self.filters.set_sort(sort);
        self.after_commit(epoch);
        epoch
    }

    pub fn set_sort_key(&mut self, key: SortKey) -> Epoch {
        let epoch = self.filters.set_sort_key(key);
        self.after_commit(epoch);
        epoch
    }

    pub fn set_sort_order(&mut self, order: SortOrder) -> Epoch {
        let epoch = self.filters.set_sort_order(order);
        self.after_commit(epoch);
        epoch
    }

    pub fn toggle_special(&mut self, name: &str) -> Epoch {
        let epoch = self.filters.toggle_special(name);
        self.after_commit(epoch);
        epoch
    }

    pub fn clear_specials(&mut self) -> Epoch {
        let epoch = self.filters.clear_specials();
        self.after_commit(epoch);
        epoch
    }

    pub fn toggle_curation_type(&mut self, name: &str) -> Epoch {
        let epoch = self.filters.toggle_curation_type(name);
        self.after_commit(epoch);
        epoch
    }

    pub fn toggle_tag(&mut self, name: &str) -> Epoch {
        let epoch = self.filters.toggle_tag(name);
        self.after_commit(epoch);
        epoch
    }

    pub fn set_cleared_visibility(&mut self, visibility: Visibility) -> Epoch {
        let epoch = self.filters.set_cleared_visibility(visibility);
        self.after_commit(epoch);
        epoch
    }

    pub fn set_deleted_visibility(&mut self, visibility: Visibility) -> Epoch {
        let epoch = self.filters.set_deleted_visibility(visibility);
        self.after_commit(epoch);
        epoch
    }

    pub fn set_available_download_visibility(&mut self, visibility: Visibility) -> Epoch {
        let epoch = self.filters.set_available_download_visibility(visibility);
        self.after_commit(epoch);
        epoch
    }

    pub fn set_only_my_likes(&mut self, only: bool) -> Epoch {
        let epoch = self.filters.set_only_my_likes(only);
        self.after_commit(epoch);
        epoch
    }

    /// Switching the Quantum filter on applies the Q slider's committed range.
    pub fn set_q_filter_enabled(&mut self, enabled: bool) -> Epoch {
        let seed = if enabled {
            names_in_range(self.family(TierFamily::Quantum), self.q_slider.committed())
        } else {
            Vec::new()
        };
        let epoch = self.filters.set_q_filter_enabled(enabled, seed);
        self.after_commit(epoch);
        epoch
    }

    /// Installs a saved state as one commit.
    pub fn restore(&mut self, state: FilterState) -> Epoch {
        let epoch = self.filters.restore(state);
        self.debounce.sync(&self.filters.state().query);
        self.sync_sliders();
        self.after_commit(epoch);
        epoch
    }

    /// Back to session defaults with exactly one epoch bump and one fetch.
    pub fn reset_all(&mut self) -> Epoch {
        let epoch = self.filters.reset();
        self.debounce.sync(&self.filters.state().query);
        self.sync_sliders();
        self.after_commit(epoch);
        epoch
    }

    /// Requests the next page of the current epoch. `false` when busy, exhausted or not started.
    pub fn load_more(&mut self) -> bool {
        let epoch = self.epoch();
        let has_more = self.results.has_more();
        match &self.request {
            Some(request) => self.fetcher.load_more(epoch, request, has_more),
            None => false,
        }
    }

    /// Re-issues the page that last failed, for the same epoch.
    pub fn retry(&mut self) -> bool {
        let epoch = self.epoch();
        match &self.request {
            Some(request) => self.fetcher.retry(epoch, request),
            None => false,
        }
    }

    /// Waits for the next settled fetch; `None` when nothing is pending.
    pub async fn next_completion(&mut self) -> Option<FetchCompletion> {
        self.fetcher.next_completion().await
    }

    /// Folds a settled fetch into the result list if it still belongs to the current epoch.
    pub fn apply_completion(&mut self, completion: FetchCompletion) -> BrowseUpdate {
        let epoch = self.epoch();
        match self.fetcher.reconcile(completion, epoch) {
            Reconciled::Stale | Reconciled::Cancelled => BrowseUpdate::Discarded,
            Reconciled::Loaded(PageData::Search { entries, total }) => {
                let added = self.results.append(entries, total);
                log::debug!(
                    "Epoch {}: +{added} entries ({} of {total})",
                    epoch.value(),
                    self.results.len()
                );
                BrowseUpdate::Appended { added }
            }
            Reconciled::Loaded(PageData::Lookup(entry)) => {
                let found = entry.is_some();
                self.results.set_lookup(entry);
                if found {
                    BrowseUpdate::Found
                } else {
                    BrowseUpdate::NotFound
                }
            }
            Reconciled::Failed(err) => BrowseUpdate::Failed(err),
        }
    }

    /// Awaits and applies completions until nothing is in flight.
    pub async fn settle(&mut self) -> Vec<BrowseUpdate> {
        let mut updates = Vec::new();
        while let Some(completion) = self.next_completion().await {
            updates.push(self.apply_completion(completion));
        }
        updates
    }
}
