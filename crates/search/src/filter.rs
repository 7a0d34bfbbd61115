use std::collections::BTreeSet;

use catalog_protocol::{SortKey, SortMode, SortOrder, Visibility};
use serde::{Deserialize, Serialize};

use crate::range::TierBounds;
use crate::slider::{RangeCommit, SliderKind};

/// Who is browsing. Decides which privileged facets reach the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Anonymous,
    Member,
    SuperAdmin,
}

impl Role {
    #[must_use]
    pub const fn is_signed_in(self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    #[must_use]
    pub const fn can_see_deleted(self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

/// Generation counter of the committed filter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Every active facet of the level browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub query: String,
    pub sort: SortMode,
    pub pgu_low_name: String,
    pub pgu_high_name: String,
    /// Contiguous run of Quantum tiers, in tier order.
    pub q_tier_names: Vec<String>,
    pub special_tier_names: BTreeSet<String>,
    pub q_filter_enabled: bool,
    pub cleared_visibility: Visibility,
    pub deleted_visibility: Visibility,
    pub available_download_visibility: Visibility,
    pub only_my_likes: bool,
    pub curation_types: BTreeSet<String>,
    pub tags: BTreeSet<String>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::defaults(&TierBounds::new("P1", "U20"))
    }
}

impl FilterState {
    /// Session defaults over the full PGU span. Deleted entries start hidden;
    /// only privileged callers ever send that facet.
    #[must_use]
    pub fn defaults(pgu: &TierBounds) -> Self {
        Self {
            query: String::new(),
            sort: SortMode::new(SortKey::Recent, SortOrder::Desc),
            pgu_low_name: pgu.low.clone(),
            pgu_high_name: pgu.high.clone(),
            q_tier_names: Vec::new(),
            special_tier_names: BTreeSet::new(),
            q_filter_enabled: false,
            cleared_visibility: Visibility::Show,
            deleted_visibility: Visibility::Hide,
            available_download_visibility: Visibility::Show,
            only_my_likes: false,
            curation_types: BTreeSet::new(),
            tags: BTreeSet::new(),
        }
    }
}

/// Sole owner of [`FilterState`]. Each named operation is one commit and
/// advances the epoch exactly once.
#[derive(Debug, Clone)]
pub struct FilterStore {
    state: FilterState,
    defaults: FilterState,
    epoch: Epoch,
}

impl FilterStore {
    #[must_use]
    pub fn new(defaults: FilterState) -> Self {
        Self {
            state: defaults.clone(),
            defaults,
            epoch: Epoch::default(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &FilterState {
        &self.state
    }

    #[must_use]
    pub const fn defaults(&self) -> &FilterState {
        &self.defaults
    }

    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Replaces the reset target; the live state is untouched.
    pub fn set_defaults(&mut self, defaults: FilterState) {
        self.defaults = defaults;
    }

    fn commit(&mut self, mutate: impl FnOnce(&mut FilterState)) -> Epoch {
        mutate(&mut self.state);
        self.epoch = self.epoch.next();
        log::debug!("Filter commit -> epoch {}", self.epoch.value());
        self.epoch
    }

    /// Bumps the epoch without changing any facet; used for the first fetch.
    pub fn touch(&mut self) -> Epoch {
        self.commit(|_| {})
    }

    pub fn set_query(&mut self, query: impl Into<String>) -> Epoch {
        let query = query.into();
        self.commit(|s| s.query = query)
    }

    pub fn set_sort(&mut self, sort: SortMode) -> Epoch {
        self.commit(|s| s.sort = sort)
    }

    pub fn set_sort_key(&mut self, key: SortKey) -> Epoch {
        self.commit(|s| s.sort.key = key)
    }

    pub fn set_sort_order(&mut self, order: SortOrder) -> Epoch {
        self.commit(|s| s.sort.order = order)
    }

    pub fn toggle_special(&mut self, name: &str) -> Epoch {
        self.commit(|s| toggle(&mut s.special_tier_names, name))
    }

    pub fn clear_specials(&mut self) -> Epoch {
        self.commit(|s| s.special_tier_names.clear())
    }

    pub fn toggle_curation_type(&mut self, name: &str) -> Epoch {
        self.commit(|s| toggle(&mut s.curation_types, name))
    }

    pub fn toggle_tag(&mut self, name: &str) -> Epoch {
        self.commit(|s| toggle(&mut s.tags, name))
    }

    pub fn set_cleared_visibility(&mut self, visibility: Visibility) -> Epoch {
        self.commit(|s| s.cleared_visibility = visibility)
    }

    pub fn set_deleted_visibility(&mut self, visibility: Visibility) -> Epoch {
        self.commit(|s| s.deleted_visibility = visibility)
    }

    pub fn set_available_download_visibility(&mut self, visibility: Visibility) -> Epoch {
        self.commit(|s| s.available_download_visibility = visibility)
    }

    pub fn set_only_my_likes(&mut self, only: bool) -> Epoch {
        self.commit(|s| s.only_my_likes = only)
    }

    /// Turning the Quantum filter on installs `seed` as the active Q run;
    /// turning it off empties the run.
    pub fn set_q_filter_enabled(&mut self, enabled: bool, seed: Vec<String>) -> Epoch {
        self.commit(|s| {
            s.q_filter_enabled = enabled;
            s.q_tier_names = if enabled { seed } else { Vec::new() };
        })
    }

    pub fn commit_pgu_range(&mut self, commit: &RangeCommit, low: String, high: String) -> Epoch {
        debug_assert_eq!(commit.kind(), SliderKind::Pgu);
        self.commit(|s| {
            s.pgu_low_name = low;
            s.pgu_high_name = high;
        })
    }

    /// `None` while the Quantum filter is off: the slider keeps its value but
    /// the query is unaffected.
    pub fn commit_q_range(&mut self, commit: &RangeCommit, names: Vec<String>) -> Option<Epoch> {
        debug_assert_eq!(commit.kind(), SliderKind::Quantum);
        if !self.state.q_filter_enabled {
            log::debug!("Quantum range committed while filter disabled; query unchanged");
            return None;
        }
        Some(self.commit(|s| s.q_tier_names = names))
    }

    /// Re-anchors range names after a taxonomy reload. Commits only when something moved.
    pub fn rebase_ranges(
        &mut self,
        pgu: (String, String),
        q_tier_names: Option<Vec<String>>,
    ) -> Option<Epoch> {
        let (low, high) = pgu;
        let q_changed = q_tier_names
            .as_ref()
            .is_some_and(|names| *names != self.state.q_tier_names);
        if low == self.state.pgu_low_name && high == self.state.pgu_high_name && !q_changed {
            return None;
        }
        Some(self.commit(|s| {
            s.pgu_low_name = low;
            s.pgu_high_name = high;
            if let Some(names) = q_tier_names {
                s.q_tier_names = names;
            }
        }))
    }

    /// Installs a complete state as a single commit.
    pub fn restore(&mut self, state: FilterState) -> Epoch {
        self.commit(|s| *s = state)
    }

    /// Back to defaults as a single commit.
    pub fn reset(&mut self) -> Epoch {
        let defaults = self.defaults.clone();
        self.commit(|s| *s = defaults)
    }
}

fn toggle(set: &mut BTreeSet<String>, name: &str) {
    if !set.remove(name) {
        set.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::RangeSelection;
    use crate::slider::SliderController;
    use pretty_assertions::assert_eq;

    fn store() -> FilterStore {
        FilterStore::new(FilterState::defaults(&TierBounds::new("P1", "U20")))
    }

    #[test]
    fn every_commit_advances_epoch() {
        let mut store = store();
        let mut last = store.epoch();
        let ops: Vec<Box<dyn Fn(&mut FilterStore) -> Epoch>> = vec![
            Box::new(|s| s.set_query("abc")),
            Box::new(|s| s.set_query("abc")),
            Box::new(|s| s.set_sort_key(SortKey::Clears)),
            Box::new(|s| s.set_sort_order(SortOrder::Asc)),
            Box::new(|s| s.toggle_special("MP")),
            Box::new(|s| s.toggle_curation_type("Featured")),
            Box::new(|s| s.toggle_tag("Tech")),
            Box::new(|s| s.set_cleared_visibility(Visibility::Only)),
            Box::new(|s| s.set_deleted_visibility(Visibility::Show)),
            Box::new(|s| s.set_only_my_likes(true)),
            Box::new(|s| s.reset()),
        ];
        for op in ops {
            let next = op(&mut store);
            assert!(next > last);
            assert_eq!(next, store.epoch());
            last = next;
        }
    }

    #[test]
    fn toggle_special_is_symmetric() {
        let mut store = store();
        store.toggle_special("MP");
        store.toggle_special("Gimmick");
        store.toggle_special("MP");
        assert_eq!(
            store.state().special_tier_names,
            BTreeSet::from(["Gimmick".to_string()])
        );
    }

    #[test]
    fn q_range_is_ignored_while_disabled() {
        let mut store = store();
        let mut q = SliderController::new(SliderKind::Quantum, RangeSelection::new(101, 104));
        let commit = q.on_commit(RangeSelection::new(102, 103));
        let before = store.epoch();
        assert_eq!(
            store.commit_q_range(&commit, vec!["Q2".to_string(), "Q3".to_string()]),
            None
        );
        assert_eq!(store.epoch(), before);
        assert!(store.state().q_tier_names.is_empty());

        store.set_q_filter_enabled(true, vec!["Q1".to_string()]);
        let epoch = store.commit_q_range(&commit, vec!["Q2".to_string(), "Q3".to_string()]);
        assert_eq!(epoch, Some(store.epoch()));
        assert_eq!(store.state().q_tier_names, ["Q2", "Q3"]);
    }

    #[test]
    fn disabling_q_filter_empties_the_run() {
        let mut store = store();
        store.set_q_filter_enabled(true, vec!["Q2".to_string(), "Q3".to_string()]);
        assert_eq!(store.state().q_tier_names, ["Q2", "Q3"]);

        store.set_q_filter_enabled(false, vec!["Q1".to_string()]);
        assert!(!store.state().q_filter_enabled);
        assert!(store.state().q_tier_names.is_empty());
    }

    #[test]
    fn curation_and_tag_toggles_are_symmetric() {
        let mut store = store();
        store.toggle_curation_type("Featured");
        store.toggle_tag("Tech");
        store.toggle_tag("Jumps");
        store.toggle_tag("Tech");
        assert_eq!(
            store.state().curation_types,
            BTreeSet::from(["Featured".to_string()])
        );
        assert_eq!(store.state().tags, BTreeSet::from(["Jumps".to_string()]));

        store.reset();
        assert!(store.state().curation_types.is_empty());
        assert!(store.state().tags.is_empty());
    }

    #[test]
    fn reset_restores_defaults_in_one_commit() {
        let mut store = store();
        store.set_query("#12");
        store.toggle_special("MP");
        store.set_q_filter_enabled(true, vec!["Q1".to_string()]);
        let before = store.epoch();
        let after = store.reset();
        assert_eq!(after.value(), before.value() + 1);
        assert_eq!(store.state(), store.defaults());
    }

    #[test]
    fn rebase_only_commits_on_change() {
        let mut store = store();
        let before = store.epoch();
        assert_eq!(
            store.rebase_ranges(("P1".to_string(), "U20".to_string()), None),
            None
        );
        assert_eq!(store.epoch(), before);
        assert!(store
            .rebase_ranges(("P1".to_string(), "U19".to_string()), None)
            .is_some());
        assert_eq!(store.state().pgu_high_name, "U19");
    }

    #[test]
    fn state_serializes_with_wire_names() {
        let value = serde_json::to_value(FilterState::default()).unwrap();
        assert_eq!(value["sort"], "RECENT_DESC");
        assert_eq!(value["pguLowName"], "P1");
        assert_eq!(value["deletedVisibility"], "hide");
        let back: FilterState = serde_json::from_value(value).unwrap();
        assert_eq!(back, FilterState::default());
    }
}
