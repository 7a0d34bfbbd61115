use catalog_protocol::{SortKey, SortOrder, Visibility};
use catalog_search::{
    names_in_range, to_indices, to_tier_names, FilterState, Taxonomy, TierBounds, TierFamily,
};
use clap::Args;

/// Facet flags of the `search` subcommand. Unset flags keep the session default.
#[derive(Args, Debug, Clone, Default)]
pub struct SearchFacets {
    /// Free-text query; `#<id>` looks up a single entry
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    /// Sort key: RECENT|DIFF|CLEARS|LIKES|RATING_ACCURACY|RATING_ACCURACY_VOTES|RANDOM
    #[arg(long)]
    pub sort: Option<SortKey>,

    /// Sort order: ASC|DESC
    #[arg(long)]
    pub order: Option<SortOrder>,

    /// Lowest PGU tier name
    #[arg(long)]
    pub from: Option<String>,

    /// Highest PGU tier name
    #[arg(long)]
    pub to: Option<String>,

    /// Lowest Quantum tier; enables the Quantum filter
    #[arg(long)]
    pub q_from: Option<String>,

    /// Highest Quantum tier; enables the Quantum filter
    #[arg(long)]
    pub q_to: Option<String>,

    /// Special tier to include (repeatable)
    #[arg(long = "special")]
    pub specials: Vec<String>,

    /// Curation type to require (repeatable)
    #[arg(long = "curation")]
    pub curation_types: Vec<String>,

    /// Tag to require (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Cleared entries: show|hide|only
    #[arg(long)]
    pub cleared: Option<Visibility>,

    /// Deleted entries: show|hide|only (super admins only)
    #[arg(long)]
    pub deleted: Option<Visibility>,

    /// Entries with a download link: show|hide|only
    #[arg(long)]
    pub available_dl: Option<Visibility>,

    /// Only entries liked by the signed-in user
    #[arg(long)]
    pub only_my_likes: bool,
}

impl SearchFacets {
    /// Applies the flags on top of `state`, resolving tier names against `taxonomy`.
    #[must_use]
    pub fn apply(&self, mut state: FilterState, taxonomy: &Taxonomy) -> FilterState {
        if let Some(query) = &self.query {
            state.query = query.trim().to_string();
        }
        if let Some(key) = self.sort {
            state.sort.key = key;
        }
        if let Some(order) = self.order {
            state.sort.order = order;
        }

        if self.from.is_some() || self.to.is_some() {
            let low = self.from.clone().unwrap_or_else(|| state.pgu_low_name.clone());
            let high = self.to.clone().unwrap_or_else(|| state.pgu_high_name.clone());
            let pgu = taxonomy.family(TierFamily::Pgu);
            (state.pgu_low_name, state.pgu_high_name) = match to_indices(pgu, &low, &high) {
                Some(selection) => to_tier_names(pgu, selection, &TierBounds::new(&low, &high)),
                None => (low, high),
            };
        }

        if self.q_from.is_some() || self.q_to.is_some() {
            let quantum = taxonomy.family(TierFamily::Quantum);
            let low = self.q_from.as_deref().unwrap_or_default();
            let high = self.q_to.as_deref().unwrap_or_default();
            state.q_filter_enabled = true;
            state.q_tier_names = to_indices(quantum, low, high)
                .map(|selection| names_in_range(quantum, selection))
                .unwrap_or_default();
        }

        for name in &self.specials {
            if !taxonomy.is_empty() && taxonomy.special_group(name).is_none() {
                log::warn!("Unknown special tier '{name}' ignored");
                continue;
            }
            state.special_tier_names.insert(name.clone());
        }

        state.curation_types.extend(trimmed(&self.curation_types));
        state.tags.extend(trimmed(&self.tags));

        if let Some(cleared) = self.cleared {
            state.cleared_visibility = cleared;
        }
        if let Some(deleted) = self.deleted {
            state.deleted_visibility = deleted;
        }
        if let Some(available) = self.available_dl {
            state.available_download_visibility = available;
        }
        if self.only_my_likes {
            state.only_my_likes = true;
        }
        state
    }
}

fn trimmed(names: &[String]) -> impl Iterator<Item = String> + '_ {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
