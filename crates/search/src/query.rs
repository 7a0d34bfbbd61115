use catalog_protocol::{PguRange, SearchBody, SearchRequest, WireRequest};

use crate::filter::{FilterState, Role};

const ID_SHORTCUT_PREFIX: char = '#';

/// `#<digits>` → entry id. Anything else, including ids that overflow, is plain text.
#[must_use]
pub fn parse_id_shortcut(query: &str) -> Option<u64> {
    let digits = query.strip_prefix(ID_SHORTCUT_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Tags sent as `specialDifficulties`.
///
/// Quantum names come first in tier order when the Quantum filter is on,
/// followed by manually toggled tags. Manual tags survive the Quantum
/// filter being switched off.
#[must_use]
pub fn effective_special_tiers(state: &FilterState) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let quantum = state
        .q_tier_names
        .iter()
        .filter(|_| state.q_filter_enabled);
    for name in quantum.chain(&state.special_tier_names) {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}

/// Maps the committed filter state onto the catalog request it stands for.
#[must_use]
pub fn build_request(state: &FilterState, role: Role) -> WireRequest {
    if let Some(id) = parse_id_shortcut(&state.query) {
        return WireRequest::ById { id };
    }

    WireRequest::Search(SearchRequest {
        query: state.query.clone(),
        sort: state.sort,
        cleared: state.cleared_visibility,
        deleted: role.can_see_deleted().then_some(state.deleted_visibility),
        available_download: state.available_download_visibility,
        only_my_likes: role.is_signed_in().then_some(state.only_my_likes),
        curation_types: state.curation_types.iter().cloned().collect(),
        tags: state.tags.iter().cloned().collect(),
        body: SearchBody {
            pgu_range: PguRange {
                from: state.pgu_low_name.clone(),
                to: state.pgu_high_name.clone(),
            },
            special_difficulties: effective_special_tiers(state),
        },
    })
}
