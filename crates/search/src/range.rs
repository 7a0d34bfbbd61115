//! Mapping between continuous slider indices and tier boundaries.
//!
//! Families passed in here must be sorted ascending by `sort_order`, which is
//! what [`Taxonomy::family`](crate::Taxonomy::family) returns.

use catalog_protocol::DifficultyTier;
use serde::{Deserialize, Serialize};

/// Pair of slider indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeSelection {
    pub low: i64,
    pub high: i64,
}

impl RangeSelection {
    #[must_use]
    pub const fn new(low: i64, high: i64) -> Self {
        Self { low, high }
    }

    #[must_use]
    pub const fn point(value: i64) -> Self {
        Self {
            low: value,
            high: value,
        }
    }

    /// Same range with `low <= high`.
    #[must_use]
    pub const fn normalized(self) -> Self {
        if self.low > self.high {
            Self {
                low: self.high,
                high: self.low,
            }
        } else {
            self
        }
    }

    #[must_use]
    pub fn clamp_to(self, span: Self) -> Self {
        Self {
            low: self.low.clamp(span.low, span.high),
            high: self.high.clamp(span.low, span.high),
        }
    }

    #[must_use]
    pub const fn is_point(&self) -> bool {
        self.low == self.high
    }

    #[must_use]
    pub const fn contains(&self, value: i64) -> bool {
        self.low <= value && value <= self.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Low,
    High,
}

/// Named pair used when a family has no tiers at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBounds {
    pub low: String,
    pub high: String,
}

impl TierBounds {
    pub fn new(low: impl Into<String>, high: impl Into<String>) -> Self {
        Self {
            low: low.into(),
            high: high.into(),
        }
    }
}

#[must_use]
pub fn family_span(family: &[DifficultyTier]) -> Option<RangeSelection> {
    let first = family.first()?;
    let last = family.last()?;
    Some(RangeSelection::new(first.sort_order, last.sort_order))
}

/// Tier a single slider index snaps to.
///
/// An exact `sort_order` match wins. Otherwise the low bound rounds up and the
/// high bound rounds down, so the resolved range never exceeds the visual one.
/// Indices past either end of the family snap to the nearest end tier.
#[must_use]
pub fn resolve_bound(family: &[DifficultyTier], value: i64, bound: Bound) -> Option<&DifficultyTier> {
    if let Some(exact) = family.iter().find(|t| t.sort_order == value) {
        return Some(exact);
    }
    match bound {
        Bound::Low => family
            .iter()
            .find(|t| t.sort_order >= value)
            .or_else(|| family.last()),
        Bound::High => family
            .iter()
            .rev()
            .find(|t| t.sort_order <= value)
            .or_else(|| family.first()),
    }
}

/// Resolves both ends of a selection; never yields `low > high`.
///
/// When the whole selection sits inside one gap between adjacent tiers the two
/// roundings would cross; the selection then collapses onto whichever
/// neighbour is closer, preferring the upper one on a tie.
#[must_use]
pub fn resolve_range(
    family: &[DifficultyTier],
    selection: RangeSelection,
) -> Option<(&DifficultyTier, &DifficultyTier)> {
    let selection = selection.normalized();
    let low = resolve_bound(family, selection.low, Bound::Low)?;
    let high = resolve_bound(family, selection.high, Bound::High)?;
    if low.sort_order <= high.sort_order {
        return Some((low, high));
    }

    let above = low.sort_order.saturating_sub(selection.high);
    let below = selection.low.saturating_sub(high.sort_order);
    let snapped = if above <= below { low } else { high };
    Some((snapped, snapped))
}

/// Slider indices to `(low_name, high_name)`, or `fallback` for an empty family.
#[must_use]
pub fn to_tier_names(
    family: &[DifficultyTier],
    selection: RangeSelection,
    fallback: &TierBounds,
) -> (String, String) {
    match resolve_range(family, selection) {
        Some((low, high)) => (low.name.clone(), high.name.clone()),
        None => (fallback.low.clone(), fallback.high.clone()),
    }
}

/// Exact inverse of [`to_tier_names`]. Unknown names fall back to the first
/// (low) or last (high) tier; `None` only when the family is empty.
#[must_use]
pub fn to_indices(family: &[DifficultyTier], low_name: &str, high_name: &str) -> Option<RangeSelection> {
    let first = family.first()?;
    let last = family.last()?;
    let low = family
        .iter()
        .find(|t| t.name == low_name)
        .unwrap_or_else(|| {
            log::debug!("Tier '{low_name}' not in family; using '{}'", first.name);
            first
        });
    let high = family
        .iter()
        .find(|t| t.name == high_name)
        .unwrap_or_else(|| {
            log::debug!("Tier '{high_name}' not in family; using '{}'", last.name);
            last
        });
    Some(RangeSelection::new(low.sort_order, high.sort_order).normalized())
}

/// Names of every tier inside the resolved selection, in family order.
#[must_use]
pub fn names_in_range(family: &[DifficultyTier], selection: RangeSelection) -> Vec<String> {
    let Some((low, high)) = resolve_range(family, selection) else {
        return Vec::new();
    };
    let span = RangeSelection::new(low.sort_order, high.sort_order);
    family
        .iter()
        .filter(|t| span.contains(t.sort_order))
        .map(|t| t.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn family(orders: &[(&str, i64)]) -> Vec<DifficultyTier> {
        orders
            .iter()
            .enumerate()
            .map(|(idx, (name, order))| DifficultyTier::pgu(idx as u64 + 1, name, *order))
            .collect()
    }

    fn fallback() -> TierBounds {
        TierBounds::new("P1", "U20")
    }

    #[test]
    fn gap_selection_snaps_inward() {
        let fam = family(&[("P1", 1), ("P5", 5), ("P10", 10)]);
        assert_eq!(
            to_tier_names(&fam, RangeSelection::new(3, 7), &fallback()),
            ("P5".to_string(), "P5".to_string())
        );
        assert_eq!(
            to_tier_names(&fam, RangeSelection::new(2, 10), &fallback()),
            ("P5".to_string(), "P10".to_string())
        );
    }

    #[test]
    fn selection_inside_single_gap_collapses_to_nearest() {
        let fam = family(&[("P1", 1), ("P5", 5), ("P10", 10)]);
        assert_eq!(
            to_tier_names(&fam, RangeSelection::new(3, 4), &fallback()),
            ("P5".to_string(), "P5".to_string())
        );
        assert_eq!(
            to_tier_names(&fam, RangeSelection::new(6, 7), &fallback()),
            ("P5".to_string(), "P5".to_string())
        );
        assert_eq!(
            to_tier_names(&fam, RangeSelection::new(8, 9), &fallback()),
            ("P10".to_string(), "P10".to_string())
        );
    }

    #[test]
    fn out_of_span_indices_snap_to_ends() {
        let fam = family(&[("P1", 1), ("P5", 5), ("P10", 10)]);
        assert_eq!(
            to_tier_names(&fam, RangeSelection::new(-4, 40), &fallback()),
            ("P1".to_string(), "P10".to_string())
        );
        assert_eq!(
            to_tier_names(&fam, RangeSelection::new(20, 40), &fallback()),
            ("P10".to_string(), "P10".to_string())
        );
    }

    #[test]
    fn reversed_selection_is_normalized() {
        let fam = family(&[("P1", 1), ("P5", 5), ("P10", 10)]);
        assert_eq!(
            to_tier_names(&fam, RangeSelection::new(10, 1), &fallback()),
            ("P1".to_string(), "P10".to_string())
        );
    }

    #[test]
    fn empty_family_uses_fallback() {
        assert_eq!(
            to_tier_names(&[], RangeSelection::new(1, 60), &fallback()),
            ("P1".to_string(), "U20".to_string())
        );
        assert_eq!(to_indices(&[], "P1", "U20"), None);
        assert!(names_in_range(&[], RangeSelection::new(1, 2)).is_empty());
    }

    #[test]
    fn unknown_names_fall_back_to_family_ends() {
        let fam = family(&[("P1", 1), ("P5", 5), ("P10", 10)]);
        assert_eq!(
            to_indices(&fam, "gone", "P5"),
            Some(RangeSelection::new(1, 5))
        );
        assert_eq!(
            to_indices(&fam, "P5", "gone"),
            Some(RangeSelection::new(5, 10))
        );
    }

    #[test]
    fn names_in_range_is_contiguous() {
        let fam = family(&[("Q1", 101), ("Q2", 102), ("Q3", 103), ("Q4", 104)]);
        assert_eq!(
            names_in_range(&fam, RangeSelection::new(102, 104)),
            ["Q2", "Q3", "Q4"]
        );
        assert_eq!(names_in_range(&fam, RangeSelection::point(103)), ["Q3"]);
    }

    fn arb_family() -> impl Strategy<Value = Vec<DifficultyTier>> {
        prop::collection::btree_set(-50i64..200, 1..24).prop_map(|orders| {
            orders
                .into_iter()
                .enumerate()
                .map(|(idx, order)| DifficultyTier::pgu(idx as u64, &format!("T{order}"), order))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn proptest_exact_indices_round_trip(fam in arb_family(), a in any::<prop::sample::Index>(), b in any::<prop::sample::Index>()) {
            let lo = &fam[a.index(fam.len())];
            let hi = &fam[b.index(fam.len())];
            let selection = RangeSelection::new(lo.sort_order, hi.sort_order).normalized();
            let (low_name, high_name) = to_tier_names(&fam, selection, &fallback());
            prop_assert_eq!(to_indices(&fam, &low_name, &high_name), Some(selection));
        }

        #[test]
        fn proptest_resolved_range_is_never_empty(fam in arb_family(), x in -60i64..210, y in -60i64..210) {
            let span = family_span(&fam).unwrap();
            let selection = RangeSelection::new(x, y).clamp_to(span);
            let (low, high) = resolve_range(&fam, selection).unwrap();
            prop_assert!(low.sort_order <= high.sort_order);
            prop_assert!(!names_in_range(&fam, selection).is_empty());
        }

        #[test]
        fn proptest_resolved_range_stays_inside_visual_span(fam in arb_family(), x in -60i64..210, y in -60i64..210) {
            let span = family_span(&fam).unwrap();
            let selection = RangeSelection::new(x, y).clamp_to(span).normalized();
            let (low, high) = resolve_range(&fam, selection).unwrap();
            let covers_a_tier = fam.iter().any(|t| selection.contains(t.sort_order));
            if covers_a_tier {
                prop_assert!(selection.contains(low.sort_order));
                prop_assert!(selection.contains(high.sort_order));
            }
        }
    }
}
