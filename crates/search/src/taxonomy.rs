use std::collections::HashSet;

use catalog_protocol::{DifficultyTier, TierType};

/// Names of special tiers that are grouped as "hidden" in the tag picker.
const HIDDEN_SPECIAL_NAMES: &[&str] = &["-2", "-21", "Unranked", "Impossible", "Censor"];

const QUANTUM_PREFIX: char = 'Q';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierFamily {
    /// Linear difficulty tiers driven by the main range slider.
    Pgu,
    /// Quantum tiers, driven by the optional second slider.
    Quantum,
    /// Flag-like tiers toggled individually.
    Special,
}

/// Display grouping of non-PGU tiers, in picker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpecialGroup {
    Quantum,
    Extra,
    Hidden,
}

#[must_use]
pub fn family_of(tier: &DifficultyTier) -> Option<TierFamily> {
    if tier.name.starts_with(QUANTUM_PREFIX) {
        return Some(TierFamily::Quantum);
    }
    match tier.tier_type {
        TierType::Pgu => Some(TierFamily::Pgu),
        TierType::Special => Some(TierFamily::Special),
        TierType::Other(_) => None,
    }
}

/// Read-only view over the difficulty catalog, split into sorted families.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Taxonomy {
    pgu: Vec<DifficultyTier>,
    quantum: Vec<DifficultyTier>,
    special: Vec<DifficultyTier>,
    unclassified: usize,
}

impl Taxonomy {
    pub fn new(tiers: impl IntoIterator<Item = DifficultyTier>) -> Self {
        let mut seen = HashSet::new();
        let mut taxonomy = Self::default();

        for tier in tiers {
            if !seen.insert(tier.name.clone()) {
                log::warn!("Duplicate difficulty name '{}' ignored", tier.name);
                continue;
            }
            match family_of(&tier) {
                Some(TierFamily::Pgu) => taxonomy.pgu.push(tier),
                Some(TierFamily::Quantum) => taxonomy.quantum.push(tier),
                Some(TierFamily::Special) => taxonomy.special.push(tier),
                None => taxonomy.unclassified += 1,
            }
        }

        for family in [
            &mut taxonomy.pgu,
            &mut taxonomy.quantum,
            &mut taxonomy.special,
        ] {
            family.sort_by_key(|t| t.sort_order);
            if family.windows(2).any(|w| w[0].sort_order == w[1].sort_order) {
                log::warn!("Difficulty family has tied sort orders; first tier wins on lookup");
            }
        }

        log::debug!(
            "Taxonomy loaded: pgu={}, quantum={}, special={}, unclassified={}",
            taxonomy.pgu.len(),
            taxonomy.quantum.len(),
            taxonomy.special.len(),
            taxonomy.unclassified
        );

        taxonomy
    }

    /// Tiers of one family, ascending by `sort_order`.
    #[must_use]
    pub fn family(&self, family: TierFamily) -> &[DifficultyTier] {
        match family {
            TierFamily::Pgu => &self.pgu,
            TierFamily::Quantum => &self.quantum,
            TierFamily::Special => &self.special,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pgu.is_empty() && self.quantum.is_empty() && self.special.is_empty()
    }

    pub fn by_name(&self, name: &str) -> Option<&DifficultyTier> {
        self.pgu
            .iter()
            .chain(&self.quantum)
            .chain(&self.special)
            .find(|t| t.name == name)
    }

    #[must_use]
    pub fn contains(&self, family: TierFamily, name: &str) -> bool {
        self.family(family).iter().any(|t| t.name == name)
    }

    /// Picker group for a Quantum or Special tier; `None` for PGU and unknown names.
    #[must_use]
    pub fn special_group(&self, name: &str) -> Option<SpecialGroup> {
        if self.contains(TierFamily::Quantum, name) {
            return Some(SpecialGroup::Quantum);
        }
        if !self.contains(TierFamily::Special, name) {
            return None;
        }
        if HIDDEN_SPECIAL_NAMES.contains(&name) {
            Some(SpecialGroup::Hidden)
        } else {
            Some(SpecialGroup::Extra)
        }
    }

    /// Quantum and special tiers grouped for display, groups in picker order.
    #[must_use]
    pub fn grouped_specials(&self) -> Vec<(SpecialGroup, Vec<&DifficultyTier>)> {
        let mut groups: Vec<(SpecialGroup, Vec<&DifficultyTier>)> = Vec::new();
        for tier in self.quantum.iter().chain(&self.special) {
            let Some(group) = self.special_group(&tier.name) else {
                continue;
            };
            match groups.iter_mut().find(|(g, _)| *g == group) {
                Some((_, members)) => members.push(tier),
                None => groups.push((group, vec![tier])),
            }
        }
        groups.sort_by_key(|(group, _)| *group);
        groups
    }
}
