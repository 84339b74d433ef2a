use serde::{Deserialize, Serialize};

use crate::catalog::EligibleCostsMap;
use crate::profile::{CostBreakdown, CostLineKey};

/// Why an apportionment produced what it did. A missing map and an empty map
/// both yield nothing, but they are different catalog states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApportionBasis {
    NoCostMap,
    EmptyCostMap,
    Mapped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApportionedCosts {
    pub basis: ApportionBasis,
    pub total: f64,
    pub matched: Vec<CostLineKey>,
}

impl ApportionedCosts {
    fn nothing(basis: ApportionBasis) -> Self {
        Self {
            basis,
            total: 0.0,
            matched: Vec::new(),
        }
    }

    pub fn matched_labels(&self) -> Vec<String> {
        self.matched
            .iter()
            .map(|key| key.label().to_string())
            .collect()
    }

    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }
}

/// Sums the cost lines a scheme funds. Only strictly positive amounts count
/// and contribute a label, in category-then-field order.
pub fn apportion(costs: &CostBreakdown, eligible: Option<&EligibleCostsMap>) -> ApportionedCosts {
    let Some(map) = eligible else {
        return ApportionedCosts::nothing(ApportionBasis::NoCostMap);
    };
    if map.is_empty() {
        return ApportionedCosts::nothing(ApportionBasis::EmptyCostMap);
    }

    let mut apportioned = ApportionedCosts::nothing(ApportionBasis::Mapped);
    for (key, item) in costs.lines() {
        let amount = item.contribution();
        if amount > 0.0 && map.is_eligible(key) {
            apportioned.total += amount;
            apportioned.matched.push(key);
        }
    }
    apportioned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs() -> CostBreakdown {
        CostBreakdown::from_lines([
            (CostLineKey::WagesCost, 30_000.0),
            (CostLineKey::EquipmentMachinery, 25_000.0),
            (CostLineKey::DigitalHardwareSoftware, 18_000.0),
            (CostLineKey::DigitalTools, 0.0),
            (CostLineKey::Vehicles, -4_000.0),
        ])
    }

    #[test]
    fn missing_and_empty_maps_apportion_nothing() {
        let missing = apportion(&costs(), None);
        assert_eq!(missing.basis, ApportionBasis::NoCostMap);
        assert_eq!(missing.total, 0.0);
        assert!(missing.matched.is_empty());

        let empty = apportion(&costs(), Some(&EligibleCostsMap::default()));
        assert_eq!(empty.basis, ApportionBasis::EmptyCostMap);
        assert_eq!(empty.total, 0.0);
        assert!(empty.matched.is_empty());
    }

    #[test]
    fn sums_only_eligible_positive_lines() {
        let map = EligibleCostsMap::from_keys([
            CostLineKey::EquipmentMachinery,
            CostLineKey::DigitalTools,
            CostLineKey::Vehicles,
            CostLineKey::WagesCost,
        ]);
        let apportioned = apportion(&costs(), Some(&map));
        assert_eq!(apportioned.basis, ApportionBasis::Mapped);
        assert_eq!(apportioned.total, 55_000.0);
        assert_eq!(
            apportioned.matched,
            vec![CostLineKey::EquipmentMachinery, CostLineKey::WagesCost]
        );
        assert_eq!(apportioned.matched_labels().len(), 2);
    }

    #[test]
    fn false_entries_are_not_eligible() {
        let mut map = EligibleCostsMap::from_keys([CostLineKey::WagesCost]);
        map.0.insert(CostLineKey::EquipmentMachinery, false);
        let apportioned = apportion(&costs(), Some(&map));
        assert_eq!(apportioned.total, 30_000.0);
        assert_eq!(apportioned.matched, vec![CostLineKey::WagesCost]);
    }

    #[test]
    fn raising_an_eligible_line_never_lowers_the_total() {
        let map = EligibleCostsMap::from_keys([CostLineKey::EquipmentMachinery]);
        let mut breakdown = costs();
        let before = apportion(&breakdown, Some(&map)).total;
        breakdown.set(
            CostLineKey::EquipmentMachinery,
            crate::profile::CostItem::new(40_000.0),
        );
        let after = apportion(&breakdown, Some(&map)).total;
        assert!(after >= before);
        assert_eq!(after, 40_000.0);
    }
}
