//! Funding estimate for one scheme and the minimum grant gate that can
//! still exclude a scheme after the hard filters passed.

use crate::catalog::GrantScheme;
use crate::profile::ApplicantProfile;
use crate::triage::apportion::{apportion, ApportionedCosts};
use crate::triage::rate::{apply_cap, resolve_rate_with_source, CappedGrant, RateSource};
use crate::triage::{format_eur, FilterName, FilterOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct FundingEstimate {
    pub apportioned: ApportionedCosts,
    pub aid_intensity: f64,
    pub rate_source: RateSource,
    pub potential_grant: f64,
    pub grant: CappedGrant,
}

impl FundingEstimate {
    pub fn estimated_grant(&self) -> f64 {
        self.grant.amount
    }
}

pub fn estimate_funding(scheme: &GrantScheme, profile: &ApplicantProfile) -> FundingEstimate {
    let apportioned = apportion(&profile.costs, scheme.eligible_costs.as_ref());
    let (aid_intensity, rate_source) = resolve_rate_with_source(scheme, profile);
    let potential_grant = apportioned.total * aid_intensity;
    let grant = apply_cap(potential_grant, scheme.funding.max_grant_amount);
    FundingEstimate {
        apportioned,
        aid_intensity,
        rate_source,
        potential_grant,
        grant,
    }
}

/// The special minimum grant is checked before the scheme's own minimum.
pub fn check_minimum_grant(scheme: &GrantScheme, grant: f64) -> FilterOutcome {
    let filter = FilterName::MinimumGrant;

    if let Some(thresholds) = scheme.special_thresholds.as_ref() {
        if let Some(minimum) = thresholds.min_grant_amount.filter(|m| *m > 0.0) {
            if grant < minimum {
                return FilterOutcome::fail(
                    filter,
                    format!(
                        "{} requires a minimum grant amount of {}",
                        thresholds.label,
                        format_eur(minimum)
                    ),
                );
            }
        }
    }

    let minimum = scheme.funding.min_grant_amount.unwrap_or(0.0);
    if minimum > 0.0 && grant < minimum {
        return FilterOutcome::fail(
            filter,
            format!(
                "Calculated grant ({}) is below the minimum of {}",
                format_eur(grant),
                format_eur(minimum)
            ),
        );
    }
    FilterOutcome::pass(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FundingBounds, RateTable, SpecialThresholds};
    use crate::profile::{CostBreakdown, CostLineKey};

    fn scheme_with_cap(max: f64) -> GrantScheme {
        GrantScheme::new("s", "S")
            .with_rates(RateTable {
                standard: Some(0.5),
                ..RateTable::default()
            })
            .with_funding(FundingBounds {
                max_grant_amount: Some(max),
                ..FundingBounds::default()
            })
            .with_eligible_costs([CostLineKey::EquipmentMachinery])
    }

    fn profile_with_equipment(amount: f64) -> ApplicantProfile {
        ApplicantProfile {
            costs: CostBreakdown::from_lines([(CostLineKey::EquipmentMachinery, amount)]),
            ..ApplicantProfile::sample()
        }
    }

    #[test]
    fn cap_applies_to_potential_grant() {
        let estimate = estimate_funding(&scheme_with_cap(8_000.0), &profile_with_equipment(20_000.0));
        assert_eq!(estimate.apportioned.total, 20_000.0);
        assert_eq!(estimate.aid_intensity, 0.5);
        assert_eq!(estimate.potential_grant, 10_000.0);
        assert_eq!(estimate.estimated_grant(), 8_000.0);
        assert!(estimate.grant.capped);
    }

    #[test]
    fn capped_estimate_is_stable_under_larger_costs() {
        let scheme = scheme_with_cap(8_000.0);
        let first = estimate_funding(&scheme, &profile_with_equipment(20_000.0));
        let second = estimate_funding(&scheme, &profile_with_equipment(90_000.0));
        assert_eq!(first.grant, second.grant);
    }

    #[test]
    fn special_minimum_checked_before_scheme_minimum() {
        let mut thresholds = SpecialThresholds::new("SME Enhance");
        thresholds.min_grant_amount = Some(10_000.0);
        let mut scheme = GrantScheme::new("sme-enhance", "SME Enhance").with_funding(
            FundingBounds {
                min_grant_amount: Some(12_000.0),
                ..FundingBounds::default()
            },
        );
        scheme.special_thresholds = Some(thresholds);

        assert_eq!(
            check_minimum_grant(&scheme, 9_000.0).note.as_deref(),
            Some("SME Enhance requires a minimum grant amount of €10,000")
        );
        assert_eq!(
            check_minimum_grant(&scheme, 11_000.0).note.as_deref(),
            Some("Calculated grant (€11,000) is below the minimum of €12,000")
        );
        assert!(check_minimum_grant(&scheme, 12_000.0).passed);
    }

    #[test]
    fn zero_minimum_never_excludes() {
        let scheme = GrantScheme::new("s", "S").with_funding(FundingBounds {
            min_grant_amount: Some(0.0),
            ..FundingBounds::default()
        });
        assert!(check_minimum_grant(&scheme, 0.0).passed);
    }
}
