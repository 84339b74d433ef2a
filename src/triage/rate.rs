use serde::{Deserialize, Serialize};

use crate::catalog::GrantScheme;
use crate::profile::{ApplicantProfile, PrimaryActivity};
use crate::triage::format_eur;

/// Which rate-table entry produced the aid intensity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Hospitality,
    Startup,
    SmeBonusRegion,
    Sme,
    LargeEntityBonusRegion,
    LargeEntity,
    Standard,
    Unconfigured,
}

/// Aid intensity for this applicant under this scheme, clamped to [0, 1].
pub fn resolve_rate(scheme: &GrantScheme, profile: &ApplicantProfile) -> f64 {
    resolve_rate_with_source(scheme, profile).0
}

pub fn resolve_rate_with_source(
    scheme: &GrantScheme,
    profile: &ApplicantProfile,
) -> (f64, RateSource) {
    let (rate, source) = lookup(scheme, profile);
    let rate = if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (rate, source)
}

fn lookup(scheme: &GrantScheme, profile: &ApplicantProfile) -> (f64, RateSource) {
    let rates = &scheme.rates;

    if profile.primary_activity == Some(PrimaryActivity::Hospitality) {
        if let Some(rate) = configured(rates.hospitality) {
            return (rate, RateSource::Hospitality);
        }
    }
    if profile.is_startup() {
        if let Some(rate) = configured(rates.startup) {
            return (rate, RateSource::Startup);
        }
    }

    let bonus_region = profile.location.is_bonus_region();
    let (bonus, bonus_source, plain, plain_source) = if profile.is_sme() {
        (
            rates.sme_gozo,
            RateSource::SmeBonusRegion,
            rates.sme,
            RateSource::Sme,
        )
    } else {
        (
            rates.large_entity_gozo,
            RateSource::LargeEntityBonusRegion,
            rates.large_entity,
            RateSource::LargeEntity,
        )
    };

    if bonus_region {
        if let Some(rate) = configured(bonus) {
            return (rate, bonus_source);
        }
    }
    match (plain, rates.standard) {
        (Some(rate), _) => (rate, plain_source),
        (None, Some(rate)) => (rate, RateSource::Standard),
        (None, None) => (0.0, RateSource::Unconfigured),
    }
}

/// Special-case rates only count when present and strictly positive.
fn configured(rate: Option<f64>) -> Option<f64> {
    rate.filter(|r| *r > 0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CappedGrant {
    pub amount: f64,
    pub capped: bool,
    pub note: Option<String>,
}

/// Clamps a potential grant to the scheme ceiling. Absent or non-positive
/// ceilings leave the amount untouched.
pub fn apply_cap(potential: f64, max_grant_amount: Option<f64>) -> CappedGrant {
    match max_grant_amount {
        Some(max) if max > 0.0 && potential > max => CappedGrant {
            amount: max,
            capped: true,
            note: Some(format!("Grant capped at maximum of {}", format_eur(max))),
        },
        _ => CappedGrant {
            amount: potential,
            capped: false,
            note: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RateTable;
    use crate::profile::{BusinessAge, BusinessSize, ProjectLocation};

    fn scheme(rates: RateTable) -> GrantScheme {
        GrantScheme::new("s", "S").with_rates(rates)
    }

    #[test]
    fn bonus_region_sme_rate_wins_over_plain_sme_rate() {
        let scheme = scheme(RateTable {
            sme: Some(0.5),
            sme_gozo: Some(0.65),
            ..RateTable::default()
        });
        let mut profile = ApplicantProfile::sample();
        profile.location = ProjectLocation::Gozo;
        assert_eq!(
            resolve_rate_with_source(&scheme, &profile),
            (0.65, RateSource::SmeBonusRegion)
        );
        profile.location = ProjectLocation::Malta;
        assert_eq!(resolve_rate(&scheme, &profile), 0.5);
    }

    #[test]
    fn startup_rate_beats_size_and_location() {
        let scheme = scheme(RateTable {
            startup: Some(0.6),
            sme: Some(0.5),
            sme_gozo: Some(0.7),
            ..RateTable::default()
        });
        let mut profile = ApplicantProfile::sample();
        profile.age = BusinessAge::Startup;
        profile.location = ProjectLocation::Gozo;
        assert_eq!(
            resolve_rate_with_source(&scheme, &profile),
            (0.6, RateSource::Startup)
        );
    }

    #[test]
    fn hospitality_rate_beats_startup_rate() {
        let scheme = scheme(RateTable {
            hospitality: Some(0.25),
            startup: Some(0.6),
            standard: Some(0.2),
            ..RateTable::default()
        });
        let mut profile = ApplicantProfile::sample();
        profile.age = BusinessAge::Startup;
        profile.primary_activity = Some(PrimaryActivity::Hospitality);
        assert_eq!(resolve_rate(&scheme, &profile), 0.25);
    }

    #[test]
    fn zero_special_rates_fall_through() {
        let scheme = scheme(RateTable {
            startup: Some(0.0),
            sme_gozo: Some(0.0),
            standard: Some(0.3),
            ..RateTable::default()
        });
        let mut profile = ApplicantProfile::sample();
        profile.age = BusinessAge::Startup;
        profile.location = ProjectLocation::Gozo;
        assert_eq!(
            resolve_rate_with_source(&scheme, &profile),
            (0.3, RateSource::Standard)
        );
    }

    #[test]
    fn configured_zero_plain_rate_is_used() {
        let scheme = scheme(RateTable {
            large_entity: Some(0.0),
            standard: Some(0.3),
            ..RateTable::default()
        });
        let mut profile = ApplicantProfile::sample();
        profile.size = BusinessSize::Large;
        assert_eq!(
            resolve_rate_with_source(&scheme, &profile),
            (0.0, RateSource::LargeEntity)
        );
    }

    #[test]
    fn empty_rate_table_resolves_to_zero() {
        let scheme = scheme(RateTable::default());
        assert_eq!(
            resolve_rate_with_source(&scheme, &ApplicantProfile::sample()),
            (0.0, RateSource::Unconfigured)
        );
    }

    #[test]
    fn out_of_range_rates_are_clamped() {
        let scheme = scheme(RateTable {
            standard: Some(1.4),
            ..RateTable::default()
        });
        assert_eq!(resolve_rate(&scheme, &ApplicantProfile::sample()), 1.0);
    }

    #[test]
    fn cap_clamps_and_notes() {
        let capped = apply_cap(10_000.0, Some(8_000.0));
        assert_eq!(capped.amount, 8_000.0);
        assert!(capped.capped);
        assert_eq!(
            capped.note.as_deref(),
            Some("Grant capped at maximum of €8,000")
        );

        let untouched = apply_cap(8_000.0, Some(8_000.0));
        assert!(!untouched.capped);
        assert_eq!(apply_cap(5_000.0, None).amount, 5_000.0);
        assert_eq!(apply_cap(5_000.0, Some(0.0)).amount, 5_000.0);
    }
}
