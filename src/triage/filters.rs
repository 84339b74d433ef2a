//! Hard eligibility filters.
//!
//! Every filter is an independent predicate over (scheme, applicant). All of
//! them run for every scheme so the notes stay complete even once a scheme is
//! already excluded; the exclusion reason is the note of the last failing
//! filter in pipeline order.

use serde::{Deserialize, Serialize};

use crate::catalog::GrantScheme;
use crate::profile::{ApplicantProfile, RegistrationStatus};
use crate::triage::{format_eur, FilterName, FilterOutcome};

pub const NOT_REGISTERED_NOTE: &str = "This scheme requires a registered or in-formation business";
pub const IN_PROGRESS_NOTE: &str = "This scheme requires a fully registered business";
pub const SUB_ACTIVITY_NOTE: &str = "Your specific sub-activity is not supported by this scheme";
pub const STATE_AID_NOTE: &str =
    "Excluded: You have received > €300,000 in state aid (De Minimis limit exceeded)";
pub const INDUSTRY_NOTE: &str = "Industry sector (NACE code) not eligible for this scheme";
pub const MICRO_ONLY_NOTE: &str =
    "This scheme is only available for micro enterprises (≤ 10 employees)";
pub const SME_ONLY_NOTE: &str =
    "This scheme is only available for SMEs (Micro, Small, Medium enterprises)";
pub const STARTUP_NOTE: &str =
    "This scheme is only available for startups (businesses less than 5 years old)";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterReport {
    pub outcomes: Vec<FilterOutcome>,
}

impl FilterReport {
    pub fn eligible(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn notes(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| o.note.clone())
            .collect()
    }

    /// Note of the last failing filter in pipeline order.
    pub fn exclusion_reason(&self) -> Option<&str> {
        self.outcomes
            .iter()
            .rev()
            .find(|o| !o.passed)
            .and_then(|o| o.note.as_deref())
    }
}

pub fn evaluate_filters(scheme: &GrantScheme, profile: &ApplicantProfile) -> FilterReport {
    let outcomes = FilterName::PIPELINE
        .iter()
        .map(|filter| run_filter(*filter, scheme, profile))
        .collect();
    FilterReport { outcomes }
}

pub fn run_filter(
    filter: FilterName,
    scheme: &GrantScheme,
    profile: &ApplicantProfile,
) -> FilterOutcome {
    match filter {
        FilterName::RegistrationStatus => check_registration_status(scheme, profile),
        FilterName::SubActivity => check_sub_activity(scheme, profile),
        FilterName::LegalStructure => check_legal_structure(scheme, profile),
        FilterName::StateAidCeiling => check_state_aid_ceiling(scheme, profile),
        FilterName::MinimumInvestment => check_minimum_investment(scheme, profile),
        FilterName::SpecialThreshold => check_special_thresholds(scheme, profile),
        FilterName::Industry => check_industry(scheme, profile),
        FilterName::BusinessSize => check_business_size(scheme, profile),
        FilterName::StartupRequirement => check_startup_requirement(scheme, profile),
        // Applied by the funding stage once the grant amount is known.
        FilterName::MinimumGrant => FilterOutcome::pass(filter),
    }
}

pub fn check_registration_status(
    scheme: &GrantScheme,
    profile: &ApplicantProfile,
) -> FilterOutcome {
    let filter = FilterName::RegistrationStatus;
    let allowed = &scheme.allowed_registration_statuses;
    match profile.registration_status {
        RegistrationStatus::Registered => FilterOutcome::pass(filter),
        RegistrationStatus::NotRegistered => {
            if allowed.contains(&RegistrationStatus::NotRegistered) {
                FilterOutcome::pass(filter)
            } else {
                FilterOutcome::fail(filter, NOT_REGISTERED_NOTE)
            }
        }
        RegistrationStatus::InProgress => {
            if allowed.is_empty()
                || allowed.contains(&RegistrationStatus::InProgress)
                || allowed.contains(&RegistrationStatus::Registered)
            {
                FilterOutcome::pass(filter)
            } else {
                FilterOutcome::fail(filter, IN_PROGRESS_NOTE)
            }
        }
    }
}

pub fn check_sub_activity(scheme: &GrantScheme, profile: &ApplicantProfile) -> FilterOutcome {
    let filter = FilterName::SubActivity;
    let Some(sub_activity) = profile.sub_activity.as_deref() else {
        return FilterOutcome::pass(filter);
    };
    if scheme.supported_sub_activities.is_empty()
        || scheme
            .supported_sub_activities
            .iter()
            .any(|s| s == sub_activity)
    {
        FilterOutcome::pass(filter)
    } else {
        FilterOutcome::fail(filter, SUB_ACTIVITY_NOTE)
    }
}

pub fn check_legal_structure(scheme: &GrantScheme, profile: &ApplicantProfile) -> FilterOutcome {
    let filter = FilterName::LegalStructure;
    let allowed = &scheme.allowed_legal_structures;
    if allowed.is_empty() || allowed.contains(&profile.legal_structure) {
        return FilterOutcome::pass(filter);
    }
    let required = allowed
        .iter()
        .map(|s| s.short_label())
        .collect::<Vec<_>>()
        .join(", ");
    FilterOutcome::fail(
        filter,
        format!(
            "This scheme is not available for {} — requires: {required}",
            profile.legal_structure.label()
        ),
    )
}

pub fn check_state_aid_ceiling(scheme: &GrantScheme, profile: &ApplicantProfile) -> FilterOutcome {
    let filter = FilterName::StateAidCeiling;
    if profile.has_exceeded_de_minimis && scheme.is_ceiling_capped() {
        FilterOutcome::fail(filter, STATE_AID_NOTE)
    } else {
        FilterOutcome::pass(filter)
    }
}

pub fn check_minimum_investment(scheme: &GrantScheme, profile: &ApplicantProfile) -> FilterOutcome {
    let filter = FilterName::MinimumInvestment;
    let minimum = scheme.funding.min_investment_required.unwrap_or(0.0);
    if profile.total_project_cost() < minimum {
        FilterOutcome::fail(
            filter,
            format!("Minimum investment required: {}", format_eur(minimum)),
        )
    } else {
        FilterOutcome::pass(filter)
    }
}

/// Catalog-authored project-cost floors. The all-sizes floor is checked
/// before the size-specific one; the first violated floor is reported.
pub fn check_special_thresholds(
    scheme: &GrantScheme,
    profile: &ApplicantProfile,
) -> FilterOutcome {
    let filter = FilterName::SpecialThreshold;
    let Some(thresholds) = scheme.special_thresholds.as_ref() else {
        return FilterOutcome::pass(filter);
    };
    let total = profile.total_project_cost();

    if let Some(floor) = thresholds.min_project_cost {
        if !floor.admits(total) {
            return FilterOutcome::fail(
                filter,
                format!(
                    "{} requires a minimum project value of {}",
                    thresholds.label,
                    format_eur(floor.amount)
                ),
            );
        }
    }

    let (floor, audience) = if profile.is_sme() {
        (thresholds.sme_min_project_cost, "SMEs")
    } else {
        (thresholds.large_min_project_cost, "large enterprises")
    };
    match floor {
        Some(floor) if !floor.admits(total) => FilterOutcome::fail(
            filter,
            format!(
                "{} requires a minimum project cost of {} for {audience}",
                thresholds.size_label(),
                format_eur(floor.amount)
            ),
        ),
        _ => FilterOutcome::pass(filter),
    }
}

pub fn check_industry(scheme: &GrantScheme, profile: &ApplicantProfile) -> FilterOutcome {
    let filter = FilterName::Industry;
    if scheme.eligible_nace_codes.is_empty() {
        return FilterOutcome::pass(filter);
    }
    let matches = profile
        .nace_code
        .as_deref()
        .is_some_and(|code| scheme.eligible_nace_codes.iter().any(|allowed| allowed == code));
    if matches {
        FilterOutcome::pass(filter)
    } else {
        FilterOutcome::fail(filter, INDUSTRY_NOTE)
    }
}

pub fn check_business_size(scheme: &GrantScheme, profile: &ApplicantProfile) -> FilterOutcome {
    let filter = FilterName::BusinessSize;
    if scheme.micro_only && !profile.size.is_micro() {
        return FilterOutcome::fail(filter, MICRO_ONLY_NOTE);
    }
    if scheme.sme_only && !profile.size.is_sme() {
        return FilterOutcome::fail(filter, SME_ONLY_NOTE);
    }
    FilterOutcome::pass(filter)
}

/// Only schemes that set `startup_required` exclude established businesses.
pub fn check_startup_requirement(
    scheme: &GrantScheme,
    profile: &ApplicantProfile,
) -> FilterOutcome {
    let filter = FilterName::StartupRequirement;
    if scheme.startup_required && !profile.is_startup() {
        FilterOutcome::fail(filter, STARTUP_NOTE)
    } else {
        FilterOutcome::pass(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AidFramework, CostFloor, FundingBounds, SpecialThresholds};
    use crate::profile::{
        BusinessAge, BusinessSize, CostBreakdown, CostLineKey, LegalStructure,
    };

    fn profile_with_total(total: f64) -> ApplicantProfile {
        ApplicantProfile {
            costs: CostBreakdown::from_lines([(CostLineKey::EquipmentMachinery, total)]),
            ..ApplicantProfile::sample()
        }
    }

    fn invest_scheme() -> GrantScheme {
        let mut thresholds = SpecialThresholds::new("Invest 2024");
        thresholds.sme_min_project_cost = Some(CostFloor::exclusive(50_000.0));
        thresholds.large_min_project_cost = Some(CostFloor::exclusive(500_000.0));
        let mut scheme = GrantScheme::new("invest-2024", "Invest 2024");
        scheme.special_thresholds = Some(thresholds);
        scheme
    }

    #[test]
    fn unrestricted_scheme_passes_every_filter() {
        let scheme = GrantScheme::new("open", "Open Scheme");
        let mut profile = ApplicantProfile::sample();
        for status in [
            RegistrationStatus::Registered,
            RegistrationStatus::InProgress,
        ] {
            for structure in [
                LegalStructure::SelfEmployed,
                LegalStructure::Partnership,
                LegalStructure::LimitedCompany,
            ] {
                profile.registration_status = status;
                profile.legal_structure = structure;
                profile.nace_code = None;
                let report = evaluate_filters(&scheme, &profile);
                assert!(report.eligible());
                assert!(report.notes().is_empty());
                assert!(report.exclusion_reason().is_none());
            }
        }
    }

    #[test]
    fn not_registered_needs_explicit_allowance() {
        let mut profile = ApplicantProfile::sample();
        profile.registration_status = RegistrationStatus::NotRegistered;

        let mut scheme = GrantScheme::new("s", "S");
        let outcome = check_registration_status(&scheme, &profile);
        assert_eq!(outcome.note.as_deref(), Some(NOT_REGISTERED_NOTE));

        scheme.allowed_registration_statuses = vec![RegistrationStatus::NotRegistered];
        assert!(check_registration_status(&scheme, &profile).passed);
    }

    #[test]
    fn in_progress_passes_when_registered_is_allowed() {
        let mut profile = ApplicantProfile::sample();
        profile.registration_status = RegistrationStatus::InProgress;

        let mut scheme = GrantScheme::new("s", "S");
        scheme.allowed_registration_statuses = vec![RegistrationStatus::Registered];
        assert!(check_registration_status(&scheme, &profile).passed);

        scheme.allowed_registration_statuses = vec![RegistrationStatus::NotRegistered];
        let outcome = check_registration_status(&scheme, &profile);
        assert_eq!(outcome.note.as_deref(), Some(IN_PROGRESS_NOTE));
    }

    #[test]
    fn sub_activity_only_checked_when_declared() {
        let mut scheme = GrantScheme::new("s", "S");
        scheme.supported_sub_activities = vec!["Software development".to_string()];
        let mut profile = ApplicantProfile::sample();
        assert!(check_sub_activity(&scheme, &profile).passed);

        profile.sub_activity = Some("Industrial packaging".to_string());
        assert!(!check_sub_activity(&scheme, &profile).passed);

        profile.sub_activity = None;
        assert!(check_sub_activity(&scheme, &profile).passed);
    }

    #[test]
    fn legal_structure_note_names_requirements() {
        let mut scheme = GrantScheme::new("s", "S");
        scheme.allowed_legal_structures =
            vec![LegalStructure::LimitedCompany, LegalStructure::Partnership];
        let mut profile = ApplicantProfile::sample();
        profile.legal_structure = LegalStructure::SelfEmployed;
        let outcome = check_legal_structure(&scheme, &profile);
        assert_eq!(
            outcome.note.as_deref(),
            Some(
                "This scheme is not available for Self-Employed (Sole Trader) — requires: Ltd, Partnership"
            )
        );
    }

    #[test]
    fn state_aid_ceiling_only_hits_capped_framework() {
        let mut profile = ApplicantProfile::sample();
        profile.has_exceeded_de_minimis = true;
        let mut scheme = GrantScheme::new("s", "S");
        scheme.aid_framework = Some(AidFramework::Gber);
        assert!(check_state_aid_ceiling(&scheme, &profile).passed);
        scheme.aid_framework = Some(AidFramework::DeMinimis);
        assert!(!check_state_aid_ceiling(&scheme, &profile).passed);
        profile.has_exceeded_de_minimis = false;
        assert!(check_state_aid_ceiling(&scheme, &profile).passed);
    }

    #[test]
    fn minimum_investment_is_inclusive() {
        let scheme = GrantScheme::new("s", "S").with_funding(FundingBounds {
            min_investment_required: Some(20_000.0),
            ..FundingBounds::default()
        });
        assert!(check_minimum_investment(&scheme, &profile_with_total(20_000.0)).passed);
        let outcome = check_minimum_investment(&scheme, &profile_with_total(19_999.0));
        assert_eq!(
            outcome.note.as_deref(),
            Some("Minimum investment required: €20,000")
        );
    }

    #[test]
    fn invest_threshold_for_sme_applicants() {
        let scheme = invest_scheme();
        assert!(check_special_thresholds(&scheme, &profile_with_total(60_000.0)).passed);

        let outcome = check_special_thresholds(&scheme, &profile_with_total(40_000.0));
        assert_eq!(
            outcome.note.as_deref(),
            Some("Invest 2024 requires a minimum project cost of €50,000 for SMEs")
        );
        assert!(!check_special_thresholds(&scheme, &profile_with_total(50_000.0)).passed);
    }

    #[test]
    fn combined_thresholds_check_both_floors() {
        let mut scheme = GrantScheme::new("both", "Both");
        scheme.special_thresholds =
            crate::catalog::legacy::infer_special_thresholds(Some("sme-enhance-invest"), "Both");
        let outcome = check_special_thresholds(&scheme, &profile_with_total(5_000.0));
        assert_eq!(
            outcome.note.as_deref(),
            Some("SME Enhance requires a minimum project value of €10,000")
        );
        let outcome = check_special_thresholds(&scheme, &profile_with_total(30_000.0));
        assert_eq!(
            outcome.note.as_deref(),
            Some("Invest 2024 requires a minimum project cost of €50,000 for SMEs")
        );
        assert!(check_special_thresholds(&scheme, &profile_with_total(60_000.0)).passed);
    }

    #[test]
    fn invest_threshold_for_large_applicants() {
        let scheme = invest_scheme();
        let mut profile = profile_with_total(400_000.0);
        profile.size = BusinessSize::Large;
        let outcome = check_special_thresholds(&scheme, &profile);
        assert_eq!(
            outcome.note.as_deref(),
            Some("Invest 2024 requires a minimum project cost of €500,000 for large enterprises")
        );
    }

    #[test]
    fn all_sizes_floor_reported_first() {
        let mut thresholds = SpecialThresholds::new("SME Enhance");
        thresholds.min_project_cost = Some(CostFloor::inclusive(10_000.0));
        thresholds.sme_min_project_cost = Some(CostFloor::inclusive(20_000.0));
        let mut scheme = GrantScheme::new("sme-enhance", "SME Enhance");
        scheme.special_thresholds = Some(thresholds);

        let outcome = check_special_thresholds(&scheme, &profile_with_total(5_000.0));
        assert_eq!(
            outcome.note.as_deref(),
            Some("SME Enhance requires a minimum project value of €10,000")
        );
        assert!(check_special_thresholds(&scheme, &profile_with_total(10_000.0))
            .note
            .unwrap()
            .contains("for SMEs"));
    }

    #[test]
    fn missing_nace_fails_only_restricted_schemes() {
        let mut scheme = GrantScheme::new("s", "S");
        let mut profile = ApplicantProfile::sample();
        profile.nace_code = None;
        assert!(check_industry(&scheme, &profile).passed);

        scheme.eligible_nace_codes = vec!["CA".to_string(), "JC".to_string()];
        assert_eq!(
            check_industry(&scheme, &profile).note.as_deref(),
            Some(INDUSTRY_NOTE)
        );
        profile.nace_code = Some("JC".to_string());
        assert!(check_industry(&scheme, &profile).passed);
    }

    #[test]
    fn nace_membership_is_exact() {
        let mut scheme = GrantScheme::new("s", "S");
        scheme.eligible_nace_codes = vec!["JC".to_string()];
        let mut profile = ApplicantProfile::sample();
        profile.nace_code = Some("jc".to_string());
        assert!(!check_industry(&scheme, &profile).passed);
        profile.nace_code = Some("J".to_string());
        assert!(!check_industry(&scheme, &profile).passed);
    }

    #[test]
    fn size_flags_combine_with_and_semantics() {
        let mut scheme = GrantScheme::new("s", "S");
        scheme.micro_only = true;
        scheme.sme_only = true;
        let mut profile = ApplicantProfile::sample();

        profile.size = BusinessSize::Micro;
        assert!(check_business_size(&scheme, &profile).passed);
        profile.size = BusinessSize::Small;
        assert_eq!(
            check_business_size(&scheme, &profile).note.as_deref(),
            Some(MICRO_ONLY_NOTE)
        );

        scheme.micro_only = false;
        assert!(check_business_size(&scheme, &profile).passed);
        profile.size = BusinessSize::Large;
        assert_eq!(
            check_business_size(&scheme, &profile).note.as_deref(),
            Some(SME_ONLY_NOTE)
        );
    }

    #[test]
    fn established_business_only_excluded_by_startup_flag() {
        let mut scheme = GrantScheme::new("s", "S");
        let mut profile = ApplicantProfile::sample();
        profile.age = BusinessAge::Established;
        assert!(check_startup_requirement(&scheme, &profile).passed);
        scheme.startup_required = true;
        assert!(!check_startup_requirement(&scheme, &profile).passed);
        profile.age = BusinessAge::Startup;
        assert!(check_startup_requirement(&scheme, &profile).passed);
    }

    #[test]
    fn all_filters_run_and_last_failure_wins() {
        let mut scheme = GrantScheme::new("s", "S");
        scheme.aid_framework = Some(AidFramework::DeMinimis);
        scheme.startup_required = true;
        let mut profile = ApplicantProfile::sample();
        profile.has_exceeded_de_minimis = true;

        let report = evaluate_filters(&scheme, &profile);
        assert_eq!(report.outcomes.len(), FilterName::PIPELINE.len());
        assert!(!report.eligible());
        assert_eq!(report.notes(), vec![STATE_AID_NOTE, STARTUP_NOTE]);
        assert_eq!(report.exclusion_reason(), Some(STARTUP_NOTE));
    }

    #[test]
    fn toggling_one_filter_changes_only_its_outcome() {
        let mut scheme = GrantScheme::new("s", "S");
        scheme.eligible_nace_codes = vec!["CA".to_string()];
        let profile = ApplicantProfile::sample();

        let restricted = evaluate_filters(&scheme, &profile);
        scheme.eligible_nace_codes.clear();
        let open = evaluate_filters(&scheme, &profile);

        for (a, b) in restricted.outcomes.iter().zip(&open.outcomes) {
            if a.filter == FilterName::Industry {
                assert_ne!(a, b);
            } else {
                assert_eq!(a, b);
            }
        }
    }
}
