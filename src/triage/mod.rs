pub mod apportion;
pub mod evaluator;
pub mod filters;
pub mod funding;
pub mod ranking;
pub mod rate;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub use apportion::{apportion, ApportionBasis, ApportionedCosts};
pub use evaluator::evaluate_scheme;
pub use filters::{evaluate_filters, FilterReport};
pub use ranking::{best_eligible, find_all_matching_grants, find_best_grant, match_score};
pub use rate::{apply_cap, resolve_rate, CappedGrant};

/// Every check that can exclude a scheme, in pipeline order. The first nine
/// are the hard filters; `MinimumGrant` runs once funding has been computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FilterName {
    RegistrationStatus,
    SubActivity,
    LegalStructure,
    StateAidCeiling,
    MinimumInvestment,
    SpecialThreshold,
    Industry,
    BusinessSize,
    StartupRequirement,
    MinimumGrant,
}

impl FilterName {
    pub const PIPELINE: [FilterName; 9] = [
        FilterName::RegistrationStatus,
        FilterName::SubActivity,
        FilterName::LegalStructure,
        FilterName::StateAidCeiling,
        FilterName::MinimumInvestment,
        FilterName::SpecialThreshold,
        FilterName::Industry,
        FilterName::BusinessSize,
        FilterName::StartupRequirement,
    ];
}

impl Display for FilterName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::RegistrationStatus => "registration_status",
            Self::SubActivity => "sub_activity",
            Self::LegalStructure => "legal_structure",
            Self::StateAidCeiling => "state_aid_ceiling",
            Self::MinimumInvestment => "minimum_investment",
            Self::SpecialThreshold => "special_threshold",
            Self::Industry => "industry",
            Self::BusinessSize => "business_size",
            Self::StartupRequirement => "startup_requirement",
            Self::MinimumGrant => "minimum_grant",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterOutcome {
    pub filter: FilterName,
    pub passed: bool,
    pub note: Option<String>,
}

impl FilterOutcome {
    pub fn pass(filter: FilterName) -> Self {
        Self {
            filter,
            passed: true,
            note: None,
        }
    }

    pub fn fail(filter: FilterName, note: impl Into<String>) -> Self {
        Self {
            filter,
            passed: false,
            note: Some(note.into()),
        }
    }
}

/// Verdict for one (scheme, applicant) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriageResult {
    pub scheme_id: String,
    pub scheme_name: String,
    pub scheme_code: Option<String>,
    pub eligible: bool,
    pub match_score: u8,
    pub total_eligible_costs: f64,
    pub aid_intensity: f64,
    pub estimated_grant: f64,
    pub matched_cost_categories: Vec<String>,
    pub notes: Vec<String>,
    pub exclusion_reason: Option<String>,
    pub checks: Vec<FilterOutcome>,
}

impl TriageResult {
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_filters(&self) -> Vec<FilterName> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.filter)
            .collect()
    }
}

/// Renders a euro amount the way exclusion notes quote it: thousands
/// separators, and cents only when the amount is not whole.
pub fn format_eur(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match cents % 100 {
        0 => format!("€{sign}{grouped}"),
        fraction => format!("€{sign}{grouped}.{fraction:02}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_euro_amounts() {
        assert_eq!(format_eur(0.0), "€0");
        assert_eq!(format_eur(950.0), "€950");
        assert_eq!(format_eur(50_000.0), "€50,000");
        assert_eq!(format_eur(1_234_567.0), "€1,234,567");
        assert_eq!(format_eur(9_999.5), "€9,999.50");
    }

    #[test]
    fn pipeline_order_matches_enum_order() {
        let mut sorted = FilterName::PIPELINE;
        sorted.sort();
        assert_eq!(sorted, FilterName::PIPELINE);
        assert!(FilterName::StartupRequirement < FilterName::MinimumGrant);
    }
}
