//! Migration of catalog records that predate structured special thresholds.
//!
//! Older records encoded the SME Enhance and Invest 2024 thresholds only
//! through their display name or code. Import translates those records into
//! [`SpecialThresholds`] once, so the triage engine never inspects names.
//! Import also trims and uppercases NACE codes, matching how applicant codes
//! are normalised, since the industry check compares them exactly.

use tracing::debug;

use crate::catalog::schema::{CostFloor, GrantScheme, SpecialThresholds};

const SME_ENHANCE_MIN_PROJECT_COST: f64 = 10_000.0;
const SME_ENHANCE_MIN_GRANT: f64 = 10_000.0;
const INVEST_SME_MIN_PROJECT_COST: f64 = 50_000.0;
const INVEST_LARGE_MIN_PROJECT_COST: f64 = 500_000.0;

/// A record matching both rules gets both sets of floors in one record; the
/// SME Enhance floor is checked first and keeps the primary label.
pub fn infer_special_thresholds(code: Option<&str>, name: &str) -> Option<SpecialThresholds> {
    let code = code.unwrap_or_default().to_ascii_lowercase();
    let name = name.to_ascii_lowercase();
    let sme_enhance = code.contains("sme-enhance") || name.contains("sme enhance");
    let invest = code.contains("invest") || name.contains("invest 2024");

    let mut thresholds = match (sme_enhance, invest) {
        (true, _) => SpecialThresholds::new("SME Enhance"),
        (false, true) => SpecialThresholds::new("Invest 2024"),
        (false, false) => return None,
    };
    if sme_enhance {
        thresholds.min_project_cost = Some(CostFloor::inclusive(SME_ENHANCE_MIN_PROJECT_COST));
        thresholds.min_grant_amount = Some(SME_ENHANCE_MIN_GRANT);
    }
    if invest {
        thresholds.sme_min_project_cost = Some(CostFloor::exclusive(INVEST_SME_MIN_PROJECT_COST));
        thresholds.large_min_project_cost =
            Some(CostFloor::exclusive(INVEST_LARGE_MIN_PROJECT_COST));
        if sme_enhance {
            thresholds.size_floor_label = Some("Invest 2024".to_string());
        }
    }
    Some(thresholds)
}

pub fn normalize_nace_codes(scheme: &mut GrantScheme) {
    scheme.eligible_nace_codes = scheme
        .eligible_nace_codes
        .iter()
        .map(|code| code.trim().to_ascii_uppercase())
        .filter(|code| !code.is_empty())
        .collect();
}

/// Normalises NACE codes and fills `special_thresholds` on records that lack
/// it. Returns whether thresholds were added; records that already carry the
/// structured field keep it.
pub fn migrate_scheme(scheme: &mut GrantScheme) -> bool {
    normalize_nace_codes(scheme);
    if scheme.special_thresholds.is_some() {
        return false;
    }
    match infer_special_thresholds(scheme.code.as_deref(), &scheme.name) {
        Some(thresholds) => {
            debug!(scheme = %scheme.id, label = %thresholds.label, "migrated legacy thresholds");
            scheme.special_thresholds = Some(thresholds);
            true
        }
        None => false,
    }
}

pub fn migrate_catalog(schemes: &mut [GrantScheme]) -> usize {
    schemes
        .iter_mut()
        .map(migrate_scheme)
        .filter(|migrated| *migrated)
        .count()
}
