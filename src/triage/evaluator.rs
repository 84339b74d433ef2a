use tracing::debug;

use crate::catalog::GrantScheme;
use crate::profile::ApplicantProfile;
use crate::triage::filters::evaluate_filters;
use crate::triage::funding::{check_minimum_grant, estimate_funding};
use crate::triage::ranking::match_score;
use crate::triage::TriageResult;

pub const NO_CATEGORIES_NOTE: &str =
    "No specific cost categories matched - verify eligible costs with scheme guidelines";
pub const BONUS_REGION_NOTE: &str = "Gozo location bonus applied to aid intensity";

pub fn evaluate_scheme(scheme: &GrantScheme, profile: &ApplicantProfile) -> TriageResult {
    let filters = evaluate_filters(scheme, profile);
    let funding = estimate_funding(scheme, profile);
    let minimum_grant = check_minimum_grant(scheme, funding.estimated_grant());

    let mut notes = filters.notes();
    if let Some(note) = funding.grant.note.clone() {
        notes.push(note);
    }
    if let Some(note) = minimum_grant.note.clone() {
        notes.push(note);
    }

    let mut checks = filters.outcomes;
    checks.push(minimum_grant);

    let eligible = checks.iter().all(|c| c.passed);
    let exclusion_reason = checks
        .iter()
        .rev()
        .find(|c| !c.passed)
        .and_then(|c| c.note.clone());

    let matched = funding.apportioned.matched_count();
    let score = if eligible {
        match_score(matched, funding.aid_intensity)
    } else {
        0
    };

    if eligible && matched == 0 {
        notes.push(NO_CATEGORIES_NOTE.to_string());
    }
    if eligible && profile.location.is_bonus_region() {
        notes.push(BONUS_REGION_NOTE.to_string());
    }

    debug!(
        scheme = %scheme.id,
        eligible,
        rate = funding.aid_intensity,
        rate_source = ?funding.rate_source,
        eligible_costs = funding.apportioned.total,
        estimated_grant = funding.estimated_grant(),
        capped = funding.grant.capped,
        "evaluated grant scheme"
    );

    TriageResult {
        scheme_id: scheme.id.clone(),
        scheme_name: scheme.name.clone(),
        scheme_code: scheme.code.clone(),
        eligible,
        match_score: score,
        total_eligible_costs: funding.apportioned.total,
        aid_intensity: funding.aid_intensity,
        estimated_grant: funding.estimated_grant(),
        matched_cost_categories: funding.apportioned.matched_labels(),
        notes,
        exclusion_reason,
        checks,
    }
}
