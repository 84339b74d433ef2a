use std::cmp::Ordering;

use tracing::debug;

use crate::catalog::GrantScheme;
use crate::profile::ApplicantProfile;
use crate::triage::evaluator::evaluate_scheme;
use crate::triage::TriageResult;

/// Equal weight on cost-category breadth (ten categories saturate it) and
/// aid intensity.
pub fn match_score(matched_categories: usize, aid_intensity: f64) -> u8 {
    let raw = (matched_categories as f64 / 10.0) * 50.0 + aid_intensity * 50.0;
    raw.round().clamp(0.0, 100.0) as u8
}

fn evaluate_active(schemes: &[GrantScheme], profile: &ApplicantProfile) -> Vec<TriageResult> {
    schemes
        .iter()
        .filter(|scheme| scheme.is_active)
        .map(|scheme| evaluate_scheme(scheme, profile))
        .collect()
}

/// Highest estimated grant among eligible active schemes. `None` is a valid
/// answer, not a failure.
pub fn find_best_grant(schemes: &[GrantScheme], profile: &ApplicantProfile) -> Option<TriageResult> {
    let results = evaluate_active(schemes, profile);
    let best = best_eligible(&results).cloned();
    debug!(
        best = best.as_ref().map(|r| r.scheme_id.as_str()).unwrap_or("none"),
        "selected best grant"
    );
    best
}

/// Every active scheme, eligible ones first, then by estimated grant.
pub fn find_all_matching_grants(
    schemes: &[GrantScheme],
    profile: &ApplicantProfile,
) -> Vec<TriageResult> {
    let mut results = evaluate_active(schemes, profile);
    results.sort_by(all_order);
    results
}

/// First eligible result in `best_order`, whatever order `results` is in.
pub fn best_eligible(results: &[TriageResult]) -> Option<&TriageResult> {
    results
        .iter()
        .filter(|r| r.eligible)
        .min_by(|a, b| best_order(a, b))
}

/// Estimated grant desc, match score desc, scheme id asc.
pub fn best_order(a: &TriageResult, b: &TriageResult) -> Ordering {
    b.estimated_grant
        .total_cmp(&a.estimated_grant)
        .then_with(|| b.match_score.cmp(&a.match_score))
        .then_with(|| a.scheme_id.cmp(&b.scheme_id))
}

/// Eligible first, estimated grant desc, scheme id asc.
pub fn all_order(a: &TriageResult, b: &TriageResult) -> Ordering {
    b.eligible
        .cmp(&a.eligible)
        .then_with(|| b.estimated_grant.total_cmp(&a.estimated_grant))
        .then_with(|| a.scheme_id.cmp(&b.scheme_id))
}

/// The `n` best eligible results, as handed to the report notifier.
pub fn top_eligible(results: &[TriageResult], n: usize) -> Vec<TriageResult> {
    let mut eligible: Vec<TriageResult> = results.iter().filter(|r| r.eligible).cloned().collect();
    eligible.sort_by(best_order);
    eligible.truncate(n);
    eligible
}
