pub mod migrations;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogSnapshot;
use crate::profile::{
    ApplicantProfile, BusinessAge, BusinessSize, CostBreakdown, LegalStructure, PrimaryActivity,
    ProfileInput, ProjectLocation, RegistrationStatus,
};
use crate::report::{validate_recipient, ReportError};
use crate::triage::ranking::best_order;
use crate::triage::{best_eligible, find_all_matching_grants, TriageResult};

pub use store::LeadStore;

/// Contact details plus the applicant data entered in the form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadSubmission {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub profile: ProfileInput,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EligibleGrantSummary {
    pub scheme_id: String,
    pub scheme_name: String,
    pub estimated_grant: f64,
    pub aid_intensity: f64,
    pub match_score: u8,
    pub matched_cost_categories: Vec<String>,
}

impl From<&TriageResult> for EligibleGrantSummary {
    fn from(result: &TriageResult) -> Self {
        Self {
            scheme_id: result.scheme_id.clone(),
            scheme_name: result.scheme_name.clone(),
            estimated_grant: result.estimated_grant,
            aid_intensity: result.aid_intensity,
            match_score: result.match_score,
            matched_cost_categories: result.matched_cost_categories.clone(),
        }
    }
}

/// A persisted lead: who asked, what they described, and what triage found.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadRecord {
    #[serde(default)]
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub business_name: Option<String>,
    pub business_size: BusinessSize,
    pub business_age: BusinessAge,
    pub legal_structure: LegalStructure,
    pub registration_status: RegistrationStatus,
    pub project_location: ProjectLocation,
    pub primary_activity: Option<PrimaryActivity>,
    pub nace_code: Option<String>,
    pub sub_activity: Option<String>,
    pub employee_count: Option<u32>,
    pub annual_turnover: Option<f64>,
    pub has_exceeded_de_minimis: bool,
    pub project_costs: CostBreakdown,
    pub total_project_value: f64,
    pub total_capex: f64,
    pub total_opex: f64,
    pub best_grant_name: Option<String>,
    pub best_grant_amount: Option<f64>,
    pub best_aid_intensity: Option<f64>,
    pub eligible_grants: Vec<EligibleGrantSummary>,
    pub catalog_fingerprint: String,
    #[serde(default)]
    pub email_sent: bool,
    #[serde(default)]
    pub email_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Triage output for one submission, ready to persist and report on.
#[derive(Debug, Clone)]
pub struct LeadOutcome {
    pub profile: ApplicantProfile,
    pub results: Vec<TriageResult>,
    pub record: LeadRecord,
}

impl LeadOutcome {
    pub fn best(&self) -> Option<&TriageResult> {
        best_eligible(&self.results)
    }
}

/// Validates the contact details, then triages the profile against every
/// active scheme in the snapshot.
pub fn triage_submission(
    submission: &LeadSubmission,
    snapshot: &CatalogSnapshot,
) -> Result<LeadOutcome, ReportError> {
    validate_recipient(&submission.full_name, &submission.email)?;
    let profile = submission.profile.clone().into_profile();
    let results = find_all_matching_grants(&snapshot.schemes, &profile);
    let record = record_from_triage(submission, &profile, &results, &snapshot.fingerprint);
    Ok(LeadOutcome {
        profile,
        results,
        record,
    })
}

pub fn record_from_triage(
    submission: &LeadSubmission,
    profile: &ApplicantProfile,
    results: &[TriageResult],
    catalog_fingerprint: &str,
) -> LeadRecord {
    let mut ranked: Vec<&TriageResult> = results.iter().filter(|r| r.eligible).collect();
    ranked.sort_by(|a, b| best_order(a, b));
    let eligible: Vec<EligibleGrantSummary> =
        ranked.into_iter().map(EligibleGrantSummary::from).collect();
    let best = eligible.first();

    LeadRecord {
        id: 0,
        full_name: submission.full_name.trim().to_string(),
        email: submission.email.trim().to_string(),
        business_name: submission
            .business_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
        business_size: profile.size,
        business_age: profile.age,
        legal_structure: profile.legal_structure,
        registration_status: profile.registration_status,
        project_location: profile.location,
        primary_activity: profile.primary_activity,
        nace_code: profile.nace_code.clone(),
        sub_activity: profile.sub_activity.clone(),
        employee_count: submission.profile.employee_count,
        annual_turnover: submission.profile.annual_turnover,
        has_exceeded_de_minimis: profile.has_exceeded_de_minimis,
        project_costs: profile.costs.clone(),
        total_project_value: profile.costs.total(),
        total_capex: profile.costs.total_capex(),
        total_opex: profile.costs.total_opex(),
        best_grant_name: best.map(|g| g.scheme_name.clone()),
        best_grant_amount: best.map(|g| g.estimated_grant),
        best_aid_intensity: best.map(|g| g.aid_intensity),
        eligible_grants: eligible.clone(),
        catalog_fingerprint: catalog_fingerprint.to_string(),
        email_sent: false,
        email_sent_at: None,
        created_at: Utc::now(),
    }
}

pub fn summarize_leads(records: &[LeadRecord]) -> String {
    if records.is_empty() {
        return "No leads recorded.".to_string();
    }
    let with_funding = records.iter().filter(|r| r.best_grant_name.is_some()).count();
    let reported = records.iter().filter(|r| r.email_sent).count();
    let pipeline: f64 = records.iter().filter_map(|r| r.best_grant_amount).sum();
    format!(
        "{} leads, {with_funding} with eligible funding, {reported} reports sent, {} potential funding",
        records.len(),
        crate::triage::format_eur(pipeline.round())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::demo_catalog;
    use crate::catalog::{GrantScheme, RateTable};
    use crate::profile::{CostLineKey, ProjectLocation};

    fn submission() -> LeadSubmission {
        let mut profile = ProfileInput {
            employee_count: Some(12),
            annual_turnover: Some(1_500_000.0),
            location: Some(ProjectLocation::Gozo),
            nace_code: Some("jc".to_string()),
            ..ProfileInput::default()
        };
        profile.costs = CostBreakdown::from_lines([
            (CostLineKey::EquipmentMachinery, 40_000.0),
            (CostLineKey::DigitalHardwareSoftware, 20_000.0),
            (CostLineKey::WagesCost, 15_000.0),
        ]);
        LeadSubmission {
            full_name: "  Maria Borg ".to_string(),
            email: "maria@example.mt".to_string(),
            business_name: Some("Borg Tech Ltd".to_string()),
            profile,
        }
    }

    #[test]
    fn triage_builds_record_with_best_grant() {
        let snapshot = CatalogSnapshot::with_hash("test", demo_catalog());
        let outcome = triage_submission(&submission(), &snapshot).unwrap();
        let record = &outcome.record;

        assert_eq!(record.full_name, "Maria Borg");
        assert_eq!(record.business_size, BusinessSize::Small);
        assert_eq!(record.nace_code.as_deref(), Some("JC"));
        assert_eq!(record.total_project_value, 75_000.0);
        assert_eq!(record.total_capex + record.total_opex, 75_000.0);
        assert_eq!(record.catalog_fingerprint, snapshot.fingerprint);
        assert!(!record.eligible_grants.is_empty());

        let best = outcome.best().unwrap();
        assert_eq!(record.best_grant_name.as_deref(), Some(best.scheme_name.as_str()));
        assert_eq!(record.best_grant_amount, Some(best.estimated_grant));
    }

    #[test]
    fn equal_capped_grants_prefer_the_higher_score() {
        let capped = |id: &str, keys: &[CostLineKey]| {
            let mut scheme = GrantScheme::new(id, id.to_uppercase())
                .with_rates(RateTable {
                    standard: Some(0.5),
                    ..RateTable::default()
                })
                .with_eligible_costs(keys.iter().copied());
            scheme.funding.max_grant_amount = Some(10_000.0);
            scheme
        };
        let snapshot = CatalogSnapshot::with_hash(
            "capped",
            vec![
                capped("a-narrow", &[CostLineKey::EquipmentMachinery]),
                capped(
                    "b-broad",
                    &[CostLineKey::EquipmentMachinery, CostLineKey::WagesCost],
                ),
            ],
        );
        let mut lead = submission();
        lead.profile.costs = CostBreakdown::from_lines([
            (CostLineKey::EquipmentMachinery, 20_000.0),
            (CostLineKey::WagesCost, 5_000.0),
        ]);

        let outcome = triage_submission(&lead, &snapshot).unwrap();
        let best = outcome.best().unwrap();
        assert_eq!(best.scheme_id, "b-broad");
        assert_eq!(best.match_score, 35);
        assert_eq!(outcome.record.best_grant_name.as_deref(), Some("B-BROAD"));
        assert_eq!(outcome.record.best_grant_amount, Some(10_000.0));
        assert_eq!(outcome.record.eligible_grants[0].scheme_id, "b-broad");
        assert_eq!(outcome.record.eligible_grants[1].match_score, 30);
    }

    #[test]
    fn invalid_contact_details_are_rejected() {
        let snapshot = CatalogSnapshot::with_hash("test", demo_catalog());
        let mut bad = submission();
        bad.email = "not-an-email".to_string();
        assert!(matches!(
            triage_submission(&bad, &snapshot),
            Err(ReportError::InvalidEmail)
        ));
    }

    #[test]
    fn empty_catalog_yields_no_best_grant() {
        let snapshot = CatalogSnapshot::with_hash("empty", Vec::new());
        let outcome = triage_submission(&submission(), &snapshot).unwrap();
        assert!(outcome.results.is_empty());
        assert!(outcome.record.best_grant_name.is_none());
        assert!(outcome.record.eligible_grants.is_empty());
    }

    #[test]
    fn summary_counts_reported_leads() {
        assert_eq!(summarize_leads(&[]), "No leads recorded.");
        let snapshot = CatalogSnapshot::with_hash("test", demo_catalog());
        let mut record = triage_submission(&submission(), &snapshot).unwrap().record;
        record.email_sent = true;
        let summary = summarize_leads(&[record]);
        assert!(summary.starts_with("1 leads, 1 with eligible funding, 1 reports sent"));
    }
}
