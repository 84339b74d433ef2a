use anyhow::Result;

use crate::catalog::GrantScheme;
use crate::leads::LeadRecord;
use crate::triage::TriageResult;

pub fn results_to_csv(results: &[TriageResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "scheme_id",
        "scheme_name",
        "eligible",
        "match_score",
        "eligible_costs",
        "aid_intensity",
        "estimated_grant",
        "matched_categories",
        "exclusion_reason",
    ])?;
    for result in results {
        writer.write_record([
            result.scheme_id.clone(),
            result.scheme_name.clone(),
            result.eligible.to_string(),
            result.match_score.to_string(),
            format!("{:.2}", result.total_eligible_costs),
            format!("{:.4}", result.aid_intensity),
            format!("{:.2}", result.estimated_grant),
            result.matched_cost_categories.join("; "),
            result.exclusion_reason.clone().unwrap_or_default(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

/// Admin lead export.
pub fn leads_to_csv(records: &[LeadRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "created_at",
        "full_name",
        "email",
        "business_name",
        "business_size",
        "legal_structure",
        "location",
        "total_project_value",
        "best_grant",
        "best_grant_amount",
        "best_aid_intensity",
        "eligible_grants",
        "email_sent",
    ])?;
    for record in records {
        writer.write_record([
            record.created_at.to_rfc3339(),
            record.full_name.clone(),
            record.email.clone(),
            record.business_name.clone().unwrap_or_default(),
            record.business_size.as_slug().to_string(),
            record.legal_structure.as_slug().to_string(),
            record.project_location.as_slug().to_string(),
            format!("{:.2}", record.total_project_value),
            record.best_grant_name.clone().unwrap_or_default(),
            record
                .best_grant_amount
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default(),
            record
                .best_aid_intensity
                .map(|v| format!("{v:.4}"))
                .unwrap_or_default(),
            record.eligible_grants.len().to_string(),
            record.email_sent.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn catalog_to_csv(schemes: &[GrantScheme]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "id",
        "name",
        "code",
        "active",
        "framework",
        "min_investment",
        "min_grant",
        "max_grant",
    ])?;
    for scheme in schemes {
        writer.write_record([
            scheme.id.clone(),
            scheme.name.clone(),
            scheme.code.clone().unwrap_or_default(),
            scheme.is_active.to_string(),
            scheme
                .aid_framework
                .map(|f| f.to_string())
                .unwrap_or_default(),
            optional_amount(scheme.funding.min_investment_required),
            optional_amount(scheme.funding.min_grant_amount),
            optional_amount(scheme.funding.max_grant_amount),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

fn optional_amount(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::demo_catalog;
    use crate::profile::ApplicantProfile;
    use crate::triage::find_all_matching_grants;

    #[test]
    fn results_csv_has_row_per_result() {
        let results = find_all_matching_grants(&demo_catalog(), &ApplicantProfile::sample());
        let csv = results_to_csv(&results).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), results.len() + 1);
        assert!(lines[0].starts_with("scheme_id,scheme_name,eligible"));
    }

    #[test]
    fn catalog_csv_lists_scheme_fields() {
        let csv = catalog_to_csv(&demo_catalog()).unwrap();
        assert!(csv.contains("digitalise,Digitalise Your Business,MDIA-DYB,true,de_minimis"));
    }
}
