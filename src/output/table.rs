use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::catalog::GrantScheme;
use crate::leads::LeadRecord;
use crate::profile::ApplicantProfile;
use crate::report::EligibilityReport;
use crate::triage::{format_eur, TriageResult};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

pub fn render_results_table(results: &[TriageResult]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Scheme",
        "Eligible",
        "Score",
        "Eligible Costs",
        "Aid",
        "Est. Grant",
        "Checks",
        "Reason",
    ]);

    for r in results {
        let elig = if r.eligible { "YES" } else { "NO" };
        let elig_cell = if r.eligible {
            Cell::new(elig).fg(Color::Green)
        } else {
            Cell::new(elig).fg(Color::Red)
        };
        table.add_row(Row::from(vec![
            Cell::new(&r.scheme_name),
            elig_cell,
            Cell::new(r.match_score),
            Cell::new(format_eur(r.total_eligible_costs)),
            Cell::new(percent(r.aid_intensity)),
            Cell::new(format_eur(r.estimated_grant)),
            Cell::new(format!("{}/{}", r.passed_count(), r.checks.len())),
            Cell::new(r.exclusion_reason.as_deref().unwrap_or("-")),
        ]));
    }
    table.to_string()
}

/// Single-result view with every note, used by `best`.
pub fn render_best_table(result: Option<&TriageResult>) -> String {
    let Some(r) = result else {
        return "No eligible grant scheme found for this project.".to_string();
    };
    let mut table = new_table();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Scheme".to_string(), r.scheme_name.clone()]);
    if let Some(code) = &r.scheme_code {
        table.add_row(vec!["Code".to_string(), code.clone()]);
    }
    table.add_row(vec!["Estimated grant".to_string(), format_eur(r.estimated_grant)]);
    table.add_row(vec!["Aid intensity".to_string(), percent(r.aid_intensity)]);
    table.add_row(vec![
        "Eligible costs".to_string(),
        format_eur(r.total_eligible_costs),
    ]);
    table.add_row(vec!["Match score".to_string(), r.match_score.to_string()]);
    table.add_row(vec![
        "Matched categories".to_string(),
        r.matched_cost_categories.join(", "),
    ]);
    for note in &r.notes {
        table.add_row(vec!["Note".to_string(), note.clone()]);
    }
    table.to_string()
}

pub fn render_profile_table(profile: &ApplicantProfile) -> String {
    let mut table = new_table();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Size", profile.size.as_slug()]);
    table.add_row(vec!["Age", profile.age.as_slug()]);
    table.add_row(vec!["Legal structure", profile.legal_structure.label()]);
    table.add_row(vec!["Location", profile.location.as_slug()]);
    table.add_row(vec![
        "NACE".to_string(),
        profile.nace_code.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    table.add_row(vec![
        "Total project value".to_string(),
        format_eur(profile.total_project_cost()),
    ]);
    table.add_row(vec![
        "Capex / Opex".to_string(),
        format!(
            "{} / {}",
            format_eur(profile.costs.total_capex()),
            format_eur(profile.costs.total_opex())
        ),
    ]);
    table.to_string()
}

pub fn render_catalog_table(schemes: &[GrantScheme]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "ID",
        "Name",
        "Code",
        "Active",
        "Framework",
        "Max Grant",
        "Restrictions",
    ]);
    for scheme in schemes {
        let mut restrictions = Vec::new();
        if scheme.micro_only {
            restrictions.push("micro");
        } else if scheme.sme_only {
            restrictions.push("sme");
        }
        if scheme.startup_required {
            restrictions.push("startup");
        }
        if !scheme.eligible_nace_codes.is_empty() {
            restrictions.push("nace");
        }
        if scheme.special_thresholds.is_some() {
            restrictions.push("thresholds");
        }
        let active = if scheme.is_active {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };
        table.add_row(Row::from(vec![
            Cell::new(&scheme.id),
            Cell::new(&scheme.name),
            Cell::new(scheme.code.as_deref().unwrap_or("-")),
            active,
            Cell::new(
                scheme
                    .aid_framework
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(
                scheme
                    .funding
                    .max_grant_amount
                    .map(format_eur)
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(if restrictions.is_empty() {
                "-".to_string()
            } else {
                restrictions.join(", ")
            }),
        ]));
    }
    table.to_string()
}

pub fn render_leads_table(records: &[LeadRecord]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Created",
        "Name",
        "Email",
        "Size",
        "Project Value",
        "Best Grant",
        "Amount",
        "Reported",
    ]);
    for rec in records {
        table.add_row(vec![
            rec.created_at.format("%Y-%m-%d %H:%M").to_string(),
            rec.full_name.clone(),
            rec.email.clone(),
            rec.business_size.as_slug().to_string(),
            format_eur(rec.total_project_value),
            rec.best_grant_name
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            rec.best_grant_amount
                .map(format_eur)
                .unwrap_or_else(|| "-".to_string()),
            if rec.email_sent { "yes" } else { "no" }.to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_report_table(report: &EligibilityReport) -> String {
    let mut table = new_table();
    table.set_header(vec!["#", "Scheme", "Coverage", "Aid", "Covers"]);
    for (idx, line) in report.lines.iter().enumerate() {
        table.add_row(vec![
            (idx + 1).to_string(),
            line.scheme_name.clone(),
            format_eur(line.estimated_coverage.round()),
            percent(line.aid_intensity),
            line.covered_costs.join(", "),
        ]);
    }
    format!("{}\n{}", report.subject, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::demo_catalog;
    use crate::triage::{find_all_matching_grants, find_best_grant};

    #[test]
    fn results_table_lists_every_scheme() {
        let results = find_all_matching_grants(&demo_catalog(), &ApplicantProfile::sample());
        let rendered = render_results_table(&results);
        for r in &results {
            assert!(rendered.contains(&r.scheme_name));
        }
    }

    #[test]
    fn best_table_handles_no_result() {
        assert_eq!(
            render_best_table(None),
            "No eligible grant scheme found for this project."
        );
        let best = find_best_grant(&demo_catalog(), &ApplicantProfile::sample());
        let rendered = render_best_table(best.as_ref());
        assert!(rendered.contains("Estimated grant"));
    }

    #[test]
    fn catalog_table_marks_restrictions() {
        let rendered = render_catalog_table(&demo_catalog());
        assert!(rendered.contains("thresholds"));
        assert!(rendered.contains("business-start"));
    }
}
