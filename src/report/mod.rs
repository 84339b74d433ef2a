pub mod limiter;
pub mod sink;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ReportConfig;
use crate::leads::LeadOutcome;
use crate::profile::ApplicantProfile;
use crate::triage::ranking::top_eligible;
use crate::triage::{format_eur, TriageResult};

pub use limiter::{email_key, RateLimiter};
pub use sink::{ReportSink, StdoutSink, WebhookSink};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("missing required fields: email and full name")]
    MissingFields,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("invalid full name")]
    InvalidName,
    #[error("too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("report delivery failed: {0}")]
    Delivery(String),
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(idx, ch)| ch == '.' && idx > 0 && idx + 1 < domain.len())
}

pub fn validate_recipient(full_name: &str, email: &str) -> Result<(), ReportError> {
    if full_name.trim().is_empty() || email.trim().is_empty() {
        return Err(ReportError::MissingFields);
    }
    if !is_valid_email(email.trim()) {
        return Err(ReportError::InvalidEmail);
    }
    let name_len = full_name.trim().chars().count();
    if !(2..=200).contains(&name_len) {
        return Err(ReportError::InvalidName);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportLine {
    pub scheme_id: String,
    pub scheme_name: String,
    pub estimated_grant: f64,
    pub aid_intensity: f64,
    pub match_score: u8,
    /// `min(total project value × aid intensity, estimated grant)`.
    pub estimated_coverage: f64,
    pub covered_costs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EligibilityReport {
    pub recipient_name: String,
    pub email: String,
    pub business_name: Option<String>,
    pub subject: String,
    pub total_project_value: f64,
    pub total_capex: f64,
    pub total_opex: f64,
    pub estimated_coverage: f64,
    pub best: Option<ReportLine>,
    pub lines: Vec<ReportLine>,
    pub generated_at: DateTime<Utc>,
}

pub fn coverage(total_project_value: f64, result: &TriageResult) -> f64 {
    (total_project_value * result.aid_intensity).min(result.estimated_grant)
}

fn report_line(profile: &ApplicantProfile, result: &TriageResult) -> ReportLine {
    let mut covered_costs = result.matched_cost_categories.clone();
    if covered_costs.is_empty() {
        covered_costs = profile
            .costs
            .category_totals()
            .into_iter()
            .filter(|(_, total)| *total > 0.0)
            .map(|(category, _)| category.label().to_string())
            .collect();
    }
    if covered_costs.is_empty() {
        covered_costs.push("General project costs".to_string());
    }
    ReportLine {
        scheme_id: result.scheme_id.clone(),
        scheme_name: result.scheme_name.clone(),
        estimated_grant: result.estimated_grant,
        aid_intensity: result.aid_intensity,
        match_score: result.match_score,
        estimated_coverage: coverage(profile.total_project_cost(), result),
        covered_costs,
    }
}

pub fn subject_line(estimated_coverage: f64) -> String {
    if estimated_coverage > 0.0 {
        format!(
            "Your Grant Eligibility Report - {} Potential Funding",
            format_eur(estimated_coverage.round())
        )
    } else {
        "Your Grant Eligibility Report - Results".to_string()
    }
}

/// Builds the report for a triaged lead from its top `top_n` eligible results.
pub fn build_report(outcome: &LeadOutcome, top_n: usize) -> EligibilityReport {
    let profile = &outcome.profile;
    let lines: Vec<ReportLine> = top_eligible(&outcome.results, top_n)
        .iter()
        .map(|result| report_line(profile, result))
        .collect();
    let best = lines.first().cloned();
    let estimated_coverage = best.as_ref().map(|b| b.estimated_coverage).unwrap_or(0.0);

    EligibilityReport {
        recipient_name: outcome.record.full_name.clone(),
        email: outcome.record.email.clone(),
        business_name: outcome.record.business_name.clone(),
        subject: subject_line(estimated_coverage),
        total_project_value: profile.costs.total(),
        total_capex: profile.costs.total_capex(),
        total_opex: profile.costs.total_opex(),
        estimated_coverage,
        best,
        lines,
        generated_at: Utc::now(),
    }
}

pub fn render_text(report: &EligibilityReport) -> String {
    let mut out = format!("Dear {},\n\n", report.recipient_name);
    if let Some(business) = report.business_name.as_deref() {
        out.push_str(&format!("Business: {business}\n"));
    }
    out.push_str(&format!(
        "Total project value: {} (capex {}, opex {})\n\n",
        format_eur(report.total_project_value),
        format_eur(report.total_capex),
        format_eur(report.total_opex)
    ));

    if report.lines.is_empty() {
        out.push_str(
            "No matching grants found based on your project details. \
             Consider adjusting your project costs or activities.\n",
        );
        return out;
    }

    out.push_str("Funding coverage summary:\n");
    for (idx, line) in report.lines.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} - {} estimated coverage ({:.0}% aid intensity)\n   Covers: {}\n",
            idx + 1,
            line.scheme_name,
            format_eur(line.estimated_coverage.round()),
            line.aid_intensity * 100.0,
            line.covered_costs.join(", ")
        ));
    }
    out
}

/// Delivers eligibility reports to the configured sinks, subject to the
/// per-recipient rate limit.
pub struct Notifier {
    limiter: Arc<RateLimiter>,
    sinks: Vec<Box<dyn ReportSink>>,
    top_n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispatch {
    pub report: EligibilityReport,
    pub delivered: Vec<String>,
}

impl Notifier {
    pub fn new(limiter: Arc<RateLimiter>, sinks: Vec<Box<dyn ReportSink>>, top_n: usize) -> Self {
        Self {
            limiter,
            sinks,
            top_n,
        }
    }

    pub fn from_config(config: &ReportConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let mut sinks: Vec<Box<dyn ReportSink>> = Vec::new();
        if config.enable_stdout {
            sinks.push(Box::new(StdoutSink));
        }
        let url = config.webhook_url.trim();
        if !url.is_empty() {
            sinks.push(Box::new(WebhookSink::new(url)?));
        }
        Ok(Self::new(limiter, sinks, config.top_n))
    }

    pub fn limiter_for(config: &ReportConfig) -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(
            config.max_requests,
            Duration::from_secs(config.window_secs),
        ))
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Sink failures are logged; the dispatch fails only when no sink took
    /// the report.
    pub async fn dispatch(&self, outcome: &LeadOutcome) -> Result<Dispatch, ReportError> {
        let record = &outcome.record;
        validate_recipient(&record.full_name, &record.email)?;
        self.limiter.check(&email_key(&record.email))?;

        let report = build_report(outcome, self.top_n);
        debug!(
            email = %report.email,
            lines = report.lines.len(),
            coverage = report.estimated_coverage,
            "built eligibility report"
        );

        let mut delivered = Vec::new();
        let mut failures = Vec::new();
        for sink in &self.sinks {
            match sink.deliver(&report).await {
                Ok(()) => delivered.push(sink.name().to_string()),
                Err(err) => {
                    warn!("report sink {} failed: {err:#}", sink.name());
                    failures.push(format!("{}: {err}", sink.name()));
                }
            }
        }
        if delivered.is_empty() {
            let reason = if failures.is_empty() {
                "no report sinks configured".to_string()
            } else {
                failures.join("; ")
            };
            return Err(ReportError::Delivery(reason));
        }
        info!(email = %report.email, sinks = ?delivered, "eligibility report dispatched");
        Ok(Dispatch { report, delivered })
    }
}
