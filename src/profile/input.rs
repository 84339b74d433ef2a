use serde::{Deserialize, Serialize};

use crate::profile::classify::classify_business_size;
use crate::profile::{
    ApplicantProfile, BusinessAge, BusinessSize, CostBreakdown, CostItem, LegalStructure,
    PrimaryActivity, ProjectLocation, RegistrationStatus,
};

/// Caller-supplied applicant data, as submitted by the form or an API client.
///
/// Missing fields fall back to the defaults of a registered, established,
/// limited company in Malta. The size class is taken as given when present,
/// otherwise derived from headcount and turnover.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileInput {
    pub size: Option<BusinessSize>,
    pub employee_count: Option<u32>,
    pub annual_turnover: Option<f64>,
    pub age: Option<BusinessAge>,
    pub legal_structure: Option<LegalStructure>,
    pub registration_status: Option<RegistrationStatus>,
    pub location: Option<ProjectLocation>,
    pub nace_code: Option<String>,
    pub primary_activity: Option<PrimaryActivity>,
    pub sub_activity: Option<String>,
    #[serde(default)]
    pub has_exceeded_de_minimis: bool,
    #[serde(default)]
    pub costs: CostBreakdown,
}

impl ProfileInput {
    pub fn resolved_size(&self) -> BusinessSize {
        if let Some(size) = self.size {
            return size;
        }
        match self.employee_count {
            Some(count) => classify_business_size(count, self.annual_turnover.unwrap_or(0.0)),
            None => BusinessSize::Micro,
        }
    }

    pub fn into_profile(self) -> ApplicantProfile {
        let size = self.resolved_size();
        ApplicantProfile {
            size,
            age: self.age.unwrap_or(BusinessAge::Established),
            legal_structure: self.legal_structure.unwrap_or(LegalStructure::LimitedCompany),
            registration_status: self
                .registration_status
                .unwrap_or(RegistrationStatus::Registered),
            location: self.location.unwrap_or_default(),
            nace_code: non_empty(self.nace_code).map(|code| code.to_ascii_uppercase()),
            primary_activity: self.primary_activity,
            sub_activity: non_empty(self.sub_activity),
            has_exceeded_de_minimis: self.has_exceeded_de_minimis,
            costs: normalize_costs(self.costs),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn normalize_costs(costs: CostBreakdown) -> CostBreakdown {
    let mut out = CostBreakdown::default();
    for (key, item) in costs.lines() {
        out.set(
            key,
            CostItem {
                amount: item.contribution(),
                description: item.description.clone(),
            },
        );
    }
    out
}
