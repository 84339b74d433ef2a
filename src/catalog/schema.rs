use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::profile::{CostLineKey, LegalStructure, RegistrationStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AidFramework {
    DeMinimis,
    Gber,
    #[serde(other)]
    Other,
}

impl AidFramework {
    /// Frameworks subject to the cumulative state-aid ceiling.
    pub fn is_ceiling_capped(self) -> bool {
        matches!(self, Self::DeMinimis)
    }
}

impl Display for AidFramework {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::DeMinimis => "de_minimis",
            Self::Gber => "gber",
            Self::Other => "other",
        };
        write!(f, "{display}")
    }
}

/// Aid-intensity fractions keyed by applicant size, location, age and activity.
/// Keys inside the nested `rates` object may also carry the `_aid_intensity`
/// suffix. Flat records with rate columns at the top level are not read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RateTable {
    #[serde(default, alias = "standard_aid_intensity")]
    pub standard: Option<f64>,
    #[serde(default, alias = "sme_aid_intensity")]
    pub sme: Option<f64>,
    #[serde(default, alias = "sme_gozo_aid_intensity")]
    pub sme_gozo: Option<f64>,
    #[serde(default, alias = "large_entity_aid_intensity")]
    pub large_entity: Option<f64>,
    #[serde(default, alias = "large_entity_gozo_aid_intensity")]
    pub large_entity_gozo: Option<f64>,
    #[serde(default, alias = "startup_aid_intensity")]
    pub startup: Option<f64>,
    #[serde(default, alias = "hospitality_aid_intensity")]
    pub hospitality: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FundingBounds {
    #[serde(default)]
    pub min_investment_required: Option<f64>,
    #[serde(default)]
    pub min_grant_amount: Option<f64>,
    #[serde(default)]
    pub max_grant_amount: Option<f64>,
}

/// Which cost lines a scheme funds. Lines absent from the map are not eligible.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EligibleCostsMap(pub BTreeMap<CostLineKey, bool>);

impl EligibleCostsMap {
    pub fn from_keys(keys: impl IntoIterator<Item = CostLineKey>) -> Self {
        Self(keys.into_iter().map(|key| (key, true)).collect())
    }

    pub fn is_eligible(&self, key: CostLineKey) -> bool {
        self.0.get(&key).copied().unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A project-cost floor; `exclusive` floors require the cost to exceed the amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CostFloor {
    pub amount: f64,
    #[serde(default)]
    pub exclusive: bool,
}

impl CostFloor {
    pub fn inclusive(amount: f64) -> Self {
        Self {
            amount,
            exclusive: false,
        }
    }

    pub fn exclusive(amount: f64) -> Self {
        Self {
            amount,
            exclusive: true,
        }
    }

    pub fn admits(&self, total: f64) -> bool {
        if self.exclusive {
            total > self.amount
        } else {
            total >= self.amount
        }
    }
}

/// Extra scheme-specific thresholds, populated when the catalog is authored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialThresholds {
    /// Scheme label used in exclusion messages, e.g. "Invest 2024".
    pub label: String,
    #[serde(default)]
    pub min_project_cost: Option<CostFloor>,
    #[serde(default)]
    pub sme_min_project_cost: Option<CostFloor>,
    #[serde(default)]
    pub large_min_project_cost: Option<CostFloor>,
    #[serde(default)]
    pub min_grant_amount: Option<f64>,
    /// Label for the size-specific floors when they come from another scheme
    /// rule than `label`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_floor_label: Option<String>,
}

impl SpecialThresholds {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            min_project_cost: None,
            sme_min_project_cost: None,
            large_min_project_cost: None,
            min_grant_amount: None,
            size_floor_label: None,
        }
    }

    pub fn size_label(&self) -> &str {
        self.size_floor_label.as_deref().unwrap_or(&self.label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrantScheme {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub eligible_nace_codes: Vec<String>,
    #[serde(default)]
    pub eligible_activities: Vec<String>,
    #[serde(default)]
    pub supported_sub_activities: Vec<String>,
    #[serde(default)]
    pub allowed_legal_structures: Vec<LegalStructure>,
    #[serde(default)]
    pub allowed_registration_statuses: Vec<RegistrationStatus>,
    #[serde(default)]
    pub micro_only: bool,
    #[serde(default)]
    pub sme_only: bool,
    #[serde(default)]
    pub startup_required: bool,
    #[serde(default)]
    pub aid_framework: Option<AidFramework>,
    #[serde(default)]
    pub rates: RateTable,
    #[serde(default)]
    pub funding: FundingBounds,
    /// `None` means the scheme declares no cost map at all, which apportions nothing.
    #[serde(default)]
    pub eligible_costs: Option<EligibleCostsMap>,
    #[serde(default)]
    pub special_thresholds: Option<SpecialThresholds>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl GrantScheme {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: None,
            description: None,
            eligible_nace_codes: Vec::new(),
            eligible_activities: Vec::new(),
            supported_sub_activities: Vec::new(),
            allowed_legal_structures: Vec::new(),
            allowed_registration_statuses: Vec::new(),
            micro_only: false,
            sme_only: false,
            startup_required: false,
            aid_framework: None,
            rates: RateTable::default(),
            funding: FundingBounds::default(),
            eligible_costs: None,
            special_thresholds: None,
            is_active: true,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn with_rates(mut self, rates: RateTable) -> Self {
        self.rates = rates;
        self
    }

    pub fn with_funding(mut self, funding: FundingBounds) -> Self {
        self.funding = funding;
        self
    }

    pub fn with_eligible_costs(mut self, keys: impl IntoIterator<Item = CostLineKey>) -> Self {
        self.eligible_costs = Some(EligibleCostsMap::from_keys(keys));
        self
    }

    pub fn is_ceiling_capped(&self) -> bool {
        self.aid_framework
            .map(AidFramework::is_ceiling_capped)
            .unwrap_or(false)
    }
}

/// Immutable view of the catalog handed to the triage engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSnapshot {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub fingerprint: String,
    pub schemes: Vec<GrantScheme>,
}

impl CatalogSnapshot {
    pub fn with_hash(source: impl Into<String>, schemes: Vec<GrantScheme>) -> Self {
        Self {
            source: source.into(),
            loaded_at: Utc::now(),
            fingerprint: fingerprint(&schemes),
            schemes,
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &GrantScheme> {
        self.schemes.iter().filter(|scheme| scheme.is_active)
    }
}

pub fn fingerprint(schemes: &[GrantScheme]) -> String {
    let canonical = serde_json::to_string(schemes).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}
