pub mod classify;
pub mod costs;
pub mod input;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use costs::{CostBreakdown, CostCategory, CostItem, CostKind, CostLineKey};
pub use input::ProfileInput;

#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum BusinessSize {
    Micro,
    Small,
    Medium,
    Large,
}

impl BusinessSize {
    pub fn is_sme(self) -> bool {
        !matches!(self, Self::Large)
    }

    pub fn is_micro(self) -> bool {
        matches!(self, Self::Micro)
    }

    pub fn as_slug(self) -> &'static str {
        match self {
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl Display for BusinessSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

impl FromStr for BusinessSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "micro" => Ok(Self::Micro),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" | "large_entity" => Ok(Self::Large),
            _ => Err(ParseError::new("business size", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BusinessAge {
    Startup,
    Established,
}

impl BusinessAge {
    pub fn is_startup(self) -> bool {
        matches!(self, Self::Startup)
    }

    pub fn as_slug(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Established => "established",
        }
    }
}

impl FromStr for BusinessAge {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "startup" | "start_up" => Ok(Self::Startup),
            "established" => Ok(Self::Established),
            _ => Err(ParseError::new("business age", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LegalStructure {
    SelfEmployed,
    Partnership,
    LimitedCompany,
}

impl LegalStructure {
    pub fn as_slug(self) -> &'static str {
        match self {
            Self::SelfEmployed => "self_employed",
            Self::Partnership => "partnership",
            Self::LimitedCompany => "limited_company",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SelfEmployed => "Self-Employed (Sole Trader)",
            Self::Partnership => "Partnership",
            Self::LimitedCompany => "Limited Liability Company (Ltd)",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Self::SelfEmployed => "Self-Employed",
            Self::Partnership => "Partnership",
            Self::LimitedCompany => "Ltd",
        }
    }
}

impl FromStr for LegalStructure {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "self_employed" | "sole_trader" => Ok(Self::SelfEmployed),
            "partnership" => Ok(Self::Partnership),
            "limited_company" | "ltd" => Ok(Self::LimitedCompany),
            _ => Err(ParseError::new("legal structure", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered,
    InProgress,
    NotRegistered,
}

impl RegistrationStatus {
    pub fn as_slug(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::InProgress => "in_progress",
            Self::NotRegistered => "not_registered",
        }
    }
}

impl FromStr for RegistrationStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "registered" | "yes" => Ok(Self::Registered),
            "in_progress" | "in_process" => Ok(Self::InProgress),
            "not_registered" | "no" => Ok(Self::NotRegistered),
            _ => Err(ParseError::new("registration status", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectLocation {
    #[default]
    Malta,
    Gozo,
}

impl ProjectLocation {
    /// Gozo projects qualify for the bonus-region aid intensities.
    pub fn is_bonus_region(self) -> bool {
        matches!(self, Self::Gozo)
    }

    pub fn as_slug(self) -> &'static str {
        match self {
            Self::Malta => "malta",
            Self::Gozo => "gozo",
        }
    }
}

impl FromStr for ProjectLocation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "malta" => Ok(Self::Malta),
            "gozo" => Ok(Self::Gozo),
            _ => Err(ParseError::new("project location", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryActivity {
    Manufacturing,
    Technology,
    Research,
    LifeSciences,
    Sustainability,
    Industrial,
    Creative,
    Business,
    Skills,
    Retail,
    Construction,
    Hospitality,
}

impl PrimaryActivity {
    pub const ALL: [PrimaryActivity; 12] = [
        PrimaryActivity::Manufacturing,
        PrimaryActivity::Technology,
        PrimaryActivity::Research,
        PrimaryActivity::LifeSciences,
        PrimaryActivity::Sustainability,
        PrimaryActivity::Industrial,
        PrimaryActivity::Creative,
        PrimaryActivity::Business,
        PrimaryActivity::Skills,
        PrimaryActivity::Retail,
        PrimaryActivity::Construction,
        PrimaryActivity::Hospitality,
    ];

    pub fn as_slug(self) -> &'static str {
        match self {
            Self::Manufacturing => "manufacturing",
            Self::Technology => "technology",
            Self::Research => "research",
            Self::LifeSciences => "life_sciences",
            Self::Sustainability => "sustainability",
            Self::Industrial => "industrial",
            Self::Creative => "creative",
            Self::Business => "business",
            Self::Skills => "skills",
            Self::Retail => "retail",
            Self::Construction => "construction",
            Self::Hospitality => "hospitality",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Manufacturing => "Manufacturing & Production",
            Self::Technology => "Technology & Digital Solutions",
            Self::Research => "Research, Innovation & IP",
            Self::LifeSciences => "Life Sciences & Advanced Technologies",
            Self::Sustainability => "Sustainability & Environmental Projects",
            Self::Industrial => "Industrial & Technical Services",
            Self::Creative => "Culture, Creative & Audio-Visual",
            Self::Business => "Business Services & Advisory",
            Self::Skills => "Skills & Workforce Development",
            Self::Retail => "Retail and wholesale",
            Self::Construction => "Construction and Finishing",
            Self::Hospitality => "Hotels and guesthouse",
        }
    }
}

impl FromStr for PrimaryActivity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|activity| activity.as_slug() == normalized)
            .ok_or_else(|| ParseError::new("primary activity", s))
    }
}

/// Read-only snapshot of an applicant, built once per triage request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicantProfile {
    pub size: BusinessSize,
    pub age: BusinessAge,
    pub legal_structure: LegalStructure,
    pub registration_status: RegistrationStatus,
    pub location: ProjectLocation,
    pub nace_code: Option<String>,
    pub primary_activity: Option<PrimaryActivity>,
    pub sub_activity: Option<String>,
    pub has_exceeded_de_minimis: bool,
    pub costs: CostBreakdown,
}

impl ApplicantProfile {
    pub fn sample() -> Self {
        Self {
            size: BusinessSize::Small,
            age: BusinessAge::Established,
            legal_structure: LegalStructure::LimitedCompany,
            registration_status: RegistrationStatus::Registered,
            location: ProjectLocation::Malta,
            nace_code: Some("JC".to_string()),
            primary_activity: Some(PrimaryActivity::Technology),
            sub_activity: Some("Software development".to_string()),
            has_exceeded_de_minimis: false,
            costs: CostBreakdown::from_lines([
                (CostLineKey::EquipmentMachinery, 25_000.0),
                (CostLineKey::DigitalHardwareSoftware, 18_000.0),
                (CostLineKey::WagesCost, 30_000.0),
            ]),
        }
    }

    pub fn total_project_cost(&self) -> f64 {
        self.costs.total()
    }

    pub fn is_sme(&self) -> bool {
        self.size.is_sme()
    }

    pub fn is_startup(&self) -> bool {
        self.age.is_startup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vocabulary_aliases() {
        assert_eq!(
            "in_process".parse::<RegistrationStatus>().unwrap(),
            RegistrationStatus::InProgress
        );
        assert_eq!(
            "no".parse::<RegistrationStatus>().unwrap(),
            RegistrationStatus::NotRegistered
        );
        assert_eq!(
            "Life Sciences".parse::<PrimaryActivity>().unwrap(),
            PrimaryActivity::LifeSciences
        );
        assert_eq!(
            "sole-trader".parse::<LegalStructure>().unwrap(),
            LegalStructure::SelfEmployed
        );
        assert!("gigantic".parse::<BusinessSize>().is_err());
    }

    #[test]
    fn micro_is_an_sme() {
        assert!(BusinessSize::Micro.is_sme());
        assert!(BusinessSize::Medium.is_sme());
        assert!(!BusinessSize::Large.is_sme());
    }

    #[test]
    fn sample_profile_totals_its_costs() {
        let profile = ApplicantProfile::sample();
        assert!((profile.total_project_cost() - 73_000.0).abs() < 1e-9);
    }
}
