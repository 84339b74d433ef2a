use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::profile::ParseError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Premises,
    Equipment,
    Wages,
    Digital,
    Vehicles,
    Innovation,
}

impl CostCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Premises => "Premises",
            Self::Equipment => "Equipment",
            Self::Wages => "Wages & Staff",
            Self::Digital => "Digital & Technology",
            Self::Vehicles => "Vehicles",
            Self::Innovation => "Innovation & Advisory",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    Capex,
    Opex,
}

/// One cost line per variant. Declaration order is the category-then-field
/// order used for apportionment and display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CostLineKey {
    PremisesLandBuilding,
    PremisesLeaseRental,
    PremisesConstruction,
    EquipmentMachinery,
    EquipmentFurniture,
    WagesCost,
    WagesRelocation,
    DigitalHardwareSoftware,
    DigitalTools,
    Vehicles,
    InnovationSpecialisedServices,
    InnovationWages,
    InnovationProfessionalFees,
    InnovationRdExpertise,
    InnovationBusinessTravel,
    InnovationIpProtection,
    InnovationMarketing,
    InnovationCertification,
}

impl CostLineKey {
    pub const ALL: [CostLineKey; 18] = [
        CostLineKey::PremisesLandBuilding,
        CostLineKey::PremisesLeaseRental,
        CostLineKey::PremisesConstruction,
        CostLineKey::EquipmentMachinery,
        CostLineKey::EquipmentFurniture,
        CostLineKey::WagesCost,
        CostLineKey::WagesRelocation,
        CostLineKey::DigitalHardwareSoftware,
        CostLineKey::DigitalTools,
        CostLineKey::Vehicles,
        CostLineKey::InnovationSpecialisedServices,
        CostLineKey::InnovationWages,
        CostLineKey::InnovationProfessionalFees,
        CostLineKey::InnovationRdExpertise,
        CostLineKey::InnovationBusinessTravel,
        CostLineKey::InnovationIpProtection,
        CostLineKey::InnovationMarketing,
        CostLineKey::InnovationCertification,
    ];

    pub fn category(self) -> CostCategory {
        match self {
            Self::PremisesLandBuilding | Self::PremisesLeaseRental | Self::PremisesConstruction => {
                CostCategory::Premises
            }
            Self::EquipmentMachinery | Self::EquipmentFurniture => CostCategory::Equipment,
            Self::WagesCost | Self::WagesRelocation => CostCategory::Wages,
            Self::DigitalHardwareSoftware | Self::DigitalTools => CostCategory::Digital,
            Self::Vehicles => CostCategory::Vehicles,
            Self::InnovationSpecialisedServices
            | Self::InnovationWages
            | Self::InnovationProfessionalFees
            | Self::InnovationRdExpertise
            | Self::InnovationBusinessTravel
            | Self::InnovationIpProtection
            | Self::InnovationMarketing
            | Self::InnovationCertification => CostCategory::Innovation,
        }
    }

    /// Display label reported in matched cost categories.
    pub fn label(self) -> &'static str {
        match self {
            Self::PremisesLandBuilding => "Land & Building",
            Self::PremisesLeaseRental => "Lease & Rental",
            Self::PremisesConstruction => "Construction",
            Self::EquipmentMachinery => "Equipment & Machinery",
            Self::EquipmentFurniture => "Furniture & Fixtures",
            Self::WagesCost => "Wage Costs",
            Self::WagesRelocation => "Employee Relocation",
            Self::DigitalHardwareSoftware => "Hardware & Software",
            Self::DigitalTools => "Digital Tools",
            Self::Vehicles => "Vehicles",
            Self::InnovationSpecialisedServices => "Specialised Services",
            Self::InnovationWages => "Innovation Wages",
            Self::InnovationProfessionalFees => "Professional Fees",
            Self::InnovationRdExpertise => "R&D Expertise",
            Self::InnovationBusinessTravel => "Business Travel",
            Self::InnovationIpProtection => "IP Protection",
            Self::InnovationMarketing => "Marketing",
            Self::InnovationCertification => "Certification",
        }
    }

    pub fn kind(self) -> CostKind {
        match self {
            Self::PremisesLeaseRental
            | Self::WagesCost
            | Self::InnovationSpecialisedServices
            | Self::InnovationWages
            | Self::InnovationProfessionalFees
            | Self::InnovationRdExpertise
            | Self::InnovationBusinessTravel
            | Self::InnovationMarketing
            | Self::InnovationCertification => CostKind::Opex,
            _ => CostKind::Capex,
        }
    }

    pub fn as_slug(self) -> &'static str {
        match self {
            Self::PremisesLandBuilding => "premises_land_building",
            Self::PremisesLeaseRental => "premises_lease_rental",
            Self::PremisesConstruction => "premises_construction",
            Self::EquipmentMachinery => "equipment_machinery",
            Self::EquipmentFurniture => "equipment_furniture",
            Self::WagesCost => "wages_cost",
            Self::WagesRelocation => "wages_relocation",
            Self::DigitalHardwareSoftware => "digital_hardware_software",
            Self::DigitalTools => "digital_tools",
            Self::Vehicles => "vehicles",
            Self::InnovationSpecialisedServices => "innovation_specialised_services",
            Self::InnovationWages => "innovation_wages",
            Self::InnovationProfessionalFees => "innovation_professional_fees",
            Self::InnovationRdExpertise => "innovation_rd_expertise",
            Self::InnovationBusinessTravel => "innovation_business_travel",
            Self::InnovationIpProtection => "innovation_ip_protection",
            Self::InnovationMarketing => "innovation_marketing",
            Self::InnovationCertification => "innovation_certification",
        }
    }
}

impl Display for CostLineKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

impl FromStr for CostLineKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|key| key.as_slug() == normalized)
            .ok_or_else(|| ParseError {
                kind: "cost line",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CostItem {
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CostItem {
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            description: None,
        }
    }

    /// Negative amounts never contribute to a total.
    pub fn contribution(&self) -> f64 {
        if self.amount.is_finite() {
            self.amount.max(0.0)
        } else {
            0.0
        }
    }
}

/// Project costs keyed by cost line. Absent lines are zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CostBreakdown {
    lines: BTreeMap<CostLineKey, CostItem>,
}

impl CostBreakdown {
    pub fn from_lines(lines: impl IntoIterator<Item = (CostLineKey, f64)>) -> Self {
        Self {
            lines: lines
                .into_iter()
                .map(|(key, amount)| (key, CostItem::new(amount)))
                .collect(),
        }
    }

    pub fn set(&mut self, key: CostLineKey, item: CostItem) {
        self.lines.insert(key, item);
    }

    pub fn amount(&self, key: CostLineKey) -> f64 {
        self.lines.get(&key).map(|item| item.amount).unwrap_or(0.0)
    }

    /// Lines in category-then-field order.
    pub fn lines(&self) -> impl Iterator<Item = (CostLineKey, &CostItem)> {
        self.lines.iter().map(|(key, item)| (*key, item))
    }

    pub fn total(&self) -> f64 {
        self.lines.values().map(CostItem::contribution).sum()
    }

    pub fn total_capex(&self) -> f64 {
        self.total_of_kind(CostKind::Capex)
    }

    pub fn total_opex(&self) -> f64 {
        self.total_of_kind(CostKind::Opex)
    }

    pub fn category_totals(&self) -> BTreeMap<CostCategory, f64> {
        let mut totals = BTreeMap::new();
        for (key, item) in &self.lines {
            *totals.entry(key.category()).or_insert(0.0) += item.contribution();
        }
        totals
    }

    fn total_of_kind(&self, kind: CostKind) -> f64 {
        self.lines
            .iter()
            .filter(|(key, _)| key.kind() == kind)
            .map(|(_, item)| item.contribution())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_match_serde_names() {
        for key in CostLineKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_slug()));
            assert_eq!(key.as_slug().parse::<CostLineKey>().unwrap(), key);
        }
    }

    #[test]
    fn all_is_in_declaration_order() {
        let mut sorted = CostLineKey::ALL;
        sorted.sort();
        assert_eq!(sorted, CostLineKey::ALL);
    }

    #[test]
    fn totals_ignore_negative_amounts() {
        let costs = CostBreakdown::from_lines([
            (CostLineKey::EquipmentMachinery, 10_000.0),
            (CostLineKey::WagesCost, 4_000.0),
            (CostLineKey::Vehicles, -2_500.0),
        ]);
        assert!((costs.total() - 14_000.0).abs() < 1e-9);
        assert!((costs.total_capex() - 10_000.0).abs() < 1e-9);
        assert!((costs.total_opex() - 4_000.0).abs() < 1e-9);
        assert_eq!(costs.amount(CostLineKey::Vehicles), -2_500.0);
        assert_eq!(costs.amount(CostLineKey::DigitalTools), 0.0);
    }

    #[test]
    fn deserializes_from_flat_map() {
        let costs: CostBreakdown = serde_json::from_value(serde_json::json!({
            "premises_construction": { "amount": 12000.0, "description": "fit-out" },
            "innovation_marketing": { "amount": 3000.0 }
        }))
        .unwrap();
        assert_eq!(costs.amount(CostLineKey::PremisesConstruction), 12_000.0);
        let totals = costs.category_totals();
        assert_eq!(totals.get(&CostCategory::Innovation), Some(&3_000.0));
    }
}
