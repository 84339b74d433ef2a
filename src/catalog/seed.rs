use crate::catalog::schema::{
    AidFramework, CostFloor, FundingBounds, GrantScheme, RateTable, SpecialThresholds,
};
use crate::profile::{CostLineKey, LegalStructure, RegistrationStatus};

/// Demo catalog used when no catalog has been imported yet.
pub fn demo_catalog() -> Vec<GrantScheme> {
    vec![
        business_start(),
        startup_finance(),
        business_development(),
        sme_enhance(),
        invest_2024(),
        digitalise_your_business(),
    ]
}

fn business_start() -> GrantScheme {
    let mut scheme = GrantScheme::new("business-start", "Business Start")
        .with_code("MEA-BSTART")
        .with_rates(RateTable {
            standard: Some(1.0),
            ..RateTable::default()
        })
        .with_funding(FundingBounds {
            max_grant_amount: Some(25_000.0),
            ..FundingBounds::default()
        })
        .with_eligible_costs([
            CostLineKey::PremisesLeaseRental,
            CostLineKey::EquipmentMachinery,
            CostLineKey::EquipmentFurniture,
            CostLineKey::DigitalHardwareSoftware,
            CostLineKey::DigitalTools,
            CostLineKey::WagesCost,
        ]);
    scheme.description = Some("Support for early-stage micro enterprises".to_string());
    scheme.micro_only = true;
    scheme.sme_only = true;
    scheme.startup_required = true;
    scheme.aid_framework = Some(AidFramework::DeMinimis);
    scheme.allowed_registration_statuses = vec![
        RegistrationStatus::Registered,
        RegistrationStatus::InProgress,
        RegistrationStatus::NotRegistered,
    ];
    scheme
}

fn startup_finance() -> GrantScheme {
    let mut scheme = GrantScheme::new("startup-finance", "Startup Finance")
        .with_code("MEA-SUF")
        .with_rates(RateTable {
            startup: Some(0.6),
            standard: Some(0.5),
            ..RateTable::default()
        })
        .with_funding(FundingBounds {
            min_investment_required: Some(20_000.0),
            max_grant_amount: Some(800_000.0),
            ..FundingBounds::default()
        })
        .with_eligible_costs([
            CostLineKey::EquipmentMachinery,
            CostLineKey::DigitalHardwareSoftware,
            CostLineKey::WagesCost,
            CostLineKey::InnovationRdExpertise,
            CostLineKey::InnovationIpProtection,
            CostLineKey::InnovationProfessionalFees,
        ]);
    scheme.sme_only = true;
    scheme.startup_required = true;
    scheme.aid_framework = Some(AidFramework::Gber);
    scheme.allowed_legal_structures = vec![LegalStructure::LimitedCompany];
    scheme
}

fn business_development() -> GrantScheme {
    let mut scheme = GrantScheme::new("business-development", "Business Development")
        .with_code("MEA-BD")
        .with_rates(RateTable {
            standard: Some(0.3),
            sme: Some(0.45),
            sme_gozo: Some(0.55),
            large_entity: Some(0.3),
            large_entity_gozo: Some(0.4),
            ..RateTable::default()
        })
        .with_funding(FundingBounds {
            max_grant_amount: Some(1_500_000.0),
            ..FundingBounds::default()
        })
        .with_eligible_costs([
            CostLineKey::PremisesLandBuilding,
            CostLineKey::PremisesConstruction,
            CostLineKey::EquipmentMachinery,
            CostLineKey::EquipmentFurniture,
            CostLineKey::DigitalHardwareSoftware,
            CostLineKey::WagesCost,
            CostLineKey::WagesRelocation,
        ]);
    scheme.aid_framework = Some(AidFramework::Gber);
    scheme
}

fn sme_enhance() -> GrantScheme {
    let mut thresholds = SpecialThresholds::new("SME Enhance");
    thresholds.min_project_cost = Some(CostFloor::inclusive(10_000.0));
    thresholds.min_grant_amount = Some(10_000.0);

    let mut scheme = GrantScheme::new("sme-enhance", "SME Enhance")
        .with_code("MEA-SME-ENHANCE")
        .with_rates(RateTable {
            sme: Some(0.5),
            sme_gozo: Some(0.6),
            ..RateTable::default()
        })
        .with_funding(FundingBounds {
            max_grant_amount: Some(200_000.0),
            ..FundingBounds::default()
        })
        .with_eligible_costs([
            CostLineKey::EquipmentMachinery,
            CostLineKey::DigitalHardwareSoftware,
            CostLineKey::DigitalTools,
            CostLineKey::InnovationSpecialisedServices,
            CostLineKey::InnovationCertification,
        ]);
    scheme.sme_only = true;
    scheme.aid_framework = Some(AidFramework::DeMinimis);
    scheme.special_thresholds = Some(thresholds);
    scheme
}

fn invest_2024() -> GrantScheme {
    let mut thresholds = SpecialThresholds::new("Invest 2024");
    thresholds.sme_min_project_cost = Some(CostFloor::exclusive(50_000.0));
    thresholds.large_min_project_cost = Some(CostFloor::exclusive(500_000.0));

    let mut scheme = GrantScheme::new("invest-2024", "Invest 2024")
        .with_code("MEA-INVEST")
        .with_rates(RateTable {
            standard: Some(0.2),
            sme: Some(0.5),
            sme_gozo: Some(0.65),
            large_entity: Some(0.3),
            large_entity_gozo: Some(0.45),
            hospitality: Some(0.25),
            ..RateTable::default()
        })
        .with_funding(FundingBounds {
            max_grant_amount: Some(2_000_000.0),
            ..FundingBounds::default()
        })
        .with_eligible_costs([
            CostLineKey::PremisesLandBuilding,
            CostLineKey::PremisesConstruction,
            CostLineKey::EquipmentMachinery,
            CostLineKey::EquipmentFurniture,
            CostLineKey::DigitalHardwareSoftware,
            CostLineKey::Vehicles,
        ]);
    scheme.aid_framework = Some(AidFramework::Gber);
    scheme.special_thresholds = Some(thresholds);
    scheme
}

fn digitalise_your_business() -> GrantScheme {
    let mut scheme = GrantScheme::new("digitalise", "Digitalise Your Business")
        .with_code("MDIA-DYB")
        .with_rates(RateTable {
            standard: Some(0.5),
            sme_gozo: Some(0.6),
            ..RateTable::default()
        })
        .with_funding(FundingBounds {
            min_grant_amount: Some(1_000.0),
            max_grant_amount: Some(15_000.0),
            ..FundingBounds::default()
        })
        .with_eligible_costs([
            CostLineKey::DigitalHardwareSoftware,
            CostLineKey::DigitalTools,
            CostLineKey::InnovationProfessionalFees,
        ]);
    scheme.sme_only = true;
    scheme.aid_framework = Some(AidFramework::DeMinimis);
    scheme
}
