pub mod legacy;
pub mod schema;
pub mod seed;
pub mod store;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;

pub use schema::{
    AidFramework, CatalogSnapshot, CostFloor, EligibleCostsMap, FundingBounds, GrantScheme,
    RateTable, SpecialThresholds,
};
pub use store::CatalogStore;

/// Reads a JSON array of scheme records, migrating legacy threshold encodings.
pub fn load_catalog_file(path: &Path) -> Result<Vec<GrantScheme>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading catalog: {}", path.display()))?;
    let mut schemes: Vec<GrantScheme> = serde_json::from_str(&data)
        .with_context(|| format!("failed parsing catalog JSON: {}", path.display()))?;
    let migrated = legacy::migrate_catalog(&mut schemes);
    debug!(
        path = %path.display(),
        schemes = schemes.len(),
        migrated,
        "loaded catalog file"
    );
    Ok(schemes)
}

/// Resolves the catalog snapshot for a triage run: an explicit import file
/// when configured, otherwise the catalog database (seeded with the demo
/// catalog on first use when enabled).
pub fn resolve_catalog(config: &Config) -> Result<CatalogSnapshot> {
    if let Some(path) = config.resolved_catalog_import_path() {
        let schemes = load_catalog_file(&path)?;
        return Ok(CatalogSnapshot::with_hash(
            path.display().to_string(),
            schemes,
        ));
    }

    let mut store = CatalogStore::open(&config.resolved_catalog_db_path())?;
    if store.is_empty()? && config.catalog.seed_demo {
        let seeded = store.upsert_all(&seed::demo_catalog())?;
        info!("seeded catalog database with {seeded} demo schemes");
    }
    store.snapshot()
}
