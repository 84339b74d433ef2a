use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_catalog_db_path")]
    pub catalog_db_path: String,
    #[serde(default = "default_leads_db_path")]
    pub leads_db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON catalog read instead of the catalog database when set.
    #[serde(default)]
    pub import_path: String,
    #[serde(default = "default_true")]
    pub seed_demo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_true")]
    pub enable_stdout: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<String>,
    pub catalog_db_path: Option<String>,
    pub leads_db_path: Option<String>,
    pub webhook_url: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/grant-triage/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(path) = overrides.catalog_path {
            self.catalog.import_path = path;
        }
        if let Some(path) = overrides.catalog_db_path {
            self.storage.catalog_db_path = path;
        }
        if let Some(path) = overrides.leads_db_path {
            self.storage.leads_db_path = path;
        }
        if let Some(url) = overrides.webhook_url {
            self.report.webhook_url = url;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_catalog_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.catalog_db_path)
    }

    pub fn resolved_leads_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.leads_db_path)
    }

    pub fn resolved_catalog_import_path(&self) -> Option<PathBuf> {
        let trimmed = self.catalog.import_path.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(expand_tilde(trimmed))
        }
    }

    pub fn webhook_url(&self) -> Option<&str> {
        let trimmed = self.report.webhook_url.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn default_template() -> String {
        let template = r#"[storage]
catalog_db_path = "~/.local/share/grant-triage/catalog.db"
leads_db_path = "~/.local/share/grant-triage/leads.db"

[catalog]
# JSON array of grant schemes; overrides the catalog database when set
import_path = ""
seed_demo = true

[report]
top_n = 5
max_requests = 3
window_secs = 3600
webhook_url = ""
enable_stdout = true

[server]
host = "127.0.0.1"
port = 8080
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_db_path: default_catalog_db_path(),
            leads_db_path: default_leads_db_path(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            import_path: String::new(),
            seed_demo: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            webhook_url: String::new(),
            enable_stdout: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_catalog_db_path() -> String {
    "~/.local/share/grant-triage/catalog.db".to_string()
}

fn default_leads_db_path() -> String {
    "~/.local/share/grant-triage/leads.db".to_string()
}

fn default_top_n() -> usize {
    5
}

fn default_max_requests() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    3600
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}
