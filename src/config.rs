//! # Configuration
//!
//! Server settings, read from an optional TOML file. Every field has a
//! default, so an empty file (or no file) is a valid configuration.
//!
//! ```toml
//! [server]
//! listen_addr = "0.0.0.0:8080"
//!
//! [store]
//! backend = "supabase"
//! url = "https://project.supabase.co"
//! api_key = "..."
//!
//! [export]
//! public_base_url = "https://menufacil.app"
//!
//! [rate_limit]
//! requests = 30
//! window_secs = 60
//! ```

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::error::{MenuFacilError, Result};
use crate::payload::menu_url;
use crate::store::{MemoryStore, QrCodeStore, SupabaseStore};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub store: StoreSection,
    pub export: ExportSection,
    pub rate_limit: RateLimitSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub listen_addr: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Supabase,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub api_key: Option<String>,
}

impl StoreSection {
    /// Build the configured store.
    pub fn build(&self) -> Result<Arc<dyn QrCodeStore>> {
        match self.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreBackend::Supabase => {
                let url = self.url.as_deref().ok_or_else(|| {
                    MenuFacilError::Config("store.url is required for supabase".to_string())
                })?;
                let key = self.api_key.as_deref().ok_or_else(|| {
                    MenuFacilError::Config("store.api_key is required for supabase".to_string())
                })?;
                Ok(Arc::new(SupabaseStore::new(url, key)?))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Origin used to build menu URLs
    pub public_base_url: String,
}

impl ExportSection {
    /// Public URL of a menu under the configured origin.
    pub fn menu_url(&self, menu_id: &str, table: Option<u32>) -> String {
        menu_url(&self.public_base_url, menu_id, table)
    }
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            public_base_url: "https://menufacil.app".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    /// Requests allowed per client per window; 0 disables limiting
    pub requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            requests: 30,
            window_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| MenuFacilError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MenuFacilError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
