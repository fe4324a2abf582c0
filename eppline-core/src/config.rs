//! Provider catalog: which registries exist, which zones they serve, and the
//! per-registry quirks the normalizer and workflows must honour.
//!
//! # Storage layout
//!
//! ```text
//! ~/.eppline/
//!   providers.yaml
//! ```
//!
//! # API pattern
//!
//! Every loader has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Fault};
use crate::names;
use crate::types::ProviderId;

// ---------------------------------------------------------------------------
// 1. Types
// ---------------------------------------------------------------------------

/// How a registry interprets the single flag bit on a disclose block.
///
/// Registries disagree, so this is configured per provider rather than
/// assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisclosePolarity {
    /// `flag="1"` lists attributes that may be shown.
    #[default]
    FlagMeansDisclosed,
    /// `flag="1"` lists attributes that must be hidden.
    FlagMeansHidden,
}

impl DisclosePolarity {
    /// Disclosure value for every attribute listed under a block with `flag`.
    pub fn disclosed(self, flag: bool) -> bool {
        match self {
            DisclosePolarity::FlagMeansDisclosed => flag,
            DisclosePolarity::FlagMeansHidden => !flag,
        }
    }
}

/// Transport retry settings, stored in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

impl RetrySettings {
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_backoff_ms() -> u64 {
    200
}
fn default_max_backoff_ms() -> u64 {
    2_000
}
fn default_attempt_timeout_ms() -> u64 {
    10_000
}
fn default_true() -> bool {
    true
}
fn default_max_concurrent_chains() -> usize {
    16
}

/// Per-registry behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryProfile {
    pub id: ProviderId,
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Zones this registry serves, in display order, without leading dots.
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default)]
    pub disclose_polarity: DisclosePolarity,
    /// Disclosure assumed for attributes the registry did not report.
    #[serde(default = "default_true")]
    pub undeclared_disclosed: bool,
    #[serde(default)]
    pub retry: RetrySettings,
}

impl RegistryProfile {
    /// Minimal active profile with defaults for everything but id and zones.
    pub fn new(id: impl Into<ProviderId>, zones: &[&str]) -> Self {
        let id = id.into();
        Self {
            name: id.0.clone(),
            id,
            active: true,
            zones: zones.iter().map(|z| (*z).to_owned()).collect(),
            disclose_polarity: DisclosePolarity::default(),
            undeclared_disclosed: true,
            retry: RetrySettings::default(),
        }
    }

    pub fn serves(&self, zone: &str) -> bool {
        self.zones.iter().any(|z| z == zone)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorSettings {
    #[serde(default = "default_max_concurrent_chains")]
    pub max_concurrent_chains: usize,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            max_concurrent_chains: default_max_concurrent_chains(),
        }
    }
}

/// Root of `providers.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderCatalog {
    #[serde(default)]
    pub executor: ExecutorSettings,
    #[serde(default)]
    pub providers: Vec<RegistryProfile>,
}

// ---------------------------------------------------------------------------
// 2. Lookups
// ---------------------------------------------------------------------------

impl ProviderCatalog {
    pub fn new(providers: Vec<RegistryProfile>) -> Result<Self, ConfigError> {
        let mut catalog = Self {
            executor: ExecutorSettings::default(),
            providers,
        };
        catalog.normalize_zones()?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn profile(&self, id: &ProviderId) -> Result<&RegistryProfile, Fault> {
        self.providers
            .iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| Fault::UnknownRegistry {
                provider: id.clone(),
            })
    }

    /// Active providers, in configuration order.
    pub fn active(&self) -> impl Iterator<Item = &RegistryProfile> {
        self.providers.iter().filter(|p| p.active)
    }

    /// Find the active registry and zone for a normalized FQDN.
    ///
    /// The longest matching zone wins, so `a.co.nz` resolves to `co.nz`
    /// before `nz`.
    pub fn resolve_zone(&self, fqdn: &str) -> Result<(&RegistryProfile, String), Fault> {
        self.active()
            .flat_map(|p| p.zones.iter().map(move |z| (p, z)))
            .filter(|(_, zone)| names::is_within_zone(fqdn, zone))
            .max_by_key(|(_, zone)| zone.len())
            .map(|(p, zone)| (p, zone.clone()))
            .ok_or_else(|| Fault::UnsupportedZone {
                zone: names::parent_of(fqdn).unwrap_or(fqdn).to_owned(),
            })
    }

    /// Lower-case every zone and drop a trailing root dot, so zones compare
    /// equal to normalized FQDNs.
    fn normalize_zones(&mut self) -> Result<(), ConfigError> {
        for p in &mut self.providers {
            for zone in &mut p.zones {
                if zone.starts_with('.') {
                    return Err(ConfigError::Invalid(format!(
                        "provider '{}' has malformed zone '{zone}'",
                        p.id
                    )));
                }
                *zone = names::normalize_fqdn(zone).map_err(|e| {
                    ConfigError::Invalid(format!("provider '{}' has malformed zone: {e}", p.id))
                })?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for p in &self.providers {
            if p.id.0.trim().is_empty() {
                return Err(ConfigError::Invalid("provider id must not be empty".into()));
            }
            if !seen.insert(&p.id) {
                return Err(ConfigError::Invalid(format!("duplicate provider id '{}'", p.id)));
            }
            if p.active && p.zones.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "active provider '{}' serves no zones",
                    p.id
                )));
            }
            if p.retry.max_attempts == 0 {
                return Err(ConfigError::Invalid(format!(
                    "provider '{}' retry.max_attempts must be at least 1",
                    p.id
                )));
            }
        }
        if self.executor.max_concurrent_chains == 0 {
            return Err(ConfigError::Invalid(
                "executor.max_concurrent_chains must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// `<home>/.eppline/providers.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".eppline").join("providers.yaml")
}

/// Load and validate a catalog from an explicit file.
pub fn load_file(path: &Path) -> Result<ProviderCatalog, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let mut catalog: ProviderCatalog = serde_yaml::from_str(&contents).map_err(|e| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    catalog.normalize_zones()?;
    catalog.validate()?;
    Ok(catalog)
}

/// Load `<home>/.eppline/providers.yaml`.
pub fn load_at(home: &Path) -> Result<ProviderCatalog, ConfigError> {
    load_file(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<ProviderCatalog, ConfigError> {
    load_at(&home()?)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
