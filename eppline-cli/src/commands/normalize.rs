//! `eppline normalize`: replay a recorded response through the normalizer.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;
use serde_json::Value;

use eppline_core::views::DomainView;
use eppline_core::{ProviderId, RegistryProfile};
use eppline_normalize as normalize;

use super::load_catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResponseKind {
    CheckDomain,
    CheckHost,
    InfoDomain,
    InfoContact,
    InfoHost,
    CreateDomain,
    CreateContact,
    CreateHost,
}

/// Arguments for `eppline normalize`.
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Which response the file holds.
    #[arg(value_enum)]
    pub kind: ResponseKind,

    /// Decoded response tree, as JSON or YAML.
    pub file: PathBuf,

    /// Registry the response came from (required for info responses).
    #[arg(long)]
    pub provider: Option<String>,

    /// Provider config used to look up the registry's disclose polarity.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep fields only the sponsoring client may see.
    #[arg(long)]
    pub privileged: bool,

    /// Show a contact the way a non-owner would see it.
    #[arg(long)]
    pub public: bool,
}

impl NormalizeArgs {
    pub fn run(self) -> Result<()> {
        let raw = read_tree(&self.file)?;
        let out = self.normalize(&raw).with_context(|| {
            format!(
                "could not normalize {} as {:?}",
                self.file.display(),
                self.kind
            )
        })?;
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("failed to serialize output")?
        );
        Ok(())
    }

    fn normalize(&self, raw: &Value) -> Result<Value> {
        match self.kind {
            ResponseKind::CheckDomain => to_json(normalize::normalize_check_domain(raw)?),
            ResponseKind::CheckHost => to_json(normalize::normalize_check_host(raw)?),
            ResponseKind::InfoDomain => {
                let domain =
                    normalize::normalize_info_domain(raw, &self.provider_id()?, self.privileged)?;
                to_json(DomainView::from(&domain))
            }
            ResponseKind::InfoContact => {
                let profile = self.profile()?;
                let contact = normalize::normalize_info_contact(raw, &profile)?;
                if self.public {
                    to_json(contact.public_view(profile.undeclared_disclosed))
                } else {
                    to_json(contact.owner_view())
                }
            }
            ResponseKind::InfoHost => {
                to_json(normalize::normalize_info_host(raw, &self.provider_id()?)?)
            }
            ResponseKind::CreateDomain => to_json(normalize::normalize_create_domain(raw)?),
            ResponseKind::CreateContact => to_json(normalize::normalize_create_contact(raw)?),
            ResponseKind::CreateHost => to_json(normalize::normalize_create_host(raw)?),
        }
    }

    fn provider_id(&self) -> Result<ProviderId> {
        match &self.provider {
            Some(id) => Ok(ProviderId::from(id.as_str())),
            None => bail!("--provider is required for {:?} responses", self.kind),
        }
    }

    /// The configured profile when `--config` is given, defaults otherwise.
    fn profile(&self) -> Result<RegistryProfile> {
        let id = self.provider_id()?;
        match &self.config {
            Some(path) => {
                let catalog = load_catalog(Some(path))?;
                Ok(catalog.profile(&id)?.clone())
            }
            None => Ok(RegistryProfile::new(id, &[])),
        }
    }
}

fn to_json(value: impl Serialize) -> Result<Value> {
    serde_json::to_value(value).context("failed to encode canonical record")
}

/// Read a response tree; `.json` files as JSON, anything else as YAML.
pub fn read_tree(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    if is_json {
        serde_json::from_str(&contents)
            .with_context(|| format!("{} is not valid JSON", path.display()))
    } else {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("{} is not valid YAML", path.display()))
    }
}
