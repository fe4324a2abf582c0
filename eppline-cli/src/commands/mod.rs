pub mod check;
pub mod normalize;
pub mod providers;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use eppline_core::{config, ProviderCatalog};

/// Load the catalog from `--config`, or from `~/.eppline/providers.yaml`.
pub fn load_catalog(path: Option<&Path>) -> Result<ProviderCatalog> {
    match path {
        Some(path) => config::load_file(path)
            .with_context(|| format!("failed to load provider config {}", path.display())),
        None => {
            let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
            config::load_at(&home).with_context(|| {
                format!(
                    "failed to load {}; pass --config or create it",
                    config::config_path_at(&home).display()
                )
            })
        }
    }
}
