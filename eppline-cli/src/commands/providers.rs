//! `eppline providers`: the configured registry catalog.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use eppline_core::{DisclosePolarity, ProviderCatalog};

use super::load_catalog;

/// Arguments for `eppline providers`.
#[derive(Args, Debug)]
pub struct ProvidersArgs {
    /// Provider config file (defaults to `~/.eppline/providers.yaml`).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ProvidersArgs {
    pub fn run(self) -> Result<()> {
        let catalog = load_catalog(self.config.as_deref())?;
        if self.json {
            return print_json(&catalog);
        }
        print_table(&catalog);
        Ok(())
    }
}

#[derive(Serialize)]
struct ProviderJson<'a> {
    id: &'a str,
    name: &'a str,
    active: bool,
    zones: &'a [String],
    disclose_flag: &'static str,
    max_attempts: u32,
}

#[derive(Tabled)]
struct ProviderRow {
    #[tabled(rename = "provider")]
    id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "active")]
    active: String,
    #[tabled(rename = "zones")]
    zones: String,
    #[tabled(rename = "disclose flag")]
    disclose_flag: &'static str,
    #[tabled(rename = "attempts")]
    max_attempts: u32,
}

fn polarity_label(polarity: DisclosePolarity) -> &'static str {
    match polarity {
        DisclosePolarity::FlagMeansDisclosed => "1 = disclosed",
        DisclosePolarity::FlagMeansHidden => "1 = hidden",
    }
}

fn print_json(catalog: &ProviderCatalog) -> Result<()> {
    let payload: Vec<ProviderJson<'_>> = catalog
        .providers
        .iter()
        .map(|p| ProviderJson {
            id: &p.id.0,
            name: &p.name,
            active: p.active,
            zones: &p.zones,
            disclose_flag: polarity_label(p.disclose_polarity),
            max_attempts: p.retry.max_attempts,
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize provider JSON")?
    );
    Ok(())
}

fn print_table(catalog: &ProviderCatalog) {
    let active = catalog.active().count();
    println!(
        "eppline v{} | {} providers | {} active",
        env!("CARGO_PKG_VERSION"),
        catalog.providers.len(),
        active,
    );
    if catalog.providers.is_empty() {
        println!("No providers configured.");
        return;
    }

    let rows: Vec<ProviderRow> = catalog
        .providers
        .iter()
        .map(|p| ProviderRow {
            id: p.id.0.clone(),
            name: p.name.clone(),
            active: if p.active {
                "yes".green().to_string()
            } else {
                "no".bright_black().to_string()
            },
            zones: p.zones.join(", "),
            disclose_flag: polarity_label(p.disclose_polarity),
            max_attempts: p.retry.max_attempts,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
