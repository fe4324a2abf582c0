//! `eppline check`: bulk availability replayed from recorded responses.
//!
//! # Fixture format
//!
//! ```yaml
//! responses:
//!   - registry: centralnic
//!     command: checkDomain
//!     name: example.xyz          # optional; matches a name in the payload
//!     response: { ... }          # decoded response tree
//!   - registry: nzrs
//!     command: checkDomain
//!     name: example.nz
//!     error: { kind: network, message: connection reset }
//! ```
//!
//! The first matching entry answers a call. Calls with no matching entry are
//! rejected by the "registry" with a command-failed result code.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::Args;
use colored::Colorize;
use serde::Deserialize;
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

use eppline_core::{
    Caller, Command, ProviderCatalog, ProviderId, RegistryTransport, ResultCode, TransportError,
};
use eppline_workflow::{
    bulk_availability, BulkItem, ChainExecutor, ContactResolver, MemoryHandleStore,
    MemoryLocalState, MemoryPersonDirectory, Orchestrator, RegistryGateway, RetryingTransport,
};

use super::load_catalog;

/// Arguments for `eppline check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Label to check, without any zone (e.g. `example`).
    pub label: String,

    /// YAML file of recorded registry responses.
    #[arg(long)]
    pub fixtures: PathBuf,

    /// Provider config file (defaults to `~/.eppline/providers.yaml`).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let catalog = load_catalog(self.config.as_deref())?;
        let transport = FixtureTransport::load(&self.fixtures)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        let items = runtime.block_on(check(catalog, transport, &self.label))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&items).context("failed to serialize results")?
            );
            return Ok(());
        }
        print_table(&self.label, &items);
        Ok(())
    }
}

async fn check(
    catalog: ProviderCatalog,
    transport: FixtureTransport,
    label: &str,
) -> Result<Vec<BulkItem>> {
    let max_concurrent = catalog.executor.max_concurrent_chains;
    let transport = Arc::new(RetryingTransport::from_catalog(transport, &catalog));
    let catalog = Arc::new(catalog);

    let gateway = Arc::new(RegistryGateway::new(catalog.clone(), transport));
    let resolver = Arc::new(ContactResolver::new(
        gateway.clone(),
        Arc::new(MemoryPersonDirectory::new([])),
        Arc::new(MemoryHandleStore::new()),
    ));
    let orchestrator = Arc::new(Orchestrator::new(
        gateway,
        resolver,
        Arc::new(MemoryLocalState::new()),
    ));
    let executor = ChainExecutor::start(orchestrator, max_concurrent);

    let items = bulk_availability(&executor, &catalog, label, Caller::user(0u64))
        .await
        .with_context(|| format!("availability check for '{label}' failed"))?;
    Ok(items)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "provider")]
    provider: String,
    #[tabled(rename = "domain")]
    domain: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_table(label: &str, items: &[BulkItem]) {
    if items.is_empty() {
        println!("No active providers configured.");
        return;
    }
    let available = items
        .iter()
        .filter(|i| matches!(i, BulkItem::Checked { result, .. } if result.available))
        .count();
    let failed = items.iter().filter(|i| i.is_failed()).count();
    println!(
        "{} | {} available | {} taken | {} failed",
        label.bold(),
        available,
        items.len() - available - failed,
        failed,
    );

    let rows: Vec<CheckRow> = items
        .iter()
        .map(|item| match item {
            BulkItem::Checked { provider, result } => CheckRow {
                provider: provider.0.clone(),
                domain: result.name.clone(),
                status: if result.available {
                    "AVAILABLE".green().bold().to_string()
                } else {
                    "TAKEN".yellow().bold().to_string()
                },
                detail: result.reason.clone().unwrap_or_default(),
            },
            BulkItem::Failed {
                provider,
                domain,
                kind,
                message,
                ..
            } => CheckRow {
                provider: provider.0.clone(),
                domain: domain.clone(),
                status: "FAILED".red().bold().to_string(),
                detail: format!("{kind}: {message}"),
            },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

// ---------------------------------------------------------------------------
// Replay transport
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    responses: Vec<Fixture>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    registry: ProviderId,
    command: Command,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    error: Option<FixtureError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum FixtureError {
    Network { message: String },
    Timeout { after_ms: u64 },
    Rejected {
        code: u16,
        #[serde(default)]
        message: String,
    },
}

impl Fixture {
    fn matches(&self, registry: &ProviderId, command: Command, payload: &Value) -> bool {
        self.registry == *registry
            && self.command == command
            && self
                .name
                .as_deref()
                .map_or(true, |name| mentions(payload, name))
    }

    fn replay(&self, registry: &ProviderId) -> Result<Value, TransportError> {
        match (&self.response, &self.error) {
            (_, Some(FixtureError::Network { message })) => Err(TransportError::Network {
                registry: registry.clone(),
                message: message.clone(),
            }),
            (_, Some(FixtureError::Timeout { after_ms })) => Err(TransportError::Timeout {
                registry: registry.clone(),
                after: Duration::from_millis(*after_ms),
            }),
            (_, Some(FixtureError::Rejected { code, message })) => Err(TransportError::Registry {
                registry: registry.clone(),
                code: ResultCode(*code),
                message: message.clone(),
            }),
            (Some(response), None) => Ok(response.clone()),
            (None, None) => Ok(Value::Null),
        }
    }
}

/// Top-level payload fields naming `name`, either directly or in a list.
fn mentions(payload: &Value, name: &str) -> bool {
    let Some(fields) = payload.as_object() else {
        return false;
    };
    fields.values().any(|v| match v {
        Value::String(s) => s.eq_ignore_ascii_case(name),
        Value::Array(items) => items
            .iter()
            .any(|i| i.as_str().is_some_and(|s| s.eq_ignore_ascii_case(name))),
        _ => false,
    })
}

/// Answers calls from a fixture file instead of a live registry.
pub struct FixtureTransport {
    fixtures: Vec<Fixture>,
}

impl FixtureTransport {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixtures {}", path.display()))?;
        let file: FixtureFile = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse fixtures {}", path.display()))?;
        for (i, f) in file.responses.iter().enumerate() {
            if f.response.is_none() && f.error.is_none() {
                bail!(
                    "fixture #{} ({} {}) has neither a response nor an error",
                    i + 1,
                    f.registry,
                    f.command
                );
            }
        }
        Ok(Self {
            fixtures: file.responses,
        })
    }
}

#[async_trait]
impl RegistryTransport for FixtureTransport {
    async fn call(
        &self,
        registry: &ProviderId,
        command: Command,
        payload: Value,
    ) -> Result<Value, TransportError> {
        match self
            .fixtures
            .iter()
            .find(|f| f.matches(registry, command, &payload))
        {
            Some(fixture) => {
                debug!(registry = %registry, command = %command, "replaying recorded response");
                fixture.replay(registry)
            }
            None => Err(TransportError::Registry {
                registry: registry.clone(),
                code: ResultCode::COMMAND_FAILED,
                message: format!("no recorded {command} response"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(name: Option<&str>) -> Fixture {
        Fixture {
            registry: ProviderId::from("centralnic"),
            command: Command::CheckDomain,
            name: name.map(str::to_owned),
            response: Some(json!({"ok": true})),
            error: None,
        }
    }

    #[test]
    fn name_matches_list_payloads() {
        let payload = json!({"domain": ["example.xyz"]});
        let registry = ProviderId::from("centralnic");
        assert!(fixture(Some("example.xyz")).matches(&registry, Command::CheckDomain, &payload));
        assert!(!fixture(Some("example.space")).matches(&registry, Command::CheckDomain, &payload));
        assert!(fixture(None).matches(&registry, Command::CheckDomain, &payload));
        assert!(!fixture(None).matches(&registry, Command::InfoDomain, &payload));
    }

    #[test]
    fn error_fixture_takes_precedence() {
        let mut f = fixture(None);
        f.error = Some(FixtureError::Rejected {
            code: 2302,
            message: "exists".into(),
        });
        let err = f.replay(&ProviderId::from("centralnic")).unwrap_err();
        assert!(!err.is_transient());
    }
}
