//! Bulk availability: one label checked in every zone of every active
//! provider, concurrently.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use eppline_core::names;
use eppline_core::{AvailabilityResult, Caller, Fault, FaultClass, FaultKind, ProviderCatalog, ProviderId};

use crate::chain::Chain;
use crate::executor::ChainExecutor;

/// One entry of a bulk result, in provider-then-zone order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkItem {
    Checked {
        provider: ProviderId,
        #[serde(flatten)]
        result: AvailabilityResult,
    },
    Failed {
        provider: ProviderId,
        domain: String,
        kind: FaultKind,
        class: FaultClass,
        message: String,
    },
}

impl BulkItem {
    pub fn provider(&self) -> &ProviderId {
        match self {
            BulkItem::Checked { provider, .. } | BulkItem::Failed { provider, .. } => provider,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BulkItem::Failed { .. })
    }
}

struct Branch {
    provider: ProviderId,
    domain: String,
}

/// Check `label` in every zone served by every active provider.
///
/// A failing branch becomes a [`BulkItem::Failed`] entry. When every branch
/// fails the first branch's fault is returned instead; with no branches at
/// all the result is empty.
pub async fn bulk_availability(
    executor: &ChainExecutor,
    catalog: &ProviderCatalog,
    label: &str,
    caller: Caller,
) -> Result<Vec<BulkItem>, Fault> {
    let label = names::normalize_label(label)?;

    let mut branches = Vec::new();
    let mut chains = Vec::new();
    for profile in catalog.active() {
        for zone in &profile.zones {
            let domain = format!("{label}.{zone}");
            chains.push(Chain::check_domains(
                profile.id.clone(),
                vec![domain.clone()],
                caller,
            ));
            branches.push(Branch {
                provider: profile.id.clone(),
                domain,
            });
        }
    }
    if chains.is_empty() {
        return Ok(Vec::new());
    }

    let results = executor.submit_group(chains).await.await_all().await;
    let total = results.len();

    let mut items = Vec::with_capacity(results.len());
    let mut first_fault = None;
    let mut failures = 0usize;
    for (branch, result) in branches.into_iter().zip(results) {
        match result {
            Ok(ctx) => items.extend(ctx.availability.into_iter().map(|result| BulkItem::Checked {
                provider: branch.provider.clone(),
                result,
            })),
            Err(err) => {
                failures += 1;
                warn!(
                    provider = %branch.provider,
                    domain = %branch.domain,
                    kind = %err.kind(),
                    "availability branch failed"
                );
                items.push(BulkItem::Failed {
                    provider: branch.provider,
                    domain: branch.domain,
                    kind: err.kind(),
                    class: err.class(),
                    message: err.fault.to_string(),
                });
                first_fault.get_or_insert(err.fault);
            }
        }
    }

    if failures == total {
        if let Some(fault) = first_fault {
            return Err(fault);
        }
    }
    info!(label = %label, entries = items.len(), failures, "bulk availability complete");
    Ok(items)
}
