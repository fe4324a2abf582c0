//! Error types for eppline-workflow.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use eppline_core::{Fault, FaultClass, FaultKind};

/// Which workflow a chain implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainKind {
    CreateDomain,
    CreateHost,
    CheckDomains,
}

impl ChainKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChainKind::CreateDomain => "create-domain",
            ChainKind::CreateHost => "create-host",
            ChainKind::CheckDomains => "check-domains",
        }
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chain stopped at `step` with an already-classified fault.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{chain} chain failed at step '{step}': {fault}")]
pub struct ChainError {
    pub chain: ChainKind,
    pub step: &'static str,
    #[source]
    pub fault: Fault,
}

impl ChainError {
    pub fn new(chain: ChainKind, step: &'static str, fault: Fault) -> Self {
        Self { chain, step, fault }
    }

    /// The executor went away before the chain reported back.
    pub fn executor_stopped(chain: ChainKind) -> Self {
        Self::new(
            chain,
            "dispatch",
            Fault::Internal("chain executor stopped before the chain completed".into()),
        )
    }

    pub fn kind(&self) -> FaultKind {
        self.fault.kind()
    }

    pub fn class(&self) -> FaultClass {
        self.fault.class()
    }
}
