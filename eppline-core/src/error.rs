//! Error types for eppline-core.
//!
//! [`Fault`] is the closed, classified taxonomy every layer returns across a
//! workflow boundary. [`TransportError`] is what an injected transport raises;
//! [`Fault::from_transport`] is the single place it gets classified.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProviderId;

// ---------------------------------------------------------------------------
// Protocol result codes
// ---------------------------------------------------------------------------

/// Numeric result code carried by a registry response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultCode(pub u16);

impl ResultCode {
    pub const AUTHENTICATION_ERROR: ResultCode = ResultCode(2200);
    pub const AUTHORIZATION_ERROR: ResultCode = ResultCode(2201);
    pub const INVALID_AUTH_INFO: ResultCode = ResultCode(2202);
    pub const OBJECT_EXISTS: ResultCode = ResultCode(2302);
    pub const OBJECT_DOES_NOT_EXIST: ResultCode = ResultCode(2303);
    pub const COMMAND_FAILED: ResultCode = ResultCode(2400);

    pub fn is_success(self) -> bool {
        (1000..2000).contains(&self.0)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of registry object an operation targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Domain,
    Contact,
    Host,
}

impl ObjectKind {
    /// Namespace prefix used for this object's keys in raw responses.
    pub fn namespace(self) -> &'static str {
        match self {
            ObjectKind::Domain => "domain",
            ObjectKind::Contact => "contact",
            ObjectKind::Host => "host",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failures raised by a [`crate::ports::RegistryTransport`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, reset, TLS failure and similar.
    #[error("network failure talking to {registry}: {message}")]
    Network { registry: ProviderId, message: String },

    #[error("call to {registry} timed out after {after:?}")]
    Timeout { registry: ProviderId, after: Duration },

    /// The transport has no connection pool for this registry.
    #[error("no transport configured for registry {registry}")]
    UnknownRegistry { registry: ProviderId },

    /// The registry answered with a non-success result code.
    #[error("registry {registry} rejected the command with {code}: {message}")]
    Registry {
        registry: ProviderId,
        code: ResultCode,
        message: String,
    },
}

impl TransportError {
    /// Transient failures a retry policy may repeat.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Network { .. } | TransportError::Timeout { .. })
    }
}

// ---------------------------------------------------------------------------
// Fault taxonomy
// ---------------------------------------------------------------------------

/// Every failure a normalizer, resolver, gateway or workflow step can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Fault {
    /// The registry returned a structurally invalid payload.
    #[error("malformed {object} response: {detail}")]
    MalformedResponse { object: ObjectKind, detail: String },

    #[error("unknown registry '{provider}'")]
    UnknownRegistry { provider: ProviderId },

    #[error("zone '{zone}' is not served by any configured registry")]
    UnsupportedZone { zone: String },

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("{object} '{id}' does not exist")]
    ObjectNotFound { object: ObjectKind, id: String },

    #[error("{object} '{name}' is not available")]
    NotAvailable { object: ObjectKind, name: String },

    #[error("caller does not own {object} '{id}'")]
    NotOwner { object: String, id: String },

    /// Any other business-level rejection from the registry.
    #[error("registry {provider} rejected the request with {code}: {message}")]
    Rejected {
        provider: ProviderId,
        code: ResultCode,
        message: String,
    },

    /// Transport failed (after the transport's own retries, if any).
    #[error("transport failure: {0}")]
    Transport(TransportError),

    /// Local state or handle store failure.
    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Copyable tag for a [`Fault`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    MalformedResponse,
    UnknownRegistry,
    UnsupportedZone,
    InvalidName,
    ObjectNotFound,
    NotAvailable,
    NotOwner,
    Rejected,
    TransportFault,
    Persistence,
    Internal,
}

/// How an outer layer should surface a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultClass {
    Internal,
    ClientInput,
    NotFound,
    Conflict,
    Permission,
    Transient,
}

impl FaultKind {
    pub fn class(self) -> FaultClass {
        match self {
            FaultKind::MalformedResponse | FaultKind::Persistence | FaultKind::Internal => {
                FaultClass::Internal
            }
            FaultKind::UnknownRegistry
            | FaultKind::UnsupportedZone
            | FaultKind::InvalidName
            | FaultKind::Rejected => FaultClass::ClientInput,
            FaultKind::ObjectNotFound => FaultClass::NotFound,
            FaultKind::NotAvailable => FaultClass::Conflict,
            FaultKind::NotOwner => FaultClass::Permission,
            FaultKind::TransportFault => FaultClass::Transient,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaultKind::MalformedResponse => "malformed_response",
            FaultKind::UnknownRegistry => "unknown_registry",
            FaultKind::UnsupportedZone => "unsupported_zone",
            FaultKind::InvalidName => "invalid_name",
            FaultKind::ObjectNotFound => "object_not_found",
            FaultKind::NotAvailable => "not_available",
            FaultKind::NotOwner => "not_owner",
            FaultKind::Rejected => "rejected",
            FaultKind::TransportFault => "transport_fault",
            FaultKind::Persistence => "persistence",
            FaultKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl Fault {
    pub fn kind(&self) -> FaultKind {
        match self {
            Fault::MalformedResponse { .. } => FaultKind::MalformedResponse,
            Fault::UnknownRegistry { .. } => FaultKind::UnknownRegistry,
            Fault::UnsupportedZone { .. } => FaultKind::UnsupportedZone,
            Fault::InvalidName { .. } => FaultKind::InvalidName,
            Fault::ObjectNotFound { .. } => FaultKind::ObjectNotFound,
            Fault::NotAvailable { .. } => FaultKind::NotAvailable,
            Fault::NotOwner { .. } => FaultKind::NotOwner,
            Fault::Rejected { .. } => FaultKind::Rejected,
            Fault::Transport(_) => FaultKind::TransportFault,
            Fault::Persistence(_) => FaultKind::Persistence,
            Fault::Internal(_) => FaultKind::Internal,
        }
    }

    pub fn class(&self) -> FaultClass {
        self.kind().class()
    }

    pub fn malformed(object: ObjectKind, detail: impl Into<String>) -> Self {
        Fault::MalformedResponse {
            object,
            detail: detail.into(),
        }
    }

    /// Classify a transport error raised while operating on `object` named `id`.
    ///
    /// Classification is by variant and result code only.
    pub fn from_transport(err: TransportError, object: ObjectKind, id: &str) -> Self {
        match err {
            TransportError::UnknownRegistry { registry } => {
                Fault::UnknownRegistry { provider: registry }
            }
            TransportError::Registry { code, .. } if code == ResultCode::OBJECT_DOES_NOT_EXIST => {
                Fault::ObjectNotFound {
                    object,
                    id: id.to_owned(),
                }
            }
            TransportError::Registry { code, .. } if code == ResultCode::OBJECT_EXISTS => {
                Fault::NotAvailable {
                    object,
                    name: id.to_owned(),
                }
            }
            TransportError::Registry { code, .. }
                if code == ResultCode::AUTHORIZATION_ERROR
                    || code == ResultCode::INVALID_AUTH_INFO =>
            {
                Fault::NotOwner {
                    object: object.to_string(),
                    id: id.to_owned(),
                }
            }
            TransportError::Registry {
                registry,
                code,
                message,
            } => Fault::Rejected {
                provider: registry,
                code,
                message,
            },
            err @ (TransportError::Network { .. } | TransportError::Timeout { .. }) => {
                Fault::Transport(err)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from loading the provider catalog.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse provider config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("provider config not found at {path}")]
    NotFound { path: PathBuf },

    #[error("invalid provider config: {0}")]
    Invalid(String),
}
