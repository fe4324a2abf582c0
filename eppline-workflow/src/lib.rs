//! eppline-workflow: registry operations and the chains that sequence them.
//!
//! - [`gateway`]: one registry command in, one canonical record out
//! - [`resolver`]: resolve-or-create contact handles
//! - [`chain`] / [`orchestrator`]: ordered steps, run strictly in sequence
//! - [`executor`]: bounded concurrent execution of many chains
//! - [`fanout`]: bulk availability across every provider and zone
//! - [`retry`]: retry/backoff policy wrapper for any transport
//! - [`handles`], [`local_state`]: store adapters

pub mod chain;
pub mod error;
pub mod executor;
pub mod fanout;
pub mod gateway;
pub mod handles;
pub mod local_state;
pub mod orchestrator;
pub mod resolver;
pub mod retry;

pub use chain::{Chain, ChainContext, ContactRequest, DomainRequest, RoleContact, Step};
pub use error::{ChainError, ChainKind};
pub use executor::{ChainExecutor, ChainHandle, ChainResult, GroupHandle};
pub use fanout::{bulk_availability, BulkItem};
pub use gateway::{DomainSpec, HostSpec, RegistryGateway};
pub use handles::{FileHandleStore, HandleRecord, MemoryHandleStore};
pub use local_state::{MemoryLocalState, MemoryPersonDirectory};
pub use orchestrator::Orchestrator;
pub use resolver::ContactResolver;
pub use retry::{RetryPolicy, RetryingTransport};
