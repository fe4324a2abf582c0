//! eppline core library: canonical records, fault taxonomy, provider
//! catalog and the ports workflows are built against.
//!
//! - [`types`]: newtypes and canonical domain/contact/host records
//! - [`error`]: [`Fault`], [`TransportError`], [`ConfigError`]
//! - [`config`]: provider catalog load / lookup
//! - [`ports`]: transport, handle store, person directory, local state
//! - [`views`]: caller-facing result shapes
//! - [`names`]: domain-name validation

pub mod config;
pub mod error;
pub mod names;
pub mod ports;
pub mod types;
pub mod views;

pub use config::{DisclosePolarity, ProviderCatalog, RegistryProfile, RetrySettings};
pub use error::{ConfigError, Fault, FaultClass, FaultKind, ObjectKind, ResultCode, TransportError};
pub use ports::{
    Command, HandleStore, LocalDomain, LocalStateSync, PersonDirectory, RegistryTransport,
};
pub use types::{
    AccountId, AvailabilityResult, CanonicalContact, CanonicalDomain, CanonicalHost, Caller,
    ContactRole, Disclosure, DisclosureAttribute, DomainContact, Handle, HostAddress, LocalId,
    Person, PersonId, PostalAddress, PostalInfoType, ProviderId,
};
