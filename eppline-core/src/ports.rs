//! Interfaces to the collaborators the core does not own.
//!
//! Workflows receive these as `Arc<dyn …>` so tests can substitute in-memory
//! fakes for the registry transport, the handle cache and the local database.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Fault, TransportError};
use crate::types::{
    AccountId, CanonicalDomain, CanonicalHost, Handle, LocalId, Person, PersonId, ProviderId,
};

/// Protocol commands the core issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    #[serde(rename = "checkDomain")]
    CheckDomain,
    #[serde(rename = "infoDomain")]
    InfoDomain,
    #[serde(rename = "createDomain")]
    CreateDomain,
    #[serde(rename = "checkHost")]
    CheckHost,
    #[serde(rename = "infoHost")]
    InfoHost,
    #[serde(rename = "createHost")]
    CreateHost,
    #[serde(rename = "infoContact")]
    InfoContact,
    #[serde(rename = "createContact")]
    CreateContact,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::CheckDomain => "checkDomain",
            Command::InfoDomain => "infoDomain",
            Command::CreateDomain => "createDomain",
            Command::CheckHost => "checkHost",
            Command::InfoHost => "infoHost",
            Command::CreateHost => "createHost",
            Command::InfoContact => "infoContact",
            Command::CreateContact => "createContact",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performs one remote call and returns the decoded response tree.
///
/// Implementations own connection pooling per registry and must be safe to
/// share across concurrent chains.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn call(
        &self,
        registry: &ProviderId,
        command: Command,
        payload: Value,
    ) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: RegistryTransport + ?Sized> RegistryTransport for Arc<T> {
    async fn call(
        &self,
        registry: &ProviderId,
        command: Command,
        payload: Value,
    ) -> Result<Value, TransportError> {
        (**self).call(registry, command, payload).await
    }
}

/// Persisted `(provider, person) → registry handle` associations.
///
/// Reads and writes must be atomic per key.
#[async_trait]
pub trait HandleStore: Send + Sync {
    async fn get(&self, provider: &ProviderId, person: PersonId) -> Result<Option<Handle>, Fault>;

    /// Insert or replace the handle for a pair.
    async fn put(&self, provider: &ProviderId, person: PersonId, handle: Handle)
        -> Result<(), Fault>;
}

/// Read access to local person/organization records.
#[async_trait]
pub trait PersonDirectory: Send + Sync {
    async fn person(&self, id: PersonId) -> Result<Person, Fault>;
}

/// A locally registered domain and the account that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDomain {
    pub id: LocalId,
    pub owner: AccountId,
}

/// Writes canonical registry results into the local relational store.
///
/// All operations are idempotent on the registry name.
#[async_trait]
pub trait LocalStateSync: Send + Sync {
    /// Create-or-fetch the local rows for a newly created domain owned by
    /// `owner`. An existing row keeps its original owner.
    async fn persist_domain_creation(
        &self,
        domain: &CanonicalDomain,
        owner: AccountId,
    ) -> Result<LocalId, Fault>;

    /// The local row registered for `(name, zone)`, if any.
    async fn find_domain(&self, name: &str, zone: &str) -> Result<Option<LocalDomain>, Fault>;

    /// Update the local rows for `id` in place from fresh registry data.
    async fn synchronise_domain(&self, domain: &CanonicalDomain, id: LocalId) -> Result<(), Fault>;

    async fn persist_host_creation(&self, host: &CanonicalHost) -> Result<LocalId, Fault>;
}
