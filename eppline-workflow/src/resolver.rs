//! Resolve-or-create registry contacts for local people.
//!
//! Callers going through one [`ContactResolver`] are serialized per
//! `(provider, person)`, so they produce at most one creation for a pair.
//! Separate processes are not coordinated and may create duplicates.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use eppline_core::{
    Caller, CanonicalContact, Fault, HandleStore, Person, PersonDirectory, PersonId, ProviderId,
};

use crate::gateway::RegistryGateway;

type KeyLock = Arc<Mutex<()>>;

pub struct ContactResolver {
    gateway: Arc<RegistryGateway>,
    people: Arc<dyn PersonDirectory>,
    handles: Arc<dyn HandleStore>,
    locks: Mutex<HashMap<(ProviderId, PersonId), KeyLock>>,
}

impl ContactResolver {
    pub fn new(
        gateway: Arc<RegistryGateway>,
        people: Arc<dyn PersonDirectory>,
        handles: Arc<dyn HandleStore>,
    ) -> Self {
        Self {
            gateway,
            people,
            handles,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Return the registry contact for `person` at `provider`, creating it
    /// when no handle is cached or when `force` is set.
    ///
    /// A cached handle is returned without contacting the registry.
    pub async fn resolve_or_create(
        &self,
        provider: &ProviderId,
        person: PersonId,
        caller: &Caller,
        force: bool,
    ) -> Result<CanonicalContact, Fault> {
        self.gateway.catalog().profile(provider)?;
        let record = self.people.person(person).await?;
        if !caller.may_act_for(record.owner) {
            return Err(Fault::NotOwner {
                object: "person".into(),
                id: person.to_string(),
            });
        }

        let lock = self.key_lock(provider, person).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.resolve_locked(provider, &record, force).await
        };
        self.release_key_lock(provider, person, lock).await;
        outcome
    }

    async fn resolve_locked(
        &self,
        provider: &ProviderId,
        record: &Person,
        force: bool,
    ) -> Result<CanonicalContact, Fault> {
        let person = record.id;
        if !force {
            if let Some(handle) = self.handles.get(provider, person).await? {
                debug!(provider = %provider, person = %person, handle = %handle, "using cached handle");
                return Ok(CanonicalContact::from_person(handle, provider.clone(), record));
            }
        }

        let contact = self.gateway.create_contact(provider, record).await?;
        self.handles
            .put(provider, person, contact.handle.clone())
            .await?;
        info!(
            provider = %provider,
            person = %person,
            handle = %contact.handle,
            force,
            "stored new registry handle"
        );
        Ok(contact)
    }

    async fn key_lock(&self, provider: &ProviderId, person: PersonId) -> KeyLock {
        let mut locks = self.locks.lock().await;
        locks
            .entry((provider.clone(), person))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the map's entry once no other caller holds or waits on it.
    ///
    /// Clones are only taken under the map lock, so a count of two (the
    /// map and `lock`) means nobody else can reach this entry.
    async fn release_key_lock(&self, provider: &ProviderId, person: PersonId, lock: KeyLock) {
        let mut locks = self.locks.lock().await;
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&(provider.clone(), person));
        }
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.locks.lock().await.len()
    }
}
