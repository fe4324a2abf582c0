//! In-process adapters for the local-store ports.
//!
//! [`MemoryLocalState`] keeps one row per registry name; persisting the same
//! name again updates that row and returns its id.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use eppline_core::{
    AccountId, CanonicalDomain, CanonicalHost, Fault, LocalDomain, LocalId, LocalStateSync,
    Person, PersonDirectory, PersonId,
};

#[derive(Debug, Default)]
struct Rows {
    next_id: u64,
    domains: HashMap<LocalId, CanonicalDomain>,
    domain_ids: HashMap<(String, String), LocalDomain>,
    hosts: HashMap<LocalId, CanonicalHost>,
    host_ids: HashMap<String, LocalId>,
}

impl Rows {
    fn allocate(&mut self) -> LocalId {
        self.next_id += 1;
        LocalId(self.next_id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryLocalState {
    rows: Mutex<Rows>,
}

impl MemoryLocalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn domain(&self, id: LocalId) -> Option<CanonicalDomain> {
        self.rows.lock().await.domains.get(&id).cloned()
    }

    pub async fn domain_count(&self) -> usize {
        self.rows.lock().await.domains.len()
    }

    pub async fn host(&self, id: LocalId) -> Option<CanonicalHost> {
        self.rows.lock().await.hosts.get(&id).cloned()
    }
}

#[async_trait]
impl LocalStateSync for MemoryLocalState {
    async fn persist_domain_creation(
        &self,
        domain: &CanonicalDomain,
        owner: AccountId,
    ) -> Result<LocalId, Fault> {
        let mut rows = self.rows.lock().await;
        let key = (domain.name.clone(), domain.zone.clone());
        let id = match rows.domain_ids.get(&key) {
            Some(row) => row.id,
            None => {
                let id = rows.allocate();
                rows.domain_ids.insert(key, LocalDomain { id, owner });
                id
            }
        };
        rows.domains.insert(id, domain.clone());
        debug!(domain = %domain.name, local_id = %id, owner = %owner, "persisted domain");
        Ok(id)
    }

    async fn find_domain(&self, name: &str, zone: &str) -> Result<Option<LocalDomain>, Fault> {
        let rows = self.rows.lock().await;
        Ok(rows
            .domain_ids
            .get(&(name.to_owned(), zone.to_owned()))
            .copied())
    }

    async fn synchronise_domain(&self, domain: &CanonicalDomain, id: LocalId) -> Result<(), Fault> {
        let mut rows = self.rows.lock().await;
        let Some(row) = rows.domains.get_mut(&id) else {
            return Err(Fault::Persistence(format!("no local domain row {id}")));
        };
        if row.name != domain.name {
            return Err(Fault::Persistence(format!(
                "local row {id} holds '{}', not '{}'",
                row.name, domain.name
            )));
        }
        *row = domain.clone();
        debug!(domain = %domain.name, local_id = %id, "synchronised domain");
        Ok(())
    }

    async fn persist_host_creation(&self, host: &CanonicalHost) -> Result<LocalId, Fault> {
        let mut rows = self.rows.lock().await;
        let id = match rows.host_ids.get(&host.name) {
            Some(id) => *id,
            None => {
                let id = rows.allocate();
                rows.host_ids.insert(host.name.clone(), id);
                id
            }
        };
        rows.hosts.insert(id, host.clone());
        Ok(id)
    }
}

/// Person records held in memory, keyed by id.
#[derive(Debug, Default)]
pub struct MemoryPersonDirectory {
    people: HashMap<PersonId, Person>,
}

impl MemoryPersonDirectory {
    pub fn new(people: impl IntoIterator<Item = Person>) -> Self {
        Self {
            people: people.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

#[async_trait]
impl PersonDirectory for MemoryPersonDirectory {
    async fn person(&self, id: PersonId) -> Result<Person, Fault> {
        self.people
            .get(&id)
            .cloned()
            .ok_or_else(|| Fault::Persistence(format!("no local person {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eppline_core::{Handle, ProviderId};

    const OWNER: AccountId = AccountId(1);

    fn domain(name: &str, statuses: &[&str]) -> CanonicalDomain {
        CanonicalDomain {
            name: name.into(),
            zone: "xyz".into(),
            registry: ProviderId::from("p"),
            statuses: statuses.iter().map(|s| (*s).to_owned()).collect(),
            registrant: Handle::from("r"),
            contacts: vec![],
            nameservers: vec![],
            created: None,
            expires: None,
            auth_info: None,
            roid: None,
        }
    }

    #[tokio::test]
    async fn persisting_twice_keeps_one_row() {
        let state = MemoryLocalState::new();
        let first = state.persist_domain_creation(&domain("a.xyz", &[]), OWNER).await.expect("persist");
        let second = state
            .persist_domain_creation(&domain("a.xyz", &["ok"]), AccountId(2))
            .await
            .expect("persist");
        assert_eq!(first, second);
        assert_eq!(state.domain_count().await, 1);
        assert_eq!(state.domain(first).await.expect("row").statuses, ["ok"]);

        let row = state.find_domain("a.xyz", "xyz").await.expect("find").expect("row");
        assert_eq!(row, LocalDomain { id: first, owner: OWNER });
        assert_eq!(state.find_domain("a.xyz", "space").await.expect("find"), None);
    }

    #[tokio::test]
    async fn synchronise_updates_in_place() {
        let state = MemoryLocalState::new();
        let id = state.persist_domain_creation(&domain("a.xyz", &[]), OWNER).await.expect("persist");
        state
            .synchronise_domain(&domain("a.xyz", &["clientHold"]), id)
            .await
            .expect("sync");
        assert_eq!(state.domain(id).await.expect("row").statuses, ["clientHold"]);

        let err = state
            .synchronise_domain(&domain("b.xyz", &[]), id)
            .await
            .unwrap_err();
        assert!(matches!(err, Fault::Persistence(_)));
        assert!(state.synchronise_domain(&domain("a.xyz", &[]), LocalId(99)).await.is_err());
    }
}
