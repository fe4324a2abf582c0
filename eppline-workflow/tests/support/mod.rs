//! Test fakes for every port plus a harness wiring them together.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use eppline_core::{
    AccountId, Caller, Command, Person, PersonId, PostalInfoType, ProviderCatalog, ProviderId,
    RegistryProfile, RegistryTransport, ResultCode, TransportError,
};
use eppline_workflow::{
    ChainExecutor, ContactResolver, MemoryHandleStore, MemoryLocalState, MemoryPersonDirectory,
    Orchestrator, RegistryGateway,
};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Call {
    pub registry: ProviderId,
    pub command: Command,
    pub payload: Value,
}

/// Answers every command with a plausible success unless told otherwise.
///
/// - `script` queues one-shot outcomes per `(registry, command)`;
/// - `fail_name` makes every call whose payload mentions a name fail.
#[derive(Default)]
pub struct FakeTransport {
    calls: Mutex<Vec<Call>>,
    script: Mutex<HashMap<(ProviderId, Command), VecDeque<Result<Value, TransportError>>>>,
    name_failures: Mutex<HashMap<String, TransportError>>,
    taken: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
    next_handle: AtomicU64,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, registry: &str, command: Command, outcome: Result<Value, TransportError>) {
        self.script
            .lock()
            .unwrap()
            .entry((ProviderId::from(registry), command))
            .or_default()
            .push_back(outcome);
    }

    pub fn fail_name(&self, name: &str, err: TransportError) {
        self.name_failures
            .lock()
            .unwrap()
            .insert(name.to_owned(), err);
    }

    pub fn mark_taken(&self, name: &str) {
        self.taken.lock().unwrap().push(name.to_owned());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, command: Command) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.command == command)
            .count()
    }

    fn default_response(&self, command: Command, payload: &Value) -> Value {
        match command {
            Command::CheckDomain | Command::CheckHost => {
                let ns = if command == Command::CheckDomain { "domain" } else { "host" };
                let taken = self.taken.lock().unwrap().clone();
                let items: Vec<Value> = payload[ns]
                    .as_array()
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|n| {
                        let name = n.as_str().unwrap_or_default().to_owned();
                        if taken.contains(&name) {
                            json!({
                                format!("{ns}:name"): {"$t": name, "avail": "0"},
                                format!("{ns}:reason"): "In use"
                            })
                        } else {
                            json!({format!("{ns}:name"): {"$t": name, "avail": "1"}})
                        }
                    })
                    .collect();
                json!({format!("{ns}:chkData"): {format!("{ns}:cd"): items}})
            }
            Command::CreateContact => {
                let n = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
                json!({"contact:creData": {"contact:id": format!("H-{n}")}})
            }
            Command::CreateDomain => json!({"domain:creData": {
                "domain:name": payload["name"],
                "domain:crDate": "2017-06-28T07:59:00.0Z",
                "domain:exDate": "2018-06-28T07:59:00.0Z"
            }}),
            Command::CreateHost => json!({"host:creData": {
                "host:name": payload["name"],
                "host:crDate": "2017-06-28T07:59:00.0Z"
            }}),
            Command::InfoDomain | Command::InfoContact | Command::InfoHost => json!({}),
        }
    }
}

#[async_trait]
impl RegistryTransport for FakeTransport {
    async fn call(
        &self,
        registry: &ProviderId,
        command: Command,
        payload: Value,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(Call {
            registry: registry.clone(),
            command,
            payload: payload.clone(),
        });
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .script
            .lock()
            .unwrap()
            .get_mut(&(registry.clone(), command))
            .and_then(VecDeque::pop_front);
        if let Some(outcome) = scripted {
            return outcome;
        }

        let text = payload.to_string();
        let failure = self
            .name_failures
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| text.contains(&format!("\"{name}\"")))
            .map(|(_, err)| err.clone());
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(self.default_response(command, &payload))
    }
}

pub fn network_error(registry: &str) -> TransportError {
    TransportError::Network {
        registry: ProviderId::from(registry),
        message: "connection reset".into(),
    }
}

pub fn registry_error(registry: &str, code: ResultCode) -> TransportError {
    TransportError::Registry {
        registry: ProviderId::from(registry),
        code,
        message: "rejected".into(),
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn person(id: u64, owner: u64) -> Person {
    Person {
        id: PersonId(id),
        owner: AccountId(owner),
        first_name: "Joe".into(),
        surname: format!("User{id}"),
        company: None,
        email: format!("joe{id}@example.com"),
        telephone: Some("+64.11223344".into()),
        fax: None,
        street: vec!["Main Street".into()],
        city: "Boston".into(),
        state: Some("MA".into()),
        postcode: "23433".into(),
        country: "US".into(),
        postal_info_type: PostalInfoType::Int,
        non_disclose: Default::default(),
    }
}

/// Two providers with two zones each.
pub fn catalog() -> ProviderCatalog {
    ProviderCatalog::new(vec![
        RegistryProfile::new("centralnic", &["xyz", "space"]),
        RegistryProfile::new("nzrs", &["nz", "co.nz"]),
    ])
    .unwrap()
}

pub fn owner() -> Caller {
    Caller::user(1u64)
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub catalog: Arc<ProviderCatalog>,
    pub gateway: Arc<RegistryGateway>,
    pub handles: Arc<MemoryHandleStore>,
    pub local: Arc<MemoryLocalState>,
    pub resolver: Arc<ContactResolver>,
    pub orchestrator: Arc<Orchestrator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_catalog(catalog())
    }

    pub fn with_catalog(catalog: ProviderCatalog) -> Self {
        let transport = FakeTransport::new();
        let catalog = Arc::new(catalog);
        let gateway = Arc::new(RegistryGateway::new(catalog.clone(), transport.clone()));
        let handles = Arc::new(MemoryHandleStore::new());
        let people = Arc::new(MemoryPersonDirectory::new([
            person(1, 1),
            person(2, 1),
            person(3, 1),
            person(9, 2),
        ]));
        let local = Arc::new(MemoryLocalState::new());
        let resolver = Arc::new(ContactResolver::new(
            gateway.clone(),
            people,
            handles.clone(),
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            gateway.clone(),
            resolver.clone(),
            local.clone(),
        ));
        Self {
            transport,
            catalog,
            gateway,
            handles,
            local,
            resolver,
            orchestrator,
        }
    }

    pub fn executor(&self, max_concurrent: usize) -> ChainExecutor {
        ChainExecutor::start(self.orchestrator.clone(), max_concurrent)
    }
}
