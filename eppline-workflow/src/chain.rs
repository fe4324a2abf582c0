//! Workflow chains: an ordered list of steps built once per request.
//!
//! Steps never reference each other. Data flows through [`ChainContext`],
//! which each step takes by value and hands back extended.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use eppline_core::{
    AvailabilityResult, Caller, CanonicalContact, CanonicalDomain, CanonicalHost, ContactRole,
    LocalId, PersonId, ProviderId,
};

use crate::error::ChainKind;
use crate::gateway::{DomainSpec, HostSpec};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub role: ContactRole,
    pub person: PersonId,
}

/// A caller's request to register a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRequest {
    pub name: String,
    pub registrant: PersonId,
    #[serde(default)]
    pub contacts: Vec<ContactRequest>,
    #[serde(default)]
    pub nameservers: Vec<String>,
    #[serde(default = "default_period")]
    pub period_years: u8,
    /// Create fresh registry contacts even when handles are cached.
    #[serde(default)]
    pub force: bool,
}

fn default_period() -> u8 {
    1
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    EnsureRegistrant { person: PersonId, force: bool },
    EnsureContact { role: ContactRole, person: PersonId, force: bool },
    CreateDomain(DomainSpec),
    CreateHost(HostSpec),
    CheckDomains { provider: ProviderId, names: Vec<String> },
    PersistLocalState,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::EnsureRegistrant { .. } => "ensure-registrant",
            Step::EnsureContact { .. } => "ensure-contact",
            Step::CreateDomain(_) => "create-domain-at-registry",
            Step::CreateHost(_) => "create-host-at-registry",
            Step::CheckDomains { .. } => "check-domains",
            Step::PersistLocalState => "persist-local-state",
        }
    }
}

/// A contact resolved for one role on the domain being created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleContact {
    pub role: ContactRole,
    pub contact: CanonicalContact,
}

/// Everything earlier steps produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainContext {
    pub caller: Caller,
    /// Name the chain operates on; drives registry lookup.
    pub subject: String,
    pub registry: Option<ProviderId>,
    pub registrant: Option<CanonicalContact>,
    pub contacts: Vec<RoleContact>,
    pub domain: Option<CanonicalDomain>,
    pub host: Option<CanonicalHost>,
    pub availability: Vec<AvailabilityResult>,
    pub local_id: Option<LocalId>,
}

impl ChainContext {
    pub fn new(caller: Caller, subject: impl Into<String>) -> Self {
        Self {
            caller,
            subject: subject.into(),
            registry: None,
            registrant: None,
            contacts: Vec::new(),
            domain: None,
            host: None,
            availability: Vec::new(),
            local_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Chain {
    pub id: Uuid,
    pub kind: ChainKind,
    pub steps: Vec<Step>,
    pub context: ChainContext,
}

impl Chain {
    fn new(kind: ChainKind, steps: Vec<Step>, context: ChainContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            steps,
            context,
        }
    }

    /// ensure-registrant, ensure-contact per requested role,
    /// create-domain-at-registry, persist-local-state.
    pub fn create_domain(request: DomainRequest, caller: Caller) -> Self {
        let mut steps = Vec::with_capacity(request.contacts.len() + 3);
        steps.push(Step::EnsureRegistrant {
            person: request.registrant,
            force: request.force,
        });
        steps.extend(request.contacts.iter().map(|c| Step::EnsureContact {
            role: c.role,
            person: c.person,
            force: request.force,
        }));
        steps.push(Step::CreateDomain(DomainSpec {
            name: request.name.clone(),
            nameservers: request.nameservers,
            period_years: request.period_years,
        }));
        steps.push(Step::PersistLocalState);
        Self::new(
            ChainKind::CreateDomain,
            steps,
            ChainContext::new(caller, request.name),
        )
    }

    pub fn create_host(request: HostSpec, caller: Caller) -> Self {
        let subject = request.name.clone();
        Self::new(
            ChainKind::CreateHost,
            vec![Step::CreateHost(request), Step::PersistLocalState],
            ChainContext::new(caller, subject),
        )
    }

    /// One branch of a bulk availability check.
    pub fn check_domains(provider: ProviderId, names: Vec<String>, caller: Caller) -> Self {
        let subject = names.join(",");
        let mut context = ChainContext::new(caller, subject);
        context.registry = Some(provider.clone());
        Self::new(
            ChainKind::CheckDomains,
            vec![Step::CheckDomains { provider, names }],
            context,
        )
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(Step::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(contacts: Vec<ContactRequest>) -> DomainRequest {
        DomainRequest {
            name: "a.xyz".into(),
            registrant: PersonId(1),
            contacts,
            nameservers: vec!["ns1.host.xyz".into()],
            period_years: 1,
            force: false,
        }
    }

    #[test]
    fn create_domain_steps_are_ordered() {
        let chain = Chain::create_domain(
            request(vec![
                ContactRequest { role: ContactRole::Admin, person: PersonId(2) },
                ContactRequest { role: ContactRole::Tech, person: PersonId(3) },
            ]),
            Caller::user(1u64),
        );
        assert_eq!(
            chain.step_names(),
            [
                "ensure-registrant",
                "ensure-contact",
                "ensure-contact",
                "create-domain-at-registry",
                "persist-local-state"
            ]
        );
        assert_eq!(chain.context.subject, "a.xyz");
    }

    #[test]
    fn create_host_is_two_steps() {
        let chain = Chain::create_host(
            HostSpec { name: "ns1.a.xyz".into(), addresses: vec![] },
            Caller::user(1u64),
        );
        assert_eq!(chain.step_names(), ["create-host-at-registry", "persist-local-state"]);
        assert_eq!(chain.kind, ChainKind::CreateHost);
    }

    #[test]
    fn domain_request_defaults() {
        let req: DomainRequest =
            serde_json::from_str(r#"{"name": "a.xyz", "registrant": 4}"#).expect("parse");
        assert_eq!(req.period_years, 1);
        assert!(!req.force && req.contacts.is_empty());
    }

    #[test]
    fn chains_get_distinct_ids() {
        let a = Chain::check_domains(ProviderId::from("p"), vec!["a.xyz".into()], Caller::user(1u64));
        let b = Chain::check_domains(ProviderId::from("p"), vec!["a.xyz".into()], Caller::user(1u64));
        assert_ne!(a.id, b.id);
        assert_eq!(a.context.registry, Some(ProviderId::from("p")));
    }
}
