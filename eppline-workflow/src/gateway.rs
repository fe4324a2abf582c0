//! Single-command registry operations: build the payload, call the
//! transport, classify failures, normalize the response.
//!
//! Every operation looks the provider (or the zone) up in the catalog first,
//! so an unknown registry never reaches the transport.

use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use eppline_core::names;
use eppline_core::{
    AvailabilityResult, CanonicalContact, CanonicalDomain, CanonicalHost, Command, DisclosePolarity,
    DisclosureAttribute, DomainContact, Fault, Handle, HostAddress, ObjectKind, Person,
    ProviderCatalog, ProviderId, RegistryProfile, RegistryTransport,
};
use eppline_normalize as normalize;

/// Registry contact ids are limited to 16 characters.
const CONTACT_ID_LEN: usize = 16;
const AUTH_CODE_LEN: usize = 24;

/// What the create-domain step sends to the registry, minus the contacts
/// resolved by earlier steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSpec {
    pub name: String,
    #[serde(default)]
    pub nameservers: Vec<String>,
    #[serde(default = "default_period")]
    pub period_years: u8,
}

fn default_period() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    pub name: String,
    #[serde(default)]
    pub addresses: Vec<IpAddr>,
}

pub struct RegistryGateway {
    catalog: Arc<ProviderCatalog>,
    transport: Arc<dyn RegistryTransport>,
}

impl RegistryGateway {
    pub fn new(catalog: Arc<ProviderCatalog>, transport: Arc<dyn RegistryTransport>) -> Self {
        Self { catalog, transport }
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Normalize `name` and find the active registry serving its zone.
    pub fn locate(&self, name: &str) -> Result<(&RegistryProfile, String, String), Fault> {
        let fqdn = names::normalize_fqdn(name)?;
        let (profile, zone) = self.catalog.resolve_zone(&fqdn)?;
        Ok((profile, zone, fqdn))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn check_domains(
        &self,
        provider: &ProviderId,
        candidates: &[String],
    ) -> Result<Vec<AvailabilityResult>, Fault> {
        self.catalog.profile(provider)?;
        let fqdns = normalize_all(candidates)?;
        let raw = self
            .call(provider, Command::CheckDomain, json!({ "domain": fqdns }))
            .await
            .map_err(|e| Fault::from_transport(e, ObjectKind::Domain, &fqdns.join(",")))?;
        normalize::normalize_check_domain(&raw)
    }

    pub async fn check_hosts(
        &self,
        provider: &ProviderId,
        candidates: &[String],
    ) -> Result<Vec<AvailabilityResult>, Fault> {
        self.catalog.profile(provider)?;
        let fqdns = normalize_all(candidates)?;
        let raw = self
            .call(provider, Command::CheckHost, json!({ "host": fqdns }))
            .await
            .map_err(|e| Fault::from_transport(e, ObjectKind::Host, &fqdns.join(",")))?;
        normalize::normalize_check_host(&raw)
    }

    /// `privileged` callers additionally receive the auth code and roid.
    pub async fn info_domain(&self, name: &str, privileged: bool) -> Result<CanonicalDomain, Fault> {
        let (profile, _, fqdn) = self.locate(name)?;
        let raw = self
            .call(&profile.id, Command::InfoDomain, json!({ "domain": fqdn }))
            .await
            .map_err(|e| Fault::from_transport(e, ObjectKind::Domain, &fqdn))?;
        normalize::normalize_info_domain(&raw, &profile.id, privileged)
    }

    pub async fn info_contact(
        &self,
        provider: &ProviderId,
        handle: &Handle,
    ) -> Result<CanonicalContact, Fault> {
        let profile = self.catalog.profile(provider)?;
        let raw = self
            .call(provider, Command::InfoContact, json!({ "contact": handle.0 }))
            .await
            .map_err(|e| Fault::from_transport(e, ObjectKind::Contact, &handle.0))?;
        normalize::normalize_info_contact(&raw, profile)
    }

    pub async fn info_host(&self, name: &str) -> Result<CanonicalHost, Fault> {
        let (profile, _, fqdn) = self.locate(name)?;
        let raw = self
            .call(&profile.id, Command::InfoHost, json!({ "host": fqdn }))
            .await
            .map_err(|e| Fault::from_transport(e, ObjectKind::Host, &fqdn))?;
        normalize::normalize_info_host(&raw, &profile.id)
    }

    // -----------------------------------------------------------------------
    // Creates
    // -----------------------------------------------------------------------

    /// Create a registry contact from a local person record.
    ///
    /// The returned contact carries the generated auth code; it is only ever
    /// handed to the caller that created it.
    pub async fn create_contact(
        &self,
        provider: &ProviderId,
        person: &Person,
    ) -> Result<CanonicalContact, Fault> {
        let profile = self.catalog.profile(provider)?;
        let id = generated(CONTACT_ID_LEN);
        let auth = generated(AUTH_CODE_LEN);
        let payload = contact_payload(&id, &auth, person, profile.disclose_polarity);

        let raw = self
            .call(provider, Command::CreateContact, payload)
            .await
            .map_err(|e| Fault::from_transport(e, ObjectKind::Contact, &id))?;
        let handle = normalize::normalize_create_contact(&raw)?;
        info!(provider = %provider, person = %person.id, handle = %handle, "created registry contact");

        let mut contact = CanonicalContact::from_person(handle, provider.clone(), person);
        contact.auth_info = Some(auth);
        Ok(contact)
    }

    pub async fn create_domain(
        &self,
        spec: &DomainSpec,
        registrant: &Handle,
        contacts: &[DomainContact],
    ) -> Result<CanonicalDomain, Fault> {
        let (profile, zone, fqdn) = self.locate(&spec.name)?;
        let nameservers = normalize_all(&spec.nameservers)?;
        let auth = generated(AUTH_CODE_LEN);
        let payload = json!({
            "name": fqdn,
            "period": { "unit": "y", "value": spec.period_years },
            "registrant": registrant.0,
            "contact": contacts
                .iter()
                .map(|c| json!({ "type": c.role.as_str(), "handle": c.handle.0 }))
                .collect::<Vec<_>>(),
            "ns": nameservers,
            "authInfo": { "pw": auth },
        });

        let raw = self
            .call(&profile.id, Command::CreateDomain, payload)
            .await
            .map_err(|e| Fault::from_transport(e, ObjectKind::Domain, &fqdn))?;
        let created = normalize::normalize_create_domain(&raw)?;
        info!(provider = %profile.id, domain = %fqdn, "created domain at registry");

        Ok(CanonicalDomain {
            name: fqdn,
            zone,
            registry: profile.id.clone(),
            statuses: Vec::new(),
            registrant: registrant.clone(),
            contacts: contacts.to_vec(),
            nameservers,
            created: created.created,
            expires: created.expires,
            auth_info: Some(auth),
            roid: None,
        })
    }

    pub async fn create_host(&self, spec: &HostSpec) -> Result<CanonicalHost, Fault> {
        let (profile, _, fqdn) = self.locate(&spec.name)?;
        let addresses: Vec<HostAddress> = spec.addresses.iter().copied().map(HostAddress::new).collect();
        let payload = json!({
            "name": fqdn,
            "addr": addresses
                .iter()
                .map(|a| json!({ "ip": a.version, "addr": a.ip.to_string() }))
                .collect::<Vec<_>>(),
        });

        let raw = self
            .call(&profile.id, Command::CreateHost, payload)
            .await
            .map_err(|e| Fault::from_transport(e, ObjectKind::Host, &fqdn))?;
        let created = normalize::normalize_create_host(&raw)?;
        info!(provider = %profile.id, host = %fqdn, "created host at registry");

        Ok(CanonicalHost {
            name: fqdn,
            registry: profile.id.clone(),
            addresses,
            statuses: Vec::new(),
            created: created.created,
        })
    }

    async fn call(
        &self,
        provider: &ProviderId,
        command: Command,
        payload: Value,
    ) -> Result<Value, eppline_core::TransportError> {
        debug!(provider = %provider, command = %command, "registry call");
        self.transport.call(provider, command, payload).await
    }
}

fn normalize_all(input: &[String]) -> Result<Vec<String>, Fault> {
    input.iter().map(|n| names::normalize_fqdn(n)).collect()
}

/// Random alphanumeric token of `len` characters (at most 32).
fn generated(len: usize) -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(len);
    token
}

fn contact_payload(id: &str, auth: &str, person: &Person, polarity: DisclosePolarity) -> Value {
    let hidden: Vec<&str> = DisclosureAttribute::ALL
        .iter()
        .filter(|attr| person.non_disclose.contains(*attr))
        .map(|attr| disclose_element(*attr))
        .collect();
    // The block lists the hidden attributes, so the flag is whichever bit
    // means "hidden" at this registry.
    let flag = if polarity.disclosed(true) { 0 } else { 1 };

    json!({
        "id": id,
        "postalInfo": {
            "type": person.postal_info_type.as_str(),
            "name": person.display_name(),
            "org": person.company,
            "addr": {
                "street": person.street,
                "city": person.city,
                "sp": person.state,
                "pc": person.postcode,
                "cc": person.country,
            },
        },
        "voice": person.telephone,
        "fax": person.fax,
        "email": person.email,
        "authInfo": { "pw": auth },
        "disclose": { "flag": flag, "fields": hidden },
    })
}

fn disclose_element(attr: DisclosureAttribute) -> &'static str {
    match attr {
        DisclosureAttribute::Name => "name",
        DisclosureAttribute::Address => "addr",
        DisclosureAttribute::Company => "org",
        DisclosureAttribute::Telephone => "voice",
        DisclosureAttribute::Fax => "fax",
        DisclosureAttribute::Email => "email",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eppline_core::{AccountId, PersonId, PostalInfoType};

    fn person(hidden: &[DisclosureAttribute]) -> Person {
        Person {
            id: PersonId(1),
            owner: AccountId(1),
            first_name: "Joe".into(),
            surname: "User".into(),
            company: None,
            email: "joe@example.com".into(),
            telephone: None,
            fax: None,
            street: vec!["Main Street".into()],
            city: "Boston".into(),
            state: None,
            postcode: "23433".into(),
            country: "US".into(),
            postal_info_type: PostalInfoType::Int,
            non_disclose: hidden.iter().copied().collect(),
        }
    }

    #[test]
    fn generated_tokens_fit_registry_limits() {
        let id = generated(CONTACT_ID_LEN);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generated(CONTACT_ID_LEN), id);
    }

    #[test]
    fn contact_payload_flag_follows_polarity() {
        let p = person(&[DisclosureAttribute::Email, DisclosureAttribute::Telephone]);
        let a = contact_payload("id", "pw", &p, DisclosePolarity::FlagMeansDisclosed);
        assert_eq!(a["disclose"]["flag"], 0);
        assert_eq!(a["disclose"]["fields"], json!(["voice", "email"]));
        let b = contact_payload("id", "pw", &p, DisclosePolarity::FlagMeansHidden);
        assert_eq!(b["disclose"]["flag"], 1);
        assert_eq!(b["postalInfo"]["name"], "Joe User");
    }
}
