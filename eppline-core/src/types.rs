//! Canonical, registry-agnostic records.
//!
//! Every registry response is normalized into these types before it reaches a
//! workflow or a caller. All types serialize via serde; the public JSON shapes
//! consumed by outer layers live in [`crate::views`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a configured registry provider (e.g. `"centralnic"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProviderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProviderId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A registry-assigned identifier for a contact or registrant object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(pub String);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Handle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Handle {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Local primary key of a person/organization record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub u64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for PersonId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Local account that owns people, contacts and domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for AccountId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Row id handed out by the local state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for LocalId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Role a contact plays on a domain. The registrant is modelled separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactRole {
    Admin,
    Tech,
    Billing,
}

impl ContactRole {
    pub const ALL: [ContactRole; 3] = [ContactRole::Admin, ContactRole::Tech, ContactRole::Billing];

    pub fn as_str(self) -> &'static str {
        match self {
            ContactRole::Admin => "admin",
            ContactRole::Tech => "tech",
            ContactRole::Billing => "billing",
        }
    }
}

impl fmt::Display for ContactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(ContactRole::Admin),
            "tech" => Ok(ContactRole::Tech),
            "billing" => Ok(ContactRole::Billing),
            other => Err(format!("unknown contact role '{other}'")),
        }
    }
}

/// Contact attributes that participate in the disclosure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisclosureAttribute {
    Name,
    Address,
    Company,
    Telephone,
    Fax,
    Email,
}

impl DisclosureAttribute {
    pub const ALL: [DisclosureAttribute; 6] = [
        DisclosureAttribute::Name,
        DisclosureAttribute::Address,
        DisclosureAttribute::Company,
        DisclosureAttribute::Telephone,
        DisclosureAttribute::Fax,
        DisclosureAttribute::Email,
    ];
}

/// Which postal-info form a registry returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostalInfoType {
    /// Internationalized (7-bit ASCII) form.
    #[default]
    Int,
    /// Localized form.
    Loc,
}

impl PostalInfoType {
    pub fn as_str(self) -> &'static str {
        match self {
            PostalInfoType::Int => "int",
            PostalInfoType::Loc => "loc",
        }
    }
}

impl FromStr for PostalInfoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(PostalInfoType::Int),
            "loc" => Ok(PostalInfoType::Loc),
            other => Err(format!("unknown postal info type '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Disclosure
// ---------------------------------------------------------------------------

/// Per-attribute "may non-owners see this" flags.
///
/// Only attributes the registry reported are present. Lookups for absent
/// attributes fall back to the caller-supplied policy default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Disclosure(pub BTreeMap<DisclosureAttribute, bool>);

impl Disclosure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, attr: DisclosureAttribute, disclosed: bool) {
        self.0.insert(attr, disclosed);
    }

    pub fn get(&self, attr: DisclosureAttribute) -> Option<bool> {
        self.0.get(&attr).copied()
    }

    pub fn is_disclosed(&self, attr: DisclosureAttribute, default: bool) -> bool {
        self.get(attr).unwrap_or(default)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds the map for a local person who asked to hide `hidden`.
    /// Every attribute gets an explicit entry.
    pub fn from_hidden(hidden: &BTreeSet<DisclosureAttribute>) -> Self {
        let map = DisclosureAttribute::ALL
            .iter()
            .map(|attr| (*attr, !hidden.contains(attr)))
            .collect();
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// One role-tagged contact link on a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainContact {
    pub role: ContactRole,
    pub handle: Handle,
}

/// Canonical view of a domain object at one registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalDomain {
    /// Fully-qualified name, lower-case ASCII.
    pub name: String,
    pub zone: String,
    pub registry: ProviderId,
    #[serde(default)]
    pub statuses: Vec<String>,
    pub registrant: Handle,
    #[serde(default)]
    pub contacts: Vec<DomainContact>,
    #[serde(default)]
    pub nameservers: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
    /// Authorization code; only ever set for privileged reads or the creator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_info: Option<String>,
    /// Registry object id; only ever set for privileged reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roid: Option<String>,
}

impl CanonicalDomain {
    pub fn contacts_for(&self, role: ContactRole) -> impl Iterator<Item = &Handle> {
        self.contacts
            .iter()
            .filter(move |c| c.role == role)
            .map(|c| &c.handle)
    }

    /// Drop the fields only privileged callers may see.
    pub fn redact(mut self) -> Self {
        self.auth_info = None;
        self.roid = None;
        self
    }
}

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    /// Street lines joined with single spaces.
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
}

/// Canonical view of a contact object at one registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalContact {
    pub handle: Handle,
    pub registry: ProviderId,
    pub name: String,
    pub organization: Option<String>,
    pub address: PostalAddress,
    pub postal_info_type: PostalInfoType,
    pub email: Option<String>,
    pub voice: Option<String>,
    pub fax: Option<String>,
    #[serde(default)]
    pub disclosure: Disclosure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_info: Option<String>,
    pub owner: Option<AccountId>,
}

impl CanonicalContact {
    /// Contact record for a handle already known to exist at `registry`,
    /// built from the local person data without a registry round-trip.
    pub fn from_person(handle: Handle, registry: ProviderId, person: &Person) -> Self {
        Self {
            handle,
            registry,
            name: person.display_name(),
            organization: person.company.clone(),
            address: PostalAddress {
                street: person.street_line(),
                city: Some(person.city.clone()),
                state: person.state.clone(),
                postcode: person.postcode.clone(),
                country: person.country.clone(),
            },
            postal_info_type: person.postal_info_type,
            email: Some(person.email.clone()),
            voice: person.telephone.clone(),
            fax: person.fax.clone(),
            disclosure: Disclosure::from_hidden(&person.non_disclose),
            auth_info: None,
            owner: Some(person.owner),
        }
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    V4,
    V6,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAddress {
    pub ip: IpAddr,
    pub version: IpVersion,
}

impl HostAddress {
    pub fn new(ip: IpAddr) -> Self {
        let version = match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        };
        Self { ip, version }
    }
}

/// Canonical view of a nameserver host object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalHost {
    pub name: String,
    pub registry: ProviderId,
    #[serde(default)]
    pub addresses: Vec<HostAddress>,
    #[serde(default)]
    pub statuses: Vec<String>,
    pub created: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Outcome of checking one name. `reason` is present iff `available` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    #[serde(rename = "domain")]
    pub name: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AvailabilityResult {
    pub fn available(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: true,
            reason: None,
        }
    }

    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: false,
            reason: Some(reason.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Local records read by the workflows
// ---------------------------------------------------------------------------

/// A local person or organization that can be provisioned as a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub owner: AccountId,
    pub first_name: String,
    pub surname: String,
    pub company: Option<String>,
    pub email: String,
    pub telephone: Option<String>,
    pub fax: Option<String>,
    #[serde(default)]
    pub street: Vec<String>,
    pub city: String,
    pub state: Option<String>,
    pub postcode: String,
    pub country: String,
    #[serde(default)]
    pub postal_info_type: PostalInfoType,
    /// Attributes the person asked to keep private.
    #[serde(default)]
    pub non_disclose: BTreeSet<DisclosureAttribute>,
}

impl Person {
    pub fn display_name(&self) -> String {
        match (self.first_name.trim(), self.surname.trim()) {
            ("", s) => s.to_owned(),
            (f, "") => f.to_owned(),
            (f, s) => format!("{f} {s}"),
        }
    }

    pub fn street_line(&self) -> Option<String> {
        let joined = self
            .street
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    }
}

/// Who is asking. Admins may act on any object and see privileged fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub account: AccountId,
    #[serde(default)]
    pub admin: bool,
}

impl Caller {
    pub fn user(account: impl Into<AccountId>) -> Self {
        Self {
            account: account.into(),
            admin: false,
        }
    }

    pub fn admin(account: impl Into<AccountId>) -> Self {
        Self {
            account: account.into(),
            admin: true,
        }
    }

    pub fn may_act_for(&self, owner: AccountId) -> bool {
        self.admin || self.account == owner
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
