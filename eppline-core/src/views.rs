//! Result shapes handed to outer layers (REST, CLI).
//!
//! Contact views are filtered by the caller's disclosure entitlement; domain
//! views only carry `auth_info`/`roid` when the source record does.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CanonicalContact, CanonicalDomain, ContactRole, DisclosureAttribute, Handle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainView {
    pub domain: String,
    pub contacts: BTreeMap<ContactRole, Vec<Handle>>,
    pub registrant: Handle,
    pub nameservers: Vec<String>,
    pub status: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub expiration: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roid: Option<String>,
}

impl From<&CanonicalDomain> for DomainView {
    fn from(d: &CanonicalDomain) -> Self {
        let mut contacts: BTreeMap<ContactRole, Vec<Handle>> = BTreeMap::new();
        for c in &d.contacts {
            contacts.entry(c.role).or_default().push(c.handle.clone());
        }
        Self {
            domain: d.name.clone(),
            contacts,
            registrant: d.registrant.clone(),
            nameservers: d.nameservers.clone(),
            status: d.statuses.clone(),
            created: d.created,
            expiration: d.expires,
            auth_info: d.auth_info.clone(),
            roid: d.roid.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactView {
    pub registry_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_info_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
}

impl CanonicalContact {
    /// Everything, for the owner or an admin.
    pub fn owner_view(&self) -> ContactView {
        self.view_with(|_| true)
    }

    /// Only disclosed attributes. `undeclared_disclosed` applies to
    /// attributes the disclosure map does not mention.
    pub fn public_view(&self, undeclared_disclosed: bool) -> ContactView {
        self.view_with(|attr| self.disclosure.is_disclosed(attr, undeclared_disclosed))
    }

    fn view_with(&self, show: impl Fn(DisclosureAttribute) -> bool) -> ContactView {
        let mut view = ContactView {
            registry_id: self.handle.0.clone(),
            ..ContactView::default()
        };
        if show(DisclosureAttribute::Name) {
            view.name = Some(self.name.clone());
        }
        if show(DisclosureAttribute::Email) {
            view.email = self.email.clone();
        }
        if show(DisclosureAttribute::Company) {
            view.company = self.organization.clone();
        }
        if show(DisclosureAttribute::Telephone) {
            view.telephone = self.voice.clone();
        }
        if show(DisclosureAttribute::Fax) {
            view.fax = self.fax.clone();
        }
        if show(DisclosureAttribute::Address) {
            view.street = self.address.street.clone();
            view.city = self.address.city.clone();
            view.state = self.address.state.clone();
            view.country = Some(self.address.country.clone());
            view.postcode = Some(self.address.postcode.clone());
            view.postal_info_type = Some(self.postal_info_type.as_str().to_owned());
        }
        view
    }
}
