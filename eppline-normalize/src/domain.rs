//! Domain info and create responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use eppline_core::names;
use eppline_core::{CanonicalDomain, ContactRole, DomainContact, Fault, Handle, ProviderId};

use crate::raw::{one_or_many, text, Ns};

const NS: Ns = Ns::DOMAIN;

/// What a registry reports back from a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCreation {
    pub name: String,
    pub created: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
}

/// Normalize `domain:infData`.
///
/// `auth_info` and `roid` are only read when `privileged` is set; otherwise
/// they are never copied out of the raw tree.
pub fn normalize_info_domain(
    raw: &Value,
    registry: &ProviderId,
    privileged: bool,
) -> Result<CanonicalDomain, Fault> {
    let inf = NS.envelope(raw, "infData")?;
    let name = names::normalize_fqdn(&NS.require_text(inf, "name")?)
        .map_err(|e| NS.malformed(e.to_string()))?;
    let zone = names::parent_of(&name)
        .ok_or_else(|| NS.malformed(format!("'{name}' has no zone")))?
        .to_owned();
    let registrant = Handle(NS.require_text(inf, "registrant")?);

    let (auth_info, roid) = if privileged {
        let auth = NS
            .get(inf, "authInfo")
            .and_then(|a| NS.opt_text(a, "pw"));
        (auth, NS.opt_text(inf, "roid"))
    } else {
        (None, None)
    };

    let domain = CanonicalDomain {
        zone,
        registry: registry.clone(),
        statuses: NS.statuses(inf),
        registrant,
        contacts: contacts(inf)?,
        nameservers: nameservers(inf.get(NS.key("ns")).unwrap_or(&Value::Null))?,
        created: NS.opt_timestamp(inf, "crDate")?,
        expires: NS.opt_timestamp(inf, "exDate")?,
        auth_info,
        roid,
        name,
    };
    debug!(
        domain = %domain.name,
        registry = %registry,
        contacts = domain.contacts.len(),
        nameservers = domain.nameservers.len(),
        "normalized domain info"
    );
    Ok(domain)
}

/// Normalize `domain:creData`.
pub fn normalize_create_domain(raw: &Value) -> Result<DomainCreation, Fault> {
    let cre = NS.envelope(raw, "creData")?;
    Ok(DomainCreation {
        name: NS.require_text(cre, "name")?.to_ascii_lowercase(),
        created: NS.opt_timestamp(cre, "crDate")?,
        expires: NS.opt_timestamp(cre, "exDate")?,
    })
}

fn contacts(inf: &Value) -> Result<Vec<DomainContact>, Fault> {
    let raw = inf.get(NS.key("contact")).unwrap_or(&Value::Null);
    one_or_many(raw)
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let handle = text(c)
                .map(|h| h.trim().to_owned())
                .filter(|h| !h.is_empty())
                .ok_or_else(|| NS.malformed(format!("contact[{i}] has no handle")))?;
            let role = c
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| NS.malformed(format!("contact[{i}] ({handle}) has no type")))?
                .parse::<ContactRole>()
                .map_err(|e| NS.malformed(format!("contact[{i}]: {e}")))?;
            Ok(DomainContact {
                role,
                handle: Handle(handle),
            })
        })
        .collect()
}

/// Hostnames from every `domain:ns` encoding registries produce:
///
/// - `{"domain:hostObj": ["a", "b"]}` or `{"domain:hostObj": "a"}`
/// - `[{"domain:hostObj": "a"}, {"domain:hostObj": "b"}]`
/// - `{"domain:hostAttr": [{"domain:hostName": "a", …}, …]}`
///
/// Order is preserved and duplicates are dropped.
fn nameservers(ns: &Value) -> Result<Vec<String>, Fault> {
    let mut out: Vec<String> = Vec::new();
    for block in one_or_many(ns) {
        if !block.is_object() {
            return Err(NS.malformed(format!("domain:ns entry is not a mapping: {block}")));
        }
        let obj = block.get(NS.key("hostObj")).unwrap_or(&Value::Null);
        for host in one_or_many(obj) {
            push_host(&mut out, text(host))?;
        }
        let attr = block.get(NS.key("hostAttr")).unwrap_or(&Value::Null);
        for host in one_or_many(attr) {
            push_host(&mut out, NS.opt_text(host, "hostName"))?;
        }
    }
    Ok(out)
}

fn push_host(out: &mut Vec<String>, host: Option<String>) -> Result<(), Fault> {
    let host = host
        .map(|h| h.trim().trim_end_matches('.').to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| NS.malformed("empty nameserver entry"))?;
    if !out.contains(&host) {
        out.push(host);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(ns: Value) -> Value {
        json!({"domain:infData": {
            "domain:name": "Whatever.XYZ",
            "domain:roid": "D1-CNIC",
            "domain:status": [{"s": "ok"}],
            "domain:registrant": "reg-1",
            "domain:contact": [
                {"$t": "adm-1", "type": "admin"},
                {"$t": "tech-1", "type": "tech"}
            ],
            "domain:ns": ns,
            "domain:crDate": "2017-01-23T02:48:25.0Z",
            "domain:exDate": "2018-01-23T23:59:59.0Z",
            "domain:authInfo": {"domain:pw": "s3cret"}
        }})
    }

    #[test]
    fn basic_info_fields() {
        let raw = info(json!({"domain:hostObj": ["ns1.a.xyz", "ns2.a.xyz"]}));
        let d = normalize_info_domain(&raw, &ProviderId::from("p"), false).expect("normalize");
        assert_eq!(d.name, "whatever.xyz");
        assert_eq!(d.zone, "xyz");
        assert_eq!(d.registrant, Handle::from("reg-1"));
        assert_eq!(d.contacts_for(ContactRole::Admin).count(), 1);
        assert_eq!(d.statuses, ["ok"]);
        assert!(d.created.is_some() && d.expires.is_some());
    }

    #[test]
    fn privileged_read_copies_auth_and_roid() {
        let raw = info(json!({"domain:hostObj": "ns1.a.xyz"}));
        let d = normalize_info_domain(&raw, &ProviderId::from("p"), true).expect("normalize");
        assert_eq!(d.auth_info.as_deref(), Some("s3cret"));
        assert_eq!(d.roid.as_deref(), Some("D1-CNIC"));
    }

    #[test]
    fn unknown_contact_role_is_malformed() {
        let mut raw = info(json!({}));
        raw["domain:infData"]["domain:contact"] = json!({"$t": "x", "type": "owner"});
        assert!(normalize_info_domain(&raw, &ProviderId::from("p"), false).is_err());
    }

    #[test]
    fn missing_registrant_is_malformed() {
        let mut raw = info(json!({}));
        raw["domain:infData"]
            .as_object_mut()
            .expect("object")
            .remove("domain:registrant");
        let err = normalize_info_domain(&raw, &ProviderId::from("p"), false).unwrap_err();
        assert!(err.to_string().contains("domain:registrant"));
    }

    #[test]
    fn create_data_is_read() {
        let raw = json!({"domain:creData": {
            "domain:name": "a.xyz",
            "domain:crDate": "2017-01-23T02:48:25.0Z",
            "domain:exDate": "2018-01-23T02:48:25.0Z"
        }});
        let created = normalize_create_domain(&raw).expect("normalize");
        assert_eq!(created.name, "a.xyz");
        assert!(created.expires > created.created);
    }
}
