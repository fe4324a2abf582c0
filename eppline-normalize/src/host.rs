//! Host (nameserver object) info and create responses.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use eppline_core::{CanonicalHost, Fault, HostAddress, ProviderId};

use crate::raw::{one_or_many, text, Ns};

const NS: Ns = Ns::HOST;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCreation {
    pub name: String,
    pub created: Option<DateTime<Utc>>,
}

/// Normalize `host:infData`. Addresses arrive as `{"$t": ip, "ip": "v4"}`
/// items or bare strings; the version is derived from the address itself.
pub fn normalize_info_host(raw: &Value, registry: &ProviderId) -> Result<CanonicalHost, Fault> {
    let inf = NS.envelope(raw, "infData")?;
    let name = NS.require_text(inf, "name")?.to_ascii_lowercase();

    let mut addresses = Vec::new();
    for (i, item) in one_or_many(inf.get(NS.key("addr")).unwrap_or(&Value::Null))
        .into_iter()
        .enumerate()
    {
        let raw_ip = text(item)
            .ok_or_else(|| NS.malformed(format!("{name}: addr[{i}] has no text")))?;
        let ip: IpAddr = raw_ip
            .trim()
            .parse()
            .map_err(|e| NS.malformed(format!("{name}: addr[{i}] '{raw_ip}': {e}")))?;
        addresses.push(HostAddress::new(ip));
    }

    Ok(CanonicalHost {
        registry: registry.clone(),
        addresses,
        statuses: NS.statuses(inf),
        created: NS.opt_timestamp(inf, "crDate")?,
        name,
    })
}

/// Normalize `host:creData`.
pub fn normalize_create_host(raw: &Value) -> Result<HostCreation, Fault> {
    let cre = NS.envelope(raw, "creData")?;
    Ok(HostCreation {
        name: NS.require_text(cre, "name")?.to_ascii_lowercase(),
        created: NS.opt_timestamp(cre, "crDate")?,
    })
}
