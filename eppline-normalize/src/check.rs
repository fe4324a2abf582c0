//! Availability checks: `domain:chkData` / `host:chkData`.

use serde_json::Value;
use tracing::warn;

use eppline_core::{AvailabilityResult, Fault};

use crate::raw::{flag, one_or_many, text, Ns};

/// One result per `domain:cd` item, in response order.
pub fn normalize_check_domain(raw: &Value) -> Result<Vec<AvailabilityResult>, Fault> {
    normalize_check(Ns::DOMAIN, raw)
}

/// One result per `host:cd` item, in response order.
pub fn normalize_check_host(raw: &Value) -> Result<Vec<AvailabilityResult>, Fault> {
    normalize_check(Ns::HOST, raw)
}

fn normalize_check(ns: Ns, raw: &Value) -> Result<Vec<AvailabilityResult>, Fault> {
    let chk = ns.envelope(raw, "chkData")?;
    let items = chk.get(ns.key("cd")).unwrap_or(&Value::Null);
    one_or_many(items)
        .into_iter()
        .enumerate()
        .map(|(i, item)| check_item(ns, i, item))
        .collect()
}

fn check_item(ns: Ns, index: usize, item: &Value) -> Result<AvailabilityResult, Fault> {
    let name_node = item
        .get(ns.key("name"))
        .ok_or_else(|| ns.malformed(format!("cd[{index}] has no {}", ns.key("name"))))?;
    let name = text(name_node)
        .map(|n| n.trim().to_ascii_lowercase())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ns.malformed(format!("cd[{index}] has an empty name")))?;
    let avail = name_node
        .get("avail")
        .ok_or_else(|| ns.malformed(format!("cd[{index}] ({name}) has no avail flag")))?;
    let available = flag(avail).ok_or_else(|| {
        ns.malformed(format!("cd[{index}] ({name}) has unreadable avail flag {avail}"))
    })?;

    if available {
        return Ok(AvailabilityResult::available(name));
    }
    let reason = ns.opt_text(item, "reason").unwrap_or_else(|| {
        warn!(object = %ns.kind(), name = %name, "unavailable without a reason");
        String::new()
    });
    Ok(AvailabilityResult::unavailable(name, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eppline_core::FaultKind;
    use serde_json::json;

    #[test]
    fn single_item_is_not_a_list() {
        let raw = json!({"domain:chkData": {"domain:cd": {
            "domain:name": {"$t": "Whatever.XYZ", "avail": "1"}
        }}});
        let out = normalize_check_domain(&raw).expect("normalize");
        assert_eq!(out, vec![AvailabilityResult::available("whatever.xyz")]);
    }

    #[test]
    fn unavailable_carries_reason() {
        let raw = json!({"domain:chkData": {"domain:cd": [
            {"domain:name": {"$t": "a.xyz", "avail": 1}},
            {"domain:name": {"$t": "b.xyz", "avail": "0"}, "domain:reason": "In use"}
        ]}});
        let out = normalize_check_domain(&raw).expect("normalize");
        assert!(out[0].available);
        assert_eq!(out[1], AvailabilityResult::unavailable("b.xyz", "In use"));
    }

    #[test]
    fn missing_reason_defaults_to_empty() {
        let raw = json!({"domain:chkData": {"domain:cd": {
            "domain:name": {"$t": "b.xyz", "avail": "0"}
        }}});
        let out = normalize_check_domain(&raw).expect("normalize");
        assert_eq!(out[0].reason.as_deref(), Some(""));
    }

    #[test]
    fn missing_avail_is_malformed() {
        let raw = json!({"domain:chkData": {"domain:cd": {"domain:name": "a.xyz"}}});
        let err = normalize_check_domain(&raw).unwrap_err();
        assert_eq!(err.kind(), FaultKind::MalformedResponse);
    }

    #[test]
    fn host_checks_use_host_namespace() {
        let raw = json!({"host:chkData": {"host:cd": {
            "host:name": {"$t": "ns1.a.xyz", "avail": "0"}, "host:reason": "exists"
        }}});
        let out = normalize_check_host(&raw).expect("normalize");
        assert_eq!(out[0].name, "ns1.a.xyz");
        assert!(!out[0].available);
    }

    #[test]
    fn empty_check_data_yields_nothing() {
        let raw = json!({"domain:chkData": {}});
        assert!(normalize_check_domain(&raw).expect("normalize").is_empty());
    }
}
