//! Contact info and create responses.

use serde_json::Value;
use tracing::debug;

use eppline_core::{
    CanonicalContact, Disclosure, DisclosureAttribute, Fault, Handle, PostalAddress,
    PostalInfoType, RegistryProfile,
};

use crate::raw::{flag, in_context, one_or_many, text, Ns};

const NS: Ns = Ns::CONTACT;

/// Sub-elements of `contact:disclose` and the attribute each one governs.
const DISCLOSE_KEYS: [(&str, DisclosureAttribute); 6] = [
    ("name", DisclosureAttribute::Name),
    ("addr", DisclosureAttribute::Address),
    ("org", DisclosureAttribute::Company),
    ("voice", DisclosureAttribute::Telephone),
    ("fax", DisclosureAttribute::Fax),
    ("email", DisclosureAttribute::Email),
];

/// Normalize `contact:infData` for the registry described by `profile`.
///
/// Only the first `contact:postalInfo` entry is used. The disclose flag is
/// read with the registry's configured polarity.
pub fn normalize_info_contact(
    raw: &Value,
    profile: &RegistryProfile,
) -> Result<CanonicalContact, Fault> {
    let inf = NS.envelope(raw, "infData")?;
    let handle = Handle(NS.require_text(inf, "id")?);

    let postal = one_or_many(NS.require(inf, "postalInfo")?);
    let first = postal
        .first()
        .copied()
        .ok_or_else(|| NS.malformed(format!("{handle}: empty contact:postalInfo")))?;
    if postal.len() > 1 {
        debug!(
            contact = %handle,
            entries = postal.len(),
            "ignoring additional postalInfo entries"
        );
    }

    let postal_info_type = match first.get("type").and_then(Value::as_str) {
        Some(t) => t
            .parse::<PostalInfoType>()
            .map_err(|e| NS.malformed(format!("{handle}: {e}")))?,
        None => PostalInfoType::default(),
    };
    let name = NS
        .require_text(first, "name")
        .map_err(|e| in_context(&handle, e))?;
    let addr = NS
        .require(first, "addr")
        .map_err(|e| in_context(&handle, e))?;

    let contact = CanonicalContact {
        registry: profile.id.clone(),
        name,
        organization: NS.opt_text(first, "org"),
        address: address(&handle, addr)?,
        postal_info_type,
        email: NS.opt_text(inf, "email"),
        voice: NS.opt_text(inf, "voice"),
        fax: NS.opt_text(inf, "fax"),
        disclosure: disclosure(inf, profile),
        auth_info: None,
        owner: None,
        handle,
    };
    debug!(contact = %contact.handle, registry = %profile.id, "normalized contact info");
    Ok(contact)
}

/// Handle the registry assigned in `contact:creData`.
pub fn normalize_create_contact(raw: &Value) -> Result<Handle, Fault> {
    let cre = NS.envelope(raw, "creData")?;
    Ok(Handle(NS.require_text(cre, "id")?))
}

fn address(handle: &Handle, addr: &Value) -> Result<PostalAddress, Fault> {
    let street: Vec<String> = one_or_many(addr.get(NS.key("street")).unwrap_or(&Value::Null))
        .into_iter()
        .filter_map(text)
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect();
    let country = NS
        .require_text(addr, "cc")
        .map_err(|e| in_context(handle, e))?
        .to_ascii_uppercase();
    let postcode = NS
        .require_text(addr, "pc")
        .map_err(|e| in_context(handle, e))?;
    Ok(PostalAddress {
        street: (!street.is_empty()).then(|| street.join(" ")),
        city: NS.opt_text(addr, "city"),
        state: NS.opt_text(addr, "sp"),
        postcode,
        country,
    })
}

/// Disclosure entries from every `contact:disclose` block.
///
/// A listed sub-element counts even when it is an empty mapping; that is
/// how an element with only attributes decodes.
fn disclosure(inf: &Value, profile: &RegistryProfile) -> Disclosure {
    let mut out = Disclosure::new();
    let blocks = inf.get(NS.key("disclose")).unwrap_or(&Value::Null);
    for block in one_or_many(blocks) {
        let Some(bit) = block.get("flag").and_then(flag) else {
            debug!(registry = %profile.id, "disclose block without a readable flag");
            continue;
        };
        let disclosed = profile.disclose_polarity.disclosed(bit);
        for (local, attr) in DISCLOSE_KEYS {
            if block.get(NS.key(local)).is_some() {
                out.set(attr, disclosed);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use eppline_core::{DisclosePolarity, FaultKind};
    use serde_json::json;

    fn profile(polarity: DisclosePolarity) -> RegistryProfile {
        let mut p = RegistryProfile::new("centralnic", &["xyz"]);
        p.disclose_polarity = polarity;
        p
    }

    #[test]
    fn street_lines_are_joined_with_spaces() {
        let raw = json!({"contact:infData": {
            "contact:id": "c-1",
            "contact:postalInfo": {
                "type": "loc",
                "contact:name": "A",
                "contact:addr": {
                    "contact:street": ["1 Road", " Suburb "],
                    "contact:pc": " 6011 ",
                    "contact:cc": "nz"
                }
            }
        }});
        let c = normalize_info_contact(&raw, &profile(DisclosePolarity::default())).expect("ok");
        assert_eq!(c.address.street.as_deref(), Some("1 Road Suburb"));
        assert_eq!(c.address.country, "NZ");
        assert_eq!(c.address.postcode, "6011");
        assert_eq!(c.postal_info_type, PostalInfoType::Loc);
        assert!(c.disclosure.is_empty());
    }

    #[test]
    fn flag_zero_under_disclosed_polarity_hides_listed() {
        let raw = json!({"contact:infData": {
            "contact:id": "c-1",
            "contact:postalInfo": {
                "contact:name": "A",
                "contact:addr": {"contact:cc": "US", "contact:pc": "23433"}
            },
            "contact:disclose": {"flag": "0", "contact:voice": {}, "contact:email": {}}
        }});
        let c = normalize_info_contact(&raw, &profile(DisclosePolarity::FlagMeansDisclosed))
            .expect("ok");
        assert_eq!(c.disclosure.get(DisclosureAttribute::Email), Some(false));
        assert_eq!(c.disclosure.get(DisclosureAttribute::Telephone), Some(false));
        assert_eq!(c.disclosure.get(DisclosureAttribute::Name), None);
    }

    #[test]
    fn missing_name_is_malformed() {
        let raw = json!({"contact:infData": {
            "contact:id": "c-1",
            "contact:postalInfo": {"contact:addr": {"contact:cc": "US"}}
        }});
        let err = normalize_info_contact(&raw, &profile(DisclosePolarity::default())).unwrap_err();
        assert!(err.to_string().contains("contact:name"));
    }

    #[test]
    fn missing_postcode_is_malformed() {
        for addr in [
            json!({"contact:cc": "US", "contact:city": "Boston"}),
            json!({"contact:cc": "US", "contact:pc": {}}),
        ] {
            let raw = json!({"contact:infData": {
                "contact:id": "c-1",
                "contact:postalInfo": {"contact:name": "A", "contact:addr": addr}
            }});
            let err =
                normalize_info_contact(&raw, &profile(DisclosePolarity::default())).unwrap_err();
            assert_eq!(err.kind(), FaultKind::MalformedResponse);
            assert!(err.to_string().contains("c-1"));
            assert!(err.to_string().contains("contact:pc"));
        }
    }

    #[test]
    fn create_returns_handle() {
        let raw = json!({"contact:creData": {"contact:id": "reg-99", "contact:crDate": "2017-01-23T02:48:25.0Z"}});
        assert_eq!(normalize_create_contact(&raw).expect("ok"), Handle::from("reg-99"));
    }
}
