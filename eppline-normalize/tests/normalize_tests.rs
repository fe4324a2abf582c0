//! Normalizer behaviour against recorded registry payloads.

use eppline_core::{
    config::DisclosePolarity, ContactRole, DisclosureAttribute, FaultKind, Handle, ProviderId,
    RegistryProfile,
};
use eppline_normalize::{normalize_check_domain, normalize_info_contact, normalize_info_domain};
use rstest::rstest;
use serde_json::{json, Value};

fn profile(polarity: DisclosePolarity) -> RegistryProfile {
    let mut p = RegistryProfile::new("centralnic", &["xyz"]);
    p.disclose_polarity = polarity;
    p
}

/// Contact info as returned by a live registry, empty elements included.
fn recorded_contact() -> Value {
    json!({
        "contact:infData": {
            "contact:authInfo": {"contact:pw": "iafbv5yoe5cg4k8cww44kk0400wg8gg"},
            "contact:clID": "H93060719",
            "contact:crDate": "2017-01-23T02:48:25.0Z",
            "contact:crID": "H93060719",
            "contact:disclose": {
                "contact:addr": {"type": "int"},
                "contact:email": {},
                "contact:fax": {},
                "contact:name": {"type": "int"},
                "contact:org": {"type": "int"},
                "contact:voice": {},
                "flag": "1"
            },
            "contact:email": "joe-test@testerson.com",
            "contact:fax": {},
            "contact:id": "reg-20",
            "contact:postalInfo": {
                "contact:addr": {
                    "contact:cc": "US",
                    "contact:city": "Boston",
                    "contact:pc": "23433",
                    "contact:sp": "MA",
                    "contact:street": "Paralala Street"
                },
                "contact:name": "Joe User",
                "contact:org": {},
                "type": "int"
            },
            "contact:roid": "C112983065-CNIC",
            "contact:status": {"s": "ok"},
            "contact:upDate": "2017-02-09T10:11:31.0Z",
            "contact:voice": "+64.11223344",
            "xmlns:contact": "urn:ietf:params:xml:ns:contact-1.0"
        }
    })
}

// ---------------------------------------------------------------------------
// 1. Check domain
// ---------------------------------------------------------------------------

#[rstest]
#[case(json!({"domain:name": {"$t": "a.xyz", "avail": "1"}}))]
#[case(json!({"domain:name": {"$t": "b.xyz", "avail": "0"}, "domain:reason": "In use"}))]
#[case(json!({"domain:name": {"$t": "c.xyz", "avail": 0}}))]
fn single_item_equals_one_element_list(#[case] item: Value) {
    let single = json!({"domain:chkData": {"domain:cd": item.clone()}});
    let wrapped = json!({"domain:chkData": {"domain:cd": [item]}});

    let a = normalize_check_domain(&single).expect("single");
    let b = normalize_check_domain(&wrapped).expect("wrapped");
    assert_eq!(a.len(), 1);
    assert_eq!(a, b);
}

#[test]
fn check_without_envelope_is_malformed() {
    let err = normalize_check_domain(&json!({"result": []})).unwrap_err();
    assert_eq!(err.kind(), FaultKind::MalformedResponse);
}

// ---------------------------------------------------------------------------
// 2. Contact info
// ---------------------------------------------------------------------------

#[test]
fn minimal_contact_normalizes_identity_and_address() {
    let raw = json!({"contact:infData": {
        "contact:email": "a@b.com",
        "contact:id": "reg-20",
        "contact:postalInfo": {
            "contact:addr": {
                "contact:cc": "US",
                "contact:city": "Boston",
                "contact:pc": "23433",
                "contact:sp": "MA",
                "contact:street": "Main Street"
            },
            "contact:name": "Joe User",
            "type": "int"
        }
    }});
    let c = normalize_info_contact(&raw, &profile(DisclosePolarity::default())).expect("normalize");
    let view = c.owner_view();
    assert_eq!(view.registry_id, "reg-20");
    assert_eq!(view.country.as_deref(), Some("US"));
    assert_eq!(view.city.as_deref(), Some("Boston"));
    assert_eq!(view.email.as_deref(), Some("a@b.com"));
    assert_eq!(view.street.as_deref(), Some("Main Street"));
}

#[test]
fn recorded_contact_treats_empty_elements_as_absent() {
    let c = normalize_info_contact(&recorded_contact(), &profile(DisclosePolarity::default()))
        .expect("normalize");
    assert_eq!(c.handle, Handle::from("reg-20"));
    assert!(c.fax.is_none());
    assert!(c.organization.is_none());
    assert_eq!(c.voice.as_deref(), Some("+64.11223344"));
    assert!(c.auth_info.is_none(), "info never copies the contact password");
}

#[rstest]
#[case(DisclosePolarity::FlagMeansDisclosed, true)]
#[case(DisclosePolarity::FlagMeansHidden, false)]
fn flag_one_follows_registry_polarity(#[case] polarity: DisclosePolarity, #[case] expect: bool) {
    let c = normalize_info_contact(&recorded_contact(), &profile(polarity)).expect("normalize");
    for attr in DisclosureAttribute::ALL {
        assert_eq!(c.disclosure.get(attr), Some(expect), "{attr:?}");
    }
}

#[test]
fn name_absent_from_disclose_adds_no_entry() {
    let mut raw = recorded_contact();
    raw["contact:infData"]["contact:disclose"]
        .as_object_mut()
        .expect("disclose")
        .remove("contact:name");
    let c = normalize_info_contact(&raw, &profile(DisclosePolarity::default())).expect("normalize");
    assert_eq!(c.disclosure.get(DisclosureAttribute::Name), None);
    assert_eq!(c.disclosure.get(DisclosureAttribute::Email), Some(true));
}

#[test]
fn only_first_postal_info_is_used() {
    let mut raw = recorded_contact();
    let first = raw["contact:infData"]["contact:postalInfo"].clone();
    let mut second = first.clone();
    second["contact:name"] = json!("Localised Name");
    second["type"] = json!("loc");
    raw["contact:infData"]["contact:postalInfo"] = json!([first, second]);

    let c = normalize_info_contact(&raw, &profile(DisclosePolarity::default())).expect("normalize");
    assert_eq!(c.name, "Joe User");
}

#[test]
fn missing_postal_info_is_malformed() {
    let mut raw = recorded_contact();
    raw["contact:infData"]
        .as_object_mut()
        .expect("infData")
        .remove("contact:postalInfo");
    let err = normalize_info_contact(&raw, &profile(DisclosePolarity::default())).unwrap_err();
    assert_eq!(err.kind(), FaultKind::MalformedResponse);
}

#[test]
fn recorded_contact_without_postcode_is_malformed() {
    let mut raw = recorded_contact();
    raw["contact:infData"]["contact:postalInfo"]["contact:addr"]
        .as_object_mut()
        .expect("addr")
        .remove("contact:pc");
    let err = normalize_info_contact(&raw, &profile(DisclosePolarity::default())).unwrap_err();
    assert_eq!(err.kind(), FaultKind::MalformedResponse);
    assert!(err.to_string().contains("reg-20"));
}

#[test]
fn public_view_of_hidden_contact_keeps_only_handle() {
    let c = normalize_info_contact(&recorded_contact(), &profile(DisclosePolarity::FlagMeansHidden))
        .expect("normalize");
    let view = c.public_view(true);
    assert_eq!(view.registry_id, "reg-20");
    assert!(view.name.is_none() && view.email.is_none() && view.city.is_none());
}

// ---------------------------------------------------------------------------
// 3. Domain info
// ---------------------------------------------------------------------------

fn domain_info(ns: Value) -> Value {
    json!({"domain:infData": {
        "domain:name": "whatever.xyz",
        "domain:roid": "D123-CNIC",
        "domain:status": {"s": "ok"},
        "domain:registrant": "reg-1",
        "domain:contact": [
            {"$t": "adm-1", "type": "admin"},
            {"$t": "tech-1", "type": "tech"},
            {"$t": "tech-2", "type": "tech"}
        ],
        "domain:ns": ns,
        "domain:authInfo": {"domain:pw": "s3cret"}
    }})
}

#[rstest]
#[case::mapping_with_list(json!({"domain:hostObj": ["ns1.host.xyz", "ns2.host.xyz"]}))]
#[case::list_of_mappings(json!([{"domain:hostObj": "ns1.host.xyz"}, {"domain:hostObj": "ns2.host.xyz"}]))]
#[case::host_attr(json!({"domain:hostAttr": [
    {"domain:hostName": "ns1.host.xyz", "domain:hostAddr": {"$t": "192.0.2.1", "ip": "v4"}},
    {"domain:hostName": "NS2.host.xyz."}
]}))]
fn every_nameserver_encoding_yields_same_list(#[case] ns: Value) {
    let d = normalize_info_domain(&domain_info(ns), &ProviderId::from("centralnic"), false)
        .expect("normalize");
    assert_eq!(d.nameservers, ["ns1.host.xyz", "ns2.host.xyz"]);
}

#[test]
fn single_nameserver_mapping_is_one_host() {
    let raw = domain_info(json!({"domain:hostObj": "ns1.host.xyz"}));
    let d = normalize_info_domain(&raw, &ProviderId::from("centralnic"), false).expect("normalize");
    assert_eq!(d.nameservers, ["ns1.host.xyz"]);
}

#[test]
fn unprivileged_read_never_carries_secrets() {
    let raw = domain_info(json!({"domain:hostObj": "ns1.host.xyz"}));
    let d = normalize_info_domain(&raw, &ProviderId::from("centralnic"), false).expect("normalize");
    assert!(d.auth_info.is_none());
    assert!(d.roid.is_none());

    let json = serde_json::to_string(&d).expect("serialize");
    assert!(!json.contains("s3cret"));
    assert!(!json.contains("D123-CNIC"));
}

#[test]
fn contacts_split_into_role_and_handle() {
    let raw = domain_info(json!([]));
    let d = normalize_info_domain(&raw, &ProviderId::from("centralnic"), true).expect("normalize");
    let tech: Vec<_> = d.contacts_for(ContactRole::Tech).map(|h| h.0.as_str()).collect();
    assert_eq!(tech, ["tech-1", "tech-2"]);
    assert_eq!(d.auth_info.as_deref(), Some("s3cret"));
    assert!(d.nameservers.is_empty());
}
