//! Domain-name helpers.
//!
//! Names are handled in their ASCII (A-label) form. Unicode input must be
//! converted to punycode before it reaches this crate.

use crate::error::Fault;

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Lower-case, strip a trailing root dot, and validate letter-digit-hyphen
/// syntax for every label.
pub fn normalize_fqdn(name: &str) -> Result<String, Fault> {
    let trimmed = name.trim().trim_end_matches('.');
    let lowered = trimmed.to_ascii_lowercase();
    if lowered.is_empty() {
        return Err(invalid(name, "empty name"));
    }
    if lowered.len() > MAX_NAME_LEN {
        return Err(invalid(name, "name longer than 253 octets"));
    }
    for label in lowered.split('.') {
        check_label(name, label)?;
    }
    Ok(lowered)
}

/// Validate a single label (the part a user types before the zone).
pub fn normalize_label(label: &str) -> Result<String, Fault> {
    let lowered = label.trim().to_ascii_lowercase();
    if lowered.contains('.') {
        return Err(invalid(label, "label must not contain dots"));
    }
    check_label(label, &lowered)?;
    Ok(lowered)
}

/// Everything after the first label: `"www.example.co.nz"` → `"example.co.nz"`.
pub fn parent_of(fqdn: &str) -> Option<&str> {
    fqdn.split_once('.').map(|(_, rest)| rest).filter(|r| !r.is_empty())
}

/// True when `fqdn` is `zone` itself or lives under it.
pub fn is_within_zone(fqdn: &str, zone: &str) -> bool {
    fqdn.len() > zone.len()
        && fqdn.ends_with(zone)
        && fqdn.as_bytes()[fqdn.len() - zone.len() - 1] == b'.'
}

fn check_label(original: &str, label: &str) -> Result<(), Fault> {
    if label.is_empty() {
        return Err(invalid(original, "empty label"));
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(invalid(original, "label longer than 63 octets"));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(invalid(original, "label starts or ends with a hyphen"));
    }
    if !label
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(invalid(original, "only letters, digits and hyphens are allowed"));
    }
    Ok(())
}

fn invalid(name: &str, reason: &str) -> Fault {
    Fault::InvalidName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    }
}
