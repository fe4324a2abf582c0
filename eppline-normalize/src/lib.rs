//! eppline-normalize: turn decoded registry responses into canonical records.
//!
//! Pure functions over `serde_json::Value`. Nothing here performs I/O; every
//! structural problem is reported as [`eppline_core::Fault::MalformedResponse`].

pub mod check;
pub mod contact;
pub mod domain;
pub mod host;
pub mod raw;

pub use check::{normalize_check_domain, normalize_check_host};
pub use contact::{normalize_create_contact, normalize_info_contact};
pub use domain::{normalize_create_domain, normalize_info_domain, DomainCreation};
pub use host::{normalize_create_host, normalize_info_host, HostCreation};
