//! Accessors over decoded protocol trees.
//!
//! The transport decodes XML into JSON-like values with a few conventions
//! every accessor here has to absorb:
//!
//! - an element that repeats becomes an array, but a single occurrence is a
//!   bare object or string ([`one_or_many`]);
//! - an element with attributes becomes an object whose text lives under
//!   `$t` ([`text`]);
//! - an empty element becomes `{}` and is treated as absent.

use chrono::{DateTime, Utc};
use serde_json::Value;

use eppline_core::{Fault, ObjectKind};

/// Key under which element text is stored when the element has attributes.
pub const TEXT_KEY: &str = "$t";

/// View a value that may hold one item or a list of items as a list.
///
/// `null` is an empty list; anything that is not an array is a one-element
/// list.
pub fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// Text content of an element: a bare string, a number, or `$t` of an object.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get(TEXT_KEY).and_then(text),
        _ => None,
    }
}

/// Parse a protocol boolean: `1`/`0`, `"1"`/`"0"`, `true`/`false`.
pub fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n == 1),
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Strip the namespace prefix from a qualified key: `domain:name` → `name`.
pub fn strip_namespace(key: &str) -> &str {
    key.split_once(':').map(|(_, local)| local).unwrap_or(key)
}

/// Accessor bound to one object kind's namespace.
///
/// `Ns::new(ObjectKind::Domain).key("name")` is `"domain:name"`, and every
/// error it raises names the object kind.
#[derive(Debug, Clone, Copy)]
pub struct Ns {
    kind: ObjectKind,
}

impl Ns {
    pub const DOMAIN: Ns = Ns::new(ObjectKind::Domain);
    pub const CONTACT: Ns = Ns::new(ObjectKind::Contact);
    pub const HOST: Ns = Ns::new(ObjectKind::Host);

    pub const fn new(kind: ObjectKind) -> Self {
        Self { kind }
    }

    pub fn kind(self) -> ObjectKind {
        self.kind
    }

    pub fn key(self, local: &str) -> String {
        format!("{}:{local}", self.kind.namespace())
    }

    /// Child element `local`, if present and not empty.
    pub fn get<'a>(self, node: &'a Value, local: &str) -> Option<&'a Value> {
        node.get(self.key(local)).filter(|v| !is_empty(v))
    }

    pub fn require<'a>(self, node: &'a Value, local: &str) -> Result<&'a Value, Fault> {
        self.get(node, local)
            .ok_or_else(|| self.malformed(format!("missing {}", self.key(local))))
    }

    pub fn opt_text(self, node: &Value, local: &str) -> Option<String> {
        self.get(node, local)
            .and_then(text)
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
    }

    pub fn require_text(self, node: &Value, local: &str) -> Result<String, Fault> {
        self.opt_text(node, local)
            .ok_or_else(|| self.malformed(format!("missing or empty {}", self.key(local))))
    }

    /// Optional RFC 3339 timestamp; present-but-unparseable is malformed.
    pub fn opt_timestamp(self, node: &Value, local: &str) -> Result<Option<DateTime<Utc>>, Fault> {
        let Some(raw) = self.opt_text(node, local) else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| self.malformed(format!("{} '{raw}' is not a timestamp: {e}", self.key(local))))
    }

    /// Descend into the response envelope, e.g. `domain:infData`.
    pub fn envelope<'a>(self, raw: &'a Value, local: &str) -> Result<&'a Value, Fault> {
        match raw.get(self.key(local)) {
            Some(v) if v.is_object() => Ok(v),
            Some(_) => Err(self.malformed(format!("{} is not a mapping", self.key(local)))),
            None => Err(self.malformed(format!("missing {}", self.key(local)))),
        }
    }

    /// Status values, which arrive as `{"s": "ok"}` items or bare strings.
    pub fn statuses(self, node: &Value) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for item in one_or_many(node.get(self.key("status")).unwrap_or(&Value::Null)) {
            let value = match item {
                Value::Object(map) => map.get("s").and_then(text),
                other => text(other),
            };
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                if !out.contains(&v) {
                    out.push(v);
                }
            }
        }
        out
    }

    pub fn malformed(self, detail: impl Into<String>) -> Fault {
        Fault::malformed(self.kind, detail)
    }
}

/// Prefix a malformed-response detail with the object it was found in.
pub fn in_context(context: &impl std::fmt::Display, fault: Fault) -> Fault {
    match fault {
        Fault::MalformedResponse { object, detail } => Fault::MalformedResponse {
            object,
            detail: format!("{context}: {detail}"),
        },
        other => other,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
