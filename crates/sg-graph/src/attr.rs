use core::fmt;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sg_core::{Error, Result};

/// Free-form attribute map attached to nodes, edges and graphs.
pub type Attributes = BTreeMap<String, AttrValue>;

/// JSON-like attribute value.
///
/// `Display` yields the canonical text used when matching attribute filters,
/// so `Int(2)` and `Str("2")` compare equal there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(DateTime<Utc>),
    Str(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// Scalars are the values a flat record store can hold directly.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::DateTime(_) | Self::Str(_)
        )
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Str(v) => write!(f, "{v}"),
            Self::List(_) | Self::Map(_) => {
                let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{s}")
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Key-wise merge where `from` wins on conflicts.
pub fn merge_overwrite(into: &mut Attributes, from: &Attributes) {
    for (k, v) in from {
        into.insert(k.clone(), v.clone());
    }
}

/// Key-wise merge that only fills keys `into` does not have yet.
pub fn merge_missing(into: &mut Attributes, from: &Attributes) {
    for (k, v) in from {
        into.entry(k.clone()).or_insert_with(|| v.clone());
    }
}

/// Type reconciliation used when two coincident elements merge.
///
/// Different non-null types concatenate as `a-b`; otherwise the non-null one
/// wins.
pub fn merge_types(existing: Option<&str>, incoming: Option<&str>) -> Option<String> {
    match (existing, incoming) {
        (Some(a), Some(b)) if a != b => Some(format!("{a}-{b}")),
        (Some(a), _) => Some(a.to_owned()),
        (None, Some(b)) => Some(b.to_owned()),
        (None, None) => None,
    }
}

/// True when every key in `filter` exists in `candidate` with the same text.
pub fn attributes_match(candidate: &Attributes, filter: &Attributes) -> bool {
    filter.iter().all(|(k, want)| {
        candidate
            .get(k)
            .is_some_and(|have| have.to_string() == want.to_string())
    })
}

/// Parses a JSON object into attributes.
pub fn parse_attributes(json: &str) -> Result<Attributes> {
    serde_json::from_str(json).map_err(|e| Error::invalid("attributes", e.to_string()))
}
