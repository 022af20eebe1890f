use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

pub type Term = String;
pub type DocKey = u32;

// document id -> normalized token sequence, as produced by the tokenizer
pub type TokenizedDocs = BTreeMap<DocId, Vec<Term>>;

pub const DOC_PREFIX: &str = "Doc";

/// Document identifier.
///
/// A canonical name (`Doc7`) carries a numeric key, which is what postings
/// are ordered and gap-encoded by. Any other name is still a valid document
/// id for indexing and ranking, it just has no key and sorts after every
/// keyed id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocId {
    key: Option<DocKey>,
    name: String,
}

impl DocId {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        DocId {
            key: Self::parse_key(&name),
            name,
        }
    }

    pub fn from_key(key: DocKey) -> Self {
        DocId {
            key: Some(key),
            name: format!("{}{}", DOC_PREFIX, key),
        }
    }

    // "Doc" followed by digits without leading zeros, so that every key maps
    // back to exactly one name
    fn parse_key(name: &str) -> Option<DocKey> {
        let digits = name.strip_prefix(DOC_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return None;
        }
        digits.parse().ok()
    }

    pub fn key(&self) -> Option<DocKey> {
        self.key
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl Ord for DocId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.key, other.key) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.name.cmp(&other.name),
        }
    }
}

impl PartialOrd for DocId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for DocId {
    fn from(name: &str) -> Self {
        DocId::new(name)
    }
}

impl From<String> for DocId {
    fn from(name: String) -> Self {
        DocId::new(name)
    }
}

impl Serialize for DocId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl<'de> Deserialize<'de> for DocId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(DocId::new(name))
    }
}
