//! Derived table schema: attribute definitions, primary key, secondary
//! indexes.

mod derive;


pub use derive::{derive_from_tables, derive_schema};

use crate::wire::WireType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

///
/// AttributeDefinition
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct AttributeDefinition {
    pub name: String,
    pub wire_type: WireType,
}

impl AttributeDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, wire_type: WireType) -> Self {
        Self {
            name: name.into(),
            wire_type,
        }
    }
}

///
/// KeyRole
///
/// Partition ⇒ `HASH`, sort ⇒ `RANGE`.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum KeyRole {
    #[serde(rename = "HASH")]
    Partition,
    #[serde(rename = "RANGE")]
    Sort,
}

impl KeyRole {
    #[must_use]
    pub const fn key_type(self) -> &'static str {
        match self {
            Self::Partition => "HASH",
            Self::Sort => "RANGE",
        }
    }

    /// Case-insensitive; accepts both `partition`/`sort` and `hash`/`range`.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();

        if token.eq_ignore_ascii_case("partition") || token.eq_ignore_ascii_case("hash") {
            Some(Self::Partition)
        } else if token.eq_ignore_ascii_case("sort") || token.eq_ignore_ascii_case("range") {
            Some(Self::Sort)
        } else {
            None
        }
    }
}

///
/// KeySchemaElement
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub role: KeyRole,
}

impl KeySchemaElement {
    #[must_use]
    pub fn new(attribute_name: impl Into<String>, role: KeyRole) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            role,
        }
    }
}

///
/// ProjectionMode
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionMode {
    All,
    Include,
    KeysOnly,
}

impl ProjectionMode {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "include" => Some(Self::Include),
            "keys_only" | "keysonly" => Some(Self::KeysOnly),
            _ => None,
        }
    }
}

///
/// Throughput
/// Provisioned read/write capacity units.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Throughput {
    pub read: u64,
    pub write: u64,
}

impl Throughput {
    #[must_use]
    pub const fn new(read: u64, write: u64) -> Self {
        Self { read, write }
    }
}

impl Default for Throughput {
    fn default() -> Self {
        Self::new(5, 5)
    }
}

///
/// SecondaryIndex
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SecondaryIndex {
    pub name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: ProjectionMode,

    /// Only populated for `INCLUDE` projections.
    pub non_key_attributes: Vec<String>,

    /// Present when any member annotation carried a non-zero hint.
    pub throughput: Option<Throughput>,
}

impl SecondaryIndex {
    #[must_use]
    pub fn partition_key(&self) -> Option<&str> {
        key_name(&self.key_schema, KeyRole::Partition)
    }

    #[must_use]
    pub fn sort_key(&self) -> Option<&str> {
        key_name(&self.key_schema, KeyRole::Sort)
    }
}

fn key_name(elements: &[KeySchemaElement], role: KeyRole) -> Option<&str> {
    elements
        .iter()
        .find(|e| e.role == role)
        .map(|e| e.attribute_name.as_str())
}

///
/// Schema
///
/// Immutable result of `derive_schema`. Attribute definitions are sorted by
/// name, indexes by index name; the key schema is partition then sort.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Schema {
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    pub secondary_indexes: Vec<SecondaryIndex>,
}

impl Schema {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attribute_definitions.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn partition_key(&self) -> Option<&str> {
        key_name(&self.key_schema, KeyRole::Partition)
    }

    #[must_use]
    pub fn sort_key(&self) -> Option<&str> {
        key_name(&self.key_schema, KeyRole::Sort)
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&SecondaryIndex> {
        self.secondary_indexes.iter().find(|i| i.name == name)
    }

    /// Names of every attribute used by the table or an index key.
    #[must_use]
    pub fn key_attribute_names(&self) -> BTreeSet<&str> {
        self.key_schema
            .iter()
            .chain(self.secondary_indexes.iter().flat_map(|i| &i.key_schema))
            .map(|e| e.attribute_name.as_str())
            .collect()
    }

    /// The definitions a create-table request carries: key attributes only.
    #[must_use]
    pub fn key_attribute_definitions(&self) -> Vec<AttributeDefinition> {
        let names = self.key_attribute_names();

        self.attribute_definitions
            .iter()
            .filter(|a| names.contains(a.name.as_str()))
            .cloned()
            .collect()
    }
}
