//! Wire model: DynamoDB type codes, attribute values, and the encoder that
//! turns runtime `Value`s into them.

mod encode;


pub use encode::{Encoder, EncodingError};

use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt::{self, Display},
};

/// One stored item: attribute name to wire value.
pub type Item = HashMap<String, AttributeValue>;

///
/// WireType
///
/// The store's primitive type tags. Tokens are the DynamoDB type codes.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[remain::sorted]
pub enum WireType {
    #[serde(rename = "B")]
    Binary,
    #[serde(rename = "BS")]
    BinarySet,
    #[serde(rename = "BOOL")]
    Boolean,
    #[serde(rename = "L")]
    List,
    #[serde(rename = "M")]
    Map,
    #[serde(rename = "NULL")]
    Null,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "NS")]
    NumberSet,
    #[serde(rename = "S")]
    String,
    #[serde(rename = "SS")]
    StringSet,
}

impl WireType {
    pub const ALL: [Self; 10] = [
        Self::Binary,
        Self::BinarySet,
        Self::Boolean,
        Self::List,
        Self::Map,
        Self::Null,
        Self::Number,
        Self::NumberSet,
        Self::String,
        Self::StringSet,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Binary => "B",
            Self::BinarySet => "BS",
            Self::Boolean => "BOOL",
            Self::List => "L",
            Self::Map => "M",
            Self::Null => "NULL",
            Self::Number => "N",
            Self::NumberSet => "NS",
            Self::String => "S",
            Self::StringSet => "SS",
        }
    }

    /// Match a type-code token, ignoring ASCII case.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();

        Self::ALL
            .into_iter()
            .find(|ty| ty.code().eq_ignore_ascii_case(token))
    }

    /// Types a key attribute may have.
    #[must_use]
    pub const fn is_key_scalar(self) -> bool {
        matches!(self, Self::String | Self::Number | Self::Binary)
    }

    #[must_use]
    pub const fn is_set(self) -> bool {
        matches!(self, Self::StringSet | Self::NumberSet | Self::BinarySet)
    }
}

impl Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

///
/// AttributeValue
///
/// One encoded attribute. Numbers travel as decimal strings.
///

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    B(Vec<u8>),
    Bool(bool),
    Bs(Vec<Vec<u8>>),
    L(Vec<Self>),
    M(HashMap<String, Self>),
    N(String),
    Ns(Vec<String>),
    Null(bool),
    S(String),
    Ss(Vec<String>),
}

impl AttributeValue {
    #[must_use]
    pub const fn wire_type(&self) -> WireType {
        match self {
            Self::B(_) => WireType::Binary,
            Self::Bool(_) => WireType::Boolean,
            Self::Bs(_) => WireType::BinarySet,
            Self::L(_) => WireType::List,
            Self::M(_) => WireType::Map,
            Self::N(_) => WireType::Number,
            Self::Ns(_) => WireType::NumberSet,
            Self::Null(_) => WireType::Null,
            Self::S(_) => WireType::String,
            Self::Ss(_) => WireType::StringSet,
        }
    }

    #[must_use]
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_m(&self) -> Option<&HashMap<String, Self>> {
        match self {
            Self::M(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null(true))
    }
}
