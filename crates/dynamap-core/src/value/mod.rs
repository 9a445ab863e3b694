#[cfg(test)]
mod tests;

use crate::{
    model::FieldSchema,
    traits::Fields,
    types::{Blob, Timestamp},
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// ValueError
///
/// A runtime value did not fit the Rust type it was written into.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValueError {
    #[error("field '{field}': {source}")]
    Field {
        field: &'static str,
        #[source]
        source: Box<Self>,
    },

    #[error("invalid timestamp {0}")]
    InvalidTimestamp(String),

    #[error("value {value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("record value of '{found}' cannot populate '{expected}'")]
    RecordMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl ValueError {
    #[must_use]
    pub fn type_mismatch(expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.kind_name(),
        }
    }

    #[must_use]
    pub fn out_of_range(value: impl ToString, target: &'static str) -> Self {
        Self::OutOfRange {
            value: value.to_string(),
            target,
        }
    }

    #[must_use]
    pub fn in_field(self, field: &'static str) -> Self {
        Self::Field {
            field,
            source: Box::new(self),
        }
    }
}

///
/// Value
///
/// Runtime field value exchanged through descriptor accessors.
///
/// Null   → `Option::None`
/// Set    → unordered collection; encodes to SS/NS/BS when homogeneous
/// Record → a nested `Fields` type, carried with its own descriptor table
///

#[derive(Clone, Debug, PartialEq)]
#[remain::sorted]
pub enum Value {
    Blob(Vec<u8>),
    Bool(bool),
    Float(f64),
    Int(i64),
    List(Vec<Self>),
    Map(BTreeMap<String, Self>),
    Null,
    Record(RecordValue),
    Set(Vec<Self>),
    Text(String),
    Timestamp(Timestamp),
    Uint(u64),
}

impl Value {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Blob(_) => "blob",
            Self::Bool(_) => "bool",
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Null => "null",
            Self::Record(_) => "record",
            Self::Set(_) => "set",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Uint(_) => "uint",
        }
    }

    /// Zero / empty check used by the `omitempty` option.
    #[must_use]
    pub fn is_empty_like(&self) -> bool {
        match self {
            Self::Null | Self::Bool(false) | Self::Int(0) | Self::Uint(0) => true,
            Self::Float(f) => *f == 0.0,
            Self::Blob(b) => b.is_empty(),
            Self::Text(s) => s.is_empty(),
            Self::List(items) | Self::Set(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
            Self::Record(record) => record.entries.iter().all(|(_, v)| v.is_empty_like()),
            Self::Timestamp(ts) => ts.is_zero(),
            Self::Bool(true) | Self::Int(_) | Self::Uint(_) => false,
        }
    }

    /// Equality that ignores element order inside sets.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Set(a), Self::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.is_equivalent(y)))
            }
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_equivalent(y))
            }
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, x)| b.get(k).is_some_and(|y| x.is_equivalent(y)))
            }
            (Self::Record(a), Self::Record(b)) => {
                a.path == b.path
                    && a.entries.len() == b.entries.len()
                    && a.entries
                        .iter()
                        .zip(&b.entries)
                        .all(|((ka, x), (kb, y))| ka == kb && x.is_equivalent(y))
            }
            _ => self == other,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

macro_rules! impl_from_for_value {
    ($( $ty:ty => $variant:ident ),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    f64 => Float,
    i32 => Int,
    i64 => Int,
    u32 => Uint,
    u64 => Uint,
    String => Text,
    &str => Text,
    Timestamp => Timestamp,
    Vec<Value> => List,
}

impl From<Blob> for Value {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob.into_inner())
    }
}

///
/// RecordValue
///
/// Snapshot of a `Fields` type: one value per described field, plus the
/// descriptor table needed to encode them.
///

#[derive(Clone, Debug)]
pub struct RecordValue {
    path: &'static str,
    schema: &'static [FieldSchema],
    entries: Vec<(&'static str, Value)>,
}

impl RecordValue {
    /// Read every described field of `source`.
    #[must_use]
    pub fn capture<F: Fields>(source: &F) -> Self {
        let entries = F::ACCESSORS
            .iter()
            .map(|accessor| (accessor.ident, (accessor.get)(source)))
            .collect();

        Self {
            path: F::PATH,
            schema: F::SCHEMA,
            entries,
        }
    }

    /// Rebuild a `Fields` type from a captured snapshot. Fields absent from
    /// the snapshot keep their `Default` values.
    pub fn restore<F: Fields>(self) -> Result<F, ValueError> {
        if self.path != F::PATH {
            return Err(ValueError::RecordMismatch {
                expected: F::PATH,
                found: self.path,
            });
        }

        let mut out = F::default();
        for (ident, value) in self.entries {
            if let Some(accessor) = F::accessor(ident) {
                (accessor.set)(&mut out, value).map_err(|err| err.in_field(accessor.ident))?;
            }
        }

        Ok(out)
    }

    /// `FieldValue::from_value` body shared by every derived record type.
    pub fn restore_from<F: Fields>(value: Value) -> Result<F, ValueError> {
        match value {
            Value::Record(record) => record.restore(),
            other => Err(ValueError::type_mismatch(F::PATH, &other)),
        }
    }

    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    #[must_use]
    pub const fn schema(&self) -> &'static [FieldSchema] {
        self.schema
    }

    #[must_use]
    pub fn entries(&self) -> &[(&'static str, Value)] {
        &self.entries
    }

    /// Drop captured fields for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(ident, _)| keep(ident));
    }

    #[must_use]
    pub fn get(&self, ident: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| *name == ident)
            .map(|(_, value)| value)
    }
}

// Descriptor tables hold fn pointers, so equality is by path and values.
impl PartialEq for RecordValue {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.entries == other.entries
    }
}
