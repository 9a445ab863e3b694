use crate::{
    value::{Value, ValueError},
    wire::WireType,
};
use std::fmt;

///
/// FieldTags
/// Raw `#[dynamap(...)]` annotation strings, exactly as written.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FieldTags {
    pub attr: Option<&'static str>,
    pub wire: Option<&'static str>,
    pub key: Option<&'static str>,
    pub indexes: &'static [&'static str],
}

impl FieldTags {
    pub const EMPTY: Self = Self {
        attr: None,
        wire: None,
        key: None,
        indexes: &[],
    };

    #[must_use]
    pub const fn attr(attr: &'static str) -> Self {
        Self {
            attr: Some(attr),
            ..Self::EMPTY
        }
    }

    #[must_use]
    pub const fn with_wire(mut self, wire: &'static str) -> Self {
        self.wire = Some(wire);
        self
    }

    #[must_use]
    pub const fn with_key(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub const fn with_indexes(mut self, indexes: &'static [&'static str]) -> Self {
        self.indexes = indexes;
        self
    }
}

///
/// SetKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SetKind {
    Blob,
    Number,
    Other,
    Text,
}

///
/// FieldKind
///
/// Rust-side shape of a field, used for wire type inference.
/// `Record` points at the nested type's own descriptor table through a
/// function so that self-referential types still have finite constants.
///

#[derive(Clone, Copy)]
pub enum FieldKind {
    Blob,
    Bool,
    Float,
    Int,
    List,
    Map,
    Record {
        path: &'static str,
        fields: fn() -> &'static [FieldSchema],
    },
    Set(SetKind),
    Text,
    Timestamp,
}

impl FieldKind {
    #[must_use]
    pub const fn is_record(self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Set flavour for a collection whose element has kind `element`.
    #[must_use]
    pub const fn set_of(element: Self) -> Self {
        Self::Set(match element {
            Self::Text => SetKind::Text,
            Self::Int | Self::Float => SetKind::Number,
            Self::Blob => SetKind::Blob,
            _ => SetKind::Other,
        })
    }

    /// Wire type a field of this kind gets without an explicit override.
    /// `None` for nested records, whose fields are flattened instead.
    #[must_use]
    pub const fn inferred_wire_type(self, unix_time: bool) -> Option<WireType> {
        let ty = match self {
            Self::Int | Self::Float => WireType::Number,
            Self::Text => WireType::String,
            Self::Bool => WireType::Boolean,
            Self::Blob => WireType::Binary,
            Self::Timestamp if unix_time => WireType::Number,
            Self::Timestamp => WireType::String,
            Self::List | Self::Set(SetKind::Other) => WireType::List,
            Self::Map => WireType::Map,
            Self::Set(SetKind::Text) => WireType::StringSet,
            Self::Set(SetKind::Number) => WireType::NumberSet,
            Self::Set(SetKind::Blob) => WireType::BinarySet,
            Self::Record { .. } => return None,
        };

        Some(ty)
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => f.write_str("Blob"),
            Self::Bool => f.write_str("Bool"),
            Self::Float => f.write_str("Float"),
            Self::Int => f.write_str("Int"),
            Self::List => f.write_str("List"),
            Self::Map => f.write_str("Map"),
            Self::Record { path, .. } => f.debug_tuple("Record").field(path).finish(),
            Self::Set(kind) => f.debug_tuple("Set").field(kind).finish(),
            Self::Text => f.write_str("Text"),
            Self::Timestamp => f.write_str("Timestamp"),
        }
    }
}

///
/// FieldSchema
/// One described field: declared identifier, raw tags, Rust-side kind.
///

#[derive(Clone, Copy, Debug)]
pub struct FieldSchema {
    pub ident: &'static str,
    pub tags: FieldTags,
    pub kind: FieldKind,
}

impl FieldSchema {
    #[must_use]
    pub const fn new(ident: &'static str, tags: FieldTags, kind: FieldKind) -> Self {
        Self { ident, tags, kind }
    }
}

///
/// FieldAccessor
/// Typed get/set pair for one field of `R`.
///

pub struct FieldAccessor<R> {
    pub ident: &'static str,
    pub get: fn(&R) -> Value,
    pub set: fn(&mut R, Value) -> Result<(), ValueError>,
}

impl<R> fmt::Debug for FieldAccessor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("ident", &self.ident)
            .finish_non_exhaustive()
    }
}
