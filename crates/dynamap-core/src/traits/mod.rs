mod field_value;

pub use field_value::FieldValue;

use crate::model::{BaseFields, FieldAccessor, FieldSchema};

///
/// Fields
///
/// A type with a static descriptor table. Generated by `#[derive(Fields)]`
/// and `#[derive(Record)]`; `SCHEMA` and `ACCESSORS` list the same fields
/// in declaration order.
///

pub trait Fields: Default + 'static {
    /// Fully-qualified Rust path, for diagnostics and type checks.
    const PATH: &'static str;

    const SCHEMA: &'static [FieldSchema];

    const ACCESSORS: &'static [FieldAccessor<Self>];

    #[must_use]
    fn schema() -> &'static [FieldSchema] {
        Self::SCHEMA
    }

    #[must_use]
    fn accessor(ident: &str) -> Option<&'static FieldAccessor<Self>> {
        Self::ACCESSORS.iter().find(|a| a.ident == ident)
    }
}

///
/// Record
///
/// A storable type: its own fields plus an embedded `BaseFields` member.
///

pub trait Record: Fields + Send + Sync {
    fn base(&self) -> &BaseFields;

    fn base_mut(&mut self) -> &mut BaseFields;
}
