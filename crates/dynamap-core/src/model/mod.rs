//! Static descriptor tables.
//!
//! Record types describe their fields with `'static` data generated by
//! `#[derive(Fields)]`. The tag parser and schema deriver read
//! `FieldSchema`; the accessor reads `FieldAccessor`.

mod base;
mod field;

pub use base::BaseFields;
pub use field::{FieldAccessor, FieldKind, FieldSchema, FieldTags, SetKind};
