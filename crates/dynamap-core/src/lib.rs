//! Core runtime for dynamap: field directives, schema derivation, record
//! access, wire encoding, and the table/registry/session surface that binds
//! them together.
//!
//! Record types describe themselves through static descriptor tables
//! (`traits::Fields`), normally generated by `#[derive(Record)]`. Everything
//! here reads those tables; nothing inspects types at runtime.

// lets derive-generated `::dynamap::...` paths resolve inside this crate's tests
extern crate self as dynamap;

pub mod access;
pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod schema;
pub mod session;
pub mod table;
pub mod tags;
pub mod traits;
pub mod types;
pub mod value;
pub mod wire;

pub use error::Error;

///
/// CONSTANTS
///

/// Declared identifier of the conventional identity field.
pub const IDENTITY_FIELD: &str = "id";

/// Storage name used when the identity attribute has to be synthesized.
pub const IDENTITY_ATTRIBUTE: &str = "id";

/// Storage names that exclude a field from schema and serialization.
pub const IGNORE_SENTINELS: [&str; 2] = ["-", "_"];

/// Default bound on nested-record recursion during schema derivation.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 8;

///
/// Prelude
///
/// Domain vocabulary only; errors and encoders stay behind their modules.
///

pub mod prelude {
    pub use crate::{
        access::RecordHandle,
        config::{Config, MetadataMode},
        model::BaseFields,
        registry::Registry,
        schema::{KeyRole, ProjectionMode, Schema},
        session::Session,
        table::Table,
        traits::{FieldValue, Fields, Record},
        types::{Blob, Timestamp},
        value::Value,
        wire::{AttributeValue, Item, WireType},
    };
}
