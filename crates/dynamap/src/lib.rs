//! dynamap: derive a DynamoDB-style table schema from annotated Rust types,
//! and read, write and marshal records through the same metadata.
//!
//! This is the public crate. It re-exports the runtime from `dynamap-core`
//! and the derive macros from `dynamap-derive`.

pub use dynamap_core::*;
pub use dynamap_derive::{Fields, Record};

//
// Prelude
//

pub mod prelude {
    pub use dynamap_core::prelude::*;
    pub use dynamap_derive::{Fields, Record};
}
