//! Derive macros generating dynamap descriptor tables.
//!
//! ```ignore
//! #[derive(Default, Record)]
//! struct User {
//!     #[dynamap(base)]
//!     base: BaseFields,
//!
//!     #[dynamap(attr = "email", key = "partition")]
//!     email: String,
//!
//!     #[dynamap(attr = "age,omitempty", index = "by_age,partition")]
//!     age: u32,
//! }
//! ```

use proc_macro::TokenStream;

mod fields;
mod record;

#[proc_macro_derive(Fields, attributes(dynamap))]
pub fn derive_fields(input: TokenStream) -> TokenStream {
    fields::derive_fields(input.into()).into()
}

#[proc_macro_derive(Record, attributes(dynamap))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input.into()).into()
}
