use crate::fields::{Parsed, fields_impl, parse_input};
use proc_macro2::TokenStream;
use quote::quote;

// derive_record
pub fn derive_record(input: TokenStream) -> TokenStream {
    let Parsed { ident, fields } = match parse_input(input) {
        Ok(parsed) => parsed,
        Err(err) => return err,
    };

    let mut bases = fields.iter().filter(|f| f.base);
    let Some(base) = bases.next() else {
        return syn::Error::new_spanned(
            &ident,
            "Record needs one `#[dynamap(base)] base: BaseFields` field",
        )
        .to_compile_error();
    };
    if let Some(extra) = bases.next() {
        return syn::Error::new_spanned(&extra.ty, "only one field can be `base`")
            .to_compile_error();
    }
    let Some(base_ident) = &base.ident else {
        return syn::Error::new_spanned(&base.ty, "`base` field must be named").to_compile_error();
    };

    let fields_impl = fields_impl(&ident, &fields);

    quote! {
        #fields_impl

        impl ::dynamap::traits::Record for #ident {
            fn base(&self) -> &::dynamap::model::BaseFields {
                &self.#base_ident
            }

            fn base_mut(&mut self) -> &mut ::dynamap::model::BaseFields {
                &mut self.#base_ident
            }
        }
    }
}
