use darling::{FromDeriveInput, FromField, ast::Data, util::Ignored};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Ident, Type};

///
/// StructInput
///

#[derive(FromDeriveInput)]
#[darling(attributes(dynamap), supports(struct_named))]
pub struct StructInput {
    pub ident: Ident,
    pub generics: syn::Generics,
    pub data: Data<Ignored, FieldInput>,
}

///
/// FieldInput
/// One field and its `#[dynamap(...)]` keys.
///

#[derive(FromField)]
#[darling(attributes(dynamap))]
pub struct FieldInput {
    pub ident: Option<Ident>,
    pub ty: Type,

    #[darling(default)]
    pub attr: Option<String>,

    #[darling(default)]
    pub wire: Option<String>,

    #[darling(default)]
    pub key: Option<String>,

    #[darling(multiple)]
    pub index: Vec<String>,

    #[darling(default)]
    pub base: bool,

    #[darling(default)]
    pub skip: bool,
}

impl FieldInput {
    // fields that get a descriptor
    const fn is_described(&self) -> bool {
        !self.base && !self.skip
    }
}

///
/// Parsed
///

pub struct Parsed {
    pub ident: Ident,
    pub fields: Vec<FieldInput>,
}

/// Parse and check the derive input shared by both macros.
pub fn parse_input(input: TokenStream) -> Result<Parsed, TokenStream> {
    let input: DeriveInput = syn::parse2(input).map_err(|err| err.to_compile_error())?;
    let StructInput {
        ident,
        generics,
        data,
    } = StructInput::from_derive_input(&input).map_err(|err| err.write_errors())?;

    if !generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &generics,
            "dynamap descriptors cannot be derived for generic types",
        )
        .to_compile_error());
    }

    let fields = data.take_struct().map(|f| f.fields).unwrap_or_default();
    if let Some(field) = fields.iter().find(|f| f.base && f.skip) {
        return Err(
            syn::Error::new_spanned(&field.ty, "a field cannot be both `base` and `skip`")
                .to_compile_error(),
        );
    }

    Ok(Parsed { ident, fields })
}

fn quote_opt(value: Option<&String>) -> TokenStream {
    match value {
        Some(s) => quote!(::core::option::Option::Some(#s)),
        None => quote!(::core::option::Option::None),
    }
}

/// `impl Fields for #ident`
pub fn fields_impl(ident: &Ident, fields: &[FieldInput]) -> TokenStream {
    let described: Vec<_> = fields.iter().filter(|f| f.is_described()).collect();

    let schema = described.iter().map(|field| {
        let Some(field_ident) = &field.ident else {
            return quote!();
        };
        let name = field_ident.to_string();
        let ty = &field.ty;
        let attr = quote_opt(field.attr.as_ref());
        let wire = quote_opt(field.wire.as_ref());
        let key = quote_opt(field.key.as_ref());
        let indexes = &field.index;

        quote! {
            ::dynamap::model::FieldSchema::new(
                #name,
                ::dynamap::model::FieldTags {
                    attr: #attr,
                    wire: #wire,
                    key: #key,
                    indexes: &[#(#indexes),*],
                },
                <#ty as ::dynamap::traits::FieldValue>::KIND,
            ),
        }
    });

    let accessors = described.iter().map(|field| {
        let Some(field_ident) = &field.ident else {
            return quote!();
        };
        let name = field_ident.to_string();

        quote! {
            ::dynamap::model::FieldAccessor {
                ident: #name,
                get: |r: &Self| ::dynamap::traits::FieldValue::to_value(&r.#field_ident),
                set: |r: &mut Self, v: ::dynamap::value::Value|
                    -> ::core::result::Result<(), ::dynamap::value::ValueError> {
                    r.#field_ident = ::dynamap::traits::FieldValue::from_value(v)?;
                    ::core::result::Result::Ok(())
                },
            },
        }
    });

    quote! {
        impl ::dynamap::traits::Fields for #ident {
            const PATH: &'static str = concat!(module_path!(), "::", stringify!(#ident));

            const SCHEMA: &'static [::dynamap::model::FieldSchema] = &[
                #(#schema)*
            ];

            const ACCESSORS: &'static [::dynamap::model::FieldAccessor<Self>] = &[
                #(#accessors)*
            ];
        }
    }
}

// derive_fields
pub fn derive_fields(input: TokenStream) -> TokenStream {
    let Parsed { ident, fields } = match parse_input(input) {
        Ok(parsed) => parsed,
        Err(err) => return err,
    };

    if let Some(base) = fields.iter().find(|f| f.base) {
        return syn::Error::new_spanned(&base.ty, "`base` is only valid on `#[derive(Record)]`")
            .to_compile_error();
    }

    let fields_impl = fields_impl(&ident, &fields);

    quote! {
        #fields_impl

        impl ::dynamap::traits::FieldValue for #ident {
            const KIND: ::dynamap::model::FieldKind = ::dynamap::model::FieldKind::Record {
                path: <Self as ::dynamap::traits::Fields>::PATH,
                fields: <Self as ::dynamap::traits::Fields>::schema,
            };

            fn to_value(&self) -> ::dynamap::value::Value {
                ::dynamap::value::Value::Record(::dynamap::value::RecordValue::capture(self))
            }

            fn from_value(
                value: ::dynamap::value::Value,
            ) -> ::core::result::Result<Self, ::dynamap::value::ValueError> {
                ::dynamap::value::RecordValue::restore_from(value)
            }
        }
    }
}
