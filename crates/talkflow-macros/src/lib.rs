//! Procedural macros for talkflow.
//!
//! # FlowRecord Derive Macro
//!
//! Implements `FlowRecord` for the struct a flow collects, exposing each
//! member's name, whether it is `Option<_>`, and a broad value kind.
//!
//! ## Usage
//!
//! ```ignore
//! #[derive(FlowRecord, Serialize, Deserialize)]
//! struct Signup {
//!     name: String,          // text
//!     age: i64,              // integer
//!     tags: Vec<String>,     // list
//!     promo_code: Option<String>,  // optional text
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Fields, GenericArgument, PathArguments, Type, parse_macro_input,
    spanned::Spanned,
};

/// Derives `FlowRecord` for a struct with named fields.
#[proc_macro_derive(FlowRecord)]
pub fn derive_flow_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_flow_record_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_flow_record_impl(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let data = match &input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "FlowRecord can only be derived for structs",
            ));
        }
    };

    let fields = match &data.fields {
        Fields::Named(fields) => fields,
        _ => {
            return Err(syn::Error::new(
                data.fields.span(),
                "FlowRecord derive requires named fields",
            ));
        }
    };

    let entries = fields.named.iter().filter_map(|field| {
        let ident = field.ident.as_ref()?;
        let member = ident.to_string();
        let member = member.strip_prefix("r#").unwrap_or(&member).to_string();
        let (optional, inner) = match option_inner(&field.ty) {
            Some(inner) => (true, inner),
            None => (false, &field.ty),
        };
        let kind = value_kind(inner);
        Some(quote! {
            ::talkflow::RecordField {
                name: #member,
                optional: #optional,
                kind: ::talkflow::ValueKind::#kind,
            }
        })
    });

    Ok(quote! {
        impl #impl_generics ::talkflow::FlowRecord for #name #ty_generics #where_clause {
            fn record_fields() -> &'static [::talkflow::RecordField] {
                &[#(#entries),*]
            }
        }
    })
}

/// Last path segment of a type, looking through references.
fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        Type::Reference(reference) => last_segment(&reference.elem),
        Type::Group(group) => last_segment(&group.elem),
        Type::Paren(paren) => last_segment(&paren.elem),
        _ => None,
    }
}

/// `T` if the type is `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let segment = last_segment(ty)?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    }
}

fn value_kind(ty: &Type) -> proc_macro2::Ident {
    if matches!(ty, Type::Array(_) | Type::Slice(_)) {
        return proc_macro2::Ident::new("List", ty.span());
    }
    let kind = match last_segment(ty).map(|s| s.ident.to_string()).as_deref() {
        Some("String" | "str" | "Cow") => "Text",
        Some(
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
            | "u128" | "usize",
        ) => "Integer",
        Some("f32" | "f64") => "Float",
        Some("bool") => "Bool",
        Some("Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "IndexSet") => "List",
        _ => "Any",
    };
    proc_macro2::Ident::new(kind, ty.span())
}
