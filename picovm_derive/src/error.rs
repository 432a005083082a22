//! `#[derive(Error)]`: `Display` from an `#[error("...")]` message plus an
//! empty `std::error::Error` impl.
//!
//! ```ignore
//! use picovm_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum LoadError {
//!     #[error("program of {len} words exceeds capacity {capacity}")]
//!     TooLarge { len: usize, capacity: usize },
//!
//!     #[error("bad word {0:#x}")]
//!     BadWord(u32),
//!
//!     #[error("empty program")]
//!     Empty,
//! }
//! ```
//!
//! Named fields are referenced by name, tuple fields by position (`{0}`).
//! Fields the message never mentions are ignored.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let arms = match &input.data {
        Data::Enum(data) => data
            .variants
            .iter()
            .map(|variant| {
                let message = message_from(&variant.attrs, &variant.ident)?;
                let ident = &variant.ident;
                Ok(display_arm(quote!(Self::#ident), &variant.fields, &message))
            })
            .collect::<syn::Result<Vec<_>>>()?,
        Data::Struct(data) => {
            let message = message_from(&input.attrs, name)?;
            vec![display_arm(quote!(Self), &data.fields, &message)]
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error cannot be derived for unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#arms)*
                }
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

/// Builds `pattern => write!(f, message, args..)` for one set of fields.
///
/// Only fields mentioned in the message are bound and passed to `write!`,
/// since unused named arguments are a compile error.
fn display_arm(path: TokenStream2, fields: &Fields, message: &LitStr) -> TokenStream2 {
    let text = message.value();

    match fields {
        Fields::Unit => quote! {
            #path => write!(f, #message),
        },
        Fields::Named(named) => {
            let mut bindings = Vec::new();
            let mut args = Vec::new();
            for field in &named.named {
                let Some(ident) = &field.ident else { continue };
                if mentions(&text, &ident.to_string()) {
                    bindings.push(quote!(#ident));
                    args.push(quote!(#ident = #ident));
                } else {
                    bindings.push(quote!(#ident: _));
                }
            }
            quote! {
                #path { #(#bindings),* } => write!(f, #message #(, #args)*),
            }
        }
        Fields::Unnamed(unnamed) => {
            let mut rewritten = text.clone();
            let mut bindings = Vec::new();
            let mut args = Vec::new();
            for index in 0..unnamed.unnamed.len() {
                let position = index.to_string();
                if mentions(&text, &position) {
                    let ident = format_ident!("f{}", index);
                    rewritten = rewritten
                        .replace(&format!("{{{index}}}"), &format!("{{{ident}}}"))
                        .replace(&format!("{{{index}:"), &format!("{{{ident}:"));
                    bindings.push(quote!(#ident));
                    args.push(quote!(#ident = #ident));
                } else {
                    bindings.push(quote!(_));
                }
            }
            let rewritten = LitStr::new(&rewritten, message.span());
            quote! {
                #path ( #(#bindings),* ) => write!(f, #rewritten #(, #args)*),
            }
        }
    }
}

/// Returns `true` if `text` has a `{name}` or `{name:...}` placeholder.
fn mentions(text: &str, name: &str) -> bool {
    text.contains(&format!("{{{name}}}")) || text.contains(&format!("{{{name}:"))
}

/// Reads the string literal out of the `#[error("...")]` attribute.
fn message_from<T: ToTokens>(attrs: &[Attribute], target: &T) -> syn::Result<LitStr> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("error")) else {
        return Err(syn::Error::new_spanned(
            target,
            "missing #[error(\"...\")] attribute with the display message",
        ));
    };

    attr.parse_args::<LitStr>().map_err(|_| {
        syn::Error::new_spanned(
            attr,
            "expected a string literal, e.g. #[error(\"register r{index} out of range\")]",
        )
    })
}
