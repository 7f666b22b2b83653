//! Derive macros for `abi_codec::conv::{Encode, Decode}`
//!
//! Both derives are structurally inductive over the fields of a struct, in
//! declaration order, which is exactly the wire layout of an ABI struct with
//! no base. Enums and unions have no canonical layout and are rejected with
//! a compile error rather than a panic inside the macro.

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;

#[proc_macro_derive(Encode)]
pub fn encode_derive(input: TokenStream) -> TokenStream {
    let ast: syn::DeriveInput = match syn::parse(input) {
        Ok(ast) => ast,
        Err(err) => return err.to_compile_error().into(),
    };
    match struct_fields(&ast, "Encode") {
        Ok(fields) => impl_encode(&ast.ident, &fields).into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[proc_macro_derive(Decode)]
pub fn decode_derive(input: TokenStream) -> TokenStream {
    let ast: syn::DeriveInput = match syn::parse(input) {
        Ok(ast) => ast,
        Err(err) => return err.to_compile_error().into(),
    };
    match struct_fields(&ast, "Decode") {
        Ok(fields) => impl_decode(&ast.ident, &fields).into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Shape of the fields of a derive target
enum Layout<'a> {
    Unit,
    Tuple(Vec<&'a syn::Type>),
    Named(Vec<(&'a syn::Ident, &'a syn::Type)>),
}

fn struct_fields<'a>(ast: &'a syn::DeriveInput, which: &str) -> syn::Result<Layout<'a>> {
    match &ast.data {
        syn::Data::Struct(syn::DataStruct { fields, .. }) => Ok(match fields {
            syn::Fields::Unit => Layout::Unit,
            syn::Fields::Unnamed(unnamed) => {
                Layout::Tuple(unnamed.unnamed.iter().map(|f| &f.ty).collect())
            }
            syn::Fields::Named(named) => Layout::Named(
                named
                    .named
                    .iter()
                    .filter_map(|f| f.ident.as_ref().map(|id| (id, &f.ty)))
                    .collect(),
            ),
        }),
        _ => Err(syn::Error::new_spanned(
            &ast.ident,
            format!("derive macro `{which}` is only implemented for structs"),
        )),
    }
}

fn impl_encode(name: &syn::Ident, layout: &Layout<'_>) -> TokenStream2 {
    let encode_trait = quote! { ::abi_codec::conv::Encode };
    let target_trait = quote! { ::abi_codec::conv::target::Target };

    let body = match layout {
        Layout::Unit => quote! { 0 },
        Layout::Tuple(tys) => {
            let ix = (0..tys.len()).map(syn::Index::from);
            quote! { 0 #( + #encode_trait::write_to(&self.#ix, buf) )* }
        }
        Layout::Named(fields) => {
            let ident = fields.iter().map(|(id, _)| id);
            quote! { 0 #( + #encode_trait::write_to(&self.#ident, buf) )* }
        }
    };

    quote! {
        impl #encode_trait for #name {
            #[allow(unused_variables)]
            fn write_to<U: #target_trait>(&self, buf: &mut U) -> usize {
                #body
            }
        }
    }
}

fn impl_decode(name: &syn::Ident, layout: &Layout<'_>) -> TokenStream2 {
    let decode_trait = quote! { ::abi_codec::conv::Decode };
    let parser_trait = quote! { ::abi_codec::parse::Parser };
    let parse_result_type = quote! { ::abi_codec::parse::ParseResult };

    let body = match layout {
        Layout::Unit => quote! { Ok(Self) },
        Layout::Tuple(tys) => quote! {
            Ok(Self(#( <#tys as #decode_trait>::parse(p)? ),*))
        },
        Layout::Named(fields) => {
            let (fname, ty): (Vec<_>, Vec<_>) = fields.iter().cloned().unzip();
            quote! {
                Ok(Self { #( #fname: <#ty as #decode_trait>::parse(p)? ),* })
            }
        }
    };

    quote! {
        impl #decode_trait for #name {
            #[allow(unused_variables)]
            fn parse<P: #parser_trait>(p: &mut P) -> #parse_result_type<Self> {
                #body
            }
        }
    }
}
