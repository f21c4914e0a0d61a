//! Derive macros for sluice-rs. `#[derive(Command)]` and `#[derive(Query)]` replace `impl Command for T {}`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Type};

/// Implements `sluice_rs::Command`.
#[proc_macro_derive(Command)]
pub fn derive_command(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let expanded = quote! {
        impl #impl_generics ::sluice_rs::Command for #name #ty_generics #where_clause {}
    };
    TokenStream::from(expanded)
}

/// Implements `sluice_rs::Query`, plus `QueryOf<T>` for every `#[query(result = T)]`.
///
/// ```ignore
/// #[derive(Query)]
/// #[query(result = UserModel)]
/// struct GetUser { id: u32 }
/// ```
#[proc_macro_derive(Query, attributes(query))]
pub fn derive_query(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let results = match result_types(&input) {
        Ok(results) => results,
        Err(err) => return err.to_compile_error().into(),
    };
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let expanded = quote! {
        impl #impl_generics ::sluice_rs::Query for #name #ty_generics #where_clause {}
        #(
            impl #impl_generics ::sluice_rs::QueryOf<#results> for #name #ty_generics #where_clause {}
        )*
    };
    TokenStream::from(expanded)
}

fn result_types(input: &DeriveInput) -> syn::Result<Vec<Type>> {
    let mut results = Vec::new();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("query")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("result") {
                results.push(meta.value()?.parse::<Type>()?);
                Ok(())
            } else {
                Err(meta.error("expected `result = Type`"))
            }
        })?;
    }
    Ok(results)
}
