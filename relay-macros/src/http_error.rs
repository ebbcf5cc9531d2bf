use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Lit, Path, Token};

pub(crate) fn http_error_derive_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "HttpError can only be derived for enums",
        ));
    };

    let mut code_type: Option<Path> = None;
    let mut status_arms = Vec::new();
    let mut message_arms = Vec::new();

    for variant in &data_enum.variants {
        let ident = &variant.ident;
        let attr = variant
            .attrs
            .iter()
            .find(|attr| attr.path().is_ident("http_error"))
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    variant,
                    "missing #[http_error(STATUS, Code::Variant)] attribute",
                )
            })?;

        let (status, message) = parse_http_error(attr)?;

        let variant_type = enum_path(&message)?;
        match &code_type {
            None => code_type = Some(variant_type),
            Some(existing) if !same_path(existing, &variant_type) => {
                return Err(syn::Error::new_spanned(
                    &message,
                    "all message codes must belong to the same enum",
                ));
            }
            Some(_) => {}
        }

        let pattern = match &variant.fields {
            Fields::Unit => quote! { Self::#ident },
            Fields::Unnamed(_) => quote! { Self::#ident(..) },
            Fields::Named(_) => quote! { Self::#ident { .. } },
        };

        status_arms.push(quote! { #pattern => #status, });
        message_arms.push(quote! { #pattern => #message, });
    }

    let code_type = code_type.ok_or_else(|| {
        syn::Error::new_spanned(name, "HttpError requires at least one variant")
    })?;

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            pub fn http_code(&self) -> http::StatusCode {
                match self {
                    #(#status_arms)*
                }
            }

            pub fn message_code(&self) -> #code_type {
                match self {
                    #(#message_arms)*
                }
            }
        }
    })
}

fn parse_http_error(attr: &Attribute) -> syn::Result<(TokenStream, Path)> {
    let args = attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated)?;
    if args.len() != 2 {
        return Err(syn::Error::new_spanned(
            attr,
            "expected #[http_error(STATUS, Code::Variant)]",
        ));
    }

    let mut args = args.into_iter();

    let status = match args.next() {
        Some(Expr::Path(path)) => {
            let code = &path.path;
            quote! { http::StatusCode::#code }
        }
        Some(Expr::Lit(ExprLit {
            lit: Lit::Int(int_lit),
            ..
        })) => {
            let code = int_lit.base10_parse::<u16>()?;
            if !(100..=999).contains(&code) {
                return Err(syn::Error::new_spanned(
                    int_lit,
                    "status code must be within 100..=999",
                ));
            }
            quote! {
                http::StatusCode::from_u16(#code).expect("status range checked by HttpError derive")
            }
        }
        other => {
            return Err(syn::Error::new_spanned(
                other,
                "expected a StatusCode constant or a number",
            ))
        }
    };

    let message = match args.next() {
        Some(Expr::Path(path)) => path.path,
        other => {
            return Err(syn::Error::new_spanned(
                other,
                "expected a message code path such as `MessageCode::NameRequired`",
            ))
        }
    };

    Ok((status, message))
}

/// `MessageCode::NameRequired` -> `MessageCode`
fn enum_path(code: &Path) -> syn::Result<Path> {
    let count = code.segments.len();
    if count < 2 {
        return Err(syn::Error::new_spanned(
            code,
            "message code must be written as `Enum::Variant`",
        ));
    }

    Ok(Path {
        leading_colon: code.leading_colon,
        segments: code.segments.iter().take(count - 1).cloned().collect(),
    })
}

fn same_path(a: &Path, b: &Path) -> bool {
    quote!(#a).to_string() == quote!(#b).to_string()
}
