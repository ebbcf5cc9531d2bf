extern crate proc_macro;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod http_error;

/// Derive macro for mapping error variants to an HTTP status and a message code
///
/// Derive `HttpError` by adding `#[http_error(...)]` to each variant
///
/// `http_error` takes exactly two arguments
/// - status code
/// - message code, as a path to a variant of the message code enum
///
/// ### Status Code
///
/// May be specified as a `StatusCode` constant (e.g. `BAD_REQUEST`) or a number (e.g. `400`).
/// Numbers outside `100..=999` are rejected at compile time.
///
/// The `StatusCode` value is returned by calling `http_code()`.
///
/// ### Message Code
///
/// The message code is a key into a localized message table rather than the text itself,
/// so the user-facing message never depends on the variant's payload. Every variant must
/// name a code of the same enum type; that type becomes the return type of `message_code()`.
///
/// The `Display` implementation (e.g. from `thiserror`) stays free to carry internal
/// detail for logs, since it is never rendered to the client.
///
/// ### Example
///
/// ```rust,ignore
/// #[derive(Debug, thiserror::Error, formrelay::HttpError)]
/// enum SubmitError {
///     #[error("receiver {0:?} is not allow-listed")]
///     #[http_error(BAD_REQUEST, MessageCode::WrongReceiver)]
///     WrongReceiver(String),
///
///     #[error("attachment {filename} could not be opened: {source}")]
///     #[http_error(500, MessageCode::FileCantOpen)]
///     FileCantOpen { filename: String, source: std::io::Error },
/// }
///
/// let err = SubmitError::WrongReceiver("nobody@example.com".into());
/// assert_eq!(err.http_code(), http::StatusCode::BAD_REQUEST);
/// assert_eq!(err.message_code(), MessageCode::WrongReceiver);
/// ```
#[proc_macro_derive(HttpError, attributes(http_error))]
pub fn http_error_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    http_error::http_error_derive_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
