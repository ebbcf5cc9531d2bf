use formrelay_macros::HttpError;
use http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Code {
    NotAllowed,
    Missing,
    TooBig,
    Broken,
}

#[derive(thiserror::Error, Debug, HttpError)]
enum ApiError {
    #[error("method not allowed")]
    #[http_error(METHOD_NOT_ALLOWED, Code::NotAllowed)]
    NotAllowed,

    #[error("field {0} is missing")]
    #[http_error(BAD_REQUEST, Code::Missing)]
    Missing(&'static str),

    #[error("{name} is {size} bytes")]
    #[http_error(413, Code::TooBig)]
    TooBig { name: String, size: u64 },

    #[error("io failure: {0}")]
    #[http_error(INTERNAL_SERVER_ERROR, Code::Broken)]
    Io(#[from] std::io::Error),
}

#[test]
fn unit_variant_maps_status_and_code() {
    let err = ApiError::NotAllowed;
    assert_eq!(err.http_code(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(err.message_code(), Code::NotAllowed);
}

#[test]
fn tuple_variant_ignores_payload() {
    let err = ApiError::Missing("email");
    assert_eq!(err.http_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.message_code(), Code::Missing);
    assert_eq!(err.to_string(), "field email is missing");
}

#[test]
fn numeric_status_on_struct_variant() {
    let err = ApiError::TooBig {
        name: "photo.jpg".into(),
        size: 11 << 20,
    };
    assert_eq!(err.http_code().as_u16(), 413);
    assert_eq!(err.message_code(), Code::TooBig);
}

#[test]
fn display_keeps_internal_detail() {
    let err = ApiError::from(std::io::Error::other("disk on fire"));
    assert!(err.http_code().is_server_error());
    assert_eq!(err.message_code(), Code::Broken);
    assert_eq!(err.to_string(), "io failure: disk on fire");
}
