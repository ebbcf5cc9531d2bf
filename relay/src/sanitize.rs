/// Strips unsafe markup from free-text form fields.
pub trait Sanitizer: Send + Sync + 'static {
    fn sanitize(&self, input: &str) -> String;
}

/// [`Sanitizer`] backed by ammonia's default policy.
///
/// Harmless formatting tags survive, scripts and event handlers do not, and text is
/// HTML-escaped so the result can be embedded in the outgoing HTML email as is.
/// Surrounding whitespace is trimmed, so a blank field reads as empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl Sanitizer for HtmlSanitizer {
    fn sanitize(&self, input: &str) -> String {
        ammonia::clean(input).trim().to_string()
    }
}
