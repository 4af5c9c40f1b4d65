use http::StatusCode;

/// Trait for domain errors that can be rendered as HTTP responses
///
/// The feature crate owns the error type; the HTTP layer asks it how to
/// present itself. Keeps domain errors decoupled from axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `upstream_synthesis_error`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;
}
