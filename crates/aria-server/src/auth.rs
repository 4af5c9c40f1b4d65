use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use secrecy::{ExposeSecret, SecretString};

/// Gate requests behind the configured API key
///
/// The key is accepted either as a Bearer token in the Authorization
/// header or as the `api_key` query parameter. Public paths pass through
/// unchecked.
pub async fn auth_middleware(
    api_key: SecretString,
    public_paths: Vec<String>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();

    if public_paths.iter().any(|p| path.starts_with(p)) {
        return next.run(request).await;
    }

    let presented = bearer_token(&request).or_else(|| query_api_key(&request));

    match presented {
        Some(presented) if presented == api_key.expose_secret() => next.run(request).await,
        _ => {
            tracing::warn!(path = %request.uri().path(), "rejected request with missing or invalid API key");
            (
                StatusCode::UNAUTHORIZED,
                axum::Json(serde_json::json!({
                    "error": "Unauthorized",
                    "message": "invalid or missing API key",
                    "status": 401,
                })),
            )
                .into_response()
        }
    }
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn query_api_key(request: &Request) -> Option<String> {
    let query = request.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "api_key")
        .map(|(_, value)| value.into_owned())
}
