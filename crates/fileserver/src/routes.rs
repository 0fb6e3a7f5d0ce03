//! Request handlers: index page, file download, not-found fallback

use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::page::{self, FILE_ROUTE, URI_PARAM};
use crate::resolver::FileResolver;
use crate::state::AppState;

/// Content type used when the resolver cannot tell
const OCTET_STREAM: &str = "application/octet-stream";

/// Build the router for one server instance
pub(crate) fn router<R: FileResolver>(state: AppState<R>) -> Router {
    Router::new()
        .route("/", get(index::<R>).fallback(not_found))
        .route(FILE_ROUTE, get(serve_file::<R>).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Index page listing every shared file
async fn index<R: FileResolver>(State(state): State<AppState<R>>) -> Html<String> {
    Html(page::render_index(&state.snapshot))
}

/// Anything outside the two routes
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html("404 Not Found"))
}

/// Stream one shared file
async fn serve_file<R: FileResolver>(
    State(state): State<AppState<R>>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let key = match query.as_deref().map(uri_param) {
        Some(Ok(Some(uri))) if !uri.is_empty() => uri,
        Some(Err(raw)) => {
            tracing::debug!("Undecodable uri parameter: {}", raw);
            return Err(AppError::BadRequest("Bad Request".to_string()));
        }
        _ => return Err(AppError::BadRequest("Bad Request".to_string())),
    };

    let handle = state.snapshot.find(&key).ok_or_else(|| {
        tracing::debug!("No shared file matches {}", key);
        AppError::NotFound("File not found".to_string())
    })?;

    let reader = state.resolver.open(handle).await.map_err(|e| {
        tracing::error!("Failed to open {}: {}", handle, e);
        AppError::Internal("Error serving file".to_string())
    })?;

    let file_size = state.resolver.length(handle).await.ok_or_else(|| {
        tracing::warn!("Unable to determine size of {}", handle);
        AppError::Internal("Unable to determine file size".to_string())
    })?;

    let content_type = state
        .resolver
        .mime_type(handle)
        .and_then(|mime| HeaderValue::from_str(&mime).ok())
        .unwrap_or_else(|| HeaderValue::from_static(OCTET_STREAM));

    let filename = handle.display_name();
    tracing::info!("Serving {} ({} bytes)", filename, file_size);

    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, file_size)
        .header(header::CONTENT_DISPOSITION, content_disposition(&filename))
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

/// First `uri` value of a raw query string, percent-decoded
///
/// Returns the raw value as the error when it holds a malformed escape or
/// does not decode to UTF-8.
fn uri_param(query: &str) -> Result<Option<String>, &str> {
    let Some(raw) = query
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find_map(|(name, value)| (name == URI_PARAM).then_some(value))
    else {
        return Ok(None);
    };

    if !has_valid_escapes(raw) {
        return Err(raw);
    }
    let plus_decoded = raw.replace('+', " ");
    match urlencoding::decode(&plus_decoded) {
        Ok(decoded) => Ok(Some(decoded.into_owned())),
        Err(_) => Err(raw),
    }
}

/// Every `%` is followed by two hex digits
fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// `attachment; filename="<name>"`, with an RFC 5987 parameter for names
/// that cannot travel in a quoted ASCII string
pub(crate) fn content_disposition(filename: &str) -> HeaderValue {
    let mut quoted = String::with_capacity(filename.len());
    let mut needs_extended = false;

    for c in filename.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => quoted.push(c),
            _ => {
                needs_extended = true;
                quoted.push('_');
            }
        }
    }

    let mut value = format!("attachment; filename=\"{}\"", quoted);
    if needs_extended {
        value.push_str(&format!("; filename*=UTF-8''{}", urlencoding::encode(filename)));
    }

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
