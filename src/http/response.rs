//! Response construction.
//!
//! # Responsibilities
//! - Translate a redirect decision into an HTTP response
//! - Map origin errors to appropriate HTTP status codes
//!
//! # Design Decisions
//! - Redirects carry no body; the `Location` header is the payload
//! - Origin timeouts result in 504 Gateway Timeout
//! - Every other origin failure results in 502 Bad Gateway

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::origin::OriginError;
use crate::redirect::Redirect;

/// Build the HTTP response for a redirect decision.
pub fn redirect_response(redirect: &Redirect) -> Response {
    let status = StatusCode::from_u16(redirect.status_code).unwrap_or(StatusCode::MOVED_PERMANENTLY);
    match HeaderValue::from_str(&redirect.location) {
        Ok(location) => (status, [(header::LOCATION, location)]).into_response(),
        Err(_) => {
            tracing::error!(location = %redirect.location, "Redirect target is not a valid header value");
            (StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect target").into_response()
        }
    }
}

impl IntoResponse for OriginError {
    fn into_response(self) -> Response {
        match self {
            OriginError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "Origin timed out").into_response(),
            _ => (StatusCode::BAD_GATEWAY, "Origin request failed").into_response(),
        }
    }
}
