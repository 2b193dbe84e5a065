//! Origin forwarding.
//!
//! # Responsibilities
//! - Hold the origin address and a pooled HTTP client
//! - Rewrite passthrough requests to target the origin
//! - Serve the default root object for `/`
//! - Bound the wait for origin response headers
//!
//! # Design Decisions
//! - Bodies are streamed in both directions, never buffered
//! - No retries: the request body is consumed by the first attempt
//! - `Host` is rewritten to the origin authority

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{self, HeaderValue, InvalidHeaderValue};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Response, Uri, Version};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::OriginConfig;
use crate::security::headers::strip_hop_by_hop;

/// Error talking to the origin.
#[derive(Debug, thiserror::Error)]
pub enum OriginError {
    #[error("invalid origin url {0:?}: expected http://host[:port]")]
    InvalidUrl(String),

    #[error("failed to build origin request: {0}")]
    Build(#[from] axum::http::Error),

    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),

    #[error("origin request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("origin did not respond within {0:?}")]
    Timeout(Duration),
}

impl OriginError {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            OriginError::InvalidUrl(_) | OriginError::Build(_) | OriginError::Header(_) => "request",
            OriginError::Request(_) => "connect",
            OriginError::Timeout(_) => "timeout",
        }
    }
}

/// The backing service passthrough requests are sent to.
#[derive(Debug, Clone)]
pub struct Origin {
    authority: Authority,
    host_header: HeaderValue,
    default_root_object: Option<String>,
    timeout: Duration,
    client: Client<HttpConnector, Body>,
}

impl Origin {
    /// Create an origin from configuration.
    pub fn from_config(config: &OriginConfig, timeout: Duration) -> Result<Self, OriginError> {
        let invalid = || OriginError::InvalidUrl(config.url.clone());

        let uri: Uri = config.url.parse().map_err(|_| invalid())?;
        if uri.scheme() != Some(&Scheme::HTTP) {
            return Err(invalid());
        }
        // Requests are forwarded with their own path, so a base path would be lost.
        if !matches!(uri.path(), "" | "/") || uri.query().is_some() {
            return Err(invalid());
        }
        let authority = uri.authority().cloned().ok_or_else(invalid)?;
        let host_header = HeaderValue::from_str(authority.as_str())?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            authority,
            host_header,
            default_root_object: config.default_root_object.clone(),
            timeout,
            client,
        })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Map a client URI to the origin URI.
    ///
    /// Path and query are kept; a bare `/` becomes the default root object.
    pub fn origin_uri(&self, uri: &Uri) -> Result<Uri, OriginError> {
        let path_and_query = match (&self.default_root_object, uri.path()) {
            (Some(object), "/") => {
                let rewritten = match uri.query() {
                    Some(query) => format!("/{}?{}", object, query),
                    None => format!("/{}", object),
                };
                PathAndQuery::try_from(rewritten).map_err(axum::http::Error::from)?
            }
            _ => uri
                .path_and_query()
                .cloned()
                .unwrap_or_else(|| PathAndQuery::from_static("/")),
        };

        Ok(Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?)
    }

    /// Forward a request to the origin and stream back its response.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, OriginError> {
        let (mut parts, body) = request.into_parts();

        parts.uri = self.origin_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        parts.headers.insert(header::HOST, self.host_header.clone());

        tracing::trace!(uri = %parts.uri, "Forwarding to origin");

        let response = tokio::time::timeout(
            self.timeout,
            self.client.request(Request::from_parts(parts, body)),
        )
        .await
        .map_err(|_| OriginError::Timeout(self.timeout))??;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
