//! Event and response shapes expected by the edge runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::redirect::Redirect;

/// Viewer-request event delivered by the edge runtime.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EdgeEvent {
    pub request: EdgeRequest,

    /// Other top-level event fields (version, context, viewer, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request object inside an event.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EdgeRequest {
    /// Request path, without the query string.
    pub uri: String,

    /// Everything else the runtime sent (method, querystring, headers,
    /// cookies). Retained so a passthrough hands back the same object.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EdgeRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            extra: Map::new(),
        }
    }
}

/// `{ "value": ... }` header wrapper used by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeaderValue {
    pub value: String,
}

/// Short-circuit response returned to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeResponse {
    pub status_code: u16,
    pub status_description: String,
    pub headers: BTreeMap<String, HeaderValue>,
}

impl From<Redirect> for EdgeResponse {
    fn from(redirect: Redirect) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            "location".to_string(),
            HeaderValue {
                value: redirect.location,
            },
        );
        Self {
            status_code: redirect.status_code,
            status_description: redirect.status_description.to_string(),
            headers,
        }
    }
}

/// What the handler returns to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EdgeOutput {
    /// The original request, to continue to the origin.
    Request(EdgeRequest),
    Response(EdgeResponse),
}
