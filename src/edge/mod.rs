//! Edge runtime event contract.
//!
//! # Data Flow
//! ```text
//! { "request": { "uri": "/path", ... } }
//!     → event.rs (deserialize, keep unknown request fields)
//!     → handler.rs (RedirectTable::decide on request.uri)
//!     → original request (passthrough) | { statusCode, statusDescription, headers }
//! ```

pub mod event;
pub mod handler;

pub use event::{EdgeEvent, EdgeOutput, EdgeRequest, EdgeResponse, HeaderValue};
pub use handler::{handle_event, handle_json};
