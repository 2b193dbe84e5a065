//! Edge redirect service library.
//!
//! Decides, per request path, whether to pass a request through to the
//! origin or answer with a `301 Moved Permanently`, and hosts that decision
//! both as an HTTP edge service and as an edge-runtime event handler.

pub mod config;
pub mod edge;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod origin;
pub mod redirect;
pub mod security;

pub use config::schema::EdgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use redirect::{Action, Redirect, RedirectRule, RedirectTable};
