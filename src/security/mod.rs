//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Client request
//!     → headers.rs (strip hop-by-hop before forwarding)
//!     → origin
//!     → headers.rs (strip hop-by-hop before answering)
//! ```

pub mod headers;
