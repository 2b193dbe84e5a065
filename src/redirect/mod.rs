//! Redirect decision subsystem.
//!
//! # Data Flow
//! ```text
//! Request path (verbatim, as delivered by the host)
//!     → table.rs (passthrough set, then exact rule lookup, then default)
//!     → Action::Passthrough | Action::Redirect
//!
//! Table Compilation (at startup / reload):
//!     RedirectConfig
//!     → Reject duplicate match paths
//!     → Index rules by exact path
//!     → Freeze as immutable RedirectTable
//! ```
//!
//! # Design Decisions
//! - Exact, case-sensitive matching only (no prefix, no pattern)
//! - Passthrough set is consulted before any rule
//! - Every non-passthrough path redirects; there is no "not found" outcome
//! - Tables are immutable; reload builds a new one

pub mod rule;
pub mod table;

pub use rule::{Action, Redirect, RedirectRule, MOVED_PERMANENTLY};
pub use table::{RedirectTable, TableError};
