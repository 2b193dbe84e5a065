//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → RedirectTable compiled and shared via ArcSwap
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new config sent to the server task
//!     → atomic swap of Arc<RedirectTable>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the redirect table is hot-reloaded; listener/origin changes need a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::EdgeConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::OriginConfig;
pub use schema::RedirectConfig;
pub use schema::TimeoutConfig;
pub use schema::TlsConfig;
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
