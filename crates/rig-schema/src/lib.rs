//! Shared catalog types for rig.
//!
//! The catalog is the declarative description of what should be installed on
//! a machine: one [`ApplicationSpec`] per application plus the [`Settings`]
//! that shape a run (retry bounds, concurrency, manager command templates).

pub mod catalog;
pub mod hash;
pub mod settings;
pub mod types;

// Re-exports
pub use catalog::{ApplicationSpec, Catalog, CatalogError, ConfigWarning};
pub use hash::{DigestError, Sha256Digest};
pub use settings::*;
pub use types::AppName;

/// Catalog compiled into the binary, used when no catalog file can be loaded.
pub const DEFAULT_CATALOG: &str = include_str!("../catalog/default.toml");
