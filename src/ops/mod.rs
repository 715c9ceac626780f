//! High-level operations.

pub mod build;
pub mod compose;

pub use build::{build_all, BuildOptions, BuildReport};
pub use compose::{compose_version, ComposeError, ComposedSurface};
