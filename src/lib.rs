//! declsurface - layered declaration-surface composition.
//!
//! This crate builds, validates, and emits the type schema a versioned
//! scripting host exposes to user scripts. Declaration fragments are
//! merged per target version: a base layer plus ordered override
//! layers, with deterministic last-wins member resolution and collected
//! structural diagnostics.

pub mod composer;
pub mod core;
pub mod emitter;
pub mod loader;
pub mod ops;
pub mod util;
pub mod validator;

pub use crate::core::{
    entity::{Entity, EntityKind, FreeType, FreeTypeDef, Global, Member, MemberBody, MemberKind},
    layer::{DeclEvent, Layer, LayerId},
    manifest::SurfaceManifest,
    table::SymbolTable,
};

pub use composer::compose;
pub use emitter::emit;
pub use loader::{load_fragment, MalformedFragment};
pub use ops::{build_all, BuildOptions, BuildReport, ComposeError, ComposedSurface};
pub use validator::{validate, ValidationIssue};
