//! Core data structures for the declaration surface.

pub mod entity;
pub mod layer;
pub mod manifest;
pub mod table;

pub use entity::{
    Entity, EntityKind, FreeType, FreeTypeDef, Global, Member, MemberBody, MemberKind, MethodSig,
    Param, TypeRef,
};
pub use layer::{DeclEvent, Layer, LayerId};
pub use manifest::{SurfaceManifest, VersionSpec};
pub use table::{AliasClash, KindClash, SymbolTable};
