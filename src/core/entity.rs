//! Entities and members - the declared shape of the host object model.
//!
//! An Entity is a named class or interface; a Member is a method or
//! property belonging to exactly one Entity. Signatures are input facts
//! copied from host documentation, never inferred.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::layer::LayerId;

/// A type reference as written in the host documentation.
///
/// Kept as text (`"int"`, `"string | int"`, `"soundColumnInterface"`):
/// the composer compares and emits types, it never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(text: impl Into<String>) -> Self {
        TypeRef(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `any` placeholder used by layers that declare a symbol before
    /// a later layer narrows it to a concrete shape.
    pub fn any() -> Self {
        TypeRef("any".to_string())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    /// Optional parameters must form a suffix of the list; the emitter
    /// enforces that by treating everything after the first optional
    /// parameter as optional too.
    pub optional: bool,
}

/// A method signature: ordered parameters plus a return type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSig {
    pub params: Vec<Param>,
    pub returns: TypeRef,
}

impl MethodSig {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Discriminates the two member shapes. A method and a property may never
/// share a name on one entity; the composer records that clash rather
/// than letting either definition win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Method,
    Property,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Method => write!(f, "method"),
            MemberKind::Property => write!(f, "property"),
        }
    }
}

/// The kind-specific payload of a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberBody {
    Method(MethodSig),
    Property { ty: TypeRef, readonly: bool },
}

/// A member of one Entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub body: MemberBody,
    /// One-line description carried through to the emitted doc block.
    pub doc: Option<String>,
    /// The layer that last defined this member, for conflict diagnostics.
    pub source_layer: LayerId,
}

impl Member {
    pub fn kind(&self) -> MemberKind {
        match self.body {
            MemberBody::Method(_) => MemberKind::Method,
            MemberBody::Property { .. } => MemberKind::Property,
        }
    }

    /// Structural signature equality, ignoring provenance and docs.
    pub fn same_signature(&self, other: &Member) -> bool {
        self.body == other.body
    }
}

/// Class vs interface. Both live in one namespace; a class `extends`
/// target may name either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Class,
    Interface,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Class => write!(f, "class"),
            EntityKind::Interface => write!(f, "interface"),
        }
    }
}

/// A named type definition in the composed surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    /// Parent entity name (classes only); resolved by the validator once
    /// composition finishes.
    pub base: Option<String>,
    /// Constructor overloads, classes only.
    pub constructors: Vec<MethodSig>,
    /// Member list in last-applied order.
    pub members: Vec<Member>,
    pub doc: Option<String>,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Entity {
            name: name.into(),
            kind,
            base: None,
            constructors: Vec::new(),
            members: Vec::new(),
            doc: None,
        }
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn member_position(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }
}

/// The structural definition of a free type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreeTypeDef {
    /// Closed set of string literal values, e.g. the column types a host
    /// query can return.
    Literals(Vec<String>),
    /// Alias to another type, usually `any` for undocumented host types.
    Alias(TypeRef),
}

impl FreeTypeDef {
    /// Structural equality: literal sets compare unordered, aliases by
    /// target. Same-name redefinition with an equal structure is a no-op
    /// during composition.
    pub fn structurally_eq(&self, other: &FreeTypeDef) -> bool {
        match (self, other) {
            (FreeTypeDef::Literals(a), FreeTypeDef::Literals(b)) => {
                let mut a = a.clone();
                let mut b = b.clone();
                a.sort();
                b.sort();
                a == b
            }
            (FreeTypeDef::Alias(a), FreeTypeDef::Alias(b)) => a == b,
            _ => false,
        }
    }
}

/// A free type: string-literal union or primitive alias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeType {
    pub name: String,
    pub def: FreeTypeDef,
    pub doc: Option<String>,
    pub source_layer: LayerId,
}

/// A global binding exposed to scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub name: String,
    pub ty: TypeRef,
    pub doc: Option<String>,
    pub source_layer: LayerId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(id: &str) -> LayerId {
        LayerId::new(id)
    }

    #[test]
    fn test_member_kind() {
        let m = Member {
            name: "volume".to_string(),
            body: MemberBody::Method(MethodSig {
                params: vec![],
                returns: TypeRef::new("float"),
            }),
            doc: None,
            source_layer: layer("base"),
        };
        assert_eq!(m.kind(), MemberKind::Method);

        let p = Member {
            name: "volume".to_string(),
            body: MemberBody::Property {
                ty: TypeRef::new("float"),
                readonly: true,
            },
            doc: None,
            source_layer: layer("base"),
        };
        assert_eq!(p.kind(), MemberKind::Property);
        assert!(!m.same_signature(&p));
    }

    #[test]
    fn test_free_type_structural_eq_ignores_literal_order() {
        let a = FreeTypeDef::Literals(vec!["SOUND".to_string(), "DRAWING".to_string()]);
        let b = FreeTypeDef::Literals(vec!["DRAWING".to_string(), "SOUND".to_string()]);
        let c = FreeTypeDef::Literals(vec!["DRAWING".to_string()]);
        assert!(a.structurally_eq(&b));
        assert!(!a.structurally_eq(&c));
        assert!(!a.structurally_eq(&FreeTypeDef::Alias(TypeRef::any())));
    }
}
