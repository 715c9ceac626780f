//! Fragment loading - raw JSON descriptions into declaration events.
//!
//! A fragment is one flat JSON document per layer, authored from host
//! documentation. The loader checks the minimal schema (names are valid
//! identifiers, methods carry a return type, constructor overloads do
//! not conflict) and flattens each entity into Define*/Add* events in
//! file order. It never checks cross-layer conflicts: those are deferred
//! to the composer so collision diagnostics can report full layer
//! context.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::core::entity::{
    FreeType, FreeTypeDef, Global, Member, MemberBody, MethodSig, Param, TypeRef,
};
use crate::core::layer::{DeclEvent, Layer, LayerId};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

/// A fragment that violates the minimal input schema. Fatal for that
/// fragment; always carries the fragment and offending item identity.
#[derive(Debug, Error)]
pub enum MalformedFragment {
    #[error("fragment `{fragment}`: not valid JSON: {source}")]
    Parse {
        fragment: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("fragment `{fragment}`: `{name}` is not a valid identifier")]
    BadIdentifier { fragment: String, name: String },

    #[error("fragment `{fragment}`: entity `{entity}` has unknown kind `{kind}`")]
    UnknownKind {
        fragment: String,
        entity: String,
        kind: String,
    },

    #[error("fragment `{fragment}`: method `{entity}.{member}` has no return type")]
    MissingReturn {
        fragment: String,
        entity: String,
        member: String,
    },

    #[error(
        "fragment `{fragment}`: class `{entity}` declares conflicting {arity}-ary constructors"
    )]
    ConstructorConflict {
        fragment: String,
        entity: String,
        arity: usize,
    },

    #[error("fragment `{fragment}`: interface `{entity}` declares a base class")]
    InterfaceWithBase { fragment: String, entity: String },

    #[error(
        "fragment `{fragment}`: free type `{name}` must have exactly one of `literals` or `target`"
    )]
    AmbiguousFreeType { fragment: String, name: String },
}

#[derive(Debug, Deserialize)]
struct RawFragment {
    #[serde(default)]
    entities: Vec<RawEntity>,
    #[serde(default)]
    free_types: Vec<RawFreeType>,
    #[serde(default)]
    globals: Vec<RawGlobal>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    name: String,
    kind: String,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    doc: Option<String>,
    #[serde(default)]
    constructors: Vec<RawConstructor>,
    #[serde(default)]
    methods: Vec<RawMethod>,
    #[serde(default)]
    properties: Vec<RawProperty>,
}

#[derive(Debug, Deserialize)]
struct RawConstructor {
    #[serde(default)]
    params: Vec<RawParam>,
}

#[derive(Debug, Deserialize)]
struct RawMethod {
    name: String,
    #[serde(default)]
    params: Vec<RawParam>,
    #[serde(default)]
    returns: Option<String>,
    #[serde(default)]
    doc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawParam {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    optional: bool,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    readonly: bool,
    #[serde(default)]
    doc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFreeType {
    name: String,
    #[serde(default)]
    literals: Option<Vec<String>>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    doc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGlobal {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    doc: Option<String>,
}

/// Parse one fragment into a layer of declaration events.
///
/// `skip` names entities to drop before event generation (host-internal
/// base machinery that must not reach the surface).
pub fn load_fragment(
    id: &LayerId,
    text: &str,
    skip: &HashSet<String>,
) -> Result<Layer, MalformedFragment> {
    let raw: RawFragment = serde_json::from_str(text).map_err(|source| MalformedFragment::Parse {
        fragment: id.to_string(),
        source,
    })?;

    let mut layer = Layer::new(id.clone());

    for entity in &raw.entities {
        if skip.contains(&entity.name) {
            debug!(layer = %id, entity = %entity.name, "skipping entity");
            continue;
        }
        load_entity(id, entity, &mut layer)?;
    }

    for ft in &raw.free_types {
        check_identifier(id, &ft.name)?;
        let def = match (&ft.literals, &ft.target) {
            (Some(literals), None) => FreeTypeDef::Literals(literals.clone()),
            (None, Some(target)) => FreeTypeDef::Alias(TypeRef::new(target.clone())),
            _ => {
                return Err(MalformedFragment::AmbiguousFreeType {
                    fragment: id.to_string(),
                    name: ft.name.clone(),
                })
            }
        };
        layer.push(DeclEvent::DefineAlias {
            free_type: FreeType {
                name: ft.name.clone(),
                def,
                doc: ft.doc.clone(),
                source_layer: id.clone(),
            },
        });
    }

    for global in &raw.globals {
        check_identifier(id, &global.name)?;
        layer.push(DeclEvent::DefineGlobal {
            global: Global {
                name: global.name.clone(),
                ty: TypeRef::new(global.ty.clone()),
                doc: global.doc.clone(),
                source_layer: id.clone(),
            },
        });
    }

    debug!(layer = %id, events = layer.len(), "loaded fragment");
    Ok(layer)
}

fn load_entity(
    id: &LayerId,
    entity: &RawEntity,
    layer: &mut Layer,
) -> Result<(), MalformedFragment> {
    check_identifier(id, &entity.name)?;
    if let Some(base) = &entity.extends {
        check_identifier(id, base)?;
    }

    match entity.kind.as_str() {
        "class" => {
            layer.push(DeclEvent::DefineClass {
                name: entity.name.clone(),
                base: entity.extends.clone(),
                doc: entity.doc.clone(),
            });
        }
        "interface" => {
            if entity.extends.is_some() {
                return Err(MalformedFragment::InterfaceWithBase {
                    fragment: id.to_string(),
                    entity: entity.name.clone(),
                });
            }
            layer.push(DeclEvent::DefineInterface {
                name: entity.name.clone(),
                doc: entity.doc.clone(),
            });
        }
        other => {
            return Err(MalformedFragment::UnknownKind {
                fragment: id.to_string(),
                entity: entity.name.clone(),
                kind: other.to_string(),
            });
        }
    }

    // Two constructor overloads with the same arity must agree exactly;
    // the documentation source repeats identical overloads, which is fine.
    let mut by_arity: HashMap<usize, MethodSig> = HashMap::new();
    for ctor in &entity.constructors {
        let sig = MethodSig {
            params: convert_params(id, &ctor.params)?,
            returns: TypeRef::new("void"),
        };
        match by_arity.get(&sig.arity()) {
            Some(existing) if *existing != sig => {
                return Err(MalformedFragment::ConstructorConflict {
                    fragment: id.to_string(),
                    entity: entity.name.clone(),
                    arity: sig.arity(),
                });
            }
            Some(_) => continue,
            None => {
                by_arity.insert(sig.arity(), sig.clone());
                layer.push(DeclEvent::AddConstructor {
                    entity: entity.name.clone(),
                    sig,
                });
            }
        }
    }

    for method in &entity.methods {
        check_identifier(id, &method.name)?;
        let returns = method
            .returns
            .as_ref()
            .ok_or_else(|| MalformedFragment::MissingReturn {
                fragment: id.to_string(),
                entity: entity.name.clone(),
                member: method.name.clone(),
            })?;
        layer.push(DeclEvent::AddMember {
            entity: entity.name.clone(),
            member: Member {
                name: method.name.clone(),
                body: MemberBody::Method(MethodSig {
                    params: convert_params(id, &method.params)?,
                    returns: TypeRef::new(returns.clone()),
                }),
                doc: method.doc.clone(),
                source_layer: id.clone(),
            },
        });
    }

    for prop in &entity.properties {
        check_identifier(id, &prop.name)?;
        layer.push(DeclEvent::AddMember {
            entity: entity.name.clone(),
            member: Member {
                name: prop.name.clone(),
                body: MemberBody::Property {
                    ty: TypeRef::new(prop.ty.clone()),
                    readonly: prop.readonly,
                },
                doc: prop.doc.clone(),
                source_layer: id.clone(),
            },
        });
    }

    Ok(())
}

fn convert_params(id: &LayerId, params: &[RawParam]) -> Result<Vec<Param>, MalformedFragment> {
    params
        .iter()
        .map(|p| {
            check_identifier(id, &p.name)?;
            Ok(Param {
                name: p.name.clone(),
                ty: TypeRef::new(p.ty.clone()),
                optional: p.optional,
            })
        })
        .collect()
}

fn check_identifier(id: &LayerId, name: &str) -> Result<(), MalformedFragment> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(MalformedFragment::BadIdentifier {
            fragment: id.to_string(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Result<Layer, MalformedFragment> {
        load_fragment(&LayerId::new("test"), text, &HashSet::new())
    }

    #[test]
    fn test_load_simple_class() {
        let layer = load(
            r#"{
                "entities": [{
                    "name": "Sound",
                    "kind": "class",
                    "extends": "QObject",
                    "methods": [
                        {"name": "name", "returns": "string"},
                        {"name": "play", "params": [{"name": "loop", "type": "boolean", "optional": true}], "returns": "void"}
                    ],
                    "properties": [{"name": "volume", "type": "float"}]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(layer.len(), 4);
        match &layer.events[0] {
            DeclEvent::DefineClass { name, base, .. } => {
                assert_eq!(name, "Sound");
                assert_eq!(base.as_deref(), Some("QObject"));
            }
            other => panic!("expected DefineClass, got {:?}", other),
        }
        match &layer.events[2] {
            DeclEvent::AddMember { member, .. } => {
                assert_eq!(member.name, "play");
                assert!(matches!(member.body, MemberBody::Method(_)));
            }
            other => panic!("expected AddMember, got {:?}", other),
        }
    }

    #[test]
    fn test_skip_list_drops_entity() {
        let mut skip = HashSet::new();
        skip.insert("QObject".to_string());
        let layer = load_fragment(
            &LayerId::new("test"),
            r#"{"entities": [{"name": "QObject", "kind": "class"}]}"#,
            &skip,
        )
        .unwrap();
        assert!(layer.is_empty());
    }

    #[test]
    fn test_method_without_return_type_is_malformed() {
        let err = load(
            r#"{"entities": [{"name": "Sound", "kind": "class",
                "methods": [{"name": "play"}]}]}"#,
        )
        .unwrap_err();
        match err {
            MalformedFragment::MissingReturn { entity, member, .. } => {
                assert_eq!(entity, "Sound");
                assert_eq!(member, "play");
            }
            other => panic!("expected MissingReturn, got {:?}", other),
        }
    }

    #[test]
    fn test_conflicting_constructor_arity_is_malformed() {
        let err = load(
            r#"{"entities": [{"name": "Point", "kind": "class",
                "constructors": [
                    {"params": [{"name": "x", "type": "int"}]},
                    {"params": [{"name": "angle", "type": "float"}]}
                ]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MalformedFragment::ConstructorConflict { arity: 1, .. }
        ));
    }

    #[test]
    fn test_identical_repeated_constructor_is_accepted_once() {
        let layer = load(
            r#"{"entities": [{"name": "Point", "kind": "class",
                "constructors": [
                    {"params": [{"name": "x", "type": "int"}]},
                    {"params": [{"name": "x", "type": "int"}]}
                ]}]}"#,
        )
        .unwrap();
        let ctors = layer
            .events
            .iter()
            .filter(|e| matches!(e, DeclEvent::AddConstructor { .. }))
            .count();
        assert_eq!(ctors, 1);
    }

    #[test]
    fn test_bad_identifier_is_malformed() {
        let err = load(r#"{"globals": [{"name": "not a name", "type": "any"}]}"#).unwrap_err();
        assert!(matches!(err, MalformedFragment::BadIdentifier { .. }));
    }

    #[test]
    fn test_free_type_needs_exactly_one_definition() {
        let err = load(r#"{"free_types": [{"name": "ColumnType"}]}"#).unwrap_err();
        assert!(matches!(err, MalformedFragment::AmbiguousFreeType { .. }));

        let err = load(
            r#"{"free_types": [{"name": "ColumnType", "literals": ["SOUND"], "target": "any"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MalformedFragment::AmbiguousFreeType { .. }));
    }

    #[test]
    fn test_parse_error_carries_fragment_identity() {
        let err = load("not json").unwrap_err();
        assert!(err.to_string().contains("`test`"));
    }
}
