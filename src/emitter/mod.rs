//! Surface emission - a validated table into declaration text.
//!
//! Emission is a pure projection: identical inputs always yield
//! byte-identical output, which is what makes builds reproducible across
//! versions that share most of the base layer. Order is free types, then
//! globals, then classes/interfaces, each in first-declared order.

use std::fmt::Write;

use crate::core::entity::{Entity, EntityKind, FreeTypeDef, Member, MemberBody, Param};
use crate::core::table::SymbolTable;

/// Documentation wrap width for emitted doc blocks.
const MAX_WIDTH: usize = 100;

/// Member names that collide with keywords of the declaration language.
/// Emitted commented out rather than silently dropped.
const RESERVED_WORDS: &[&str] = &["void"];

/// Serialize a validated table for one host version.
pub fn emit(table: &SymbolTable, host: &str, version: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// {} {} scripting surface", host, version);

    for ft in table.free_types() {
        out.push('\n');
        write_doc(&mut out, ft.doc.as_deref(), "");
        match &ft.def {
            FreeTypeDef::Literals(literals) => {
                let body = literals
                    .iter()
                    .map(|l| format!("\"{}\"", l))
                    .collect::<Vec<_>>()
                    .join(" | ");
                let _ = writeln!(out, "declare type {} = {};", ft.name, body);
            }
            FreeTypeDef::Alias(target) => {
                let _ = writeln!(out, "declare type {} = {};", ft.name, target);
            }
        }
    }

    for global in table.globals() {
        out.push('\n');
        write_doc(&mut out, global.doc.as_deref(), "");
        let _ = writeln!(out, "declare var {}: {};", global.name, global.ty);
    }

    for entity in table.entities() {
        out.push('\n');
        write_entity(&mut out, entity);
    }

    out
}

fn write_entity(out: &mut String, entity: &Entity) {
    write_doc(out, entity.doc.as_deref(), "");
    match (entity.kind, &entity.base) {
        (EntityKind::Class, Some(base)) => {
            let _ = writeln!(out, "declare class {} extends {} {{", entity.name, base);
        }
        (EntityKind::Class, None) => {
            let _ = writeln!(out, "declare class {} {{", entity.name);
        }
        (EntityKind::Interface, _) => {
            let _ = writeln!(out, "declare interface {} {{", entity.name);
        }
    }

    for ctor in &entity.constructors {
        let _ = writeln!(out, "  constructor({});", params_text(&ctor.params));
    }

    for member in &entity.members {
        write_member(out, entity.kind, member);
    }

    out.push_str("}\n");
}

fn write_member(out: &mut String, kind: EntityKind, member: &Member) {
    write_doc(out, member.doc.as_deref(), "  ");
    let prefix = if RESERVED_WORDS.contains(&member.name.as_str()) {
        "// /* Invalid - Reserved word */ "
    } else {
        ""
    };
    let visibility = match kind {
        EntityKind::Class => "public ",
        EntityKind::Interface => "",
    };
    match &member.body {
        MemberBody::Method(sig) => {
            let _ = writeln!(
                out,
                "  {}{}{}({}): {};",
                prefix,
                visibility,
                member.name,
                params_text(&sig.params),
                sig.returns
            );
        }
        MemberBody::Property { ty, readonly } => {
            let ro = if *readonly { "readonly " } else { "" };
            let _ = writeln!(out, "  {}{}{}{}: {};", prefix, visibility, ro, member.name, ty);
        }
    }
}

/// Render a parameter list. Once one parameter is optional, every later
/// parameter is rendered optional too: the declaration language requires
/// optional parameters to trail, and the documentation source does not
/// always mark the tail consistently.
fn params_text(params: &[Param]) -> String {
    let mut broke_optional = false;
    let mut parts = Vec::with_capacity(params.len());
    for param in params {
        if param.optional {
            broke_optional = true;
        }
        let marker = if broke_optional { "?" } else { "" };
        parts.push(format!("{}{}: {}", param.name, marker, param.ty));
    }
    parts.join(", ")
}

fn write_doc(out: &mut String, doc: Option<&str>, indent: &str) {
    let Some(doc) = doc else { return };
    let _ = writeln!(out, "{}/**", indent);
    for line in wrap(doc, MAX_WIDTH) {
        let _ = writeln!(out, "{} * {}", indent, line);
    }
    let _ = writeln!(out, "{} */", indent);
}

/// Greedy word wrap; never splits a word.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for source_line in text.lines() {
        let mut current = String::new();
        for word in source_line.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
            } else if current.len() + 1 + word.len() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::compose;
    use crate::core::entity::{FreeType, Global, MethodSig, TypeRef};
    use crate::core::layer::{DeclEvent, Layer, LayerId};

    fn sample_table() -> SymbolTable {
        let mut base = Layer::new(LayerId::new("base"));
        base.push(DeclEvent::DefineAlias {
            free_type: FreeType {
                name: "ColumnType".to_string(),
                def: FreeTypeDef::Literals(vec!["DRAWING".to_string(), "SOUND".to_string()]),
                doc: Some("Column type as returned by column.type()".to_string()),
                source_layer: LayerId::new("base"),
            },
        });
        base.push(DeclEvent::DefineGlobal {
            global: Global {
                name: "scene".to_string(),
                ty: TypeRef::new("Scene"),
                doc: None,
                source_layer: LayerId::new("base"),
            },
        });
        base.push(DeclEvent::DefineClass {
            name: "Sound".to_string(),
            base: Some("QObject".to_string()),
            doc: None,
        });
        base.push(DeclEvent::DefineClass {
            name: "QObject".to_string(),
            base: None,
            doc: None,
        });
        base.push(DeclEvent::AddMember {
            entity: "Sound".to_string(),
            member: Member {
                name: "play".to_string(),
                body: MemberBody::Method(MethodSig {
                    params: vec![
                        Param {
                            name: "start".to_string(),
                            ty: TypeRef::new("int"),
                            optional: false,
                        },
                        Param {
                            name: "loop".to_string(),
                            ty: TypeRef::new("boolean"),
                            optional: true,
                        },
                        Param {
                            name: "rate".to_string(),
                            ty: TypeRef::new("float"),
                            optional: false,
                        },
                    ],
                    returns: TypeRef::new("void"),
                }),
                doc: None,
                source_layer: LayerId::new("base"),
            },
        });
        base.push(DeclEvent::AddMember {
            entity: "Sound".to_string(),
            member: Member {
                name: "volume".to_string(),
                body: MemberBody::Property {
                    ty: TypeRef::new("float"),
                    readonly: true,
                },
                doc: None,
                source_layer: LayerId::new("base"),
            },
        });
        compose(&[base])
    }

    #[test]
    fn test_emission_is_deterministic() {
        let table = sample_table();
        let a = emit(&table, "harmony", "22");
        let b = emit(&table, "harmony", "22");
        assert_eq!(a, b);
    }

    #[test]
    fn test_emission_order_and_shape() {
        let out = emit(&sample_table(), "harmony", "22");
        assert!(out.starts_with("// harmony 22 scripting surface\n"));

        let ty = out.find("declare type ColumnType").unwrap();
        let global = out.find("declare var scene: Scene;").unwrap();
        let class = out.find("declare class Sound extends QObject {").unwrap();
        assert!(ty < global && global < class);

        assert!(out.contains("declare type ColumnType = \"DRAWING\" | \"SOUND\";"));
        assert!(out.contains("  public readonly volume: float;"));
    }

    #[test]
    fn test_optional_params_break_the_tail() {
        // Everything after the first optional parameter renders optional.
        let out = emit(&sample_table(), "harmony", "22");
        assert!(out.contains("public play(start: int, loop?: boolean, rate?: float): void;"));
    }

    #[test]
    fn test_reserved_word_member_is_commented_out() {
        let mut base = Layer::new(LayerId::new("base"));
        base.push(DeclEvent::DefineClass {
            name: "Attr".to_string(),
            base: None,
            doc: None,
        });
        base.push(DeclEvent::AddMember {
            entity: "Attr".to_string(),
            member: Member {
                name: "void".to_string(),
                body: MemberBody::Method(MethodSig {
                    params: vec![],
                    returns: TypeRef::new("void"),
                }),
                doc: None,
                source_layer: LayerId::new("base"),
            },
        });
        let out = emit(&compose(&[base]), "harmony", "22");
        assert!(out.contains("// /* Invalid - Reserved word */ public void(): void;"));
    }

    #[test]
    fn test_doc_blocks_wrap_long_lines() {
        let long = "word ".repeat(40);
        let mut base = Layer::new(LayerId::new("base"));
        base.push(DeclEvent::DefineGlobal {
            global: Global {
                name: "env".to_string(),
                ty: TypeRef::any(),
                doc: Some(long),
                source_layer: LayerId::new("base"),
            },
        });
        let out = emit(&compose(&[base]), "harmony", "22");
        for line in out.lines() {
            assert!(line.len() <= MAX_WIDTH + 3, "line too long: {}", line);
        }
        assert!(out.contains("/**"));
        assert!(out.contains(" */"));
    }

    #[test]
    fn test_interface_members_have_no_visibility() {
        let mut base = Layer::new(LayerId::new("base"));
        base.push(DeclEvent::DefineInterface {
            name: "TextLayer".to_string(),
            doc: None,
        });
        base.push(DeclEvent::AddMember {
            entity: "TextLayer".to_string(),
            member: Member {
                name: "text".to_string(),
                body: MemberBody::Property {
                    ty: TypeRef::new("string"),
                    readonly: false,
                },
                doc: None,
                source_layer: LayerId::new("base"),
            },
        });
        let out = emit(&compose(&[base]), "harmony", "22");
        assert!(out.contains("declare interface TextLayer {"));
        assert!(out.contains("  text: string;"));
        assert!(!out.contains("public text"));
    }
}
