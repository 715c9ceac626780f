//! Structural validation of a composed symbol table.
//!
//! Every check runs and every defect is collected; nothing
//! short-circuits, so a single run reports the full defect list for the
//! version being built. Validation is purely structural and never
//! inspects the described host.

use std::collections::HashMap;

use miette::Diagnostic as MietteDiagnostic;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;
use tracing::debug;

use crate::core::entity::EntityKind;
use crate::core::table::SymbolTable;
use crate::util::diagnostic::Diagnostic;

/// One structural defect in a composed surface.
#[derive(Debug, Clone, Error, MietteDiagnostic)]
pub enum ValidationIssue {
    #[error("class `{class}` extends unknown type `{base}`")]
    #[diagnostic(
        code(declsurface::validate::unresolved_base),
        help("declare `{base}` in some layer of this version, or drop the extends clause")
    )]
    UnresolvedBase { class: String, base: String },

    #[error("`{entity}.{member}` is declared both as a {existing_kind} and as a {new_kind}")]
    #[diagnostic(
        code(declsurface::validate::member_kind_conflict),
        help("one entity may not declare a method and a property with the same name")
    )]
    MemberKindConflict {
        entity: String,
        member: String,
        existing_kind: String,
        existing_layer: String,
        new_kind: String,
        new_layer: String,
    },

    #[error("free type `{name}` has conflicting definitions across layers")]
    #[diagnostic(
        code(declsurface::validate::alias_conflict),
        help("make the redefinition structurally identical, or rename one of the types")
    )]
    AliasConflict {
        name: String,
        first_layer: String,
        later_layer: String,
    },

    #[error("inheritance cycle: {}", path.join(" -> "))]
    #[diagnostic(
        code(declsurface::validate::inheritance_cycle),
        help("break the cycle by removing one of the extends clauses")
    )]
    InheritanceCycle { path: Vec<String> },
}

impl ValidationIssue {
    /// Render as a terminal diagnostic with layer context.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ValidationIssue::UnresolvedBase { class, base } => {
                Diagnostic::error(format!("class `{}` extends unknown type `{}`", class, base))
                    .with_suggestion(format!(
                        "declare `{}` in some layer of this version, or drop the extends clause",
                        base
                    ))
            }

            ValidationIssue::MemberKindConflict {
                entity,
                member,
                existing_kind,
                existing_layer,
                new_kind,
                new_layer,
            } => Diagnostic::error(format!(
                "`{}.{}` is declared both as a {} and as a {}",
                entity, member, existing_kind, new_kind
            ))
            .with_context(format!("layer `{}` declares the {}", existing_layer, existing_kind))
            .with_context(format!("layer `{}` declares the {}", new_layer, new_kind))
            .with_suggestion(
                "one entity may not declare a method and a property with the same name",
            ),

            ValidationIssue::AliasConflict {
                name,
                first_layer,
                later_layer,
            } => Diagnostic::error(format!(
                "free type `{}` has conflicting definitions across layers",
                name
            ))
            .with_context(format!("first defined in layer `{}`", first_layer))
            .with_context(format!("redefined differently in layer `{}`", later_layer))
            .with_suggestion("make the redefinition structurally identical, or rename one type"),

            ValidationIssue::InheritanceCycle { path } => {
                Diagnostic::error("inheritance cycle detected")
                    .with_context(format!("cycle: {}", path.join(" -> ")))
                    .with_suggestion("break the cycle by removing one of the extends clauses")
            }
        }
    }
}

/// Check a composed table. Returns an empty list when the table is
/// structurally sound.
///
/// Issue order is deterministic: unresolved bases in entity declaration
/// order, then kind conflicts and alias conflicts in the order the
/// composer recorded them, then inheritance cycles in declaration order
/// of their first member.
pub fn validate(table: &SymbolTable) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for entity in table.entities() {
        if let Some(base) = &entity.base {
            if !table.contains_entity(base) {
                issues.push(ValidationIssue::UnresolvedBase {
                    class: entity.name.clone(),
                    base: base.clone(),
                });
            }
        }
    }

    for clash in table.kind_clashes() {
        issues.push(ValidationIssue::MemberKindConflict {
            entity: clash.entity.clone(),
            member: clash.member.clone(),
            existing_kind: clash.existing_kind.to_string(),
            existing_layer: clash.existing_layer.to_string(),
            new_kind: clash.new_kind.to_string(),
            new_layer: clash.new_layer.to_string(),
        });
    }

    for clash in table.alias_clashes() {
        issues.push(ValidationIssue::AliasConflict {
            name: clash.name.clone(),
            first_layer: clash.first_layer.to_string(),
            later_layer: clash.later_layer.to_string(),
        });
    }

    issues.extend(find_cycles(table));

    if !issues.is_empty() {
        debug!(count = issues.len(), "validation found issues");
    }
    issues
}

/// Detect inheritance cycles over the `extends` graph.
fn find_cycles(table: &SymbolTable) -> Vec<ValidationIssue> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
    let mut declaration_index: HashMap<&str, usize> = HashMap::new();

    for (idx, entity) in table.entities().enumerate() {
        nodes.insert(&entity.name, graph.add_node(entity.name.clone()));
        declaration_index.insert(&entity.name, idx);
    }
    for entity in table.entities() {
        if entity.kind != EntityKind::Class {
            continue;
        }
        if let Some(base) = &entity.base {
            if let (Some(&from), Some(&to)) = (
                nodes.get(entity.name.as_str()),
                nodes.get(base.as_str()),
            ) {
                graph.add_edge(from, to, ());
            }
        }
    }

    let mut cycles = Vec::new();
    for scc in tarjan_scc(&graph) {
        let is_cycle = scc.len() > 1
            || (scc.len() == 1 && graph.contains_edge(scc[0], scc[0]));
        if !is_cycle {
            continue;
        }
        let mut path: Vec<String> = scc.iter().map(|&n| graph[n].clone()).collect();
        path.sort_by_key(|name| declaration_index[name.as_str()]);
        // Close the loop for readability.
        let first = path[0].clone();
        path.push(first);
        cycles.push(ValidationIssue::InheritanceCycle { path });
    }
    // Tarjan's order is reverse topological; report in declaration order.
    cycles.sort_by_key(|issue| match issue {
        ValidationIssue::InheritanceCycle { path } => declaration_index[path[0].as_str()],
        _ => usize::MAX,
    });
    cycles
}
