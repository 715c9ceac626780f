//! Layer composition - the merge policy.
//!
//! Applies every layer's events in layer-precedence order, and within a
//! layer in declaration order, onto one fresh symbol table:
//!
//! - Entity redefinition extends the existing entity: a declared base
//!   overwrites the prior base, members merge member-by-member. This
//!   models documentation split across a base preamble and a per-version
//!   supplement describing the same class.
//! - Same-kind member collision: last-applied-wins, the old definition is
//!   discarded (never kept as an overload) and the member moves to the
//!   end of the list.
//! - Method/property kind clash: irreconcilable. The existing member is
//!   kept, the clash is recorded for the validator. Never silently
//!   dropped.
//! - Free type redefinition: structural no-op, or a recorded conflict.
//! - Globals: wholesale last-wins replacement.
//!
//! Composition is deterministic given a fixed layer order and has no
//! side effects beyond the in-progress table.

use tracing::{debug, trace};

use crate::core::entity::{EntityKind, Member};
use crate::core::layer::{DeclEvent, Layer, LayerId};
use crate::core::table::{AliasClash, KindClash, SymbolTable};

/// Compose an ordered list of layers into a fresh symbol table.
///
/// The slice order is the precedence order: base first, then each
/// override layer. Later layers supersede earlier ones per the member
/// merge rules.
pub fn compose(layers: &[Layer]) -> SymbolTable {
    let mut table = SymbolTable::new();
    for layer in layers {
        debug!(layer = %layer.id, events = layer.len(), "applying layer");
        for event in &layer.events {
            apply(&mut table, &layer.id, event);
        }
    }
    table
}

fn apply(table: &mut SymbolTable, layer: &LayerId, event: &DeclEvent) {
    match event {
        DeclEvent::DefineClass { name, base, doc } => {
            let entity = table.entity_entry(name, EntityKind::Class);
            entity.kind = EntityKind::Class;
            if base.is_some() {
                entity.base = base.clone();
            }
            if doc.is_some() {
                entity.doc = doc.clone();
            }
        }

        DeclEvent::DefineInterface { name, doc } => {
            let entity = table.entity_entry(name, EntityKind::Interface);
            entity.kind = EntityKind::Interface;
            if doc.is_some() {
                entity.doc = doc.clone();
            }
        }

        DeclEvent::AddConstructor { entity, sig } => {
            let entity = table.entity_entry(entity, EntityKind::Class);
            // Same-arity overload from a later layer replaces the earlier
            // one; other arities accumulate.
            match entity
                .constructors
                .iter()
                .position(|c| c.arity() == sig.arity())
            {
                Some(idx) => entity.constructors[idx] = sig.clone(),
                None => entity.constructors.push(sig.clone()),
            }
        }

        DeclEvent::AddMember { entity, member } => {
            merge_member(table, layer, entity, member);
        }

        DeclEvent::DefineAlias { free_type } => {
            match table.free_type(&free_type.name) {
                None => table.insert_free_type(free_type.clone()),
                Some(existing) if existing.def.structurally_eq(&free_type.def) => {
                    trace!(name = %free_type.name, "identical alias redefinition, no-op");
                }
                Some(existing) => {
                    let clash = AliasClash {
                        name: free_type.name.clone(),
                        first_layer: existing.source_layer.clone(),
                        later_layer: layer.clone(),
                    };
                    debug!(name = %free_type.name, "conflicting alias redefinition");
                    table.record_alias_clash(clash);
                }
            }
        }

        DeclEvent::DefineGlobal { global } => {
            if let Some(existing) = table.global(&global.name) {
                trace!(
                    name = %global.name,
                    from = %existing.source_layer,
                    to = %layer,
                    "replacing global"
                );
            }
            table.upsert_global(global.clone());
        }
    }
}

fn merge_member(table: &mut SymbolTable, layer: &LayerId, entity_name: &str, member: &Member) {
    // AddMember always follows a Define* for the entity in loader output,
    // but a hand-built layer may be sparse.
    table.entity_entry(entity_name, EntityKind::Class);
    let entity = table.entity_mut(entity_name).unwrap();

    match entity.member_position(&member.name) {
        None => entity.members.push(member.clone()),
        Some(idx) => {
            let existing = &entity.members[idx];
            if existing.kind() != member.kind() {
                let clash = KindClash {
                    entity: entity_name.to_string(),
                    member: member.name.clone(),
                    existing_kind: existing.kind(),
                    existing_layer: existing.source_layer.clone(),
                    new_kind: member.kind(),
                    new_layer: layer.clone(),
                };
                debug!(
                    entity = entity_name,
                    member = %member.name,
                    "method/property kind clash"
                );
                table.record_kind_clash(clash);
                return;
            }
            // Last-applied-wins: discard the old definition and move the
            // member to the end, so list order tracks last application.
            entity.members.remove(idx);
            entity.members.push(member.clone());
        }
    }
}
