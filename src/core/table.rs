//! The symbol table - one coherent namespace set per version build.
//!
//! Built fresh for every target version, mutated only by the composer
//! during the composition pass, then handed read-only to the validator
//! and emitter. Classes and interfaces share one namespace; free types
//! and globals each have their own.

use std::collections::HashMap;

use crate::core::entity::{Entity, EntityKind, FreeType, Global, MemberKind};
use crate::core::layer::LayerId;

/// A method/property clash on one entity, recorded by the composer and
/// surfaced by the validator. Irreconcilable: neither definition wins.
#[derive(Debug, Clone)]
pub struct KindClash {
    pub entity: String,
    pub member: String,
    pub existing_kind: MemberKind,
    pub existing_layer: LayerId,
    pub new_kind: MemberKind,
    pub new_layer: LayerId,
}

/// A free type redefined with a structurally different definition.
#[derive(Debug, Clone)]
pub struct AliasClash {
    pub name: String,
    pub first_layer: LayerId,
    pub later_layer: LayerId,
}

/// The composed declaration surface for one target version.
///
/// Iteration order over each namespace is first-declared order, which
/// gives the emitter its stable output order: base-layer entities come
/// first, version-only entities are appended after.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entities: HashMap<String, Entity>,
    entity_order: Vec<String>,
    free_types: HashMap<String, FreeType>,
    free_type_order: Vec<String>,
    globals: HashMap<String, Global>,
    global_order: Vec<String>,
    kind_clashes: Vec<KindClash>,
    alias_clashes: Vec<AliasClash>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Fetch-or-create an entity, preserving first-declared order.
    pub fn entity_entry(&mut self, name: &str, kind: EntityKind) -> &mut Entity {
        if !self.entities.contains_key(name) {
            self.entity_order.push(name.to_string());
            self.entities
                .insert(name.to_string(), Entity::new(name, kind));
        }
        self.entities.get_mut(name).unwrap()
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn contains_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Entities in first-declared order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entity_order
            .iter()
            .map(move |name| &self.entities[name])
    }

    pub fn entity_count(&self) -> usize {
        self.entity_order.len()
    }

    pub fn free_type(&self, name: &str) -> Option<&FreeType> {
        self.free_types.get(name)
    }

    pub fn insert_free_type(&mut self, ft: FreeType) {
        if !self.free_types.contains_key(&ft.name) {
            self.free_type_order.push(ft.name.clone());
        }
        self.free_types.insert(ft.name.clone(), ft);
    }

    /// Free types in first-declared order.
    pub fn free_types(&self) -> impl Iterator<Item = &FreeType> {
        self.free_type_order
            .iter()
            .map(move |name| &self.free_types[name])
    }

    pub fn global(&self, name: &str) -> Option<&Global> {
        self.globals.get(name)
    }

    /// Insert or wholesale-replace a global. Replacement keeps the
    /// binding's first-declared position so emission order is stable
    /// across versions that narrow a placeholder global late.
    pub fn upsert_global(&mut self, global: Global) {
        if !self.globals.contains_key(&global.name) {
            self.global_order.push(global.name.clone());
        }
        self.globals.insert(global.name.clone(), global);
    }

    /// Globals in first-declared order.
    pub fn globals(&self) -> impl Iterator<Item = &Global> {
        self.global_order.iter().map(move |name| &self.globals[name])
    }

    pub fn record_kind_clash(&mut self, clash: KindClash) {
        self.kind_clashes.push(clash);
    }

    pub fn kind_clashes(&self) -> &[KindClash] {
        &self.kind_clashes
    }

    pub fn record_alias_clash(&mut self, clash: AliasClash) {
        self.alias_clashes.push(clash);
    }

    pub fn alias_clashes(&self) -> &[AliasClash] {
        &self.alias_clashes
    }

    pub fn member_count(&self) -> usize {
        self.entities().map(|e| e.members.len()).sum()
    }

    // The composer needs mutable member access; nothing else does.
    pub(crate) fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.get_mut(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::TypeRef;

    #[test]
    fn test_entity_order_is_first_declared() {
        let mut table = SymbolTable::new();
        table.entity_entry("Sound", EntityKind::Class);
        table.entity_entry("Scene", EntityKind::Class);
        // Redeclaration must not move Sound to the back.
        table.entity_entry("Sound", EntityKind::Class);

        let names: Vec<_> = table.entities().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Sound", "Scene"]);
    }

    #[test]
    fn test_global_replacement_keeps_position() {
        let mut table = SymbolTable::new();
        table.upsert_global(Global {
            name: "env".to_string(),
            ty: TypeRef::any(),
            doc: None,
            source_layer: LayerId::new("preamble"),
        });
        table.upsert_global(Global {
            name: "scene".to_string(),
            ty: TypeRef::new("Scene"),
            doc: None,
            source_layer: LayerId::new("preamble"),
        });
        table.upsert_global(Global {
            name: "env".to_string(),
            ty: TypeRef::new("Environment"),
            doc: None,
            source_layer: LayerId::new("post"),
        });

        let names: Vec<_> = table.globals().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["env", "scene"]);
        assert_eq!(table.global("env").unwrap().ty, TypeRef::new("Environment"));
    }
}
