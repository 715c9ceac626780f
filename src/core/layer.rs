//! Layers and declaration events.
//!
//! A layer is one named, ordered batch of declaration events contributed
//! toward one or more target versions. Layers carry no precedence of
//! their own; the manifest orders them per version build, base first.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::entity::{FreeType, Global, Member, MethodSig};

/// Identifies a layer (e.g. `preamble`, `harmony_post`, `preamble_24up`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        LayerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One declaration event, produced by the fragment loader in file order.
///
/// The loader emits a Define* event before any AddMember/AddConstructor
/// for the same entity within a fragment; the composer still tolerates
/// out-of-order events by creating entities on demand.
#[derive(Debug, Clone)]
pub enum DeclEvent {
    DefineClass {
        name: String,
        base: Option<String>,
        doc: Option<String>,
    },
    DefineInterface {
        name: String,
        doc: Option<String>,
    },
    AddConstructor {
        entity: String,
        sig: MethodSig,
    },
    AddMember {
        entity: String,
        member: Member,
    },
    DefineAlias {
        free_type: FreeType,
    },
    DefineGlobal {
        global: Global,
    },
}

/// A loaded layer: its identity plus its events in file order.
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub events: Vec<DeclEvent>,
}

impl Layer {
    pub fn new(id: LayerId) -> Self {
        Layer {
            id,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event: DeclEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
