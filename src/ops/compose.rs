//! The per-version pipeline: load -> compose -> validate -> emit.
//!
//! One call builds one target version from raw fragment texts. The
//! emitter never runs against an invalid table; a non-empty diagnostic
//! list fails the build for this version only.

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::composer::compose;
use crate::core::layer::LayerId;
use crate::emitter::emit;
use crate::loader::{load_fragment, MalformedFragment};
use crate::validator::{validate, ValidationIssue};

/// Why one version's build failed. Other versions are unaffected.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Malformed(#[from] MalformedFragment),

    #[error("version `{version}`: layer `{layer}` has no fragment")]
    MissingLayer { version: String, layer: String },

    #[error("version `{version}`: surface is invalid ({} issue(s))", issues.len())]
    Invalid {
        version: String,
        issues: Vec<ValidationIssue>,
    },
}

/// A successfully composed surface for one version.
#[derive(Debug, Clone)]
pub struct ComposedSurface {
    pub version: String,
    /// The serialized declaration artifact.
    pub artifact: String,
    /// SHA-256 of the artifact, hex-encoded. Byte-identical artifacts
    /// across rebuilds hash identically; downstream tooling uses this to
    /// confirm reproducibility.
    pub checksum: String,
    pub entities: usize,
    pub members: usize,
    pub free_types: usize,
    pub globals: usize,
}

/// Build one target version.
///
/// `fragments` maps layer id to raw fragment text; `layers` is the
/// version's composition order from the manifest, base first.
pub fn compose_version(
    host: &str,
    version: &str,
    layers: &[String],
    fragments: &HashMap<String, String>,
    skip: &HashSet<String>,
) -> Result<ComposedSurface, ComposeError> {
    let mut loaded = Vec::with_capacity(layers.len());
    for layer_name in layers {
        let text = fragments
            .get(layer_name)
            .ok_or_else(|| ComposeError::MissingLayer {
                version: version.to_string(),
                layer: layer_name.clone(),
            })?;
        loaded.push(load_fragment(&LayerId::new(layer_name.clone()), text, skip)?);
    }

    let table = compose(&loaded);
    debug!(
        version,
        entities = table.entity_count(),
        members = table.member_count(),
        "composed symbol table"
    );

    let issues = validate(&table);
    if !issues.is_empty() {
        return Err(ComposeError::Invalid {
            version: version.to_string(),
            issues,
        });
    }

    let artifact = emit(&table, host, version);
    let checksum = hex::encode(Sha256::digest(artifact.as_bytes()));
    info!(version, checksum = %&checksum[..12], "emitted surface");

    Ok(ComposedSurface {
        version: version.to_string(),
        entities: table.entity_count(),
        members: table.member_count(),
        free_types: table.free_types().count(),
        globals: table.globals().count(),
        artifact,
        checksum,
    })
}
