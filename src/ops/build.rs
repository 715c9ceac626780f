//! Multi-version builds.
//!
//! Building N target versions is embarrassingly parallel: each version
//! composes its own private symbol table over the shared read-only
//! fragment texts, so the runs go through rayon with no locking. One
//! version failing validation never fails the others.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::info;

use crate::core::manifest::SurfaceManifest;
use crate::ops::compose::{compose_version, ComposeError, ComposedSurface};

/// Options for a multi-version build.
#[derive(Debug, Default)]
pub struct BuildOptions {
    /// Versions to build; empty means every version in the manifest.
    pub versions: Vec<String>,
}

/// Outcome of a multi-version build; per-version results in manifest
/// order.
#[derive(Debug)]
pub struct BuildReport {
    pub surfaces: Vec<ComposedSurface>,
    pub failures: Vec<(String, ComposeError)>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build every selected version of the manifest over the given fragment
/// texts (layer id -> raw JSON).
pub fn build_all(
    manifest: &SurfaceManifest,
    fragments: &HashMap<String, String>,
    options: &BuildOptions,
) -> BuildReport {
    let skip = manifest.skip_set();
    let selected: Vec<_> = manifest
        .versions
        .iter()
        .filter(|v| options.versions.is_empty() || options.versions.iter().any(|id| *id == v.id))
        .collect();

    info!(
        host = %manifest.host,
        versions = selected.len(),
        "building declaration surfaces"
    );

    let results: Vec<_> = selected
        .par_iter()
        .map(|version| {
            compose_version(&manifest.host, &version.id, &version.layers, fragments, &skip)
        })
        .collect();

    let mut report = BuildReport {
        surfaces: Vec::new(),
        failures: Vec::new(),
    };
    for (version, result) in selected.iter().zip(results) {
        match result {
            Ok(surface) => report.surfaces.push(surface),
            Err(err) => report.failures.push((version.id.clone(), err)),
        }
    }
    report
}
