//! The layer manifest - which layers compose which target version.
//!
//! The documentation fragments carry no precedence of their own, so the
//! manifest is explicit and mandatory: every target version lists its
//! layers in composition order, base first. Nothing is inferred from
//! file naming.
//!
//! ```toml
//! host = "harmony"
//! skip = ["QObject", "QScriptable"]
//!
//! [[version]]
//! id = "22"
//! layers = ["preamble", "classes_22", "harmony_post"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One target version's build recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSpec {
    /// Opaque version identifier (e.g. "22", "24").
    pub id: String,

    /// Layer identifiers in composition order; the first entry is the
    /// base layer.
    pub layers: Vec<String>,
}

/// The full manifest for one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceManifest {
    /// Host name, used in the artifact banner (e.g. "harmony").
    pub host: String,

    /// Entity names dropped at load time: host-internal base machinery
    /// that must not appear in the emitted surface.
    #[serde(default)]
    pub skip: Vec<String>,

    /// Target versions to build.
    #[serde(rename = "version", default)]
    pub versions: Vec<VersionSpec>,
}

impl SurfaceManifest {
    /// Parse a manifest from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        let manifest: SurfaceManifest =
            toml::from_str(text).context("failed to parse surface manifest")?;
        manifest.check()?;
        Ok(manifest)
    }

    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest at {}", path.display()))?;
        Self::parse(&text)
    }

    /// Look up one version's spec.
    pub fn version(&self, id: &str) -> Option<&VersionSpec> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// All layer ids referenced by any version, first-referenced order.
    pub fn referenced_layers(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for version in &self.versions {
            for layer in &version.layers {
                if seen.insert(layer.as_str()) {
                    out.push(layer.as_str());
                }
            }
        }
        out
    }

    /// The skip list as a set.
    pub fn skip_set(&self) -> HashSet<String> {
        self.skip.iter().cloned().collect()
    }

    fn check(&self) -> Result<()> {
        if self.host.is_empty() {
            anyhow::bail!("manifest is missing a host name");
        }
        if self.versions.is_empty() {
            anyhow::bail!("manifest declares no target versions");
        }
        for version in &self.versions {
            if version.layers.is_empty() {
                anyhow::bail!("version `{}` lists no layers", version.id);
            }
        }
        let mut seen = HashSet::new();
        for version in &self.versions {
            if !seen.insert(version.id.as_str()) {
                anyhow::bail!("version `{}` is declared twice", version.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
host = "harmony"
skip = ["QObject"]

[[version]]
id = "22"
layers = ["preamble", "classes_22", "harmony_post"]

[[version]]
id = "24"
layers = ["preamble", "preamble_24up", "classes_24", "harmony_post"]
"#;

    #[test]
    fn test_manifest_parse() {
        let manifest = SurfaceManifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.host, "harmony");
        assert_eq!(manifest.versions.len(), 2);
        assert_eq!(
            manifest.version("24").unwrap().layers,
            vec!["preamble", "preamble_24up", "classes_24", "harmony_post"]
        );
        assert!(manifest.version("99").is_none());
        assert!(manifest.skip_set().contains("QObject"));
    }

    #[test]
    fn test_referenced_layers_deduplicates_in_order() {
        let manifest = SurfaceManifest::parse(MANIFEST).unwrap();
        assert_eq!(
            manifest.referenced_layers(),
            vec![
                "preamble",
                "classes_22",
                "harmony_post",
                "preamble_24up",
                "classes_24"
            ]
        );
    }

    #[test]
    fn test_manifest_rejects_empty_layer_list() {
        let bad = r#"
host = "harmony"

[[version]]
id = "22"
layers = []
"#;
        assert!(SurfaceManifest::parse(bad).is_err());
    }

    #[test]
    fn test_manifest_rejects_duplicate_version() {
        let bad = r#"
host = "harmony"

[[version]]
id = "22"
layers = ["preamble"]

[[version]]
id = "22"
layers = ["preamble"]
"#;
        assert!(SurfaceManifest::parse(bad).is_err());
    }
}
