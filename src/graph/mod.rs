//! Class-level reference graph and analyses over it.
//!
//! The graph is a flat list of [`ClassNode`]s whose edges are identity
//! strings. It is either loaded from a persisted JSON file
//! ([`load_class_nodes`]) or derived from extracted files
//! ([`build_reference_graph`]).

mod build;
mod metrics;
mod unused;

pub use build::build_reference_graph;
pub use metrics::{coupling, find_cycles, Coupling};
pub use unused::{find_unused, EntryPoints, UnusedClassDetector};

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::model::{identity, Annotation};

/// A class with its outgoing and incoming references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNode {
    #[serde(default)]
    pub package: String,
    pub class_name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Identities this class references.
    #[serde(default)]
    pub outgoing: Vec<String>,
    /// Identities referencing this class.
    #[serde(default)]
    pub incoming: Vec<String>,
}

impl ClassNode {
    pub fn new(package: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    pub fn identity(&self) -> String {
        identity(&self.package, &self.class_name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.qualified_name == name)
    }

    /// Outgoing edges other than self references.
    pub fn external_outgoing(&self) -> impl Iterator<Item = &String> {
        let own = self.identity();
        self.outgoing.iter().filter(move |target| **target != own)
    }

    /// Incoming edges other than self references.
    pub fn external_incoming(&self) -> impl Iterator<Item = &String> {
        let own = self.identity();
        self.incoming.iter().filter(move |source| **source != own)
    }
}

/// Read a persisted class graph (a JSON array of nodes).
pub fn load_class_nodes<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<ClassNode>> {
    let path = path.as_ref();
    let content = fs::read(path)
        .with_context(|| format!("failed to read class graph {}", path.display()))?;
    let nodes: Vec<ClassNode> = serde_json::from_slice(&content)
        .with_context(|| format!("invalid class graph {}", path.display()))?;
    tracing::debug!(file = %path.display(), nodes = nodes.len(), "loaded class graph");
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_class_nodes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("graph.json");
        fs::write(
            &path,
            r#"[
                {"package": "app", "class_name": "A", "outgoing": ["app.B"]},
                {"package": "app", "class_name": "B", "incoming": ["app.A"],
                 "annotations": [{"qualified_name": "Component"}]}
            ]"#,
        )
        .unwrap();

        let nodes = load_class_nodes(&path).unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].identity(), "app.A");
        assert_eq!(nodes[0].outgoing, vec!["app.B"]);
        assert!(nodes[1].has_annotation("Component"));
        assert!(nodes[1].outgoing.is_empty());
    }

    #[test]
    fn test_load_class_nodes_errors() {
        let temp = TempDir::new().unwrap();
        assert!(load_class_nodes(temp.path().join("missing.json")).is_err());

        let path = temp.path().join("bad.json");
        fs::write(&path, "{").unwrap();
        assert!(load_class_nodes(&path).is_err());
    }

    #[test]
    fn test_self_edges_filtered() {
        let mut node = ClassNode::new("app", "A");
        node.outgoing = vec!["app.A".to_string(), "app.B".to_string()];
        node.incoming = vec!["app.A".to_string()];

        assert_eq!(node.external_outgoing().collect::<Vec<_>>(), vec!["app.B"]);
        assert_eq!(node.external_incoming().count(), 0);
    }
}
