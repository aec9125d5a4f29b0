//! Unused-class detection.
//!
//! A class is unused when nothing references it and it is not an entry
//! point. The check is one level deep: a class referenced only by an unused
//! class still counts as referenced.
//!
//! With the default rules every root is an entry point. A root is a class
//! that references other classes but is referenced by none, so a dead class
//! that still calls into live code is not reported. Use
//! [`EntryPoints::none`] or set `roots_are_entry_points: false` to report
//! such classes.

use std::collections::HashSet;

use globset::GlobSet;

use super::ClassNode;
use crate::config::{ConfigError, EntryPointConfig};

/// Compiled entry-point rules.
///
/// The defaults come from [`EntryPointConfig::default`]: application and
/// test class names, Spring entry annotations, and every root.
#[derive(Debug, Clone)]
pub struct EntryPoints {
    names: GlobSet,
    annotations: HashSet<String>,
    roots: bool,
}

impl EntryPoints {
    pub fn from_config(config: &EntryPointConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            names: config.name_matcher()?,
            annotations: config.annotations.iter().cloned().collect(),
            roots: config.roots_are_entry_points,
        })
    }

    /// No class is an entry point.
    pub fn none() -> Self {
        Self {
            names: GlobSet::empty(),
            annotations: HashSet::new(),
            roots: false,
        }
    }

    /// Entry point by name or annotation, ignoring graph shape.
    pub fn is_declared_entry(&self, node: &ClassNode) -> bool {
        self.names.is_match(&node.class_name)
            || node
                .annotations
                .iter()
                .any(|a| self.annotations.contains(&a.qualified_name))
    }
}

impl Default for EntryPoints {
    fn default() -> Self {
        Self::from_config(&EntryPointConfig::default()).unwrap_or_else(|_| Self::none())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UnusedClassDetector {
    entry_points: EntryPoints,
}

impl UnusedClassDetector {
    pub fn new(entry_points: EntryPoints) -> Self {
        Self { entry_points }
    }

    /// Identities of unused classes, in node order, without duplicates.
    ///
    /// Unreferenced classes with outgoing edges are roots and are skipped
    /// when the entry-point rules treat roots as entry points.
    pub fn find_unused(&self, nodes: &[ClassNode]) -> Vec<String> {
        let mut referenced: HashSet<String> = HashSet::new();
        for node in nodes {
            referenced.extend(node.external_outgoing().cloned());
            if node.external_incoming().next().is_some() {
                referenced.insert(node.identity());
            }
        }

        let mut seen = HashSet::new();
        let mut unused = Vec::new();
        for node in nodes {
            let id = node.identity();
            if referenced.contains(&id) || !seen.insert(id.clone()) {
                continue;
            }
            if self.entry_points.is_declared_entry(node) {
                continue;
            }
            // Unreferenced with outgoing edges: a call-graph root
            if self.entry_points.roots && node.external_outgoing().next().is_some() {
                continue;
            }
            unused.push(id);
        }

        unused
    }
}

/// [`UnusedClassDetector::find_unused`] with the default entry-point rules.
///
/// Roots are exempt: an unreferenced class that references another class is
/// never reported here. Only unreferenced classes without outgoing edges
/// (or with self-edges only) that match no name or annotation rule come
/// back.
pub fn find_unused(nodes: &[ClassNode]) -> Vec<String> {
    UnusedClassDetector::default().find_unused(nodes)
}
