//! Persisted identity records.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Annotation, CodeFile, TypeUnit};

/// Canonical `package.className` key.
pub fn identity(package: &str, class_name: &str) -> String {
    format!("{}.{}", package, class_name)
}

/// Function-body-free view of a class or interface, used by the cache and
/// the DI resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default)]
    pub package: String,
    pub class_name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Identity strings of implemented interfaces, in declaration order.
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub extend: Option<String>,
}

impl Identifier {
    pub fn identity(&self) -> String {
        identity(&self.package, &self.class_name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.qualified_name == name)
    }

    /// Build the identifier for `unit`, resolving its type references
    /// against the imports and package of `file`.
    pub fn from_unit(file: &CodeFile, unit: &TypeUnit) -> Self {
        Self::resolved(file, unit, |r| resolve_type_ref(file, r))
    }

    /// Like [`Identifier::from_unit`], but names brought in by wildcard
    /// imports resolve to the project identities in `known`.
    pub fn from_unit_in(file: &CodeFile, unit: &TypeUnit, known: &HashSet<String>) -> Self {
        Self::resolved(file, unit, |r| resolve_type_ref_in(file, r, known))
    }

    fn resolved(file: &CodeFile, unit: &TypeUnit, resolve: impl Fn(&str) -> String) -> Self {
        Self {
            package: file.package_name.clone(),
            class_name: unit.name.clone(),
            annotations: unit.annotations.clone(),
            implements: unit.implements_refs.iter().map(|r| resolve(r.as_str())).collect(),
            extend: unit.extends_ref.as_deref().map(&resolve),
        }
    }

    /// One identifier per declared class or interface in `file`.
    pub fn from_file(file: &CodeFile) -> Vec<Self> {
        file.declared_units()
            .map(|unit| Self::from_unit(file, unit))
            .collect()
    }

    /// One identifier per declared unit, resolved against `known`.
    pub fn from_file_in(file: &CodeFile, known: &HashSet<String>) -> Vec<Self> {
        file.declared_units()
            .map(|unit| Self::from_unit_in(file, unit, known))
            .collect()
    }
}

/// Identities of every class and interface declared in `files`.
pub fn known_identities(files: &[CodeFile]) -> HashSet<String> {
    files
        .iter()
        .flat_map(|file| {
            file.declared_units()
                .map(move |unit| identity(&file.package_name, &unit.name))
        })
        .collect()
}

/// Best-effort resolution of a type reference to an identity string.
///
/// Generic arguments are dropped. Dotted names are taken as already
/// qualified. A simple name resolves through an import whose last path
/// segment matches, otherwise through the file's own package.
pub fn resolve_type_ref(file: &CodeFile, type_ref: &str) -> String {
    resolve_with(file, type_ref, |_| false)
}

/// [`resolve_type_ref`] with knowledge of the project's declared
/// identities.
///
/// A simple name that is neither imported explicitly nor declared in the
/// file's own package resolves through the first wildcard import
/// (`import pkg.*`) under which it is a known identity.
pub fn resolve_type_ref_in(file: &CodeFile, type_ref: &str, known: &HashSet<String>) -> String {
    resolve_with(file, type_ref, |id| known.contains(id))
}

fn resolve_with(file: &CodeFile, type_ref: &str, is_known: impl Fn(&str) -> bool) -> String {
    let base = type_ref
        .split('<')
        .next()
        .unwrap_or(type_ref)
        .trim();

    if base.contains('.') {
        return base.to_string();
    }

    let imported = file.imports.iter().find(|import| {
        !import.import_name.is_empty()
            && import.source.contains('.')
            && import.source.rsplit('.').next() == Some(base)
    });
    if let Some(import) = imported {
        return import.source.clone();
    }

    let local = identity(&file.package_name, base);
    if is_known(&local) {
        return local;
    }

    file.imports
        .iter()
        .filter(|import| import.import_name.is_empty() && import.source.contains('.'))
        .map(|import| identity(&import.source, base))
        .find(|candidate| is_known(candidate))
        .unwrap_or(local)
}
