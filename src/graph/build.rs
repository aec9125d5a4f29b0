//! Derive a class graph from extracted files.

use std::collections::{HashMap, HashSet};

use super::ClassNode;
use crate::model::{known_identities, resolve_type_ref_in, CodeFile, TypeUnit};

/// Build one node per declared class or interface, in file and unit order.
///
/// A unit references every project class named in its heritage clauses,
/// field, parameter and return types, constructor calls and static-call
/// receivers. Names are resolved through the declaring file's imports,
/// wildcard imports included.
/// References that do not resolve to a project class are dropped.
pub fn build_reference_graph(files: &[CodeFile]) -> Vec<ClassNode> {
    let known = known_identities(files);

    let mut nodes: Vec<ClassNode> = Vec::new();
    for file in files {
        for unit in file.declared_units() {
            let mut node = ClassNode::new(file.package_name.clone(), unit.name.clone());
            node.annotations = unit.annotations.clone();

            let own = node.identity();
            let mut seen = HashSet::new();
            for name in referenced_names(unit) {
                let target = resolve_type_ref_in(file, &name, &known);
                if target != own && known.contains(&target) && seen.insert(target.clone()) {
                    node.outgoing.push(target);
                }
            }
            nodes.push(node);
        }
    }

    let mut by_identity: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        by_identity.entry(node.identity()).or_default().push(i);
    }

    let edges: Vec<(String, String)> = nodes
        .iter()
        .flat_map(|node| {
            let source = node.identity();
            node.outgoing
                .iter()
                .map(move |target| (source.clone(), target.clone()))
        })
        .collect();

    for (source, target) in edges {
        for &i in by_identity.get(&target).into_iter().flatten() {
            if !nodes[i].incoming.contains(&source) {
                nodes[i].incoming.push(source.clone());
            }
        }
    }

    nodes
}

/// Candidate type names mentioned by `unit`, in declaration order.
fn referenced_names(unit: &TypeUnit) -> Vec<String> {
    let mut names = Vec::new();

    if let Some(extends) = &unit.extends_ref {
        names.extend(type_names(extends));
    }
    for implemented in &unit.implements_refs {
        names.extend(type_names(implemented));
    }
    for field in &unit.fields {
        names.extend(type_names(&field.type_type));
    }
    for function in &unit.functions {
        for slot in function.parameters.iter().chain(&function.return_types) {
            names.extend(type_names(&slot.type_type));
        }
        for call in &function.method_calls {
            match &call.receiver {
                Some(receiver) => names.extend(type_names(receiver)),
                None => names.extend(type_names(&call.function_name)),
            }
        }
    }
    for call in &unit.function_calls {
        if let Some(receiver) = &call.receiver {
            names.extend(type_names(receiver));
        }
    }

    names
}

/// Split type text such as `Map<String, List<User>>` into `Map`, `String`,
/// `List`, `User`. Lowercase names (primitives, variables) are skipped.
fn type_names(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$' || c == '.'))
        .map(|token| token.trim_matches('.'))
        .filter(|token| {
            let simple = token.rsplit('.').next().unwrap_or(token);
            simple.chars().next().is_some_and(|c| c.is_uppercase())
        })
        .map(str::to_string)
}
