//! Interface to implementation bindings for annotation-driven DI.
//!
//! A class annotated with a stereotype (`@Component`, `@Repository`) is bound
//! as the implementation of the first interface it implements. When several
//! classes implement the same interface the last one in input order wins.

use std::collections::HashMap;

use tracing::debug;

use crate::model::Identifier;

/// Stereotype annotations recognized by [`build_di_map`].
pub const DEFAULT_STEREOTYPES: &[&str] = &["Component", "Repository"];

/// Index identifiers by identity. Later duplicates replace earlier ones.
pub fn build_identifier_map(identifiers: &[Identifier]) -> HashMap<String, Identifier> {
    identifiers
        .iter()
        .map(|identifier| (identifier.identity(), identifier.clone()))
        .collect()
}

/// Map interface identity to implementation identity using the default
/// stereotypes.
pub fn build_di_map(
    identifiers: &[Identifier],
    identifier_map: &HashMap<String, Identifier>,
) -> HashMap<String, String> {
    build_di_map_with(identifiers, identifier_map, DEFAULT_STEREOTYPES)
}

/// Like [`build_di_map`] with a caller-supplied stereotype list.
///
/// Only the first implemented interface is considered. If it does not
/// resolve in `identifier_map` the class contributes no binding.
pub fn build_di_map_with<S: AsRef<str>>(
    identifiers: &[Identifier],
    identifier_map: &HashMap<String, Identifier>,
    stereotypes: &[S],
) -> HashMap<String, String> {
    let mut di_map = HashMap::new();

    for class in identifiers {
        let is_stereotyped = stereotypes
            .iter()
            .any(|stereotype| class.has_annotation(stereotype.as_ref()));
        if !is_stereotyped {
            continue;
        }

        let Some(first) = class.implements.first() else {
            continue;
        };

        match identifier_map.get(first) {
            Some(interface) => {
                di_map.insert(interface.identity(), class.identity());
            }
            None => {
                debug!(
                    class = %class.identity(),
                    interface = %first,
                    "implemented interface not in project, skipping binding"
                );
            }
        }
    }

    di_map
}
