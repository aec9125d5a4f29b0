//! Archlens - class-level architecture analysis for Java and TypeScript.
//!
//! Source files are parsed with tree-sitter, walked into a stream of
//! productions and folded into a per-file code model. From there the crate
//! derives cached identity records, interface to implementation bindings
//! for annotation-driven DI, and a class reference graph.
//!
//! # Architecture
//!
//! - `frontend`: tree-sitter walkers that emit productions (Java, TypeScript)
//! - `extract`: the listener that turns productions into a `CodeFile`
//! - `model`: code model and persisted `Identifier` records
//! - `identify`: parallel project walk producing identifiers
//! - `cache`: compute-or-load identifier cache
//! - `di`: interface to implementation bindings
//! - `graph`: class graph, unused classes, coupling and cycles
//! - `config`: YAML project configuration
//!
//! Parsing is behind the default `tree-sitter` feature; everything
//! downstream of the code model builds without it.

pub mod cache;
pub mod config;
pub mod di;
pub mod extract;
#[cfg(feature = "tree-sitter")]
pub mod frontend;
pub mod graph;
#[cfg(feature = "tree-sitter")]
pub mod identify;
pub mod model;

pub use cache::{BlobStore, CacheError, FsBlobStore, IdentifierCache, MemoryBlobStore};
pub use config::{Config, ConfigError, EntryPointConfig};
pub use di::{build_di_map, build_di_map_with, build_identifier_map};
pub use extract::{IdentListener, Production};
#[cfg(feature = "tree-sitter")]
pub use frontend::{extract_file, get_frontend, Frontend};
pub use graph::{
    build_reference_graph, coupling, find_cycles, find_unused, load_class_nodes, ClassNode,
    UnusedClassDetector,
};
#[cfg(feature = "tree-sitter")]
pub use identify::IdentifierApp;
pub use model::{CodeFile, Identifier, TypeUnit};
