//! Integration tests for the tree-sitter frontends and the extractor,
//! run against the fixtures under `testdata/`.

#![cfg(feature = "tree-sitter")]

use std::path::{Path, PathBuf};

use archlens::extract_file;
use archlens::model::UnitKind;

fn fixture(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(rel)
}

const JAVA_ROOT: &str = "spring/src/main/java/com/example";

// =============================================================================
// Java
// =============================================================================

#[test]
fn test_java_service_extraction() {
    let file = extract_file(&fixture(&format!("{}/service/UserService.java", JAVA_ROOT)))
        .expect("should extract UserService.java");

    assert_eq!(file.package_name, "com.example.service");
    assert_eq!(file.imports.len(), 1);
    assert_eq!(file.imports[0].source, "com.example.api.UserRepository");
    assert_eq!(file.imports[0].import_name, "UserRepository");

    assert_eq!(file.units.len(), 1, "no default unit for a class-only file");
    let unit = &file.units[0];
    assert_eq!(unit.kind, UnitKind::Class);
    assert_eq!(unit.name, "UserService");
    assert!(unit.has_annotation("Component"));
    assert_eq!(unit.implements_refs, vec!["IUserService", "AutoCloseable"]);

    assert_eq!(unit.fields.len(), 1);
    assert_eq!(unit.fields[0].type_value, "repository");
    assert_eq!(unit.fields[0].type_type, "UserRepository");

    let names: Vec<_> = unit.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["constructor", "greet", "close"]);

    let greet = &unit.functions[1];
    assert_eq!(greet.return_types[0].type_type, "String");
    assert_eq!(greet.method_calls.len(), 1);
    assert_eq!(greet.method_calls[0].target(), "repository.findById");
}

#[test]
fn test_java_interface_extraction() {
    let file = extract_file(&fixture(&format!("{}/api/UserRepository.java", JAVA_ROOT)))
        .expect("should extract UserRepository.java");

    let unit = &file.units[0];
    assert_eq!(unit.kind, UnitKind::Interface);
    assert_eq!(unit.functions.len(), 1);
    assert_eq!(unit.functions[0].name, "findById");
    assert_eq!(unit.functions[0].parameters[0].type_name, "id");
    assert_eq!(unit.functions[0].parameters[0].type_type, "String");
}

#[test]
fn test_java_wildcard_import() {
    let file = extract_file(&fixture(&format!(
        "{}/repo/JdbcUserRepository.java",
        JAVA_ROOT
    )))
    .expect("should extract JdbcUserRepository.java");

    let wildcard = file
        .imports
        .iter()
        .find(|i| i.source == "java.util")
        .expect("wildcard import recorded");
    assert!(wildcard.import_name.is_empty());
    assert!(file.units[0].has_annotation("Repository"));
}

// =============================================================================
// TypeScript
// =============================================================================

#[test]
fn test_typescript_service_extraction() {
    let file = extract_file(&fixture("web/src/user.service.ts"))
        .expect("should extract user.service.ts");

    assert!(file.package_name.is_empty());
    let sources: Vec<_> = file.imports.iter().map(|i| i.source.as_str()).collect();
    assert_eq!(sources, vec!["@angular/core", "@angular/common/http"]);

    let names: Vec<_> = file.units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["IUserService", "UserService"]);

    let service = file.find_unit("UserService").unwrap();
    assert!(service.has_annotation("Injectable"));
    assert_eq!(service.implements_refs, vec!["IUserService"]);
    let constructor = &service.functions[0];
    assert_eq!(constructor.name, "constructor");
    assert_eq!(constructor.parameters[0].type_type, "HttpClient");
}

#[test]
fn test_typescript_script_file() {
    let file = extract_file(&fixture("web/src/main.ts")).expect("should extract main.ts");

    assert_eq!(file.imports.len(), 2);
    assert_eq!(file.imports[0].source, "./config");
    assert!(file.imports[0].import_name.is_empty());

    assert_eq!(file.units.len(), 1);
    let unit = &file.units[0];
    assert!(unit.is_default());
    assert_eq!(unit.functions.len(), 1);
    assert_eq!(unit.functions[0].name, "default");
    let targets: Vec<_> = unit.functions[0]
        .method_calls
        .iter()
        .map(|c| c.target())
        .collect();
    assert_eq!(targets, vec!["console.log", "service.greet"]);
}

#[test]
fn test_unsupported_extension() {
    assert!(extract_file(&fixture("class_graph.json")).is_err());
}
