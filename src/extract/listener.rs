//! Production-driven builder for one [`CodeFile`].

use tracing::{debug, warn};

use crate::model::{
    Annotation, CodeField, CodeFile, CodeFunction, CodeImport, CodeProperty, TypeUnit, UnitKind,
    ANY_TYPE,
};

use super::production::{
    CallSignature, ClassDecl, ClassMember, FunctionDecl, InterfaceDecl, InterfaceMember,
    Production, PropertyMember,
};

/// Name recorded for constructors regardless of source syntax.
pub const CONSTRUCTOR_NAME: &str = "constructor";

/// Strip every single and double quote from an import path literal.
pub fn normalize_import_source(text: &str) -> String {
    text.replace(['"', '\''], "")
}

/// Builds a [`CodeFile`] from the productions of a single file.
///
/// `current` is the unit receiving members; `unit_stack` holds the units
/// enclosing it. One listener per file, so parallel extraction of separate
/// files shares nothing.
pub struct IdentListener {
    code_file: CodeFile,
    current: Option<TypeUnit>,
    unit_stack: Vec<TypeUnit>,
    finished_units: Vec<TypeUnit>,
    max_stack_depth: usize,
}

impl IdentListener {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            code_file: CodeFile::new(path),
            current: None,
            unit_stack: Vec::new(),
            finished_units: Vec::new(),
            max_stack_depth: 0,
        }
    }

    /// Feed every production to a fresh listener and finish it.
    pub fn run<I>(path: impl Into<String>, productions: I) -> CodeFile
    where
        I: IntoIterator<Item = Production>,
    {
        let mut listener = Self::new(path);
        for production in productions {
            listener.handle(production);
        }
        listener.finish()
    }

    /// Deepest the enclosing-unit stack has been so far.
    pub fn max_stack_depth(&self) -> usize {
        self.max_stack_depth
    }

    pub fn handle(&mut self, production: Production) {
        match production {
            Production::Package(name) => self.code_file.package_name = name,
            Production::ImportFrom { source, binding }
            | Production::ImportAlias { source, binding } => self.add_import(&source, binding),
            Production::ImportAll { source } => self.add_import(&source, String::new()),
            Production::EnterInterface(decl) => self.enter_interface(decl),
            Production::EnterClass(decl) => self.enter_class(decl),
            Production::ExitInterface | Production::ExitClass => self.exit_unit(),
            Production::Function(decl) => {
                let function = build_function(decl.name.clone(), decl);
                self.current_unit().functions.push(function);
            }
            Production::Call(call) => self.current_unit().function_calls.push(call),
            Production::Other => {}
        }
    }

    /// Close whatever is still open and return the file.
    ///
    /// A file-scope container is kept only if it has content; when it has
    /// top-level calls but no function, the calls are wrapped into a
    /// `default` function first.
    pub fn finish(mut self) -> CodeFile {
        let mut pending: Vec<TypeUnit> = self.current.take().into_iter().collect();
        pending.extend(self.unit_stack.drain(..).rev());

        for mut unit in pending {
            if unit.is_default() {
                if !unit.has_content() {
                    continue;
                }
                unit.synthesize_default_function();
            } else {
                warn!(
                    file = %self.code_file.path,
                    unit = %unit.name,
                    "declaration still open at end of file"
                );
            }
            self.finished_units.push(unit);
        }

        self.code_file.units = self.finished_units;
        self.code_file
    }

    fn add_import(&mut self, raw_source: &str, binding: String) {
        self.code_file.imports.push(CodeImport {
            source: normalize_import_source(raw_source),
            import_name: binding,
        });
    }

    /// The unit receiving file-scope members, created lazily.
    fn current_unit(&mut self) -> &mut TypeUnit {
        self.current.get_or_insert_with(TypeUnit::default_container)
    }

    fn enter_interface(&mut self, decl: InterfaceDecl) {
        let mut unit = TypeUnit::new(UnitKind::Interface, decl.name);
        unit.extends_ref = decl.extends.into_iter().next();
        unit.annotations = decl.annotations.into_iter().map(Annotation::new).collect();

        for member in decl.members {
            match member {
                InterfaceMember::PropertySignature {
                    name,
                    type_annotation,
                    callable_result: Some(result),
                } => {
                    let mut function = CodeFunction::named(name);
                    function.parameters.push(CodeProperty {
                        type_name: ANY_TYPE.to_string(),
                        type_type: type_annotation.unwrap_or_default(),
                    });
                    function.set_return_type(result);
                    unit.functions.push(function);
                }
                InterfaceMember::PropertySignature {
                    name,
                    type_annotation,
                    callable_result: None,
                } => unit.fields.push(CodeField {
                    type_value: name,
                    type_type: type_annotation.unwrap_or_default(),
                    modifiers: Vec::new(),
                }),
                InterfaceMember::MethodSignature { name, signature } => {
                    let mut function = CodeFunction::named(name);
                    fill_signature(&mut function, signature);
                    unit.functions.push(function);
                }
            }
        }

        self.push_unit(unit);
    }

    fn enter_class(&mut self, decl: ClassDecl) {
        let mut unit = TypeUnit::new(UnitKind::Class, decl.name);
        unit.extends_ref = decl.extends;
        unit.implements_refs = decl.implements;
        unit.annotations = decl.annotations.into_iter().map(Annotation::new).collect();

        for member in decl.members {
            match member {
                ClassMember::Constructor(ctor) => unit
                    .functions
                    .push(build_function(CONSTRUCTOR_NAME.to_string(), ctor)),
                ClassMember::Property(property) => add_property_member(&mut unit, property),
            }
        }

        self.push_unit(unit);
    }

    fn push_unit(&mut self, unit: TypeUnit) {
        if let Some(previous) = self.current.take() {
            // An empty file-scope container has nothing to resume.
            if !previous.is_default() || previous.has_content() {
                self.unit_stack.push(previous);
                self.max_stack_depth = self.max_stack_depth.max(self.unit_stack.len());
            }
        }
        debug!(file = %self.code_file.path, unit = %unit.name, kind = %unit.kind, "enter unit");
        self.current = Some(unit);
    }

    fn exit_unit(&mut self) {
        match self.current.take() {
            Some(unit) if !unit.is_default() => {
                self.finished_units.push(unit);
                self.current = Some(
                    self.unit_stack
                        .pop()
                        .unwrap_or_else(TypeUnit::default_container),
                );
            }
            other => {
                warn!(
                    file = %self.code_file.path,
                    "declaration exit without matching enter; continuing"
                );
                self.current = Some(other.unwrap_or_else(TypeUnit::default_container));
            }
        }
    }
}

fn build_function(name: String, decl: FunctionDecl) -> CodeFunction {
    let mut function = CodeFunction::named(name);
    fill_signature(&mut function, decl.signature);
    function.method_calls = decl.calls;
    function.position = decl.position;
    function
}

fn fill_signature(function: &mut CodeFunction, signature: CallSignature) {
    function
        .parameters
        .extend(signature.parameters.into_iter().map(|p| CodeProperty {
            type_name: p.name,
            type_type: p.type_annotation.unwrap_or_else(|| ANY_TYPE.to_string()),
        }));

    if let Some(return_type) = signature.return_type {
        function.set_return_type(return_type);
    }
}

fn add_property_member(unit: &mut TypeUnit, property: PropertyMember) {
    match property.signature {
        Some(signature) => {
            let mut function = CodeFunction::named(property.name);
            fill_signature(&mut function, signature);
            function.method_calls = property.calls;
            function.position = property.position;
            unit.functions.push(function);
        }
        None => unit.fields.push(CodeField {
            type_value: property.name,
            type_type: property.type_annotation.unwrap_or_default(),
            modifiers: property.modifiers,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::production::Parameter;
    use crate::model::CodeCall;

    fn class(name: &str) -> Production {
        Production::EnterClass(ClassDecl {
            name: name.to_string(),
            ..Default::default()
        })
    }

    fn call(name: &str) -> Production {
        Production::Call(CodeCall::new(None, name))
    }

    #[test]
    fn test_import_normalization() {
        let file = IdentListener::run(
            "a.ts",
            vec![
                Production::ImportFrom {
                    source: "'./foo'".to_string(),
                    binding: "{ Foo }".to_string(),
                },
                Production::ImportAlias {
                    source: "\"./foo\"".to_string(),
                    binding: "foo".to_string(),
                },
                Production::ImportAll {
                    source: "'./foo'".to_string(),
                },
            ],
        );

        assert_eq!(file.imports.len(), 3);
        assert!(file.imports.iter().all(|i| i.source == "./foo"));
        assert_eq!(file.imports[0].import_name, "{ Foo }");
        assert_eq!(file.imports[2].import_name, "");
    }

    #[test]
    fn test_top_level_calls_get_default_function() {
        let file = IdentListener::run("script.ts", vec![call("setup"), call("run")]);

        assert_eq!(file.units.len(), 1);
        let unit = &file.units[0];
        assert_eq!(unit.kind, UnitKind::Default);
        assert_eq!(unit.functions.len(), 1);
        assert_eq!(unit.functions[0].name, "default");
        let names: Vec<_> = unit.functions[0]
            .method_calls
            .iter()
            .map(|c| c.function_name.as_str())
            .collect();
        assert_eq!(names, vec!["setup", "run"]);
    }

    #[test]
    fn test_empty_file_has_no_units() {
        let file = IdentListener::run("empty.ts", Vec::new());
        assert!(file.units.is_empty());
    }

    #[test]
    fn test_nested_classes_resume_enclosing_scope() {
        let mut listener = IdentListener::new("nested.ts");
        listener.handle(class("Outer"));
        listener.handle(class("Middle"));
        listener.handle(class("Inner"));
        listener.handle(Production::ExitClass);
        listener.handle(Production::Function(FunctionDecl {
            name: "afterInner".to_string(),
            ..Default::default()
        }));
        listener.handle(Production::ExitClass);
        listener.handle(Production::ExitClass);
        assert_eq!(listener.max_stack_depth(), 2);

        let file = listener.finish();
        let names: Vec<_> = file.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Inner", "Middle", "Outer"]);

        let middle = file.find_unit("Middle").unwrap();
        assert_eq!(middle.functions.len(), 1);
        assert_eq!(middle.functions[0].name, "afterInner");
    }

    #[test]
    fn test_file_scope_content_survives_class() {
        let file = IdentListener::run(
            "mixed.ts",
            vec![
                Production::Function(FunctionDecl {
                    name: "helper".to_string(),
                    ..Default::default()
                }),
                class("Service"),
                Production::ExitClass,
                call("helper"),
            ],
        );

        assert_eq!(file.units.len(), 2);
        assert_eq!(file.units[0].name, "Service");
        let default_unit = &file.units[1];
        assert!(default_unit.is_default());
        assert_eq!(default_unit.functions.len(), 1);
        assert_eq!(default_unit.functions[0].name, "helper");
        assert_eq!(default_unit.function_calls.len(), 1);
    }

    #[test]
    fn test_class_members() {
        let decl = ClassDecl {
            name: "UserService".to_string(),
            extends: Some("BaseService".to_string()),
            implements: vec!["IUserService".to_string(), "Disposable".to_string()],
            annotations: vec!["Component".to_string()],
            members: vec![
                ClassMember::Constructor(FunctionDecl {
                    name: "UserService".to_string(),
                    signature: CallSignature {
                        parameters: vec![Parameter {
                            name: "repo".to_string(),
                            type_annotation: Some("UserRepo".to_string()),
                        }],
                        return_type: None,
                    },
                    ..Default::default()
                }),
                ClassMember::Property(PropertyMember {
                    name: "cache".to_string(),
                    modifiers: vec!["private".to_string()],
                    type_annotation: Some("Map<string, User>".to_string()),
                    ..Default::default()
                }),
                ClassMember::Property(PropertyMember {
                    name: "find".to_string(),
                    signature: Some(CallSignature {
                        parameters: vec![Parameter {
                            name: "id".to_string(),
                            type_annotation: None,
                        }],
                        return_type: Some("User | undefined".to_string()),
                    }),
                    calls: vec![CodeCall::new(Some("this.cache".to_string()), "get")],
                    ..Default::default()
                }),
            ],
        };

        let file = IdentListener::run("svc.ts", vec![Production::EnterClass(decl), Production::ExitClass]);
        let unit = &file.units[0];

        assert_eq!(unit.extends_ref.as_deref(), Some("BaseService"));
        assert_eq!(unit.implements_refs, vec!["IUserService", "Disposable"]);
        assert!(unit.has_annotation("Component"));

        assert_eq!(unit.fields.len(), 1);
        assert_eq!(unit.fields[0].type_value, "cache");
        assert_eq!(unit.fields[0].modifiers, vec!["private"]);

        assert_eq!(unit.functions.len(), 2);
        assert_eq!(unit.functions[0].name, "constructor");
        assert_eq!(unit.functions[0].parameters[0].type_type, "UserRepo");
        let find = &unit.functions[1];
        assert_eq!(find.parameters[0].type_type, "any");
        assert_eq!(find.return_types.len(), 1);
        assert_eq!(find.return_types[0].type_type, "User | undefined");
        assert_eq!(find.method_calls[0].target(), "this.cache.get");
    }

    #[test]
    fn test_interface_members() {
        let decl = InterfaceDecl {
            name: "Repo".to_string(),
            extends: vec!["Base".to_string(), "Other".to_string()],
            annotations: Vec::new(),
            members: vec![
                InterfaceMember::PropertySignature {
                    name: "onSave".to_string(),
                    type_annotation: Some("(item: Item) => void".to_string()),
                    callable_result: Some("void".to_string()),
                },
                InterfaceMember::PropertySignature {
                    name: "name".to_string(),
                    type_annotation: Some("string".to_string()),
                    callable_result: None,
                },
                InterfaceMember::MethodSignature {
                    name: "load".to_string(),
                    signature: CallSignature {
                        parameters: Vec::new(),
                        return_type: Some("Item[]".to_string()),
                    },
                },
            ],
        };

        let file = IdentListener::run(
            "repo.ts",
            vec![Production::EnterInterface(decl), Production::ExitInterface],
        );
        let unit = &file.units[0];

        assert_eq!(unit.kind, UnitKind::Interface);
        assert_eq!(unit.extends_ref.as_deref(), Some("Base"));
        assert!(unit.implements_refs.is_empty());

        assert_eq!(unit.fields.len(), 1);
        assert_eq!(unit.fields[0].type_value, "name");

        let on_save = &unit.functions[0];
        assert_eq!(on_save.name, "onSave");
        assert_eq!(on_save.parameters[0].type_name, "any");
        assert_eq!(on_save.parameters[0].type_type, "(item: Item) => void");
        assert_eq!(on_save.return_types[0].type_type, "void");
        assert_eq!(unit.functions[1].name, "load");
    }

    #[test]
    fn test_unbalanced_exit_is_recovered() {
        let file = IdentListener::run(
            "broken.ts",
            vec![
                Production::ExitClass,
                Production::ExitInterface,
                class("Ok"),
                Production::ExitClass,
                call("later"),
            ],
        );

        let names: Vec<_> = file.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Ok", "default"]);
    }

    #[test]
    fn test_unclosed_class_is_kept() {
        let file = IdentListener::run("open.ts", vec![class("Outer"), class("Inner")]);

        let names: Vec<_> = file.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Inner", "Outer"]);
    }

    #[test]
    fn test_package_is_recorded() {
        let file = IdentListener::run(
            "A.java",
            vec![Production::Package("com.example".to_string()), Production::Other],
        );
        assert_eq!(file.package_name, "com.example");
        assert!(file.units.is_empty());
    }
}
