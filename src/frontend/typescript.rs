//! TypeScript frontend using tree-sitter.

use std::path::Path;

use tree_sitter::{Language, Node, Parser};

use crate::extract::{
    CallSignature, ClassDecl, ClassMember, FunctionDecl, InterfaceDecl, InterfaceMember,
    Parameter, Production, PropertyMember,
};
use crate::model::CodeCall;

use super::{child_of_kind, children_of_kind, node_position, Frontend, ParsedFile};

/// Modifier tokens recorded verbatim on fields.
const MODIFIER_KINDS: &[&str] = &[
    "accessibility_modifier",
    "override_modifier",
    "static",
    "readonly",
    "declare",
    "abstract",
];

pub struct TypeScriptFrontend {
    language: Language,
}

impl TypeScriptFrontend {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }

    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }
}

impl Default for TypeScriptFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontend for TypeScriptFrontend {
    fn language_id(&self) -> &'static str {
        "typescript"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "mts"]
    }

    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser.parse(source, None).ok_or_else(|| {
            anyhow::anyhow!("failed to parse TypeScript source: {}", path.display())
        })?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_string_lossy().to_string(),
        })
    }

    fn walk(&self, parsed: &ParsedFile, sink: &mut dyn FnMut(Production)) -> anyhow::Result<()> {
        let mut walker = Walker {
            parsed,
            sink,
            body_depth: 0,
        };
        walker.visit(parsed.tree.root_node());
        Ok(())
    }
}

struct Walker<'p, 's> {
    parsed: &'p ParsedFile,
    sink: &'s mut dyn FnMut(Production),
    /// Number of enclosing function or class bodies.
    body_depth: usize,
}

impl Walker<'_, '_> {
    fn emit(&mut self, production: Production) {
        (self.sink)(production);
    }

    fn text(&self, node: Node) -> String {
        self.parsed.node_text(node).to_string()
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "import_statement" => {
                let production = self.import(node);
                self.emit(production);
            }
            "interface_declaration" => {
                let decl = self.interface(node);
                self.emit(Production::EnterInterface(decl));
                self.emit(Production::ExitInterface);
            }
            "class_declaration" | "abstract_class_declaration" => {
                let decl = self.class(node);
                self.emit(Production::EnterClass(decl));
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_body(body);
                }
                self.emit(Production::ExitClass);
            }
            "function_declaration" | "generator_function_declaration" => {
                if let Some(decl) = self.function_declaration(node) {
                    self.emit(Production::Function(decl));
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_body(body);
                }
            }
            "variable_declarator" if self.body_depth == 0 => {
                match self.arrow_function(node) {
                    Some((decl, body)) => {
                        self.emit(Production::Function(decl));
                        self.visit_body(body);
                    }
                    None => self.visit_children(node),
                }
            }
            // Read with the class they decorate.
            "decorator" => {}
            "call_expression" if self.body_depth == 0 => {
                let call = self.call(node);
                self.emit(Production::Call(call));
                self.visit_children(node);
            }
            "new_expression" if self.body_depth == 0 => {
                if let Some(call) = self.construction(node) {
                    self.emit(Production::Call(call));
                }
                self.visit_children(node);
            }
            "arrow_function" | "function_expression" | "function" => {
                if let Some(body) = node.child_by_field_name("body") {
                    // Callbacks passed at file scope run as part of the script.
                    if self.body_depth == 0 {
                        for call in self.collect_calls(body) {
                            self.emit(Production::Call(call));
                        }
                    }
                    self.visit_body(body);
                }
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        let children: Vec<_> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child);
        }
    }

    /// Descend looking for nested declarations only.
    fn visit_body(&mut self, body: Node) {
        self.body_depth += 1;
        self.visit_children(body);
        self.body_depth -= 1;
    }

    fn import(&self, node: Node) -> Production {
        if let Some(require) = child_of_kind(node, "import_require_clause") {
            return Production::ImportAlias {
                source: self.source_literal(require),
                binding: child_of_kind(require, "identifier")
                    .map(|n| self.text(n))
                    .unwrap_or_default(),
            };
        }

        let source = self.source_literal(node);
        match child_of_kind(node, "import_clause") {
            Some(clause) if child_of_kind(clause, "namespace_import").is_some() => {
                Production::ImportAll { source }
            }
            Some(clause) => Production::ImportFrom {
                source,
                binding: self.text(clause),
            },
            None => Production::ImportFrom {
                source,
                binding: String::new(),
            },
        }
    }

    fn source_literal(&self, node: Node) -> String {
        node.child_by_field_name("source")
            .or_else(|| child_of_kind(node, "string"))
            .map(|n| self.text(n))
            .unwrap_or_default()
    }

    fn interface(&self, node: Node) -> InterfaceDecl {
        let extends = child_of_kind(node, "extends_type_clause")
            .map(|clause| self.named_texts(clause))
            .unwrap_or_default();

        let mut members = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                if let Some(member) = self.interface_member(member) {
                    members.push(member);
                }
            }
        }

        InterfaceDecl {
            name: self.field_text(node, "name"),
            extends,
            annotations: Vec::new(),
            members,
        }
    }

    fn interface_member(&self, node: Node) -> Option<InterfaceMember> {
        match node.kind() {
            "property_signature" => {
                let annotation = node.child_by_field_name("type");
                let callable_result = annotation
                    .and_then(|a| a.named_child(0))
                    .filter(|t| t.kind() == "function_type")
                    .and_then(|t| t.child_by_field_name("return_type"))
                    .map(|r| self.text(r));
                Some(InterfaceMember::PropertySignature {
                    name: self.field_text(node, "name"),
                    type_annotation: annotation.map(|a| self.annotation_text(a)),
                    callable_result,
                })
            }
            "method_signature" => Some(InterfaceMember::MethodSignature {
                name: self.field_text(node, "name"),
                signature: self.call_signature(node),
            }),
            _ => None,
        }
    }

    fn class(&self, node: Node) -> ClassDecl {
        let mut extends = None;
        let mut implements = Vec::new();
        if let Some(heritage) = child_of_kind(node, "class_heritage") {
            if let Some(clause) = child_of_kind(heritage, "extends_clause") {
                extends = clause
                    .child_by_field_name("value")
                    .or_else(|| clause.named_child(0))
                    .map(|v| self.text(v));
            }
            if let Some(clause) = child_of_kind(heritage, "implements_clause") {
                implements = self.named_texts(clause);
            }
        }

        let mut members = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                if let Some(member) = self.class_member(member) {
                    members.push(member);
                }
            }
        }

        ClassDecl {
            name: self.field_text(node, "name"),
            extends,
            implements,
            annotations: self.decorators(node),
            members,
        }
    }

    /// Decorator names on the class itself or on its `export` statement.
    fn decorators(&self, node: Node) -> Vec<String> {
        let mut decorators = Vec::new();
        if let Some(parent) = node.parent().filter(|p| p.kind() == "export_statement") {
            decorators.extend(children_of_kind(parent, "decorator"));
        }
        decorators.extend(children_of_kind(node, "decorator"));

        decorators
            .into_iter()
            .filter_map(|decorator| decorator.named_child(0))
            .map(|expr| match expr.kind() {
                "call_expression" => expr
                    .child_by_field_name("function")
                    .map(|f| self.text(f))
                    .unwrap_or_default(),
                _ => self.text(expr),
            })
            .filter(|name| !name.is_empty())
            .collect()
    }

    fn class_member(&self, node: Node) -> Option<ClassMember> {
        match node.kind() {
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                let name = self.field_text(node, "name");
                let calls = node
                    .child_by_field_name("body")
                    .map(|b| self.collect_calls(b))
                    .unwrap_or_default();
                let signature = self.call_signature(node);
                let position = Some(node_position(node));

                if name == "constructor" {
                    return Some(ClassMember::Constructor(FunctionDecl {
                        name,
                        signature,
                        calls,
                        position,
                    }));
                }

                Some(ClassMember::Property(PropertyMember {
                    name,
                    modifiers: self.modifiers(node),
                    type_annotation: None,
                    signature: Some(signature),
                    calls,
                    position,
                }))
            }
            "public_field_definition" => {
                let value = node
                    .child_by_field_name("value")
                    .filter(|v| matches!(v.kind(), "arrow_function" | "function_expression"));
                let (signature, calls) = match value {
                    Some(function) => (
                        Some(self.call_signature(function)),
                        function
                            .child_by_field_name("body")
                            .map(|b| self.collect_calls(b))
                            .unwrap_or_default(),
                    ),
                    None => (None, Vec::new()),
                };

                Some(ClassMember::Property(PropertyMember {
                    name: self.field_text(node, "name"),
                    modifiers: self.modifiers(node),
                    type_annotation: node
                        .child_by_field_name("type")
                        .map(|a| self.annotation_text(a)),
                    signature,
                    calls,
                    position: Some(node_position(node)),
                }))
            }
            _ => None,
        }
    }

    fn modifiers(&self, node: Node) -> Vec<String> {
        let mut cursor = node.walk();
        let modifiers = node
            .children(&mut cursor)
            .filter(|child| MODIFIER_KINDS.contains(&child.kind()))
            .map(|child| self.text(child))
            .collect();
        modifiers
    }

    fn function_declaration(&self, node: Node) -> Option<FunctionDecl> {
        let name = node.child_by_field_name("name")?;
        Some(FunctionDecl {
            name: self.text(name),
            signature: self.call_signature(node),
            calls: node
                .child_by_field_name("body")
                .map(|b| self.collect_calls(b))
                .unwrap_or_default(),
            position: Some(node_position(node)),
        })
    }

    /// `const name = (...) => ...` at file scope.
    fn arrow_function<'t>(&self, declarator: Node<'t>) -> Option<(FunctionDecl, Node<'t>)> {
        let name = declarator
            .child_by_field_name("name")
            .filter(|n| n.kind() == "identifier")?;
        let value = declarator
            .child_by_field_name("value")
            .filter(|v| matches!(v.kind(), "arrow_function" | "function_expression"))?;
        let body = value.child_by_field_name("body")?;

        let decl = FunctionDecl {
            name: self.text(name),
            signature: self.call_signature(value),
            calls: self.collect_calls(body),
            position: Some(node_position(declarator)),
        };
        Some((decl, body))
    }

    fn call_signature(&self, node: Node) -> CallSignature {
        let mut signature = CallSignature::default();

        if let Some(params) = node.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
                    continue;
                }
                signature.parameters.push(Parameter {
                    name: param
                        .child_by_field_name("pattern")
                        .map(|p| self.text(p))
                        .unwrap_or_default(),
                    type_annotation: param
                        .child_by_field_name("type")
                        .map(|a| self.annotation_text(a)),
                });
            }
        } else if let Some(param) = node.child_by_field_name("parameter") {
            // `x => x + 1`
            signature.parameters.push(Parameter {
                name: self.text(param),
                type_annotation: None,
            });
        }

        signature.return_type = node
            .child_by_field_name("return_type")
            .map(|a| self.annotation_text(a));

        signature
    }

    /// Type text of a `: T` annotation, without the colon.
    fn annotation_text(&self, annotation: Node) -> String {
        match annotation.named_child(0) {
            Some(inner) if annotation.kind().ends_with("annotation") => self.text(inner),
            _ => self.text(annotation),
        }
    }

    /// Every call inside `body`, skipping nested class bodies.
    fn collect_calls(&self, body: Node) -> Vec<CodeCall> {
        let mut calls = Vec::new();
        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "class_declaration" | "abstract_class_declaration" | "class" => continue,
                "call_expression" => calls.push(self.call(node)),
                "new_expression" => calls.extend(self.construction(node)),
                _ => {}
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        calls
    }

    /// `new X(...)` recorded as a call to `X`.
    fn construction(&self, node: Node) -> Option<CodeCall> {
        let constructor = node.child_by_field_name("constructor")?;
        let mut call = CodeCall::new(None, self.text(constructor));
        call.position = Some(node_position(node));
        Some(call)
    }

    fn call(&self, node: Node) -> CodeCall {
        let mut call = match node.child_by_field_name("function") {
            Some(function) if function.kind() == "member_expression" => CodeCall::new(
                function.child_by_field_name("object").map(|o| self.text(o)),
                function
                    .child_by_field_name("property")
                    .map(|p| self.text(p))
                    .unwrap_or_default(),
            ),
            Some(function) => CodeCall::new(None, self.text(function)),
            None => CodeCall::new(None, self.text(node)),
        };
        call.position = Some(node_position(node));
        call
    }

    fn field_text(&self, node: Node, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|n| self.text(n))
            .unwrap_or_default()
    }

    fn named_texts(&self, node: Node) -> Vec<String> {
        let mut cursor = node.walk();
        let texts = node
            .named_children(&mut cursor)
            .map(|child| self.text(child))
            .collect();
        texts
    }
}
