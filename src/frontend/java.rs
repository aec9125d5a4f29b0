//! Java frontend using tree-sitter.

use std::path::Path;

use tree_sitter::{Language, Node, Parser};

use crate::extract::{
    CallSignature, ClassDecl, ClassMember, FunctionDecl, InterfaceDecl, InterfaceMember,
    Parameter, Production, PropertyMember,
};
use crate::model::CodeCall;

use super::{child_of_kind, node_position, Frontend, ParsedFile};

pub struct JavaFrontend {
    language: Language,
}

impl JavaFrontend {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_java::LANGUAGE.into(),
        }
    }

    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }
}

impl Default for JavaFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontend for JavaFrontend {
    fn language_id(&self) -> &'static str {
        "java"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser.parse(source, None).ok_or_else(|| {
            anyhow::anyhow!("failed to parse Java source: {}", path.display())
        })?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_string_lossy().to_string(),
        })
    }

    fn walk(&self, parsed: &ParsedFile, sink: &mut dyn FnMut(Production)) -> anyhow::Result<()> {
        let mut walker = Walker { parsed, sink };
        walker.visit(parsed.tree.root_node());
        Ok(())
    }
}

struct Walker<'p, 's> {
    parsed: &'p ParsedFile,
    sink: &'s mut dyn FnMut(Production),
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
            "package_declaration" => {
                if let Some(name) = self.qualified_name_child(node) {
                    self.emit(Production::Package(name));
                }
            }
            "import_declaration" => {
                let production = self.import(node);
                self.emit(production);
            }
            "class_declaration" | "enum_declaration" | "record_declaration" => {
                let decl = self.class(node);
                self.emit(Production::EnterClass(decl));
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_children(body);
                }
                self.emit(Production::ExitClass);
            }
            "interface_declaration" => {
                let decl = self.interface(node);
                self.emit(Production::EnterInterface(decl));
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_children(body);
                }
                self.emit(Production::ExitInterface);
            }
            // Bodies are recovered with their declaration; only nested
            // type declarations inside them matter to the walk.
            "method_declaration" | "constructor_declaration" => {
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_children(body);
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

    fn qualified_name_child(&self, node: Node) -> Option<String> {
        let mut cursor = node.walk();
        let name = node
            .named_children(&mut cursor)
            .find(|child| matches!(child.kind(), "identifier" | "scoped_identifier"))
            .map(|child| self.text(child));
        name
    }

    fn import(&self, node: Node) -> Production {
        let source = self.qualified_name_child(node).unwrap_or_default();
        if child_of_kind(node, "asterisk").is_some() {
            return Production::ImportAll { source };
        }
        let binding = source.rsplit('.').next().unwrap_or_default().to_string();
        Production::ImportFrom { source, binding }
    }

    /// Annotation names and keyword modifiers of a declaration.
    fn modifiers(&self, node: Node) -> (Vec<String>, Vec<String>) {
        let mut annotations = Vec::new();
        let mut keywords = Vec::new();

        if let Some(modifiers) = child_of_kind(node, "modifiers") {
            let mut cursor = modifiers.walk();
            for child in modifiers.children(&mut cursor) {
                match child.kind() {
                    "marker_annotation" | "annotation" => {
                        if let Some(name) = child.child_by_field_name("name") {
                            annotations.push(self.text(name));
                        }
                    }
                    _ => keywords.push(self.text(child)),
                }
            }
        }

        (annotations, keywords)
    }

    fn type_list(&self, node: Node) -> Vec<String> {
        match child_of_kind(node, "type_list") {
            Some(list) => {
                let mut cursor = list.walk();
                let types = list
                    .named_children(&mut cursor)
                    .map(|t| self.text(t))
                    .collect();
                types
            }
            None => Vec::new(),
        }
    }

    fn class(&self, node: Node) -> ClassDecl {
        let (annotations, _) = self.modifiers(node);

        let extends = node
            .child_by_field_name("superclass")
            .and_then(|s| s.named_child(0))
            .map(|t| self.text(t));
        let implements = node
            .child_by_field_name("interfaces")
            .map(|i| self.type_list(i))
            .unwrap_or_default();

        let mut members = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                if child.kind() == "enum_body_declarations" {
                    let mut inner = child.walk();
                    for member in child.named_children(&mut inner) {
                        self.class_member(member, &mut members);
                    }
                } else {
                    self.class_member(child, &mut members);
                }
            }
        }

        ClassDecl {
            name: self.field_text(node, "name"),
            extends,
            implements,
            annotations,
            members,
        }
    }

    fn class_member(&self, node: Node, members: &mut Vec<ClassMember>) {
        match node.kind() {
            "constructor_declaration" | "compact_constructor_declaration" => {
                members.push(ClassMember::Constructor(FunctionDecl {
                    name: self.field_text(node, "name"),
                    signature: self.call_signature(node),
                    calls: self.body_calls(node),
                    position: Some(node_position(node)),
                }));
            }
            "method_declaration" => {
                let (_, modifiers) = self.modifiers(node);
                members.push(ClassMember::Property(PropertyMember {
                    name: self.field_text(node, "name"),
                    modifiers,
                    type_annotation: None,
                    signature: Some(self.call_signature(node)),
                    calls: self.body_calls(node),
                    position: Some(node_position(node)),
                }));
            }
            "field_declaration" => {
                let (_, modifiers) = self.modifiers(node);
                let type_text = node.child_by_field_name("type").map(|t| self.text(t));
                let mut cursor = node.walk();
                for declarator in node.children_by_field_name("declarator", &mut cursor) {
                    members.push(ClassMember::Property(PropertyMember {
                        name: self.field_text(declarator, "name"),
                        modifiers: modifiers.clone(),
                        type_annotation: type_text.clone(),
                        signature: None,
                        calls: Vec::new(),
                        position: Some(node_position(declarator)),
                    }));
                }
            }
            _ => {}
        }
    }

    fn interface(&self, node: Node) -> InterfaceDecl {
        let (annotations, _) = self.modifiers(node);
        let extends = child_of_kind(node, "extends_interfaces")
            .map(|e| self.type_list(e))
            .unwrap_or_default();

        let mut members = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                match child.kind() {
                    "method_declaration" => members.push(InterfaceMember::MethodSignature {
                        name: self.field_text(child, "name"),
                        signature: self.call_signature(child),
                    }),
                    "constant_declaration" => {
                        let type_text = child.child_by_field_name("type").map(|t| self.text(t));
                        let mut inner = child.walk();
                        for declarator in child.children_by_field_name("declarator", &mut inner) {
                            members.push(InterfaceMember::PropertySignature {
                                name: self.field_text(declarator, "name"),
                                type_annotation: type_text.clone(),
                                callable_result: None,
                            });
                        }
                    }
                    _ => {}
                }
            }
        }

        InterfaceDecl {
            name: self.field_text(node, "name"),
            extends,
            annotations,
            members,
        }
    }

    fn call_signature(&self, node: Node) -> CallSignature {
        let mut signature = CallSignature::default();

        if let Some(params) = node.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                match param.kind() {
                    "formal_parameter" => signature.parameters.push(Parameter {
                        name: self.field_text(param, "name"),
                        type_annotation: param.child_by_field_name("type").map(|t| self.text(t)),
                    }),
                    "spread_parameter" => {
                        let name = child_of_kind(param, "variable_declarator")
                            .map(|d| self.field_text(d, "name"))
                            .unwrap_or_default();
                        let mut inner = param.walk();
                        let type_text = param
                            .named_children(&mut inner)
                            .find(|c| !matches!(c.kind(), "modifiers" | "variable_declarator"))
                            .map(|t| format!("{}...", self.text(t)));
                        signature.parameters.push(Parameter {
                            name,
                            type_annotation: type_text,
                        });
                    }
                    _ => {}
                }
            }
        }

        signature.return_type = node.child_by_field_name("type").map(|t| self.text(t));
        signature
    }

    fn body_calls(&self, node: Node) -> Vec<CodeCall> {
        node.child_by_field_name("body")
            .map(|body| self.collect_calls(body))
            .unwrap_or_default()
    }

    /// Every invocation inside `body`, skipping nested type declarations.
    fn collect_calls(&self, body: Node) -> Vec<CodeCall> {
        let mut calls = Vec::new();
        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            match node.kind() {
                // Anonymous class bodies stay with the enclosing method.
                "class_declaration" | "interface_declaration" | "enum_declaration"
                | "record_declaration" => continue,
                "method_invocation" => {
                    let mut call = CodeCall::new(
                        node.child_by_field_name("object").map(|o| self.text(o)),
                        self.field_text(node, "name"),
                    );
                    call.position = Some(node_position(node));
                    calls.push(call);
                }
                "object_creation_expression" => {
                    if let Some(type_node) = node.child_by_field_name("type") {
                        let mut call = CodeCall::new(None, self.text(type_node));
                        call.position = Some(node_position(node));
                        calls.push(call);
                    }
                }
                _ => {}
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        calls
    }

    fn field_text(&self, node: Node, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|n| self.text(n))
            .unwrap_or_default()
    }
}
