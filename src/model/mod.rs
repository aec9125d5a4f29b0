//! Language-agnostic code model.
//!
//! Every frontend fills in the same shapes: a [`CodeFile`] owns its imports
//! and the [`TypeUnit`]s declared in it, each unit owns its fields and
//! functions. The model carries no behavior beyond small accessors.

mod identifier;

pub use identifier::{identity, known_identities, resolve_type_ref, resolve_type_ref_in, Identifier};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name given to synthetic file-scope containers and their wrapper function.
pub const DEFAULT_NAME: &str = "default";

/// Type used for parameters that carry no annotation.
pub const ANY_TYPE: &str = "any";

/// Source range with 1-indexed lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// An import statement, with quotes already stripped from `source`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeImport {
    pub source: String,
    /// Binding or alias text; empty when the statement binds nothing.
    #[serde(default)]
    pub import_name: String,
}

/// Kind of a [`TypeUnit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Class,
    Interface,
    /// Synthetic container for file-scope functions and calls.
    #[default]
    Default,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Class => "class",
            UnitKind::Interface => "interface",
            UnitKind::Default => "default",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An annotation or decorator attached to a type unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    pub qualified_name: String,
}

impl Annotation {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
        }
    }
}

/// A parameter or return slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeProperty {
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub type_type: String,
}

/// A call site. `receiver` is the object text for `a.b()` style calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCall {
    #[serde(default)]
    pub receiver: Option<String>,
    pub function_name: String,
    #[serde(default)]
    pub position: Option<Position>,
}

impl CodeCall {
    pub fn new(receiver: Option<String>, function_name: impl Into<String>) -> Self {
        Self {
            receiver,
            function_name: function_name.into(),
            position: None,
        }
    }

    /// `receiver.name` or just `name`.
    pub fn target(&self) -> String {
        match &self.receiver {
            Some(receiver) => format!("{}.{}", receiver, self.function_name),
            None => self.function_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFunction {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<CodeProperty>,
    #[serde(default)]
    pub return_types: Vec<CodeProperty>,
    #[serde(default)]
    pub method_calls: Vec<CodeCall>,
    #[serde(default)]
    pub position: Option<Position>,
}

impl CodeFunction {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Record `type_text` as the single return slot.
    pub fn set_return_type(&mut self, type_text: impl Into<String>) {
        self.return_types = vec![CodeProperty {
            type_name: String::new(),
            type_type: type_text.into(),
        }];
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeField {
    pub type_value: String,
    #[serde(default)]
    pub type_type: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

/// A class, an interface, or a synthetic file-scope container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeUnit {
    pub kind: UnitKind,
    pub name: String,
    #[serde(default)]
    pub extends_ref: Option<String>,
    #[serde(default)]
    pub implements_refs: Vec<String>,
    #[serde(default)]
    pub fields: Vec<CodeField>,
    #[serde(default)]
    pub functions: Vec<CodeFunction>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Calls made outside any function body.
    #[serde(default)]
    pub function_calls: Vec<CodeCall>,
}

impl TypeUnit {
    pub fn new(kind: UnitKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Empty synthetic container.
    pub fn default_container() -> Self {
        Self::new(UnitKind::Default, DEFAULT_NAME)
    }

    pub fn is_default(&self) -> bool {
        self.kind == UnitKind::Default
    }

    /// Whether the unit holds fields, functions or top-level calls.
    pub fn has_content(&self) -> bool {
        !self.fields.is_empty() || !self.functions.is_empty() || !self.function_calls.is_empty()
    }

    /// Wrap top-level calls into a `default` function when the unit has no
    /// function of its own, so every call site hangs off some function.
    pub fn synthesize_default_function(&mut self) {
        if self.functions.is_empty() && !self.function_calls.is_empty() {
            let mut function = CodeFunction::named(DEFAULT_NAME);
            function.method_calls = self.function_calls.clone();
            self.functions.push(function);
        }
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.qualified_name == name)
    }
}

/// One source file's extracted content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFile {
    pub path: String,
    /// Declared package; empty for languages without one.
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub imports: Vec<CodeImport>,
    #[serde(default)]
    pub units: Vec<TypeUnit>,
}

impl CodeFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn find_unit(&self, name: &str) -> Option<&TypeUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Class and interface units, skipping synthetic containers.
    pub fn declared_units(&self) -> impl Iterator<Item = &TypeUnit> {
        self.units.iter().filter(|u| !u.is_default())
    }
}
