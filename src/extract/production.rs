//! Grammar productions the extractor reacts to.
//!
//! Frontends translate their parse tree into a stream of [`Production`]s.
//! Declarations carry their members, because member collection happens
//! eagerly on entering the declaration.

use crate::model::{CodeCall, Position};

/// A parameter as written: name plus optional type annotation text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: Option<String>,
}

/// Parameter list and optional return annotation of a callable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSignature {
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
}

/// A function, method or constructor with its body's call sites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub signature: CallSignature,
    pub calls: Vec<CodeCall>,
    pub position: Option<Position>,
}

/// A non-constructor class member.
///
/// Members with a `signature` are methods; the rest are fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMember {
    pub name: String,
    pub modifiers: Vec<String>,
    pub type_annotation: Option<String>,
    pub signature: Option<CallSignature>,
    pub calls: Vec<CodeCall>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassMember {
    Constructor(FunctionDecl),
    Property(PropertyMember),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceMember {
    /// `name: T`. When `T` is a function type, `callable_result` holds its
    /// result type text.
    PropertySignature {
        name: String,
        type_annotation: Option<String>,
        callable_result: Option<String>,
    },
    MethodSignature {
        name: String,
        signature: CallSignature,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub annotations: Vec<String>,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub name: String,
    /// Every listed supertype; only the first is recorded.
    pub extends: Vec<String>,
    pub annotations: Vec<String>,
    pub members: Vec<InterfaceMember>,
}

/// Enter/exit events emitted during a depth-first walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Production {
    Package(String),
    /// `import x from 'm'`, `import { a } from "m"`, `import 'm'`.
    ImportFrom { source: String, binding: String },
    /// `import x = require('m')`.
    ImportAlias { source: String, binding: String },
    /// `import * as x from 'm'`, `import a.b.*`.
    ImportAll { source: String },
    EnterInterface(InterfaceDecl),
    ExitInterface,
    EnterClass(ClassDecl),
    ExitClass,
    Function(FunctionDecl),
    /// A call outside any function body.
    Call(CodeCall),
    /// Anything else the frontend chose to report. Ignored.
    Other,
}
