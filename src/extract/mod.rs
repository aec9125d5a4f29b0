//! Conversion of parse-tree productions into the code model.
//!
//! ```text
//! ┌──────────────┐  Production  ┌───────────────┐  finish()  ┌──────────┐
//! │ Frontend     │─────────────▶│ IdentListener │───────────▶│ CodeFile │
//! │ (tree walk)  │  enter/exit  │ current+stack │            └──────────┘
//! └──────────────┘              └───────────────┘
//! ```

mod listener;
mod production;

pub use listener::{normalize_import_source, IdentListener, CONSTRUCTOR_NAME};
pub use production::{
    CallSignature, ClassDecl, ClassMember, FunctionDecl, InterfaceDecl, InterfaceMember,
    Parameter, Production, PropertyMember,
};
