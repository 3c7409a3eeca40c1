//! Convert named JSON Schema definitions into validator declarations.
//!
//! [`translate`] is the entry point: it classifies the document's types,
//! translates each one and assembles the per-type artifacts.
pub mod analysis;
pub mod assemble;
pub mod cli;
pub mod context;
pub mod error;
pub mod expr;
pub mod ir;
pub mod lower;
pub mod names;
pub mod options;
pub mod path_de;
pub mod schema;
pub mod translate;

pub use analysis::{analyze, Analysis};
pub use assemble::{translate, Conversion, Declaration, DeclarationKind, Output};
pub use error::{Error, ErrorMeta, Result};
pub use expr::Expr;
pub use names::{derive_names, Names};
pub use options::{Options, Policy};
pub use schema::{Document, NamedType, SchemaNode};
