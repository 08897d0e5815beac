//! Builds the Hessian2 generation IR from resolved proto descriptors.
//!
//! The [`Transformer`] turns each file's enums and messages into
//! [`ir::Hessian2File`] trees: Go types and default literals for every
//! field, Java class names for Hessian2 peers, wrapper pointers and
//! inheritance markers. [`driver::generate`] runs it per file and keeps
//! going past files that fail.

pub mod config;
pub mod driver;
pub mod error;
pub mod ident;
pub mod ir;
pub mod naming;
mod transform;
mod types;

pub use config::{ConfigError, GeneratorConfig, PathsMode};
pub use driver::{GenerationReport, generate, load_pool};
pub use error::GenerateError;
pub use ident::{GeneratedFile, GoIdent, GoImportPath, GoPackages};
pub use transform::Transformer;
