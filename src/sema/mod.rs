//! Semantic analysis: names, types, and the machinery that connects them.
//!
//! The pipeline runs in two phases. The [`namer::Namer`] elaborates
//! declarations into symbols, scopes, and phase-indexed denotations; the
//! [`typer::Typer`] then types terms bidirectionally, resolving overloads
//! speculatively and filling implicit arguments through [`implicits`]
//! search. Subtyping and constraint solving sit underneath both.

pub mod builtins;
pub mod constraint;
pub mod context;
pub mod denotation;
pub mod diagnostics;
pub mod implicits;
pub mod namer;
pub mod scope;
pub mod substitute;
pub mod subtype;
pub mod symbol;
pub mod ty;
pub mod typer;

pub use builtins::Builtins;
pub use constraint::{ConstraintSolver, TyVarId, VarOrigin};
pub use context::Context;
pub use denotation::{DenotError, Denotation, DenotationStore, Phase, Validity};
pub use diagnostics::SemaError;
pub use implicits::{ImplicitSearcher, SearchFailure, Witness};
pub use namer::Namer;
pub use scope::Scope;
pub use subtype::Subtyper;
pub use symbol::{SymbolFlags, SymbolId, SymbolKind, SymbolTable};
pub use ty::{Kind, Type, TypeBounds};
pub use typer::{Expected, Typer};
