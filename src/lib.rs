#![deny(warnings)]
#![deny(clippy::all, clippy::pedantic, clippy::perf, clippy::suspicious)] // Catch correctness + perf + suspicious patterns early.
#![deny(clippy::unwrap_used, clippy::expect_used)]

//! Semantic core of the Sable compiler: symbols, denotations, types,
//! bidirectional checking, subtyping with constraint solving, and
//! implicit resolution.
//!
//! The crate is a library; parsing, file loading, and diagnostic
//! rendering belong to the embedding driver. Trees come in through
//! [`syntax`], get elaborated and typed by [`sema`], and leave as typed
//! trees plus structured [`diagnostics`].

pub mod diagnostics;
pub mod error;
pub mod language;
pub mod logging;
pub mod sema;
pub mod syntax;

pub use error::{Error, FatalError, Result};
pub use language::{LanguageSettings, LanguageVersion};
