//! The semantic-error taxonomy and its mapping to stable diagnostic
//! codes.
//!
//! Every recoverable failure the checker can hit is one of these
//! variants; rendering goes through [`TypePrinter`] so messages use
//! source-level names. Fatal conditions are `crate::error::Error`, never
//! a `SemaError`.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use crate::diagnostics::{Diagnostic, DiagnosticCode, Label, Span};
use crate::sema::context::Context;
use crate::sema::symbol::{SymbolId, SymbolTable};
use crate::sema::ty::{Kind, Type, TypePrinter};
use crate::syntax::Name;

pub mod codes {
    pub const TYPE_MISMATCH: &str = "SEM0001";
    pub const AMBIGUOUS_OVERLOAD: &str = "SEM0002";
    pub const NO_APPLICABLE_OVERLOAD: &str = "SEM0003";
    pub const NO_IMPLICIT_FOUND: &str = "SEM0004";
    pub const AMBIGUOUS_IMPLICIT: &str = "SEM0005";
    pub const DIVERGENT_IMPLICIT_SEARCH: &str = "SEM0006";
    pub const CYCLIC_REFERENCE: &str = "SEM0007";
    pub const UNBOUND_IDENTIFIER: &str = "SEM0008";
    pub const KIND_MISMATCH: &str = "SEM0009";
    pub const UNDERCONSTRAINED: &str = "SEM0010";
}

static TITLES: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        (codes::TYPE_MISMATCH, "type mismatch"),
        (codes::AMBIGUOUS_OVERLOAD, "ambiguous overloaded reference"),
        (codes::NO_APPLICABLE_OVERLOAD, "no applicable overload"),
        (codes::NO_IMPLICIT_FOUND, "no implicit value found"),
        (codes::AMBIGUOUS_IMPLICIT, "ambiguous implicit values"),
        (
            codes::DIVERGENT_IMPLICIT_SEARCH,
            "divergent implicit search",
        ),
        (codes::CYCLIC_REFERENCE, "cyclic reference"),
        (codes::UNBOUND_IDENTIFIER, "unbound identifier"),
        (codes::KIND_MISMATCH, "kind mismatch"),
        (codes::UNDERCONSTRAINED, "underconstrained type variable"),
    ])
});

/// Human title for a stable code, used by drivers and tests.
#[must_use]
pub fn title(code: &str) -> Option<&'static str> {
    TITLES.get(code).copied()
}

/// A recoverable semantic failure. The typer substitutes the error
/// sentinel for the offending subtree after reporting one of these and
/// keeps going.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SemaError {
    TypeMismatch {
        found: Type,
        expected: Type,
    },
    AmbiguousOverload {
        name: Name,
        candidates: Vec<SymbolId>,
    },
    NoApplicableOverload {
        name: Name,
        candidates: Vec<SymbolId>,
    },
    NoImplicitFound {
        required: Type,
    },
    AmbiguousImplicit {
        required: Type,
        candidates: Vec<SymbolId>,
    },
    DivergentImplicitSearch {
        required: Type,
    },
    CyclicReference {
        symbol: SymbolId,
    },
    UnboundIdentifier {
        name: Name,
    },
    KindMismatch {
        expected: Kind,
        found: Kind,
    },
    Underconstrained {
        param: Option<SymbolId>,
    },
}

impl SemaError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            SemaError::TypeMismatch { .. } => codes::TYPE_MISMATCH,
            SemaError::AmbiguousOverload { .. } => codes::AMBIGUOUS_OVERLOAD,
            SemaError::NoApplicableOverload { .. } => codes::NO_APPLICABLE_OVERLOAD,
            SemaError::NoImplicitFound { .. } => codes::NO_IMPLICIT_FOUND,
            SemaError::AmbiguousImplicit { .. } => codes::AMBIGUOUS_IMPLICIT,
            SemaError::DivergentImplicitSearch { .. } => codes::DIVERGENT_IMPLICIT_SEARCH,
            SemaError::CyclicReference { .. } => codes::CYCLIC_REFERENCE,
            SemaError::UnboundIdentifier { .. } => codes::UNBOUND_IDENTIFIER,
            SemaError::KindMismatch { .. } => codes::KIND_MISMATCH,
            SemaError::Underconstrained { .. } => codes::UNDERCONSTRAINED,
        }
    }

    /// Symbols a reader should see alongside the message, rendered as
    /// secondary labels at their definition sites.
    #[must_use]
    pub fn related_symbols(&self) -> &[SymbolId] {
        match self {
            SemaError::AmbiguousOverload { candidates, .. }
            | SemaError::NoApplicableOverload { candidates, .. }
            | SemaError::AmbiguousImplicit { candidates, .. } => candidates,
            SemaError::CyclicReference { symbol } => std::slice::from_ref(symbol),
            _ => &[],
        }
    }

    #[must_use]
    pub fn message(&self, printer: &TypePrinter<'_>) -> String {
        match self {
            SemaError::TypeMismatch { found, expected } => format!(
                "type mismatch: found `{}`, expected `{}`",
                printer.print(found),
                printer.print(expected)
            ),
            SemaError::AmbiguousOverload { name, candidates } => format!(
                "reference to `{name}` is ambiguous: {} overloads apply",
                candidates.len()
            ),
            SemaError::NoApplicableOverload { name, candidates } => format!(
                "no overload of `{name}` applies ({} candidate{} tried)",
                candidates.len(),
                if candidates.len() == 1 { "" } else { "s" }
            ),
            SemaError::NoImplicitFound { required } => format!(
                "no implicit value found for `{}`",
                printer.print(required)
            ),
            SemaError::AmbiguousImplicit { required, candidates } => format!(
                "ambiguous implicit values for `{}`: {} candidates apply",
                printer.print(required),
                candidates.len()
            ),
            SemaError::DivergentImplicitSearch { required } => format!(
                "implicit search for `{}` diverges: the same required type recurred before resolving",
                printer.print(required)
            ),
            SemaError::CyclicReference { symbol } => {
                format!("cyclic reference involving {}", printer.symbol(*symbol))
            }
            SemaError::UnboundIdentifier { name } => {
                format!("unbound identifier `{name}`")
            }
            SemaError::KindMismatch { expected, found } => format!(
                "kind mismatch: expected {}, found {}",
                expected.describe(),
                found.describe()
            ),
            SemaError::Underconstrained { param } => match param {
                Some(_) => "type parameter could not be inferred; it defaulted to `Any`"
                    .to_string(),
                None => "type variable could not be inferred; it defaulted to `Any`".to_string(),
            },
        }
    }

    /// Render this error as a diagnostic, teacher-style `[CODE] message`
    /// prefix included.
    #[must_use]
    pub fn into_diagnostic(
        self,
        table: &SymbolTable,
        span: Option<Span>,
    ) -> Diagnostic {
        let printer = TypePrinter::new(table);
        let code = self.code();
        let message = format!("[{code}] {}", self.message(&printer));
        let mut diagnostic = Diagnostic::error(message, span)
            .with_code(DiagnosticCode::new(code, Some("sema".into())));
        for sym in self.related_symbols() {
            let description = format!("{} declared here", table.describe(*sym));
            match table.span(*sym) {
                Some(decl_span) => {
                    diagnostic = diagnostic.with_secondary(Label::secondary(decl_span, description));
                }
                None => diagnostic.add_note(description),
            }
        }
        diagnostic
    }
}

/// Report `error` through the context's sink.
pub fn report(ctx: &Context, table: &SymbolTable, error: SemaError, span: Option<Span>) {
    ctx.report(error.into_diagnostic(table, span));
}
