//! Typed trees handed to the backend.
//!
//! Every node carries its resolved `Type`; references carry the resolved
//! symbol. The backend consumes these without re-deriving anything.

use crate::diagnostics::Span;
use crate::sema::symbol::SymbolId;
use crate::sema::ty::Type;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedTree {
    pub kind: TypedTreeKind,
    pub ty: Type,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypedTreeKind {
    IntLit(i64),
    StrLit(String),
    BoolLit(bool),
    UnitLit,
    Ref(SymbolId),
    Apply {
        fun: Box<TypedTree>,
        args: Vec<TypedTree>,
        /// Witnesses inserted by implicit search, in parameter order.
        implicit_args: Vec<TypedTree>,
    },
    TypeApply {
        fun: Box<TypedTree>,
        args: Vec<Type>,
    },
    Ascribed {
        expr: Box<TypedTree>,
    },
    /// Reference synthesized by implicit search rather than written.
    ImplicitRef(SymbolId),
    /// Placeholder for a subtree that failed to type.
    Error,
}

impl TypedTree {
    #[must_use]
    pub fn new(kind: TypedTreeKind, ty: Type, span: Option<Span>) -> Self {
        Self { kind, ty, span }
    }

    /// Error-sentinel placeholder; checking continues around it.
    #[must_use]
    pub fn error(span: Option<Span>) -> Self {
        Self {
            kind: TypedTreeKind::Error,
            ty: Type::Error,
            span,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypedTreeKind::Error) || self.ty == Type::Error
    }

    /// The symbol this tree resolves to, when it is a direct reference.
    #[must_use]
    pub fn symbol(&self) -> Option<SymbolId> {
        match &self.kind {
            TypedTreeKind::Ref(sym) | TypedTreeKind::ImplicitRef(sym) => Some(*sym),
            TypedTreeKind::TypeApply { fun, .. } => fun.symbol(),
            _ => None,
        }
    }
}
