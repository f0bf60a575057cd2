//! Untyped input trees for the semantic core.
//!
//! The parser produces these shapes; nodes carry source positions but no
//! types. The checker never inspects raw token text.

pub mod typed;

use crate::diagnostics::Span;

pub type Name = String;

/// Declaration-site variance of a type parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Variance {
    #[default]
    Invariant,
    Covariant,
    Contravariant,
}

impl Variance {
    /// Keyword written at the declaration site, if any.
    #[must_use]
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Variance::Invariant => None,
            Variance::Covariant => Some("out"),
            Variance::Contravariant => Some("in"),
        }
    }

    /// Compose a use-site variance with this declaration-site variance.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Variance::Invariant => Variance::Invariant,
            Variance::Covariant => Variance::Contravariant,
            Variance::Contravariant => Variance::Covariant,
        }
    }
}

/// Untyped term tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tree {
    pub kind: TreeKind,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeKind {
    IntLit(i64),
    StrLit(String),
    BoolLit(bool),
    UnitLit,
    Ident(Name),
    Apply {
        fun: Box<Tree>,
        args: Vec<Tree>,
    },
    TypeApply {
        fun: Box<Tree>,
        args: Vec<TypeExpr>,
    },
    Ascribe {
        expr: Box<Tree>,
        ty: TypeExpr,
    },
}

impl Tree {
    #[must_use]
    pub fn new(kind: TreeKind) -> Self {
        Self { kind, span: None }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn int_lit(value: i64) -> Self {
        Self::new(TreeKind::IntLit(value))
    }

    #[must_use]
    pub fn str_lit(value: impl Into<String>) -> Self {
        Self::new(TreeKind::StrLit(value.into()))
    }

    #[must_use]
    pub fn bool_lit(value: bool) -> Self {
        Self::new(TreeKind::BoolLit(value))
    }

    #[must_use]
    pub fn unit_lit() -> Self {
        Self::new(TreeKind::UnitLit)
    }

    #[must_use]
    pub fn ident(name: impl Into<Name>) -> Self {
        Self::new(TreeKind::Ident(name.into()))
    }

    #[must_use]
    pub fn apply(fun: Tree, args: Vec<Tree>) -> Self {
        Self::new(TreeKind::Apply {
            fun: Box::new(fun),
            args,
        })
    }

    #[must_use]
    pub fn type_apply(fun: Tree, args: Vec<TypeExpr>) -> Self {
        Self::new(TreeKind::TypeApply {
            fun: Box::new(fun),
            args,
        })
    }

    #[must_use]
    pub fn ascribe(expr: Tree, ty: TypeExpr) -> Self {
        Self::new(TreeKind::Ascribe {
            expr: Box::new(expr),
            ty,
        })
    }
}

/// Surface type expression, resolved against a scope during elaboration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeExprKind {
    Name(Name),
    Apply {
        ctor: Name,
        args: Vec<TypeExpr>,
    },
    And(Box<TypeExpr>, Box<TypeExpr>),
    Or(Box<TypeExpr>, Box<TypeExpr>),
    /// `x.type`: the singleton type of a stable term.
    Singleton(Name),
}

impl TypeExpr {
    #[must_use]
    pub fn new(kind: TypeExprKind) -> Self {
        Self { kind, span: None }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn name(name: impl Into<Name>) -> Self {
        Self::new(TypeExprKind::Name(name.into()))
    }

    #[must_use]
    pub fn applied(ctor: impl Into<Name>, args: Vec<TypeExpr>) -> Self {
        Self::new(TypeExprKind::Apply {
            ctor: ctor.into(),
            args,
        })
    }

    #[must_use]
    pub fn and(lhs: TypeExpr, rhs: TypeExpr) -> Self {
        Self::new(TypeExprKind::And(Box::new(lhs), Box::new(rhs)))
    }

    #[must_use]
    pub fn or(lhs: TypeExpr, rhs: TypeExpr) -> Self {
        Self::new(TypeExprKind::Or(Box::new(lhs), Box::new(rhs)))
    }

    #[must_use]
    pub fn singleton(name: impl Into<Name>) -> Self {
        Self::new(TypeExprKind::Singleton(name.into()))
    }
}

/// Type parameter declaration with optional explicit bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDecl {
    pub name: Name,
    pub variance: Variance,
    pub lo: Option<TypeExpr>,
    pub hi: Option<TypeExpr>,
    pub default: Option<TypeExpr>,
}

impl TypeParamDecl {
    #[must_use]
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            variance: Variance::Invariant,
            lo: None,
            hi: None,
            default: None,
        }
    }

    #[must_use]
    pub fn with_variance(mut self, variance: Variance) -> Self {
        self.variance = variance;
        self
    }

    #[must_use]
    pub fn with_upper(mut self, hi: TypeExpr) -> Self {
        self.hi = Some(hi);
        self
    }

    #[must_use]
    pub fn with_lower(mut self, lo: TypeExpr) -> Self {
        self.lo = Some(lo);
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: TypeExpr) -> Self {
        self.default = Some(default);
        self
    }
}

/// Term parameter declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: Name,
    pub ty: TypeExpr,
}

impl ParamDecl {
    #[must_use]
    pub fn new(name: impl Into<Name>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Top-level or class-body declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Option<Span>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Class {
        name: Name,
        type_params: Vec<TypeParamDecl>,
        parents: Vec<TypeExpr>,
        body: Vec<Decl>,
        is_abstract: bool,
        is_sealed: bool,
    },
    TypeAlias {
        name: Name,
        type_params: Vec<TypeParamDecl>,
        rhs: TypeExpr,
    },
    Def {
        name: Name,
        type_params: Vec<TypeParamDecl>,
        params: Vec<ParamDecl>,
        implicit_params: Vec<ParamDecl>,
        result: TypeExpr,
    },
    Val {
        name: Name,
        mutable: bool,
        declared: Option<TypeExpr>,
        init: Option<Tree>,
    },
    /// A given instance: a value the checker may supply implicitly.
    /// Conditional givens list the implicit parameters they require.
    Given {
        name: Name,
        implicit_params: Vec<ParamDecl>,
        ty: TypeExpr,
    },
    /// Bring one member of another definition's associated scope into
    /// the current scope.
    Import {
        from: Name,
        name: Name,
    },
}

impl Decl {
    #[must_use]
    pub fn new(kind: DeclKind) -> Self {
        Self { kind, span: None }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Name introduced by this declaration, if it introduces one.
    #[must_use]
    pub fn name(&self) -> Option<&Name> {
        match &self.kind {
            DeclKind::Class { name, .. }
            | DeclKind::TypeAlias { name, .. }
            | DeclKind::Def { name, .. }
            | DeclKind::Val { name, .. }
            | DeclKind::Given { name, .. }
            | DeclKind::Import { name, .. } => Some(name),
        }
    }
}
