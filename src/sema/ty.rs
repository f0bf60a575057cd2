//! The closed set of type nodes and the basic operations over them.
//!
//! Type values are immutable and freely shared. The only mutable cells in
//! the algebra are type variables, owned by the constraint solver that
//! opened them.

use crate::sema::constraint::TyVarId;
use crate::sema::denotation::{DenotationStore, Phase};
use crate::sema::symbol::{SymbolId, SymbolKind, SymbolTable};
use crate::syntax::{Name, Variance};

/// Lower and upper bound pair. Once solved, `lo <: hi` holds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeBounds {
    pub lo: Type,
    pub hi: Type,
}

impl TypeBounds {
    #[must_use]
    pub fn new(lo: Type, hi: Type) -> Self {
        Self { lo, hi }
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            lo: Type::Nothing,
            hi: Type::Any,
        }
    }

    #[must_use]
    pub fn upper(hi: Type) -> Self {
        Self {
            lo: Type::Nothing,
            hi,
        }
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.lo == Type::Nothing && self.hi == Type::Any
    }
}

/// Type-lambda parameter with its declared variance and bounds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LambdaParam {
    pub sym: SymbolId,
    pub variance: Variance,
    pub bounds: TypeBounds,
}

/// Value of a literal type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LitValue {
    Int(i64),
    Str(String),
    Bool(bool),
}

/// The precise type of a literal term, widening to `class`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Lit {
    pub value: LitValue,
    pub class: SymbolId,
}

/// A type node. The set is closed; every consumer matches exhaustively.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// Top: supertype of every type.
    Any,
    /// Bottom: subtype of every type.
    Nothing,
    /// Bare reference to a class, alias, or type-parameter symbol.
    Ref(SymbolId),
    /// Constructor applied to arguments.
    Applied { ctor: Box<Type>, args: Vec<Type> },
    /// Method signature. Implicit methods have their arguments supplied
    /// by implicit search when omitted.
    Method {
        params: Vec<Type>,
        result: Box<Type>,
        implicit: bool,
    },
    /// Polymorphic method: type parameters scoped over a method type.
    Poly {
        params: Vec<SymbolId>,
        body: Box<Type>,
    },
    /// Type-level function, for higher-kinded abstraction.
    Lambda {
        params: Vec<LambdaParam>,
        body: Box<Type>,
    },
    /// Base type with one member's info overridden.
    Refined {
        base: Box<Type>,
        member: Name,
        info: Box<Type>,
    },
    And(Box<Type>, Box<Type>),
    Or(Box<Type>, Box<Type>),
    /// The precise type of one stable term.
    Singleton(SymbolId),
    /// The precise type of a literal.
    Literal(Lit),
    /// Placeholder awaiting constraint-solver instantiation.
    Var(TyVarId),
    /// Bounds used as a wildcard argument.
    Bounds(Box<TypeBounds>),
    /// Error sentinel: subsumes and is subsumed by everything.
    Error,
}

impl Type {
    #[must_use]
    pub fn applied(ctor: Type, args: Vec<Type>) -> Self {
        Type::Applied {
            ctor: Box::new(ctor),
            args,
        }
    }

    #[must_use]
    pub fn method(params: Vec<Type>, result: Type) -> Self {
        Type::Method {
            params,
            result: Box::new(result),
            implicit: false,
        }
    }

    #[must_use]
    pub fn implicit_method(params: Vec<Type>, result: Type) -> Self {
        Type::Method {
            params,
            result: Box::new(result),
            implicit: true,
        }
    }

    #[must_use]
    pub fn poly(params: Vec<SymbolId>, body: Type) -> Self {
        Type::Poly {
            params,
            body: Box::new(body),
        }
    }

    #[must_use]
    pub fn lambda(params: Vec<LambdaParam>, body: Type) -> Self {
        Type::Lambda {
            params,
            body: Box::new(body),
        }
    }

    #[must_use]
    pub fn refined(base: Type, member: impl Into<Name>, info: Type) -> Self {
        Type::Refined {
            base: Box::new(base),
            member: member.into(),
            info: Box::new(info),
        }
    }

    /// Intersection, collapsing the trivial cases.
    #[must_use]
    pub fn and(lhs: Type, rhs: Type) -> Self {
        if lhs == rhs || rhs == Type::Any {
            lhs
        } else if lhs == Type::Any {
            rhs
        } else if lhs == Type::Nothing || rhs == Type::Nothing {
            Type::Nothing
        } else {
            Type::And(Box::new(lhs), Box::new(rhs))
        }
    }

    /// Union, collapsing the trivial cases.
    #[must_use]
    pub fn or(lhs: Type, rhs: Type) -> Self {
        if lhs == rhs || rhs == Type::Nothing {
            lhs
        } else if lhs == Type::Nothing {
            rhs
        } else if lhs == Type::Any || rhs == Type::Any {
            Type::Any
        } else {
            Type::Or(Box::new(lhs), Box::new(rhs))
        }
    }

    #[must_use]
    pub fn int_lit(value: i64, class: SymbolId) -> Self {
        Type::Literal(Lit {
            value: LitValue::Int(value),
            class,
        })
    }

    #[must_use]
    pub fn str_lit(value: impl Into<String>, class: SymbolId) -> Self {
        Type::Literal(Lit {
            value: LitValue::Str(value.into()),
            class,
        })
    }

    #[must_use]
    pub fn bool_lit(value: bool, class: SymbolId) -> Self {
        Type::Literal(Lit {
            value: LitValue::Bool(value),
            class,
        })
    }

    #[must_use]
    pub fn bounds(lo: Type, hi: Type) -> Self {
        Type::Bounds(Box::new(TypeBounds::new(lo, hi)))
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    /// Whether any unsolved type variable occurs in this type.
    #[must_use]
    pub fn contains_var(&self) -> bool {
        match self {
            Type::Var(_) => true,
            Type::Any
            | Type::Nothing
            | Type::Ref(_)
            | Type::Singleton(_)
            | Type::Literal(_)
            | Type::Error => false,
            Type::Applied { ctor, args } => {
                ctor.contains_var() || args.iter().any(Type::contains_var)
            }
            Type::Method { params, result, .. } => {
                params.iter().any(Type::contains_var) || result.contains_var()
            }
            Type::Poly { body, .. } => body.contains_var(),
            Type::Lambda { params, body } => {
                params
                    .iter()
                    .any(|p| p.bounds.lo.contains_var() || p.bounds.hi.contains_var())
                    || body.contains_var()
            }
            Type::Refined { base, info, .. } => base.contains_var() || info.contains_var(),
            Type::And(lhs, rhs) | Type::Or(lhs, rhs) => {
                lhs.contains_var() || rhs.contains_var()
            }
            Type::Bounds(bounds) => bounds.lo.contains_var() || bounds.hi.contains_var(),
        }
    }
}

/// Kind of a type: a proper type or an n-ary constructor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Star,
    Constructor(usize),
}

impl Kind {
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Kind::Star => "a proper type".to_string(),
            Kind::Constructor(arity) => {
                format!("a type constructor taking {arity} argument(s)")
            }
        }
    }
}

/// The kind of `ty` given the declared arity of referenced symbols.
#[must_use]
pub fn kind_of(ty: &Type, table: &SymbolTable) -> Kind {
    match ty {
        Type::Ref(sym) if table.kind(*sym).is_type() => {
            let arity = table.type_params(*sym).len();
            if arity == 0 {
                Kind::Star
            } else {
                Kind::Constructor(arity)
            }
        }
        Type::Lambda { params, .. } => Kind::Constructor(params.len()),
        _ => Kind::Star,
    }
}

/// Replace singleton and literal types with their underlying class types,
/// recursively. Used when precision must not leak, e.g. into a mutable
/// binding or an inferred type argument.
#[must_use]
pub fn widen(ty: &Type, table: &SymbolTable, denots: &DenotationStore, phase: Phase) -> Type {
    match ty {
        Type::Literal(lit) => Type::Ref(lit.class),
        Type::Singleton(sym) => match denots.at(*sym, phase) {
            Ok(denot) => {
                let underlying = denot.info;
                if underlying == *ty {
                    // A self-referential singleton cannot widen further.
                    Type::Error
                } else {
                    widen(&underlying, table, denots, phase)
                }
            }
            Err(_) => Type::Error,
        },
        Type::Or(lhs, rhs) => Type::or(
            widen(lhs, table, denots, phase),
            widen(rhs, table, denots, phase),
        ),
        Type::And(lhs, rhs) => Type::and(
            widen(lhs, table, denots, phase),
            widen(rhs, table, denots, phase),
        ),
        other => other.clone(),
    }
}

/// Renders types for diagnostics, resolving symbol names via the table.
pub struct TypePrinter<'a> {
    table: &'a SymbolTable,
}

impl<'a> TypePrinter<'a> {
    #[must_use]
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn print(&self, ty: &Type) -> String {
        match ty {
            Type::Any => "Any".to_string(),
            Type::Nothing => "Nothing".to_string(),
            Type::Ref(sym) => self.table.name(*sym),
            Type::Applied { ctor, args } => {
                let rendered: Vec<String> = args.iter().map(|arg| self.print(arg)).collect();
                format!("{}[{}]", self.print(ctor), rendered.join(", "))
            }
            Type::Method {
                params,
                result,
                implicit,
            } => {
                let rendered: Vec<String> = params.iter().map(|p| self.print(p)).collect();
                let prefix = if *implicit { "given " } else { "" };
                format!("({prefix}{}) -> {}", rendered.join(", "), self.print(result))
            }
            Type::Poly { params, body } => {
                let rendered: Vec<String> =
                    params.iter().map(|sym| self.table.name(*sym)).collect();
                format!("[{}]{}", rendered.join(", "), self.print(body))
            }
            Type::Lambda { params, body } => {
                let rendered: Vec<String> = params
                    .iter()
                    .map(|param| {
                        let keyword = param
                            .variance
                            .keyword()
                            .map(|kw| format!("{kw} "))
                            .unwrap_or_default();
                        format!("{keyword}{}", self.table.name(param.sym))
                    })
                    .collect();
                format!("[{}] =>> {}", rendered.join(", "), self.print(body))
            }
            Type::Refined { base, member, info } => {
                format!("{} {{ {member}: {} }}", self.print(base), self.print(info))
            }
            Type::And(lhs, rhs) => format!("{} & {}", self.print(lhs), self.print(rhs)),
            Type::Or(lhs, rhs) => format!("{} | {}", self.print(lhs), self.print(rhs)),
            Type::Singleton(sym) => format!("{}.type", self.table.name(*sym)),
            Type::Literal(lit) => match &lit.value {
                LitValue::Int(value) => value.to_string(),
                LitValue::Str(value) => format!("\"{value}\""),
                LitValue::Bool(value) => value.to_string(),
            },
            Type::Var(var) => format!("?{}", var.index()),
            Type::Bounds(bounds) => {
                if bounds.is_unbounded() {
                    "?".to_string()
                } else {
                    format!(">: {} <: {}", self.print(&bounds.lo), self.print(&bounds.hi))
                }
            }
            Type::Error => "<error>".to_string(),
        }
    }

    /// Render symbols the way diagnostics name them.
    #[must_use]
    pub fn symbol(&self, sym: SymbolId) -> String {
        self.table.describe(sym)
    }
}

/// Whether a symbol reference may stand for a singleton's underlying path.
#[must_use]
pub fn is_stable(sym: SymbolId, table: &SymbolTable) -> bool {
    let kind = table.kind(sym);
    matches!(kind, SymbolKind::Value | SymbolKind::Module)
        && !table.has_flag(sym, crate::sema::symbol::SymbolFlags::MUTABLE)
}
