//! Structural substitution and reduction over type nodes.

use std::collections::HashMap;

use crate::sema::denotation::{DenotError, DenotationStore, Phase};
use crate::sema::symbol::{SymbolId, SymbolKind, SymbolTable};
use crate::sema::ty::Type;

/// Mapping from type-parameter symbols to argument types.
#[derive(Clone, Debug, Default)]
pub struct Substitution {
    map: HashMap<SymbolId, Type>,
}

impl Substitution {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair up `params` with `args`. Callers check arity beforehand.
    #[must_use]
    pub fn from_pairs(params: &[SymbolId], args: &[Type]) -> Self {
        let map = params.iter().copied().zip(args.iter().cloned()).collect();
        Self { map }
    }

    pub fn bind(&mut self, sym: SymbolId, ty: Type) {
        self.map.insert(sym, ty);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Apply the substitution, sharing nodes that contain no mapped
    /// parameter.
    #[must_use]
    pub fn apply(&self, ty: &Type) -> Type {
        if self.map.is_empty() {
            return ty.clone();
        }
        match ty {
            Type::Ref(sym) => self.map.get(sym).cloned().unwrap_or_else(|| ty.clone()),
            Type::Applied { ctor, args } => Type::applied(
                self.apply(ctor),
                args.iter().map(|arg| self.apply(arg)).collect(),
            ),
            Type::Method {
                params,
                result,
                implicit,
            } => Type::Method {
                params: params.iter().map(|p| self.apply(p)).collect(),
                result: Box::new(self.apply(result)),
                implicit: *implicit,
            },
            Type::Poly { params, body } => {
                let inner = self.without(params.iter().copied());
                Type::Poly {
                    params: params.clone(),
                    body: Box::new(inner.apply(body)),
                }
            }
            Type::Lambda { params, body } => {
                let inner = self.without(params.iter().map(|p| p.sym));
                let params = params
                    .iter()
                    .map(|p| crate::sema::ty::LambdaParam {
                        sym: p.sym,
                        variance: p.variance,
                        bounds: crate::sema::ty::TypeBounds::new(
                            inner.apply(&p.bounds.lo),
                            inner.apply(&p.bounds.hi),
                        ),
                    })
                    .collect();
                Type::Lambda {
                    params,
                    body: Box::new(inner.apply(body)),
                }
            }
            Type::Refined { base, member, info } => {
                Type::refined(self.apply(base), member.clone(), self.apply(info))
            }
            Type::And(lhs, rhs) => Type::and(self.apply(lhs), self.apply(rhs)),
            Type::Or(lhs, rhs) => Type::or(self.apply(lhs), self.apply(rhs)),
            Type::Bounds(bounds) => Type::bounds(self.apply(&bounds.lo), self.apply(&bounds.hi)),
            Type::Any
            | Type::Nothing
            | Type::Singleton(_)
            | Type::Literal(_)
            | Type::Var(_)
            | Type::Error => ty.clone(),
        }
    }

    /// Copy of this substitution with the shadowed parameters removed.
    fn without(&self, shadowed: impl Iterator<Item = SymbolId>) -> Substitution {
        let mut map = self.map.clone();
        for sym in shadowed {
            map.remove(&sym);
        }
        Substitution { map }
    }
}

/// Instantiate `body` by replacing each of `params` with the matching
/// argument.
#[must_use]
pub fn instantiate(params: &[SymbolId], args: &[Type], body: &Type) -> Type {
    Substitution::from_pairs(params, args).apply(body)
}

/// Failure to reduce an application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArityMismatch {
    pub expected: usize,
    pub found: usize,
}

/// Reduce `Applied(Lambda(ps, body), args)` to `body[ps := args]`.
pub fn beta_reduce(ty: &Type) -> Result<Option<Type>, ArityMismatch> {
    let Type::Applied { ctor, args } = ty else {
        return Ok(None);
    };
    let Type::Lambda { params, body } = ctor.as_ref() else {
        return Ok(None);
    };
    if params.len() != args.len() {
        return Err(ArityMismatch {
            expected: params.len(),
            found: args.len(),
        });
    }
    let syms: Vec<SymbolId> = params.iter().map(|p| p.sym).collect();
    Ok(Some(instantiate(&syms, args, body)))
}

/// Expand one level of type-alias reference.
///
/// `Ref(alias)` yields the alias info; `Applied(Ref(alias), args)` expands
/// the constructor and beta-reduces. Returns `Ok(None)` when `ty` is not
/// an alias form.
pub fn expand_alias(
    ty: &Type,
    table: &SymbolTable,
    denots: &DenotationStore,
    phase: Phase,
) -> Result<Option<Type>, DenotError> {
    match ty {
        Type::Ref(sym) if table.kind(*sym) == SymbolKind::TypeAlias => {
            let denot = denots.at(*sym, phase)?;
            Ok(Some(denot.info))
        }
        Type::Applied { ctor, args } => {
            let expanded_ctor = match ctor.as_ref() {
                Type::Ref(sym) if table.kind(*sym) == SymbolKind::TypeAlias => {
                    denots.at(*sym, phase)?.info
                }
                Type::Lambda { .. } => ctor.as_ref().clone(),
                _ => return Ok(None),
            };
            let applied = Type::applied(expanded_ctor, args.clone());
            match beta_reduce(&applied) {
                Ok(Some(reduced)) => Ok(Some(reduced)),
                // An unparameterized alias applied to arguments, or an
                // arity mismatch: leave it for kind checking to report.
                Ok(None) | Err(_) => Ok(Some(applied)),
            }
        }
        _ => Ok(None),
    }
}
