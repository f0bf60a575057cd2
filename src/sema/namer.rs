//! Declaration elaboration: from untyped declarations to symbols,
//! denotations, and scopes.
//!
//! Elaboration runs in two passes. The first creates a symbol per
//! declaration and enters every name, so later declarations can refer
//! to earlier and later ones alike. The second resolves declared type
//! expressions against the populated scope and installs denotations.

use std::rc::Rc;

use tracing::debug;

use crate::diagnostics::Span;
use crate::sema::context::Context;
use crate::sema::denotation::{DenotationStore, Validity};
use crate::sema::diagnostics::{SemaError, report};
use crate::sema::scope::Scope;
use crate::sema::symbol::{SymbolFlags, SymbolId, SymbolKind, SymbolTable};
use crate::sema::ty::{Kind, LambdaParam, Type, TypeBounds, kind_of};
use crate::syntax::{Decl, DeclKind, Name, ParamDecl, TypeExpr, TypeExprKind, TypeParamDecl};

/// Resolve a surface type expression against `scope`, reporting failures
/// through the context's sink and recovering with the error sentinel.
pub fn resolve_type_expr(
    expr: &TypeExpr,
    scope: &Scope,
    table: &SymbolTable,
    ctx: &Context,
) -> Type {
    match &expr.kind {
        TypeExprKind::Name(name) => match lookup_type(name, scope, table) {
            Some(sym) => Type::Ref(sym),
            None => {
                report(
                    ctx,
                    table,
                    SemaError::UnboundIdentifier { name: name.clone() },
                    expr.span,
                );
                Type::Error
            }
        },
        TypeExprKind::Apply { ctor, args } => {
            let Some(sym) = lookup_type(ctor, scope, table) else {
                report(
                    ctx,
                    table,
                    SemaError::UnboundIdentifier { name: ctor.clone() },
                    expr.span,
                );
                return Type::Error;
            };
            let declared = kind_of(&Type::Ref(sym), table);
            let found = Kind::Constructor(args.len());
            if declared != found {
                report(
                    ctx,
                    table,
                    SemaError::KindMismatch {
                        expected: declared,
                        found,
                    },
                    expr.span,
                );
                return Type::Error;
            }
            let resolved: Vec<Type> = args
                .iter()
                .map(|arg| resolve_type_expr(arg, scope, table, ctx))
                .collect();
            Type::applied(Type::Ref(sym), resolved)
        }
        TypeExprKind::And(lhs, rhs) => Type::and(
            resolve_type_expr(lhs, scope, table, ctx),
            resolve_type_expr(rhs, scope, table, ctx),
        ),
        TypeExprKind::Or(lhs, rhs) => Type::or(
            resolve_type_expr(lhs, scope, table, ctx),
            resolve_type_expr(rhs, scope, table, ctx),
        ),
        TypeExprKind::Singleton(name) => {
            let terms: Vec<SymbolId> = scope
                .lookup(name)
                .into_iter()
                .filter(|sym| table.kind(*sym).is_term())
                .collect();
            match terms.first() {
                Some(sym) => Type::Singleton(*sym),
                None => {
                    report(
                        ctx,
                        table,
                        SemaError::UnboundIdentifier { name: name.clone() },
                        expr.span,
                    );
                    Type::Error
                }
            }
        }
    }
}

fn lookup_type(name: &str, scope: &Scope, table: &SymbolTable) -> Option<SymbolId> {
    scope
        .lookup(name)
        .into_iter()
        .find(|sym| table.kind(*sym).is_type())
}

/// Work left for the resolution pass after a symbol has been created.
enum Pending<'d> {
    Class {
        sym: SymbolId,
        scope: Rc<Scope>,
        type_params: &'d [TypeParamDecl],
        parents: &'d [TypeExpr],
    },
    Alias {
        sym: SymbolId,
        scope: Rc<Scope>,
        type_params: &'d [TypeParamDecl],
        rhs: &'d TypeExpr,
    },
    Def {
        sym: SymbolId,
        scope: Rc<Scope>,
        type_params: &'d [TypeParamDecl],
        params: &'d [ParamDecl],
        implicit_params: &'d [ParamDecl],
        result: &'d TypeExpr,
    },
    Val {
        sym: SymbolId,
        scope: Rc<Scope>,
        declared: Option<&'d TypeExpr>,
    },
    Given {
        sym: SymbolId,
        scope: Rc<Scope>,
        implicit_params: &'d [ParamDecl],
        ty: &'d TypeExpr,
    },
    Import {
        scope: Rc<Scope>,
        from: &'d Name,
        name: &'d Name,
        span: Option<Span>,
    },
}

/// Elaborates declaration lists into the symbol table, denotation store,
/// and a scope for the typer to run under.
pub struct Namer<'a> {
    table: &'a SymbolTable,
    denots: &'a DenotationStore,
}

impl<'a> Namer<'a> {
    #[must_use]
    pub fn new(table: &'a SymbolTable, denots: &'a DenotationStore) -> Self {
        Self { table, denots }
    }

    /// Elaborate `decls`, returning the scope in which they are visible.
    pub fn elaborate(&self, decls: &[Decl], ctx: &Context) -> Rc<Scope> {
        let scope = Scope::nested(&ctx.scope());
        let mut pending = Vec::new();
        self.declare_all(decls, &scope, ctx.owner(), &mut pending);
        for item in pending {
            self.resolve_pending(item, ctx);
        }
        self.check_alias_cycles(&scope, ctx);
        scope
    }

    fn declare_all<'d>(
        &self,
        decls: &'d [Decl],
        scope: &Rc<Scope>,
        owner: SymbolId,
        pending: &mut Vec<Pending<'d>>,
    ) {
        for decl in decls {
            self.declare(decl, scope, owner, pending);
        }
    }

    fn declare<'d>(
        &self,
        decl: &'d Decl,
        scope: &Rc<Scope>,
        owner: SymbolId,
        pending: &mut Vec<Pending<'d>>,
    ) {
        match &decl.kind {
            DeclKind::Class {
                name,
                type_params,
                parents,
                body,
                is_abstract,
                is_sealed,
            } => {
                let mut flags = SymbolFlags::empty();
                if *is_abstract {
                    flags |= SymbolFlags::ABSTRACT;
                }
                if *is_sealed {
                    flags |= SymbolFlags::SEALED;
                }
                let sym = self
                    .table
                    .create_at(owner, name.clone(), SymbolKind::Class, flags, decl.span);
                scope.enter(name.clone(), sym);
                debug!(symbol = %sym, name, "declared class");

                let class_scope = Scope::nested(scope);
                self.declare_type_params(sym, type_params, &class_scope);

                let member_count_before = pending.len();
                self.declare_all(body, &class_scope, sym, pending);
                for item in &pending[member_count_before..] {
                    if let Some(member) = pending_symbol(item) {
                        self.table.add_member(sym, member);
                        if self.table.has_flag(member, SymbolFlags::GIVEN) {
                            self.table.add_associated_given(sym, member);
                        }
                    }
                }

                pending.push(Pending::Class {
                    sym,
                    scope: class_scope,
                    type_params,
                    parents,
                });
            }
            DeclKind::TypeAlias {
                name,
                type_params,
                rhs,
            } => {
                let sym = self.table.create_at(
                    owner,
                    name.clone(),
                    SymbolKind::TypeAlias,
                    SymbolFlags::empty(),
                    decl.span,
                );
                scope.enter(name.clone(), sym);
                let alias_scope = Scope::nested(scope);
                self.declare_type_params(sym, type_params, &alias_scope);
                pending.push(Pending::Alias {
                    sym,
                    scope: alias_scope,
                    type_params,
                    rhs,
                });
            }
            DeclKind::Def {
                name,
                type_params,
                params,
                implicit_params,
                result,
            } => {
                let sym = self.table.create_at(
                    owner,
                    name.clone(),
                    SymbolKind::Method,
                    SymbolFlags::empty(),
                    decl.span,
                );
                scope.enter(name.clone(), sym);
                let def_scope = Scope::nested(scope);
                self.declare_type_params(sym, type_params, &def_scope);
                pending.push(Pending::Def {
                    sym,
                    scope: def_scope,
                    type_params,
                    params,
                    implicit_params,
                    result,
                });
            }
            DeclKind::Val {
                name,
                mutable,
                declared,
                init: _,
            } => {
                let mut flags = SymbolFlags::empty();
                if *mutable {
                    flags |= SymbolFlags::MUTABLE;
                }
                let sym = self.table.create_at(
                    owner,
                    name.clone(),
                    SymbolKind::Value,
                    flags,
                    decl.span,
                );
                scope.enter(name.clone(), sym);
                pending.push(Pending::Val {
                    sym,
                    scope: Rc::clone(scope),
                    declared: declared.as_ref(),
                });
            }
            DeclKind::Given {
                name,
                implicit_params,
                ty,
            } => {
                let sym = self.table.create_at(
                    owner,
                    name.clone(),
                    SymbolKind::Value,
                    SymbolFlags::GIVEN,
                    decl.span,
                );
                scope.enter(name.clone(), sym);
                pending.push(Pending::Given {
                    sym,
                    scope: Rc::clone(scope),
                    implicit_params,
                    ty,
                });
            }
            DeclKind::Import { from, name } => {
                pending.push(Pending::Import {
                    scope: Rc::clone(scope),
                    from,
                    name,
                    span: decl.span,
                });
            }
        }
    }

    fn declare_type_params(
        &self,
        owner: SymbolId,
        decls: &[TypeParamDecl],
        scope: &Rc<Scope>,
    ) {
        let mut params = Vec::with_capacity(decls.len());
        for decl in decls {
            let sym = self.table.create(
                owner,
                decl.name.clone(),
                SymbolKind::TypeParam,
                SymbolFlags::PARAM,
            );
            self.table.set_variance(sym, decl.variance);
            scope.enter(decl.name.clone(), sym);
            params.push(sym);
        }
        self.table.set_type_params(owner, params);
    }

    fn resolve_pending(&self, item: Pending<'_>, ctx: &Context) {
        match item {
            Pending::Class {
                sym,
                scope,
                type_params,
                parents,
            } => {
                self.resolve_type_params(sym, type_params, &scope, ctx);
                for parent in parents {
                    let resolved = resolve_type_expr(parent, &scope, self.table, ctx);
                    if !resolved.is_error() {
                        self.table.add_parent(sym, resolved);
                    }
                }
                self.denots
                    .install(sym, Type::Ref(sym), Validity::from(ctx.phase()));
            }
            Pending::Alias {
                sym,
                scope,
                type_params,
                rhs,
            } => {
                self.resolve_type_params(sym, type_params, &scope, ctx);
                let body = resolve_type_expr(rhs, &scope, self.table, ctx);
                let info = if type_params.is_empty() {
                    body
                } else {
                    let params = self
                        .table
                        .type_params(sym)
                        .into_iter()
                        .map(|param| LambdaParam {
                            sym: param,
                            variance: self.table.variance(param),
                            bounds: self.declared_bounds(param, ctx),
                        })
                        .collect();
                    Type::lambda(params, body)
                };
                self.denots.install(sym, info, Validity::from(ctx.phase()));
            }
            Pending::Def {
                sym,
                scope,
                type_params,
                params,
                implicit_params,
                result,
            } => {
                self.resolve_type_params(sym, type_params, &scope, ctx);
                let explicit: Vec<Type> = params
                    .iter()
                    .map(|p| resolve_type_expr(&p.ty, &scope, self.table, ctx))
                    .collect();
                let result_ty = resolve_type_expr(result, &scope, self.table, ctx);
                let inner = if implicit_params.is_empty() {
                    result_ty
                } else {
                    let implicit: Vec<Type> = implicit_params
                        .iter()
                        .map(|p| resolve_type_expr(&p.ty, &scope, self.table, ctx))
                        .collect();
                    Type::implicit_method(implicit, result_ty)
                };
                let sig = Type::method(explicit, inner);
                let info = if type_params.is_empty() {
                    sig
                } else {
                    Type::poly(self.table.type_params(sym), sig)
                };
                self.denots.install(sym, info, Validity::from(ctx.phase()));
            }
            Pending::Val {
                sym,
                scope,
                declared,
            } => {
                // Un-annotated vals get their denotation from the typer
                // once the initializer has been typed.
                if let Some(expr) = declared {
                    let resolved = resolve_type_expr(expr, &scope, self.table, ctx);
                    self.denots
                        .install(sym, resolved, Validity::from(ctx.phase()));
                }
            }
            Pending::Given {
                sym,
                scope,
                implicit_params,
                ty,
            } => {
                let result = resolve_type_expr(ty, &scope, self.table, ctx);
                let info = if implicit_params.is_empty() {
                    result
                } else {
                    let implicit: Vec<Type> = implicit_params
                        .iter()
                        .map(|p| resolve_type_expr(&p.ty, &scope, self.table, ctx))
                        .collect();
                    Type::implicit_method(implicit, result)
                };
                self.denots.install(sym, info, Validity::from(ctx.phase()));
            }
            Pending::Import {
                scope,
                from,
                name,
                span,
            } => {
                let Some(from_sym) = lookup_type(from, &scope, self.table) else {
                    report(
                        ctx,
                        self.table,
                        SemaError::UnboundIdentifier { name: from.clone() },
                        span,
                    );
                    return;
                };
                let members = self.table.members_named(from_sym, name);
                if members.is_empty() {
                    report(
                        ctx,
                        self.table,
                        SemaError::UnboundIdentifier { name: name.clone() },
                        span,
                    );
                    return;
                }
                for member in members {
                    self.table.add_flags(member, SymbolFlags::IMPORTED);
                    scope.enter_import(name.clone(), member);
                }
            }
        }
    }

    fn resolve_type_params(
        &self,
        owner: SymbolId,
        decls: &[TypeParamDecl],
        scope: &Rc<Scope>,
        ctx: &Context,
    ) {
        let params = self.table.type_params(owner);
        for (sym, decl) in params.iter().zip(decls.iter()) {
            let lo = decl
                .lo
                .as_ref()
                .map_or(Type::Nothing, |expr| {
                    resolve_type_expr(expr, scope, self.table, ctx)
                });
            let hi = decl
                .hi
                .as_ref()
                .map_or(Type::Any, |expr| {
                    resolve_type_expr(expr, scope, self.table, ctx)
                });
            self.denots.install(
                *sym,
                Type::bounds(lo, hi),
                Validity::from(ctx.phase()),
            );
            if let Some(default) = decl.default.as_ref() {
                let resolved = resolve_type_expr(default, scope, self.table, ctx);
                self.table.set_default_arg(*sym, resolved);
            }
        }
    }

    fn declared_bounds(&self, param: SymbolId, ctx: &Context) -> TypeBounds {
        match self.denots.at(param, ctx.phase()) {
            Ok(denot) => match denot.info {
                Type::Bounds(bounds) => *bounds,
                other => TypeBounds::upper(other),
            },
            Err(_) => TypeBounds::unbounded(),
        }
    }

    /// Direct alias-to-alias reference cycles would loop forever during
    /// lazy expansion; report them once and replace the body with the
    /// error sentinel.
    fn check_alias_cycles(&self, scope: &Scope, ctx: &Context) {
        for sym in scope.declared_here() {
            if self.table.kind(sym) != SymbolKind::TypeAlias {
                continue;
            }
            let mut seen = vec![sym];
            let mut current = sym;
            loop {
                let Ok(denot) = self.denots.at(current, ctx.phase()) else {
                    break;
                };
                let Type::Ref(next) = denot.info else {
                    break;
                };
                if self.table.kind(next) != SymbolKind::TypeAlias {
                    break;
                }
                if seen.contains(&next) {
                    report(
                        ctx,
                        self.table,
                        SemaError::CyclicReference { symbol: sym },
                        self.table.span(sym),
                    );
                    self.denots
                        .install(sym, Type::Error, Validity::from(ctx.phase()));
                    break;
                }
                seen.push(next);
                current = next;
            }
        }
    }
}

fn pending_symbol(item: &Pending<'_>) -> Option<SymbolId> {
    match item {
        Pending::Class { sym, .. }
        | Pending::Alias { sym, .. }
        | Pending::Def { sym, .. }
        | Pending::Val { sym, .. }
        | Pending::Given { sym, .. } => Some(*sym),
        Pending::Import { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageSettings;
    use crate::sema::builtins::Builtins;
    use crate::syntax::Variance;

    struct Fixture {
        table: SymbolTable,
        denots: DenotationStore,
        builtins: Builtins,
        ctx: Context,
    }

    impl Fixture {
        fn new() -> Self {
            let table = SymbolTable::new();
            let denots = DenotationStore::new();
            let scope = Scope::root();
            let builtins = Builtins::install(&table, &denots, &scope);
            let ctx = Context::root(scope, LanguageSettings::default());
            Self {
                table,
                denots,
                builtins,
                ctx,
            }
        }

        fn elaborate(&self, decls: &[Decl]) -> Rc<Scope> {
            Namer::new(&self.table, &self.denots).elaborate(decls, &self.ctx)
        }
    }

    #[test]
    fn defs_get_method_denotations() {
        let fx = Fixture::new();
        let decls = [Decl::new(DeclKind::Def {
            name: "f".into(),
            type_params: vec![],
            params: vec![ParamDecl::new("x", TypeExpr::name("Int"))],
            implicit_params: vec![],
            result: TypeExpr::name("String"),
        })];
        let scope = fx.elaborate(&decls);

        let f = scope.lookup("f")[0];
        let info = fx.denots.at(f, fx.ctx.phase()).unwrap().info;
        assert_eq!(
            info,
            Type::method(
                vec![Type::Ref(fx.builtins.int)],
                Type::Ref(fx.builtins.string)
            )
        );
    }

    #[test]
    fn generic_defs_wrap_their_signature_in_poly() {
        let fx = Fixture::new();
        let decls = [Decl::new(DeclKind::Def {
            name: "identity".into(),
            type_params: vec![TypeParamDecl::new("T")],
            params: vec![ParamDecl::new("x", TypeExpr::name("T"))],
            implicit_params: vec![],
            result: TypeExpr::name("T"),
        })];
        let scope = fx.elaborate(&decls);

        let f = scope.lookup("identity")[0];
        let info = fx.denots.at(f, fx.ctx.phase()).unwrap().info;
        let Type::Poly { params, body } = info else {
            panic!("expected a poly type, got {info:?}");
        };
        assert_eq!(params.len(), 1);
        let t = params[0];
        assert_eq!(*body, Type::method(vec![Type::Ref(t)], Type::Ref(t)));
        // The parameter's declared bounds default to unbounded.
        assert_eq!(
            fx.denots.at(t, fx.ctx.phase()).unwrap().info,
            Type::bounds(Type::Nothing, Type::Any)
        );
    }

    #[test]
    fn overloads_enter_in_declaration_order() {
        let fx = Fixture::new();
        let def = |param: &str| {
            Decl::new(DeclKind::Def {
                name: "f".into(),
                type_params: vec![],
                params: vec![ParamDecl::new("x", TypeExpr::name(param))],
                implicit_params: vec![],
                result: TypeExpr::name("Int"),
            })
        };
        let decls = [def("Int"), def("String")];
        let scope = fx.elaborate(&decls);
        let overloads = scope.lookup("f");
        assert_eq!(overloads.len(), 2);
        let first = fx.denots.at(overloads[0], fx.ctx.phase()).unwrap().info;
        assert_eq!(
            first,
            Type::method(vec![Type::Ref(fx.builtins.int)], Type::Ref(fx.builtins.int))
        );
    }

    #[test]
    fn class_bodies_record_members_and_associated_givens() {
        let fx = Fixture::new();
        let decls = [Decl::new(DeclKind::Class {
            name: "Ord".into(),
            type_params: vec![TypeParamDecl::new("T")],
            parents: vec![],
            body: vec![Decl::new(DeclKind::Given {
                name: "intOrd".into(),
                implicit_params: vec![],
                ty: TypeExpr::applied("Ord", vec![TypeExpr::name("Int")]),
            })],
            is_abstract: true,
            is_sealed: false,
        })];
        let scope = fx.elaborate(&decls);

        let ord = scope.lookup("Ord")[0];
        assert!(fx.table.has_flag(ord, SymbolFlags::ABSTRACT));
        let givens = fx.table.associated_givens(ord);
        assert_eq!(givens.len(), 1);
        assert!(fx.table.has_flag(givens[0], SymbolFlags::GIVEN));
        let info = fx.denots.at(givens[0], fx.ctx.phase()).unwrap().info;
        assert_eq!(
            info,
            Type::applied(Type::Ref(ord), vec![Type::Ref(fx.builtins.int)])
        );
    }

    #[test]
    fn class_parents_are_recorded_in_terms_of_own_params() {
        let fx = Fixture::new();
        let decls = [
            Decl::new(DeclKind::Class {
                name: "Seq".into(),
                type_params: vec![TypeParamDecl::new("A").with_variance(Variance::Covariant)],
                parents: vec![],
                body: vec![],
                is_abstract: false,
                is_sealed: false,
            }),
            Decl::new(DeclKind::Class {
                name: "List".into(),
                type_params: vec![TypeParamDecl::new("A").with_variance(Variance::Covariant)],
                parents: vec![TypeExpr::applied("Seq", vec![TypeExpr::name("A")])],
                body: vec![],
                is_abstract: false,
                is_sealed: false,
            }),
        ];
        let scope = fx.elaborate(&decls);

        let seq = scope.lookup("Seq")[0];
        let list = scope.lookup("List")[0];
        let list_param = fx.table.type_params(list)[0];
        assert_eq!(fx.table.variance(list_param), Variance::Covariant);
        assert_eq!(
            fx.table.parents(list),
            vec![Type::applied(Type::Ref(seq), vec![Type::Ref(list_param)])]
        );
    }

    #[test]
    fn kind_mismatches_are_reported_and_recovered() {
        let fx = Fixture::new();
        let decls = [Decl::new(DeclKind::Val {
            name: "x".into(),
            mutable: false,
            declared: Some(TypeExpr::applied("Int", vec![TypeExpr::name("Int")])),
            init: None,
        })];
        let scope = fx.elaborate(&decls);

        assert_eq!(fx.ctx.error_count(), 1);
        let x = scope.lookup("x")[0];
        assert_eq!(fx.denots.at(x, fx.ctx.phase()).unwrap().info, Type::Error);
        let diagnostics = fx.ctx.take_diagnostics();
        assert!(diagnostics[0].message.contains("kind mismatch"));
    }

    #[test]
    fn unbound_type_names_are_reported() {
        let fx = Fixture::new();
        let decls = [Decl::new(DeclKind::Val {
            name: "x".into(),
            mutable: false,
            declared: Some(TypeExpr::name("Missing")),
            init: None,
        })];
        fx.elaborate(&decls);
        assert_eq!(fx.ctx.error_count(), 1);
    }

    #[test]
    fn direct_alias_cycles_are_reported() {
        let fx = Fixture::new();
        let decls = [
            Decl::new(DeclKind::TypeAlias {
                name: "A".into(),
                type_params: vec![],
                rhs: TypeExpr::name("B"),
            }),
            Decl::new(DeclKind::TypeAlias {
                name: "B".into(),
                type_params: vec![],
                rhs: TypeExpr::name("A"),
            }),
        ];
        let scope = fx.elaborate(&decls);
        assert!(fx.ctx.error_count() >= 1);
        let a = scope.lookup("A")[0];
        assert_eq!(fx.denots.at(a, fx.ctx.phase()).unwrap().info, Type::Error);
    }

    #[test]
    fn recursive_aliases_through_a_constructor_are_allowed() {
        let fx = Fixture::new();
        // type L = Unit | Pair[Int, L]
        let decls = [Decl::new(DeclKind::TypeAlias {
            name: "L".into(),
            type_params: vec![],
            rhs: TypeExpr::or(
                TypeExpr::name("Unit"),
                TypeExpr::applied(
                    "Pair",
                    vec![TypeExpr::name("Int"), TypeExpr::name("L")],
                ),
            ),
        })];
        let scope = fx.elaborate(&decls);
        assert_eq!(fx.ctx.error_count(), 0);
        let l = scope.lookup("L")[0];
        let info = fx.denots.at(l, fx.ctx.phase()).unwrap().info;
        assert!(matches!(info, Type::Or(_, _)));
    }

    #[test]
    fn imports_bring_associated_members_into_scope() {
        let fx = Fixture::new();
        let decls = [
            Decl::new(DeclKind::Class {
                name: "Show".into(),
                type_params: vec![],
                parents: vec![],
                body: vec![Decl::new(DeclKind::Given {
                    name: "showInt".into(),
                    implicit_params: vec![],
                    ty: TypeExpr::name("Show"),
                })],
                is_abstract: false,
                is_sealed: false,
            }),
            Decl::new(DeclKind::Import {
                from: "Show".into(),
                name: "showInt".into(),
            }),
        ];
        let scope = fx.elaborate(&decls);

        let imported = scope.lookup("showInt");
        assert_eq!(imported.len(), 1);
        assert!(fx.table.has_flag(imported[0], SymbolFlags::IMPORTED));
        assert_eq!(scope.imported_here(), imported);
    }
}
