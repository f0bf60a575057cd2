//! Bidirectional type checking over untyped trees.
//!
//! Every node is typed against an expectation: `Infer` synthesizes a
//! type bottom-up, `Check` pushes an expected type down and verifies
//! conformance where synthesis bottoms out. Overloaded references are
//! resolved by trying each candidate speculatively; the winner is then
//! re-typed for real so its diagnostics, bound writes, and implicit
//! witnesses commit.
//!
//! Ordinary type errors become diagnostics plus error-sentinel nodes and
//! checking continues. Only blown budgets abort the unit.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::diagnostics::{Diagnostic, Span};
use crate::error::{FatalError, Result};
use crate::sema::builtins::Builtins;
use crate::sema::constraint::{ConstraintSolver, TyVarId, VarOrigin};
use crate::sema::context::Context;
use crate::sema::denotation::{DenotError, DenotationStore, Validity};
use crate::sema::diagnostics::{SemaError, report};
use crate::sema::implicits::{ImplicitSearcher, SearchFailure, Witness};
use crate::sema::namer::resolve_type_expr;
use crate::sema::substitute::instantiate;
use crate::sema::subtype::Subtyper;
use crate::sema::symbol::{SymbolId, SymbolKind, SymbolTable};
use crate::sema::ty::{Kind, Type, TypeBounds, is_stable, kind_of, widen};
use crate::syntax::typed::{TypedTree, TypedTreeKind};
use crate::syntax::{Decl, DeclKind, Name, Tree, TreeKind};

/// Typing-recursion budget per compilation unit.
const RECURSION_LIMIT: usize = 512;

/// What the context demands of the tree being typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expected {
    /// Synthesize a type from the tree alone.
    Infer,
    /// The tree's type must conform to this one.
    Check(Type),
}

/// Counters and timing for one typer's lifetime.
#[derive(Clone, Debug, Default)]
pub struct TyperMetrics {
    pub trees_typed: u64,
    pub overload_resolutions: u64,
    pub speculative_trials: u64,
    pub implicit_searches: u64,
    pub implicit_cache_hits: u64,
    pub elapsed: Duration,
}

/// The type checker. One instance serves a compilation unit; it owns the
/// constraint solver and the implicit searcher for that unit.
pub struct Typer {
    table: Rc<SymbolTable>,
    denots: Rc<DenotationStore>,
    builtins: Builtins,
    solver: ConstraintSolver,
    implicits: ImplicitSearcher,
    depth: Cell<usize>,
    metrics: RefCell<TyperMetrics>,
}

impl Typer {
    #[must_use]
    pub fn new(table: Rc<SymbolTable>, denots: Rc<DenotationStore>, builtins: Builtins) -> Self {
        let solver = ConstraintSolver::new(Rc::clone(&table), Rc::clone(&denots));
        let implicits = ImplicitSearcher::new(Rc::clone(&table), Rc::clone(&denots));
        Self {
            table,
            denots,
            builtins,
            solver,
            implicits,
            depth: Cell::new(0),
            metrics: RefCell::new(TyperMetrics::default()),
        }
    }

    #[must_use]
    pub fn solver(&self) -> &ConstraintSolver {
        &self.solver
    }

    /// Metrics snapshot, with the searcher's counters folded in.
    #[must_use]
    pub fn metrics(&self) -> TyperMetrics {
        let mut metrics = self.metrics.borrow().clone();
        let stats = self.implicits.stats();
        metrics.implicit_searches = stats.searches;
        metrics.implicit_cache_hits = stats.cache_hits;
        metrics
    }

    /// Type one top-level tree and close out its inference scope: solve
    /// leftover variables, report the underconstrained ones, resolve the
    /// tree, and drop per-unit state.
    pub fn type_unit(&self, tree: &Tree, expected: &Expected, ctx: &Context) -> TypedTree {
        let start = Instant::now();
        let typed = match self.typed(tree, expected, ctx) {
            Ok(typed) => typed,
            Err(error) => {
                ctx.report(Diagnostic::error(error.to_string(), tree.span));
                TypedTree::error(tree.span)
            }
        };
        for (_, origin) in self.solver.solve_remaining(ctx.phase()) {
            report(
                ctx,
                &self.table,
                SemaError::Underconstrained {
                    param: origin.param,
                },
                origin.span.or(tree.span),
            );
        }
        let resolved = self.resolve_tree(typed);
        self.solver.clear_undo();
        self.implicits.clear_cache();
        self.metrics.borrow_mut().elapsed += start.elapsed();
        resolved
    }

    /// Type `tree` against `expected`.
    ///
    /// `Err` means a blown budget; everything else is reported through
    /// the context's sink with an error node in the result.
    pub fn typed(&self, tree: &Tree, expected: &Expected, ctx: &Context) -> Result<TypedTree> {
        let depth = self.depth.get();
        if depth >= RECURSION_LIMIT {
            return Err(FatalError::RecursionLimitExceeded { depth }.into());
        }
        self.depth.set(depth + 1);
        self.metrics.borrow_mut().trees_typed += 1;
        let result = self.typed_inner(tree, expected, ctx);
        self.depth.set(depth);
        result
    }

    fn typed_inner(&self, tree: &Tree, expected: &Expected, ctx: &Context) -> Result<TypedTree> {
        let span = tree.span;
        match &tree.kind {
            TreeKind::IntLit(value) => Ok(self.literal(
                TypedTreeKind::IntLit(*value),
                self.builtins.int_literal(*value),
                expected,
                span,
                ctx,
            )),
            TreeKind::StrLit(value) => Ok(self.literal(
                TypedTreeKind::StrLit(value.clone()),
                self.builtins.str_literal(value.clone()),
                expected,
                span,
                ctx,
            )),
            TreeKind::BoolLit(value) => Ok(self.literal(
                TypedTreeKind::BoolLit(*value),
                self.builtins.bool_literal(*value),
                expected,
                span,
                ctx,
            )),
            TreeKind::UnitLit => Ok(self.literal(
                TypedTreeKind::UnitLit,
                self.builtins.unit_type(),
                expected,
                span,
                ctx,
            )),
            TreeKind::Ident(name) => self.type_ident(name, expected, span, ctx),
            TreeKind::Apply { fun, args } => self.type_apply(fun, args, expected, span, ctx),
            TreeKind::TypeApply { fun, args } => {
                let fun_tree = self.typed(fun, &Expected::Infer, ctx)?;
                let fun_ty = self.solver.resolve(&fun_tree.ty);
                let (params, body) = match fun_ty {
                    Type::Poly { params, body } => (params, body),
                    other => {
                        report(
                            ctx,
                            &self.table,
                            SemaError::KindMismatch {
                                expected: Kind::Constructor(args.len()),
                                found: kind_of(&other, &self.table),
                            },
                            span,
                        );
                        return Ok(TypedTree::error(span));
                    }
                };
                if params.len() != args.len() {
                    report(
                        ctx,
                        &self.table,
                        SemaError::KindMismatch {
                            expected: Kind::Constructor(params.len()),
                            found: Kind::Constructor(args.len()),
                        },
                        span,
                    );
                    return Ok(TypedTree::error(span));
                }
                let scope = ctx.scope();
                let resolved: Vec<Type> = args
                    .iter()
                    .map(|arg| resolve_type_expr(arg, &scope, &self.table, ctx))
                    .collect();
                self.check_type_args(&params, &resolved, span, ctx);
                let instantiated = instantiate(&params, &resolved, &body);
                let node = TypedTree::new(
                    TypedTreeKind::TypeApply {
                        fun: Box::new(fun_tree),
                        args: resolved,
                    },
                    instantiated,
                    span,
                );
                Ok(self.conformed(node, expected, ctx))
            }
            TreeKind::Ascribe { expr, ty } => {
                let scope = ctx.scope();
                let ascribed = resolve_type_expr(ty, &scope, &self.table, ctx);
                let inner = self.typed(expr, &Expected::Check(ascribed.clone()), ctx)?;
                let node = TypedTree::new(
                    TypedTreeKind::Ascribed {
                        expr: Box::new(inner),
                    },
                    ascribed,
                    span,
                );
                Ok(self.conformed(node, expected, ctx))
            }
        }
    }

    /// Type the initializers of value declarations, installing inferred
    /// denotations for the un-annotated ones.
    pub fn check_declarations(&self, decls: &[Decl], ctx: &Context) {
        for decl in decls {
            let DeclKind::Val {
                name,
                mutable,
                declared,
                init,
            } = &decl.kind
            else {
                continue;
            };
            let Some(init) = init else {
                continue;
            };
            let Some(sym) = self.value_symbol(name, ctx) else {
                continue;
            };
            if declared.is_some() {
                let declared_ty = match self.denots.at(sym, ctx.phase()) {
                    Ok(denot) => denot.info,
                    Err(_) => Type::Error,
                };
                self.type_unit(init, &Expected::Check(declared_ty), ctx);
            } else {
                let typed = self.type_unit(init, &Expected::Infer, ctx);
                let inferred = if *mutable && ctx.language().widen_mutable {
                    widen(&typed.ty, &self.table, &self.denots, ctx.phase())
                } else {
                    typed.ty
                };
                trace!(symbol = %sym, "inferred value type");
                self.denots
                    .install(sym, inferred, Validity::from(ctx.phase()));
            }
        }
    }

    fn value_symbol(&self, name: &Name, ctx: &Context) -> Option<SymbolId> {
        ctx.scope()
            .lookup(name)
            .into_iter()
            .find(|sym| self.table.kind(*sym) == SymbolKind::Value)
    }

    fn literal(
        &self,
        kind: TypedTreeKind,
        ty: Type,
        expected: &Expected,
        span: Option<Span>,
        ctx: &Context,
    ) -> TypedTree {
        self.conformed(TypedTree::new(kind, ty, span), expected, ctx)
    }

    /// Verify the node against the expectation, narrowing any variables
    /// the expected type mentions. Failure reports and degrades the node
    /// to the error sentinel.
    fn conformed(&self, node: TypedTree, expected: &Expected, ctx: &Context) -> TypedTree {
        let Expected::Check(target) = expected else {
            return node;
        };
        let subtyper = self.subtyper(ctx);
        if subtyper.is_subtype(&node.ty, target) {
            return node;
        }
        report(
            ctx,
            &self.table,
            SemaError::TypeMismatch {
                found: self.solver.resolve(&node.ty),
                expected: self.solver.resolve(target),
            },
            node.span,
        );
        TypedTree::error(node.span)
    }

    fn type_ident(
        &self,
        name: &Name,
        expected: &Expected,
        span: Option<Span>,
        ctx: &Context,
    ) -> Result<TypedTree> {
        let candidates = self.term_candidates(name, ctx);
        if candidates.is_empty() {
            report(
                ctx,
                &self.table,
                SemaError::UnboundIdentifier { name: name.clone() },
                span,
            );
            return Ok(TypedTree::error(span));
        }
        if let [only] = candidates[..] {
            return self.reference(only, expected, span, ctx);
        }
        // An overloaded bare reference only disambiguates against an
        // expected type.
        if matches!(expected, Expected::Infer) {
            report(
                ctx,
                &self.table,
                SemaError::AmbiguousOverload {
                    name: name.clone(),
                    candidates,
                },
                span,
            );
            return Ok(TypedTree::error(span));
        }
        let mut survivors = Vec::new();
        for sym in &candidates {
            let snapshot = self.solver.snapshot();
            let trial = ctx.speculative(|sctx| self.reference(*sym, expected, span, sctx));
            self.metrics.borrow_mut().speculative_trials += 1;
            let failed = trial.failed();
            let outcome = trial.abandon();
            self.solver.rollback_to(snapshot);
            let node = outcome?;
            if !failed && !node.is_error() {
                survivors.push((*sym, vec![node.ty]));
            }
        }
        match self.pick_winner(name, &survivors, &candidates, span, ctx) {
            Some(winner) => self.reference(winner, expected, span, ctx),
            None => Ok(TypedTree::error(span)),
        }
    }

    fn reference(
        &self,
        sym: SymbolId,
        expected: &Expected,
        span: Option<Span>,
        ctx: &Context,
    ) -> Result<TypedTree> {
        let info = match self.denots.at(sym, ctx.phase()) {
            Ok(denot) => denot.info,
            Err(DenotError::Cyclic(symbol)) => {
                report(
                    ctx,
                    &self.table,
                    SemaError::CyclicReference { symbol },
                    span,
                );
                return Ok(TypedTree::error(span));
            }
            Err(DenotError::Missing(symbol)) => {
                return Err(crate::error::Error::internal(format!(
                    "no denotation for {}",
                    self.table.describe(symbol)
                )));
            }
        };
        let ty = if self.table.kind(sym) == SymbolKind::Value && is_stable(sym, &self.table) {
            Type::Singleton(sym)
        } else {
            info
        };
        let node = TypedTree::new(TypedTreeKind::Ref(sym), ty, span);
        Ok(self.conformed(node, expected, ctx))
    }

    fn term_candidates(&self, name: &str, ctx: &Context) -> Vec<SymbolId> {
        ctx.scope()
            .lookup(name)
            .into_iter()
            .filter(|sym| self.table.kind(*sym).is_term())
            .collect()
    }

    fn type_apply(
        &self,
        fun: &Tree,
        args: &[Tree],
        expected: &Expected,
        span: Option<Span>,
        ctx: &Context,
    ) -> Result<TypedTree> {
        let TreeKind::Ident(name) = &fun.kind else {
            // Applying a computed value: type the function first.
            let fun_tree = self.typed(fun, &Expected::Infer, ctx)?;
            if fun_tree.is_error() {
                return Ok(TypedTree::error(span));
            }
            let info = self.solver.resolve(&fun_tree.ty);
            return self.apply_signature(info, fun_tree, args, expected, span, ctx);
        };

        let candidates = self.term_candidates(name, ctx);
        if candidates.is_empty() {
            report(
                ctx,
                &self.table,
                SemaError::UnboundIdentifier { name: name.clone() },
                span,
            );
            return Ok(TypedTree::error(span));
        }
        if let [only] = candidates[..] {
            return self.apply_candidate(only, args, expected, span, ctx);
        }

        // Overload resolution: arity filters first, then one speculative
        // trial per remaining candidate.
        self.metrics.borrow_mut().overload_resolutions += 1;
        let viable: Vec<(SymbolId, Vec<Type>)> = candidates
            .iter()
            .filter_map(|sym| {
                self.candidate_params(*sym, ctx)
                    .filter(|params| params.len() == args.len())
                    .map(|params| (*sym, params))
            })
            .collect();
        if viable.is_empty() {
            report(
                ctx,
                &self.table,
                SemaError::NoApplicableOverload {
                    name: name.clone(),
                    candidates,
                },
                span,
            );
            return Ok(TypedTree::error(span));
        }

        let mut survivors = Vec::new();
        for (sym, params) in viable {
            let snapshot = self.solver.snapshot();
            let trial =
                ctx.speculative(|sctx| self.apply_candidate(sym, args, expected, span, sctx));
            self.metrics.borrow_mut().speculative_trials += 1;
            let failed = trial.failed();
            let outcome = trial.abandon();
            self.solver.rollback_to(snapshot);
            let node = outcome?;
            if !failed && !node.is_error() {
                survivors.push((sym, params));
            }
        }
        match self.pick_winner(name, &survivors, &candidates, span, ctx) {
            Some(winner) => {
                debug!(symbol = %winner, name, "overload resolved");
                self.apply_candidate(winner, args, expected, span, ctx)
            }
            None => Ok(TypedTree::error(span)),
        }
    }

    /// Declared explicit parameter types of a candidate, seen through a
    /// polymorphic wrapper. `None` for non-method candidates.
    fn candidate_params(&self, sym: SymbolId, ctx: &Context) -> Option<Vec<Type>> {
        let info = self.denots.at(sym, ctx.phase()).ok()?.info;
        let sig = match info {
            Type::Poly { body, .. } => *body,
            other => other,
        };
        match sig {
            Type::Method {
                params,
                implicit: false,
                ..
            } => Some(params),
            _ => None,
        }
    }

    /// Resolve a survivor set to a single winner, reporting no-applicable
    /// and ambiguity failures.
    fn pick_winner(
        &self,
        name: &Name,
        survivors: &[(SymbolId, Vec<Type>)],
        candidates: &[SymbolId],
        span: Option<Span>,
        ctx: &Context,
    ) -> Option<SymbolId> {
        match survivors {
            [] => {
                report(
                    ctx,
                    &self.table,
                    SemaError::NoApplicableOverload {
                        name: name.clone(),
                        candidates: candidates.to_vec(),
                    },
                    span,
                );
                None
            }
            [(only, _)] => Some(*only),
            _ => match self.most_specific(survivors, ctx) {
                Some(winner) => Some(winner),
                None => {
                    report(
                        ctx,
                        &self.table,
                        SemaError::AmbiguousOverload {
                            name: name.clone(),
                            candidates: survivors.iter().map(|(sym, _)| *sym).collect(),
                        },
                        span,
                    );
                    None
                }
            },
        }
    }

    /// The survivor whose parameter types are pointwise subtypes of every
    /// other's, if exactly one exists.
    fn most_specific(
        &self,
        survivors: &[(SymbolId, Vec<Type>)],
        ctx: &Context,
    ) -> Option<SymbolId> {
        let subtyper = self.subtyper(ctx);
        let at_least_as_specific = |a: &[Type], b: &[Type]| {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|(lhs, rhs)| subtyper.is_subtype(lhs, rhs))
        };
        let winners: Vec<SymbolId> = survivors
            .iter()
            .filter(|(sym, params)| {
                survivors
                    .iter()
                    .filter(|(other, _)| other != sym)
                    .all(|(_, other_params)| at_least_as_specific(params, other_params))
            })
            .map(|(sym, _)| *sym)
            .collect();
        match winners[..] {
            [winner] => Some(winner),
            _ => None,
        }
    }

    fn apply_candidate(
        &self,
        sym: SymbolId,
        args: &[Tree],
        expected: &Expected,
        span: Option<Span>,
        ctx: &Context,
    ) -> Result<TypedTree> {
        let info = match self.denots.at(sym, ctx.phase()) {
            Ok(denot) => denot.info,
            Err(DenotError::Cyclic(symbol)) => {
                report(
                    ctx,
                    &self.table,
                    SemaError::CyclicReference { symbol },
                    span,
                );
                return Ok(TypedTree::error(span));
            }
            Err(DenotError::Missing(symbol)) => {
                return Err(crate::error::Error::internal(format!(
                    "no denotation for {}",
                    self.table.describe(symbol)
                )));
            }
        };
        let fun_node = TypedTree::new(TypedTreeKind::Ref(sym), info.clone(), span);
        self.apply_signature(info, fun_node, args, expected, span, ctx)
    }

    /// Apply a function value of type `info` to `args`: instantiate a
    /// polymorphic signature with fresh variables, check arguments, fill
    /// implicit parameters, verify the expectation, then freeze the
    /// variables this application opened.
    fn apply_signature(
        &self,
        info: Type,
        fun_node: TypedTree,
        args: &[Tree],
        expected: &Expected,
        span: Option<Span>,
        ctx: &Context,
    ) -> Result<TypedTree> {
        let mut opened: Vec<TyVarId> = Vec::new();
        let sig = match info {
            Type::Poly { params, body } => {
                let fresh: Vec<Type> = params
                    .iter()
                    .map(|param| {
                        let origin = VarOrigin::for_param(
                            *param,
                            self.table.default_arg(*param),
                            span,
                        );
                        let var = self.solver.open(self.param_bounds(*param, ctx), origin);
                        opened.push(var);
                        Type::Var(var)
                    })
                    .collect();
                instantiate(&params, &fresh, &body)
            }
            other => other,
        };
        let (params, result) = match sig {
            Type::Method {
                params,
                result,
                implicit: false,
            } => (params, result),
            other => {
                report(
                    ctx,
                    &self.table,
                    SemaError::TypeMismatch {
                        found: self.solver.resolve(&other),
                        expected: Type::method(vec![Type::Any; args.len()], Type::Any),
                    },
                    span,
                );
                return Ok(TypedTree::error(span));
            }
        };
        if params.len() != args.len() {
            report(
                ctx,
                &self.table,
                SemaError::TypeMismatch {
                    found: Type::Method {
                        params,
                        result,
                        implicit: false,
                    },
                    expected: Type::method(vec![Type::Any; args.len()], Type::Any),
                },
                span,
            );
            return Ok(TypedTree::error(span));
        }

        let mut typed_args = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(params.iter()) {
            typed_args.push(self.typed(arg, &Expected::Check(param.clone()), ctx)?);
        }

        // Peel the implicit section, then verify the visible result
        // against the expectation before solving, so the expected type
        // still constrains the variables.
        let (implicit_params, result_ty) = match *result {
            Type::Method {
                params,
                result,
                implicit: true,
            } => (params, *result),
            other => (Vec::new(), other),
        };

        if let Expected::Check(target) = expected {
            let subtyper = self.subtyper(ctx);
            if !subtyper.is_subtype(&result_ty, target) {
                report(
                    ctx,
                    &self.table,
                    SemaError::TypeMismatch {
                        found: self.solver.resolve(&result_ty),
                        expected: self.solver.resolve(target),
                    },
                    span,
                );
                return Ok(TypedTree::error(span));
            }
        }

        let mut implicit_args = Vec::with_capacity(implicit_params.len());
        for param in &implicit_params {
            let required = self.solver.resolve(param);
            match self.implicits.search(&required, &self.solver, ctx)? {
                Ok(witness) => implicit_args.push(self.witness_tree(&witness, span)),
                Err(failure) => {
                    self.report_search_failure(&required, failure, span, ctx);
                    implicit_args.push(TypedTree::error(span));
                }
            }
        }

        for var in opened {
            let solution = self.solver.solve(var, ctx.phase());
            let origin = self.solver.origin_of(var);
            if solution == Type::Any && origin.require_precision && origin.default.is_none() {
                report(
                    ctx,
                    &self.table,
                    SemaError::Underconstrained {
                        param: origin.param,
                    },
                    span,
                );
            }
        }

        let node_ty = self.solver.resolve(&result_ty);
        Ok(TypedTree::new(
            TypedTreeKind::Apply {
                fun: Box::new(fun_node),
                args: typed_args,
                implicit_args,
            },
            node_ty,
            span,
        ))
    }

    fn report_search_failure(
        &self,
        required: &Type,
        failure: SearchFailure,
        span: Option<Span>,
        ctx: &Context,
    ) {
        let error = match failure {
            SearchFailure::NotFound => SemaError::NoImplicitFound {
                required: required.clone(),
            },
            SearchFailure::Ambiguous { candidates } => SemaError::AmbiguousImplicit {
                required: required.clone(),
                candidates,
            },
            SearchFailure::Divergent => SemaError::DivergentImplicitSearch {
                required: required.clone(),
            },
        };
        report(ctx, &self.table, error, span);
    }

    /// Render a witness as the tree the backend will see.
    fn witness_tree(&self, witness: &Witness, span: Option<Span>) -> TypedTree {
        let reference = TypedTree::new(
            TypedTreeKind::ImplicitRef(witness.symbol),
            witness.ty.clone(),
            span,
        );
        if witness.arguments.is_empty() {
            return reference;
        }
        let implicit_args = witness
            .arguments
            .iter()
            .map(|arg| self.witness_tree(arg, span))
            .collect();
        TypedTree::new(
            TypedTreeKind::Apply {
                fun: Box::new(reference),
                args: Vec::new(),
                implicit_args,
            },
            witness.ty.clone(),
            span,
        )
    }

    /// Explicit type arguments must sit within the declared bounds after
    /// substitution.
    fn check_type_args(
        &self,
        params: &[SymbolId],
        args: &[Type],
        span: Option<Span>,
        ctx: &Context,
    ) {
        let subtyper = self.subtyper(ctx);
        for (param, arg) in params.iter().zip(args.iter()) {
            let bounds = self.param_bounds(*param, ctx);
            let lo = instantiate(params, args, &bounds.lo);
            let hi = instantiate(params, args, &bounds.hi);
            if !subtyper.is_subtype(arg, &hi) || !subtyper.is_subtype(&lo, arg) {
                report(
                    ctx,
                    &self.table,
                    SemaError::TypeMismatch {
                        found: arg.clone(),
                        expected: Type::bounds(lo, hi),
                    },
                    span,
                );
            }
        }
    }

    fn param_bounds(&self, param: SymbolId, ctx: &Context) -> TypeBounds {
        match self.denots.at(param, ctx.phase()) {
            Ok(denot) => match denot.info {
                Type::Bounds(bounds) => *bounds,
                other => TypeBounds::upper(other),
            },
            Err(_) => TypeBounds::unbounded(),
        }
    }

    fn subtyper<'a>(&'a self, ctx: &'a Context) -> Subtyper<'a> {
        Subtyper::new(&self.table, &self.denots, &self.solver, ctx)
    }

    /// Replace solved variables throughout a finished tree.
    fn resolve_tree(&self, tree: TypedTree) -> TypedTree {
        let TypedTree { kind, ty, span } = tree;
        let kind = match kind {
            TypedTreeKind::Apply {
                fun,
                args,
                implicit_args,
            } => TypedTreeKind::Apply {
                fun: Box::new(self.resolve_tree(*fun)),
                args: args.into_iter().map(|arg| self.resolve_tree(arg)).collect(),
                implicit_args: implicit_args
                    .into_iter()
                    .map(|arg| self.resolve_tree(arg))
                    .collect(),
            },
            TypedTreeKind::TypeApply { fun, args } => TypedTreeKind::TypeApply {
                fun: Box::new(self.resolve_tree(*fun)),
                args: args.iter().map(|arg| self.solver.resolve(arg)).collect(),
            },
            TypedTreeKind::Ascribed { expr } => TypedTreeKind::Ascribed {
                expr: Box::new(self.resolve_tree(*expr)),
            },
            other => other,
        };
        TypedTree {
            kind,
            ty: self.solver.resolve(&ty),
            span,
        }
    }
}
