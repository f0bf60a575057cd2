//! The subtyping relation.
//!
//! Structural comparison with a nominal fallback through declared
//! parents. The relation is decided, never thrown: `false` means the
//! caller decides whether that is a reportable error or a failed
//! speculative alternative. Recursive type definitions are handled
//! co-inductively: a pair that recurs on itself before resolving is
//! assumed to hold, which is what lets `type L = Unit | Pair[Int, L]`
//! check against itself without overflowing.

use std::cell::RefCell;
use std::collections::HashSet;

use tracing::trace;

use crate::sema::constraint::ConstraintSolver;
use crate::sema::context::Context;
use crate::sema::denotation::DenotationStore;
use crate::sema::substitute::{beta_reduce, expand_alias, instantiate};
use crate::sema::symbol::{SymbolKind, SymbolTable};
use crate::sema::ty::{Type, TypeBounds};
use crate::syntax::Variance;

/// One subtyping query's working state. Cheap to build per query site.
pub struct Subtyper<'a> {
    table: &'a SymbolTable,
    denots: &'a DenotationStore,
    solver: &'a ConstraintSolver,
    ctx: &'a Context,
    /// Pairs currently being compared, for the co-inductive assumption.
    comparing: RefCell<HashSet<(Type, Type)>>,
}

impl<'a> Subtyper<'a> {
    #[must_use]
    pub fn new(
        table: &'a SymbolTable,
        denots: &'a DenotationStore,
        solver: &'a ConstraintSolver,
        ctx: &'a Context,
    ) -> Self {
        Self {
            table,
            denots,
            solver,
            ctx,
            comparing: RefCell::new(HashSet::new()),
        }
    }

    /// Whether `lhs` is a subtype of `rhs`.
    #[must_use]
    pub fn is_subtype(&self, lhs: &Type, rhs: &Type) -> bool {
        let lhs = self.solver.resolve(lhs);
        let rhs = self.solver.resolve(rhs);

        // Fast paths: identity, the error sentinel, top and bottom.
        if lhs == rhs || lhs.is_error() || rhs.is_error() {
            return true;
        }
        if lhs == Type::Nothing || rhs == Type::Any {
            return true;
        }

        let pair = (lhs.clone(), rhs.clone());
        if !self.comparing.borrow_mut().insert(pair.clone()) {
            // The same obligation recurred before resolving: assume it.
            trace!(?lhs, ?rhs, "co-inductive assumption");
            return true;
        }
        let holds = self.compare(&lhs, &rhs);
        self.comparing.borrow_mut().remove(&pair);
        trace!(?lhs, ?rhs, holds, "subtype");
        holds
    }

    fn compare(&self, lhs: &Type, rhs: &Type) -> bool {
        // Unsolved type variables defer into the solver instead of
        // failing: the bound is recorded, then verified.
        if let Type::Var(var) = lhs {
            let merged = self.solver.narrow_upper(*var, rhs);
            if self.is_subtype(&merged.lo, &merged.hi) {
                return true;
            }
            self.solver.retract_last(*var);
            return false;
        }
        if let Type::Var(var) = rhs {
            let merged = self.solver.narrow_lower(*var, lhs);
            if self.is_subtype(&merged.lo, &merged.hi) {
                return true;
            }
            self.solver.retract_last(*var);
            return false;
        }

        // Aliases expand lazily; the comparing set bounds recursion for
        // self-referential definitions.
        if let Ok(Some(expanded)) = expand_alias(lhs, self.table, self.denots, self.ctx.phase()) {
            return self.is_subtype(&expanded, rhs);
        }
        if let Ok(Some(expanded)) = expand_alias(rhs, self.table, self.denots, self.ctx.phase()) {
            return self.is_subtype(lhs, &expanded);
        }
        if let Ok(Some(reduced)) = beta_reduce(lhs) {
            return self.is_subtype(&reduced, rhs);
        }
        if let Ok(Some(reduced)) = beta_reduce(rhs) {
            return self.is_subtype(lhs, &reduced);
        }

        // Union on the left and intersection on the right need both
        // halves; the distributing orientations need only one.
        if let Type::Or(l, r) = lhs {
            return self.is_subtype(l, rhs) && self.is_subtype(r, rhs);
        }
        if let Type::And(l, r) = rhs {
            return self.is_subtype(lhs, l) && self.is_subtype(lhs, r);
        }
        if let Type::Or(l, r) = rhs {
            if self.is_subtype(lhs, l) || self.is_subtype(lhs, r) {
                return true;
            }
        }
        if let Type::And(l, r) = lhs {
            if self.is_subtype(l, rhs) || self.is_subtype(r, rhs) {
                return true;
            }
        }

        // Wildcard bounds: membership on the right, upper bound on the
        // left.
        if let Type::Bounds(bounds) = rhs {
            return self.is_subtype(&bounds.lo, lhs) && self.is_subtype(lhs, &bounds.hi);
        }
        if let Type::Bounds(bounds) = lhs {
            return self.is_subtype(&bounds.hi, rhs);
        }

        match (lhs, rhs) {
            // Singletons compare by term identity; no structural descent.
            (Type::Singleton(l), Type::Singleton(r)) => l == r,
            (
                Type::Method {
                    params: lp,
                    result: lr,
                    implicit: li,
                },
                Type::Method {
                    params: rp,
                    result: rr,
                    implicit: ri,
                },
            ) => {
                li == ri
                    && lp.len() == rp.len()
                    && lp
                        .iter()
                        .zip(rp.iter())
                        .all(|(l, r)| self.is_subtype(r, l))
                    && self.is_subtype(lr, rr)
            }
            (
                Type::Poly {
                    params: lp,
                    body: lb,
                },
                Type::Poly {
                    params: rp,
                    body: rb,
                },
            ) => {
                lp.len() == rp.len() && {
                    let renamed_args: Vec<Type> = lp.iter().copied().map(Type::Ref).collect();
                    let renamed = instantiate(rp, &renamed_args, rb);
                    self.is_subtype(lb, &renamed)
                }
            }
            (
                Type::Lambda {
                    params: lp,
                    body: lb,
                },
                Type::Lambda {
                    params: rp,
                    body: rb,
                },
            ) => {
                lp.len() == rp.len() && {
                    let rsyms: Vec<_> = rp.iter().map(|p| p.sym).collect();
                    let renamed_args: Vec<Type> =
                        lp.iter().map(|p| Type::Ref(p.sym)).collect();
                    let renamed = instantiate(&rsyms, &renamed_args, rb);
                    self.is_subtype(lb, &renamed)
                }
            }
            (
                Type::Refined {
                    base: lbase,
                    member: lmember,
                    info: linfo,
                },
                Type::Refined {
                    base: rbase,
                    member: rmember,
                    info: rinfo,
                },
            ) if lmember == rmember => {
                self.is_subtype(lbase, rbase) && self.is_subtype(linfo, rinfo)
            }
            // A refinement is at least its base.
            (Type::Refined { base, .. }, _) => self.is_subtype(base, rhs),
            _ => self.compare_nominal(lhs, rhs),
        }
    }

    /// Applied/bare constructor comparison plus the nominal fallback
    /// through declared parents.
    fn compare_nominal(&self, lhs: &Type, rhs: &Type) -> bool {
        // Literal types widen to their class once exact equality has
        // been ruled out by the fast path.
        if let Type::Literal(lit) = lhs {
            return self.is_subtype(&Type::Ref(lit.class), rhs);
        }
        // A singleton is a subtype of whatever its underlying term's
        // type is a subtype of.
        if let Type::Singleton(sym) = lhs {
            if let Ok(denot) = self.denots.at(*sym, self.ctx.phase()) {
                if denot.info != *lhs {
                    return self.is_subtype(&denot.info, rhs);
                }
            }
            return false;
        }

        // Type parameters relate through their declared bounds.
        if let Type::Ref(sym) = lhs {
            if self.table.kind(*sym) == SymbolKind::TypeParam {
                let bounds = self.param_bounds(*sym);
                return self.is_subtype(&bounds.hi, rhs);
            }
        }
        if let Type::Ref(sym) = rhs {
            if self.table.kind(*sym) == SymbolKind::TypeParam {
                let bounds = self.param_bounds(*sym);
                return bounds.lo != Type::Nothing && self.is_subtype(lhs, &bounds.lo);
            }
        }

        let (lctor, largs) = constructor_of(lhs);
        let (rctor, rargs) = constructor_of(rhs);
        let (Some(lsym), Some(rsym)) = (lctor, rctor) else {
            return false;
        };

        if lsym == rsym {
            if largs.len() != rargs.len() {
                return false;
            }
            let params = self.table.type_params(lsym);
            return largs.iter().zip(rargs.iter()).enumerate().all(|(i, (l, r))| {
                let variance = params
                    .get(i)
                    .map_or(Variance::Invariant, |param| self.table.variance(*param));
                self.compare_argument(l, r, variance)
            });
        }

        // Different constructors: retry against each declared parent of
        // the left constructor, instantiated with the left's arguments.
        let params = self.table.type_params(lsym);
        self.table.parents(lsym).iter().any(|parent| {
            let instantiated = if params.is_empty() {
                parent.clone()
            } else {
                instantiate(&params, &largs, parent)
            };
            self.is_subtype(&instantiated, rhs)
        })
    }

    fn compare_argument(&self, lhs: &Type, rhs: &Type, variance: Variance) -> bool {
        // A wildcard argument on the right admits anything within its
        // bounds regardless of the parameter's variance.
        if let Type::Bounds(bounds) = rhs {
            return self.is_subtype(&bounds.lo, lhs) && self.is_subtype(lhs, &bounds.hi);
        }
        match variance {
            Variance::Covariant => self.is_subtype(lhs, rhs),
            Variance::Contravariant => self.is_subtype(rhs, lhs),
            Variance::Invariant => {
                if self.ctx.language().strict_variance {
                    self.is_subtype(lhs, rhs) && self.is_subtype(rhs, lhs)
                } else {
                    self.is_subtype(lhs, rhs)
                }
            }
        }
    }

    fn param_bounds(&self, sym: crate::sema::symbol::SymbolId) -> TypeBounds {
        match self.denots.at(sym, self.ctx.phase()) {
            Ok(denot) => match denot.info {
                Type::Bounds(bounds) => *bounds,
                other => TypeBounds::upper(other),
            },
            Err(_) => TypeBounds::unbounded(),
        }
    }

    /// Least upper bound: the more general of the two when they relate,
    /// otherwise their union.
    #[must_use]
    pub fn lub(&self, lhs: &Type, rhs: &Type) -> Type {
        if self.is_subtype(lhs, rhs) {
            rhs.clone()
        } else if self.is_subtype(rhs, lhs) {
            lhs.clone()
        } else {
            Type::or(lhs.clone(), rhs.clone())
        }
    }

    /// Greatest lower bound: the more specific of the two when they
    /// relate, otherwise their intersection.
    #[must_use]
    pub fn glb(&self, lhs: &Type, rhs: &Type) -> Type {
        if self.is_subtype(lhs, rhs) {
            lhs.clone()
        } else if self.is_subtype(rhs, lhs) {
            rhs.clone()
        } else {
            Type::and(lhs.clone(), rhs.clone())
        }
    }
}

/// The named constructor and argument list of an applied or bare
/// reference, if it has one.
fn constructor_of(ty: &Type) -> (Option<crate::sema::symbol::SymbolId>, Vec<Type>) {
    match ty {
        Type::Ref(sym) => (Some(*sym), Vec::new()),
        Type::Applied { ctor, args } => match ctor.as_ref() {
            Type::Ref(sym) => (Some(*sym), args.clone()),
            _ => (None, Vec::new()),
        },
        _ => (None, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageSettings;
    use crate::sema::denotation::{Phase, Validity};
    use crate::sema::scope::Scope;
    use crate::sema::symbol::{SymbolFlags, SymbolId, SymbolKind};
    use std::rc::Rc;

    struct Fixture {
        table: Rc<SymbolTable>,
        denots: Rc<DenotationStore>,
        solver: ConstraintSolver,
        ctx: Context,
    }

    impl Fixture {
        fn new() -> Self {
            let table = Rc::new(SymbolTable::new());
            let denots = Rc::new(DenotationStore::new());
            let solver = ConstraintSolver::new(Rc::clone(&table), Rc::clone(&denots));
            let ctx = Context::root(Scope::root(), LanguageSettings::default())
                .with_phase(Phase::TYPER);
            Self {
                table,
                denots,
                solver,
                ctx,
            }
        }

        fn class(&self, name: &str) -> SymbolId {
            self.table
                .create(SymbolId::ROOT, name, SymbolKind::Class, SymbolFlags::empty())
        }

        fn subtyper(&self) -> Subtyper<'_> {
            Subtyper::new(&self.table, &self.denots, &self.solver, &self.ctx)
        }
    }

    #[test]
    fn reflexive_and_sentinel_cases() {
        let fx = Fixture::new();
        let int = Type::Ref(fx.class("Int"));
        let sub = fx.subtyper();

        assert!(sub.is_subtype(&int, &int));
        assert!(sub.is_subtype(&Type::Error, &int));
        assert!(sub.is_subtype(&int, &Type::Error));
        assert!(sub.is_subtype(&Type::Nothing, &int));
        assert!(sub.is_subtype(&int, &Type::Any));
        assert!(!sub.is_subtype(&Type::Any, &int));
    }

    #[test]
    fn union_and_intersection_distribution() {
        let fx = Fixture::new();
        let a = Type::Ref(fx.class("A"));
        let b = Type::Ref(fx.class("B"));
        let sub = fx.subtyper();

        assert!(sub.is_subtype(&a, &Type::or(a.clone(), b.clone())));
        assert!(sub.is_subtype(&Type::and(a.clone(), b.clone()), &a));
        assert!(sub.is_subtype(&Type::and(a.clone(), b.clone()), &b));
        // Left union requires both halves.
        assert!(!sub.is_subtype(&Type::or(a.clone(), b.clone()), &a));
        // Right intersection requires both halves.
        assert!(!sub.is_subtype(&a, &Type::and(a.clone(), b.clone())));
    }

    #[test]
    fn nominal_fallback_walks_instantiated_parents() {
        let fx = Fixture::new();
        let any_seq = fx.class("Seq");
        let seq_param = fx
            .table
            .create(any_seq, "A", SymbolKind::TypeParam, SymbolFlags::PARAM);
        fx.table.set_type_params(any_seq, vec![seq_param]);
        fx.table.set_variance(seq_param, Variance::Covariant);

        let list = fx.class("List");
        let list_param = fx
            .table
            .create(list, "A", SymbolKind::TypeParam, SymbolFlags::PARAM);
        fx.table.set_type_params(list, vec![list_param]);
        fx.table.set_variance(list_param, Variance::Covariant);
        // class List[+A] extends Seq[A]
        fx.table.add_parent(
            list,
            Type::applied(Type::Ref(any_seq), vec![Type::Ref(list_param)]),
        );

        let int = Type::Ref(fx.class("Int"));
        let sub = fx.subtyper();
        let list_int = Type::applied(Type::Ref(list), vec![int.clone()]);
        let seq_int = Type::applied(Type::Ref(any_seq), vec![int.clone()]);
        let seq_any = Type::applied(Type::Ref(any_seq), vec![Type::Any]);

        assert!(sub.is_subtype(&list_int, &seq_int));
        assert!(sub.is_subtype(&list_int, &seq_any), "covariance composes");
        assert!(!sub.is_subtype(&seq_int, &list_int));
    }

    #[test]
    fn variance_controls_argument_direction() {
        let fx = Fixture::new();
        let animal = fx.class("Animal");
        let dog = fx.class("Dog");
        fx.table.add_parent(dog, Type::Ref(animal));

        let source = fx.class("Source");
        let source_param =
            fx.table
                .create(source, "A", SymbolKind::TypeParam, SymbolFlags::PARAM);
        fx.table.set_type_params(source, vec![source_param]);
        fx.table.set_variance(source_param, Variance::Covariant);

        let sink = fx.class("Sink");
        let sink_param = fx
            .table
            .create(sink, "A", SymbolKind::TypeParam, SymbolFlags::PARAM);
        fx.table.set_type_params(sink, vec![sink_param]);
        fx.table.set_variance(sink_param, Variance::Contravariant);

        let cell = fx.class("Cell");
        let cell_param = fx
            .table
            .create(cell, "A", SymbolKind::TypeParam, SymbolFlags::PARAM);
        fx.table.set_type_params(cell, vec![cell_param]);

        let sub = fx.subtyper();
        let dog_t = Type::Ref(dog);
        let animal_t = Type::Ref(animal);

        let src = |arg: &Type| Type::applied(Type::Ref(source), vec![arg.clone()]);
        let snk = |arg: &Type| Type::applied(Type::Ref(sink), vec![arg.clone()]);
        let cel = |arg: &Type| Type::applied(Type::Ref(cell), vec![arg.clone()]);

        assert!(sub.is_subtype(&src(&dog_t), &src(&animal_t)));
        assert!(!sub.is_subtype(&src(&animal_t), &src(&dog_t)));
        assert!(sub.is_subtype(&snk(&animal_t), &snk(&dog_t)));
        assert!(!sub.is_subtype(&snk(&dog_t), &snk(&animal_t)));
        // Invariant under strict variance needs both directions.
        assert!(!sub.is_subtype(&cel(&dog_t), &cel(&animal_t)));
        assert!(sub.is_subtype(&cel(&dog_t), &cel(&dog_t)));
    }

    #[test]
    fn loose_variance_compares_invariant_params_covariantly() {
        let fx = Fixture::new();
        let animal = fx.class("Animal");
        let dog = fx.class("Dog");
        fx.table.add_parent(dog, Type::Ref(animal));
        let cell = fx.class("Cell");
        let cell_param = fx
            .table
            .create(cell, "A", SymbolKind::TypeParam, SymbolFlags::PARAM);
        fx.table.set_type_params(cell, vec![cell_param]);

        let legacy = LanguageSettings::default().with_defines(&["variance=loose"]);
        let ctx = Context::root(Scope::root(), legacy).with_phase(Phase::TYPER);
        let sub = Subtyper::new(&fx.table, &fx.denots, &fx.solver, &ctx);

        let cel = |arg: Type| Type::applied(Type::Ref(cell), vec![arg]);
        assert!(sub.is_subtype(&cel(Type::Ref(dog)), &cel(Type::Ref(animal))));
    }

    #[test]
    fn method_params_are_contravariant_results_covariant() {
        let fx = Fixture::new();
        let animal = Type::Ref(fx.class("Animal"));
        let dog = fx.class("Dog");
        fx.table.add_parent(dog, animal.clone());
        let dog = Type::Ref(dog);
        let sub = fx.subtyper();

        let takes_animal = Type::method(vec![animal.clone()], dog.clone());
        let takes_dog = Type::method(vec![dog.clone()], animal.clone());
        assert!(sub.is_subtype(&takes_animal, &takes_dog));
        assert!(!sub.is_subtype(&takes_dog, &takes_animal));
    }

    #[test]
    fn singletons_compare_by_identity_and_widen_leftward() {
        let fx = Fixture::new();
        let int = fx.class("Int");
        let x = fx
            .table
            .create(SymbolId::ROOT, "x", SymbolKind::Value, SymbolFlags::empty());
        let y = fx
            .table
            .create(SymbolId::ROOT, "y", SymbolKind::Value, SymbolFlags::empty());
        fx.denots
            .install(x, Type::Ref(int), Validity::from(Phase::NAMER));
        fx.denots
            .install(y, Type::Ref(int), Validity::from(Phase::NAMER));

        let sub = fx.subtyper();
        assert!(sub.is_subtype(&Type::Singleton(x), &Type::Singleton(x)));
        assert!(!sub.is_subtype(&Type::Singleton(x), &Type::Singleton(y)));
        assert!(sub.is_subtype(&Type::Singleton(x), &Type::Ref(int)));
        assert!(!sub.is_subtype(&Type::Ref(int), &Type::Singleton(x)));
    }

    #[test]
    fn type_variables_defer_into_the_solver() {
        let fx = Fixture::new();
        let int = Type::Ref(fx.class("Int"));
        let var = fx
            .solver
            .open(TypeBounds::unbounded(), crate::sema::constraint::VarOrigin::none());
        let sub = fx.subtyper();

        assert!(sub.is_subtype(&Type::Var(var), &int));
        assert_eq!(fx.solver.bounds_of(var).hi, int);
        assert!(sub.is_subtype(&int, &Type::Var(var)));
        assert_eq!(fx.solver.bounds_of(var).lo, int);
    }

    #[test]
    fn conflicting_variable_bound_is_rejected_and_retracted() {
        let fx = Fixture::new();
        let int = Type::Ref(fx.class("Int"));
        let string = Type::Ref(fx.class("String"));
        let var = fx
            .solver
            .open(TypeBounds::unbounded(), crate::sema::constraint::VarOrigin::none());
        let sub = fx.subtyper();

        assert!(sub.is_subtype(&int, &Type::Var(var)));
        assert!(sub.is_subtype(&Type::Var(var), &Type::or(int.clone(), string.clone())));
        // String is not a supertype of the accumulated lower bound Int.
        assert!(!sub.is_subtype(&Type::Var(var), &string));
        assert_eq!(fx.solver.bounds_of(var).hi, Type::or(int, string));
    }

    #[test]
    fn recursive_alias_checks_co_inductively() {
        let fx = Fixture::new();
        let unit = fx.class("Unit");
        let int = fx.class("Int");
        let pair = fx.class("Pair");
        let a = fx
            .table
            .create(pair, "A", SymbolKind::TypeParam, SymbolFlags::PARAM);
        let b = fx
            .table
            .create(pair, "B", SymbolKind::TypeParam, SymbolFlags::PARAM);
        fx.table.set_type_params(pair, vec![a, b]);
        fx.table.set_variance(a, Variance::Covariant);
        fx.table.set_variance(b, Variance::Covariant);

        // type L = Unit | Pair[Int, L]
        let alias = fx.table.create(
            SymbolId::ROOT,
            "L",
            SymbolKind::TypeAlias,
            SymbolFlags::empty(),
        );
        let body = Type::or(
            Type::Ref(unit),
            Type::applied(Type::Ref(pair), vec![Type::Ref(int), Type::Ref(alias)]),
        );
        fx.denots
            .install(alias, body.clone(), Validity::from(Phase::NAMER));

        let sub = fx.subtyper();
        assert!(sub.is_subtype(&body, &Type::Ref(alias)));
        assert!(sub.is_subtype(&Type::Ref(alias), &body));
        assert!(sub.is_subtype(
            &Type::applied(Type::Ref(pair), vec![Type::Ref(int), Type::Ref(alias)]),
            &Type::Ref(alias),
        ));
    }

    #[test]
    fn lub_and_glb_simplify_related_types() {
        let fx = Fixture::new();
        let animal = Type::Ref(fx.class("Animal"));
        let dog = fx.class("Dog");
        fx.table.add_parent(dog, animal.clone());
        let dog = Type::Ref(dog);
        let other = Type::Ref(fx.class("Rock"));
        let sub = fx.subtyper();

        assert_eq!(sub.lub(&dog, &animal), animal);
        assert_eq!(sub.glb(&dog, &animal), dog);
        assert_eq!(sub.lub(&dog, &other), Type::or(dog.clone(), other.clone()));
        assert_eq!(sub.glb(&dog, &other), Type::and(dog, other));
    }

    #[test]
    fn transitivity_holds_for_a_nominal_chain() {
        let fx = Fixture::new();
        let a = fx.class("A");
        let b = fx.class("B");
        let c = fx.class("C");
        fx.table.add_parent(c, Type::Ref(b));
        fx.table.add_parent(b, Type::Ref(a));
        let sub = fx.subtyper();

        assert!(sub.is_subtype(&Type::Ref(c), &Type::Ref(b)));
        assert!(sub.is_subtype(&Type::Ref(b), &Type::Ref(a)));
        assert!(sub.is_subtype(&Type::Ref(c), &Type::Ref(a)));
    }
}
