//! Bounds tracking for type variables opened during inference.
//!
//! Variables are owned by the solver that opened them and retired before
//! their inference scope ends. Bounds narrow monotonically: lower bounds
//! accumulate via union, upper bounds via intersection. Speculative typing
//! snapshots the write cursor; rollback restores every recorded write and
//! discards variables opened after the snapshot.

use std::cell::RefCell;
use std::fmt;

use tracing::trace;

use crate::diagnostics::Span;
use crate::sema::denotation::{DenotationStore, Phase};
use crate::sema::symbol::{SymbolId, SymbolTable};
use crate::sema::ty::{Type, TypeBounds, widen};
use std::rc::Rc;

/// Handle for a type variable, valid for the owning solver only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyVarId(u32);

impl TyVarId {
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TyVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// Where a variable came from, for blame and defaulting.
#[derive(Clone, Debug, Default)]
pub struct VarOrigin {
    /// Type parameter the variable instantiates, when known.
    pub param: Option<SymbolId>,
    /// Declared default argument, used when no bound constrains the
    /// variable.
    pub default: Option<Type>,
    /// Whether defaulting to an unconstrained top type must be reported.
    pub require_precision: bool,
    pub span: Option<Span>,
}

impl VarOrigin {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn for_param(param: SymbolId, default: Option<Type>, span: Option<Span>) -> Self {
        Self {
            param: Some(param),
            default,
            require_precision: true,
            span,
        }
    }
}

/// Cursor into the solver's write log; cheap to copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    undo_len: usize,
    vars_len: usize,
}

#[derive(Debug)]
struct VarState {
    bounds: TypeBounds,
    declared: TypeBounds,
    origin: VarOrigin,
    solution: Option<Type>,
}

#[derive(Debug)]
enum UndoEntry {
    Bounds { var: TyVarId, prev: TypeBounds },
    Solution { var: TyVarId },
}

#[derive(Debug, Default)]
struct SolverState {
    vars: Vec<VarState>,
    undo: Vec<UndoEntry>,
}

/// Tracks bounds of open type variables and commits instantiations.
pub struct ConstraintSolver {
    table: Rc<SymbolTable>,
    denots: Rc<DenotationStore>,
    state: RefCell<SolverState>,
}

impl ConstraintSolver {
    #[must_use]
    pub fn new(table: Rc<SymbolTable>, denots: Rc<DenotationStore>) -> Self {
        Self {
            table,
            denots,
            state: RefCell::new(SolverState::default()),
        }
    }

    /// Open a fresh variable with the given declared bounds.
    pub fn open(&self, bounds: TypeBounds, origin: VarOrigin) -> TyVarId {
        let mut state = self.state.borrow_mut();
        let var = TyVarId::from_index(state.vars.len());
        trace!(var = %var, "open type variable");
        state.vars.push(VarState {
            bounds: bounds.clone(),
            declared: bounds,
            origin,
            solution: None,
        });
        var
    }

    #[must_use]
    pub fn var_count(&self) -> usize {
        self.state.borrow().vars.len()
    }

    #[must_use]
    pub fn bounds_of(&self, var: TyVarId) -> TypeBounds {
        self.state.borrow().vars[var.index()].bounds.clone()
    }

    #[must_use]
    pub fn origin_of(&self, var: TyVarId) -> VarOrigin {
        self.state.borrow().vars[var.index()].origin.clone()
    }

    #[must_use]
    pub fn is_solved(&self, var: TyVarId) -> bool {
        self.state.borrow().vars[var.index()].solution.is_some()
    }

    /// The frozen instantiation, if `var` has been solved.
    #[must_use]
    pub fn instantiation(&self, var: TyVarId) -> Option<Type> {
        self.state.borrow().vars[var.index()].solution.clone()
    }

    /// Narrow the lower bound with `t` (accumulating via union) and return
    /// the merged bounds for the caller to verify. The write is logged.
    pub fn narrow_lower(&self, var: TyVarId, t: &Type) -> TypeBounds {
        let mut state = self.state.borrow_mut();
        let prev = state.vars[var.index()].bounds.clone();
        debug_assert!(state.vars[var.index()].solution.is_none());
        let merged = TypeBounds::new(Type::or(prev.lo.clone(), t.clone()), prev.hi.clone());
        trace!(var = %var, "narrow lower bound");
        state.undo.push(UndoEntry::Bounds { var, prev });
        state.vars[var.index()].bounds = merged.clone();
        merged
    }

    /// Narrow the upper bound with `t` (accumulating via intersection) and
    /// return the merged bounds for the caller to verify.
    pub fn narrow_upper(&self, var: TyVarId, t: &Type) -> TypeBounds {
        let mut state = self.state.borrow_mut();
        let prev = state.vars[var.index()].bounds.clone();
        debug_assert!(state.vars[var.index()].solution.is_none());
        let merged = TypeBounds::new(prev.lo.clone(), Type::and(prev.hi.clone(), t.clone()));
        trace!(var = %var, "narrow upper bound");
        state.undo.push(UndoEntry::Bounds { var, prev });
        state.vars[var.index()].bounds = merged.clone();
        merged
    }

    /// Drop the most recent bound write for `var`, restoring what a failed
    /// verification observed before it.
    pub fn retract_last(&self, var: TyVarId) {
        let mut state = self.state.borrow_mut();
        let position = state
            .undo
            .iter()
            .rposition(|entry| matches!(entry, UndoEntry::Bounds { var: v, .. } if *v == var));
        if let Some(index) = position {
            if let UndoEntry::Bounds { prev, .. } = state.undo.remove(index) {
                state.vars[var.index()].bounds = prev;
            }
        }
    }

    /// Instantiate `var`, freezing the result.
    ///
    /// The lower bound wins when present and non-degenerate, widened
    /// unless the upper bound itself demands precision; otherwise the
    /// narrowed upper bound, the declared default, and finally the
    /// declared upper bound, in that order.
    pub fn solve(&self, var: TyVarId, phase: Phase) -> Type {
        if let Some(existing) = self.instantiation(var) {
            return existing;
        }
        let (bounds, declared, default) = {
            let state = self.state.borrow();
            let v = &state.vars[var.index()];
            (
                v.bounds.clone(),
                v.declared.clone(),
                v.origin.default.clone(),
            )
        };

        let lo = self.resolve(&bounds.lo);
        let hi = self.resolve(&bounds.hi);
        let chosen = if lo != Type::Nothing && !lo.is_error() {
            if demands_precision(&hi) {
                lo
            } else {
                widen(&lo, &self.table, &self.denots, phase)
            }
        } else if hi != Type::Any {
            hi
        } else if let Some(default) = default {
            default
        } else {
            declared.hi
        };

        trace!(var = %var, "solve type variable");
        let mut state = self.state.borrow_mut();
        state.undo.push(UndoEntry::Solution { var });
        state.vars[var.index()].solution = Some(chosen.clone());
        chosen
    }

    /// Solve every still-open variable, returning those that defaulted to
    /// an unconstrained top type in a precision-requiring position.
    pub fn solve_remaining(&self, phase: Phase) -> Vec<(TyVarId, VarOrigin)> {
        let count = self.var_count();
        let mut underconstrained = Vec::new();
        for index in 0..count {
            let var = TyVarId::from_index(index);
            if self.is_solved(var) {
                continue;
            }
            let origin = self.origin_of(var);
            let solution = self.solve(var, phase);
            if solution == Type::Any && origin.require_precision && origin.default.is_none() {
                underconstrained.push((var, origin));
            }
        }
        underconstrained
    }

    /// Replace solved variables inside `ty` with their instantiations.
    #[must_use]
    pub fn resolve(&self, ty: &Type) -> Type {
        match ty {
            Type::Var(var) => match self.instantiation(*var) {
                Some(solution) => self.resolve(&solution),
                None => ty.clone(),
            },
            Type::Applied { ctor, args } => Type::applied(
                self.resolve(ctor),
                args.iter().map(|arg| self.resolve(arg)).collect(),
            ),
            Type::Method {
                params,
                result,
                implicit,
            } => Type::Method {
                params: params.iter().map(|p| self.resolve(p)).collect(),
                result: Box::new(self.resolve(result)),
                implicit: *implicit,
            },
            Type::And(lhs, rhs) => Type::and(self.resolve(lhs), self.resolve(rhs)),
            Type::Or(lhs, rhs) => Type::or(self.resolve(lhs), self.resolve(rhs)),
            Type::Refined { base, member, info } => Type::refined(
                self.resolve(base),
                member.clone(),
                self.resolve(info),
            ),
            Type::Bounds(bounds) => Type::bounds(
                self.resolve(&bounds.lo),
                self.resolve(&bounds.hi),
            ),
            other => other.clone(),
        }
    }

    /// Capture the current write cursor.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.borrow();
        Snapshot {
            undo_len: state.undo.len(),
            vars_len: state.vars.len(),
        }
    }

    /// Undo every write after `snapshot` and discard variables opened
    /// since. Trial results referencing those variables must be dropped
    /// by the caller.
    pub fn rollback_to(&self, snapshot: Snapshot) {
        let mut state = self.state.borrow_mut();
        while state.undo.len() > snapshot.undo_len {
            match state.undo.pop() {
                Some(UndoEntry::Bounds { var, prev }) => {
                    if var.index() < snapshot.vars_len {
                        state.vars[var.index()].bounds = prev;
                    }
                }
                Some(UndoEntry::Solution { var }) => {
                    if var.index() < snapshot.vars_len {
                        state.vars[var.index()].solution = None;
                    }
                }
                None => break,
            }
        }
        state.vars.truncate(snapshot.vars_len);
    }

    /// Keep everything written since `snapshot`. Undo records are retained
    /// so enclosing snapshots remain sound; the log empties when the
    /// owning inference scope ends.
    pub fn commit(&self, _snapshot: Snapshot) {}

    /// Forget the undo history. Call only at the end of an inference
    /// scope, when no snapshot remains active.
    pub fn clear_undo(&self) {
        self.state.borrow_mut().undo.clear();
    }
}

impl fmt::Debug for ConstraintSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ConstraintSolver")
            .field("vars", &state.vars.len())
            .field("undo", &state.undo.len())
            .finish()
    }
}

/// Whether instantiating against this upper bound must keep literal or
/// singleton precision rather than widening.
fn demands_precision(hi: &Type) -> bool {
    match hi {
        Type::Literal(_) | Type::Singleton(_) => true,
        Type::And(lhs, rhs) => demands_precision(lhs) || demands_precision(rhs),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::symbol::{SymbolFlags, SymbolKind};

    fn solver_with_int() -> (ConstraintSolver, SymbolId) {
        let table = Rc::new(SymbolTable::new());
        let int = table.create(
            SymbolId::ROOT,
            "Int",
            SymbolKind::Class,
            SymbolFlags::empty(),
        );
        let denots = Rc::new(DenotationStore::new());
        (ConstraintSolver::new(table, denots), int)
    }

    #[test]
    fn lower_bounds_accumulate_via_union() {
        let (solver, int) = solver_with_int();
        let var = solver.open(TypeBounds::unbounded(), VarOrigin::none());

        let first = solver.narrow_lower(var, &Type::Ref(int));
        assert_eq!(first.lo, Type::Ref(int));

        let second = solver.narrow_lower(var, &Type::Ref(int));
        assert_eq!(second.lo, Type::Ref(int), "same bound keeps the merge");

        let third = solver.narrow_lower(var, &Type::Nothing);
        assert_eq!(third.lo, Type::Ref(int), "bottom adds nothing");
    }

    #[test]
    fn upper_bounds_accumulate_via_intersection() {
        let (solver, int) = solver_with_int();
        let var = solver.open(TypeBounds::unbounded(), VarOrigin::none());

        let first = solver.narrow_upper(var, &Type::Ref(int));
        assert_eq!(first.hi, Type::Ref(int));

        let second = solver.narrow_upper(var, &Type::Any);
        assert_eq!(second.hi, Type::Ref(int), "top constrains nothing");
    }

    #[test]
    fn solve_prefers_the_lower_bound() {
        let (solver, int) = solver_with_int();
        let var = solver.open(TypeBounds::unbounded(), VarOrigin::none());
        solver.narrow_lower(var, &Type::Ref(int));
        solver.narrow_upper(var, &Type::Any);

        assert_eq!(solver.solve(var, Phase::TYPER), Type::Ref(int));
    }

    #[test]
    fn solve_widens_literal_lower_bounds() {
        let (solver, int) = solver_with_int();
        let var = solver.open(TypeBounds::unbounded(), VarOrigin::none());
        solver.narrow_lower(var, &Type::int_lit(5, int));

        assert_eq!(solver.solve(var, Phase::TYPER), Type::Ref(int));
    }

    #[test]
    fn solve_keeps_precision_when_the_upper_bound_demands_it() {
        let (solver, int) = solver_with_int();
        let var = solver.open(
            TypeBounds::upper(Type::int_lit(5, int)),
            VarOrigin::none(),
        );
        solver.narrow_lower(var, &Type::int_lit(5, int));

        assert_eq!(solver.solve(var, Phase::TYPER), Type::int_lit(5, int));
    }

    #[test]
    fn solve_falls_back_to_upper_then_default() {
        let (solver, int) = solver_with_int();

        let bounded = solver.open(TypeBounds::upper(Type::Ref(int)), VarOrigin::none());
        assert_eq!(solver.solve(bounded, Phase::TYPER), Type::Ref(int));

        let defaulted = solver.open(
            TypeBounds::unbounded(),
            VarOrigin {
                default: Some(Type::Ref(int)),
                ..VarOrigin::none()
            },
        );
        assert_eq!(solver.solve(defaulted, Phase::TYPER), Type::Ref(int));

        let unconstrained = solver.open(TypeBounds::unbounded(), VarOrigin::none());
        assert_eq!(solver.solve(unconstrained, Phase::TYPER), Type::Any);
    }

    #[test]
    fn solved_variables_are_frozen() {
        let (solver, int) = solver_with_int();
        let var = solver.open(TypeBounds::unbounded(), VarOrigin::none());
        solver.narrow_lower(var, &Type::Ref(int));

        let first = solver.solve(var, Phase::TYPER);
        let second = solver.solve(var, Phase::TYPER);
        assert_eq!(first, second);
        assert!(solver.is_solved(var));
    }

    #[test]
    fn rollback_restores_bounds_and_discards_new_vars() {
        let (solver, int) = solver_with_int();
        let var = solver.open(TypeBounds::unbounded(), VarOrigin::none());
        solver.narrow_upper(var, &Type::Ref(int));

        let snapshot = solver.snapshot();
        solver.narrow_lower(var, &Type::Ref(int));
        let trial_var = solver.open(TypeBounds::unbounded(), VarOrigin::none());
        solver.narrow_lower(trial_var, &Type::Ref(int));

        solver.rollback_to(snapshot);
        assert_eq!(solver.var_count(), 1);
        let bounds = solver.bounds_of(var);
        assert_eq!(bounds.lo, Type::Nothing);
        assert_eq!(bounds.hi, Type::Ref(int));
    }

    #[test]
    fn nested_rollback_after_inner_commit_still_restores() {
        let (solver, int) = solver_with_int();
        let var = solver.open(TypeBounds::unbounded(), VarOrigin::none());

        let outer = solver.snapshot();
        solver.narrow_lower(var, &Type::Ref(int));
        let inner = solver.snapshot();
        solver.narrow_upper(var, &Type::Ref(int));
        solver.commit(inner);

        solver.rollback_to(outer);
        assert!(solver.bounds_of(var).is_unbounded());
    }

    #[test]
    fn retract_last_undoes_one_write() {
        let (solver, int) = solver_with_int();
        let var = solver.open(TypeBounds::unbounded(), VarOrigin::none());
        solver.narrow_upper(var, &Type::Ref(int));
        solver.narrow_lower(var, &Type::Ref(int));

        solver.retract_last(var);
        let bounds = solver.bounds_of(var);
        assert_eq!(bounds.lo, Type::Nothing);
        assert_eq!(bounds.hi, Type::Ref(int));
    }

    #[test]
    fn solve_remaining_reports_underconstrained_vars() {
        let (solver, int) = solver_with_int();
        let constrained = solver.open(TypeBounds::unbounded(), VarOrigin::none());
        solver.narrow_lower(constrained, &Type::Ref(int));

        // A precision-requiring variable with no bounds and no default.
        let param = solver.open(
            TypeBounds::unbounded(),
            VarOrigin {
                require_precision: true,
                ..VarOrigin::none()
            },
        );

        let underconstrained = solver.solve_remaining(Phase::TYPER);
        assert_eq!(underconstrained.len(), 1);
        assert_eq!(underconstrained[0].0, param);
        assert_eq!(solver.instantiation(param), Some(Type::Any));
        assert_eq!(solver.instantiation(constrained), Some(Type::Ref(int)));
    }

    #[test]
    fn resolve_substitutes_through_structure() {
        let (solver, int) = solver_with_int();
        let var = solver.open(TypeBounds::unbounded(), VarOrigin::none());
        solver.narrow_lower(var, &Type::Ref(int));
        solver.solve(var, Phase::TYPER);

        let method = Type::method(vec![Type::Var(var)], Type::Var(var));
        let resolved = solver.resolve(&method);
        assert_eq!(
            resolved,
            Type::method(vec![Type::Ref(int)], Type::Ref(int))
        );
    }
}
