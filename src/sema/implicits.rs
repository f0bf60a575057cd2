//! Implicit argument search.
//!
//! Given a required type, the searcher scans eligible givens in ranked
//! groups: imported givens nearest-first, then lexically declared givens
//! nearest-first, then givens associated with the required type's
//! constructor. The first group containing an applicable candidate
//! decides the outcome; within it the candidate with the strictly most
//! specific result type wins, and a tie is ambiguous.
//!
//! Conditional givens recurse on their own implicit parameters. A search
//! that re-enters a required type already open on the chain diverges;
//! nesting past the depth cap aborts the unit.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{FatalError, Result};
use crate::sema::constraint::{ConstraintSolver, TyVarId, VarOrigin};
use crate::sema::context::Context;
use crate::sema::denotation::{DenotationStore, Phase};
use crate::sema::scope::Scope;
use crate::sema::substitute::{expand_alias, instantiate};
use crate::sema::subtype::Subtyper;
use crate::sema::symbol::{SymbolFlags, SymbolId, SymbolKind, SymbolTable};
use crate::sema::ty::{Type, TypeBounds};

/// Nesting cap for conditional-given recursion.
const SEARCH_DEPTH_LIMIT: usize = 64;

/// A successful search: the given to reference and the witnesses for its
/// own implicit parameters, innermost-first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    pub symbol: SymbolId,
    /// Result type of the given, instantiated for this use.
    pub ty: Type,
    pub arguments: Vec<Witness>,
}

/// Why a search produced no witness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchFailure {
    NotFound,
    Ambiguous { candidates: Vec<SymbolId> },
    Divergent,
}

/// Counters exposed to the typer's metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub searches: u64,
    pub cache_hits: u64,
}

enum Applicability {
    Yes(Witness),
    No,
    Divergent,
}

/// Resolves required types to witnesses. One searcher serves a whole
/// typer pass; its cache is keyed by required type and context identity.
pub struct ImplicitSearcher {
    table: Rc<SymbolTable>,
    denots: Rc<DenotationStore>,
    cache: RefCell<HashMap<(Type, u64), std::result::Result<Witness, SearchFailure>>>,
    searches: Cell<u64>,
    cache_hits: Cell<u64>,
}

impl ImplicitSearcher {
    #[must_use]
    pub fn new(table: Rc<SymbolTable>, denots: Rc<DenotationStore>) -> Self {
        Self {
            table,
            denots,
            cache: RefCell::new(HashMap::new()),
            searches: Cell::new(0),
            cache_hits: Cell::new(0),
        }
    }

    #[must_use]
    pub fn stats(&self) -> SearchStats {
        SearchStats {
            searches: self.searches.get(),
            cache_hits: self.cache_hits.get(),
        }
    }

    /// Drop every cached outcome. Called between typer passes, since
    /// witnesses embed types instantiated against the old solver state.
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Search for a witness of `required`.
    ///
    /// The outer `Err` is fatal (search nested past the depth cap); the
    /// inner one is an ordinary failure for the caller to report.
    pub fn search(
        &self,
        required: &Type,
        solver: &ConstraintSolver,
        ctx: &Context,
    ) -> Result<std::result::Result<Witness, SearchFailure>> {
        self.searches.set(self.searches.get() + 1);
        let required = solver.resolve(required);

        let depth = ctx.open_search_depth();
        if depth >= SEARCH_DEPTH_LIMIT {
            return Err(FatalError::SearchDepthExceeded { depth }.into());
        }
        if !ctx.enter_search(&required) {
            trace!("implicit search re-entered its own required type");
            return Ok(Err(SearchFailure::Divergent));
        }

        let key = (required.clone(), ctx.id());
        if let Some(cached) = self.cache.borrow().get(&key) {
            self.cache_hits.set(self.cache_hits.get() + 1);
            ctx.exit_search(&required);
            return Ok(cached.clone());
        }

        let outcome = self.search_groups(&required, solver, ctx);
        ctx.exit_search(&required);
        let outcome = outcome?;
        if outcome != Err(SearchFailure::Divergent) {
            self.cache.borrow_mut().insert(key, outcome.clone());
        }
        Ok(outcome)
    }

    fn search_groups(
        &self,
        required: &Type,
        solver: &ConstraintSolver,
        ctx: &Context,
    ) -> Result<std::result::Result<Witness, SearchFailure>> {
        let mut tested = HashSet::new();
        let mut diverged = false;
        for group in self.candidate_groups(required, &ctx.scope(), ctx.phase()) {
            let mut applicable = Vec::new();
            for sym in group {
                if !tested.insert(sym) {
                    continue;
                }
                let snapshot = solver.snapshot();
                let trial = ctx.speculative(|sctx| {
                    self.try_candidate(sym, required, solver, sctx)
                });
                let outcome = trial.abandon();
                solver.rollback_to(snapshot);
                match outcome? {
                    Applicability::Yes(witness) => applicable.push((sym, witness.ty)),
                    Applicability::No => {}
                    Applicability::Divergent => diverged = true,
                }
            }
            if applicable.is_empty() {
                continue;
            }
            return match self.most_specific(&applicable, solver, ctx) {
                Some(winner) => {
                    debug!(symbol = %winner, "implicit search succeeded");
                    // Re-run the winner outside the trial so its bound
                    // writes and nested witnesses commit.
                    match self.try_candidate(winner, required, solver, ctx)? {
                        Applicability::Yes(witness) => Ok(Ok(witness)),
                        Applicability::No | Applicability::Divergent => {
                            Ok(Err(SearchFailure::NotFound))
                        }
                    }
                }
                None => Ok(Err(SearchFailure::Ambiguous {
                    candidates: applicable.into_iter().map(|(sym, _)| sym).collect(),
                })),
            };
        }
        if diverged {
            Ok(Err(SearchFailure::Divergent))
        } else {
            Ok(Err(SearchFailure::NotFound))
        }
    }

    /// Candidate symbols in ranked groups: per-scope imports nearest
    /// first, then per-scope declarations, then the required type's
    /// associated givens.
    fn candidate_groups(
        &self,
        required: &Type,
        scope: &Rc<Scope>,
        phase: Phase,
    ) -> Vec<Vec<SymbolId>> {
        let mut groups = Vec::new();

        let mut chain = Vec::new();
        let mut current = Some(Rc::clone(scope));
        while let Some(region) = current {
            chain.push(Rc::clone(&region));
            current = region.parent();
        }

        for region in &chain {
            let imported: Vec<SymbolId> = region
                .imported_here()
                .into_iter()
                .filter(|sym| self.table.has_flag(*sym, SymbolFlags::GIVEN))
                .collect();
            if !imported.is_empty() {
                groups.push(imported);
            }
        }
        for region in &chain {
            let imported = region.imported_here();
            let declared: Vec<SymbolId> = region
                .declared_here()
                .into_iter()
                .filter(|sym| {
                    self.table.has_flag(*sym, SymbolFlags::GIVEN)
                        && !imported.contains(sym)
                })
                .collect();
            if !declared.is_empty() {
                groups.push(declared);
            }
        }

        if let Some(ctor) = self.head_constructor(required, phase) {
            let associated = self.table.associated_givens(ctor);
            if !associated.is_empty() {
                groups.push(associated);
            }
        }
        groups
    }

    /// The class constructor heading `required`, seen through aliases.
    fn head_constructor(&self, required: &Type, phase: Phase) -> Option<SymbolId> {
        let mut ty = required.clone();
        loop {
            match &ty {
                Type::Ref(sym) if self.table.kind(*sym) == SymbolKind::Class => {
                    return Some(*sym);
                }
                Type::Applied { ctor, .. } => {
                    if let Type::Ref(sym) = ctor.as_ref() {
                        if self.table.kind(*sym) == SymbolKind::Class {
                            return Some(*sym);
                        }
                    }
                }
                _ => {}
            }
            match expand_alias(&ty, &self.table, &self.denots, phase) {
                Ok(Some(expanded)) if expanded != ty => ty = expanded,
                _ => return None,
            }
        }
    }

    /// Check one candidate against `required`, instantiating a generic
    /// given with fresh variables and recursing on implicit parameters.
    fn try_candidate(
        &self,
        sym: SymbolId,
        required: &Type,
        solver: &ConstraintSolver,
        ctx: &Context,
    ) -> Result<Applicability> {
        let Ok(denot) = self.denots.at(sym, ctx.phase()) else {
            return Ok(Applicability::No);
        };
        let mut opened: Vec<TyVarId> = Vec::new();
        let info = match denot.info {
            Type::Poly { params, body } => {
                let args: Vec<Type> = params
                    .iter()
                    .map(|param| {
                        let origin = VarOrigin {
                            param: Some(*param),
                            default: self.table.default_arg(*param),
                            require_precision: false,
                            span: None,
                        };
                        let var = solver.open(self.param_bounds(*param, ctx.phase()), origin);
                        opened.push(var);
                        Type::Var(var)
                    })
                    .collect();
                instantiate(&params, &args, &body)
            }
            other => other,
        };
        let (implicit_params, result) = match info {
            Type::Method {
                params,
                result,
                implicit: true,
            } => (params, *result),
            other => (Vec::new(), other),
        };

        let subtyper = Subtyper::new(&self.table, &self.denots, solver, ctx);
        if !subtyper.is_subtype(&result, required) {
            return Ok(Applicability::No);
        }

        let mut arguments = Vec::with_capacity(implicit_params.len());
        for param in &implicit_params {
            let needed = solver.resolve(param);
            match self.search(&needed, solver, ctx)? {
                Ok(witness) => arguments.push(witness),
                Err(SearchFailure::Divergent) => return Ok(Applicability::Divergent),
                Err(_) => return Ok(Applicability::No),
            }
        }

        // Freeze the candidate's own variables so the witness type is
        // ground even after a trial rolls the solver back.
        for var in opened {
            solver.solve(var, ctx.phase());
        }
        Ok(Applicability::Yes(Witness {
            symbol: sym,
            ty: solver.resolve(&result),
            arguments,
        }))
    }

    /// The candidate whose result type is a subtype of every other's, if
    /// exactly one exists. Two candidates with equal result types both
    /// survive, which the caller reports as ambiguity.
    fn most_specific(
        &self,
        applicable: &[(SymbolId, Type)],
        solver: &ConstraintSolver,
        ctx: &Context,
    ) -> Option<SymbolId> {
        if let [(only, _)] = applicable {
            return Some(*only);
        }
        let subtyper = Subtyper::new(&self.table, &self.denots, solver, ctx);
        let survivors: Vec<SymbolId> = applicable
            .iter()
            .filter(|(sym, ty)| {
                applicable
                    .iter()
                    .filter(|(other, _)| other != sym)
                    .all(|(_, other_ty)| subtyper.is_subtype(ty, other_ty))
            })
            .map(|(sym, _)| *sym)
            .collect();
        match survivors[..] {
            [winner] => Some(winner),
            _ => None,
        }
    }

    fn param_bounds(&self, param: SymbolId, phase: Phase) -> TypeBounds {
        match self.denots.at(param, phase) {
            Ok(denot) => match denot.info {
                Type::Bounds(bounds) => *bounds,
                other => TypeBounds::upper(other),
            },
            Err(_) => TypeBounds::unbounded(),
        }
    }
}
