//! Phase-indexed meanings of symbols.
//!
//! A denotation records what a symbol means over a half-open phase
//! interval. Lookups outside every recorded interval recompute from the
//! latest earlier record through the registered phase transforms; reading
//! a stale record directly is impossible by construction.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::sema::symbol::SymbolId;
use crate::sema::ty::Type;

/// Compilation phase index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Phase(pub u32);

impl Phase {
    pub const NAMER: Phase = Phase(0);
    pub const TYPER: Phase = Phase(1);
    /// Sentinel past every real phase.
    pub const LIMIT: Phase = Phase(u32::MAX);

    #[must_use]
    pub fn next(self) -> Phase {
        Phase(self.0.saturating_add(1))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase {}", self.0)
    }
}

/// Half-open validity interval `[first, until)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    pub first: Phase,
    pub until: Phase,
}

impl Validity {
    #[must_use]
    pub fn new(first: Phase, until: Phase) -> Self {
        Self { first, until }
    }

    /// Valid from `first` onwards, until truncated by a transform boundary.
    #[must_use]
    pub fn from(first: Phase) -> Self {
        Self {
            first,
            until: Phase::LIMIT,
        }
    }

    #[must_use]
    pub fn contains(&self, phase: Phase) -> bool {
        self.first <= phase && phase < self.until
    }
}

/// The meaning of a symbol over a validity interval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Denotation {
    pub symbol: SymbolId,
    pub info: Type,
    pub validity: Validity,
}

/// Failure to produce a denotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenotError {
    /// No record exists at or before the requested phase.
    Missing(SymbolId),
    /// Recomputation re-entered the same symbol.
    Cyclic(SymbolId),
}

/// Rewrites denotation infos when compilation crosses into a phase.
pub trait PhaseTransform {
    /// First phase at which the transformed info is the valid one.
    fn first_phase(&self) -> Phase;

    fn transform(&self, symbol: SymbolId, info: &Type, store: &DenotationStore) -> Type;
}

/// Side table of denotations keyed by symbol.
///
/// Register transforms before installing denotations; installation
/// truncates validity at the next transform boundary.
pub struct DenotationStore {
    records: RefCell<HashMap<SymbolId, Vec<Denotation>>>,
    transforms: RefCell<Vec<Box<dyn PhaseTransform>>>,
    computing: RefCell<HashSet<SymbolId>>,
}

impl DenotationStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RefCell::new(HashMap::new()),
            transforms: RefCell::new(Vec::new()),
            computing: RefCell::new(HashSet::new()),
        }
    }

    pub fn register_transform(&self, transform: Box<dyn PhaseTransform>) {
        let mut transforms = self.transforms.borrow_mut();
        transforms.push(transform);
        transforms.sort_by_key(|t| t.first_phase());
    }

    /// Record `info` as the meaning of `sym` over `validity`.
    pub fn install(&self, sym: SymbolId, info: Type, validity: Validity) {
        let until = validity.until.min(self.next_boundary(validity.first));
        let denotation = Denotation {
            symbol: sym,
            info,
            validity: Validity::new(validity.first, until),
        };
        let mut records = self.records.borrow_mut();
        let entries = records.entry(sym).or_default();
        entries.retain(|existing| existing.validity.first != denotation.validity.first);
        entries.push(denotation);
        entries.sort_by_key(|d| d.validity.first);
    }

    /// The meaning of `sym` at `phase`, recomputing across phase
    /// boundaries when necessary.
    pub fn at(&self, sym: SymbolId, phase: Phase) -> Result<Denotation, DenotError> {
        if let Some(found) = self.lookup(sym, phase) {
            return Ok(found);
        }
        self.recompute(sym, phase)
    }

    /// Whether any record exists for `sym`.
    #[must_use]
    pub fn has_denotation(&self, sym: SymbolId) -> bool {
        self.records.borrow().contains_key(&sym)
    }

    fn lookup(&self, sym: SymbolId, phase: Phase) -> Option<Denotation> {
        let records = self.records.borrow();
        records
            .get(&sym)?
            .iter()
            .find(|d| d.validity.contains(phase))
            .cloned()
    }

    fn recompute(&self, sym: SymbolId, phase: Phase) -> Result<Denotation, DenotError> {
        let source = {
            let records = self.records.borrow();
            records
                .get(&sym)
                .and_then(|entries| {
                    entries
                        .iter()
                        .filter(|d| d.validity.first <= phase)
                        .max_by_key(|d| d.validity.first)
                        .cloned()
                })
                .ok_or(DenotError::Missing(sym))?
        };

        if !self.computing.borrow_mut().insert(sym) {
            return Err(DenotError::Cyclic(sym));
        }
        let result = self.carry_forward(sym, source, phase);
        self.computing.borrow_mut().remove(&sym);
        Ok(result)
    }

    fn carry_forward(&self, sym: SymbolId, source: Denotation, phase: Phase) -> Denotation {
        let mut info = source.info;
        let mut first = source.validity.until;
        loop {
            let boundary_transform = {
                let transforms = self.transforms.borrow();
                transforms
                    .iter()
                    .position(|t| t.first_phase() >= first && t.first_phase() <= phase)
            };
            let (transformed, next_first) = match boundary_transform {
                Some(index) => {
                    let transforms = self.transforms.borrow();
                    let transform = &transforms[index];
                    let at = transform.first_phase();
                    let new_info = transform.transform(sym, &info, self);
                    (new_info, at)
                }
                // No boundary left before `phase`: identity carry-forward.
                None => (info.clone(), first),
            };
            info = transformed;
            first = next_first;
            let until = self.next_boundary(first);
            let denotation = Denotation {
                symbol: sym,
                info: info.clone(),
                validity: Validity::new(first, until),
            };
            self.install(sym, denotation.info.clone(), denotation.validity);
            if denotation.validity.contains(phase) {
                return denotation;
            }
            first = until;
        }
    }

    /// Smallest transform boundary strictly after `phase`.
    fn next_boundary(&self, phase: Phase) -> Phase {
        self.transforms
            .borrow()
            .iter()
            .map(|t| t.first_phase())
            .filter(|p| *p > phase)
            .min()
            .unwrap_or(Phase::LIMIT)
    }
}

impl Default for DenotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DenotationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenotationStore")
            .field("symbols", &self.records.borrow().len())
            .field("transforms", &self.transforms.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::symbol::{SymbolFlags, SymbolKind, SymbolTable};
    use crate::sema::ty::Type;

    fn value_symbol(table: &SymbolTable, name: &str) -> SymbolId {
        table.create(SymbolId::ROOT, name, SymbolKind::Value, SymbolFlags::empty())
    }

    #[test]
    fn validity_interval_is_half_open() {
        let validity = Validity::new(Phase(1), Phase(3));
        assert!(!validity.contains(Phase(0)));
        assert!(validity.contains(Phase(1)));
        assert!(validity.contains(Phase(2)));
        assert!(!validity.contains(Phase(3)));
    }

    #[test]
    fn install_then_lookup_within_interval() {
        let table = SymbolTable::new();
        let store = DenotationStore::new();
        let x = value_symbol(&table, "x");
        store.install(x, Type::Any, Validity::from(Phase::NAMER));

        let denot = store.at(x, Phase::TYPER).unwrap();
        assert_eq!(denot.info, Type::Any);
        assert!(denot.validity.contains(Phase::TYPER));
    }

    #[test]
    fn missing_symbol_reports_missing() {
        let table = SymbolTable::new();
        let store = DenotationStore::new();
        let x = value_symbol(&table, "x");
        assert_eq!(store.at(x, Phase::TYPER), Err(DenotError::Missing(x)));
    }

    #[test]
    fn lookup_before_first_record_reports_missing() {
        let table = SymbolTable::new();
        let store = DenotationStore::new();
        let x = value_symbol(&table, "x");
        store.install(x, Type::Any, Validity::from(Phase(5)));
        assert_eq!(store.at(x, Phase(2)), Err(DenotError::Missing(x)));
    }

    #[test]
    fn expired_records_carry_forward_unchanged_without_transforms() {
        let table = SymbolTable::new();
        let store = DenotationStore::new();
        let x = value_symbol(&table, "x");
        store.install(x, Type::Any, Validity::new(Phase(0), Phase(2)));

        let denot = store.at(x, Phase(4)).unwrap();
        assert_eq!(denot.info, Type::Any);
        assert!(denot.validity.contains(Phase(4)));
        assert_eq!(denot.validity.first, Phase(2));
    }

    struct EraseToAny {
        at: Phase,
    }

    impl PhaseTransform for EraseToAny {
        fn first_phase(&self) -> Phase {
            self.at
        }

        fn transform(&self, _symbol: SymbolId, _info: &Type, _store: &DenotationStore) -> Type {
            Type::Any
        }
    }

    #[test]
    fn transforms_rewrite_across_their_boundary() {
        let table = SymbolTable::new();
        let store = DenotationStore::new();
        store.register_transform(Box::new(EraseToAny { at: Phase(2) }));

        let x = value_symbol(&table, "x");
        store.install(x, Type::Nothing, Validity::from(Phase(0)));

        // Before the boundary the original info is served, truncated there.
        let before = store.at(x, Phase(1)).unwrap();
        assert_eq!(before.info, Type::Nothing);
        assert_eq!(before.validity.until, Phase(2));

        let after = store.at(x, Phase(3)).unwrap();
        assert_eq!(after.info, Type::Any);
        assert_eq!(after.validity.first, Phase(2));
        assert_eq!(after.validity.until, Phase::LIMIT);
    }

    struct SelfReferential;

    impl PhaseTransform for SelfReferential {
        fn first_phase(&self) -> Phase {
            Phase(2)
        }

        fn transform(&self, symbol: SymbolId, info: &Type, store: &DenotationStore) -> Type {
            // Re-enters the symbol being recomputed.
            match store.at(symbol, Phase(3)) {
                Ok(denot) => denot.info,
                Err(_) => info.clone(),
            }
        }
    }

    #[test]
    fn recompute_reentry_is_detected_not_divergent() {
        let table = SymbolTable::new();
        let store = DenotationStore::new();
        store.register_transform(Box::new(SelfReferential));

        let x = value_symbol(&table, "x");
        store.install(x, Type::Nothing, Validity::from(Phase(0)));

        // The transform swallows the cyclic error and keeps the old info;
        // the point is that the store reports the cycle instead of looping.
        let after = store.at(x, Phase(3)).unwrap();
        assert_eq!(after.info, Type::Nothing);
    }
}
