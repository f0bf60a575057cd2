//! Immutable, parent-linked compilation state threaded through every
//! query.
//!
//! A context is a cheap `Rc` clone; children never mutate an ancestor.
//! The diagnostics sink and the open-implicit-search chain are shared by
//! every context derived from the same root so that a buffered trial can
//! be merged or abandoned as a whole.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::language::LanguageSettings;
use crate::sema::denotation::Phase;
use crate::sema::scope::Scope;
use crate::sema::symbol::SymbolId;
use crate::sema::ty::Type;

struct ContextData {
    parent: Option<Context>,
    owner: SymbolId,
    scope: Rc<Scope>,
    phase: Phase,
    language: LanguageSettings,
    sink: Rc<RefCell<DiagnosticSink>>,
    /// Required types of implicit searches currently in flight.
    open_searches: Rc<RefCell<Vec<Type>>>,
    next_id: Rc<Cell<u64>>,
    id: u64,
}

/// Compilation state at one point of the tree walk.
#[derive(Clone)]
pub struct Context {
    data: Rc<ContextData>,
}

impl Context {
    #[must_use]
    pub fn root(scope: Rc<Scope>, language: LanguageSettings) -> Self {
        Self {
            data: Rc::new(ContextData {
                parent: None,
                owner: SymbolId::ROOT,
                scope,
                phase: Phase::NAMER,
                language,
                sink: Rc::new(RefCell::new(DiagnosticSink::new("sema"))),
                open_searches: Rc::new(RefCell::new(Vec::new())),
                next_id: Rc::new(Cell::new(1)),
                id: 0,
            }),
        }
    }

    /// A child context inheriting every field. Combine with the `with_*`
    /// builders to narrow it to a nested scope.
    #[must_use]
    pub fn fresh(&self) -> Self {
        let id = self.data.next_id.get();
        self.data.next_id.set(id + 1);
        Self {
            data: Rc::new(ContextData {
                parent: Some(self.clone()),
                owner: self.data.owner,
                scope: Rc::clone(&self.data.scope),
                phase: self.data.phase,
                language: self.data.language,
                sink: Rc::clone(&self.data.sink),
                open_searches: Rc::clone(&self.data.open_searches),
                next_id: Rc::clone(&self.data.next_id),
                id,
            }),
        }
    }

    #[must_use]
    pub fn with_owner(&self, owner: SymbolId) -> Self {
        self.derive(owner, Rc::clone(&self.data.scope), self.data.phase)
    }

    #[must_use]
    pub fn with_scope(&self, scope: Rc<Scope>) -> Self {
        self.derive(self.data.owner, scope, self.data.phase)
    }

    #[must_use]
    pub fn with_phase(&self, phase: Phase) -> Self {
        self.derive(self.data.owner, Rc::clone(&self.data.scope), phase)
    }

    fn derive(&self, owner: SymbolId, scope: Rc<Scope>, phase: Phase) -> Self {
        let id = self.data.next_id.get();
        self.data.next_id.set(id + 1);
        Self {
            data: Rc::new(ContextData {
                parent: Some(self.clone()),
                owner,
                scope,
                phase,
                language: self.data.language,
                sink: Rc::clone(&self.data.sink),
                open_searches: Rc::clone(&self.data.open_searches),
                next_id: Rc::clone(&self.data.next_id),
                id,
            }),
        }
    }

    #[must_use]
    pub fn owner(&self) -> SymbolId {
        self.data.owner
    }

    #[must_use]
    pub fn scope(&self) -> Rc<Scope> {
        Rc::clone(&self.data.scope)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.data.phase
    }

    #[must_use]
    pub fn language(&self) -> LanguageSettings {
        self.data.language
    }

    #[must_use]
    pub fn parent(&self) -> Option<Context> {
        self.data.parent.clone()
    }

    /// Identity of this context, used to key the implicit-search cache.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.data.id
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        self.data.sink.borrow_mut().push(diagnostic);
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.data.sink.borrow().error_count()
    }

    #[must_use]
    pub fn diagnostic_count(&self) -> usize {
        self.data.sink.borrow().len()
    }

    /// Drain every accumulated diagnostic, leaving the sink empty.
    #[must_use]
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        let mut taken = DiagnosticSink::new("sema");
        self.data.sink.borrow_mut().drain_into(&mut taken);
        taken.into_vec()
    }

    /// Serialize the sink's contents for tooling consumers.
    #[must_use]
    pub fn diagnostics_json(&self) -> String {
        self.data.sink.borrow().to_json()
    }

    /// Run `trial` against a buffered sink. The caller inspects the
    /// outcome and either commits the buffer into this context's sink or
    /// abandons it.
    pub fn speculative<T>(&self, trial: impl FnOnce(&Context) -> T) -> Trial<T> {
        let id = self.data.next_id.get();
        self.data.next_id.set(id + 1);
        let buffered = Context {
            data: Rc::new(ContextData {
                parent: Some(self.clone()),
                owner: self.data.owner,
                scope: Rc::clone(&self.data.scope),
                phase: self.data.phase,
                language: self.data.language,
                sink: Rc::new(RefCell::new(DiagnosticSink::new("sema"))),
                open_searches: Rc::clone(&self.data.open_searches),
                next_id: Rc::clone(&self.data.next_id),
                id,
            }),
        };
        let value = trial(&buffered);
        let mut sink = DiagnosticSink::new("sema");
        buffered.data.sink.borrow_mut().drain_into(&mut sink);
        Trial { value, sink }
    }

    /// Mark `required` as under search. Returns `false` when the same
    /// required type is already open on this chain, which callers must
    /// treat as divergence.
    #[must_use]
    pub fn enter_search(&self, required: &Type) -> bool {
        let mut open = self.data.open_searches.borrow_mut();
        if open.contains(required) {
            return false;
        }
        open.push(required.clone());
        true
    }

    /// Pop the most recent open search. Callers pair this with a
    /// successful [`Context::enter_search`].
    pub fn exit_search(&self, required: &Type) {
        let mut open = self.data.open_searches.borrow_mut();
        if let Some(position) = open.iter().rposition(|t| t == required) {
            open.remove(position);
        }
    }

    #[must_use]
    pub fn open_search_depth(&self) -> usize {
        self.data.open_searches.borrow().len()
    }
}

/// Result of a speculative run: the trial's value plus its buffered
/// diagnostics.
pub struct Trial<T> {
    pub value: T,
    sink: DiagnosticSink,
}

impl<T> Trial<T> {
    /// Whether the trial reported any error.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.sink.error_count() > 0
    }

    /// Merge the buffered diagnostics into `ctx` and yield the value.
    pub fn commit(mut self, ctx: &Context) -> T {
        self.sink.drain_into(&mut ctx.data.sink.borrow_mut());
        self.value
    }

    /// Drop the buffered diagnostics and yield the value.
    #[must_use]
    pub fn abandon(self) -> T {
        self.value
    }
}
