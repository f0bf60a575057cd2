//! Lexical scopes: name to visible-symbol mapping.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::sema::symbol::SymbolId;
use crate::syntax::Name;

/// One lexical region's names, chained to the enclosing region.
///
/// A name maps to every symbol declared under it here; overload sets keep
/// declaration order so tie-breaking stays deterministic.
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<Rc<Scope>>,
    entries: RefCell<HashMap<Name, Vec<SymbolId>>>,
    declared: RefCell<Vec<SymbolId>>,
    imported: RefCell<Vec<SymbolId>>,
}

impl Scope {
    #[must_use]
    pub fn root() -> Rc<Scope> {
        Rc::new(Scope::default())
    }

    #[must_use]
    pub fn nested(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            parent: Some(Rc::clone(parent)),
            entries: RefCell::new(HashMap::new()),
            declared: RefCell::new(Vec::new()),
            imported: RefCell::new(Vec::new()),
        })
    }

    pub fn enter(&self, name: impl Into<Name>, sym: SymbolId) {
        self.entries
            .borrow_mut()
            .entry(name.into())
            .or_default()
            .push(sym);
        self.declared.borrow_mut().push(sym);
    }

    /// Enter a symbol brought in by an import. Imported symbols are
    /// visible like declared ones but rank ahead of them during implicit
    /// search.
    pub fn enter_import(&self, name: impl Into<Name>, sym: SymbolId) {
        self.enter(name, sym);
        self.imported.borrow_mut().push(sym);
    }

    /// Symbols imported into this region, in import order.
    #[must_use]
    pub fn imported_here(&self) -> Vec<SymbolId> {
        self.imported.borrow().clone()
    }

    /// Symbols visible under `name` from this scope: the nearest region
    /// declaring the name wins (shadowing); its full overload set is
    /// returned in declaration order.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Vec<SymbolId> {
        let mut scope = self;
        loop {
            let here = scope.lookup_here(name);
            if !here.is_empty() {
                return here;
            }
            match &scope.parent {
                Some(parent) => scope = parent,
                None => return Vec::new(),
            }
        }
    }

    /// Symbols declared under `name` in this region only.
    #[must_use]
    pub fn lookup_here(&self, name: &str) -> Vec<SymbolId> {
        self.entries
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Every symbol entered in this region, in declaration order.
    #[must_use]
    pub fn declared_here(&self) -> Vec<SymbolId> {
        self.declared.borrow().clone()
    }

    #[must_use]
    pub fn parent(&self) -> Option<Rc<Scope>> {
        self.parent.clone()
    }

    /// All names declared in this region.
    #[must_use]
    pub fn names_here(&self) -> Vec<Name> {
        self.entries.borrow().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::symbol::{SymbolFlags, SymbolKind, SymbolTable};

    fn method(table: &SymbolTable, name: &str) -> SymbolId {
        table.create(
            SymbolId::ROOT,
            name,
            SymbolKind::Method,
            SymbolFlags::empty(),
        )
    }

    #[test]
    fn overload_sets_preserve_declaration_order() {
        let table = SymbolTable::new();
        let scope = Scope::root();
        let first = method(&table, "f");
        let second = method(&table, "f");
        scope.enter("f", first);
        scope.enter("f", second);

        assert_eq!(scope.lookup("f"), vec![first, second]);
    }

    #[test]
    fn inner_declarations_shadow_outer_ones() {
        let table = SymbolTable::new();
        let outer = Scope::root();
        let inner = Scope::nested(&outer);
        let outer_f = method(&table, "f");
        let inner_f = method(&table, "f");
        outer.enter("f", outer_f);
        inner.enter("f", inner_f);

        assert_eq!(inner.lookup("f"), vec![inner_f]);
        assert_eq!(outer.lookup("f"), vec![outer_f]);
    }

    #[test]
    fn lookup_falls_through_to_enclosing_scope() {
        let table = SymbolTable::new();
        let outer = Scope::root();
        let inner = Scope::nested(&outer);
        let g = method(&table, "g");
        outer.enter("g", g);

        assert_eq!(inner.lookup("g"), vec![g]);
        assert!(inner.lookup_here("g").is_empty());
        assert!(inner.lookup("missing").is_empty());
    }

    #[test]
    fn declared_here_records_entry_order_across_names() {
        let table = SymbolTable::new();
        let scope = Scope::root();
        let a = method(&table, "a");
        let b = method(&table, "b");
        let a2 = method(&table, "a");
        scope.enter("a", a);
        scope.enter("b", b);
        scope.enter("a", a2);

        assert_eq!(scope.declared_here(), vec![a, b, a2]);
    }

    #[test]
    fn imports_are_visible_and_tracked_separately() {
        let table = SymbolTable::new();
        let scope = Scope::root();
        let local = method(&table, "f");
        let foreign = method(&table, "g");
        scope.enter("f", local);
        scope.enter_import("g", foreign);

        assert_eq!(scope.lookup("g"), vec![foreign]);
        assert_eq!(scope.imported_here(), vec![foreign]);
        assert_eq!(scope.declared_here(), vec![local, foreign]);
    }
}
