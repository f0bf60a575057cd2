//! Symbol identity and the per-run symbol arena.
//!
//! A symbol is a stable handle created once per declaration; everything
//! phase-dependent about it lives in the denotation store.

use bitflags::bitflags;
use std::cell::RefCell;
use std::fmt;

use crate::diagnostics::Span;
use crate::sema::ty::Type;
use crate::syntax::{Name, Variance};

/// Stable handle into the symbol arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    /// The root module owning every top-level declaration.
    pub const ROOT: SymbolId = SymbolId(0);

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Class,
    TypeAlias,
    TypeParam,
    Method,
    Value,
    Module,
}

impl SymbolKind {
    #[must_use]
    pub fn is_type(self) -> bool {
        matches!(
            self,
            SymbolKind::Class | SymbolKind::TypeAlias | SymbolKind::TypeParam
        )
    }

    #[must_use]
    pub fn is_term(self) -> bool {
        matches!(self, SymbolKind::Method | SymbolKind::Value)
    }

    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::TypeAlias => "type alias",
            SymbolKind::TypeParam => "type parameter",
            SymbolKind::Method => "method",
            SymbolKind::Value => "value",
            SymbolKind::Module => "module",
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SymbolFlags: u32 {
        const ABSTRACT  = 1 << 0;
        const SEALED    = 1 << 1;
        /// Eligible as an implicit witness.
        const GIVEN     = 1 << 2;
        const MUTABLE   = 1 << 3;
        /// Entered into scope by an import rather than a declaration.
        const IMPORTED  = 1 << 4;
        const SYNTHETIC = 1 << 5;
        const PARAM     = 1 << 6;
    }
}

#[derive(Debug)]
struct SymbolData {
    name: Name,
    owner: SymbolId,
    kind: SymbolKind,
    flags: SymbolFlags,
    span: Option<Span>,
    /// Ordered type parameters of a class, alias, or poly method.
    type_params: Vec<SymbolId>,
    /// Declared default argument of a type parameter.
    default_arg: Option<Type>,
    /// Declaration-site variance of a type parameter.
    variance: Variance,
    /// Declared parents of a class, in linearization order, expressed in
    /// terms of the class's own type parameters.
    parents: Vec<Type>,
    /// Members of a class's associated scope, declaration-ordered.
    members: Vec<SymbolId>,
    /// Subset of members eligible for implicit search.
    givens: Vec<SymbolId>,
}

/// Append-only arena of every symbol created during a run.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: RefCell<Vec<SymbolData>>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        let table = Self {
            symbols: RefCell::new(Vec::new()),
        };
        let root = table.create(SymbolId(0), "<root>", SymbolKind::Module, SymbolFlags::empty());
        debug_assert_eq!(root, SymbolId::ROOT);
        table
    }

    /// Create a new symbol. Identity is permanent for the run.
    pub fn create(
        &self,
        owner: SymbolId,
        name: impl Into<Name>,
        kind: SymbolKind,
        flags: SymbolFlags,
    ) -> SymbolId {
        self.create_at(owner, name, kind, flags, None)
    }

    pub fn create_at(
        &self,
        owner: SymbolId,
        name: impl Into<Name>,
        kind: SymbolKind,
        flags: SymbolFlags,
        span: Option<Span>,
    ) -> SymbolId {
        let mut symbols = self.symbols.borrow_mut();
        let id = SymbolId(u32::try_from(symbols.len()).unwrap_or(u32::MAX));
        symbols.push(SymbolData {
            name: name.into(),
            owner,
            kind,
            flags,
            span,
            type_params: Vec::new(),
            default_arg: None,
            variance: Variance::Invariant,
            parents: Vec::new(),
            members: Vec::new(),
            givens: Vec::new(),
        });
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.borrow().is_empty()
    }

    #[must_use]
    pub fn name(&self, sym: SymbolId) -> Name {
        self.symbols.borrow()[sym.index()].name.clone()
    }

    #[must_use]
    pub fn kind(&self, sym: SymbolId) -> SymbolKind {
        self.symbols.borrow()[sym.index()].kind
    }

    #[must_use]
    pub fn flags(&self, sym: SymbolId) -> SymbolFlags {
        self.symbols.borrow()[sym.index()].flags
    }

    #[must_use]
    pub fn owner(&self, sym: SymbolId) -> SymbolId {
        self.symbols.borrow()[sym.index()].owner
    }

    #[must_use]
    pub fn span(&self, sym: SymbolId) -> Option<Span> {
        self.symbols.borrow()[sym.index()].span
    }

    pub fn add_flags(&self, sym: SymbolId, flags: SymbolFlags) {
        self.symbols.borrow_mut()[sym.index()].flags |= flags;
    }

    #[must_use]
    pub fn has_flag(&self, sym: SymbolId, flags: SymbolFlags) -> bool {
        self.flags(sym).contains(flags)
    }

    /// Whether `ancestor` appears on `sym`'s owner chain.
    #[must_use]
    pub fn is_owned_by(&self, sym: SymbolId, ancestor: SymbolId) -> bool {
        let symbols = self.symbols.borrow();
        let mut current = sym;
        loop {
            let owner = symbols[current.index()].owner;
            if owner == current {
                return false;
            }
            if owner == ancestor {
                return true;
            }
            current = owner;
        }
    }

    pub fn set_type_params(&self, sym: SymbolId, params: Vec<SymbolId>) {
        self.symbols.borrow_mut()[sym.index()].type_params = params;
    }

    #[must_use]
    pub fn type_params(&self, sym: SymbolId) -> Vec<SymbolId> {
        self.symbols.borrow()[sym.index()].type_params.clone()
    }

    pub fn set_variance(&self, sym: SymbolId, variance: Variance) {
        self.symbols.borrow_mut()[sym.index()].variance = variance;
    }

    #[must_use]
    pub fn variance(&self, sym: SymbolId) -> Variance {
        self.symbols.borrow()[sym.index()].variance
    }

    pub fn set_default_arg(&self, sym: SymbolId, default: Type) {
        self.symbols.borrow_mut()[sym.index()].default_arg = Some(default);
    }

    #[must_use]
    pub fn default_arg(&self, sym: SymbolId) -> Option<Type> {
        self.symbols.borrow()[sym.index()].default_arg.clone()
    }

    pub fn add_parent(&self, sym: SymbolId, parent: Type) {
        self.symbols.borrow_mut()[sym.index()].parents.push(parent);
    }

    #[must_use]
    pub fn parents(&self, sym: SymbolId) -> Vec<Type> {
        self.symbols.borrow()[sym.index()].parents.clone()
    }

    pub fn add_member(&self, sym: SymbolId, member: SymbolId) {
        self.symbols.borrow_mut()[sym.index()].members.push(member);
    }

    /// Members of `sym` sharing `name`, in declaration order.
    #[must_use]
    pub fn members_named(&self, sym: SymbolId, name: &str) -> Vec<SymbolId> {
        let symbols = self.symbols.borrow();
        symbols[sym.index()]
            .members
            .iter()
            .copied()
            .filter(|member| symbols[member.index()].name == name)
            .collect()
    }

    pub fn add_associated_given(&self, sym: SymbolId, given: SymbolId) {
        self.symbols.borrow_mut()[sym.index()].givens.push(given);
    }

    /// Givens in `sym`'s associated scope, declaration-ordered.
    #[must_use]
    pub fn associated_givens(&self, sym: SymbolId) -> Vec<SymbolId> {
        self.symbols.borrow()[sym.index()].givens.clone()
    }

    /// Short human description used in diagnostics.
    #[must_use]
    pub fn describe(&self, sym: SymbolId) -> String {
        let symbols = self.symbols.borrow();
        let data = &symbols[sym.index()];
        format!("{} `{}`", data.kind.describe(), data.name)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_symbol_owns_itself() {
        let table = SymbolTable::new();
        assert_eq!(table.owner(SymbolId::ROOT), SymbolId::ROOT);
        assert_eq!(table.name(SymbolId::ROOT), "<root>");
        assert!(!table.is_owned_by(SymbolId::ROOT, SymbolId::ROOT));
    }

    #[test]
    fn created_symbols_keep_identity_and_owner_chain() {
        let table = SymbolTable::new();
        let class = table.create(
            SymbolId::ROOT,
            "Box",
            SymbolKind::Class,
            SymbolFlags::empty(),
        );
        let param = table.create(class, "T", SymbolKind::TypeParam, SymbolFlags::PARAM);

        assert_ne!(class, param);
        assert_eq!(table.owner(param), class);
        assert!(table.is_owned_by(param, SymbolId::ROOT));
        assert!(table.is_owned_by(param, class));
        assert!(!table.is_owned_by(class, param));
        assert_eq!(table.describe(param), "type parameter `T`");
    }

    #[test]
    fn flags_accumulate() {
        let table = SymbolTable::new();
        let value = table.create(
            SymbolId::ROOT,
            "x",
            SymbolKind::Value,
            SymbolFlags::empty(),
        );
        table.add_flags(value, SymbolFlags::GIVEN | SymbolFlags::IMPORTED);
        assert!(table.has_flag(value, SymbolFlags::GIVEN));
        assert!(table.has_flag(value, SymbolFlags::IMPORTED));
        assert!(!table.has_flag(value, SymbolFlags::MUTABLE));
    }

    #[test]
    fn members_preserve_declaration_order_for_overloads() {
        let table = SymbolTable::new();
        let class = table.create(
            SymbolId::ROOT,
            "Util",
            SymbolKind::Class,
            SymbolFlags::empty(),
        );
        let first = table.create(class, "f", SymbolKind::Method, SymbolFlags::empty());
        let second = table.create(class, "f", SymbolKind::Method, SymbolFlags::empty());
        let other = table.create(class, "g", SymbolKind::Method, SymbolFlags::empty());
        table.add_member(class, first);
        table.add_member(class, second);
        table.add_member(class, other);

        assert_eq!(table.members_named(class, "f"), vec![first, second]);
        assert_eq!(table.members_named(class, "g"), vec![other]);
    }
}
