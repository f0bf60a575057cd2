//! Core definitions every compilation unit sees.
//!
//! `Any` and `Nothing` are aliases for the algebra's top and bottom so
//! that source-level references resolve to the canonical variants. The
//! literal classes back the precise types of literal terms, and a tiny
//! prelude of constructors (`Pair`, `Box`) is installed for collaborators
//! and tests.

use crate::sema::denotation::{DenotationStore, Phase, Validity};
use crate::sema::scope::Scope;
use crate::sema::symbol::{SymbolFlags, SymbolId, SymbolKind, SymbolTable};
use crate::sema::ty::Type;
use crate::syntax::Variance;

/// Handles to the built-in symbols, created once per run.
#[derive(Clone, Copy, Debug)]
pub struct Builtins {
    pub any: SymbolId,
    pub nothing: SymbolId,
    pub unit: SymbolId,
    pub int: SymbolId,
    pub string: SymbolId,
    pub boolean: SymbolId,
    pub pair: SymbolId,
    pub boxed: SymbolId,
}

impl Builtins {
    /// Create the built-in symbols, install their denotations, and enter
    /// their names into `scope`.
    pub fn install(table: &SymbolTable, denots: &DenotationStore, scope: &Scope) -> Builtins {
        let class = |name: &str| {
            let sym = table.create(
                SymbolId::ROOT,
                name,
                SymbolKind::Class,
                SymbolFlags::SYNTHETIC,
            );
            denots.install(sym, Type::Ref(sym), Validity::from(Phase::NAMER));
            scope.enter(name, sym);
            sym
        };
        let alias = |name: &str, info: Type| {
            let sym = table.create(
                SymbolId::ROOT,
                name,
                SymbolKind::TypeAlias,
                SymbolFlags::SYNTHETIC,
            );
            denots.install(sym, info, Validity::from(Phase::NAMER));
            scope.enter(name, sym);
            sym
        };

        let any = alias("Any", Type::Any);
        let nothing = alias("Nothing", Type::Nothing);
        let unit = class("Unit");
        let int = class("Int");
        let string = class("String");
        let boolean = class("Boolean");

        // Prelude constructors: a covariant pair and an invariant cell.
        let pair = class("Pair");
        let pair_a = table.create(pair, "A", SymbolKind::TypeParam, SymbolFlags::PARAM);
        let pair_b = table.create(pair, "B", SymbolKind::TypeParam, SymbolFlags::PARAM);
        table.set_type_params(pair, vec![pair_a, pair_b]);
        table.set_variance(pair_a, Variance::Covariant);
        table.set_variance(pair_b, Variance::Covariant);

        let boxed = class("Box");
        let boxed_t = table.create(boxed, "T", SymbolKind::TypeParam, SymbolFlags::PARAM);
        table.set_type_params(boxed, vec![boxed_t]);

        Builtins {
            any,
            nothing,
            unit,
            int,
            string,
            boolean,
            pair,
            boxed,
        }
    }

    /// The class a literal of each shape widens to.
    #[must_use]
    pub fn int_literal(&self, value: i64) -> Type {
        Type::int_lit(value, self.int)
    }

    #[must_use]
    pub fn str_literal(&self, value: impl Into<String>) -> Type {
        Type::str_lit(value, self.string)
    }

    #[must_use]
    pub fn bool_literal(&self, value: bool) -> Type {
        Type::bool_lit(value, self.boolean)
    }

    #[must_use]
    pub fn unit_type(&self) -> Type {
        Type::Ref(self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_enters_names_and_denotations() {
        let table = SymbolTable::new();
        let denots = DenotationStore::new();
        let scope = Scope::root();
        let builtins = Builtins::install(&table, &denots, &scope);

        assert_eq!(scope.lookup("Int"), vec![builtins.int]);
        assert_eq!(scope.lookup("Any"), vec![builtins.any]);
        assert_eq!(table.kind(builtins.any), SymbolKind::TypeAlias);
        assert_eq!(
            denots.at(builtins.any, Phase::TYPER).unwrap().info,
            Type::Any
        );
        assert_eq!(
            denots.at(builtins.nothing, Phase::TYPER).unwrap().info,
            Type::Nothing
        );
    }

    #[test]
    fn prelude_constructors_declare_their_variance() {
        let table = SymbolTable::new();
        let denots = DenotationStore::new();
        let scope = Scope::root();
        let builtins = Builtins::install(&table, &denots, &scope);

        let pair_params = table.type_params(builtins.pair);
        assert_eq!(pair_params.len(), 2);
        assert_eq!(table.variance(pair_params[0]), Variance::Covariant);

        let box_params = table.type_params(builtins.boxed);
        assert_eq!(box_params.len(), 1);
        assert_eq!(table.variance(box_params[0]), Variance::Invariant);
    }

    #[test]
    fn literal_helpers_use_the_builtin_classes() {
        let table = SymbolTable::new();
        let denots = DenotationStore::new();
        let scope = Scope::root();
        let builtins = Builtins::install(&table, &denots, &scope);

        assert_eq!(builtins.int_literal(5), Type::int_lit(5, builtins.int));
        assert_eq!(builtins.unit_type(), Type::Ref(builtins.unit));
    }
}
