//! Built-in intrinsic functions.
//!
//! Built-ins are ordinary `FunctionSymbol`s seeded into the root scope. The
//! evaluator recognizes them by structural signature, not by identity.

use crate::symbols::{FunctionSymbol, VariableSymbol};
use crate::types::{TypeClause, TypeSymbol};
use std::sync::{Arc, OnceLock};

/// The intrinsic behind a built-in function symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    PrintLine,
    Input,
    RandInt,
    Value,
    HasValue,
}

fn function(name: &str, parameters: &[(&str, TypeClause)], type_clause: TypeClause) -> Arc<FunctionSymbol> {
    let parameters = parameters
        .iter()
        .map(|(name, type_clause)| VariableSymbol::parameter(name, *type_clause))
        .collect();
    FunctionSymbol::new(name, parameters, type_clause, None)
}

static TABLE: OnceLock<Vec<(Arc<FunctionSymbol>, Builtin)>> = OnceLock::new();

fn table() -> &'static [(Arc<FunctionSymbol>, Builtin)] {
    TABLE.get_or_init(|| {
        let any = TypeClause::ANY;
        let value = |type_clause: TypeClause| {
            let result = TypeClause::non_nullable(type_clause.base());
            (function("Value", &[("value", type_clause)], result), Builtin::Value)
        };
        vec![
            (function("Print", &[("text", any)], TypeClause::VOID), Builtin::Print),
            (function("PrintLine", &[("text", any)], TypeClause::VOID), Builtin::PrintLine),
            (function("Input", &[], TypeClause::non_nullable(TypeSymbol::String)), Builtin::Input),
            (
                function("RandInt", &[("max", TypeClause::INT)], TypeClause::non_nullable(TypeSymbol::Int)),
                Builtin::RandInt,
            ),
            value(TypeClause::ANY),
            value(TypeClause::BOOL),
            value(TypeClause::INT),
            value(TypeClause::DECIMAL),
            value(TypeClause::STRING),
            (
                function("HasValue", &[("value", any)], TypeClause::non_nullable(TypeSymbol::Bool)),
                Builtin::HasValue,
            ),
        ]
    })
}

/// Every built-in function symbol, in declaration order.
pub fn all() -> impl Iterator<Item = &'static Arc<FunctionSymbol>> {
    table().iter().map(|(function, _)| function)
}

/// Identify a built-in by name and parameter signature.
pub fn classify(function: &FunctionSymbol) -> Option<Builtin> {
    table()
        .iter()
        .find(|(builtin, _)| builtin.as_ref() == function)
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_structural() {
        let lookalike = function("PrintLine", &[("text", TypeClause::ANY)], TypeClause::VOID);
        assert_eq!(classify(&lookalike), Some(Builtin::PrintLine));
        let user = function("PrintLine", &[("message", TypeClause::ANY)], TypeClause::VOID);
        assert_eq!(classify(&user), None);
    }

    #[test]
    fn test_value_overloads() {
        let overloads = all().filter(|f| f.name() == "Value").count();
        assert_eq!(overloads, 5);
        let decimal = function(
            "Value",
            &[("value", TypeClause::DECIMAL)],
            TypeClause::non_nullable(TypeSymbol::Decimal),
        );
        assert_eq!(classify(&decimal), Some(Builtin::Value));
    }
}
