//! Symbols: variables, parameters and functions.
//!
//! Variables are identified by a unique `SymbolId`. Functions are identified
//! structurally by name and parameter name/type sequence, so a signature
//! looked up from an earlier submission matches the one declared there.

use crate::types::TypeClause;
use crate::value::BoundConstant;
use buckle_core::text::TextSpan;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static NEXT_SYMBOL_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn fresh() -> Self {
        SymbolId(NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    GlobalVariable,
    Parameter,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Local,
    Global,
    Parameter,
}

#[derive(Debug)]
pub struct VariableSymbol {
    id: SymbolId,
    name: String,
    type_clause: TypeClause,
    kind: VariableKind,
    /// Set for read-only variables whose initializer is constant.
    constant: Option<BoundConstant>,
}

impl VariableSymbol {
    pub fn new(
        name: &str,
        type_clause: TypeClause,
        kind: VariableKind,
        constant: Option<BoundConstant>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: SymbolId::fresh(),
            name: name.to_string(),
            type_clause,
            kind,
            constant,
        })
    }

    pub fn parameter(name: &str, type_clause: TypeClause) -> Arc<Self> {
        Self::new(name, type_clause, VariableKind::Parameter, None)
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_clause(&self) -> TypeClause {
        self.type_clause
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn symbol_kind(&self) -> SymbolKind {
        match self.kind {
            VariableKind::Local => SymbolKind::Variable,
            VariableKind::Global => SymbolKind::GlobalVariable,
            VariableKind::Parameter => SymbolKind::Parameter,
        }
    }

    pub fn constant(&self) -> Option<&BoundConstant> {
        self.constant.as_ref()
    }

    pub fn is_global(&self) -> bool {
        self.kind == VariableKind::Global
    }

    pub fn is_read_only(&self) -> bool {
        self.type_clause.is_constant()
    }
}

impl PartialEq for VariableSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for VariableSymbol {}

impl Hash for VariableSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for VariableSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_clause, self.name)
    }
}

#[derive(Debug)]
pub struct FunctionSymbol {
    name: String,
    parameters: Vec<Arc<VariableSymbol>>,
    type_clause: TypeClause,
    /// Span of the declaring identifier. `None` for built-ins.
    declaration: Option<TextSpan>,
}

impl FunctionSymbol {
    pub fn new(
        name: &str,
        parameters: Vec<Arc<VariableSymbol>>,
        type_clause: TypeClause,
        declaration: Option<TextSpan>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            parameters,
            type_clause,
            declaration,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Arc<VariableSymbol>] {
        &self.parameters
    }

    pub fn type_clause(&self) -> TypeClause {
        self.type_clause
    }

    pub fn declaration(&self) -> Option<TextSpan> {
        self.declaration
    }

    /// Same name and the same parameter names and types, in order.
    pub fn signature_matches(&self, other: &FunctionSymbol) -> bool {
        self.name == other.name
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.name == b.name && a.type_clause == b.type_clause)
    }
}

impl PartialEq for FunctionSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.signature_matches(other)
    }
}

impl Eq for FunctionSymbol {}

impl Hash for FunctionSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        for parameter in &self.parameters {
            parameter.name.hash(state);
            parameter.type_clause.hash(state);
        }
    }
}

impl fmt::Display for FunctionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.type_clause, self.name)?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", parameter)?;
        }
        f.write_str(")")
    }
}

/// Any named symbol.
#[derive(Debug, Clone)]
pub enum Symbol {
    Variable(Arc<VariableSymbol>),
    Function(Arc<FunctionSymbol>),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Variable(variable) => variable.name(),
            Symbol::Function(function) => function.name(),
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Variable(variable) => variable.symbol_kind(),
            Symbol::Function(_) => SymbolKind::Function,
        }
    }

    pub fn type_clause(&self) -> TypeClause {
        match self {
            Symbol::Variable(variable) => variable.type_clause(),
            Symbol::Function(function) => function.type_clause(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Variable(variable) => write!(f, "{}", variable),
            Symbol::Function(function) => write!(f, "{}", function),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeSymbol;

    #[test]
    fn test_variables_are_distinct_by_identity() {
        let a = VariableSymbol::new("x", TypeClause::INT, VariableKind::Local, None);
        let b = VariableSymbol::new("x", TypeClause::INT, VariableKind::Local, None);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_functions_match_structurally() {
        let first = FunctionSymbol::new(
            "f",
            vec![VariableSymbol::parameter("a", TypeClause::INT)],
            TypeClause::VOID,
            None,
        );
        let second = FunctionSymbol::new(
            "f",
            vec![VariableSymbol::parameter("a", TypeClause::INT)],
            TypeClause::INT,
            Some(TextSpan::new(0, 1)),
        );
        let renamed = FunctionSymbol::new(
            "f",
            vec![VariableSymbol::parameter("b", TypeClause::INT)],
            TypeClause::VOID,
            None,
        );
        let retyped = FunctionSymbol::new(
            "f",
            vec![VariableSymbol::parameter("a", TypeClause::nullable(TypeSymbol::String))],
            TypeClause::VOID,
            None,
        );
        assert_eq!(first, second);
        assert_ne!(first, renamed);
        assert_ne!(first, retyped);
    }

    #[test]
    fn test_function_display() {
        let function = FunctionSymbol::new(
            "add",
            vec![
                VariableSymbol::parameter("a", TypeClause::INT),
                VariableSymbol::parameter("b", TypeClause::INT),
            ],
            TypeClause::INT,
            None,
        );
        assert_eq!(function.to_string(), "int add(int a, int b)");
    }
}
