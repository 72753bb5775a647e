//! The scope chain.
//!
//! Each scope owns the symbols declared directly in it and links to its
//! parent. Lookups walk outward and the innermost declaration wins.

use buckle_bound::{builtins, FunctionSymbol, Symbol, VariableSymbol};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

#[derive(Debug, Default)]
pub struct BoundScope {
    /// The enclosing scope (None for the root scope).
    pub parent: Option<Box<BoundScope>>,
    variables: FxIndexMap<String, Arc<VariableSymbol>>,
    /// Overloads by name, in declaration order.
    functions: FxIndexMap<String, Vec<Arc<FunctionSymbol>>>,
}

impl BoundScope {
    pub fn new(parent: Option<Box<BoundScope>>) -> Self {
        Self {
            parent,
            variables: FxIndexMap::default(),
            functions: FxIndexMap::default(),
        }
    }

    /// The root scope, seeded with every built-in function.
    pub fn root() -> Self {
        let mut scope = Self::new(None);
        for function in builtins::all() {
            scope.try_declare_function(function.clone());
        }
        scope
    }

    /// Declare `variable` here. Fails only if this scope already declares a
    /// variable of the same name; shadowing an outer one is allowed.
    pub fn try_declare_variable(&mut self, variable: Arc<VariableSymbol>) -> bool {
        if self.variables.contains_key(variable.name()) {
            return false;
        }
        self.variables.insert(variable.name().to_string(), variable);
        true
    }

    /// Declare `function` here. Fails if this scope already declares a
    /// function with the same signature.
    pub fn try_declare_function(&mut self, function: Arc<FunctionSymbol>) -> bool {
        let overloads = self.functions.entry(function.name().to_string()).or_default();
        if overloads.iter().any(|existing| existing.signature_matches(&function)) {
            return false;
        }
        overloads.push(function);
        true
    }

    pub fn try_lookup_variable(&self, name: &str) -> Option<Arc<VariableSymbol>> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(variable) = current.variables.get(name) {
                return Some(variable.clone());
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Find the innermost function whose signature matches `function`.
    pub fn try_lookup_function(&self, function: &FunctionSymbol) -> Option<Arc<FunctionSymbol>> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            let found = current
                .functions
                .get(function.name())
                .and_then(|overloads| overloads.iter().find(|f| f.signature_matches(function)));
            if let Some(found) = found {
                return Some(found.clone());
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Every visible overload named `name`. An inner declaration hides an
    /// outer one with the same signature.
    pub fn lookup_functions(&self, name: &str) -> Vec<Arc<FunctionSymbol>> {
        let mut found: Vec<Arc<FunctionSymbol>> = Vec::new();
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(overloads) = current.functions.get(name) {
                for overload in overloads {
                    if !found.iter().any(|f| f.signature_matches(overload)) {
                        found.push(overload.clone());
                    }
                }
            }
            scope = current.parent.as_deref();
        }
        found
    }

    /// Resolve a name to whatever symbol it denotes, innermost first.
    /// Variables take precedence over functions within one scope.
    pub fn try_lookup_symbol(&self, name: &str) -> Option<Symbol> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(variable) = current.variables.get(name) {
                return Some(Symbol::Variable(variable.clone()));
            }
            if let Some(function) = current.functions.get(name).and_then(|overloads| overloads.first()) {
                return Some(Symbol::Function(function.clone()));
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Variables declared directly in this scope.
    pub fn declared_variables(&self) -> Vec<Arc<VariableSymbol>> {
        self.variables.values().cloned().collect()
    }

    /// Functions declared directly in this scope.
    pub fn declared_functions(&self) -> Vec<Arc<FunctionSymbol>> {
        self.functions.values().flatten().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buckle_bound::{TypeClause, VariableKind};

    fn variable(name: &str) -> Arc<VariableSymbol> {
        VariableSymbol::new(name, TypeClause::INT, VariableKind::Local, None)
    }

    #[test]
    fn test_redeclaration_in_same_scope_fails() {
        let mut scope = BoundScope::new(None);
        assert!(scope.try_declare_variable(variable("x")));
        assert!(!scope.try_declare_variable(variable("x")));
    }

    #[test]
    fn test_shadowing_outer_scope() {
        let mut outer = BoundScope::new(None);
        let outer_x = variable("x");
        outer.try_declare_variable(outer_x.clone());

        let mut inner = BoundScope::new(Some(Box::new(outer)));
        assert_eq!(inner.try_lookup_variable("x"), Some(outer_x.clone()));

        let inner_x = variable("x");
        assert!(inner.try_declare_variable(inner_x.clone()));
        assert_eq!(inner.try_lookup_variable("x"), Some(inner_x));
        assert!(inner.declared_variables().len() == 1);

        let outer = inner.parent.take().unwrap();
        assert_eq!(outer.try_lookup_variable("x"), Some(outer_x));
    }

    #[test]
    fn test_root_scope_has_builtins() {
        let root = BoundScope::root();
        assert_eq!(root.lookup_functions("Value").len(), 5);
        let print_line = builtins::all().find(|f| f.name() == "PrintLine").unwrap();
        assert!(root.try_lookup_function(print_line).is_some());
        assert!(root.try_lookup_variable("PrintLine").is_none());
    }

    #[test]
    fn test_function_overloads_by_signature() {
        let mut scope = BoundScope::new(None);
        let by_int = FunctionSymbol::new(
            "f",
            vec![VariableSymbol::parameter("a", TypeClause::INT)],
            TypeClause::VOID,
            None,
        );
        let by_string = FunctionSymbol::new(
            "f",
            vec![VariableSymbol::parameter("a", TypeClause::STRING)],
            TypeClause::VOID,
            None,
        );
        let again = FunctionSymbol::new(
            "f",
            vec![VariableSymbol::parameter("a", TypeClause::INT)],
            TypeClause::INT,
            None,
        );
        assert!(scope.try_declare_function(by_int));
        assert!(scope.try_declare_function(by_string));
        assert!(!scope.try_declare_function(again));
        assert_eq!(scope.lookup_functions("f").len(), 2);
        assert_eq!(scope.declared_functions().len(), 2);
    }

    #[test]
    fn test_inner_function_hides_outer_with_same_signature() {
        let mut outer = BoundScope::root();
        let user = FunctionSymbol::new(
            "Print",
            vec![VariableSymbol::parameter("text", TypeClause::ANY)],
            TypeClause::VOID,
            Some(buckle_core::text::TextSpan::new(0, 5)),
        );
        assert!(!outer.try_declare_function(user.clone()));

        let mut inner = BoundScope::new(Some(Box::new(outer)));
        assert!(inner.try_declare_function(user));
        let found = inner.lookup_functions("Print");
        assert_eq!(found.len(), 1);
        assert!(found[0].declaration().is_some());
    }
}
