//! Cast classification.

use buckle_bound::{TypeClause, TypeSymbol};

/// How a value of one type reaches another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// No conversion path exists.
    None,
    /// Same type; no cast node is needed.
    Identity,
    /// Allowed without a cast in source.
    Implicit,
    /// Requires an explicit cast in source.
    Explicit,
}

impl Conversion {
    pub fn classify(from: &TypeClause, to: &TypeClause) -> Conversion {
        use TypeSymbol::*;

        if from.base() == Error || to.base() == Error || from.base() == Void || to.base() == Void {
            return Conversion::None;
        }

        if from.dimensions() > 0 || to.dimensions() > 0 {
            return if from.dimensions() == to.dimensions() && from.base() == to.base() {
                Conversion::Identity
            } else {
                Conversion::None
            };
        }

        match (from.base(), to.base()) {
            (a, b) if a == b => Conversion::Identity,
            (_, Any) => Conversion::Implicit,
            (Any, _) => Conversion::Explicit,
            (Int, Decimal) => Conversion::Implicit,
            (Decimal, Int) => Conversion::Explicit,
            (Bool | Int | Decimal, String) | (String, Bool | Int | Decimal) => Conversion::Explicit,
            _ => Conversion::None,
        }
    }

    pub fn exists(self) -> bool {
        self != Conversion::None
    }

    pub fn is_identity(self) -> bool {
        self == Conversion::Identity
    }

    pub fn is_implicit(self) -> bool {
        matches!(self, Conversion::Identity | Conversion::Implicit)
    }

    pub fn is_explicit(self) -> bool {
        self == Conversion::Explicit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_nullability() {
        let not_null = TypeClause::INT.as_non_nullable();
        assert_eq!(Conversion::classify(&TypeClause::INT, &not_null), Conversion::Identity);
        assert_eq!(
            Conversion::classify(&TypeClause::literal(TypeSymbol::Int), &TypeClause::INT),
            Conversion::Identity
        );
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(Conversion::classify(&TypeClause::INT, &TypeClause::DECIMAL), Conversion::Implicit);
        assert_eq!(Conversion::classify(&TypeClause::DECIMAL, &TypeClause::INT), Conversion::Explicit);
    }

    #[test]
    fn test_any() {
        assert_eq!(Conversion::classify(&TypeClause::STRING, &TypeClause::ANY), Conversion::Implicit);
        assert_eq!(Conversion::classify(&TypeClause::ANY, &TypeClause::BOOL), Conversion::Explicit);
    }

    #[test]
    fn test_string_and_bool() {
        assert!(Conversion::classify(&TypeClause::INT, &TypeClause::STRING).is_explicit());
        assert!(Conversion::classify(&TypeClause::STRING, &TypeClause::DECIMAL).is_explicit());
        assert!(Conversion::classify(&TypeClause::STRING, &TypeClause::BOOL).is_explicit());
        assert_eq!(Conversion::classify(&TypeClause::BOOL, &TypeClause::INT), Conversion::None);
        assert_eq!(Conversion::classify(&TypeClause::INT, &TypeClause::BOOL), Conversion::None);
    }

    #[test]
    fn test_no_conversion() {
        assert_eq!(Conversion::classify(&TypeClause::VOID, &TypeClause::INT), Conversion::None);
        assert_eq!(Conversion::classify(&TypeClause::ERROR, &TypeClause::INT), Conversion::None);
        let ints = TypeClause::INT.with_dimensions(1);
        assert_eq!(Conversion::classify(&ints, &TypeClause::INT), Conversion::None);
        assert_eq!(Conversion::classify(&ints, &TypeClause::DECIMAL.with_dimensions(1)), Conversion::None);
        assert_eq!(Conversion::classify(&ints, &ints.as_non_nullable()), Conversion::Identity);
    }
}
