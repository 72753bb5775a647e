//! The type clause model.
//!
//! A `TypeClause` is an immutable value: every nullability or dimension
//! change produces a new clause.

use bitflags::bitflags;
use std::fmt;

/// The fixed set of base types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSymbol {
    Any,
    Bool,
    Int,
    Decimal,
    String,
    Void,
    Error,
}

impl TypeSymbol {
    pub fn name(self) -> &'static str {
        match self {
            TypeSymbol::Any => "any",
            TypeSymbol::Bool => "bool",
            TypeSymbol::Int => "int",
            TypeSymbol::Decimal => "decimal",
            TypeSymbol::String => "string",
            TypeSymbol::Void => "void",
            TypeSymbol::Error => "?",
        }
    }

    /// Resolve a type name as written in source.
    pub fn lookup(name: &str) -> Option<TypeSymbol> {
        match name {
            "any" => Some(TypeSymbol::Any),
            "bool" => Some(TypeSymbol::Bool),
            "int" => Some(TypeSymbol::Int),
            "decimal" => Some(TypeSymbol::Decimal),
            "string" => Some(TypeSymbol::String),
            "void" => Some(TypeSymbol::Void),
            _ => None,
        }
    }
}

impl fmt::Display for TypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Modifiers of a type occurrence.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        const IMPLICIT = 1 << 0;
        const CONSTANT_REFERENCE = 1 << 1;
        const REFERENCE = 1 << 2;
        const CONSTANT = 1 << 3;
        const NULLABLE = 1 << 4;
        const LITERAL = 1 << 5;
    }
}

/// A type occurrence: base type, modifiers and array rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeClause {
    base: TypeSymbol,
    flags: TypeFlags,
    dimensions: u32,
}

impl TypeClause {
    pub const ANY: TypeClause = TypeClause::nullable(TypeSymbol::Any);
    pub const BOOL: TypeClause = TypeClause::nullable(TypeSymbol::Bool);
    pub const INT: TypeClause = TypeClause::nullable(TypeSymbol::Int);
    pub const DECIMAL: TypeClause = TypeClause::nullable(TypeSymbol::Decimal);
    pub const STRING: TypeClause = TypeClause::nullable(TypeSymbol::String);
    pub const VOID: TypeClause = TypeClause::non_nullable(TypeSymbol::Void);
    pub const ERROR: TypeClause = TypeClause::nullable(TypeSymbol::Error);

    pub const fn new(base: TypeSymbol, flags: TypeFlags, dimensions: u32) -> Self {
        Self { base, flags, dimensions }
    }

    pub const fn nullable(base: TypeSymbol) -> Self {
        Self::new(base, TypeFlags::NULLABLE, 0)
    }

    pub const fn non_nullable(base: TypeSymbol) -> Self {
        Self::new(base, TypeFlags::empty(), 0)
    }

    /// The type of a literal of `base`. Literals are never null.
    pub const fn literal(base: TypeSymbol) -> Self {
        Self::new(base, TypeFlags::LITERAL, 0)
    }

    pub fn base(&self) -> TypeSymbol {
        self.base
    }

    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    pub fn is_implicit(&self) -> bool {
        self.flags.contains(TypeFlags::IMPLICIT)
    }

    pub fn is_constant_reference(&self) -> bool {
        self.flags.contains(TypeFlags::CONSTANT_REFERENCE)
    }

    pub fn is_reference(&self) -> bool {
        self.flags.contains(TypeFlags::REFERENCE)
    }

    pub fn is_constant(&self) -> bool {
        self.flags.contains(TypeFlags::CONSTANT)
    }

    pub fn is_nullable(&self) -> bool {
        self.flags.contains(TypeFlags::NULLABLE)
    }

    pub fn is_literal(&self) -> bool {
        self.flags.contains(TypeFlags::LITERAL)
    }

    pub fn is_error(&self) -> bool {
        self.base == TypeSymbol::Error
    }

    pub fn is_void(&self) -> bool {
        self.base == TypeSymbol::Void && self.dimensions == 0
    }

    /// Element type of an array, or `None` for a scalar.
    pub fn child_type(&self) -> Option<TypeClause> {
        if self.dimensions == 0 {
            return None;
        }
        Some(Self::new(self.base, self.flags, self.dimensions - 1))
    }

    /// The same clause with every dimension stripped.
    pub fn base_type(&self) -> TypeClause {
        Self::new(self.base, self.flags, 0)
    }

    pub fn with_dimensions(&self, dimensions: u32) -> TypeClause {
        Self::new(self.base, self.flags, dimensions)
    }

    pub fn with_flags(&self, flags: TypeFlags) -> TypeClause {
        Self::new(self.base, flags, self.dimensions)
    }

    pub fn with_nullability(&self, nullable: bool) -> TypeClause {
        let mut flags = self.flags;
        flags.set(TypeFlags::NULLABLE, nullable);
        self.with_flags(flags)
    }

    pub fn as_nullable(&self) -> TypeClause {
        self.with_nullability(true)
    }

    pub fn as_non_nullable(&self) -> TypeClause {
        self.with_nullability(false)
    }

    /// Equal in base type, reference-ness and dimensions. Nullability and
    /// constness are ignored.
    pub fn about_equal(a: &TypeClause, b: &TypeClause) -> bool {
        a.base == b.base && a.is_reference() == b.is_reference() && a.dimensions == b.dimensions
    }
}

impl fmt::Display for TypeClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_nullable() && !self.is_literal() && self.base != TypeSymbol::Void {
            f.write_str("[NotNull]")?;
        }
        if self.is_constant_reference() {
            f.write_str("const ")?;
        }
        if self.is_reference() {
            f.write_str("ref ")?;
        }
        if self.is_constant() {
            f.write_str("const ")?;
        }
        f.write_str(self.base.name())?;
        for _ in 0..self.dimensions {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_type_of_scalar_is_absent() {
        assert_eq!(TypeClause::INT.child_type(), None);
    }

    #[test]
    fn test_child_and_base_type() {
        let matrix = TypeClause::INT.with_dimensions(2);
        let row = matrix.child_type().unwrap();
        assert_eq!(row.dimensions(), 1);
        assert!(row.is_nullable());
        assert_eq!(matrix.base_type(), TypeClause::INT);
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeClause::INT.to_string(), "int");
        assert_eq!(TypeClause::literal(TypeSymbol::Bool).to_string(), "bool");
        assert_eq!(TypeClause::non_nullable(TypeSymbol::String).to_string(), "[NotNull]string");
        let clause = TypeClause::new(
            TypeSymbol::Int,
            TypeFlags::NULLABLE | TypeFlags::CONSTANT_REFERENCE | TypeFlags::REFERENCE | TypeFlags::CONSTANT,
            1,
        );
        assert_eq!(clause.to_string(), "const ref const int[]");
        assert_eq!(TypeClause::VOID.to_string(), "void");
    }

    #[test]
    fn test_nullability_produces_new_value() {
        let original = TypeClause::DECIMAL;
        let changed = original.as_non_nullable();
        assert!(original.is_nullable());
        assert!(!changed.is_nullable());
        assert!(TypeClause::about_equal(&original, &changed));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(TypeSymbol::lookup("decimal"), Some(TypeSymbol::Decimal));
        assert_eq!(TypeSymbol::lookup("float"), None);
    }
}
