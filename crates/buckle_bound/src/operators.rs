//! Operator tables.
//!
//! Every legal operator/operand combination is a row in a static table.
//! Binding an operator is a table lookup on the syntax kind and the operand
//! base types; a miss means the operator is not defined for those types.
//! The arithmetic itself also lives here so the constant folder and the
//! evaluator agree on semantics.

use crate::types::TypeClause;
use crate::value::Value;
use buckle_ast::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundUnaryOperatorKind {
    NumericalIdentity,
    NumericalNegation,
    BooleanNegation,
    BitwiseCompliment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundBinaryOperatorKind {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Power,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LeftShift,
    RightShift,
    EqualityEquals,
    EqualityNotEquals,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    Is,
    Isnt,
}

impl BoundBinaryOperatorKind {
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::LessThan | Self::GreaterThan | Self::LessOrEqual | Self::GreaterOrEqual
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, Self::EqualityEquals | Self::EqualityNotEquals)
    }
}

/// Why an operator could not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFault {
    DivideByZero,
    /// The operand values do not have the shape the operator was bound for.
    InvalidOperands,
}

#[derive(Debug, PartialEq)]
pub struct BoundUnaryOperator {
    pub syntax_kind: SyntaxKind,
    pub kind: BoundUnaryOperatorKind,
    pub operand_type: TypeClause,
    pub type_clause: TypeClause,
}

#[derive(Debug, PartialEq)]
pub struct BoundBinaryOperator {
    pub syntax_kind: SyntaxKind,
    pub kind: BoundBinaryOperatorKind,
    pub left_type: TypeClause,
    pub right_type: TypeClause,
    pub type_clause: TypeClause,
}

const fn unary(
    syntax_kind: SyntaxKind,
    kind: BoundUnaryOperatorKind,
    operand_type: TypeClause,
) -> BoundUnaryOperator {
    BoundUnaryOperator {
        syntax_kind,
        kind,
        operand_type,
        type_clause: operand_type,
    }
}

const fn binary(
    syntax_kind: SyntaxKind,
    kind: BoundBinaryOperatorKind,
    operand_type: TypeClause,
    type_clause: TypeClause,
) -> BoundBinaryOperator {
    BoundBinaryOperator {
        syntax_kind,
        kind,
        left_type: operand_type,
        right_type: operand_type,
        type_clause,
    }
}

use BoundBinaryOperatorKind as B;
use BoundUnaryOperatorKind as U;
use SyntaxKind as S;

static UNARY_OPERATORS: &[BoundUnaryOperator] = &[
    unary(S::ExclamationToken, U::BooleanNegation, TypeClause::BOOL),
    unary(S::PlusToken, U::NumericalIdentity, TypeClause::INT),
    unary(S::MinusToken, U::NumericalNegation, TypeClause::INT),
    unary(S::TildeToken, U::BitwiseCompliment, TypeClause::INT),
    unary(S::PlusToken, U::NumericalIdentity, TypeClause::DECIMAL),
    unary(S::MinusToken, U::NumericalNegation, TypeClause::DECIMAL),
];

static BINARY_OPERATORS: &[BoundBinaryOperator] = &[
    // int
    binary(S::PlusToken, B::Addition, TypeClause::INT, TypeClause::INT),
    binary(S::MinusToken, B::Subtraction, TypeClause::INT, TypeClause::INT),
    binary(S::AsteriskToken, B::Multiplication, TypeClause::INT, TypeClause::INT),
    binary(S::SlashToken, B::Division, TypeClause::INT, TypeClause::INT),
    binary(S::AsteriskAsteriskToken, B::Power, TypeClause::INT, TypeClause::INT),
    binary(S::AmpersandToken, B::BitwiseAnd, TypeClause::INT, TypeClause::INT),
    binary(S::PipeToken, B::BitwiseOr, TypeClause::INT, TypeClause::INT),
    binary(S::CaretToken, B::BitwiseXor, TypeClause::INT, TypeClause::INT),
    binary(S::LessThanLessThanToken, B::LeftShift, TypeClause::INT, TypeClause::INT),
    binary(S::GreaterThanGreaterThanToken, B::RightShift, TypeClause::INT, TypeClause::INT),
    binary(S::EqualsEqualsToken, B::EqualityEquals, TypeClause::INT, TypeClause::BOOL),
    binary(S::ExclamationEqualsToken, B::EqualityNotEquals, TypeClause::INT, TypeClause::BOOL),
    binary(S::LessThanToken, B::LessThan, TypeClause::INT, TypeClause::BOOL),
    binary(S::GreaterThanToken, B::GreaterThan, TypeClause::INT, TypeClause::BOOL),
    binary(S::LessThanEqualsToken, B::LessOrEqual, TypeClause::INT, TypeClause::BOOL),
    binary(S::GreaterThanEqualsToken, B::GreaterOrEqual, TypeClause::INT, TypeClause::BOOL),
    // decimal
    binary(S::PlusToken, B::Addition, TypeClause::DECIMAL, TypeClause::DECIMAL),
    binary(S::MinusToken, B::Subtraction, TypeClause::DECIMAL, TypeClause::DECIMAL),
    binary(S::AsteriskToken, B::Multiplication, TypeClause::DECIMAL, TypeClause::DECIMAL),
    binary(S::SlashToken, B::Division, TypeClause::DECIMAL, TypeClause::DECIMAL),
    binary(S::AsteriskAsteriskToken, B::Power, TypeClause::DECIMAL, TypeClause::DECIMAL),
    binary(S::EqualsEqualsToken, B::EqualityEquals, TypeClause::DECIMAL, TypeClause::BOOL),
    binary(S::ExclamationEqualsToken, B::EqualityNotEquals, TypeClause::DECIMAL, TypeClause::BOOL),
    binary(S::LessThanToken, B::LessThan, TypeClause::DECIMAL, TypeClause::BOOL),
    binary(S::GreaterThanToken, B::GreaterThan, TypeClause::DECIMAL, TypeClause::BOOL),
    binary(S::LessThanEqualsToken, B::LessOrEqual, TypeClause::DECIMAL, TypeClause::BOOL),
    binary(S::GreaterThanEqualsToken, B::GreaterOrEqual, TypeClause::DECIMAL, TypeClause::BOOL),
    // bool
    binary(S::AmpersandAmpersandToken, B::LogicalAnd, TypeClause::BOOL, TypeClause::BOOL),
    binary(S::PipePipeToken, B::LogicalOr, TypeClause::BOOL, TypeClause::BOOL),
    binary(S::AmpersandToken, B::LogicalAnd, TypeClause::BOOL, TypeClause::BOOL),
    binary(S::PipeToken, B::LogicalOr, TypeClause::BOOL, TypeClause::BOOL),
    binary(S::CaretToken, B::LogicalXor, TypeClause::BOOL, TypeClause::BOOL),
    binary(S::EqualsEqualsToken, B::EqualityEquals, TypeClause::BOOL, TypeClause::BOOL),
    binary(S::ExclamationEqualsToken, B::EqualityNotEquals, TypeClause::BOOL, TypeClause::BOOL),
    // string
    binary(S::PlusToken, B::Addition, TypeClause::STRING, TypeClause::STRING),
    binary(S::EqualsEqualsToken, B::EqualityEquals, TypeClause::STRING, TypeClause::BOOL),
    binary(S::ExclamationEqualsToken, B::EqualityNotEquals, TypeClause::STRING, TypeClause::BOOL),
    // any
    binary(S::EqualsEqualsToken, B::EqualityEquals, TypeClause::ANY, TypeClause::BOOL),
    binary(S::ExclamationEqualsToken, B::EqualityNotEquals, TypeClause::ANY, TypeClause::BOOL),
    binary(S::IsKeyword, B::Is, TypeClause::ANY, TypeClause::BOOL),
    binary(S::IsntKeyword, B::Isnt, TypeClause::ANY, TypeClause::BOOL),
];

fn operand_matches(expected: &TypeClause, actual: &TypeClause) -> bool {
    actual.dimensions() == 0 && expected.base() == actual.base()
}

impl BoundUnaryOperator {
    /// Find the operator for `syntax_kind` applied to `operand_type`.
    pub fn bind(syntax_kind: SyntaxKind, operand_type: &TypeClause) -> Option<&'static Self> {
        UNARY_OPERATORS
            .iter()
            .find(|op| op.syntax_kind == syntax_kind && operand_matches(&op.operand_type, operand_type))
    }

    /// Apply the operator. A null operand yields null.
    pub fn evaluate(&self, operand: &Value) -> Result<Value, OperatorFault> {
        if operand.is_null() {
            return Ok(Value::Null);
        }
        let value = match (self.kind, operand) {
            (U::NumericalIdentity, Value::Int(v)) => Value::Int(*v),
            (U::NumericalIdentity, Value::Decimal(v)) => Value::Decimal(*v),
            (U::NumericalNegation, Value::Int(v)) => Value::Int(v.wrapping_neg()),
            (U::NumericalNegation, Value::Decimal(v)) => Value::Decimal(-v),
            (U::BooleanNegation, Value::Bool(v)) => Value::Bool(!v),
            (U::BitwiseCompliment, Value::Int(v)) => Value::Int(!v),
            _ => return Err(OperatorFault::InvalidOperands),
        };
        Ok(value)
    }
}

impl BoundBinaryOperator {
    /// Find the operator for `syntax_kind` applied to the two operand types.
    pub fn bind(
        syntax_kind: SyntaxKind,
        left_type: &TypeClause,
        right_type: &TypeClause,
    ) -> Option<&'static Self> {
        BINARY_OPERATORS.iter().find(|op| {
            op.syntax_kind == syntax_kind
                && operand_matches(&op.left_type, left_type)
                && operand_matches(&op.right_type, right_type)
        })
    }

    /// The `is`/`isnt` row, which accepts an operand of any type.
    pub fn bind_null_test(syntax_kind: SyntaxKind) -> Option<&'static Self> {
        Self::bind(syntax_kind, &TypeClause::ANY, &TypeClause::ANY)
    }

    /// Apply the operator.
    ///
    /// Equality treats null structurally, ordering against null is `false`,
    /// and every other operator propagates null.
    pub fn evaluate(&self, left: &Value, right: &Value) -> Result<Value, OperatorFault> {
        match self.kind {
            B::Is => return Ok(Value::Bool(left.is_null())),
            B::Isnt => return Ok(Value::Bool(!left.is_null())),
            B::EqualityEquals => return Ok(Value::Bool(left == right)),
            B::EqualityNotEquals => return Ok(Value::Bool(left != right)),
            _ => {}
        }
        if left.is_null() || right.is_null() {
            if self.kind.is_ordering() {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Null);
        }

        match (left, right) {
            (Value::Int(l), Value::Int(r)) => evaluate_int(self.kind, *l, *r),
            (Value::Decimal(l), Value::Decimal(r)) => evaluate_decimal(self.kind, *l, *r),
            (Value::Bool(l), Value::Bool(r)) => evaluate_bool(self.kind, *l, *r),
            (Value::String(l), Value::String(r)) if self.kind == B::Addition => {
                let mut joined = String::with_capacity(l.len() + r.len());
                joined.push_str(l);
                joined.push_str(r);
                Ok(Value::String(joined))
            }
            _ => Err(OperatorFault::InvalidOperands),
        }
    }
}

fn evaluate_int(kind: BoundBinaryOperatorKind, l: i64, r: i64) -> Result<Value, OperatorFault> {
    let value = match kind {
        B::Addition => Value::Int(l.wrapping_add(r)),
        B::Subtraction => Value::Int(l.wrapping_sub(r)),
        B::Multiplication => Value::Int(l.wrapping_mul(r)),
        B::Division => {
            if r == 0 {
                return Err(OperatorFault::DivideByZero);
            }
            Value::Int(l.wrapping_div(r))
        }
        B::Power => Value::Int((l as f64).powf(r as f64) as i64),
        B::BitwiseAnd => Value::Int(l & r),
        B::BitwiseOr => Value::Int(l | r),
        B::BitwiseXor => Value::Int(l ^ r),
        B::LeftShift => Value::Int(l.wrapping_shl(r as u32)),
        B::RightShift => Value::Int(l.wrapping_shr(r as u32)),
        B::LessThan => Value::Bool(l < r),
        B::GreaterThan => Value::Bool(l > r),
        B::LessOrEqual => Value::Bool(l <= r),
        B::GreaterOrEqual => Value::Bool(l >= r),
        _ => return Err(OperatorFault::InvalidOperands),
    };
    Ok(value)
}

fn evaluate_decimal(kind: BoundBinaryOperatorKind, l: f64, r: f64) -> Result<Value, OperatorFault> {
    let value = match kind {
        B::Addition => Value::Decimal(l + r),
        B::Subtraction => Value::Decimal(l - r),
        B::Multiplication => Value::Decimal(l * r),
        B::Division => {
            if r == 0.0 {
                return Err(OperatorFault::DivideByZero);
            }
            Value::Decimal(l / r)
        }
        B::Power => Value::Decimal(l.powf(r)),
        B::LessThan => Value::Bool(l < r),
        B::GreaterThan => Value::Bool(l > r),
        B::LessOrEqual => Value::Bool(l <= r),
        B::GreaterOrEqual => Value::Bool(l >= r),
        _ => return Err(OperatorFault::InvalidOperands),
    };
    Ok(value)
}

fn evaluate_bool(kind: BoundBinaryOperatorKind, l: bool, r: bool) -> Result<Value, OperatorFault> {
    match kind {
        B::LogicalAnd => Ok(Value::Bool(l && r)),
        B::LogicalOr => Ok(Value::Bool(l || r)),
        B::LogicalXor => Ok(Value::Bool(l ^ r)),
        _ => Err(OperatorFault::InvalidOperands),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeSymbol;

    #[test]
    fn test_bind_unary() {
        let op = BoundUnaryOperator::bind(SyntaxKind::MinusToken, &TypeClause::DECIMAL).unwrap();
        assert_eq!(op.kind, BoundUnaryOperatorKind::NumericalNegation);
        assert!(BoundUnaryOperator::bind(SyntaxKind::TildeToken, &TypeClause::DECIMAL).is_none());
        assert!(BoundUnaryOperator::bind(SyntaxKind::ExclamationToken, &TypeClause::INT).is_none());
    }

    #[test]
    fn test_bind_binary_ignores_nullability() {
        let left = TypeClause::literal(TypeSymbol::Int);
        let op = BoundBinaryOperator::bind(SyntaxKind::LessThanToken, &left, &TypeClause::INT).unwrap();
        assert_eq!(op.type_clause.base(), TypeSymbol::Bool);
    }

    #[test]
    fn test_bind_binary_rejects_arrays() {
        let array = TypeClause::INT.with_dimensions(1);
        assert!(BoundBinaryOperator::bind(SyntaxKind::PlusToken, &array, &array).is_none());
    }

    #[test]
    fn test_string_concatenation() {
        let op = BoundBinaryOperator::bind(SyntaxKind::PlusToken, &TypeClause::STRING, &TypeClause::STRING)
            .unwrap();
        assert_eq!(
            op.evaluate(&Value::from("ab"), &Value::from("cd")),
            Ok(Value::from("abcd"))
        );
    }

    #[test]
    fn test_null_operands() {
        let add = BoundBinaryOperator::bind(SyntaxKind::PlusToken, &TypeClause::INT, &TypeClause::INT).unwrap();
        let less = BoundBinaryOperator::bind(SyntaxKind::LessThanToken, &TypeClause::INT, &TypeClause::INT).unwrap();
        let equals =
            BoundBinaryOperator::bind(SyntaxKind::EqualsEqualsToken, &TypeClause::INT, &TypeClause::INT).unwrap();
        assert_eq!(add.evaluate(&Value::Null, &Value::Int(1)), Ok(Value::Null));
        assert_eq!(less.evaluate(&Value::Int(1), &Value::Null), Ok(Value::Bool(false)));
        assert_eq!(equals.evaluate(&Value::Null, &Value::Null), Ok(Value::Bool(true)));
        assert_eq!(equals.evaluate(&Value::Int(3), &Value::Null), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_integer_division_by_zero() {
        let divide = BoundBinaryOperator::bind(SyntaxKind::SlashToken, &TypeClause::INT, &TypeClause::INT).unwrap();
        assert_eq!(divide.evaluate(&Value::Int(1), &Value::Int(0)), Err(OperatorFault::DivideByZero));
        assert_eq!(divide.evaluate(&Value::Int(7), &Value::Int(2)), Ok(Value::Int(3)));
    }

    #[test]
    fn test_power() {
        let power =
            BoundBinaryOperator::bind(SyntaxKind::AsteriskAsteriskToken, &TypeClause::INT, &TypeClause::INT).unwrap();
        assert_eq!(power.evaluate(&Value::Int(2), &Value::Int(10)), Ok(Value::Int(1024)));
    }

    #[test]
    fn test_null_test_operators() {
        let is = BoundBinaryOperator::bind_null_test(SyntaxKind::IsKeyword).unwrap();
        let isnt = BoundBinaryOperator::bind_null_test(SyntaxKind::IsntKeyword).unwrap();
        assert_eq!(is.evaluate(&Value::Null, &Value::Null), Ok(Value::Bool(true)));
        assert_eq!(isnt.evaluate(&Value::Int(1), &Value::Null), Ok(Value::Bool(true)));
    }
}
