//! Compile-time evaluation of operators and casts over constant operands.

use crate::operators::{BoundBinaryOperator, BoundBinaryOperatorKind, BoundUnaryOperator};
use crate::tree::BoundExpression;
use crate::types::TypeClause;
use crate::value::{BoundConstant, Value};

pub fn fold_unary(operator: &BoundUnaryOperator, operand: &BoundExpression) -> Option<BoundConstant> {
    let operand = operand.constant()?;
    operator.evaluate(&operand.value).ok().map(BoundConstant::new)
}

/// Fold a binary expression. `&&` and `||` fold on a deciding left operand
/// even when the right operand is not constant. Faulting operations such as
/// division by zero are left for run time.
pub fn fold_binary(
    left: &BoundExpression,
    operator: &BoundBinaryOperator,
    right: &BoundExpression,
) -> Option<BoundConstant> {
    let left_constant = left.constant();
    let right_constant = right.constant();

    match (operator.kind, &left_constant) {
        (BoundBinaryOperatorKind::LogicalAnd, Some(BoundConstant { value: Value::Bool(false) })) => {
            return Some(BoundConstant::new(Value::Bool(false)));
        }
        (BoundBinaryOperatorKind::LogicalOr, Some(BoundConstant { value: Value::Bool(true) })) => {
            return Some(BoundConstant::new(Value::Bool(true)));
        }
        _ => {}
    }

    let left_constant = left_constant?;
    if matches!(operator.kind, BoundBinaryOperatorKind::Is | BoundBinaryOperatorKind::Isnt) {
        return operator
            .evaluate(&left_constant.value, &Value::Null)
            .ok()
            .map(BoundConstant::new);
    }
    let right_constant = right_constant?;
    operator
        .evaluate(&left_constant.value, &right_constant.value)
        .ok()
        .map(BoundConstant::new)
}

pub fn fold_cast(type_clause: &TypeClause, expression: &BoundExpression) -> Option<BoundConstant> {
    if type_clause.dimensions() > 0 {
        return None;
    }
    let constant = expression.constant()?;
    constant.value.convert(type_clause.base()).ok().map(BoundConstant::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeSymbol;
    use buckle_ast::SyntaxKind;
    use std::sync::Arc;

    fn int(value: i64) -> BoundExpression {
        BoundExpression::literal(Value::Int(value))
    }

    fn binary_op(kind: SyntaxKind, operand: TypeClause) -> &'static BoundBinaryOperator {
        BoundBinaryOperator::bind(kind, &operand, &operand).unwrap()
    }

    #[test]
    fn test_fold_arithmetic() {
        let op = binary_op(SyntaxKind::PlusToken, TypeClause::INT);
        assert_eq!(fold_binary(&int(14), op, &int(12)), Some(BoundConstant::new(Value::Int(26))));
    }

    #[test]
    fn test_division_by_zero_is_not_folded() {
        let op = binary_op(SyntaxKind::SlashToken, TypeClause::INT);
        assert_eq!(fold_binary(&int(1), op, &int(0)), None);
    }

    #[test]
    fn test_short_circuit_folding() {
        let op = binary_op(SyntaxKind::AmpersandAmpersandToken, TypeClause::BOOL);
        let unknown = BoundExpression::Error;
        let folded = fold_binary(&BoundExpression::literal(Value::Bool(false)), op, &unknown);
        assert_eq!(folded, Some(BoundConstant::new(Value::Bool(false))));
        let not_folded = fold_binary(&BoundExpression::literal(Value::Bool(true)), op, &unknown);
        assert_eq!(not_folded, None);
    }

    #[test]
    fn test_fold_unary_and_cast() {
        let negate = BoundUnaryOperator::bind(SyntaxKind::MinusToken, &TypeClause::INT).unwrap();
        assert_eq!(fold_unary(negate, &int(3)), Some(BoundConstant::new(Value::Int(-3))));

        let cast = BoundExpression::Cast {
            type_clause: TypeClause::DECIMAL,
            expression: Arc::new(int(2)),
            constant: None,
        };
        assert_eq!(cast.constant(), None);
        assert_eq!(
            fold_cast(&TypeClause::nullable(TypeSymbol::Decimal), &int(2)),
            Some(BoundConstant::new(Value::Decimal(2.0)))
        );
    }
}
