//! Runtime values and compile-time constants.

use crate::types::TypeSymbol;
use std::fmt;

/// A value produced by evaluation or known at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(f64),
    String(String),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Ints widen to decimals.
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Value::Decimal(value) => Some(*value),
            Value::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Name of the runtime kind, used in internal error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => TypeSymbol::Bool.name(),
            Value::Int(_) => TypeSymbol::Int.name(),
            Value::Decimal(_) => TypeSymbol::Decimal.name(),
            Value::String(_) => TypeSymbol::String.name(),
            Value::Array(_) => "array",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Int(value) => write!(f, "{}", value),
            Value::Decimal(value) => write!(f, "{}", value),
            Value::String(value) => f.write_str(value),
            Value::Array(items) => {
                f.write_str("{ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// A value that cannot be converted to the requested type.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionFault {
    pub value: String,
    pub target: TypeSymbol,
}

impl Value {
    /// Convert to the scalar type `target`. Null converts to null and any
    /// array passes through unchanged.
    pub fn convert(&self, target: TypeSymbol) -> Result<Value, ConversionFault> {
        let fault = || ConversionFault {
            value: self.to_string(),
            target,
        };
        let value = match (self, target) {
            (Value::Null, _) => Value::Null,
            (Value::Array(_), _) | (_, TypeSymbol::Any) => self.clone(),
            (Value::Bool(v), TypeSymbol::Bool) => Value::Bool(*v),
            (Value::Int(v), TypeSymbol::Bool) => Value::Bool(*v != 0),
            (Value::Decimal(v), TypeSymbol::Bool) => Value::Bool(*v != 0.0),
            (Value::String(v), TypeSymbol::Bool) => match v.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(fault()),
            },
            (Value::Bool(v), TypeSymbol::Int) => Value::Int(i64::from(*v)),
            (Value::Int(v), TypeSymbol::Int) => Value::Int(*v),
            (Value::Decimal(v), TypeSymbol::Int) => Value::Int(v.round_ties_even() as i64),
            (Value::String(v), TypeSymbol::Int) => Value::Int(v.trim().parse().map_err(|_| fault())?),
            (Value::Bool(v), TypeSymbol::Decimal) => Value::Decimal(if *v { 1.0 } else { 0.0 }),
            (Value::Int(v), TypeSymbol::Decimal) => Value::Decimal(*v as f64),
            (Value::Decimal(v), TypeSymbol::Decimal) => Value::Decimal(*v),
            (Value::String(v), TypeSymbol::Decimal) => {
                Value::Decimal(v.trim().parse().map_err(|_| fault())?)
            }
            (_, TypeSymbol::String) => Value::String(self.to_string()),
            (_, TypeSymbol::Void | TypeSymbol::Error) => return Err(fault()),
        };
        Ok(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// A compile-time constant attached to a bound expression.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundConstant {
    pub value: Value,
}

impl BoundConstant {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::Decimal(3.0).to_string(), "3");
        assert_eq!(Value::Decimal(2.5).to_string(), "2.5");
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::Null]).to_string(),
            "{ 1, null }"
        );
    }

    #[test]
    fn test_convert() {
        assert_eq!(Value::Decimal(2.5).convert(TypeSymbol::Int), Ok(Value::Int(2)));
        assert_eq!(Value::Decimal(3.5).convert(TypeSymbol::Int), Ok(Value::Int(4)));
        assert_eq!(Value::Int(0).convert(TypeSymbol::Bool), Ok(Value::Bool(false)));
        assert_eq!(Value::from(" 42 ").convert(TypeSymbol::Int), Ok(Value::Int(42)));
        assert_eq!(Value::Int(7).convert(TypeSymbol::String), Ok(Value::from("7")));
        assert_eq!(Value::Null.convert(TypeSymbol::Int), Ok(Value::Null));
        assert!(Value::from("abc").convert(TypeSymbol::Decimal).is_err());
    }

    #[test]
    fn test_int_widens_to_decimal() {
        assert_eq!(Value::Int(2).as_decimal(), Some(2.0));
        assert_eq!(Value::Bool(true).as_decimal(), None);
    }
}
