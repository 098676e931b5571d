//! Arity check of user bind markers against supplied arguments

use crate::splitter::Statement;
use query_core::{ParamArityError, TypeSignature, Value};

/// Arguments bound to a statement's `?` markers by ordinal position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: Vec<Value>,
}

impl BoundArgs {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Value bound to the zero-based marker `ordinal`.
    pub fn get(&self, ordinal: usize) -> Option<&Value> {
        self.values.get(ordinal)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.values.iter().enumerate()
    }

    /// Runtime types of the bound values, in marker order.
    pub fn signature(&self) -> TypeSignature {
        TypeSignature::of_values(&self.values)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for BoundArgs {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// Bind `args` to the `?` markers of `stmt`.
pub fn bind(stmt: &Statement, args: &[Value]) -> Result<BoundArgs, ParamArityError> {
    let expected = stmt.param_count();
    if expected != args.len() {
        return Err(ParamArityError {
            expected,
            actual: args.len(),
        });
    }

    Ok(BoundArgs {
        values: args.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_core::ParamType;

    #[test]
    fn test_bind_matching_arity() {
        let stmt = Statement::new("SELECT * FROM T WHERE A > ? AND B = ?").unwrap();
        let bound = bind(&stmt, &[Value::Integer(1), Value::String("x".into())]).unwrap();

        assert_eq!(bound.len(), 2);
        assert_eq!(bound.get(0), Some(&Value::Integer(1)));
        assert_eq!(
            bound.signature().types(),
            &[ParamType::Integer, ParamType::String]
        );
    }

    #[test]
    fn test_bind_too_few() {
        let stmt = Statement::new("SELECT * FROM T WHERE A > ? AND B = ?").unwrap();
        let err = bind(&stmt, &[Value::Integer(1)]).unwrap_err();
        assert_eq!(
            err,
            ParamArityError {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_bind_args_without_markers() {
        let stmt = Statement::new("SELECT * FROM T WHERE A = '?'").unwrap();
        let err = bind(&stmt, &[Value::Integer(1)]).unwrap_err();
        assert_eq!(err.expected, 0);
        assert_eq!(err.actual, 1);
    }
}
