use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a single parameter slot.
///
/// Literal constants are tagged by their lexical form and bind arguments by
/// their runtime variant, so `1`, `1.0` and `1.0e-1` carry three different tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    Null,
    Boolean,
    Integer,
    Decimal,
    Float,
    String,
    Varbinary,
    Timestamp,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Null => write!(f, "NULL"),
            ParamType::Boolean => write!(f, "BOOLEAN"),
            ParamType::Integer => write!(f, "INTEGER"),
            ParamType::Decimal => write!(f, "DECIMAL"),
            ParamType::Float => write!(f, "FLOAT"),
            ParamType::String => write!(f, "VARCHAR"),
            ParamType::Varbinary => write!(f, "VARBINARY"),
            ParamType::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

/// A bind argument or an extracted literal constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    /// Exact decimal kept in its lexical form
    Decimal(String),
    Float(f64),
    String(String),
    Varbinary(Vec<u8>),
    /// Microseconds since the epoch
    Timestamp(i64),
}

impl Value {
    pub fn param_type(&self) -> ParamType {
        match self {
            Value::Null => ParamType::Null,
            Value::Boolean(_) => ParamType::Boolean,
            Value::Integer(_) => ParamType::Integer,
            Value::Decimal(_) => ParamType::Decimal,
            Value::Float(_) => ParamType::Float,
            Value::String(_) => ParamType::String,
            Value::Varbinary(_) => ParamType::Varbinary,
            Value::Timestamp(_) => ParamType::Timestamp,
        }
    }

    pub fn decimal(text: impl Into<String>) -> Self {
        Value::Decimal(text.into())
    }

    /// Parse a bare literal the way it would appear in SQL text.
    ///
    /// Used by the shell to turn `--arg` values into typed arguments:
    /// quoted text is a string, `1` an integer, `1.5` a decimal, `1e3` a float.
    pub fn parse_literal(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case("null") {
            return Value::Null;
        }
        if text.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if text.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }
        if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
            return Value::String(text[1..text.len() - 1].replace("''", "'"));
        }
        if let Ok(i) = text.parse::<i64>() {
            return Value::Integer(i);
        }
        let has_exponent = text.contains(['e', 'E']);
        if !has_exponent && text.contains('.') && text.parse::<f64>().is_ok() {
            return Value::Decimal(text.to_string());
        }
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
        Value::String(text.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Float(v) => write!(f, "{:e}", v),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Varbinary(bytes) => {
                write!(f, "X'")?;
                for b in bytes {
                    write!(f, "{:02X}", b)?;
                }
                write!(f, "'")
            }
            Value::Timestamp(t) => write!(f, "TIMESTAMP({})", t),
        }
    }
}

/// Ordered parameter types of a parameterized statement, one per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSignature(Vec<ParamType>);

impl TypeSignature {
    pub fn new(types: Vec<ParamType>) -> Self {
        Self(types)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn of_values(values: &[Value]) -> Self {
        Self(values.iter().map(Value::param_type).collect())
    }

    pub fn push(&mut self, ty: ParamType) {
        self.0.push(ty);
    }

    pub fn types(&self) -> &[ParamType] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ParamType>> for TypeSignature {
    fn from(types: Vec<ParamType>) -> Self {
        Self(types)
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", ty)?;
        }
        write!(f, ")")
    }
}
