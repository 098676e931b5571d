//! Constant parameterization
//!
//! Lifts every literal constant of a statement into a synthetic `?` slot so
//! that statements differing only in constant values share one compiled plan.
//! Slot types follow the literal's lexical form, not its value.

use crate::lexer::{Token, TokenKind};
use crate::splitter::Statement;
use query_core::{ParamType, TypeSignature, Value};

/// Canonical text of a statement with its constants extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameterized {
    /// Statement text with each constant replaced by `?`
    pub canonical: String,
    /// Lexical type of each extracted constant, left to right
    pub signature: TypeSignature,
    /// The extracted constants, ready to be bound to the slots
    pub constants: Vec<Value>,
}

/// Parameterize a statement that carries no user `?` markers.
///
/// Comments are dropped and whitespace runs collapse to a single space.
/// Everything else, aliases included, is kept verbatim.
pub fn parameterize(stmt: &Statement) -> Parameterized {
    let mut canonical = String::with_capacity(stmt.text().len());
    let mut signature = TypeSignature::empty();
    let mut constants = Vec::new();
    let mut pending_space = false;

    for token in stmt.tokens() {
        if token.is_trivia() {
            pending_space = true;
            continue;
        }

        if pending_space && !canonical.is_empty() {
            canonical.push(' ');
        }
        pending_space = false;

        match literal_value(token) {
            Some((ty, value)) => {
                canonical.push('?');
                signature.push(ty);
                constants.push(value);
            }
            None => canonical.push_str(&token.text),
        }
    }

    Parameterized {
        canonical,
        signature,
        constants,
    }
}

fn literal_value(token: &Token) -> Option<(ParamType, Value)> {
    let text = token.text.as_str();
    match token.kind {
        TokenKind::Integer => match text.parse::<i64>() {
            Ok(i) => Some((ParamType::Integer, Value::Integer(i))),
            // Out of BIGINT range: only an exact decimal can hold it.
            Err(_) => Some((ParamType::Decimal, Value::decimal(text))),
        },
        TokenKind::Decimal => Some((ParamType::Decimal, Value::decimal(text))),
        TokenKind::Float => text
            .parse::<f64>()
            .ok()
            .map(|f| (ParamType::Float, Value::Float(f))),
        TokenKind::StringLit => {
            let inner = &text[1..text.len() - 1];
            Some((ParamType::String, Value::String(inner.replace("''", "'"))))
        }
        TokenKind::HexLit => {
            let inner = &text[2..text.len() - 1];
            decode_hex(inner).map(|bytes| (ParamType::Varbinary, Value::Varbinary(bytes)))
        }
        _ => None,
    }
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(sql: &str) -> Parameterized {
        parameterize(&Statement::new(sql).unwrap())
    }

    #[test]
    fn test_integer_constant() {
        let p = param("SELECT ID FROM R1 WHERE ID > 1");
        assert_eq!(p.canonical, "SELECT ID FROM R1 WHERE ID > ?");
        assert_eq!(p.signature.types(), &[ParamType::Integer]);
        assert_eq!(p.constants, vec![Value::Integer(1)]);
    }

    #[test]
    fn test_same_shape_different_values_share_canonical_text() {
        let a = param("SELECT ID FROM R1 WHERE ID > 1");
        let b = param("SELECT ID FROM R1 WHERE ID > 25");
        assert_eq!(a.canonical, b.canonical);
        assert_eq!(a.signature, b.signature);
        assert_ne!(a.constants, b.constants);
    }

    #[test]
    fn test_lexical_forms_give_distinct_signatures() {
        let int = param("SELECT ID FROM R1 WHERE ID > 1");
        let dec = param("SELECT ID FROM R1 WHERE ID > 1.0");
        let flt = param("SELECT ID FROM R1 WHERE ID > 1.0e-1");

        assert_eq!(int.canonical, dec.canonical);
        assert_eq!(dec.canonical, flt.canonical);
        assert_eq!(int.signature.types(), &[ParamType::Integer]);
        assert_eq!(dec.signature.types(), &[ParamType::Decimal]);
        assert_eq!(flt.signature.types(), &[ParamType::Float]);
    }

    #[test]
    fn test_alias_is_part_of_canonical_text() {
        let a = param("SELECT ID FROM R1 WHERE ID > 1");
        let b = param("SELECT B.ID FROM R1 B WHERE B.ID > 1");
        assert_ne!(a.canonical, b.canonical);
    }

    #[test]
    fn test_strings_hex_and_ordering() {
        let p = param("SELECT * FROM T WHERE A = 'it''s' AND B = X'0AFF' AND C < 2.5");
        assert_eq!(p.canonical, "SELECT * FROM T WHERE A = ? AND B = ? AND C < ?");
        assert_eq!(
            p.constants,
            vec![
                Value::String("it's".into()),
                Value::Varbinary(vec![0x0a, 0xff]),
                Value::decimal("2.5"),
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers_untouched() {
        let p = param("SELECT * FROM T1 WHERE A IS NULL AND B = TRUE");
        assert_eq!(p.canonical, "SELECT * FROM T1 WHERE A IS NULL AND B = TRUE");
        assert!(p.signature.is_empty());
    }

    #[test]
    fn test_whitespace_and_comments_collapse() {
        let p = param("SELECT  *\n  FROM T /* hint */ WHERE A = -7 -- trailing");
        assert_eq!(p.canonical, "SELECT * FROM T WHERE A = -?");
        assert_eq!(p.constants, vec![Value::Integer(7)]);
    }

    #[test]
    fn test_oversized_integer_becomes_decimal() {
        let p = param("SELECT * FROM T WHERE A = 99999999999999999999");
        assert_eq!(p.signature.types(), &[ParamType::Decimal]);
    }

    #[test]
    fn test_deterministic() {
        let sql = "SELECT A FROM T WHERE B = 'x' AND C = 3";
        assert_eq!(param(sql), param(sql));
    }
}
