//! Batch splitting on statement terminators

use crate::lexer::{scan, ScanError, Token, TokenKind};

/// One statement of a batch, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    text: String,
    tokens: Vec<Token>,
}

impl Statement {
    /// Scan a single statement. A trailing terminator is dropped if present.
    pub fn new(text: &str) -> Result<Self, ScanError> {
        let batch = split(text)?;
        let mut statements = batch.statements;
        if statements.len() == 1 {
            return Ok(statements.remove(0));
        }
        // Several pieces or none: keep the text whole so the caller sees what it passed.
        let text = text.trim().trim_end_matches(';').trim_end();
        Ok(Self::from_tokens(text.to_string(), scan(text)?))
    }

    fn from_tokens(text: String, tokens: Vec<Token>) -> Self {
        Self { text, tokens }
    }

    /// Exact statement text, trimmed and without the terminator.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of user-supplied `?` markers.
    pub fn param_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Param)
            .count()
    }

    pub fn has_user_params(&self) -> bool {
        self.tokens.iter().any(|t| t.kind == TokenKind::Param)
    }

    /// First keyword of the statement, upper-cased.
    pub fn leading_keyword(&self) -> Option<String> {
        self.tokens
            .iter()
            .find(|t| !t.is_trivia())
            .filter(|t| t.kind == TokenKind::Word)
            .map(|t| t.text.to_ascii_uppercase())
    }
}

/// Result of splitting a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitBatch {
    pub statements: Vec<Statement>,
    /// Two or more statements: the batch bypasses the plan cache entirely
    pub multi_statement: bool,
}

impl SplitBatch {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Total `?` markers across every statement.
    pub fn param_count(&self) -> usize {
        self.statements.iter().map(Statement::param_count).sum()
    }
}

/// Split `batch` on `;` outside of quotes and comments.
///
/// Statement order is preserved. Pieces holding only whitespace or comments
/// are dropped, so `"S1;"` is one statement and `"S1;S1;"` is two.
pub fn split(batch: &str) -> Result<SplitBatch, ScanError> {
    let tokens = scan(batch)?;

    let mut statements = Vec::new();
    let mut current: Vec<Token> = Vec::new();

    for token in tokens {
        if token.kind == TokenKind::Semicolon {
            push_statement(&mut statements, std::mem::take(&mut current));
        } else {
            current.push(token);
        }
    }
    push_statement(&mut statements, current);

    let multi_statement = statements.len() >= 2;
    Ok(SplitBatch {
        statements,
        multi_statement,
    })
}

/// Number of complete, terminated statements ahead of char `offset`.
///
/// Used when a batch fails to scan: zero means everything up to the failure
/// belongs to the first statement.
pub fn terminated_before(batch: &str, offset: usize) -> usize {
    let prefix: String = batch.chars().take(offset).collect();
    let Ok(tokens) = scan(&prefix) else {
        return 0;
    };
    let Some(last) = tokens.iter().rposition(|t| t.kind == TokenKind::Semicolon) else {
        return 0;
    };

    let mut statements = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    for token in tokens.into_iter().take(last + 1) {
        if token.kind == TokenKind::Semicolon {
            push_statement(&mut statements, std::mem::take(&mut current));
        } else {
            current.push(token);
        }
    }
    statements.len()
}

fn push_statement(statements: &mut Vec<Statement>, mut tokens: Vec<Token>) {
    if tokens.iter().all(Token::is_trivia) {
        return;
    }

    // Trim surrounding whitespace so the text matches what the caller wrote.
    while tokens
        .first()
        .is_some_and(|t| t.kind == TokenKind::Whitespace)
    {
        tokens.remove(0);
    }
    while tokens
        .last()
        .is_some_and(|t| t.kind == TokenKind::Whitespace)
    {
        tokens.pop();
    }

    let text: String = tokens.iter().map(|t| t.text.as_str()).collect();
    statements.push(Statement::from_tokens(text, tokens));
}
