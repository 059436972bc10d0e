use crate::token::Position;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("invalid character '{ch}'")]
    InvalidChar { ch: char },
    #[error("invalid digit '{ch}' in {radix} literal")]
    InvalidDigit { ch: char, radix: &'static str },
    #[error("integer literal overflow")]
    IntOverflow,
    #[error("unterminated block comment")]
    UnterminatedComment,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("lex error at {pos}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub pos: Position,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unexpected token, expected {expected}, found {found}")]
    UnexpectedToken { expected: &'static str, found: &'static str },
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("from lexer: {0}")]
    FromLex(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("parse error at {pos}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub pos: Position,
}

/// Semantic failures raised while lowering the AST to linear IR. Any one of
/// these aborts the whole translation; there is no partial-success mode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticErrorKind {
    #[error("nested definition of function '{name}'")]
    NestedFunction { name: String },
    #[error("function '{name}' is already defined")]
    DuplicateFunction { name: String },
    #[error("call to undefined function '{name}'")]
    UndefinedFunction { name: String },
    #[error("function '{name}' expects {expected} argument(s), got {got}")]
    ArityMismatch { name: String, expected: usize, got: usize },
    #[error("break outside of a loop")]
    BreakOutsideLoop,
    #[error("continue outside of a loop")]
    ContinueOutsideLoop,
    #[error("use of undeclared identifier '{name}'")]
    UnresolvedIdentifier { name: String },
    #[error("void value used in an expression")]
    VoidValue,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("semantic error at {pos}: {kind}")]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub pos: Position,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, pos: Position) -> Self { Self { kind, pos } }
}

pub type LexResult<T> = Result<T, LexError>;
pub type ParseResult<T> = Result<T, ParseError>;
pub type SemanticResult<T> = Result<T, SemanticError>;
