use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// The single failure type returned by every public entry point.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CfglError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Eval(#[from] EvalError),
}

/// Coarse classification of a [`CfglError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Syntax,
    UndefinedConstant,
    Type,
    DivisionByZero,
    Overflow,
}

impl CfglError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            CfglError::Lexer(_) => ErrorKind::Lex,
            CfglError::Parser(_) => ErrorKind::Syntax,
            CfglError::Eval(EvalError::UndefinedConstant { .. }) => ErrorKind::UndefinedConstant,
            CfglError::Eval(EvalError::TypeMismatch { .. }) => ErrorKind::Type,
            CfglError::Eval(EvalError::DivisionByZero { .. }) => ErrorKind::DivisionByZero,
            CfglError::Eval(EvalError::Overflow { .. }) => ErrorKind::Overflow,
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum LexerError {
    #[error("Unexpected character '{found}' at line {line}, column {column}")]
    #[diagnostic(
        code(lexer::unexpected_character),
        help("Names use lowercase letters, digits and '_'; strings are written as @\"...\".")
    )]
    UnexpectedCharacter {
        #[source_code]
        src: NamedSource<String>,
        #[label("not valid here")]
        span: SourceSpan,
        found: char,
        line: usize,
        column: usize,
    },

    #[error("Unterminated string literal")]
    #[diagnostic(
        code(lexer::unterminated_string),
        help("Close the string with '\"'. Strings cannot contain a quote character.")
    )]
    UnterminatedString {
        #[source_code]
        src: NamedSource<String>,
        #[label("string starts here")]
        span: SourceSpan,
    },

    #[error("Number literal '{literal}' does not fit in a 64-bit integer")]
    #[diagnostic(code(lexer::number_out_of_range))]
    NumberOutOfRange {
        #[source_code]
        src: NamedSource<String>,
        #[label("out of range")]
        span: SourceSpan,
        literal: String,
    },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("Unexpected token: expected {expected}, found {found}")]
    #[diagnostic(
        code(parser::unexpected_token),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}, but found this")]
        span: SourceSpan,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input: expected {expected}")]
    #[diagnostic(
        code(parser::unexpected_eof),
        help("The input ended unexpectedly. The parser expected more tokens.")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,
        #[label("Input ended here")]
        span: SourceSpan,
        expected: String,
    },

    #[error("Values are nested deeper than {limit} levels")]
    #[diagnostic(
        code(parser::nesting_too_deep),
        help("Move inner parts into constants to flatten the structure.")
    )]
    NestingTooDeep {
        #[source_code]
        src: NamedSource<String>,
        #[label("limit reached here")]
        span: SourceSpan,
        limit: usize,
    },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum EvalError {
    #[error("Undefined constant '{name}'")]
    #[diagnostic(
        code(eval::undefined_constant),
        help("Declare it with `{name} <- value;` before the first use.")
    )]
    UndefinedConstant {
        #[source_code]
        src: NamedSource<String>,
        #[label("not declared before this point")]
        span: SourceSpan,
        name: String,
    },

    #[error("Type mismatch in {operation}: expected {expected}, found {found}")]
    #[diagnostic(code(eval::type_mismatch))]
    TypeMismatch {
        #[source_code]
        src: NamedSource<String>,
        #[label("this is {found}")]
        span: SourceSpan,
        operation: String,
        expected: String,
        found: String,
    },

    #[error("Division by zero")]
    #[diagnostic(code(eval::division_by_zero))]
    DivisionByZero {
        #[source_code]
        src: NamedSource<String>,
        #[label("this evaluates to 0")]
        span: SourceSpan,
    },

    #[error("Integer overflow in {operation}")]
    #[diagnostic(
        code(eval::overflow),
        help("Results must fit in a signed 64-bit integer.")
    )]
    Overflow {
        #[source_code]
        src: NamedSource<String>,
        #[label("overflows here")]
        span: SourceSpan,
        operation: String,
    },
}
