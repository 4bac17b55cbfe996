use crate::ast::*;
use crate::error::{CfglError, LexerError, ParserError};
use crate::lexer::{Lexer, Token, TokenType};
use miette::NamedSource;
use std::sync::Arc;

/// How many values may be nested inside one another before parsing stops.
pub const MAX_NESTING_DEPTH: usize = 128;

/// A recursive descent parser for the configuration language.
///
/// Keywords are ordinary `Name` tokens; whether `begin`, `end`, `array` or
/// `len` act as keywords is decided here from the surrounding grammar.
#[derive(Debug)]
pub struct Parser<'a> {
    source: Arc<NamedSource<String>>,
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
    source_text: &'a str,
}

impl<'a> Parser<'a> {
    /// # Errors
    /// Returns a `CfglError::Lexer` if the text cannot be tokenized.
    pub fn new(source_text: &'a str) -> Result<Self, CfglError> {
        Self::new_with_name(source_text, "source.cfgl".to_string())
    }

    /// # Errors
    /// Returns a `CfglError::Lexer` if the text cannot be tokenized.
    pub fn new_with_name(source_text: &'a str, name: String) -> Result<Self, CfglError> {
        let mut lexer = Lexer::new_with_name(source_text, name.clone());
        let tokens: Vec<Token> = lexer
            .lex()?
            .into_iter()
            .filter(|t| !matches!(t.ttype, TokenType::Whitespace | TokenType::Comment(_)))
            .collect();
        let source = Arc::new(NamedSource::new(name, source_text.to_string()));

        Ok(Self {
            source,
            tokens,
            position: 0,
            depth: 0,
            source_text,
        })
    }

    // === Main Parsing Methods ===

    /// Program ::= { ConstantDecl | Value }
    ///
    /// # Errors
    /// Returns a `CfglError::Parser` at the first token that does not fit the grammar.
    pub fn parse_program(&mut self) -> Result<Program, CfglError> {
        let mut items = Vec::new();
        while !self.check(TokenType::Eof) {
            // A name directly followed by "<-" declares a constant, whatever the name.
            if self.check(TokenType::Name(String::new())) && self.peek_is(TokenType::Arrow) {
                items.push(Item::Constant(self.parse_constant_decl()?));
            } else {
                items.push(Item::Value(self.parse_value()?));
            }
        }
        self.expect(TokenType::Eof)?;
        log::debug!("parsed {} top-level items", items.len());
        Ok(Program { items })
    }

    /// ConstantDecl ::= Name "<-" Value ";"
    fn parse_constant_decl(&mut self) -> Result<ConstantDecl, CfglError> {
        let start_token = self.current_token()?.clone();
        let name = self.parse_name("a constant name")?;
        self.expect(TokenType::Arrow)?;
        let value = self.parse_value()?;
        let end_token = self.current_token()?.clone();
        self.expect(TokenType::Semicolon)?;
        Ok(ConstantDecl {
            name,
            value,
            pos_start: start_token.pos_start,
            pos_end: end_token.pos_end,
        })
    }

    /// Value ::= Number | String | Array | Dict | Name | ConstExpr
    fn parse_value(&mut self) -> Result<Expr, CfglError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return self.err_too_deep();
        }
        self.depth += 1;
        let value = self.parse_value_kind();
        self.depth -= 1;
        value
    }

    fn parse_value_kind(&mut self) -> Result<Expr, CfglError> {
        let start_token = self.current_token()?.clone();

        match &start_token.ttype {
            TokenType::Number(n) => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Number(*n),
                    start_token.pos_start,
                    start_token.pos_end,
                ))
            }
            TokenType::String(raw) => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::String(raw.clone()),
                    start_token.pos_start,
                    start_token.pos_end,
                ))
            }
            TokenType::Name(name) if name == "array" && self.peek_is(TokenType::LParen) => {
                self.parse_array()
            }
            TokenType::Name(name) if name == "begin" => self.parse_dict(),
            TokenType::Name(name) => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Name(name.clone()),
                    start_token.pos_start,
                    start_token.pos_end,
                ))
            }
            TokenType::ExprStart => self.parse_const_expr(),
            _ => self.err_unexpected("a value"),
        }
    }

    /// Array ::= "array" "(" [ Value { "," Value } ] ")"
    fn parse_array(&mut self) -> Result<Expr, CfglError> {
        let start_token = self.current_token()?.clone();
        self.expect_keyword("array")?;
        self.expect(TokenType::LParen)?;
        let mut elements = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                elements.push(self.parse_value()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        let end_token = self.current_token()?.clone();
        if !self.match_token(TokenType::RParen) {
            return self.err_unexpected("',' or ')'");
        }
        Ok(Expr::new(
            ExprKind::Array(elements),
            start_token.pos_start,
            end_token.pos_end,
        ))
    }

    /// Dict ::= "begin" Assignment ";" { Assignment ";" } "end"
    fn parse_dict(&mut self) -> Result<Expr, CfglError> {
        let start_token = self.current_token()?.clone();
        self.expect_keyword("begin")?;
        if self.at_dict_end() {
            return self.err_unexpected("at least one 'key := value;' assignment");
        }
        let mut entries = Vec::new();
        loop {
            entries.push(self.parse_assignment()?);
            self.expect(TokenType::Semicolon)?;
            if self.at_dict_end() {
                break;
            }
        }
        let end_token = self.current_token()?.clone();
        self.expect_keyword("end")?;
        Ok(Expr::new(
            ExprKind::Dict(entries),
            start_token.pos_start,
            end_token.pos_end,
        ))
    }

    /// Assignment ::= Name ":=" Value
    fn parse_assignment(&mut self) -> Result<Assignment, CfglError> {
        let key = self.parse_name("a key name or 'end'")?;
        self.expect(TokenType::Assign)?;
        let value = self.parse_value()?;
        Ok(Assignment { key, value })
    }

    /// ConstExpr ::= "${" Operation "}"
    /// Operation ::= ( "+" | "-" | "*" | "/" ) Value Value | "len" "(" Value ")"
    fn parse_const_expr(&mut self) -> Result<Expr, CfglError> {
        let start_token = self.current_token()?.clone();
        self.expect(TokenType::ExprStart)?;

        let op_token = self.current_token()?.clone();
        // `${-5 3}` lexes as Number(-5): the sign is the operator, the digits the left operand.
        let kind = if let Some((op, digits)) = self.signed_operator(&op_token) {
            let left = self.unsigned_operand(&op_token, digits)?;
            self.advance();
            let right = self.parse_value()?;
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            }
        } else {
            match &op_token.ttype {
                TokenType::Plus | TokenType::Minus | TokenType::Star | TokenType::Slash => {
                    let op = match op_token.ttype {
                        TokenType::Plus => BinaryOp::Add,
                        TokenType::Minus => BinaryOp::Sub,
                        TokenType::Star => BinaryOp::Mul,
                        _ => BinaryOp::Div,
                    };
                    self.advance();
                    let left = self.parse_value()?;
                    let right = self.parse_value()?;
                    ExprKind::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    }
                }
                TokenType::Name(name) if name == "len" => {
                    self.advance();
                    self.expect(TokenType::LParen)?;
                    let operand = self.parse_value()?;
                    self.expect(TokenType::RParen)?;
                    ExprKind::Len(Box::new(operand))
                }
                _ => return self.err_unexpected("an operator ('+', '-', '*', '/') or 'len'"),
            }
        };

        let end_token = self.current_token()?.clone();
        self.expect(TokenType::RBrace)?;
        Ok(Expr::new(kind, start_token.pos_start, end_token.pos_end))
    }

    fn signed_operator(&self, token: &Token) -> Option<(BinaryOp, &'a str)> {
        if !matches!(token.ttype, TokenType::Number(_)) {
            return None;
        }
        let text: &'a str = self.source_text;
        let literal = &text[token.pos_start..token.pos_end];
        if let Some(digits) = literal.strip_prefix('+') {
            Some((BinaryOp::Add, digits))
        } else {
            literal.strip_prefix('-').map(|digits| (BinaryOp::Sub, digits))
        }
    }

    fn unsigned_operand(&self, token: &Token, digits: &str) -> Result<Expr, CfglError> {
        let pos_start = token.pos_start + 1;
        let n = digits
            .parse::<i64>()
            .map_err(|_| LexerError::NumberOutOfRange {
                src: (*self.source).clone(),
                span: (pos_start, digits.len()).into(),
                literal: digits.to_string(),
            })?;
        Ok(Expr::new(ExprKind::Number(n), pos_start, token.pos_end))
    }

    // === Tokenizer Helper Methods ===

    fn parse_name(&mut self, expected: &str) -> Result<String, CfglError> {
        if let TokenType::Name(name) = &self.current_token()?.ttype {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            self.err_unexpected(expected)
        }
    }

    /// `end` closes a dict block unless it is itself being assigned.
    fn at_dict_end(&self) -> bool {
        self.check_keyword("end") && !self.peek_is(TokenType::Assign)
    }

    fn current_token(&self) -> Result<&Token, CfglError> {
        self.tokens.get(self.position).ok_or_else(|| {
            let pos = self.source_text.len();
            ParserError::UnexpectedEof {
                src: (*self.source).clone(),
                span: (pos, 0).into(),
                expected: "more input".to_string(),
            }
            .into()
        })
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: TokenType) -> Result<(), CfglError> {
        if self.check(expected.clone()) {
            self.advance();
            Ok(())
        } else {
            self.err_unexpected(&expected.describe())
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), CfglError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            self.err_unexpected(&format!("'{keyword}'"))
        }
    }

    fn match_token(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, ttype: TokenType) -> bool {
        if let Ok(token) = self.current_token() {
            std::mem::discriminant(&token.ttype) == std::mem::discriminant(&ttype)
        } else {
            false
        }
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(
            self.current_token().map(|t| &t.ttype),
            Ok(TokenType::Name(name)) if name == keyword
        )
    }

    fn peek_is(&self, ttype: TokenType) -> bool {
        if let Some(token) = self.tokens.get(self.position + 1) {
            std::mem::discriminant(&token.ttype) == std::mem::discriminant(&ttype)
        } else {
            false
        }
    }

    fn err_too_deep<T>(&self) -> Result<T, CfglError> {
        let token = self.current_token()?;
        Err(ParserError::NestingTooDeep {
            src: (*self.source).clone(),
            span: (token.pos_start, token.pos_end - token.pos_start).into(),
            limit: MAX_NESTING_DEPTH,
        }
        .into())
    }

    fn err_unexpected<T>(&self, expected: &str) -> Result<T, CfglError> {
        let token = self.current_token()?;
        let error = if token.ttype == TokenType::Eof {
            ParserError::UnexpectedEof {
                src: (*self.source).clone(),
                span: (token.pos_start, 0).into(),
                expected: expected.to_string(),
            }
        } else {
            ParserError::UnexpectedToken {
                src: (*self.source).clone(),
                span: (token.pos_start, token.pos_end - token.pos_start).into(),
                expected: expected.to_string(),
                found: token.ttype.describe(),
            }
        };
        Err(error.into())
    }
}
