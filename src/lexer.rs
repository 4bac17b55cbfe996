use crate::error::LexerError;
use crate::utils::get_line_and_column;
use miette::NamedSource;

/// Represents the different kinds of tokens that the lexer can produce.
/// Each token is a meaningful unit of the configuration language syntax.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // == Special Tokens ==
    /// Represents the end of the input.
    Eof,
    /// A run of one or more whitespace characters.
    Whitespace,
    /// A `#` line comment or a `#| ... |#` block comment.
    /// The associated `String` holds the trimmed comment body.
    Comment(String),

    // == Literals ==
    /// A lowercase identifier. Keywords (`begin`, `end`, `array`, `len`) are
    /// lexed as names too; the parser decides from context.
    Name(String),
    /// A string literal, kept verbatim including the `@"` and `"` delimiters.
    String(String),
    /// An integer literal with its optional sign applied.
    Number(i64),

    // == Punctuation & Operators ==
    /// Constant declaration arrow: `<-`
    Arrow,
    /// Dict assignment: `:=`
    Assign,
    /// Semicolon: `;`
    Semicolon,
    /// Comma: `,`
    Comma,
    /// Left Parenthesis: `(`
    LParen,
    /// Right Parenthesis: `)`
    RParen,
    /// Opens a constant expression: `${`
    ExprStart,
    /// Right Brace: `}`
    RBrace,
    Plus,
    Minus,
    Star,
    Slash,
}

impl TokenType {
    /// Human readable form used in syntax errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            TokenType::Eof => "end of input".to_string(),
            TokenType::Whitespace => "whitespace".to_string(),
            TokenType::Comment(_) => "a comment".to_string(),
            TokenType::Name(name) => format!("name '{name}'"),
            TokenType::String(raw) => format!("string {raw}"),
            TokenType::Number(n) => format!("number {n}"),
            TokenType::Arrow => "'<-'".to_string(),
            TokenType::Assign => "':='".to_string(),
            TokenType::Semicolon => "';'".to_string(),
            TokenType::Comma => "','".to_string(),
            TokenType::LParen => "'('".to_string(),
            TokenType::RParen => "')'".to_string(),
            TokenType::ExprStart => "'${'".to_string(),
            TokenType::RBrace => "'}'".to_string(),
            TokenType::Plus => "'+'".to_string(),
            TokenType::Minus => "'-'".to_string(),
            TokenType::Star => "'*'".to_string(),
            TokenType::Slash => "'/'".to_string(),
        }
    }
}

/// A token with its type and byte position
#[derive(Debug, Clone)]
pub struct Token {
    pub ttype: TokenType,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl Token {
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize) -> Token {
        Token {
            ttype,
            pos_start,
            pos_end,
        }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    name: String,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::new_with_name(input, "source.cfgl".to_string())
    }

    pub fn new_with_name(input: &'a str, name: String) -> Self {
        Self {
            input,
            name,
            chars: input.char_indices().peekable(),
            position: 0,
        }
    }

    /// Tokenizes the whole input, trivia included. The last token is always `Eof`.
    ///
    /// # Errors
    /// Returns a `LexerError` at the first character sequence that matches no token.
    pub fn lex(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token.ttype == TokenType::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        log::debug!("{}: lexed {} tokens", self.name, tokens.len());
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        let start_pos = self.position;

        let ttype = if let Some(char) = self.advance() {
            match char {
                ';' => TokenType::Semicolon,
                ',' => TokenType::Comma,
                '(' => TokenType::LParen,
                ')' => TokenType::RParen,
                '}' => TokenType::RBrace,
                '*' => TokenType::Star,
                '/' => TokenType::Slash,

                '<' if self.peek() == Some('-') => {
                    self.advance();
                    TokenType::Arrow
                }
                ':' if self.peek() == Some('=') => {
                    self.advance();
                    TokenType::Assign
                }
                '$' if self.peek() == Some('{') => {
                    self.advance();
                    TokenType::ExprStart
                }
                '@' if self.peek() == Some('"') => self.read_string(start_pos)?,
                '#' => self.read_comment(),
                '+' | '-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                    self.read_number(start_pos)?
                }
                '+' => TokenType::Plus,
                '-' => TokenType::Minus,
                c if c.is_whitespace() => self.read_whitespace(),
                c if c.is_ascii_lowercase() => self.read_name(c),
                c if c.is_ascii_digit() => self.read_number(start_pos)?,

                other => return Err(self.unexpected_character(other, start_pos)),
            }
        } else {
            TokenType::Eof
        };

        Ok(Token::new(ttype, start_pos, self.position))
    }

    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn read_whitespace(&mut self) -> TokenType {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
        TokenType::Whitespace
    }

    /// `#| ... |#` closes at the first `|#`. A `#|` that is never closed, and
    /// any other `#`, comments out the rest of the line.
    fn read_comment(&mut self) -> TokenType {
        let input = self.input;
        let rest = &input[self.position..];
        if let Some(body) = rest.strip_prefix('|') {
            if let Some(end) = body.find("|#") {
                let text = body[..end].trim().to_string();
                // '|' + body + "|#"
                self.skip_bytes(1 + end + 2);
                return TokenType::Comment(text);
            }
        }

        let mut comment_text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            comment_text.push(c);
            self.advance();
        }
        TokenType::Comment(comment_text.trim().to_string())
    }

    fn skip_bytes(&mut self, len: usize) {
        let target = self.position + len;
        while self.position < target && self.advance().is_some() {}
    }

    fn read_string(&mut self, start_pos: usize) -> Result<TokenType, LexerError> {
        self.advance(); // Consume the opening quote
        while let Some(c) = self.advance() {
            if c == '"' {
                let raw = self.input[start_pos..self.position].to_string();
                return Ok(TokenType::String(raw));
            }
        }
        Err(LexerError::UnterminatedString {
            src: self.named_source(),
            span: (start_pos, 2).into(),
        })
    }

    fn read_name(&mut self, first_char: char) -> TokenType {
        let mut name = String::new();
        name.push(first_char);

        while let Some(c) = self.peek() {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        TokenType::Name(name)
    }

    fn read_number(&mut self, start_pos: usize) -> Result<TokenType, LexerError> {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        let literal = &self.input[start_pos..self.position];
        literal
            .parse::<i64>()
            .map(TokenType::Number)
            .map_err(|_| LexerError::NumberOutOfRange {
                src: self.named_source(),
                span: (start_pos, literal.len()).into(),
                literal: literal.to_string(),
            })
    }

    fn unexpected_character(&self, found: char, pos: usize) -> LexerError {
        let (line, column) = get_line_and_column(self.input, pos);
        LexerError::UnexpectedCharacter {
            src: self.named_source(),
            span: (pos, found.len_utf8()).into(),
            found,
            line,
            column,
        }
    }

    fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.input.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tokens(input: &str, expected: Vec<TokenType>) {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.lex().unwrap();
        let token_types: Vec<TokenType> = tokens.into_iter().map(|t| t.ttype).collect();

        // Filter out whitespace and comments for most tests
        let filtered_tokens: Vec<TokenType> = token_types
            .into_iter()
            .filter(|t| !matches!(t, TokenType::Whitespace | TokenType::Comment(_)))
            .collect();

        assert_eq!(filtered_tokens, expected);
    }

    fn lex_err(input: &str) -> LexerError {
        match Lexer::new(input).lex() {
            Ok(tokens) => panic!("Expected a LexerError, got {tokens:?}"),
            Err(err) => err,
        }
    }

    #[test]
    fn test_eof() {
        assert_tokens("", vec![TokenType::Eof]);
    }

    #[test]
    fn test_punctuation() {
        let input = "<- := ; , ( ) ${ } + - * /";
        let expected = vec![
            TokenType::Arrow,
            TokenType::Assign,
            TokenType::Semicolon,
            TokenType::Comma,
            TokenType::LParen,
            TokenType::RParen,
            TokenType::ExprStart,
            TokenType::RBrace,
            TokenType::Plus,
            TokenType::Minus,
            TokenType::Star,
            TokenType::Slash,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_keywords_are_names() {
        let input = "begin end array len";
        let expected = vec![
            TokenType::Name("begin".to_string()),
            TokenType::Name("end".to_string()),
            TokenType::Name("array".to_string()),
            TokenType::Name("len".to_string()),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_names() {
        let input = "foo bar_123 x9";
        let expected = vec![
            TokenType::Name("foo".to_string()),
            TokenType::Name("bar_123".to_string()),
            TokenType::Name("x9".to_string()),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_numbers() {
        let input = "123 -10 +7 0";
        let expected = vec![
            TokenType::Number(123),
            TokenType::Number(-10),
            TokenType::Number(7),
            TokenType::Number(0),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_sign_followed_by_space_is_operator() {
        let input = "${- 5 3}";
        let expected = vec![
            TokenType::ExprStart,
            TokenType::Minus,
            TokenType::Number(5),
            TokenType::Number(3),
            TokenType::RBrace,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_strings_keep_delimiters() {
        let input = r#"@"hello world" @"" @"a#b|c""#;
        let expected = vec![
            TokenType::String(r#"@"hello world""#.to_string()),
            TokenType::String(r#"@"""#.to_string()),
            TokenType::String(r#"@"a#b|c""#.to_string()),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_string_spans_lines() {
        let input = "@\"line one\nline two\"";
        let tokens = Lexer::new(input).lex().unwrap();
        assert_eq!(tokens[0].ttype, TokenType::String(input.to_string()));
        assert_eq!(tokens[0].pos_end, input.len());
    }

    #[test]
    fn test_comments_and_whitespace() {
        let input = " # line comment\n key #| block\n comment |# := 1";
        let tokens = Lexer::new(input).lex().unwrap();
        let token_types: Vec<TokenType> = tokens.into_iter().map(|t| t.ttype).collect();

        let expected = vec![
            TokenType::Whitespace,
            TokenType::Comment("line comment".to_string()),
            TokenType::Whitespace,
            TokenType::Name("key".to_string()),
            TokenType::Whitespace,
            TokenType::Comment("block\n comment".to_string()),
            TokenType::Whitespace,
            TokenType::Assign,
            TokenType::Whitespace,
            TokenType::Number(1),
            TokenType::Eof,
        ];

        assert_eq!(token_types, expected);
    }

    #[test]
    fn test_block_comment_closes_at_first_terminator() {
        let input = "#| a |# 1 |# 2";
        let err = lex_err(input);
        // The second "|#" is not inside a comment, so '|' is rejected.
        assert!(matches!(err, LexerError::UnexpectedCharacter { found: '|', .. }));
    }

    #[test]
    fn test_unclosed_block_comment_is_line_comment() {
        let input = "#| never closed\n42";
        assert_tokens(input, vec![TokenType::Number(42), TokenType::Eof]);
    }

    #[test]
    fn test_token_positions() {
        let tokens = Lexer::new("ab <- 12;").lex().unwrap();
        let spans: Vec<(usize, usize)> = tokens.iter().map(|t| (t.pos_start, t.pos_end)).collect();
        assert_eq!(
            spans,
            vec![(0, 2), (2, 3), (3, 5), (5, 6), (6, 8), (8, 9), (9, 9)]
        );
    }

    #[test]
    fn test_uppercase_is_rejected() {
        let err = lex_err("begin Name := 1; end");
        match err {
            LexerError::UnexpectedCharacter {
                found,
                line,
                column,
                ..
            } => {
                assert_eq!(found, 'N');
                assert_eq!((line, column), (1, 7));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_lone_prefix_characters_are_rejected() {
        for input in ["<", ":", "$", "@", "{", "\"plain\"", "1.5"] {
            assert!(Lexer::new(input).lex().is_err(), "{input:?} should not lex");
        }
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            lex_err("@\"open"),
            LexerError::UnterminatedString { .. }
        ));
    }

    #[test]
    fn test_number_out_of_range() {
        match lex_err("99999999999999999999") {
            LexerError::NumberOutOfRange { literal, .. } => {
                assert_eq!(literal, "99999999999999999999");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_config_document() {
        let input = r#"
# service defaults
max_size <- 100;
begin
    name := @"My App";
    limits := array(1, ${+ max_size 5});
end
"#;
        let expected = vec![
            TokenType::Name("max_size".to_string()),
            TokenType::Arrow,
            TokenType::Number(100),
            TokenType::Semicolon,
            TokenType::Name("begin".to_string()),
            TokenType::Name("name".to_string()),
            TokenType::Assign,
            TokenType::String(r#"@"My App""#.to_string()),
            TokenType::Semicolon,
            TokenType::Name("limits".to_string()),
            TokenType::Assign,
            TokenType::Name("array".to_string()),
            TokenType::LParen,
            TokenType::Number(1),
            TokenType::Comma,
            TokenType::ExprStart,
            TokenType::Plus,
            TokenType::Name("max_size".to_string()),
            TokenType::Number(5),
            TokenType::RBrace,
            TokenType::RParen,
            TokenType::Semicolon,
            TokenType::Name("end".to_string()),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }
}
