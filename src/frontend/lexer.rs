/// Token kinds for Go source.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // Literals (raw source text is kept, quotes included)
    Ident(String),
    Int(String),
    Float(String),
    Imag(String),
    Char(String),
    Str(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    AndNot,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,
    AndNotEq,
    AndAnd,
    OrOr,
    Arrow, // <-
    Inc,
    Dec,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Define, // :=
    Bang,
    Tilde,
    Ellipsis,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semi,
    Colon,

    // Special
    Eof,
}

impl TokenKind {
    /// Whether a newline after this token inserts a semicolon.
    fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident(_)
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Imag(_)
                | TokenKind::Char(_)
                | TokenKind::Str(_)
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }
}

/// Source location information: byte range plus the line/column of `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Span covering `self` through `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }
}

/// A token with its kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The lexer for Go source code.
pub struct Lexer<'a> {
    filename: &'a str,
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(filename: &'a str, source: &'a str) -> Self {
        Self {
            filename,
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens: Vec<Token> = Vec::new();

        loop {
            let crossed_newline = self.skip_whitespace_and_comments()?;
            let at_end = self.peek().is_none();

            if (crossed_newline || at_end)
                && tokens.last().is_some_and(|t| t.kind.ends_statement())
            {
                let pos = self.offset();
                tokens.push(Token::new(
                    TokenKind::Semi,
                    Span::new(pos, pos, self.line, self.column),
                ));
            }

            let start = self.offset();
            let (line, column) = (self.line, self.column);

            let Some((_, ch)) = self.peek() else {
                tokens.push(Token::new(
                    TokenKind::Eof,
                    Span::new(start, start, line, column),
                ));
                break;
            };

            let kind = match ch {
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                ',' => self.single(TokenKind::Comma),
                ';' => self.single(TokenKind::Semi),
                '~' => self.single(TokenKind::Tilde),
                ':' => {
                    self.advance();
                    if self.match_char('=') {
                        TokenKind::Define
                    } else {
                        TokenKind::Colon
                    }
                }
                '.' => {
                    if self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
                        self.scan_number()?
                    } else {
                        self.advance();
                        if self.peek().map(|(_, c)| c) == Some('.')
                            && self.peek_second() == Some('.')
                        {
                            self.advance();
                            self.advance();
                            TokenKind::Ellipsis
                        } else {
                            TokenKind::Dot
                        }
                    }
                }
                '+' => {
                    self.advance();
                    if self.match_char('+') {
                        TokenKind::Inc
                    } else if self.match_char('=') {
                        TokenKind::PlusEq
                    } else {
                        TokenKind::Plus
                    }
                }
                '-' => {
                    self.advance();
                    if self.match_char('-') {
                        TokenKind::Dec
                    } else if self.match_char('=') {
                        TokenKind::MinusEq
                    } else {
                        TokenKind::Minus
                    }
                }
                '*' => self.with_assign(TokenKind::Star, TokenKind::StarEq),
                '/' => self.with_assign(TokenKind::Slash, TokenKind::SlashEq),
                '%' => self.with_assign(TokenKind::Percent, TokenKind::PercentEq),
                '^' => self.with_assign(TokenKind::Caret, TokenKind::CaretEq),
                '=' => self.with_assign(TokenKind::Eq, TokenKind::EqEq),
                '!' => self.with_assign(TokenKind::Bang, TokenKind::NotEq),
                '&' => {
                    self.advance();
                    if self.match_char('&') {
                        TokenKind::AndAnd
                    } else if self.match_char('^') {
                        if self.match_char('=') {
                            TokenKind::AndNotEq
                        } else {
                            TokenKind::AndNot
                        }
                    } else if self.match_char('=') {
                        TokenKind::AmpEq
                    } else {
                        TokenKind::Amp
                    }
                }
                '|' => {
                    self.advance();
                    if self.match_char('|') {
                        TokenKind::OrOr
                    } else if self.match_char('=') {
                        TokenKind::PipeEq
                    } else {
                        TokenKind::Pipe
                    }
                }
                '<' => {
                    self.advance();
                    if self.match_char('-') {
                        TokenKind::Arrow
                    } else if self.match_char('<') {
                        if self.match_char('=') {
                            TokenKind::ShlEq
                        } else {
                            TokenKind::Shl
                        }
                    } else if self.match_char('=') {
                        TokenKind::Le
                    } else {
                        TokenKind::Lt
                    }
                }
                '>' => {
                    self.advance();
                    if self.match_char('>') {
                        if self.match_char('=') {
                            TokenKind::ShrEq
                        } else {
                            TokenKind::Shr
                        }
                    } else if self.match_char('=') {
                        TokenKind::Ge
                    } else {
                        TokenKind::Gt
                    }
                }
                '"' => self.scan_string()?,
                '`' => self.scan_raw_string()?,
                '\'' => self.scan_char()?,
                '0'..='9' => self.scan_number()?,
                c if c == '_' || c.is_alphabetic() => self.scan_identifier(),
                _ => return Err(self.error(&format!("unexpected character '{}'", ch))),
            };

            let end = self.offset();
            tokens.push(Token::new(kind, Span::new(start, end, line, column)));
        }

        Ok(tokens)
    }

    fn offset(&mut self) -> usize {
        self.peek().map(|(i, _)| i).unwrap_or(self.source.len())
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.chars.clone();
        chars.next();
        chars.next().map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((_, ch)) = result {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek().map(|(_, c)| c) == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn with_assign(&mut self, plain: TokenKind, assign: TokenKind) -> TokenKind {
        self.advance();
        if self.match_char('=') { assign } else { plain }
    }

    /// Skips whitespace and comments, reporting whether a newline was crossed.
    fn skip_whitespace_and_comments(&mut self) -> Result<bool, String> {
        let mut crossed_newline = false;
        loop {
            match self.peek() {
                Some((_, '\n')) => {
                    crossed_newline = true;
                    self.advance();
                }
                Some((_, ' ' | '\t' | '\r')) => {
                    self.advance();
                }
                Some((_, '/')) => match self.peek_second() {
                    Some('/') => {
                        while let Some((_, ch)) = self.peek() {
                            if ch == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        loop {
                            match self.advance() {
                                None => return Err(self.error("comment not terminated")),
                                Some((_, '\n')) => crossed_newline = true,
                                Some((_, '*')) if self.match_char('/') => break,
                                Some(_) => {}
                            }
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        Ok(crossed_newline)
    }

    fn scan_number(&mut self) -> Result<TokenKind, String> {
        let start = self.offset();
        let hex = self.peek().map(|(_, c)| c) == Some('0')
            && matches!(self.peek_second(), Some('x' | 'X'));
        let mut seen_dot = false;
        let mut prev = '\0';

        while let Some((_, ch)) = self.peek() {
            let exponent_sign = (ch == '+' || ch == '-')
                && if hex {
                    matches!(prev, 'p' | 'P')
                } else {
                    matches!(prev, 'e' | 'E')
                };
            if ch.is_ascii_alphanumeric() || ch == '_' || exponent_sign {
                self.advance();
            } else if ch == '.' && !seen_dot && self.peek_second() != Some('.') {
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
            prev = ch;
        }

        let end = self.offset();
        let text = self.source[start..end].to_string();
        let body = text.trim_end_matches('i');
        if text.ends_with('i') {
            return Ok(TokenKind::Imag(text));
        }
        let is_float = if hex {
            body.contains(['p', 'P'])
        } else {
            seen_dot || body.contains(['e', 'E'])
        };
        if body.is_empty() {
            return Err(self.error(&format!("invalid number '{}'", text)));
        }
        Ok(if is_float {
            TokenKind::Float(text)
        } else {
            TokenKind::Int(text)
        })
    }

    fn scan_string(&mut self) -> Result<TokenKind, String> {
        let start = self.offset();
        self.advance(); // opening quote

        loop {
            match self.advance() {
                None | Some((_, '\n')) => return Err(self.error("string literal not terminated")),
                Some((_, '\\')) => {
                    if self.advance().is_none() {
                        return Err(self.error("string literal not terminated"));
                    }
                }
                Some((_, '"')) => break,
                Some(_) => {}
            }
        }

        let end = self.offset();
        Ok(TokenKind::Str(self.source[start..end].to_string()))
    }

    fn scan_raw_string(&mut self) -> Result<TokenKind, String> {
        let start = self.offset();
        self.advance(); // opening backtick

        loop {
            match self.advance() {
                None => return Err(self.error("raw string literal not terminated")),
                Some((_, '`')) => break,
                Some(_) => {}
            }
        }

        let end = self.offset();
        Ok(TokenKind::Str(self.source[start..end].to_string()))
    }

    fn scan_char(&mut self) -> Result<TokenKind, String> {
        let start = self.offset();
        self.advance(); // opening quote

        loop {
            match self.advance() {
                None | Some((_, '\n')) => return Err(self.error("rune literal not terminated")),
                Some((_, '\\')) => {
                    self.advance();
                }
                Some((_, '\'')) => break,
                Some(_) => {}
            }
        }

        let end = self.offset();
        Ok(TokenKind::Char(self.source[start..end].to_string()))
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.offset();

        while let Some((_, ch)) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let end = self.offset();
        let ident = &self.source[start..end];

        match ident {
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "chan" => TokenKind::Chan,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "default" => TokenKind::Default,
            "defer" => TokenKind::Defer,
            "else" => TokenKind::Else,
            "fallthrough" => TokenKind::Fallthrough,
            "for" => TokenKind::For,
            "func" => TokenKind::Func,
            "go" => TokenKind::Go,
            "goto" => TokenKind::Goto,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "interface" => TokenKind::Interface,
            "map" => TokenKind::Map,
            "package" => TokenKind::Package,
            "range" => TokenKind::Range,
            "return" => TokenKind::Return,
            "select" => TokenKind::Select,
            "struct" => TokenKind::Struct,
            "switch" => TokenKind::Switch,
            "type" => TokenKind::Type,
            "var" => TokenKind::Var,
            _ => TokenKind::Ident(ident.to_string()),
        }
    }

    fn error(&self, message: &str) -> String {
        format!(
            "error: {}\n  --> {}:{}:{}",
            message, self.filename, self.line, self.column
        )
    }
}

/// Decodes the value of an interpreted or raw string literal.
pub fn unquote(literal: &str) -> Option<String> {
    if let Some(raw) = literal.strip_prefix('`') {
        return raw.strip_suffix('`').map(|s| s.replace('\r', ""));
    }
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut value = String::new();
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next()? {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'a' => value.push('\u{7}'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '\\' => value.push('\\'),
            '"' => value.push('"'),
            '\'' => value.push('\''),
            other => {
                // Numeric escapes never appear in import paths; keep them verbatim.
                value.push('\\');
                value.push(other);
            }
        }
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new("test.go", source);
        lexer
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("x := 42");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Ident("x".to_string()),
                TokenKind::Define,
                TokenKind::Int("42".to_string()),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_semicolon_insertion() {
        let tokens = kinds("f(a)\nreturn\n}\n");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Ident("f".to_string()),
                TokenKind::LParen,
                TokenKind::Ident("a".to_string()),
                TokenKind::RParen,
                TokenKind::Semi,
                TokenKind::Return,
                TokenKind::Semi,
                TokenKind::RBrace,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        let tokens = kinds("a +\nb");
        assert_eq!(tokens[1], TokenKind::Plus);
        assert_eq!(tokens[2], TokenKind::Ident("b".to_string()));
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("<- &^ &^= <<= ... := != && ||");
        let expected = vec![
            TokenKind::Arrow,
            TokenKind::AndNot,
            TokenKind::AndNotEq,
            TokenKind::ShlEq,
            TokenKind::Ellipsis,
            TokenKind::Define,
            TokenKind::NotEq,
            TokenKind::AndAnd,
            TokenKind::OrOr,
            TokenKind::Eof,
        ];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_number_literals() {
        let tokens = kinds("0x1F 3.14 1e9 .5 2i 1_000");
        assert_eq!(tokens[0], TokenKind::Int("0x1F".to_string()));
        assert_eq!(tokens[1], TokenKind::Float("3.14".to_string()));
        assert_eq!(tokens[2], TokenKind::Float("1e9".to_string()));
        assert_eq!(tokens[3], TokenKind::Float(".5".to_string()));
        assert_eq!(tokens[4], TokenKind::Imag("2i".to_string()));
        assert_eq!(tokens[5], TokenKind::Int("1_000".to_string()));
    }

    #[test]
    fn test_string_literals() {
        let tokens = kinds(r#""a\"b" `raw
line` 'x' '\''"#);
        assert_eq!(tokens[0], TokenKind::Str(r#""a\"b""#.to_string()));
        assert_eq!(tokens[1], TokenKind::Str("`raw\nline`".to_string()));
        assert_eq!(tokens[2], TokenKind::Char("'x'".to_string()));
        assert_eq!(tokens[3], TokenKind::Char(r"'\''".to_string()));
    }

    #[test]
    fn test_block_comment_newline_inserts_semicolon() {
        let tokens = kinds("x /* a\nb */ y");
        assert_eq!(tokens[1], TokenKind::Semi);
        assert_eq!(tokens[2], TokenKind::Ident("y".to_string()));
    }

    #[test]
    fn test_spans_are_byte_ranges() {
        let mut lexer = Lexer::new("test.go", "foo(bar)");
        let tokens = lexer.scan_tokens().unwrap();
        assert_eq!((tokens[0].span.start, tokens[0].span.end), (0, 3));
        assert_eq!((tokens[2].span.start, tokens[2].span.end), (4, 7));
        assert_eq!(tokens[2].span.column, 5);
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("test.go", "\"abc");
        let err = lexer.scan_tokens().unwrap_err();
        assert!(err.contains("not terminated"));
        assert!(err.contains("test.go:1"));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"fmt\""), Some("fmt".to_string()));
        assert_eq!(unquote("`a\\b`"), Some("a\\b".to_string()));
        assert_eq!(unquote("\"a\\tb\""), Some("a\tb".to_string()));
        assert_eq!(unquote("fmt"), None);
    }
}
