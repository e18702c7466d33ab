/// Lazy tokenizer over command text.
///
/// Tokens are produced one at a time by re-scanning from a byte cursor; the
/// source is never split into a token list up front.
use crate::core::SyntaxError;
use nom::number::complete::recognize_float;
use std::fmt;

/// Reserved words, lowercased. Matching is case-insensitive.
pub const KEYWORDS: &[&str] = &[
    "create", "table", "if", "not", "exists", "drop", "load", "data", "infile", "into",
    "outfile", "ignore", "lines", "select", "from", "where", "group", "by", "having", "order",
    "asc", "desc", "as", "is", "null", "min", "max", "avg", "sum", "count", "int", "float",
    "varchar", "timestamp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Operator,
    LiteralString,
    LiteralNumber,
    EndOfInput,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keyword => "keyword",
            Self::Identifier => "identifier",
            Self::Operator => "operator",
            Self::LiteralString => "string literal",
            Self::LiteralNumber => "number literal",
            Self::EndOfInput => "end of input",
        })
    }
}

/// A classified token. Keyword text is lowercased; string literal text is
/// the content between the quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            col,
        }
    }

    #[must_use]
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

/// True when `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub const fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_trivia();
        let (line, col) = (self.line, self.col);

        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::EndOfInput, "", line, col));
        };

        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.word(line, col));
        }
        if c.is_ascii_digit() || (matches!(c, '.' | '-') && self.starts_number_after_sign()) {
            return self.number(line, col);
        }
        if c == '"' {
            return self.string(line, col);
        }

        self.bump();
        let text = match c {
            '<' if self.peek() == Some('=') => {
                self.bump();
                "<="
            }
            '<' if self.peek() == Some('>') => {
                self.bump();
                "<>"
            }
            '>' if self.peek() == Some('=') => {
                self.bump();
                ">="
            }
            '<' => "<",
            '>' => ">",
            '=' => "=",
            '(' => "(",
            ')' => ")",
            ';' => ";",
            ',' => ",",
            '*' => "*",
            other => {
                return Err(self.error(format!("Unexpected character {other:?}"), line, col));
            }
        };
        Ok(Token::new(TokenKind::Operator, text, line, col))
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') if self.rest().starts_with("--") => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// `.5`, `-5` and `-.5` start numbers; a lone `-` or `.` does not.
    fn starts_number_after_sign(&self) -> bool {
        let mut chars = self.rest().chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some('.'), Some(d), _) | (Some('-'), Some(d), _) if d.is_ascii_digit() => true,
            (Some('-'), Some('.'), Some(d)) => d.is_ascii_digit(),
            _ => false,
        }
    }

    fn word(&mut self, line: usize, col: usize) -> Token {
        let start = self.offset;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        let word = &self.source[start..self.offset];
        let lowered = word.to_ascii_lowercase();
        if KEYWORDS.contains(&lowered.as_str()) {
            Token::new(TokenKind::Keyword, lowered, line, col)
        } else {
            Token::new(TokenKind::Identifier, word, line, col)
        }
    }

    fn number(&mut self, line: usize, col: usize) -> Result<Token, SyntaxError> {
        let rest = self.rest();
        let recognized = recognize_float::<&str, nom::error::Error<&str>>(rest)
            .ok()
            .map(|(_, text)| text);

        let Some(text) = recognized else {
            self.skip_malformed();
            return Err(self.error("Malformed number literal", line, col));
        };
        for _ in text.chars() {
            self.bump();
        }
        // `12abc`, `1.2.3` and `5e` are rejected as a whole.
        if self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
            || text.parse::<f64>().is_err()
        {
            self.skip_malformed();
            return Err(self.error(format!("Malformed number literal {text:?}"), line, col));
        }
        Ok(Token::new(TokenKind::LiteralNumber, text, line, col))
    }

    fn skip_malformed(&mut self) {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '+'))
        {
            self.bump();
        }
    }

    fn string(&mut self, line: usize, col: usize) -> Result<Token, SyntaxError> {
        self.bump();
        let start = self.offset;
        loop {
            match self.peek() {
                Some('"') => break,
                Some(_) => {
                    self.bump();
                }
                None => return Err(self.error("Unterminated string literal", line, col)),
            }
        }
        let text = self.source[start..self.offset].to_string();
        self.bump();
        Ok(Token::new(TokenKind::LiteralString, text, line, col))
    }

    fn error(&self, message: impl Into<String>, line: usize, col: usize) -> SyntaxError {
        SyntaxError::new(message, line, col, self.source)
    }
}
