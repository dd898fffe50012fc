//! Lexer (tokenizer) for template text
//!
//! Works in two layers over a shared [`Scanner`]:
//!
//! - the outer layer splits raw template text into literal [`Token::Text`]
//!   runs and the three tag forms `{{ … }}`, `{% … %}` and `{# … #}`
//!   (first closing delimiter wins, tags never nest, comments are dropped);
//! - the inner layer turns the content of an output or command tag into
//!   numbers, strings, identifiers, keywords and symbols.
//!
//! Tag delimiters are emitted as [`Symbol`] tokens so the parser can tell
//! where a tag starts and ends.

use super::ast::SourceLocation;
use super::scanner::Scanner;
use std::fmt;

/// Reserved words recognised inside tags (case-sensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    If,
    Else,
    While,
    Or,
    And,
    Not,
    Function,
    Return,
    Print,
    Include,
    Parse,
    List,
    Rlist,
    As,
    Use,
    Region,
    End,
}

impl Keyword {
    pub fn from_ident(ident: &str) -> Option<Self> {
        let keyword = match ident {
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "or" => Keyword::Or,
            "and" => Keyword::And,
            "not" => Keyword::Not,
            "function" => Keyword::Function,
            "return" => Keyword::Return,
            "print" => Keyword::Print,
            "include" => Keyword::Include,
            "parse" => Keyword::Parse,
            "list" => Keyword::List,
            "rlist" => Keyword::Rlist,
            "as" => Keyword::As,
            "use" => Keyword::Use,
            "region" => Keyword::Region,
            "end" => Keyword::End,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Or => "or",
            Keyword::And => "and",
            Keyword::Not => "not",
            Keyword::Function => "function",
            Keyword::Return => "return",
            Keyword::Print => "print",
            Keyword::Include => "include",
            Keyword::Parse => "parse",
            Keyword::List => "list",
            Keyword::Rlist => "rlist",
            Keyword::As => "as",
            Keyword::Use => "use",
            Keyword::Region => "region",
            Keyword::End => "end",
        }
    }
}

/// Operators, punctuation and tag delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    // Tag delimiters
    OutputOpen,   // {{
    OutputClose,  // }}
    CommandOpen,  // {%
    CommandClose, // %}

    // Comparison
    EqEq,  // ==
    NotEq, // !=
    Le,    // <=
    Ge,    // >=
    Lt,    // <
    Gt,    // >

    // Arithmetic
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %

    // Punctuation
    Assign, // =
    LParen, // (
    RParen, // )
    Comma,  // ,
    Dot,    // .
    Colon,  // :
}

impl Symbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::OutputOpen => "{{",
            Symbol::OutputClose => "}}",
            Symbol::CommandOpen => "{%",
            Symbol::CommandClose => "%}",
            Symbol::EqEq => "==",
            Symbol::NotEq => "!=",
            Symbol::Le => "<=",
            Symbol::Ge => ">=",
            Symbol::Lt => "<",
            Symbol::Gt => ">",
            Symbol::Plus => "+",
            Symbol::Minus => "-",
            Symbol::Star => "*",
            Symbol::Slash => "/",
            Symbol::Percent => "%",
            Symbol::Assign => "=",
            Symbol::LParen => "(",
            Symbol::RParen => ")",
            Symbol::Comma => ",",
            Symbol::Dot => ".",
            Symbol::Colon => ":",
        }
    }
}

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Text(String, SourceLocation),
    Number(i64, SourceLocation),
    String(String, SourceLocation),
    Ident(String, SourceLocation),
    Keyword(Keyword, SourceLocation),
    Symbol(Symbol, SourceLocation),
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::Text(_, loc)
            | Token::Number(_, loc)
            | Token::String(_, loc)
            | Token::Ident(_, loc)
            | Token::Keyword(_, loc)
            | Token::Symbol(_, loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Text(_, _) => write!(f, "template text"),
            Token::Number(n, _) => write!(f, "number {}", n),
            Token::String(s, _) => write!(f, "string \"{}\"", s),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::Keyword(k, _) => write!(f, "'{}'", k.as_str()),
            Token::Symbol(s, _) => write!(f, "'{}'", s.as_str()),
            Token::Eof(_) => write!(f, "end of input"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Lex error at line {}, column {}: {message}", .location.line, .location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl LexError {
    fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        LexError {
            message: message.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Output,
    Command,
    Comment,
}

impl TagKind {
    fn close(self) -> &'static str {
        match self {
            TagKind::Output => "}}",
            TagKind::Command => "%}",
            TagKind::Comment => "#}",
        }
    }
}

/// Lexer for template source
pub struct Lexer {
    scanner: Scanner,
    trim_blocks: bool,
}

impl Lexer {
    /// Create a new lexer for the given template string.
    pub fn new(input: &str) -> Self {
        Self {
            scanner: Scanner::new(input),
            trim_blocks: false,
        }
    }

    /// Drop one line break directly after every `%}` and `#}`
    pub fn with_trim_blocks(mut self, trim_blocks: bool) -> Self {
        self.trim_blocks = trim_blocks;
        self
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut text = String::new();
        let mut text_loc = self.scanner.location();

        loop {
            if self.scanner.is_at_end() {
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text), text_loc));
                }
                tokens.push(Token::Eof(self.scanner.location()));
                break;
            }

            if let Some(kind) = self.tag_start() {
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text), text_loc));
                }
                self.tag(kind, &mut tokens)?;
                continue;
            }

            if text.is_empty() {
                text_loc = self.scanner.location();
            }
            let (ch, _) = self.scanner.next();
            text.push(ch);
        }

        Ok(tokens)
    }

    fn tag_start(&self) -> Option<TagKind> {
        if self.scanner.starts_with("{{") {
            Some(TagKind::Output)
        } else if self.scanner.starts_with("{%") {
            Some(TagKind::Command)
        } else if self.scanner.starts_with("{#") {
            Some(TagKind::Comment)
        } else {
            None
        }
    }

    /// Consume one tag, pushing its delimiters and inner tokens
    fn tag(&mut self, kind: TagKind, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        let open_loc = self.scanner.location();
        self.scanner.skip(2);

        let content_loc = self.scanner.location();
        let mut content = String::new();
        let close_loc = loop {
            if self.scanner.is_at_end() {
                return Err(LexError::new(
                    format!("Unterminated tag, expected '{}'", kind.close()),
                    open_loc,
                ));
            }
            if self.scanner.starts_with(kind.close()) {
                let loc = self.scanner.location();
                self.scanner.skip(2);
                break loc;
            }
            let (ch, _) = self.scanner.next();
            content.push(ch);
        };

        let (open, close) = match kind {
            TagKind::Output => (Symbol::OutputOpen, Symbol::OutputClose),
            TagKind::Command => (Symbol::CommandOpen, Symbol::CommandClose),
            TagKind::Comment => {
                self.trim_line_break();
                return Ok(());
            }
        };

        tokens.push(Token::Symbol(open, open_loc));
        TagLexer::new(&content, content_loc).tokenize_into(tokens)?;
        tokens.push(Token::Symbol(close, close_loc));

        if kind == TagKind::Command {
            self.trim_line_break();
        }
        Ok(())
    }

    fn trim_line_break(&mut self) {
        if !self.trim_blocks {
            return;
        }
        if self.scanner.peek() == Some('\n') {
            self.scanner.advance();
        } else if self.scanner.starts_with("\r\n") {
            self.scanner.skip(2);
        }
    }
}

/// Tokenizer for the content between a tag's delimiters
pub struct TagLexer {
    scanner: Scanner,
}

impl TagLexer {
    pub fn new(content: &str, origin: SourceLocation) -> Self {
        Self {
            scanner: Scanner::with_origin(content, origin),
        }
    }

    /// Tokenize the tag content, appending to `tokens`
    pub fn tokenize_into(&mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        loop {
            while self.scanner.peek().is_some_and(char::is_whitespace) {
                self.scanner.advance();
            }
            if self.scanner.is_at_end() {
                return Ok(());
            }
            tokens.push(self.next_token()?);
        }
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let (ch, loc) = self.scanner.next();

        match ch {
            '0'..='9' => self.number_literal(ch, loc),

            '"' | '\'' => self.string_literal(ch, loc),

            c if c.is_alphabetic() || c == '_' => Ok(self.identifier_or_keyword(c, loc)),

            '=' => Ok(self.one_or_two('=', Symbol::EqEq, Symbol::Assign, loc)),
            '<' => Ok(self.one_or_two('=', Symbol::Le, Symbol::Lt, loc)),
            '>' => Ok(self.one_or_two('=', Symbol::Ge, Symbol::Gt, loc)),
            '!' => {
                if self.scanner.peek() == Some('=') {
                    self.scanner.advance();
                    Ok(Token::Symbol(Symbol::NotEq, loc))
                } else {
                    Err(LexError::new("Unexpected character: '!'", loc))
                }
            }
            '+' => Ok(Token::Symbol(Symbol::Plus, loc)),
            '-' => Ok(Token::Symbol(Symbol::Minus, loc)),
            '*' => Ok(Token::Symbol(Symbol::Star, loc)),
            '/' => Ok(Token::Symbol(Symbol::Slash, loc)),
            '%' => Ok(Token::Symbol(Symbol::Percent, loc)),
            '(' => Ok(Token::Symbol(Symbol::LParen, loc)),
            ')' => Ok(Token::Symbol(Symbol::RParen, loc)),
            ',' => Ok(Token::Symbol(Symbol::Comma, loc)),
            '.' => Ok(Token::Symbol(Symbol::Dot, loc)),
            ':' => Ok(Token::Symbol(Symbol::Colon, loc)),

            _ => Err(LexError::new(
                format!("Unexpected character: '{}'", ch),
                loc,
            )),
        }
    }

    fn one_or_two(
        &mut self,
        second: char,
        double: Symbol,
        single: Symbol,
        loc: SourceLocation,
    ) -> Token {
        if self.scanner.peek() == Some(second) {
            self.scanner.advance();
            Token::Symbol(double, loc)
        } else {
            Token::Symbol(single, loc)
        }
    }

    /// Parse numeric literal (integers only)
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut num_str = String::new();
        num_str.push(first_digit);

        while let Some(ch) = self.scanner.peek() {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.scanner.advance();
            } else {
                break;
            }
        }

        if self
            .scanner
            .peek()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        {
            return Err(LexError::new(
                format!("Malformed numeric literal starting with '{}'", num_str),
                loc,
            ));
        }

        let value = num_str.parse::<i64>().map_err(|_| {
            LexError::new(format!("Integer literal out of range: {}", num_str), loc)
        })?;

        Ok(Token::Number(value, loc))
    }

    /// Parse string literal; no escape processing
    fn string_literal(&mut self, quote: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut string = String::new();

        while let Some(ch) = self.scanner.advance() {
            if ch == quote {
                return Ok(Token::String(string, loc));
            }
            string.push(ch);
        }

        Err(LexError::new("Unterminated string literal", loc))
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.scanner.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.scanner.advance();
            } else {
                break;
            }
        }

        match Keyword::from_ident(&ident) {
            Some(keyword) => Token::Keyword(keyword, loc),
            None => Token::Ident(ident, loc),
        }
    }
}
