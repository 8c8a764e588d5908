//! Lexer (tokenizer) for the constraint language.
//!
//! The lexer converts source text into a stream of tokens on demand. Line
//! breaks inside brackets are insignificant; outside brackets they become
//! `Newline` tokens so the parser can notice multi-statement input.

use crate::span::Span;
use crate::token::{keyword_from_str, Token, TokenKind};

/// The lexer state.
#[derive(Clone)]
pub struct Lexer<'a> {
    /// Source code as bytes (for fast indexing).
    source: &'a [u8],
    /// Current byte position.
    pos: usize,
    /// Start position of the current token.
    token_start: usize,
    /// Open bracket depth; newlines are ignored while positive.
    depth: u32,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            token_start: 0,
            depth: 0,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token {
        if let Some(newline) = self.skip_trivia() {
            return newline;
        }
        self.token_start = self.pos;

        if self.is_eof() {
            return self.make_token(TokenKind::Eof);
        }

        let ch = self.current();
        let kind = match ch {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_name(),
            b'0'..=b'9' => self.scan_number(),
            b'.' if self.peek_byte(1).is_some_and(|b| b.is_ascii_digit()) => self.scan_number(),
            b'"' | b'\'' => self.scan_string(ch),

            b'(' | b'[' | b'{' => {
                self.advance();
                self.depth += 1;
                match ch {
                    b'(' => TokenKind::LParen,
                    b'[' => TokenKind::LBracket,
                    _ => TokenKind::LBrace,
                }
            }
            b')' | b']' | b'}' => {
                self.advance();
                self.depth = self.depth.saturating_sub(1);
                match ch {
                    b')' => TokenKind::RParen,
                    b']' => TokenKind::RBracket,
                    _ => TokenKind::RBrace,
                }
            }
            b',' => { self.advance(); TokenKind::Comma }
            b';' => { self.advance(); TokenKind::Semicolon }
            b'.' => { self.advance(); TokenKind::Dot }
            b'~' => { self.advance(); TokenKind::Tilde }

            b':' => {
                self.advance();
                if self.eat_byte(b'=') { TokenKind::ColonEq } else { TokenKind::Colon }
            }
            b'=' => {
                self.advance();
                if self.eat_byte(b'=') { TokenKind::EqEq } else { TokenKind::Eq }
            }
            b'!' => {
                self.advance();
                if self.eat_byte(b'=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Invalid("unexpected character '!'".to_string())
                }
            }
            b'-' => {
                self.advance();
                if self.eat_byte(b'>') {
                    TokenKind::Arrow
                } else {
                    self.with_aug(TokenKind::Minus)
                }
            }
            b'*' => {
                self.advance();
                if self.eat_byte(b'*') {
                    self.with_aug(TokenKind::StarStar)
                } else {
                    self.with_aug(TokenKind::Star)
                }
            }
            b'/' => {
                self.advance();
                if self.eat_byte(b'/') {
                    self.with_aug(TokenKind::SlashSlash)
                } else {
                    self.with_aug(TokenKind::Slash)
                }
            }
            b'<' => {
                self.advance();
                if self.eat_byte(b'<') {
                    self.with_aug(TokenKind::LtLt)
                } else if self.eat_byte(b'=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                self.advance();
                if self.eat_byte(b'>') {
                    self.with_aug(TokenKind::GtGt)
                } else if self.eat_byte(b'=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            b'+' => { self.advance(); self.with_aug(TokenKind::Plus) }
            b'%' => { self.advance(); self.with_aug(TokenKind::Percent) }
            b'@' => { self.advance(); self.with_aug(TokenKind::At) }
            b'&' => { self.advance(); self.with_aug(TokenKind::Amp) }
            b'|' => { self.advance(); self.with_aug(TokenKind::Pipe) }
            b'^' => { self.advance(); self.with_aug(TokenKind::Caret) }

            _ => {
                let c = self.current_char();
                self.pos += c.len_utf8();
                TokenKind::Invalid(format!("unexpected character {c:?}"))
            }
        };

        self.make_token(kind)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current(&self) -> u8 {
        self.source[self.pos]
    }

    fn current_char(&self) -> char {
        std::str::from_utf8(&self.source[self.pos..])
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn eat_byte(&mut self, b: u8) -> bool {
        if !self.is_eof() && self.current() == b {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// An operator immediately followed by `=` is an augmented assignment.
    fn with_aug(&mut self, op: TokenKind) -> TokenKind {
        if self.eat_byte(b'=') {
            TokenKind::AugAssign
        } else {
            op
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, Span::new(self.token_start as u32, self.pos as u32))
    }

    /// Skip whitespace, comments and line continuations.
    ///
    /// Returns a `Newline` token when a significant line break is crossed.
    #[allow(clippy::cast_possible_truncation)]
    fn skip_trivia(&mut self) -> Option<Token> {
        while !self.is_eof() {
            match self.current() {
                b' ' | b'\t' | b'\x0c' => self.advance(),
                b'#' => {
                    while !self.is_eof() && self.current() != b'\n' {
                        self.advance();
                    }
                }
                b'\\' if matches!(self.peek_byte(1), Some(b'\n')) => self.pos += 2,
                b'\r' | b'\n' => {
                    let start = self.pos;
                    self.advance();
                    if self.depth == 0 {
                        return Some(Token::new(
                            TokenKind::Newline,
                            Span::new(start as u32, self.pos as u32),
                        ));
                    }
                }
                _ => break,
            }
        }
        None
    }

    fn scan_name(&mut self) -> TokenKind {
        while !self.is_eof() && (self.current().is_ascii_alphanumeric() || self.current() == b'_')
        {
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.source[self.token_start..self.pos]).into_owned();
        keyword_from_str(&text).unwrap_or(TokenKind::Name(text))
    }

    fn scan_number(&mut self) -> TokenKind {
        // Radix-prefixed integers.
        if self.current() == b'0' {
            let radix = match self.peek_byte(1) {
                Some(b'x' | b'X') => Some(16),
                Some(b'o' | b'O') => Some(8),
                Some(b'b' | b'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                let digits_start = self.pos;
                while !self.is_eof()
                    && (self.current().is_ascii_alphanumeric() || self.current() == b'_')
                {
                    self.advance();
                }
                let digits: String = String::from_utf8_lossy(&self.source[digits_start..self.pos])
                    .chars()
                    .filter(|c| *c != '_')
                    .collect();
                return match i64::from_str_radix(&digits, radix) {
                    Ok(n) => TokenKind::Int(n),
                    Err(_) => TokenKind::Invalid(format!("invalid base-{radix} literal")),
                };
            }
        }

        let mut is_float = false;
        self.eat_digits();
        if !self.is_eof() && self.current() == b'.' {
            is_float = true;
            self.advance();
            self.eat_digits();
        }
        if !self.is_eof() && matches!(self.current(), b'e' | b'E') {
            let save = self.pos;
            self.advance();
            if !self.is_eof() && matches!(self.current(), b'+' | b'-') {
                self.advance();
            }
            if !self.is_eof() && self.current().is_ascii_digit() {
                is_float = true;
                self.eat_digits();
            } else {
                self.pos = save;
            }
        }

        // `1abc`, `2j` and friends are not numbers we understand.
        if !self.is_eof() && (self.current().is_ascii_alphabetic() || self.current() == b'_') {
            while !self.is_eof() && self.current().is_ascii_alphanumeric() {
                self.advance();
            }
            return TokenKind::Invalid("invalid decimal literal".to_string());
        }

        let text: String = String::from_utf8_lossy(&self.source[self.token_start..self.pos])
            .chars()
            .filter(|c| *c != '_')
            .collect();

        if is_float {
            match text.parse::<f64>() {
                Ok(f) => TokenKind::Float(f),
                Err(_) => TokenKind::Invalid(format!("invalid float literal {text:?}")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                Err(_) => TokenKind::Invalid("integer literal too large".to_string()),
            }
        }
    }

    fn eat_digits(&mut self) {
        while !self.is_eof() && (self.current().is_ascii_digit() || self.current() == b'_') {
            self.advance();
        }
    }

    fn scan_string(&mut self, quote: u8) -> TokenKind {
        let triple = self.peek_byte(1) == Some(quote) && self.peek_byte(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        let mut bytes = Vec::new();
        loop {
            if self.is_eof() {
                return TokenKind::Invalid("unterminated string literal".to_string());
            }
            let b = self.current();
            if b == quote {
                if !triple {
                    self.advance();
                    break;
                }
                if self.peek_byte(1) == Some(quote) && self.peek_byte(2) == Some(quote) {
                    self.pos += 3;
                    break;
                }
            }
            if b == b'\n' && !triple {
                return TokenKind::Invalid("unterminated string literal".to_string());
            }
            if b == b'\\' {
                self.advance();
                if self.is_eof() {
                    return TokenKind::Invalid("unterminated string literal".to_string());
                }
                let escaped = self.current();
                self.advance();
                match escaped {
                    b'n' => bytes.push(b'\n'),
                    b't' => bytes.push(b'\t'),
                    b'r' => bytes.push(b'\r'),
                    b'0' => bytes.push(0),
                    b'\\' | b'\'' | b'"' => bytes.push(escaped),
                    b'\n' => {}
                    other => {
                        bytes.push(b'\\');
                        bytes.push(other);
                    }
                }
                continue;
            }
            bytes.push(b);
            self.advance();
        }

        TokenKind::String(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            if tok.kind == TokenKind::Eof {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn test_attribute_comparison() {
        assert_eq!(
            kinds("ver.major == 8"),
            vec![
                TokenKind::Name("ver".into()),
                TokenKind::Dot,
                TokenKind::Name("major".into()),
                TokenKind::EqEq,
                TokenKind::Int(8),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("0x1F 0b101 1_000 2.5 .5 1e3"),
            vec![
                TokenKind::Int(31),
                TokenKind::Int(5),
                TokenKind::Int(1000),
                TokenKind::Float(2.5),
                TokenKind::Float(0.5),
                TokenKind::Float(1000.0),
            ]
        );
    }

    #[test]
    fn test_invalid_number_suffix() {
        assert!(matches!(kinds("3j")[0], TokenKind::Invalid(_)));
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            kinds(r#"'a\'b' "c\nd""#),
            vec![
                TokenKind::String("a'b".into()),
                TokenKind::String("c\nd".into()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(kinds("'abc")[0], TokenKind::Invalid(_)));
    }

    #[test]
    fn test_assignment_operators() {
        assert_eq!(
            kinds("x = 1; x += 2; (y := 3)")
                .into_iter()
                .filter(|k| matches!(k, TokenKind::Eq | TokenKind::AugAssign | TokenKind::ColonEq))
                .count(),
            3
        );
        assert_eq!(kinds("a **= 2")[1], TokenKind::AugAssign);
        assert_eq!(kinds("a // 2")[1], TokenKind::SlashSlash);
    }

    #[test]
    fn test_newlines_ignored_inside_brackets() {
        assert_eq!(
            kinds("(1,\n 2)"),
            vec![
                TokenKind::LParen,
                TokenKind::Int(1),
                TokenKind::Comma,
                TokenKind::Int(2),
                TokenKind::RParen,
            ]
        );
        assert!(kinds("a\nb").contains(&TokenKind::Newline));
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(kinds("8 # major"), vec![TokenKind::Int(8)]);
    }

    #[test]
    fn test_unexpected_character() {
        assert!(matches!(kinds("ver $ 1")[1], TokenKind::Invalid(_)));
        assert!(matches!(kinds("ver ! 1")[1], TokenKind::Invalid(_)));
    }
}
