use crate::error::{LexError, LexErrorKind, LexResult};
use crate::token::{Position, Token, TokenKind};

pub struct Lexer {
    input: Vec<char>,
    len: usize,
    idx: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let input: Vec<char> = source.chars().collect();
        let len = input.len();
        Self { input, len, idx: 0, line: 1, col: 1 }
    }

    fn pos(&self) -> Position { Position { index: self.idx, line: self.line, column: self.col } }

    fn peek(&self) -> Option<char> { self.input.get(self.idx).copied() }

    fn peek2(&self) -> Option<char> { self.input.get(self.idx + 1).copied() }

    fn bump(&mut self) -> Option<char> {
        if self.idx >= self.len { return None; }
        let ch = self.input[self.idx];
        self.idx += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else { false }
    }

    fn skip_ws_and_comments(&mut self) -> LexResult<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => { self.bump(); }
                Some('/') if self.peek2() == Some('/') => {
                    while let Some(c) = self.peek() { if c == '\n' { break; } self.bump(); }
                }
                Some('/') if self.peek2() == Some('*') => {
                    let start = self.pos();
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => { self.bump(); break; }
                            Some(_) => {}
                            None => return Err(LexError { kind: LexErrorKind::UnterminatedComment, pos: start }),
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn read_ident_or_kw(&mut self) -> Token {
        let pos = self.pos();
        let mut s = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' { s.push(ch); self.bump(); } else { break; }
        }
        let kind = match s.as_str() {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "int" => TokenKind::IntKw,
            "void" => TokenKind::VoidKw,
            _ => TokenKind::Ident(s),
        };
        Token { kind, pos }
    }

    // Decimal, octal (leading 0) and hexadecimal (0x/0X) literals.
    fn read_number(&mut self) -> LexResult<Token> {
        let pos = self.pos();
        let mut value: u64 = 0;
        if self.peek() == Some('0') {
            self.bump();
            if self.peek() == Some('x') || self.peek() == Some('X') {
                self.bump();
                let mut has_digit = false;
                while let Some(ch) = self.peek() {
                    if let Some(d) = ch.to_digit(16) {
                        has_digit = true;
                        value = value
                            .checked_mul(16)
                            .and_then(|v| v.checked_add(u64::from(d)))
                            .ok_or(LexError { kind: LexErrorKind::IntOverflow, pos })?;
                        self.bump();
                    } else { break; }
                }
                if !has_digit {
                    let ch = self.peek().unwrap_or('\0');
                    return Err(LexError { kind: LexErrorKind::InvalidDigit { ch, radix: "hexadecimal" }, pos });
                }
            } else {
                // a bare 0 is also an octal literal
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        let d = ch.to_digit(8).ok_or(LexError {
                            kind: LexErrorKind::InvalidDigit { ch, radix: "octal" },
                            pos,
                        })?;
                        value = value
                            .checked_mul(8)
                            .and_then(|v| v.checked_add(u64::from(d)))
                            .ok_or(LexError { kind: LexErrorKind::IntOverflow, pos })?;
                        self.bump();
                    } else { break; }
                }
            }
        } else {
            while let Some(ch) = self.peek() {
                if let Some(d) = ch.to_digit(10) {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(u64::from(d)))
                        .ok_or(LexError { kind: LexErrorKind::IntOverflow, pos })?;
                    self.bump();
                } else { break; }
            }
        }
        let v = u32::try_from(value).map_err(|_| LexError { kind: LexErrorKind::IntOverflow, pos })?;
        Ok(Token { kind: TokenKind::Int(v), pos })
    }

    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_ws_and_comments()?;
        let pos = self.pos();
        let ch = match self.peek() { Some(c) => c, None => return Ok(Token { kind: TokenKind::Eof, pos }) };
        match ch {
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.read_ident_or_kw()),
            '0'..='9' => self.read_number(),
            '(' => { self.bump(); Ok(Token { kind: TokenKind::LParen, pos }) }
            ')' => { self.bump(); Ok(Token { kind: TokenKind::RParen, pos }) }
            '{' => { self.bump(); Ok(Token { kind: TokenKind::LBrace, pos }) }
            '}' => { self.bump(); Ok(Token { kind: TokenKind::RBrace, pos }) }
            ';' => { self.bump(); Ok(Token { kind: TokenKind::Semicolon, pos }) }
            ',' => { self.bump(); Ok(Token { kind: TokenKind::Comma, pos }) }
            '+' => { self.bump(); Ok(Token { kind: TokenKind::Plus, pos }) }
            '-' => { self.bump(); Ok(Token { kind: TokenKind::Minus, pos }) }
            '*' => { self.bump(); Ok(Token { kind: TokenKind::Star, pos }) }
            '/' => { self.bump(); Ok(Token { kind: TokenKind::Slash, pos }) }
            '%' => { self.bump(); Ok(Token { kind: TokenKind::Percent, pos }) }
            '=' => {
                self.bump();
                if self.match_next('=') { Ok(Token { kind: TokenKind::EqEq, pos }) } else { Ok(Token { kind: TokenKind::Assign, pos }) }
            }
            '!' => {
                self.bump();
                if self.match_next('=') { Ok(Token { kind: TokenKind::NotEq, pos }) } else { Ok(Token { kind: TokenKind::Not, pos }) }
            }
            '<' => {
                self.bump();
                if self.match_next('=') { Ok(Token { kind: TokenKind::Le, pos }) } else { Ok(Token { kind: TokenKind::Lt, pos }) }
            }
            '>' => {
                self.bump();
                if self.match_next('=') { Ok(Token { kind: TokenKind::Ge, pos }) } else { Ok(Token { kind: TokenKind::Gt, pos }) }
            }
            '&' => {
                self.bump();
                if self.match_next('&') { Ok(Token { kind: TokenKind::AmpAmp, pos }) } else { Err(LexError { kind: LexErrorKind::InvalidChar { ch: '&' }, pos }) }
            }
            '|' => {
                self.bump();
                if self.match_next('|') { Ok(Token { kind: TokenKind::PipePipe, pos }) } else { Err(LexError { kind: LexErrorKind::InvalidChar { ch: '|' }, pos }) }
            }
            _ => Err(LexError { kind: LexErrorKind::InvalidChar { ch }, pos }),
        }
    }
}
