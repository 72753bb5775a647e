//! The Buckle scanner.

use crate::token::{LiteralValue, TokenInfo};
use buckle_ast::syntax_kind::SyntaxKind;
use buckle_core::text::TextSpan;
use buckle_diagnostics::{messages, DiagnosticQueue};
use unicode_xid::UnicodeXID;

/// The scanner converts Buckle source text into tokens.
pub struct Scanner {
    text: Vec<char>,
    pos: usize,
    /// Start of the current token (after leading trivia).
    token_start: usize,
    token: SyntaxKind,
    /// Decoded literal value of the current token.
    token_value: LiteralValue,
    diagnostics: DiagnosticQueue,
}

impl Scanner {
    pub fn new(text: &str) -> Self {
        Self::from_chars(text.chars().collect())
    }

    pub fn from_chars(text: Vec<char>) -> Self {
        Self {
            text,
            pos: 0,
            token_start: 0,
            token: SyntaxKind::BadToken,
            token_value: LiteralValue::None,
            diagnostics: DiagnosticQueue::new(),
        }
    }

    /// Scan all of `text`, including the final end-of-file token.
    pub fn tokenize(text: &str) -> (Vec<TokenInfo>, DiagnosticQueue) {
        let mut scanner = Scanner::new(text);
        let mut tokens = Vec::new();
        loop {
            let kind = scanner.scan();
            tokens.push(scanner.token_info());
            if kind == SyntaxKind::EndOfFileToken {
                break;
            }
        }
        (tokens, scanner.take_diagnostics())
    }

    /// Look ahead: save state, call f, restore state and return the result.
    /// Diagnostics reported while looking ahead are discarded.
    pub fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let save_pos = self.pos;
        let save_start = self.token_start;
        let save_token = self.token;
        let save_value = self.token_value.clone();
        let save_diagnostics = self.diagnostics.clone();
        let result = f(self);
        self.pos = save_pos;
        self.token_start = save_start;
        self.token = save_token;
        self.token_value = save_value;
        self.diagnostics = save_diagnostics;
        result
    }

    #[inline]
    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    #[inline]
    pub fn token_value(&self) -> &LiteralValue {
        &self.token_value
    }

    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// End of the current token (exclusive).
    #[inline]
    pub fn token_end(&self) -> usize {
        self.pos
    }

    pub fn token_span(&self) -> TextSpan {
        TextSpan::from_bounds(self.token_start as u32, self.pos as u32)
    }

    pub fn token_text(&self) -> String {
        self.text[self.token_start..self.pos].iter().collect()
    }

    pub fn token_info(&self) -> TokenInfo {
        TokenInfo::new(self.token, self.token_span(), self.token_text())
            .with_value(self.token_value.clone())
    }

    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticQueue {
        std::mem::take(&mut self.diagnostics)
    }

    // ========================================================================
    // Scanning
    // ========================================================================

    pub fn scan(&mut self) -> SyntaxKind {
        self.token_value = LiteralValue::None;
        self.skip_trivia();
        self.token_start = self.pos;

        if self.is_eof() {
            self.token = SyntaxKind::EndOfFileToken;
            return self.token;
        }

        let ch = self.text[self.pos];
        self.token = match ch {
            '(' => { self.pos += 1; SyntaxKind::OpenParenToken }
            ')' => { self.pos += 1; SyntaxKind::CloseParenToken }
            '{' => { self.pos += 1; SyntaxKind::OpenBraceToken }
            '}' => { self.pos += 1; SyntaxKind::CloseBraceToken }
            '[' => { self.pos += 1; SyntaxKind::OpenBracketToken }
            ']' => { self.pos += 1; SyntaxKind::CloseBracketToken }
            ';' => { self.pos += 1; SyntaxKind::SemicolonToken }
            ',' => { self.pos += 1; SyntaxKind::CommaToken }
            '~' => { self.pos += 1; SyntaxKind::TildeToken }

            '+' => self.scan_operator(&[
                ("+=", SyntaxKind::PlusEqualsToken),
                ("++", SyntaxKind::PlusPlusToken),
                ("+", SyntaxKind::PlusToken),
            ]),
            '-' => self.scan_operator(&[
                ("-=", SyntaxKind::MinusEqualsToken),
                ("--", SyntaxKind::MinusMinusToken),
                ("-", SyntaxKind::MinusToken),
            ]),
            '*' => self.scan_operator(&[
                ("**=", SyntaxKind::AsteriskAsteriskEqualsToken),
                ("**", SyntaxKind::AsteriskAsteriskToken),
                ("*=", SyntaxKind::AsteriskEqualsToken),
                ("*", SyntaxKind::AsteriskToken),
            ]),
            '/' => self.scan_operator(&[
                ("/=", SyntaxKind::SlashEqualsToken),
                ("/", SyntaxKind::SlashToken),
            ]),
            '&' => self.scan_operator(&[
                ("&&", SyntaxKind::AmpersandAmpersandToken),
                ("&=", SyntaxKind::AmpersandEqualsToken),
                ("&", SyntaxKind::AmpersandToken),
            ]),
            '|' => self.scan_operator(&[
                ("||", SyntaxKind::PipePipeToken),
                ("|=", SyntaxKind::PipeEqualsToken),
                ("|", SyntaxKind::PipeToken),
            ]),
            '^' => self.scan_operator(&[
                ("^=", SyntaxKind::CaretEqualsToken),
                ("^", SyntaxKind::CaretToken),
            ]),
            '!' => self.scan_operator(&[
                ("!=", SyntaxKind::ExclamationEqualsToken),
                ("!", SyntaxKind::ExclamationToken),
            ]),
            '=' => self.scan_operator(&[
                ("==", SyntaxKind::EqualsEqualsToken),
                ("=", SyntaxKind::EqualsToken),
            ]),
            '<' => self.scan_operator(&[
                ("<<=", SyntaxKind::LessThanLessThanEqualsToken),
                ("<<", SyntaxKind::LessThanLessThanToken),
                ("<=", SyntaxKind::LessThanEqualsToken),
                ("<", SyntaxKind::LessThanToken),
            ]),
            '>' => self.scan_operator(&[
                (">>=", SyntaxKind::GreaterThanGreaterThanEqualsToken),
                (">>", SyntaxKind::GreaterThanGreaterThanToken),
                (">=", SyntaxKind::GreaterThanEqualsToken),
                (">", SyntaxKind::GreaterThanToken),
            ]),

            '"' => self.scan_string(),
            c if c.is_ascii_digit() => self.scan_number(),
            c if is_identifier_start(c) => self.scan_identifier(),
            c => {
                self.pos += 1;
                self.diagnostics.report(
                    TextSpan::new(self.token_start as u32, 1),
                    &messages::BAD_CHARACTER,
                    &[&c.to_string()],
                );
                SyntaxKind::BadToken
            }
        };
        self.token
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    #[inline]
    fn peek(&self, offset: usize) -> Option<char> {
        self.text.get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(0), self.peek(1)) {
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) => {
                    self.pos += 2;
                    while let Some(c) = self.peek(0) {
                        if c == '\n' || c == '\r' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match (self.peek(0), self.peek(1)) {
                            (Some('*'), Some('/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => {
                                self.diagnostics.report(
                                    TextSpan::new(start as u32, 2),
                                    &messages::UNTERMINATED_COMMENT,
                                    &[],
                                );
                                break;
                            }
                        }
                    }
                }
                _ => return,
            }
        }
    }

    /// Longest match first: `candidates` must be ordered by decreasing length.
    fn scan_operator(&mut self, candidates: &[(&str, SyntaxKind)]) -> SyntaxKind {
        for (text, kind) in candidates {
            let matches = text
                .chars()
                .enumerate()
                .all(|(i, expected)| self.peek(i) == Some(expected));
            if matches {
                self.pos += text.chars().count();
                return *kind;
            }
        }
        self.pos += 1;
        SyntaxKind::BadToken
    }

    fn scan_string(&mut self) -> SyntaxKind {
        self.pos += 1;
        let mut value = String::new();

        loop {
            match self.peek(0) {
                None | Some('\n') | Some('\r') => {
                    self.diagnostics.report(
                        TextSpan::new(self.token_start as u32, 1),
                        &messages::UNTERMINATED_STRING,
                        &[],
                    );
                    break;
                }
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    let escaped = match self.peek(1) {
                        Some('n') => Some('\n'),
                        Some('t') => Some('\t'),
                        Some('r') => Some('\r'),
                        Some('0') => Some('\0'),
                        Some('\\') => Some('\\'),
                        Some('"') => Some('"'),
                        _ => None,
                    };
                    match escaped {
                        Some(c) => {
                            value.push(c);
                            self.pos += 2;
                        }
                        None => {
                            value.push('\\');
                            self.pos += 1;
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }

        self.token_value = LiteralValue::String(value);
        SyntaxKind::StringLiteralToken
    }

    fn scan_number(&mut self) -> SyntaxKind {
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }

        let is_decimal = self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit());
        if is_decimal {
            self.pos += 1;
            while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }

        let text = self.token_text();
        let value = if is_decimal {
            text.parse::<f64>().ok().map(LiteralValue::Decimal)
        } else {
            text.parse::<i64>().ok().map(LiteralValue::Int)
        };

        self.token_value = match value {
            Some(value) => value,
            None => {
                let type_name = if is_decimal { "decimal" } else { "int" };
                self.diagnostics
                    .report(self.token_span(), &messages::INVALID_TYPE, &[&text, type_name]);
                LiteralValue::Int(0)
            }
        };
        SyntaxKind::NumericLiteralToken
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        self.pos += 1;
        while self.peek(0).is_some_and(is_identifier_part) {
            self.pos += 1;
        }
        SyntaxKind::from_keyword(&self.token_text()).unwrap_or(SyntaxKind::IdentifierToken)
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || UnicodeXID::is_xid_start(c)
}

fn is_identifier_part(c: char) -> bool {
    UnicodeXID::is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<SyntaxKind> {
        Scanner::tokenize(text).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(
            kinds("**= ** <<= >> ++"),
            vec![
                SyntaxKind::AsteriskAsteriskEqualsToken,
                SyntaxKind::AsteriskAsteriskToken,
                SyntaxKind::LessThanLessThanEqualsToken,
                SyntaxKind::GreaterThanGreaterThanToken,
                SyntaxKind::PlusPlusToken,
                SyntaxKind::EndOfFileToken,
            ]
        );
    }

    #[test]
    fn test_look_ahead_restores_state() {
        let mut scanner = Scanner::new("a b");
        scanner.scan();
        let next = scanner.look_ahead(|s| s.scan());
        assert_eq!(next, SyntaxKind::IdentifierToken);
        assert_eq!(scanner.token_text(), "a");
        assert_eq!(scanner.token_end(), 1);
    }
}
