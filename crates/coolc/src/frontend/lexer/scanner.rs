//! Cool lexer implementation using logos

use super::token::{CoolToken, CoolTokenKind};
use crate::common::{CompileError, CompileResult, LineIndex, Span};
use logos::Logos;

/// Longest string constant accepted by the language
const MAX_STRING_LENGTH: usize = 1024;

/// Lexer for Cool source code
pub struct CoolLexer<'a> {
    inner: logos::Lexer<'a, CoolTokenKind>,
    lines: LineIndex,
    /// Buffer for peeked tokens (supports 2-token lookahead)
    peeked: Vec<CoolToken>,
    at_eof: bool,
}

impl<'a> CoolLexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: CoolTokenKind::lexer(source),
            lines: LineIndex::new(source),
            peeked: Vec::new(),
            at_eof: false,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> CompileResult<CoolToken> {
        // Return from buffer first
        if !self.peeked.is_empty() {
            return Ok(self.peeked.remove(0));
        }

        self.scan_token()
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(start, end, self.lines.line_of(start))
    }

    /// Scan a new token from source
    fn scan_token(&mut self) -> CompileResult<CoolToken> {
        loop {
            if self.at_eof {
                let len = self.inner.source().len();
                return Ok(CoolToken::new(CoolTokenKind::Eof, self.span(len, len)));
            }

            let Some(result) = self.inner.next() else {
                self.at_eof = true;
                continue;
            };

            let range = self.inner.span();
            let span = self.span(range.start, range.end);
            let kind = match result {
                Ok(CoolTokenKind::CommentOpen) => {
                    self.skip_block_comment(span)?;
                    continue;
                }
                Ok(CoolTokenKind::CommentClose) => {
                    return Err(CompileError::lexer("unmatched '*)'", span));
                }
                Ok(CoolTokenKind::UnterminatedString) => {
                    return Err(CompileError::lexer("unterminated string constant", span));
                }
                Ok(CoolTokenKind::StrConst(raw)) => CoolTokenKind::StrConst(unescape(&raw, span)?),
                Ok(CoolTokenKind::ObjectId(name)) => {
                    CoolTokenKind::keyword(&name).unwrap_or(CoolTokenKind::ObjectId(name))
                }
                Ok(CoolTokenKind::TypeId(name)) => match CoolTokenKind::keyword(&name) {
                    // `True` and `False` stay type identifiers
                    Some(CoolTokenKind::BoolConst(_)) | None => CoolTokenKind::TypeId(name),
                    Some(keyword) => keyword,
                },
                Ok(kind) => kind,
                Err(()) => {
                    let slice = self.inner.slice();
                    let message = if slice.chars().all(|c| c.is_ascii_digit()) {
                        format!("integer constant {} is too large", slice)
                    } else {
                        format!("unexpected character '{}'", slice)
                    };
                    return Err(CompileError::lexer(message, span));
                }
            };
            return Ok(CoolToken::new(kind, span));
        }
    }

    /// Consume a (possibly nested) block comment whose `(*` was just read
    fn skip_block_comment(&mut self, open: Span) -> CompileResult<()> {
        let rest = self.inner.remainder().as_bytes();
        let mut depth = 1usize;
        let mut i = 0;
        while i < rest.len() {
            match (rest[i], rest.get(i + 1)) {
                (b'(', Some(b'*')) => {
                    depth += 1;
                    i += 2;
                }
                (b'*', Some(b')')) => {
                    depth -= 1;
                    i += 2;
                    if depth == 0 {
                        self.inner.bump(i);
                        return Ok(());
                    }
                }
                _ => i += 1,
            }
        }
        Err(CompileError::lexer("EOF in comment", open))
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> CompileResult<&CoolToken> {
        if self.peeked.is_empty() {
            let token = self.scan_token()?;
            self.peeked.push(token);
        }
        Ok(&self.peeked[0])
    }

    /// Peek at the token at offset (0 = next, 1 = after next, etc.)
    pub fn peek_at(&mut self, offset: usize) -> CompileResult<&CoolToken> {
        while self.peeked.len() <= offset {
            let token = self.scan_token()?;
            self.peeked.push(token);
        }
        Ok(&self.peeked[offset])
    }

    /// Check if the next token matches the expected kind
    pub fn check(&mut self, expected: &CoolTokenKind) -> CompileResult<bool> {
        Ok(std::mem::discriminant(&self.peek()?.kind) == std::mem::discriminant(expected))
    }

    /// Check if the token after the next one matches the expected kind
    pub fn check_lookahead(&mut self, expected: &CoolTokenKind) -> CompileResult<bool> {
        let token = self.peek_at(1)?;
        Ok(std::mem::discriminant(&token.kind) == std::mem::discriminant(expected))
    }

    /// Consume the next token if it matches, return true if consumed
    pub fn match_token(&mut self, expected: &CoolTokenKind) -> CompileResult<bool> {
        if self.check(expected)? {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Expect a specific token kind, error if not found
    pub fn expect(&mut self, expected: CoolTokenKind) -> CompileResult<CoolToken> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token.kind) == std::mem::discriminant(&expected) {
            Ok(token)
        } else {
            Err(CompileError::parser(
                format!("expected {}, found {}", expected, token.kind),
                token.span,
            ))
        }
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize_all(mut self) -> CompileResult<Vec<CoolToken>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, CoolTokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

/// Strip the quotes from a string literal and resolve its escapes
fn unescape(raw: &str, span: Span) -> CompileResult<String> {
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        let c = match c {
            '\0' => return Err(CompileError::lexer("string contains null character", span)),
            '\\' => match chars.next() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('b') => '\u{8}',
                Some('f') => '\u{c}',
                Some('\0') => {
                    return Err(CompileError::lexer("string contains escaped null character", span));
                }
                Some(other) => other,
                None => '\\',
            },
            other => other,
        };
        out.push(c);
    }
    if out.len() > MAX_STRING_LENGTH {
        return Err(CompileError::lexer("string constant too long", span));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_ignore_case() {
        let source = "class CLASS Inherits iF fI not";
        let mut lexer = CoolLexer::new(source);

        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Class));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Class));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Inherits));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::If));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Fi));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Not));
    }

    #[test]
    fn test_bool_constants_need_lowercase_start() {
        let source = "true fALSE True";
        let mut lexer = CoolLexer::new(source);

        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::BoolConst(true)));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::BoolConst(false)));
        assert!(matches!(
            lexer.next_token().unwrap().kind,
            CoolTokenKind::TypeId(s) if s == "True"
        ));
    }

    #[test]
    fn test_identifiers() {
        let source = "Main main x_1 SELF_TYPE self";
        let tokens = CoolLexer::new(source).tokenize_all().unwrap();

        assert!(matches!(&tokens[0].kind, CoolTokenKind::TypeId(s) if s == "Main"));
        assert!(matches!(&tokens[1].kind, CoolTokenKind::ObjectId(s) if s == "main"));
        assert!(matches!(&tokens[2].kind, CoolTokenKind::ObjectId(s) if s == "x_1"));
        assert!(matches!(&tokens[3].kind, CoolTokenKind::TypeId(s) if s == "SELF_TYPE"));
        assert!(matches!(&tokens[4].kind, CoolTokenKind::ObjectId(s) if s == "self"));
        assert!(matches!(tokens[5].kind, CoolTokenKind::Eof));
    }

    #[test]
    fn test_operators() {
        let source = "<- => <= < = + - * / ~ . @ , ; : ( ) { }";
        let mut lexer = CoolLexer::new(source);

        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Assign));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::DArrow));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Le));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Lt));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Eq));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Plus));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Minus));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Star));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Slash));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Tilde));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Dot));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::At));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Comma));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Semi));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::Colon));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::LParen));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::RParen));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::LBrace));
        assert!(matches!(lexer.next_token().unwrap().kind, CoolTokenKind::RBrace));
    }

    #[test]
    fn test_string_escapes() {
        let source = r#""a\tb\nc\"d\qe""#;
        let mut lexer = CoolLexer::new(source);

        assert!(matches!(
            lexer.next_token().unwrap().kind,
            CoolTokenKind::StrConst(s) if s == "a\tb\nc\"dqe"
        ));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = CoolLexer::new("\"abc\nx");
        let err = lexer.next_token().unwrap_err();
        assert!(err.to_string().contains("unterminated string constant"));
    }

    #[test]
    fn test_comments_and_lines() {
        let source = "-- line comment\n(* block (* nested *) still *)\nclass";
        let token = CoolLexer::new(source).next_token().unwrap();

        assert!(matches!(token.kind, CoolTokenKind::Class));
        assert_eq!(token.span.line, 3);
    }

    #[test]
    fn test_unclosed_comment() {
        let err = CoolLexer::new("(* never closed").next_token().unwrap_err();
        assert!(err.to_string().contains("EOF in comment"));
    }

    #[test]
    fn test_unmatched_comment_close() {
        let err = CoolLexer::new("x *)").tokenize_all().unwrap_err();
        assert!(err.to_string().contains("unmatched '*)'"));
    }

    #[test]
    fn test_integer_constant() {
        let tokens = CoolLexer::new("007 42").tokenize_all().unwrap();
        assert!(matches!(tokens[0].kind, CoolTokenKind::IntConst(7)));
        assert!(matches!(tokens[1].kind, CoolTokenKind::IntConst(42)));
    }
}
