//! Cool token definitions using logos

use crate::common::Span;
use logos::Logos;
use std::fmt;

/// A Cool token with its kind and source location
#[derive(Debug, Clone)]
pub struct CoolToken {
    pub kind: CoolTokenKind,
    pub span: Span,
}

impl CoolToken {
    pub fn new(kind: CoolTokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Cool token kinds
///
/// Keywords and boolean constants are not matched by logos directly: they
/// are case-insensitive, so the scanner recognizes them from identifier
/// tokens via [`CoolTokenKind::keyword`].
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\x0B\x0C]+")]
#[logos(skip r"--[^\n]*")]
pub enum CoolTokenKind {
    // Keywords
    Class,
    Else,
    Fi,
    If,
    In,
    Inherits,
    IsVoid,
    Let,
    Loop,
    Pool,
    Then,
    While,
    Case,
    Esac,
    New,
    Of,
    Not,

    // Constants
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntConst(i64),
    BoolConst(bool),
    /// String literal with its quotes and escapes still in place
    #[regex(r#""([^"\\\n]|\\(.|\n))*""#, |lex| lex.slice().to_string())]
    StrConst(String),
    /// String literal cut off by a raw newline or end of input
    #[regex(r#""([^"\\\n]|\\(.|\n))*"#)]
    UnterminatedString,

    // Identifiers
    #[regex(r"[A-Z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    TypeId(String),
    #[regex(r"[a-z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    ObjectId(String),

    // Comment delimiters; the scanner consumes nested comment bodies itself
    #[token("(*")]
    CommentOpen,
    #[token("*)")]
    CommentClose,

    // Multi-character operators
    #[token("<-")]
    Assign,
    #[token("=>")]
    DArrow,
    #[token("<=")]
    Le,

    // Single-character operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("~")]
    Tilde,
    #[token("<")]
    Lt,
    #[token("=")]
    Eq,
    #[token(".")]
    Dot,
    #[token("@")]
    At,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Punctuation
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,

    // Special
    Eof,
}

impl CoolTokenKind {
    /// Keyword or boolean constant spelled by an identifier, if any
    ///
    /// Keywords ignore case; `true` and `false` must begin with a lowercase
    /// letter.
    pub fn keyword(ident: &str) -> Option<Self> {
        let lower = ident.to_ascii_lowercase();
        let kind = match lower.as_str() {
            "class" => CoolTokenKind::Class,
            "else" => CoolTokenKind::Else,
            "fi" => CoolTokenKind::Fi,
            "if" => CoolTokenKind::If,
            "in" => CoolTokenKind::In,
            "inherits" => CoolTokenKind::Inherits,
            "isvoid" => CoolTokenKind::IsVoid,
            "let" => CoolTokenKind::Let,
            "loop" => CoolTokenKind::Loop,
            "pool" => CoolTokenKind::Pool,
            "then" => CoolTokenKind::Then,
            "while" => CoolTokenKind::While,
            "case" => CoolTokenKind::Case,
            "esac" => CoolTokenKind::Esac,
            "new" => CoolTokenKind::New,
            "of" => CoolTokenKind::Of,
            "not" => CoolTokenKind::Not,
            "true" | "false" if ident.starts_with(|c: char| c.is_ascii_lowercase()) => {
                CoolTokenKind::BoolConst(lower == "true")
            }
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for CoolTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Keywords
            CoolTokenKind::Class => write!(f, "class"),
            CoolTokenKind::Else => write!(f, "else"),
            CoolTokenKind::Fi => write!(f, "fi"),
            CoolTokenKind::If => write!(f, "if"),
            CoolTokenKind::In => write!(f, "in"),
            CoolTokenKind::Inherits => write!(f, "inherits"),
            CoolTokenKind::IsVoid => write!(f, "isvoid"),
            CoolTokenKind::Let => write!(f, "let"),
            CoolTokenKind::Loop => write!(f, "loop"),
            CoolTokenKind::Pool => write!(f, "pool"),
            CoolTokenKind::Then => write!(f, "then"),
            CoolTokenKind::While => write!(f, "while"),
            CoolTokenKind::Case => write!(f, "case"),
            CoolTokenKind::Esac => write!(f, "esac"),
            CoolTokenKind::New => write!(f, "new"),
            CoolTokenKind::Of => write!(f, "of"),
            CoolTokenKind::Not => write!(f, "not"),

            // Constants and identifiers
            CoolTokenKind::IntConst(v) => write!(f, "integer {}", v),
            CoolTokenKind::BoolConst(b) => write!(f, "{}", b),
            CoolTokenKind::StrConst(s) => write!(f, "string {}", s),
            CoolTokenKind::UnterminatedString => write!(f, "unterminated string"),
            CoolTokenKind::TypeId(s) => write!(f, "type identifier '{}'", s),
            CoolTokenKind::ObjectId(s) => write!(f, "identifier '{}'", s),

            CoolTokenKind::CommentOpen => write!(f, "'(*'"),
            CoolTokenKind::CommentClose => write!(f, "'*)'"),

            // Operators
            CoolTokenKind::Assign => write!(f, "'<-'"),
            CoolTokenKind::DArrow => write!(f, "'=>'"),
            CoolTokenKind::Le => write!(f, "'<='"),
            CoolTokenKind::Plus => write!(f, "'+'"),
            CoolTokenKind::Minus => write!(f, "'-'"),
            CoolTokenKind::Star => write!(f, "'*'"),
            CoolTokenKind::Slash => write!(f, "'/'"),
            CoolTokenKind::Tilde => write!(f, "'~'"),
            CoolTokenKind::Lt => write!(f, "'<'"),
            CoolTokenKind::Eq => write!(f, "'='"),
            CoolTokenKind::Dot => write!(f, "'.'"),
            CoolTokenKind::At => write!(f, "'@'"),

            // Delimiters and punctuation
            CoolTokenKind::LParen => write!(f, "'('"),
            CoolTokenKind::RParen => write!(f, "')'"),
            CoolTokenKind::LBrace => write!(f, "'{{'"),
            CoolTokenKind::RBrace => write!(f, "'}}'"),
            CoolTokenKind::Semi => write!(f, "';'"),
            CoolTokenKind::Comma => write!(f, "','"),
            CoolTokenKind::Colon => write!(f, "':'"),

            CoolTokenKind::Eof => write!(f, "end of file"),
        }
    }
}
