//! Error types for parsing source text

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::syntax::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("Unrecognized input at {span:?}")]
    Lex { span: Span },
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } | ParseError::Lex { span } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };
                render_report(
                    source,
                    filename,
                    span,
                    message,
                    &format!("{}{}", message, expected_str),
                )
            }
            ParseError::Lex { span } => render_report(
                source,
                filename,
                span,
                "Unrecognized input",
                "no token starts here",
            ),
        }
    }
}

/// Render a single-label ariadne report into a string
pub(crate) fn render_report(
    source: &str,
    filename: &str,
    span: &Span,
    message: &str,
    label: &str,
) -> String {
    let mut buf = Vec::new();
    let written = Report::build(ReportKind::Error, filename, span.start)
        .with_message(message)
        .with_label(
            Label::new((filename, span.clone()))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .write((filename, Source::from(source)), &mut buf);
    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("{}: {} at {:?}", filename, message, span),
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Ident(s) | Token::RawIdent(s) => format!("identifier '{}'", s),
        Token::Lifetime(s) => format!("lifetime {}", s),
        Token::Str(s) => format!("string {}", s),
        Token::Char(s) => format!("character {}", s),
        Token::Number(n) => format!("number {}", n),
        Token::Punct(c) => format!("'{}'", c),
        Token::PathSep => "'::'".to_string(),
        Token::Arrow => "'->'".to_string(),
        Token::FatArrow => "'=>'".to_string(),
        Token::AndAnd => "'&&'".to_string(),
        Token::BraceOpen => "'{'".to_string(),
        Token::BraceClose => "'}'".to_string(),
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::Lt => "'<'".to_string(),
        Token::Gt => "'>'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Semicolon => "';'".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Eq => "'='".to_string(),
        Token::And => "'&'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::Pound => "'#'".to_string(),
        Token::Bang => "'!'".to_string(),
        Token::Question => "'?'".to_string(),
        Token::LineComment | Token::BlockComment => "comment".to_string(),
        keyword => format!("keyword '{}'", keyword_text(keyword)),
    }
}

fn keyword_text(tok: &Token) -> &'static str {
    match tok {
        Token::As => "as",
        Token::Async => "async",
        Token::Const => "const",
        Token::Crate => "crate",
        Token::Dyn => "dyn",
        Token::Enum => "enum",
        Token::Extern => "extern",
        Token::Fn => "fn",
        Token::For => "for",
        Token::Impl => "impl",
        Token::In => "in",
        Token::Mod => "mod",
        Token::Mut => "mut",
        Token::Pub => "pub",
        Token::Ref => "ref",
        Token::SelfValue => "self",
        Token::SelfType => "Self",
        Token::Static => "static",
        Token::Struct => "struct",
        Token::Super => "super",
        Token::Trait => "trait",
        Token::Type => "type",
        Token::Unsafe => "unsafe",
        Token::Use => "use",
        Token::Where => "where",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_includes_filename_and_message() {
        let err = ParseError::Syntax {
            span: 7..8,
            message: "Unexpected '}'".to_string(),
            expected: vec!["identifier".to_string()],
        };
        let text = err.format("struct }", "widget.rs");
        assert!(text.contains("widget.rs"));
        assert!(text.contains("Unexpected '}'"));
        assert!(text.contains("Expected: identifier"));
    }

    #[test]
    fn test_lex_error_span() {
        let err = ParseError::Lex { span: 3..4 };
        assert_eq!(err.span(), &(3..4));
        assert!(err.to_string().contains("3..4"));
    }

    #[test]
    fn test_keyword_tokens_formatted() {
        assert_eq!(format_token(&Token::Impl), "keyword 'impl'");
        assert_eq!(format_token(&Token::Punct('%')), "'%'");
    }
}
