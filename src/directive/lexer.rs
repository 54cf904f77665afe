//! Token set for `Kind[Element]` directives
//!
//! Whitespace is not skipped: a directive is a single word with no spaces.

use logos::Logos;

use crate::syntax::Span;

#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DirectiveToken {
    #[token("[")]
    Open,
    #[token("]")]
    Close,

    /// A letter followed by at least one letter, digit or underscore
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]+", |lex| lex.slice().to_string())]
    Word(String),

    /// A lone letter
    #[regex(r"[a-zA-Z]", |lex| lex.slice().to_string())]
    Short(String),

    /// Starts with a digit or underscore
    #[regex(r"[0-9_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Malformed(String),
}

pub fn lex(input: &str) -> impl Iterator<Item = (Result<DirectiveToken, ()>, Span)> + '_ {
    DirectiveToken::lexer(input).spanned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Result<DirectiveToken, ()>> {
        lex(input).map(|(t, _)| t).collect()
    }

    #[test]
    fn test_well_formed_directive() {
        assert_eq!(
            kinds("Stack[Widget]"),
            vec![
                Ok(DirectiveToken::Word("Stack".to_string())),
                Ok(DirectiveToken::Open),
                Ok(DirectiveToken::Word("Widget".to_string())),
                Ok(DirectiveToken::Close)
            ]
        );
    }

    #[test]
    fn test_short_and_malformed_words() {
        assert_eq!(
            kinds("a[2x]"),
            vec![
                Ok(DirectiveToken::Short("a".to_string())),
                Ok(DirectiveToken::Open),
                Ok(DirectiveToken::Malformed("2x".to_string())),
                Ok(DirectiveToken::Close)
            ]
        );
    }

    #[test]
    fn test_whitespace_is_an_error() {
        let tokens: Vec<_> = lex("Stack [W]").collect();
        assert_eq!(tokens[1], (Err(()), 5..6));
    }
}
