//! `Kind[Element]` grammar using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::lexer::{self, DirectiveToken};
use super::DirectiveError;
use crate::syntax::Spanned;

type Extra<'a> = extra::Err<Rich<'a, DirectiveToken>>;

/// Split a directive into its kind word and element word
pub(super) fn parse(input: &str) -> Result<(Spanned<String>, Spanned<String>), DirectiveError> {
    let len = input.len();
    let mut tokens = Vec::new();
    for (tok, span) in lexer::lex(input) {
        match tok {
            Ok(tok) => tokens.push((tok, SimpleSpan::from(span))),
            Err(()) => {
                return Err(DirectiveError::Syntax {
                    message: format!("unexpected character {:?}", &input[span.clone()]),
                    span,
                })
            }
        }
    }

    let token_stream =
        Stream::from_iter(tokens.into_iter()).map((len..len).into(), |(t, s): (_, _)| (t, s));

    directive_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| match errs.into_iter().next() {
            Some(err) => DirectiveError::Syntax {
                span: err.span().into_range(),
                message: describe(&err),
            },
            None => DirectiveError::Empty,
        })
}

fn describe(err: &Rich<'_, DirectiveToken>) -> String {
    use chumsky::error::RichReason;

    match err.reason() {
        RichReason::ExpectedFound { found, .. } => match found {
            Some(tok) => format!("unexpected {}", format_token(tok)),
            None => "directive ends early, expected Kind[Element]".to_string(),
        },
        RichReason::Custom(msg) => msg.to_string(),
    }
}

fn format_token(tok: &DirectiveToken) -> String {
    match tok {
        DirectiveToken::Open => "'['".to_string(),
        DirectiveToken::Close => "']'".to_string(),
        DirectiveToken::Word(w) | DirectiveToken::Short(w) | DirectiveToken::Malformed(w) => {
            format!("'{}'", w)
        }
    }
}

fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn directive_parser<'a, I>(
) -> impl Parser<'a, I, (Spanned<String>, Spanned<String>), Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = DirectiveToken, Span = SimpleSpan>,
{
    let word = select! {
        DirectiveToken::Word(w) => w,
    }
    .map_with(|w, e| Spanned::new(w, span_range(&e.span())));

    let rejected = select! {
        DirectiveToken::Short(w) => w,
        DirectiveToken::Malformed(w) => w,
    }
    .try_map(|w, span| {
        Err::<Spanned<String>, _>(Rich::custom(
            span,
            format!(
                "'{}' is not an identifier: expected a letter followed by at least one letter, digit or underscore",
                w
            ),
        ))
    });

    let identifier = choice((word, rejected));

    identifier
        .clone()
        .then_ignore(just(DirectiveToken::Open))
        .then(identifier)
        .then_ignore(just(DirectiveToken::Close))
        .then_ignore(end())
}
