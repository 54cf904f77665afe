//! Lexer for the Rust item subset using logos

use logos::{Lexer, Logos};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // Item keywords
    #[token("as")]
    As,
    #[token("async")]
    Async,
    #[token("const")]
    Const,
    #[token("crate")]
    Crate,
    #[token("dyn")]
    Dyn,
    #[token("enum")]
    Enum,
    #[token("extern")]
    Extern,
    #[token("fn")]
    Fn,
    #[token("for")]
    For,
    #[token("impl")]
    Impl,
    #[token("in")]
    In,
    #[token("mod")]
    Mod,
    #[token("mut")]
    Mut,
    #[token("pub")]
    Pub,
    #[token("ref")]
    Ref,
    #[token("self")]
    SelfValue,
    #[token("Self")]
    SelfType,
    #[token("static")]
    Static,
    #[token("struct")]
    Struct,
    #[token("super")]
    Super,
    #[token("trait")]
    Trait,
    #[token("type")]
    Type,
    #[token("unsafe")]
    Unsafe,
    #[token("use")]
    Use,
    #[token("where")]
    Where,

    // Multi-character punctuation (longer patterns first)
    #[token("::")]
    PathSep,
    #[token("->")]
    Arrow,
    #[token("=>")]
    FatArrow,
    #[token("&&")]
    AndAnd,

    // Delimiters
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,

    // Single-character punctuation the grammar cares about. `<` and `>` never
    // combine so nested generics close one bracket at a time.
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,
    #[token("&")]
    And,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("#")]
    Pound,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,

    // Everything else that may appear inside bodies
    #[regex(r"[-/%^|~@$.]", |lex| lex.slice().chars().next())]
    Punct(char),

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r"r#[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    RawIdent(String),

    #[regex(r"'[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Lifetime(String),

    #[regex(r#"b?"([^"\\]|\\(.|\n))*""#, |lex| lex.slice().to_string())]
    #[regex(r##"b?r#*""##, raw_string)]
    Str(String),

    #[regex(r"b?'([^'\\\n]|\\.|\\x[0-9a-fA-F]{2}|\\u\{[0-9a-fA-F_]{1,6}\})'", |lex| lex.slice().to_string())]
    Char(String),

    #[regex(r"[0-9][0-9a-zA-Z_]*", |lex| lex.slice().to_string())]
    Number(String),

    // Comments are kept as tokens and split out before parsing
    #[regex(r"//[^\r\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,
}

/// Finish a block comment once its opening `/*` has been matched. Block
/// comments nest, so the comment ends at the `*/` that balances the opener.
fn block_comment(lex: &mut Lexer<Token>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i + 1 < rest.len() {
        match (rest[i], rest[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    lex.bump(i);
                    return true;
                }
            }
            _ => i += 1,
        }
    }
    false
}

/// Finish a raw string literal once its opening quote has been matched
fn raw_string(lex: &mut Lexer<Token>) -> Option<String> {
    let hashes = lex.slice().chars().filter(|c| *c == '#').count();
    let closing = format!("\"{}", "#".repeat(hashes));
    let end = lex.remainder().find(&closing)?;
    lex.bump(end + closing.len());
    Some(lex.slice().to_string())
}

impl Token {
    pub fn is_comment(&self) -> bool {
        matches!(self, Token::LineComment | Token::BlockComment)
    }

    /// Opening and closing brackets that delimit token trees
    pub fn is_delimiter(&self) -> bool {
        matches!(
            self,
            Token::BraceOpen
                | Token::BraceClose
                | Token::BracketOpen
                | Token::BracketClose
                | Token::ParenOpen
                | Token::ParenClose
        )
    }

    /// Tokens whose text is reproduced byte for byte and never rewritten
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::Str(_) | Token::Char(_) | Token::Number(_) | Token::Lifetime(_)
        )
    }
}

/// Lex input string into tokens with spans, comments included
pub fn lex(input: &str) -> impl Iterator<Item = (Result<Token, ()>, Span)> + '_ {
    Token::lexer(input).spanned()
}

/// Lex input fully, reporting every span the lexer could not match
pub fn tokenize(input: &str) -> Result<Vec<(Token, Span)>, Vec<Span>> {
    let mut tokens = Vec::new();
    let mut invalid = Vec::new();
    for (tok, span) in lex(input) {
        match tok {
            Ok(tok) => tokens.push((tok, span)),
            Err(()) => invalid.push(span),
        }
    }
    if invalid.is_empty() {
        Ok(tokens)
    } else {
        Err(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .expect("Should lex")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_item_keywords() {
        assert_eq!(
            kinds("pub struct impl trait fn use"),
            vec![
                Token::Pub,
                Token::Struct,
                Token::Impl,
                Token::Trait,
                Token::Fn,
                Token::Use
            ]
        );
    }

    #[test]
    fn test_self_value_and_type() {
        assert_eq!(kinds("self Self"), vec![Token::SelfValue, Token::SelfType]);
    }

    #[test]
    fn test_identifier_with_keyword_prefix() {
        assert_eq!(
            kinds("structure fnord"),
            vec![
                Token::Ident("structure".to_string()),
                Token::Ident("fnord".to_string())
            ]
        );
    }

    #[test]
    fn test_nested_generics_close_separately() {
        assert_eq!(
            kinds("Vec<Vec<u8>>"),
            vec![
                Token::Ident("Vec".to_string()),
                Token::Lt,
                Token::Ident("Vec".to_string()),
                Token::Lt,
                Token::Ident("u8".to_string()),
                Token::Gt,
                Token::Gt
            ]
        );
    }

    #[test]
    fn test_path_separator_and_arrows() {
        assert_eq!(
            kinds("a::b -> c => d"),
            vec![
                Token::Ident("a".to_string()),
                Token::PathSep,
                Token::Ident("b".to_string()),
                Token::Arrow,
                Token::Ident("c".to_string()),
                Token::FatArrow,
                Token::Ident("d".to_string())
            ]
        );
    }

    #[test]
    fn test_lifetime_and_char() {
        assert_eq!(
            kinds("'a 'x' '_ '\\n'"),
            vec![
                Token::Lifetime("'a".to_string()),
                Token::Char("'x'".to_string()),
                Token::Lifetime("'_".to_string()),
                Token::Char("'\\n'".to_string())
            ]
        );
    }

    #[test]
    fn test_strings_keep_quotes() {
        assert_eq!(
            kinds(r#""a \"quoted\" word" b"bytes""#),
            vec![
                Token::Str(r#""a \"quoted\" word""#.to_string()),
                Token::Str(r#"b"bytes""#.to_string())
            ]
        );
    }

    #[test]
    fn test_raw_string() {
        assert_eq!(
            kinds(r####"r#"has "quotes""# x"####),
            vec![
                Token::Str(r####"r#"has "quotes""#"####.to_string()),
                Token::Ident("x".to_string())
            ]
        );
    }

    #[test]
    fn test_raw_identifier() {
        assert_eq!(kinds("r#type"), vec![Token::RawIdent("r#type".to_string())]);
    }

    #[test]
    fn test_numbers_split_at_dots() {
        assert_eq!(
            kinds("0..10"),
            vec![
                Token::Number("0".to_string()),
                Token::Punct('.'),
                Token::Punct('.'),
                Token::Number("10".to_string())
            ]
        );
    }

    #[test]
    fn test_comments_are_tokens() {
        let tokens = kinds("a // line\n/* block */ /// doc\nb");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".to_string()),
                Token::LineComment,
                Token::BlockComment,
                Token::LineComment,
                Token::Ident("b".to_string())
            ]
        );
    }

    #[test]
    fn test_block_comment_with_stars() {
        let tokens = tokenize("/** doc **/ x").expect("Should lex");
        assert_eq!(tokens[0], (Token::BlockComment, 0..11));
    }

    #[test]
    fn test_nested_block_comment() {
        let input = "/* outer /* inner */ still outer */ x";
        let tokens = tokenize(input).expect("Should lex");
        assert_eq!(tokens[0], (Token::BlockComment, 0..35));
        assert_eq!(tokens[1], (Token::Ident("x".to_string()), 36..37));
    }

    #[test]
    fn test_empty_and_doc_block_comments() {
        assert_eq!(
            kinds("/**/ /** doc */ /*! inner */"),
            vec![Token::BlockComment, Token::BlockComment, Token::BlockComment]
        );
    }

    #[test]
    fn test_unterminated_block_comment_is_an_error() {
        assert!(tokenize("struct A; /* open").is_err());
    }

    #[test]
    fn test_line_comment_stops_before_carriage_return() {
        let input = "// note\r\nstruct A;\r\n";
        let tokens = tokenize(input).expect("Should lex");
        assert_eq!(tokens[0], (Token::LineComment, 0..7));
        assert_eq!(&input[tokens[0].1.clone()], "// note");
        assert_eq!(tokens[1].0, Token::Ident("struct".to_string()));
    }

    #[test]
    fn test_invalid_character_reported() {
        let err = tokenize("struct A \\ B").unwrap_err();
        assert_eq!(err, vec![9..10]);
    }
}
