//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ParseError;
use crate::syntax::ast::*;
use crate::syntax::comments;
use crate::syntax::lexer::{self, Token};

type Extra<'a> = extra::Err<Rich<'a, Token>>;

/// Token list of one source file, comments included, for rebuilding
/// opaque regions from the spans the grammar reports
struct SourceContext<'src> {
    text: &'src str,
    tokens: Vec<(Token, Span)>,
}

impl SourceContext<'_> {
    fn verbatim(&self, span: Span) -> Verbatim {
        let mut segments = Vec::new();
        let mut cursor = span.start;
        let first = self.tokens.partition_point(|(_, s)| s.start < span.start);
        for (tok, s) in &self.tokens[first..] {
            if s.start >= span.end {
                break;
            }
            if s.start > cursor {
                push_text(&mut segments, &self.text[cursor..s.start]);
            }
            let slice = &self.text[s.clone()];
            match tok {
                Token::Ident(name) | Token::RawIdent(name) => {
                    segments.push(Segment::Ident(name.clone()))
                }
                Token::LineComment | Token::BlockComment => {
                    segments.push(Segment::Comment(slice.to_string()))
                }
                tok if tok.is_literal() => segments.push(Segment::Literal(slice.to_string())),
                _ => push_text(&mut segments, slice),
            }
            cursor = s.end;
        }
        if cursor < span.end {
            push_text(&mut segments, &self.text[cursor..span.end]);
        }
        Verbatim::new(span, segments)
    }

    fn comments(&self) -> Vec<Comment> {
        self.tokens
            .iter()
            .filter(|(tok, _)| tok.is_comment())
            .map(|(_, span)| {
                let text = self.text[span.clone()].to_string();
                Comment {
                    kind: CommentKind::classify(&text),
                    text,
                    span: span.clone(),
                }
            })
            .collect()
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if let Some(Segment::Text(last)) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(Segment::Text(text.to_string()));
    }
}

/// Parse Rust source text into a compilation unit with comments attached
pub fn parse(input: &str) -> Result<CompilationUnit, Vec<ParseError>> {
    let tokens = lexer::tokenize(input).map_err(|spans| {
        spans
            .into_iter()
            .map(|span| ParseError::Lex { span })
            .collect::<Vec<_>>()
    })?;
    let ctx = SourceContext {
        text: input,
        tokens,
    };
    let len = input.len();

    let token_iter = ctx
        .tokens
        .iter()
        .filter(|(tok, _)| !tok.is_comment())
        .map(|(tok, span)| (tok.clone(), span.clone().into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    let mut unit = unit_parser(&ctx)
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect::<Vec<_>>())?;

    comments::attach(&mut unit, input, ctx.comments());
    Ok(unit)
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

/// Any balanced token tree
fn token_tree<'a, I>() -> impl Parser<'a, I, (), Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|tt| {
        choice((
            tt.clone()
                .repeated()
                .delimited_by(just(Token::BraceOpen), just(Token::BraceClose)),
            tt.clone()
                .repeated()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
            tt.repeated()
                .delimited_by(just(Token::BracketOpen), just(Token::BracketClose)),
            any().filter(|tok: &Token| !tok.is_delimiter()).ignored(),
        ))
    })
}

/// Balanced tokens between one pair of delimiters
fn group<'a, I>(open: Token, close: Token) -> impl Parser<'a, I, (), Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    token_tree().repeated().delimited_by(just(open), just(close))
}

/// A single non-delimiter token for which `stop` is false
fn atom_except<'a, I>(stop: fn(&Token) -> bool) -> impl Parser<'a, I, (), Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    any()
        .filter(move |tok: &Token| !tok.is_delimiter() && !stop(tok))
        .ignored()
}

/// Token trees up to (not including) a top-level token matching `stop`
fn tokens_until<'a, I>(stop: fn(&Token) -> bool) -> impl Parser<'a, I, (), Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    choice((
        group(Token::BraceOpen, Token::BraceClose),
        group(Token::ParenOpen, Token::ParenClose),
        group(Token::BracketOpen, Token::BracketClose),
        atom_except(stop),
    ))
    .repeated()
    .at_least(1)
}

fn identifier<'a, I>() -> impl Parser<'a, I, Identifier, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    select! {
        Token::Ident(s) => Identifier::new(s),
        Token::RawIdent(s) => Identifier::new(s),
    }
}

/// Identifier or one of the path keywords `self`, `Self`, `super`, `crate`
fn path_segment_name<'a, I>() -> impl Parser<'a, I, Identifier, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    choice((
        identifier(),
        just(Token::SelfValue).to(Identifier::new("self")),
        just(Token::SelfType).to(Identifier::new("Self")),
        just(Token::Super).to(Identifier::new("super")),
        just(Token::Crate).to(Identifier::new("crate")),
    ))
}

fn lifetime<'a, I>() -> impl Parser<'a, I, String, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    select! {
        Token::Lifetime(l) => l,
    }
}

fn type_parser<'a, I>(ctx: &'a SourceContext<'a>) -> impl Parser<'a, I, TypeExpr, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let verbatim = move |span: Span| ctx.verbatim(span);

    recursive(move |ty| {
        let const_arg = choice((
            group(Token::BraceOpen, Token::BraceClose),
            select! { Token::Number(_) => () },
        ))
        .map_with(move |_, e| verbatim(span_range(&e.span())));

        let generic_arg = choice((
            lifetime().map(GenericArg::Lifetime),
            identifier()
                .then_ignore(just(Token::Eq))
                .then(ty.clone())
                .map(|(name, ty)| GenericArg::Binding { name, ty }),
            ty.clone().map(GenericArg::Type),
            const_arg.map(GenericArg::Const),
        ));

        let angle_args = generic_arg
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::Lt), just(Token::Gt))
            .map(PathArgs::AngleBracketed);

        // Fn(A, B) -> C
        let paren_args = ty
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose))
            .then(just(Token::Arrow).ignore_then(ty.clone()).or_not())
            .map(|(inputs, output)| PathArgs::Parenthesized {
                inputs,
                output: output.map(Box::new),
            });

        let segment = path_segment_name()
            .then(choice((angle_args, paren_args)).or_not())
            .map(|(ident, args)| PathSegment {
                ident,
                args: args.unwrap_or(PathArgs::None),
            });

        let path = just(Token::PathSep)
            .or_not()
            .then(
                segment
                    .separated_by(just(Token::PathSep))
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .map(|(global, segments)| TypePath {
                global: global.is_some(),
                segments,
            });

        let mutability = just(Token::Mut).or_not().map(|m| m.is_some());

        let reference = just(Token::And)
            .ignore_then(lifetime().or_not())
            .then(mutability.clone())
            .then(ty.clone())
            .map(|((lifetime, mutable), inner)| TypeExpr::Reference {
                lifetime,
                mutable,
                inner: Box::new(inner),
            });

        // `&&T` arrives as a single token
        let double_reference = just(Token::AndAnd)
            .ignore_then(lifetime().or_not())
            .then(mutability)
            .then(ty.clone())
            .map(|((lifetime, mutable), inner)| TypeExpr::Reference {
                lifetime: None,
                mutable: false,
                inner: Box::new(TypeExpr::Reference {
                    lifetime,
                    mutable,
                    inner: Box::new(inner),
                }),
            });

        let pointer = just(Token::Star)
            .ignore_then(choice((
                just(Token::Const).to(false),
                just(Token::Mut).to(true),
            )))
            .then(ty.clone())
            .map(|(mutable, inner)| TypeExpr::Pointer {
                mutable,
                inner: Box::new(inner),
            });

        let array_len =
            tokens_until(|_| false).map_with(move |_, e| verbatim(span_range(&e.span())));

        let slice_or_array = ty
            .clone()
            .then(just(Token::Semicolon).ignore_then(array_len).or_not())
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
            .map(|(element, len)| match len {
                Some(len) => TypeExpr::Array {
                    element: Box::new(element),
                    len,
                },
                None => TypeExpr::Slice(Box::new(element)),
            });

        // `()`, `(T)`, `(T,)`, `(A, B)`
        let tuple = ty
            .clone()
            .then_ignore(just(Token::Comma))
            .repeated()
            .collect::<Vec<_>>()
            .then(ty.clone().or_not())
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose))
            .map(|(mut elements, last)| match last {
                Some(last) if elements.is_empty() => TypeExpr::Paren(Box::new(last)),
                Some(last) => {
                    elements.push(last);
                    TypeExpr::Tuple(elements)
                }
                None => TypeExpr::Tuple(elements),
            });

        let bounds = ty
            .clone()
            .separated_by(just(Token::Plus))
            .at_least(1)
            .collect::<Vec<_>>();

        let fn_pointer = just(Token::Fn)
            .ignore_then(
                ty.clone()
                    .separated_by(just(Token::Comma))
                    .allow_trailing()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
            )
            .then(just(Token::Arrow).ignore_then(ty.clone()).or_not())
            .map(|(params, ret)| TypeExpr::FnPointer {
                params,
                ret: ret.map(Box::new),
            });

        let maybe = just(Token::Question)
            .ignore_then(path.clone())
            .map(|p| TypeExpr::Maybe(Box::new(TypeExpr::Path(p))));

        choice((
            reference,
            double_reference,
            pointer,
            slice_or_array,
            tuple,
            just(Token::Dyn)
                .ignore_then(bounds.clone())
                .map(TypeExpr::DynTrait),
            just(Token::Impl)
                .ignore_then(bounds)
                .map(TypeExpr::ImplTrait),
            fn_pointer,
            maybe,
            just(Token::Bang).to(TypeExpr::Never),
            lifetime().map(TypeExpr::Lifetime),
            select! { Token::Ident(s) if s == "_" => TypeExpr::Infer },
            path.map(TypeExpr::Path),
        ))
        .boxed()
    })
}

fn unit_parser<'a, I>(
    ctx: &'a SourceContext<'a>,
) -> impl Parser<'a, I, CompilationUnit, Extra<'a>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let verbatim = move |span: Span| ctx.verbatim(span);
    let ty = type_parser(ctx);

    // Attributes keep their content without the brackets
    let attr_content = token_tree()
        .repeated()
        .map_with(move |_, e| verbatim(span_range(&e.span())))
        .delimited_by(just(Token::BracketOpen), just(Token::BracketClose));
    let outer_attrs = just(Token::Pound)
        .ignore_then(attr_content.clone())
        .map(|content| Attribute {
            inner: false,
            content,
        })
        .repeated()
        .collect::<Vec<_>>();
    let inner_attrs = just(Token::Pound)
        .ignore_then(just(Token::Bang))
        .ignore_then(attr_content)
        .map(|content| Attribute {
            inner: true,
            content,
        })
        .repeated()
        .collect::<Vec<_>>();

    let restriction = choice((
        just(Token::Crate).to("crate".to_string()),
        just(Token::SelfValue).to("self".to_string()),
        just(Token::Super).to("super".to_string()),
        just(Token::In)
            .ignore_then(
                path_segment_name()
                    .separated_by(just(Token::PathSep))
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .map(|segments| {
                let path: Vec<&str> = segments.iter().map(Identifier::as_str).collect();
                format!("in {}", path.join("::"))
            }),
    ))
    .delimited_by(just(Token::ParenOpen), just(Token::ParenClose));

    let visibility = just(Token::Pub)
        .ignore_then(restriction.or_not())
        .map(|restricted| match restricted {
            Some(r) => Visibility::Restricted(r),
            None => Visibility::Public,
        })
        .or_not()
        .map(Option::unwrap_or_default);

    // `<...>` with nested angle brackets balanced
    let generics = recursive(|angle| {
        just(Token::Lt)
            .ignore_then(
                choice((
                    angle,
                    group(Token::ParenOpen, Token::ParenClose),
                    group(Token::BracketOpen, Token::BracketClose),
                    group(Token::BraceOpen, Token::BraceClose),
                    atom_except(|tok| matches!(tok, Token::Lt | Token::Gt)),
                ))
                .repeated(),
            )
            .then_ignore(just(Token::Gt))
    })
    .map_with(move |_, e| verbatim(span_range(&e.span())));

    // Predicates run until the body or the terminating semicolon
    let where_clause = just(Token::Where).ignore_then(
        choice((
            group(Token::ParenOpen, Token::ParenClose),
            group(Token::BracketOpen, Token::BracketClose),
            atom_except(|tok| *tok == Token::Semicolon),
        ))
        .repeated()
        .at_least(1)
        .map_with(move |_, e| verbatim(span_range(&e.span()))),
    );

    let bounds = ty
        .clone()
        .separated_by(just(Token::Plus))
        .at_least(1)
        .collect::<Vec<_>>();

    let named_fields = outer_attrs
        .clone()
        .then(visibility.clone())
        .then(identifier())
        .then_ignore(just(Token::Colon))
        .then(ty.clone())
        .map_with(|(((attrs, vis), name), ty), e| {
            Spanned::new(
                Field {
                    attrs,
                    vis,
                    name: Some(name),
                    ty,
                    comments: Comments::default(),
                },
                span_range(&e.span()),
            )
        })
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::BraceOpen), just(Token::BraceClose));

    let tuple_fields = outer_attrs
        .clone()
        .then(visibility.clone())
        .then(ty.clone())
        .map_with(|((attrs, vis), ty), e| {
            Spanned::new(
                Field {
                    attrs,
                    vis,
                    name: None,
                    ty,
                    comments: Comments::default(),
                },
                span_range(&e.span()),
            )
        })
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::ParenOpen), just(Token::ParenClose));

    let struct_decl = just(Token::Struct)
        .ignore_then(identifier())
        .then(generics.clone().or_not())
        .then(choice((
            where_clause
                .clone()
                .or_not()
                .then(named_fields.clone())
                .map(|(where_clause, fields)| (StructShape::Named(fields), where_clause)),
            tuple_fields
                .clone()
                .then(where_clause.clone().or_not())
                .then_ignore(just(Token::Semicolon))
                .map(|(fields, where_clause)| (StructShape::Tuple(fields), where_clause)),
            where_clause
                .clone()
                .or_not()
                .then_ignore(just(Token::Semicolon))
                .map(|where_clause| (StructShape::Unit, where_clause)),
        )))
        .map(|((name, generics), (shape, where_clause))| {
            ItemKind::Struct(StructDecl {
                name,
                generics,
                shape,
                where_clause,
            })
        });

    let discriminant = tokens_until(|tok| *tok == Token::Comma)
        .map_with(move |_, e| verbatim(span_range(&e.span())));

    let variant = outer_attrs
        .clone()
        .then(identifier())
        .then(
            choice((
                named_fields.map(StructShape::Named),
                tuple_fields.map(StructShape::Tuple),
            ))
            .or_not(),
        )
        .then(just(Token::Eq).ignore_then(discriminant).or_not())
        .map_with(|(((attrs, name), shape), discriminant), e| {
            Spanned::new(
                Variant {
                    attrs,
                    name,
                    shape: shape.unwrap_or(StructShape::Unit),
                    discriminant,
                    comments: Comments::default(),
                },
                span_range(&e.span()),
            )
        });

    let enum_decl = just(Token::Enum)
        .ignore_then(identifier())
        .then(generics.clone().or_not())
        .then(where_clause.clone().or_not())
        .then(
            variant
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::BraceOpen), just(Token::BraceClose)),
        )
        .map(|(((name, generics), where_clause), variants)| {
            ItemKind::Enum(EnumDecl {
                name,
                generics,
                where_clause,
                variants,
            })
        });

    let type_alias = just(Token::Type)
        .ignore_then(identifier())
        .then(generics.clone().or_not())
        .then(just(Token::Colon).ignore_then(bounds.clone()).or_not())
        .then(just(Token::Eq).ignore_then(ty.clone()).or_not())
        .then_ignore(just(Token::Semicolon))
        .map(|(((name, generics), bounds), ty)| {
            ItemKind::TypeAlias(TypeAlias {
                name,
                generics,
                bounds: bounds.unwrap_or_default(),
                ty,
            })
        });

    let self_param = choice((
        just(Token::And)
            .ignore_then(lifetime().or_not())
            .then(just(Token::Mut).or_not())
            .then_ignore(just(Token::SelfValue))
            .map(|(lifetime, mutable)| SelfParam {
                by_ref: true,
                lifetime,
                mutable: mutable.is_some(),
                ty: None,
            }),
        just(Token::Mut)
            .or_not()
            .then_ignore(just(Token::SelfValue))
            .then(just(Token::Colon).ignore_then(ty.clone()).or_not())
            .map(|(mutable, ty)| SelfParam {
                by_ref: false,
                lifetime: None,
                mutable: mutable.is_some(),
                ty,
            }),
    ))
    .map(Param::SelfParam);

    let pattern = just(Token::And)
        .or_not()
        .then(choice((
            group(Token::ParenOpen, Token::ParenClose),
            group(Token::BracketOpen, Token::BracketClose),
            just(Token::Ref)
                .or_not()
                .then(just(Token::Mut).or_not())
                .then(identifier())
                .then(group(Token::BraceOpen, Token::BraceClose).or_not())
                .ignored(),
        )))
        .map_with(move |_, e| verbatim(span_range(&e.span())));

    let typed_param = pattern
        .then_ignore(just(Token::Colon))
        .then(ty.clone())
        .map(|(pattern, ty)| Param::Typed(TypedParam { pattern, ty }));

    let params = choice((self_param, typed_param))
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::ParenOpen), just(Token::ParenClose));

    let block = group(Token::BraceOpen, Token::BraceClose)
        .map_with(move |_, e| verbatim(span_range(&e.span())));

    let qualifiers = just(Token::Const)
        .or_not()
        .then(just(Token::Async).or_not())
        .then(just(Token::Unsafe).or_not())
        .then(
            just(Token::Extern)
                .ignore_then(select! { Token::Str(s) => s }.or_not())
                .or_not(),
        )
        .map(|(((constness, asyncness), unsafety), abi)| FnQualifiers {
            constness: constness.is_some(),
            asyncness: asyncness.is_some(),
            unsafety: unsafety.is_some(),
            abi,
        });

    let fn_decl = qualifiers
        .then_ignore(just(Token::Fn))
        .then(identifier())
        .then(generics.clone().or_not())
        .then(params)
        .then(just(Token::Arrow).ignore_then(ty.clone()).or_not())
        .then(where_clause.clone().or_not())
        .then(choice((block.map(Some), just(Token::Semicolon).to(None))))
        .map(
            |((((((qualifiers, name), generics), params), ret), where_clause), body)| {
                ItemKind::Fn(FnDecl {
                    qualifiers,
                    name,
                    generics,
                    params,
                    ret,
                    where_clause,
                    body,
                })
            },
        );

    let initializer = tokens_until(|tok| *tok == Token::Semicolon)
        .map_with(move |_, e| verbatim(span_range(&e.span())));

    let const_decl = just(Token::Const)
        .ignore_then(identifier())
        .then_ignore(just(Token::Colon))
        .then(ty.clone())
        .then(just(Token::Eq).ignore_then(initializer.clone()).or_not())
        .then_ignore(just(Token::Semicolon))
        .map(|((name, ty), value)| {
            ItemKind::Const(ConstDecl {
                is_static: false,
                mutable: false,
                name,
                ty,
                value,
            })
        });

    let static_decl = just(Token::Static)
        .ignore_then(just(Token::Mut).or_not())
        .then(identifier())
        .then_ignore(just(Token::Colon))
        .then(ty.clone())
        .then_ignore(just(Token::Eq))
        .then(initializer)
        .then_ignore(just(Token::Semicolon))
        .map(|(((mutable, name), ty), value)| {
            ItemKind::Const(ConstDecl {
                is_static: true,
                mutable: mutable.is_some(),
                name,
                ty,
                value: Some(value),
            })
        });

    let use_tree = recursive(|tree| {
        choice((
            just(Token::Star).to(UseTree::Glob),
            tree.clone()
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::BraceOpen), just(Token::BraceClose))
                .map(UseTree::Group),
            path_segment_name()
                .then_ignore(just(Token::PathSep))
                .then(tree)
                .map(|(segment, rest)| UseTree::Path {
                    segment,
                    rest: Box::new(rest),
                }),
            path_segment_name()
                .then(just(Token::As).ignore_then(identifier()).or_not())
                .map(|(name, alias)| match alias {
                    Some(alias) => UseTree::Rename { name, alias },
                    None => UseTree::Name(name),
                }),
        ))
    });

    let use_decl = just(Token::Use)
        .ignore_then(just(Token::PathSep).or_not())
        .then(use_tree)
        .then_ignore(just(Token::Semicolon))
        .map(|(global, tree)| {
            ItemKind::Use(UseDecl {
                global: global.is_some(),
                tree,
            })
        });

    let extern_crate = just(Token::Extern)
        .then(just(Token::Crate))
        .then(atom_except(|tok| *tok == Token::Semicolon).repeated())
        .then(just(Token::Semicolon))
        .map_with(move |_, e| ItemKind::Verbatim(verbatim(span_range(&e.span()))));

    // name!(...); name! { ... } macro_rules! name { ... }
    let macro_item = just(Token::PathSep)
        .or_not()
        .then(
            path_segment_name()
                .separated_by(just(Token::PathSep))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then(just(Token::Bang))
        .then(identifier().or_not())
        .then(choice((
            group(Token::BraceOpen, Token::BraceClose)
                .then(just(Token::Semicolon).or_not())
                .ignored(),
            group(Token::ParenOpen, Token::ParenClose).then_ignore(just(Token::Semicolon)),
            group(Token::BracketOpen, Token::BracketClose).then_ignore(just(Token::Semicolon)),
        )))
        .map_with(move |_, e| ItemKind::Verbatim(verbatim(span_range(&e.span()))));

    // extern "C" { ... } and unsafe extern { ... }
    let foreign_block = just(Token::Unsafe)
        .or_not()
        .then(just(Token::Extern))
        .then(select! { Token::Str(_) => () }.or_not())
        .then(group(Token::BraceOpen, Token::BraceClose))
        .map_with(move |_, e| ItemKind::Verbatim(verbatim(span_range(&e.span()))));

    // `union` is a contextual keyword and lexes as an identifier
    let union_decl = select! { Token::Ident(s) if s == "union" => () }
        .then(identifier())
        .then(generics.clone().or_not())
        .then(where_clause.clone().or_not())
        .then(group(Token::BraceOpen, Token::BraceClose))
        .map_with(move |_, e| ItemKind::Verbatim(verbatim(span_range(&e.span()))));

    let item = recursive(|item| {
        let item_block = item
            .clone()
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BraceOpen), just(Token::BraceClose));

        let trait_decl = just(Token::Unsafe)
            .or_not()
            .then_ignore(just(Token::Trait))
            .then(identifier())
            .then(generics.clone().or_not())
            .then(just(Token::Colon).ignore_then(bounds.clone()).or_not())
            .then(where_clause.clone().or_not())
            .then(item_block.clone())
            .map(
                |(((((unsafety, name), generics), supertraits), where_clause), items)| {
                    ItemKind::Trait(TraitDecl {
                        unsafety: unsafety.is_some(),
                        name,
                        generics,
                        supertraits: supertraits.unwrap_or_default(),
                        where_clause,
                        items,
                    })
                },
            );

        let impl_block = just(Token::Unsafe)
            .or_not()
            .then_ignore(just(Token::Impl))
            .then(generics.clone().or_not())
            .then(just(Token::Bang).or_not())
            .then(ty.clone())
            .then(just(Token::For).ignore_then(ty.clone()).or_not())
            .then(where_clause.clone().or_not())
            .then(item_block)
            .map(
                |((((((unsafety, generics), negative), first), second), where_clause), items)| {
                    let (trait_ref, self_ty) = match second {
                        Some(self_ty) => (Some(first), self_ty),
                        None => (None, first),
                    };
                    ItemKind::Impl(ImplBlock {
                        unsafety: unsafety.is_some(),
                        generics,
                        negative: negative.is_some(),
                        trait_ref,
                        self_ty,
                        where_clause,
                        items,
                    })
                },
            );

        let mod_decl = just(Token::Mod)
            .ignore_then(identifier())
            .then(choice((
                just(Token::Semicolon).to(None),
                inner_attrs
                    .clone()
                    .then(item.clone().repeated().collect::<Vec<_>>())
                    .delimited_by(just(Token::BraceOpen), just(Token::BraceClose))
                    .map(|(attrs, items)| {
                        Some(ModBody {
                            header: ModuleHeader {
                                docs: Vec::new(),
                                attrs,
                            },
                            items,
                        })
                    }),
            )))
            .map(|(name, body)| ItemKind::Mod(ModDecl { name, body }));

        // Order matters: `const fn` before `const`, `extern "C" fn` before
        // foreign blocks and `extern crate`, macros last since they start
        // with a bare path
        let kind = choice((
            use_decl.clone(),
            struct_decl.clone(),
            enum_decl.clone(),
            type_alias.clone(),
            trait_decl,
            impl_block,
            fn_decl.clone(),
            const_decl.clone(),
            static_decl.clone(),
            mod_decl,
            foreign_block.clone(),
            extern_crate.clone(),
            union_decl.clone(),
            macro_item.clone(),
        ));

        outer_attrs
            .clone()
            .then(visibility.clone())
            .then(kind)
            .map_with(|((attrs, vis), kind), e| {
                Spanned::new(
                    Item {
                        attrs,
                        vis,
                        kind,
                        comments: Comments::default(),
                    },
                    span_range(&e.span()),
                )
            })
            .boxed()
    });

    inner_attrs
        .then(item.repeated().collect::<Vec<_>>())
        .then_ignore(end())
        .map(|(attrs, items)| CompilationUnit {
            name: None,
            header: ModuleHeader {
                docs: Vec::new(),
                attrs,
            },
            items,
            trailing: Vec::new(),
        })
}
