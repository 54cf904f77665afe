//! Attach comments to the items, fields and variants they document
//!
//! Comments are collected by the lexer and never reach the grammar. After a
//! successful parse they are distributed over the tree by source position:
//! a comment before a node is leading, one on the same line as a node's end is
//! trailing, and one inside a node that no child claims is dangling. Comments
//! inside opaque regions (bodies, initializers, attributes) are already part
//! of those regions and are dropped from the queue.

use std::collections::VecDeque;

use crate::syntax::ast::*;

struct CommentQueue {
    pending: VecDeque<Comment>,
    line_starts: Vec<usize>,
}

impl CommentQueue {
    fn new(source: &str, comments: Vec<Comment>) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            pending: comments.into(),
            line_starts,
        }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset) - 1
    }

    /// Every queued comment starting before `offset`
    fn take_before(&mut self, offset: usize) -> Vec<Comment> {
        let mut out = Vec::new();
        while self
            .pending
            .front()
            .is_some_and(|comment| comment.span.start < offset)
        {
            out.extend(self.pending.pop_front());
        }
        out
    }

    /// The next comment, if it starts on the line where a node ends at `end`
    fn take_trailing(&mut self, end: usize) -> Option<Comment> {
        let front = self.pending.front()?;
        if end > 0 && self.line_of(front.span.start) == self.line_of(end - 1) {
            self.pending.pop_front()
        } else {
            None
        }
    }

    /// Like `take_trailing`, but only for a comment starting before `limit`
    fn take_trailing_within(&mut self, end: usize, limit: usize) -> Option<Comment> {
        if self.pending.front()?.span.start < limit {
            self.take_trailing(end)
        } else {
            None
        }
    }

    fn drop_within(&mut self, span: &Span) {
        self.pending
            .retain(|comment| comment.span.start < span.start || comment.span.end > span.end);
    }

    fn drop_verbatim(&mut self, verbatim: &Option<Verbatim>) {
        if let Some(v) = verbatim {
            self.drop_within(&v.span);
        }
    }

    fn drop_attrs(&mut self, attrs: &[Attribute]) {
        for attr in attrs {
            self.drop_within(&attr.content.span);
        }
    }
}

pub(crate) fn attach(unit: &mut CompilationUnit, source: &str, comments: Vec<Comment>) {
    let mut queue = CommentQueue::new(source, comments);
    queue.drop_attrs(&unit.header.attrs);

    let first = unit.items.first().map_or(source.len(), |item| item.span.start);
    let (docs, rest): (Vec<_>, Vec<_>) = queue
        .take_before(first)
        .into_iter()
        .partition(|c| c.kind == CommentKind::InnerDoc);
    unit.header.docs = docs;
    match unit.items.first_mut() {
        Some(item) => item.node.comments.leading = rest,
        None => unit.trailing = rest,
    }

    attach_items(&mut unit.items, &mut queue);
    unit.trailing.extend(queue.pending.drain(..));
}

fn attach_items(items: &mut [Spanned<Item>], queue: &mut CommentQueue) {
    for item in items {
        let leading = queue.take_before(item.span.start);
        item.node.comments.leading.extend(leading);
        attach_item(&mut item.node, item.span.end, queue);
        item.node.comments.dangling = queue.take_before(item.span.end);
        item.node.comments.trailing = queue.take_trailing(item.span.end);
    }
}

fn attach_item(item: &mut Item, end: usize, queue: &mut CommentQueue) {
    queue.drop_attrs(&item.attrs);
    match &mut item.kind {
        ItemKind::Use(_) => {}
        ItemKind::Struct(decl) => {
            queue.drop_verbatim(&decl.generics);
            queue.drop_verbatim(&decl.where_clause);
            attach_fields(decl.shape.fields_mut(), end, queue);
        }
        ItemKind::Enum(decl) => {
            queue.drop_verbatim(&decl.generics);
            queue.drop_verbatim(&decl.where_clause);
            for variant in &mut decl.variants {
                variant.node.comments.leading = queue.take_before(variant.span.start);
                queue.drop_attrs(&variant.node.attrs);
                queue.drop_verbatim(&variant.node.discriminant);
                attach_fields(variant.node.shape.fields_mut(), variant.span.end, queue);
                variant.node.comments.dangling = queue.take_before(variant.span.end);
                variant.node.comments.trailing = queue.take_trailing(variant.span.end);
            }
        }
        ItemKind::TypeAlias(decl) => queue.drop_verbatim(&decl.generics),
        ItemKind::Trait(decl) => {
            queue.drop_verbatim(&decl.generics);
            queue.drop_verbatim(&decl.where_clause);
            attach_items(&mut decl.items, queue);
        }
        ItemKind::Impl(block) => {
            queue.drop_verbatim(&block.generics);
            queue.drop_verbatim(&block.where_clause);
            attach_items(&mut block.items, queue);
        }
        ItemKind::Fn(decl) => {
            queue.drop_verbatim(&decl.generics);
            queue.drop_verbatim(&decl.where_clause);
            queue.drop_verbatim(&decl.body);
            for param in &decl.params {
                if let Param::Typed(typed) = param {
                    queue.drop_within(&typed.pattern.span);
                }
            }
        }
        ItemKind::Const(decl) => queue.drop_verbatim(&decl.value),
        ItemKind::Mod(decl) => {
            if let Some(body) = &mut decl.body {
                queue.drop_attrs(&body.header.attrs);
                if let Some(first) = body.items.first() {
                    let (docs, rest): (Vec<_>, Vec<_>) = queue
                        .take_before(first.span.start)
                        .into_iter()
                        .partition(|c| c.kind == CommentKind::InnerDoc);
                    body.header.docs = docs;
                    if let Some(first) = body.items.first_mut() {
                        first.node.comments.leading = rest;
                    }
                }
                attach_items(&mut body.items, queue);
            }
        }
        ItemKind::Verbatim(v) => queue.drop_within(&v.span),
    }
}

/// Fields only claim comments that start before `end`, the end of the
/// enclosing item or variant
fn attach_fields(fields: &mut [Spanned<Field>], end: usize, queue: &mut CommentQueue) {
    for field in fields {
        field.node.comments.leading = queue.take_before(field.span.start);
        queue.drop_attrs(&field.node.attrs);
        field.node.comments.dangling = queue.take_before(field.span.end);
        field.node.comments.trailing = queue.take_trailing_within(field.span.end, end);
    }
}

#[cfg(test)]
mod tests {
    use crate::syntax::ast::*;
    use crate::syntax::parse;

    fn texts(comments: &[Comment]) -> Vec<&str> {
        comments.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_inner_docs_go_to_header() {
        let unit = parse("//! Module docs\n\n// License line\nstruct A;\n").expect("Should parse");
        assert_eq!(texts(&unit.header.docs), vec!["//! Module docs"]);
        assert_eq!(
            texts(&unit.items[0].node.comments.leading),
            vec!["// License line"]
        );
    }

    #[test]
    fn test_doc_comment_leads_its_item() {
        let unit = parse("struct A;\n\n/// Second\nstruct B;").expect("Should parse");
        assert!(unit.items[0].node.comments.is_empty());
        assert_eq!(texts(&unit.items[1].node.comments.leading), vec!["/// Second"]);
    }

    #[test]
    fn test_trailing_comment_on_same_line() {
        let unit = parse("const A: u8 = 1; // one\n// two\nconst B: u8 = 2;").expect("Should parse");
        assert_eq!(
            unit.items[0].node.comments.trailing.as_ref().map(|c| c.text.as_str()),
            Some("// one")
        );
        assert_eq!(texts(&unit.items[1].node.comments.leading), vec!["// two"]);
    }

    #[test]
    fn test_field_comments() {
        let unit = parse("struct A {\n    /// Count\n    count: u32, // items\n    // nothing after\n}")
            .expect("Should parse");
        let ItemKind::Struct(decl) = &unit.items[0].node.kind else {
            panic!("Expected struct");
        };
        let field = &decl.shape.fields()[0].node;
        assert_eq!(texts(&field.comments.leading), vec!["/// Count"]);
        assert_eq!(
            field.comments.trailing.as_ref().map(|c| c.text.as_str()),
            Some("// items")
        );
        assert_eq!(
            texts(&unit.items[0].node.comments.dangling),
            vec!["// nothing after"]
        );
    }

    #[test]
    fn test_tuple_field_leaves_item_trailing_comment() {
        let unit = parse("pub struct Id(u32); // identifier\n").expect("Should parse");
        let ItemKind::Struct(decl) = &unit.items[0].node.kind else {
            panic!("Expected struct");
        };
        assert!(decl.shape.fields()[0].node.comments.is_empty());
        assert_eq!(
            unit.items[0].node.comments.trailing.as_ref().map(|c| c.text.as_str()),
            Some("// identifier")
        );
    }

    #[test]
    fn test_tuple_variant_leaves_variant_trailing_comment() {
        let unit = parse("enum Shape {\n    Dot(u8), // small\n}").expect("Should parse");
        let ItemKind::Enum(decl) = &unit.items[0].node.kind else {
            panic!("Expected enum");
        };
        let variant = &decl.variants[0].node;
        assert!(variant.shape.fields()[0].node.comments.is_empty());
        assert_eq!(
            variant.comments.trailing.as_ref().map(|c| c.text.as_str()),
            Some("// small")
        );
    }

    #[test]
    fn test_body_comments_stay_in_body() {
        let unit = parse("fn f() {\n    // inside\n    g();\n}\n// after").expect("Should parse");
        let item = &unit.items[0].node;
        assert!(item.comments.is_empty());
        let ItemKind::Fn(decl) = &item.kind else {
            panic!("Expected fn");
        };
        assert!(decl
            .body
            .as_ref()
            .is_some_and(|b| b.source().contains("// inside")));
        assert_eq!(texts(&unit.trailing), vec!["// after"]);
    }

    #[test]
    fn test_impl_method_comments() {
        let unit = parse("impl A {\n    /// Make one\n    fn new() -> Self { A }\n}").expect("Should parse");
        let ItemKind::Impl(block) = &unit.items[0].node.kind else {
            panic!("Expected impl");
        };
        assert_eq!(
            texts(&block.items[0].node.comments.leading),
            vec!["/// Make one"]
        );
    }

    #[test]
    fn test_comment_only_source() {
        let unit = parse("// nothing here\n").expect("Should parse");
        assert!(unit.items.is_empty());
        assert_eq!(texts(&unit.trailing), vec!["// nothing here"]);
    }
}
