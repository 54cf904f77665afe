//! Render a syntax tree back to Rust source

use std::io::Write;

use thiserror::Error;

use crate::syntax::ast::*;

#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("Tree cannot be rendered: {reason}")]
    InvalidTree { reason: String },

    #[error("Failed to write output: {0}")]
    Write(#[from] std::io::Error),
}

/// Render a compilation unit to source text
pub fn to_source(unit: &CompilationUnit) -> Result<String, SerializeError> {
    let mut printer = Printer::new(true);
    printer.unit(unit);
    printer.finish()
}

/// Render a compilation unit into `sink`. Nothing is written when the tree
/// cannot be rendered.
pub fn serialize<W: Write + ?Sized>(
    unit: &CompilationUnit,
    sink: &mut W,
) -> Result<(), SerializeError> {
    let text = to_source(unit)?;
    sink.write_all(text.as_bytes())?;
    sink.flush()?;
    Ok(())
}

/// Single-line rendering of a type
pub fn render_type(ty: &TypeExpr) -> String {
    Printer::new(false).ty(ty)
}

/// Rendering of an item with every comment left out, for comparing items
/// parsed from different sources
pub(crate) fn fingerprint(item: &Item) -> String {
    let mut printer = Printer::new(false);
    printer.item(item);
    printer.out
}

#[derive(Clone, Copy)]
enum Context {
    /// Top level or inline module
    Module,
    /// Trait or impl body
    Block,
}

struct Printer {
    out: String,
    indent: usize,
    comments: bool,
    invalid: Vec<String>,
}

impl Printer {
    fn new(comments: bool) -> Self {
        Self {
            out: String::new(),
            indent: 0,
            comments,
            invalid: Vec::new(),
        }
    }

    fn finish(self) -> Result<String, SerializeError> {
        if self.invalid.is_empty() {
            Ok(self.out)
        } else {
            Err(SerializeError::InvalidTree {
                reason: self.invalid.join("; "),
            })
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn comment_lines(&mut self, comments: &[Comment]) {
        if !self.comments {
            return;
        }
        for comment in comments {
            self.line(&comment.text);
        }
    }

    fn trailing(&mut self, comment: &Option<Comment>) {
        let Some(comment) = comment.as_ref().filter(|_| self.comments) else {
            return;
        };
        if self.out.ends_with('\n') {
            self.out.pop();
        }
        self.out.push(' ');
        self.out.push_str(&comment.text);
        self.out.push('\n');
    }

    fn open(&mut self, head: &str) {
        self.line(&format!("{} {{", head));
        self.indent += 1;
    }

    fn close(&mut self, dangling: &[Comment]) {
        self.comment_lines(dangling);
        self.indent -= 1;
        self.line("}");
    }

    fn name(&mut self, ident: &Identifier, what: &str) -> String {
        if !ident.is_well_formed() {
            self.invalid
                .push(format!("{} '{}' is not a valid identifier", what, ident));
        }
        ident.0.clone()
    }

    /// Names that may also be a lone underscore (`const _`, `use x as _`)
    fn name_or_underscore(&mut self, ident: &Identifier, what: &str) -> String {
        if ident.as_str() == "_" {
            return ident.0.clone();
        }
        self.name(ident, what)
    }

    fn attrs(&mut self, attrs: &[Attribute]) {
        for attr in attrs {
            let bang = if attr.inner { "!" } else { "" };
            self.line(&format!("#{}[{}]", bang, attr.content.flatten()));
        }
    }

    fn header(&mut self, header: &ModuleHeader) {
        self.comment_lines(&header.docs);
        self.attrs(&header.attrs);
    }

    fn has_header(&self, header: &ModuleHeader) -> bool {
        !header.attrs.is_empty() || (self.comments && !header.docs.is_empty())
    }

    fn unit(&mut self, unit: &CompilationUnit) {
        self.header(&unit.header);
        let has_header = self.has_header(&unit.header);
        if has_header && !unit.items.is_empty() {
            self.blank();
        }
        self.items(&unit.items, Context::Module);
        if self.comments && !unit.trailing.is_empty() {
            if has_header || !unit.items.is_empty() {
                self.blank();
            }
            self.comment_lines(&unit.trailing);
        }
    }

    fn items(&mut self, items: &[Spanned<Item>], context: Context) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 && needs_blank(&items[i - 1].node, &item.node, context) {
                self.blank();
            }
            self.item(&item.node);
        }
    }

    fn item(&mut self, item: &Item) {
        self.comment_lines(&item.comments.leading);
        let block = item.kind.has_block();
        if !block {
            self.comment_lines(&item.comments.dangling);
        }
        self.attrs(&item.attrs);
        let vis = visibility(&item.vis);
        let dangling = &item.comments.dangling;

        match &item.kind {
            ItemKind::Use(decl) => {
                let global = if decl.global { "::" } else { "" };
                let tree = self.use_tree(&decl.tree);
                self.line(&format!("{}use {}{};", vis, global, tree));
            }
            ItemKind::Struct(decl) => self.struct_decl(&vis, decl, dangling),
            ItemKind::Enum(decl) => self.enum_decl(&vis, decl, dangling),
            ItemKind::TypeAlias(decl) => {
                let name = self.name(&decl.name, "type name");
                let generics = opt_flat(&decl.generics);
                let bounds = self.bounds_suffix(&decl.bounds);
                let value = match &decl.ty {
                    Some(ty) => format!(" = {}", self.ty(ty)),
                    None => String::new(),
                };
                self.line(&format!("{}type {}{}{}{};", vis, name, generics, bounds, value));
            }
            ItemKind::Trait(decl) => {
                let unsafety = if decl.unsafety { "unsafe " } else { "" };
                let name = self.name(&decl.name, "trait name");
                let generics = opt_flat(&decl.generics);
                let supertraits = self.bounds_suffix(&decl.supertraits);
                let where_clause = where_suffix(&decl.where_clause);
                let head = format!(
                    "{}{}trait {}{}{}{}",
                    vis, unsafety, name, generics, supertraits, where_clause
                );
                self.block_items(&head, &decl.items, dangling);
            }
            ItemKind::Impl(block) => {
                let mut head = String::new();
                if block.unsafety {
                    head.push_str("unsafe ");
                }
                head.push_str("impl");
                head.push_str(&opt_flat(&block.generics));
                head.push(' ');
                if block.negative {
                    head.push('!');
                }
                if let Some(trait_ref) = &block.trait_ref {
                    let trait_ref = self.ty(trait_ref);
                    head.push_str(&trait_ref);
                    head.push_str(" for ");
                }
                let self_ty = self.ty(&block.self_ty);
                head.push_str(&self_ty);
                head.push_str(&where_suffix(&block.where_clause));
                self.block_items(&head, &block.items, dangling);
            }
            ItemKind::Fn(decl) => {
                let signature = self.fn_signature(&vis, decl);
                match &decl.body {
                    Some(body) => {
                        let body = body.reindent(self.indent);
                        self.line(&format!("{} {}", signature, body));
                    }
                    None => self.line(&format!("{};", signature)),
                }
            }
            ItemKind::Const(decl) => {
                let keyword = match (decl.is_static, decl.mutable) {
                    (true, true) => "static mut",
                    (true, false) => "static",
                    _ => "const",
                };
                let name = self.name_or_underscore(&decl.name, "constant name");
                let ty = self.ty(&decl.ty);
                let value = match &decl.value {
                    Some(value) => format!(" = {}", value.reindent(self.indent)),
                    None => String::new(),
                };
                self.line(&format!("{}{} {}: {}{};", vis, keyword, name, ty, value));
            }
            ItemKind::Mod(decl) => {
                let name = self.name(&decl.name, "module name");
                match &decl.body {
                    None => self.line(&format!("{}mod {};", vis, name)),
                    Some(body) => {
                        let head = format!("{}mod {}", vis, name);
                        let empty_dangling = !self.comments || dangling.is_empty();
                        if body.items.is_empty() && !self.has_header(&body.header) && empty_dangling
                        {
                            self.line(&format!("{} {{}}", head));
                        } else {
                            self.open(&head);
                            self.header(&body.header);
                            if self.has_header(&body.header) && !body.items.is_empty() {
                                self.blank();
                            }
                            self.items(&body.items, Context::Module);
                            self.close(dangling);
                        }
                    }
                }
            }
            ItemKind::Verbatim(v) => {
                let text = v.reindent(self.indent);
                self.line(&format!("{}{}", vis, text));
            }
        }

        self.trailing(&item.comments.trailing);
    }

    fn block_items(&mut self, head: &str, items: &[Spanned<Item>], dangling: &[Comment]) {
        if items.is_empty() && (!self.comments || dangling.is_empty()) {
            self.line(&format!("{} {{}}", head));
            return;
        }
        self.open(head);
        self.items(items, Context::Block);
        self.close(dangling);
    }

    fn struct_decl(&mut self, vis: &str, decl: &StructDecl, dangling: &[Comment]) {
        let name = self.name(&decl.name, "struct name");
        let generics = opt_flat(&decl.generics);
        let where_clause = where_suffix(&decl.where_clause);
        match &decl.shape {
            StructShape::Unit => {
                self.line(&format!("{}struct {}{}{};", vis, name, generics, where_clause))
            }
            StructShape::Tuple(fields) => {
                let inline = fields.iter().all(|f| {
                    f.node.attrs.is_empty() && (!self.comments || f.node.comments.is_empty())
                });
                if inline {
                    let list = self.tuple_fields(fields);
                    self.line(&format!(
                        "{}struct {}{}({}){};",
                        vis, name, generics, list, where_clause
                    ));
                } else {
                    self.line(&format!("{}struct {}{}(", vis, name, generics));
                    self.indent += 1;
                    for field in fields {
                        let f = &field.node;
                        self.comment_lines(&f.comments.leading);
                        self.comment_lines(&f.comments.dangling);
                        self.attrs(&f.attrs);
                        let ty = self.ty(&f.ty);
                        self.line(&format!("{}{},", visibility(&f.vis), ty));
                        self.trailing(&f.comments.trailing);
                    }
                    self.indent -= 1;
                    self.line(&format!("){};", where_clause));
                }
            }
            StructShape::Named(fields) => {
                let head = format!("{}struct {}{}{}", vis, name, generics, where_clause);
                if fields.is_empty() && (!self.comments || dangling.is_empty()) {
                    self.line(&format!("{} {{}}", head));
                    return;
                }
                self.open(&head);
                self.named_fields(fields);
                self.close(dangling);
            }
        }
    }

    fn tuple_fields(&mut self, fields: &[Spanned<Field>]) -> String {
        let rendered: Vec<String> = fields
            .iter()
            .map(|field| {
                let prefix = inline_attrs(&field.node.attrs);
                let ty = self.ty(&field.node.ty);
                format!("{}{}{}", prefix, visibility(&field.node.vis), ty)
            })
            .collect();
        rendered.join(", ")
    }

    fn named_fields(&mut self, fields: &[Spanned<Field>]) {
        for field in fields {
            let f = &field.node;
            self.comment_lines(&f.comments.leading);
            self.comment_lines(&f.comments.dangling);
            self.attrs(&f.attrs);
            let name = match &f.name {
                Some(name) => self.name(name, "field name"),
                None => String::new(),
            };
            let ty = self.ty(&f.ty);
            self.line(&format!("{}{}: {},", visibility(&f.vis), name, ty));
            self.trailing(&f.comments.trailing);
        }
    }

    fn enum_decl(&mut self, vis: &str, decl: &EnumDecl, dangling: &[Comment]) {
        let name = self.name(&decl.name, "enum name");
        let generics = opt_flat(&decl.generics);
        let where_clause = where_suffix(&decl.where_clause);
        let head = format!("{}enum {}{}{}", vis, name, generics, where_clause);
        if decl.variants.is_empty() && (!self.comments || dangling.is_empty()) {
            self.line(&format!("{} {{}}", head));
            return;
        }
        self.open(&head);
        for variant in &decl.variants {
            let v = &variant.node;
            self.comment_lines(&v.comments.leading);
            self.comment_lines(&v.comments.dangling);
            self.attrs(&v.attrs);
            let name = self.name(&v.name, "variant name");
            let shape = match &v.shape {
                StructShape::Unit => String::new(),
                StructShape::Tuple(fields) => format!("({})", self.tuple_fields(fields)),
                StructShape::Named(fields) => {
                    let rendered: Vec<String> = fields
                        .iter()
                        .map(|field| {
                            let f = &field.node;
                            let prefix = inline_attrs(&f.attrs);
                            let name = match &f.name {
                                Some(name) => self.name(name, "field name"),
                                None => String::new(),
                            };
                            let ty = self.ty(&f.ty);
                            format!("{}{}: {}", prefix, name, ty)
                        })
                        .collect();
                    format!(" {{ {} }}", rendered.join(", "))
                }
            };
            let discriminant = match &v.discriminant {
                Some(d) => format!(" = {}", d.flatten()),
                None => String::new(),
            };
            self.line(&format!("{}{}{},", name, shape, discriminant));
            self.trailing(&v.comments.trailing);
        }
        self.close(dangling);
    }

    fn fn_signature(&mut self, vis: &str, decl: &FnDecl) -> String {
        let mut sig = String::from(vis);
        let q = &decl.qualifiers;
        if q.constness {
            sig.push_str("const ");
        }
        if q.asyncness {
            sig.push_str("async ");
        }
        if q.unsafety {
            sig.push_str("unsafe ");
        }
        match &q.abi {
            Some(Some(abi)) => {
                sig.push_str("extern ");
                sig.push_str(abi);
                sig.push(' ');
            }
            Some(None) => sig.push_str("extern "),
            None => {}
        }
        sig.push_str("fn ");
        let name = self.name(&decl.name, "function name");
        sig.push_str(&name);
        sig.push_str(&opt_flat(&decl.generics));

        let params: Vec<String> = decl.params.iter().map(|p| self.param(p)).collect();
        sig.push('(');
        sig.push_str(&params.join(", "));
        sig.push(')');

        if let Some(ret) = &decl.ret {
            let ret = self.ty(ret);
            sig.push_str(" -> ");
            sig.push_str(&ret);
        }
        sig.push_str(&where_suffix(&decl.where_clause));
        sig
    }

    fn param(&mut self, param: &Param) -> String {
        match param {
            Param::SelfParam(p) => {
                let mut out = String::new();
                if p.by_ref {
                    out.push('&');
                    if let Some(lifetime) = &p.lifetime {
                        out.push_str(lifetime);
                        out.push(' ');
                    }
                }
                if p.mutable {
                    out.push_str("mut ");
                }
                out.push_str("self");
                if let Some(ty) = &p.ty {
                    out.push_str(": ");
                    out.push_str(&self.ty(ty));
                }
                out
            }
            Param::Typed(p) => format!("{}: {}", p.pattern.flatten(), self.ty(&p.ty)),
        }
    }

    fn use_tree(&mut self, tree: &UseTree) -> String {
        match tree {
            UseTree::Path { segment, rest } => {
                let segment = self.name(segment, "path segment");
                format!("{}::{}", segment, self.use_tree(rest))
            }
            UseTree::Name(name) => self.name(name, "imported name"),
            UseTree::Rename { name, alias } => {
                let name = self.name(name, "imported name");
                let alias = self.name_or_underscore(alias, "import alias");
                format!("{} as {}", name, alias)
            }
            UseTree::Glob => "*".to_string(),
            UseTree::Group(trees) => {
                let inner: Vec<String> = trees.iter().map(|t| self.use_tree(t)).collect();
                format!("{{{}}}", inner.join(", "))
            }
        }
    }

    fn bounds_suffix(&mut self, bounds: &[TypeExpr]) -> String {
        if bounds.is_empty() {
            String::new()
        } else {
            format!(": {}", self.bounds(bounds))
        }
    }

    fn bounds(&mut self, bounds: &[TypeExpr]) -> String {
        let rendered: Vec<String> = bounds.iter().map(|b| self.ty(b)).collect();
        rendered.join(" + ")
    }

    fn ty(&mut self, ty: &TypeExpr) -> String {
        match ty {
            TypeExpr::Path(path) => self.path(path),
            TypeExpr::Reference {
                lifetime,
                mutable,
                inner,
            } => {
                let mut out = String::from("&");
                if let Some(lifetime) = lifetime {
                    out.push_str(lifetime);
                    out.push(' ');
                }
                if *mutable {
                    out.push_str("mut ");
                }
                out.push_str(&self.ty(inner));
                out
            }
            TypeExpr::Pointer { mutable, inner } => {
                let kind = if *mutable { "mut" } else { "const" };
                format!("*{} {}", kind, self.ty(inner))
            }
            TypeExpr::Slice(element) => format!("[{}]", self.ty(element)),
            TypeExpr::Array { element, len } => {
                format!("[{}; {}]", self.ty(element), len.flatten())
            }
            TypeExpr::Tuple(elements) => {
                let rendered: Vec<String> = elements.iter().map(|e| self.ty(e)).collect();
                if rendered.len() == 1 {
                    format!("({},)", rendered[0])
                } else {
                    format!("({})", rendered.join(", "))
                }
            }
            TypeExpr::Paren(inner) => format!("({})", self.ty(inner)),
            TypeExpr::DynTrait(bounds) => format!("dyn {}", self.bounds(bounds)),
            TypeExpr::ImplTrait(bounds) => format!("impl {}", self.bounds(bounds)),
            TypeExpr::FnPointer { params, ret } => {
                let params: Vec<String> = params.iter().map(|p| self.ty(p)).collect();
                let ret = match ret {
                    Some(ret) => format!(" -> {}", self.ty(ret)),
                    None => String::new(),
                };
                format!("fn({}){}", params.join(", "), ret)
            }
            TypeExpr::Lifetime(lifetime) => lifetime.clone(),
            TypeExpr::Maybe(inner) => format!("?{}", self.ty(inner)),
            TypeExpr::Never => "!".to_string(),
            TypeExpr::Infer => "_".to_string(),
        }
    }

    fn path(&mut self, path: &TypePath) -> String {
        let mut out = String::new();
        if path.global {
            out.push_str("::");
        }
        for (i, segment) in path.segments.iter().enumerate() {
            if i > 0 {
                out.push_str("::");
            }
            out.push_str(&self.name(&segment.ident, "path segment"));
            match &segment.args {
                PathArgs::None => {}
                PathArgs::AngleBracketed(args) => {
                    let rendered: Vec<String> = args.iter().map(|a| self.generic_arg(a)).collect();
                    out.push('<');
                    out.push_str(&rendered.join(", "));
                    out.push('>');
                }
                PathArgs::Parenthesized { inputs, output } => {
                    let rendered: Vec<String> = inputs.iter().map(|i| self.ty(i)).collect();
                    out.push('(');
                    out.push_str(&rendered.join(", "));
                    out.push(')');
                    if let Some(output) = output {
                        out.push_str(" -> ");
                        out.push_str(&self.ty(output));
                    }
                }
            }
        }
        out
    }

    fn generic_arg(&mut self, arg: &GenericArg) -> String {
        match arg {
            GenericArg::Lifetime(lifetime) => lifetime.clone(),
            GenericArg::Type(ty) => self.ty(ty),
            GenericArg::Binding { name, ty } => {
                let name = self.name(name, "associated type");
                format!("{} = {}", name, self.ty(ty))
            }
            GenericArg::Const(value) => value.flatten(),
        }
    }
}

fn needs_blank(prev: &Item, next: &Item, context: Context) -> bool {
    match context {
        Context::Module => {
            !(matches!(prev.kind, ItemKind::Use(_)) && matches!(next.kind, ItemKind::Use(_)))
        }
        Context::Block => {
            prev.kind.has_block()
                || next.kind.has_block()
                || !next.comments.leading.is_empty()
                || !next.attrs.is_empty()
        }
    }
}

fn visibility(vis: &Visibility) -> String {
    match vis {
        Visibility::Inherited => String::new(),
        Visibility::Public => "pub ".to_string(),
        Visibility::Restricted(scope) => format!("pub({}) ", scope),
    }
}

fn opt_flat(v: &Option<Verbatim>) -> String {
    v.as_ref().map(Verbatim::flatten).unwrap_or_default()
}

fn where_suffix(v: &Option<Verbatim>) -> String {
    match v {
        Some(predicates) => format!(" where {}", predicates.flatten()),
        None => String::new(),
    }
}

fn inline_attrs(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .map(|a| format!("#[{}] ", a.content.flatten()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;
    use pretty_assertions::assert_eq;

    fn roundtrip(src: &str) -> String {
        to_source(&parse(src).expect("Should parse")).expect("Should render")
    }

    #[test]
    fn test_normalizes_layout() {
        let src = "pub   struct   Counter( u32 ) ;\nimpl Counter{pub fn get(&self)->u32{self.0}}";
        assert_eq!(
            roundtrip(src),
            "pub struct Counter(u32);\n\nimpl Counter {\n    pub fn get(&self) -> u32 {self.0}\n}\n"
        );
    }

    #[test]
    fn test_consecutive_uses_stay_together() {
        let src = "use std::fmt;\nuse std::io::{self, Write};\nconst A: u8 = 1;";
        assert_eq!(
            roundtrip(src),
            "use std::fmt;\nuse std::io::{self, Write};\n\nconst A: u8 = 1;\n"
        );
    }

    #[test]
    fn test_header_and_comments_preserved() {
        let src = "//! Docs\n#![allow(dead_code)]\n\n/// A thing\n#[derive(Debug)]\npub struct Thing {\n    /// First\n    pub a: u8, // note\n}\n";
        assert_eq!(
            roundtrip(src),
            "//! Docs\n#![allow(dead_code)]\n\n/// A thing\n#[derive(Debug)]\npub struct Thing {\n    /// First\n    pub a: u8, // note\n}\n"
        );
    }

    #[test]
    fn test_body_reindented() {
        let src = "impl A {\n        fn f(&self) {\n            if x {\n                y();\n            }\n        }\n}";
        assert_eq!(
            roundtrip(src),
            "impl A {\n    fn f(&self) {\n        if x {\n            y();\n        }\n    }\n}\n"
        );
    }

    #[test]
    fn test_trait_signatures_without_blank_lines() {
        let src = "pub trait Shape {\n    fn area(&self) -> f64;\n    fn name(&self) -> String;\n}";
        assert_eq!(
            roundtrip(src),
            "pub trait Shape {\n    fn area(&self) -> f64;\n    fn name(&self) -> String;\n}\n"
        );
    }

    #[test]
    fn test_enum_rendering() {
        let src = "enum E { A, B(u8, &'static str), C { x: i32 }, D = 4 }";
        assert_eq!(
            roundtrip(src),
            "enum E {\n    A,\n    B(u8, &'static str),\n    C { x: i32 },\n    D = 4,\n}\n"
        );
    }

    #[test]
    fn test_types_render() {
        let src = "type T = (Box<dyn Fn(&mut [u8; 4]) -> Option<(u8,)> + Send>, *const u8, fn(u8) -> !, HashMap<K, V>);";
        assert_eq!(
            roundtrip(src),
            "type T = (Box<dyn Fn(&mut [u8; 4]) -> Option<(u8,)> + Send>, *const u8, fn(u8) -> !, HashMap<K, V>);\n"
        );
    }

    #[test]
    fn test_render_type_helper() {
        let ty = TypeExpr::Reference {
            lifetime: None,
            mutable: true,
            inner: Box::new(TypeExpr::simple("Widget")),
        };
        assert_eq!(render_type(&ty), "&mut Widget");
    }

    #[test]
    fn test_fingerprint_ignores_comments() {
        let a = parse("/// one\nfn f() {}").expect("Should parse");
        let b = parse("// two\nfn   f( ) {}").expect("Should parse");
        assert_eq!(fingerprint(&a.items[0].node), fingerprint(&b.items[0].node));
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let mut unit = parse("struct A;").expect("Should parse");
        if let ItemKind::Struct(decl) = &mut unit.items[0].node.kind {
            decl.name = Identifier::new("not valid");
        }
        let err = to_source(&unit).unwrap_err();
        assert!(matches!(err, SerializeError::InvalidTree { .. }));
        assert!(err.to_string().contains("not valid"));
    }

    #[test]
    fn test_serialize_writes_nothing_on_invalid_tree() {
        let mut unit = parse("struct A;").expect("Should parse");
        if let ItemKind::Struct(decl) = &mut unit.items[0].node.kind {
            decl.name = Identifier::new("");
        }
        let mut sink = Vec::new();
        assert!(serialize(&unit, &mut sink).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_empty_unit_renders_empty() {
        assert_eq!(to_source(&CompilationUnit::default()).expect("Should render"), "");
    }
}
