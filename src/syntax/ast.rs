//! Abstract Syntax Tree types for the Rust item subset

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Identifier as written in source, raw identifiers keep their `r#` prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ASCII letter or underscore first, then letters, digits and underscores
    pub fn is_well_formed(&self) -> bool {
        is_identifier(self.0.strip_prefix("r#").unwrap_or(&self.0))
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    s != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// ...`
    Line,
    /// `/* ... */`
    Block,
    /// `/// ...` or `/** ... */`
    OuterDoc,
    /// `//! ...` or `/*! ... */`
    InnerDoc,
}

impl CommentKind {
    pub fn classify(text: &str) -> Self {
        if text.starts_with("//!") || text.starts_with("/*!") {
            CommentKind::InnerDoc
        } else if (text.starts_with("///") && !text.starts_with("////"))
            || (text.starts_with("/**") && !text.starts_with("/***") && text != "/**/")
        {
            CommentKind::OuterDoc
        } else if text.starts_with("/*") {
            CommentKind::Block
        } else {
            CommentKind::Line
        }
    }
}

/// A comment with its exact source text
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub kind: CommentKind,
    pub text: String,
    pub span: Span,
}

/// Comments attached to a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comments {
    /// Own-line comments before the node
    pub leading: Vec<Comment>,
    /// A comment on the same line as the node's end
    pub trailing: Option<Comment>,
    /// Comments inside the node that belong to no child
    pub dangling: Vec<Comment>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_none() && self.dangling.is_empty()
    }
}

/// One piece of an opaque token region
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Identifier token, visible to rewrites
    Ident(String),
    /// String, char, number or lifetime literal
    Literal(String),
    Comment(String),
    /// Punctuation, keywords and whitespace
    Text(String),
}

/// Token region kept as written (function bodies, initializers, generics)
#[derive(Debug, Clone, PartialEq)]
pub struct Verbatim {
    pub span: Span,
    pub segments: Vec<Segment>,
}

impl Verbatim {
    pub fn new(span: Span, segments: Vec<Segment>) -> Self {
        Self { span, segments }
    }

    /// Build a region from plain text with no identifiers
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            span: 0..0,
            segments: vec![Segment::Text(text.into())],
        }
    }

    pub fn idents(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Ident(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Source text of the region with every segment concatenated
    pub fn source(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Ident(s) | Segment::Literal(s) | Segment::Comment(s) | Segment::Text(s) => {
                    out.push_str(s)
                }
            }
        }
        out
    }

    /// Single-line rendering: comments dropped, whitespace runs collapsed
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        let mut pending_space = false;
        for segment in &self.segments {
            match segment {
                Segment::Comment(_) => pending_space = true,
                Segment::Ident(s) | Segment::Literal(s) => {
                    push_spaced(&mut out, s, pending_space);
                    pending_space = false;
                }
                Segment::Text(s) => {
                    for word in s.split_inclusive(char::is_whitespace) {
                        let trimmed = word.trim_end();
                        if !trimmed.is_empty() {
                            push_spaced(&mut out, trimmed, pending_space);
                        }
                        pending_space =
                            (pending_space && trimmed.is_empty()) || trimmed.len() < word.len();
                    }
                }
            }
        }
        out
    }

    /// Multi-line rendering rebased onto `indent` levels of four spaces.
    ///
    /// The indentation of the region's last line (a closing brace, usually)
    /// becomes the new base; deeper lines keep their relative depth. Line
    /// breaks inside literals and block comments are left alone.
    pub fn reindent(&self, indent: usize) -> String {
        let mut text = String::new();
        let mut breaks = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(s) => {
                    for (i, c) in s.char_indices() {
                        if c == '\n' {
                            breaks.push(text.len() + i);
                        }
                    }
                    text.push_str(s);
                }
                Segment::Ident(s) | Segment::Literal(s) | Segment::Comment(s) => text.push_str(s),
            }
        }
        let Some(&last) = breaks.last() else {
            return text;
        };
        let base = indent_width(&text[last + 1..]);

        let end = text.len();
        let mut out = String::with_capacity(end);
        let mut start = 0;
        for (n, &brk) in breaks.iter().chain(std::iter::once(&end)).enumerate() {
            let line = &text[start..brk];
            if n == 0 {
                out.push_str(line.trim_end());
            } else {
                out.push('\n');
                let body = line.trim_start_matches([' ', '\t'].as_slice()).trim_end();
                if !body.is_empty() {
                    let depth = indent_width(line).saturating_sub(base);
                    out.push_str(&" ".repeat(indent * 4 + depth));
                    out.push_str(body);
                }
            }
            start = brk + 1;
        }
        out
    }
}

fn push_spaced(out: &mut String, text: &str, space: bool) {
    let after_open = out.ends_with(['(', '['].as_slice());
    let before_close = text.starts_with([')', ']', ',', ';'].as_slice());
    if space && !out.is_empty() && !after_open && !before_close {
        out.push(' ');
    }
    out.push_str(text);
}

/// Width of leading whitespace, tabs counted as four columns
fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Root AST node - one source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationUnit {
    /// Module name derived from the file path, if any
    pub name: Option<String>,
    pub header: ModuleHeader,
    pub items: Vec<Spanned<Item>>,
    /// Comments after the last item
    pub trailing: Vec<Comment>,
}

impl CompilationUnit {
    /// Items declared directly in this unit with the given name
    pub fn find(&self, name: &str) -> impl Iterator<Item = &Spanned<Item>> + '_ {
        let name = name.to_string();
        self.items.iter().filter(move |item| {
            item.node
                .kind
                .declared_name()
                .is_some_and(|declared| declared.as_str() == name)
        })
    }
}

/// Inner doc comments and inner attributes of a module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleHeader {
    pub docs: Vec<Comment>,
    pub attrs: Vec<Attribute>,
}

impl ModuleHeader {
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty() && self.attrs.is_empty()
    }
}

/// `#[...]` or `#![...]`, content kept without the brackets
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub inner: bool,
    pub content: Verbatim,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Inherited,
    Public,
    /// `pub(crate)`, `pub(super)`, `pub(in path)`
    Restricted(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub attrs: Vec<Attribute>,
    pub vis: Visibility,
    pub kind: ItemKind,
    pub comments: Comments,
}

impl Item {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            attrs: Vec::new(),
            vis: Visibility::Inherited,
            kind,
            comments: Comments::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Use(UseDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    TypeAlias(TypeAlias),
    Trait(TraitDecl),
    Impl(ImplBlock),
    Fn(FnDecl),
    /// `const` or `static`
    Const(ConstDecl),
    Mod(ModDecl),
    /// Item-level macro invocation or `extern crate`, kept whole
    Verbatim(Verbatim),
}

impl ItemKind {
    pub fn declared_name(&self) -> Option<&Identifier> {
        match self {
            ItemKind::Struct(decl) => Some(&decl.name),
            ItemKind::Enum(decl) => Some(&decl.name),
            ItemKind::TypeAlias(decl) => Some(&decl.name),
            ItemKind::Trait(decl) => Some(&decl.name),
            ItemKind::Fn(decl) => Some(&decl.name),
            ItemKind::Const(decl) => Some(&decl.name),
            ItemKind::Mod(decl) => Some(&decl.name),
            ItemKind::Use(_) | ItemKind::Impl(_) | ItemKind::Verbatim(_) => None,
        }
    }

    /// Keyword used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            ItemKind::Use(_) => "use",
            ItemKind::Struct(_) => "struct",
            ItemKind::Enum(_) => "enum",
            ItemKind::TypeAlias(_) => "type",
            ItemKind::Trait(_) => "trait",
            ItemKind::Impl(_) => "impl",
            ItemKind::Fn(_) => "fn",
            ItemKind::Const(decl) if decl.is_static => "static",
            ItemKind::Const(_) => "const",
            ItemKind::Mod(_) => "mod",
            ItemKind::Verbatim(_) => "macro",
        }
    }

    /// Whether the item ends with a `{ ... }` block
    pub fn has_block(&self) -> bool {
        match self {
            ItemKind::Struct(decl) => matches!(decl.shape, StructShape::Named(_)),
            ItemKind::Enum(_) | ItemKind::Trait(_) | ItemKind::Impl(_) => true,
            ItemKind::Fn(decl) => decl.body.is_some(),
            ItemKind::Mod(decl) => decl.body.is_some(),
            ItemKind::Use(_) | ItemKind::TypeAlias(_) | ItemKind::Const(_) | ItemKind::Verbatim(_) => {
                false
            }
        }
    }
}

/// `use` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct UseDecl {
    /// Leading `::`
    pub global: bool,
    pub tree: UseTree,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UseTree {
    /// `segment::rest`
    Path {
        segment: Identifier,
        rest: Box<UseTree>,
    },
    Name(Identifier),
    Rename { name: Identifier, alias: Identifier },
    Glob,
    Group(Vec<UseTree>),
}

/// A use tree flattened to a single import, e.g. `std::fmt::Display as D`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UseLeaf {
    pub path: Vec<String>,
    pub alias: Option<String>,
}

impl UseTree {
    /// Every import this tree brings into scope
    pub fn leaves(&self) -> Vec<UseLeaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves(&self, prefix: &mut Vec<String>, out: &mut Vec<UseLeaf>) {
        match self {
            UseTree::Path { segment, rest } => {
                prefix.push(segment.0.clone());
                rest.collect_leaves(prefix, out);
                prefix.pop();
            }
            UseTree::Name(name) => out.push(UseLeaf {
                path: leaf_path(prefix, name),
                alias: None,
            }),
            UseTree::Rename { name, alias } => out.push(UseLeaf {
                path: leaf_path(prefix, name),
                alias: Some(alias.0.clone()),
            }),
            UseTree::Glob => {
                let mut path = prefix.clone();
                path.push("*".to_string());
                out.push(UseLeaf { path, alias: None });
            }
            UseTree::Group(trees) => {
                for tree in trees {
                    tree.collect_leaves(prefix, out);
                }
            }
        }
    }

    /// Drop leaves for which `keep` is false. Returns `None` when nothing is left.
    pub fn prune(self, keep: &mut impl FnMut(&UseLeaf) -> bool) -> Option<UseTree> {
        self.prune_at(&mut Vec::new(), keep)
    }

    fn prune_at(
        self,
        prefix: &mut Vec<String>,
        keep: &mut impl FnMut(&UseLeaf) -> bool,
    ) -> Option<UseTree> {
        match self {
            UseTree::Path { segment, rest } => {
                prefix.push(segment.0.clone());
                let rest = rest.prune_at(prefix, keep);
                prefix.pop();
                rest.map(|rest| UseTree::Path {
                    segment,
                    rest: Box::new(rest),
                })
            }
            UseTree::Group(trees) => {
                let kept: Vec<UseTree> = trees
                    .into_iter()
                    .filter_map(|tree| tree.prune_at(prefix, keep))
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(UseTree::Group(kept))
                }
            }
            leaf => {
                let mut leaves = Vec::new();
                leaf.collect_leaves(prefix, &mut leaves);
                if leaves.iter().all(|l| keep(l)) {
                    Some(leaf)
                } else {
                    None
                }
            }
        }
    }
}

/// `a::{self}` imports `a` itself
fn leaf_path(prefix: &[String], name: &Identifier) -> Vec<String> {
    let mut path = prefix.to_vec();
    if name.as_str() != "self" || path.is_empty() {
        path.push(name.0.clone());
    }
    path
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Identifier,
    /// `<...>` including the angle brackets
    pub generics: Option<Verbatim>,
    pub shape: StructShape,
    /// Predicates after `where`
    pub where_clause: Option<Verbatim>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructShape {
    Unit,
    Tuple(Vec<Spanned<Field>>),
    Named(Vec<Spanned<Field>>),
}

impl StructShape {
    pub fn fields_mut(&mut self) -> &mut [Spanned<Field>] {
        match self {
            StructShape::Unit => &mut [],
            StructShape::Tuple(fields) | StructShape::Named(fields) => fields,
        }
    }

    pub fn fields(&self) -> &[Spanned<Field>] {
        match self {
            StructShape::Unit => &[],
            StructShape::Tuple(fields) | StructShape::Named(fields) => fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub attrs: Vec<Attribute>,
    pub vis: Visibility,
    /// `None` for tuple fields
    pub name: Option<Identifier>,
    pub ty: TypeExpr,
    pub comments: Comments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Identifier,
    pub generics: Option<Verbatim>,
    pub where_clause: Option<Verbatim>,
    pub variants: Vec<Spanned<Variant>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub attrs: Vec<Attribute>,
    pub name: Identifier,
    pub shape: StructShape,
    pub discriminant: Option<Verbatim>,
    pub comments: Comments,
}

/// `type Name<..>: Bounds = Type;`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    pub name: Identifier,
    pub generics: Option<Verbatim>,
    pub bounds: Vec<TypeExpr>,
    /// `None` for associated types declared in traits
    pub ty: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitDecl {
    pub unsafety: bool,
    pub name: Identifier,
    pub generics: Option<Verbatim>,
    pub supertraits: Vec<TypeExpr>,
    pub where_clause: Option<Verbatim>,
    pub items: Vec<Spanned<Item>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImplBlock {
    pub unsafety: bool,
    pub generics: Option<Verbatim>,
    /// `impl !Trait for T`
    pub negative: bool,
    pub trait_ref: Option<TypeExpr>,
    pub self_ty: TypeExpr,
    pub where_clause: Option<Verbatim>,
    pub items: Vec<Spanned<Item>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FnQualifiers {
    pub constness: bool,
    pub asyncness: bool,
    pub unsafety: bool,
    /// `extern` with its optional ABI string, quotes included
    pub abi: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub qualifiers: FnQualifiers,
    pub name: Identifier,
    pub generics: Option<Verbatim>,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub where_clause: Option<Verbatim>,
    /// `None` for signatures ending in `;`
    pub body: Option<Verbatim>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    SelfParam(SelfParam),
    Typed(TypedParam),
}

/// `self`, `mut self`, `&self`, `&'a mut self`, `self: Box<Self>`
#[derive(Debug, Clone, PartialEq)]
pub struct SelfParam {
    pub by_ref: bool,
    pub lifetime: Option<String>,
    pub mutable: bool,
    pub ty: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedParam {
    pub pattern: Verbatim,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub is_static: bool,
    /// `static mut`
    pub mutable: bool,
    pub name: Identifier,
    pub ty: TypeExpr,
    /// `None` for trait constants without a default
    pub value: Option<Verbatim>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModDecl {
    pub name: Identifier,
    /// `None` for `mod name;`
    pub body: Option<ModBody>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModBody {
    pub header: ModuleHeader,
    pub items: Vec<Spanned<Item>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Path(TypePath),
    Reference {
        lifetime: Option<String>,
        mutable: bool,
        inner: Box<TypeExpr>,
    },
    Pointer {
        mutable: bool,
        inner: Box<TypeExpr>,
    },
    Slice(Box<TypeExpr>),
    Array {
        element: Box<TypeExpr>,
        len: Verbatim,
    },
    Tuple(Vec<TypeExpr>),
    Paren(Box<TypeExpr>),
    /// `dyn A + B`
    DynTrait(Vec<TypeExpr>),
    /// `impl A + B`
    ImplTrait(Vec<TypeExpr>),
    FnPointer {
        params: Vec<TypeExpr>,
        ret: Option<Box<TypeExpr>>,
    },
    /// Lifetime in bound position
    Lifetime(String),
    /// `?Sized`
    Maybe(Box<TypeExpr>),
    Never,
    Infer,
}

impl TypeExpr {
    pub fn simple(name: impl Into<String>) -> Self {
        TypeExpr::Path(TypePath::simple(name))
    }

    /// The single identifier this type names, for `Name` without arguments
    pub fn as_simple_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Path(path) => path.as_simple_name(),
            _ => None,
        }
    }

    /// Element slot of a sequence shape: `[E]`, `[E; N]`, `Vec<E>`,
    /// `VecDeque<E>` or `Box<[E]>`
    pub fn sequence_element_mut(&mut self) -> Option<&mut TypeExpr> {
        match self {
            TypeExpr::Slice(element) => Some(element),
            TypeExpr::Array { element, .. } => Some(element),
            TypeExpr::Path(path) => {
                let last = path.segments.last_mut()?;
                let PathArgs::AngleBracketed(args) = &mut last.args else {
                    return None;
                };
                let [GenericArg::Type(inner)] = args.as_mut_slice() else {
                    return None;
                };
                match last.ident.as_str() {
                    "Vec" | "VecDeque" => Some(inner),
                    "Box" => match inner {
                        TypeExpr::Slice(element) => Some(element),
                        _ => None,
                    },
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypePath {
    /// Leading `::`
    pub global: bool,
    pub segments: Vec<PathSegment>,
}

impl TypePath {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            global: false,
            segments: vec![PathSegment {
                ident: Identifier::new(name),
                args: PathArgs::None,
            }],
        }
    }

    pub fn as_simple_name(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [segment] if !self.global && segment.args == PathArgs::None => {
                Some(segment.ident.as_str())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub ident: Identifier,
    pub args: PathArgs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathArgs {
    None,
    /// `<A, B, Item = C>`
    AngleBracketed(Vec<GenericArg>),
    /// `Fn(A, B) -> C`
    Parenthesized {
        inputs: Vec<TypeExpr>,
        output: Option<Box<TypeExpr>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenericArg {
    Lifetime(String),
    Type(TypeExpr),
    /// `Item = T`
    Binding { name: Identifier, ty: TypeExpr },
    /// Const argument: a literal or a `{ ... }` block
    Const(Verbatim),
}
