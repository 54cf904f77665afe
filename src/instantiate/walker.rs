//! In-place rewrite of a parsed template for one instruction

use tracing::debug;

use crate::directive::Instruction;
use crate::kind::StructureKind;
use crate::syntax::ast::*;
use crate::Verbosity;

/// The two sentinel identifiers a template is written against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderBinding {
    /// Stands for the element type, `Element` by default
    pub element: String,
    /// Name of the declaration being instantiated, `<Kind>Template`
    pub structure: String,
}

impl PlaceholderBinding {
    pub fn new(element: impl Into<String>, structure: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            structure: structure.into(),
        }
    }

    pub fn for_kind(kind: StructureKind, element: impl Into<String>) -> Self {
        Self::new(element, kind.structure_placeholder())
    }
}

/// What a walk rewrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstitutionReport {
    /// Declarations renamed to the composite name
    pub renamed_declarations: usize,
    /// Sequence element slots of the placeholder declaration
    pub sequence_elements: usize,
    /// Fields typed exactly as the element placeholder
    pub fields: usize,
    /// Parameters typed exactly as the element placeholder
    pub params: usize,
    /// References and raw pointers to the element placeholder
    pub pointers: usize,
    /// Other path segments naming either placeholder
    pub type_references: usize,
    /// Identifiers inside bodies, initializers and attributes
    pub body_identifiers: usize,
}

impl SubstitutionReport {
    pub fn total(&self) -> usize {
        self.renamed_declarations
            + self.sequence_elements
            + self.fields
            + self.params
            + self.pointers
            + self.type_references
            + self.body_identifiers
    }
}

/// Rewrites every occurrence of the placeholders in a template tree
pub struct Substitution {
    element: String,
    element_type: String,
    structure: String,
    composite: String,
    verbosity: Verbosity,
    report: SubstitutionReport,
}

impl Substitution {
    pub fn new(
        instruction: &Instruction,
        binding: &PlaceholderBinding,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            element: binding.element.clone(),
            element_type: instruction.element_type().to_string(),
            structure: binding.structure.clone(),
            composite: instruction.composite_name(),
            verbosity,
            report: SubstitutionReport::default(),
        }
    }

    /// Walk `unit` once, rewriting in place
    pub fn walk(&mut self, unit: &mut CompilationUnit) -> SubstitutionReport {
        self.report = SubstitutionReport::default();
        self.attrs(&mut unit.header.attrs);
        self.items(&mut unit.items);
        self.report
    }

    fn note(&self, what: &str, from: &str, to: &str) {
        if self.verbosity >= Verbosity::Noisy {
            debug!(what, from, to, "substituted");
        }
    }

    /// Replacement for a sentinel identifier, if `name` is one
    fn replacement(&self, name: &str) -> Option<&str> {
        if name == self.structure {
            Some(&self.composite)
        } else if name == self.element {
            Some(&self.element_type)
        } else {
            None
        }
    }

    fn is_element(&self, ty: &TypeExpr) -> bool {
        ty.as_simple_name() == Some(self.element.as_str())
    }

    /// Replace `ty` when it is exactly the element placeholder
    fn retarget(&mut self, ty: &mut TypeExpr) -> bool {
        if !self.is_element(ty) {
            return false;
        }
        self.note("type", &self.element, &self.element_type);
        *ty = TypeExpr::simple(self.element_type.clone());
        true
    }

    fn items(&mut self, items: &mut [Spanned<Item>]) {
        for item in items {
            self.item(&mut item.node);
        }
    }

    fn item(&mut self, item: &mut Item) {
        self.attrs(&mut item.attrs);
        match &mut item.kind {
            ItemKind::Use(decl) => self.use_tree(&mut decl.tree),
            ItemKind::Struct(decl) => {
                if decl.name == *self.structure.as_str() {
                    if let [field] = decl.shape.fields_mut() {
                        self.sequence(&mut field.node.ty);
                    }
                }
                self.declaration(&mut decl.name);
                self.opt_verbatim(&mut decl.generics);
                self.opt_verbatim(&mut decl.where_clause);
                for field in decl.shape.fields_mut() {
                    self.field(&mut field.node);
                }
            }
            ItemKind::Enum(decl) => {
                self.declaration(&mut decl.name);
                self.opt_verbatim(&mut decl.generics);
                self.opt_verbatim(&mut decl.where_clause);
                for variant in &mut decl.variants {
                    let variant = &mut variant.node;
                    self.attrs(&mut variant.attrs);
                    for field in variant.shape.fields_mut() {
                        self.field(&mut field.node);
                    }
                    self.opt_verbatim(&mut variant.discriminant);
                }
            }
            ItemKind::TypeAlias(decl) => {
                if decl.name == *self.structure.as_str() {
                    if let Some(ty) = &mut decl.ty {
                        self.sequence(ty);
                    }
                }
                self.declaration(&mut decl.name);
                self.opt_verbatim(&mut decl.generics);
                for bound in &mut decl.bounds {
                    self.ty(bound);
                }
                if let Some(ty) = &mut decl.ty {
                    self.ty(ty);
                }
            }
            ItemKind::Trait(decl) => {
                self.declaration(&mut decl.name);
                self.opt_verbatim(&mut decl.generics);
                for bound in &mut decl.supertraits {
                    self.ty(bound);
                }
                self.opt_verbatim(&mut decl.where_clause);
                self.items(&mut decl.items);
            }
            ItemKind::Impl(block) => {
                self.opt_verbatim(&mut block.generics);
                if let Some(trait_ref) = &mut block.trait_ref {
                    self.ty(trait_ref);
                }
                self.ty(&mut block.self_ty);
                self.opt_verbatim(&mut block.where_clause);
                self.items(&mut block.items);
            }
            ItemKind::Fn(decl) => {
                self.opt_verbatim(&mut decl.generics);
                for param in &mut decl.params {
                    self.param(param);
                }
                if let Some(ret) = &mut decl.ret {
                    self.ty(ret);
                }
                self.opt_verbatim(&mut decl.where_clause);
                self.opt_verbatim(&mut decl.body);
            }
            ItemKind::Const(decl) => {
                self.ty(&mut decl.ty);
                self.opt_verbatim(&mut decl.value);
            }
            ItemKind::Mod(decl) => {
                if let Some(body) = &mut decl.body {
                    self.attrs(&mut body.header.attrs);
                    self.items(&mut body.items);
                }
            }
            ItemKind::Verbatim(v) => self.verbatim(v),
        }
    }

    /// Rename a type declaration named the structure placeholder
    fn declaration(&mut self, name: &mut Identifier) {
        if *name == *self.structure.as_str() {
            self.note("declaration", &self.structure, &self.composite);
            *name = Identifier::new(self.composite.clone());
            self.report.renamed_declarations += 1;
        }
    }

    /// Element slot of the placeholder declaration's sequence shape
    fn sequence(&mut self, ty: &mut TypeExpr) {
        let Some(element) = ty.sequence_element_mut() else {
            return;
        };
        if self.retarget(element) {
            self.report.sequence_elements += 1;
        }
    }

    fn field(&mut self, field: &mut Field) {
        self.attrs(&mut field.attrs);
        if self.retarget(&mut field.ty) {
            self.report.fields += 1;
        } else {
            self.ty(&mut field.ty);
        }
    }

    fn param(&mut self, param: &mut Param) {
        match param {
            Param::SelfParam(p) => {
                if let Some(ty) = &mut p.ty {
                    self.ty(ty);
                }
            }
            Param::Typed(p) => {
                self.verbatim(&mut p.pattern);
                if self.retarget(&mut p.ty) {
                    self.report.params += 1;
                } else {
                    self.ty(&mut p.ty);
                }
            }
        }
    }

    fn ty(&mut self, ty: &mut TypeExpr) {
        match ty {
            TypeExpr::Path(path) => self.path(path),
            TypeExpr::Reference { inner, .. } | TypeExpr::Pointer { inner, .. } => {
                if self.retarget(inner) {
                    self.report.pointers += 1;
                } else {
                    self.ty(inner);
                }
            }
            TypeExpr::Slice(inner) | TypeExpr::Paren(inner) | TypeExpr::Maybe(inner) => {
                self.ty(inner)
            }
            TypeExpr::Array { element, len } => {
                self.ty(element);
                self.verbatim(len);
            }
            TypeExpr::Tuple(types) | TypeExpr::DynTrait(types) | TypeExpr::ImplTrait(types) => {
                for ty in types {
                    self.ty(ty);
                }
            }
            TypeExpr::FnPointer { params, ret } => {
                for param in params {
                    self.ty(param);
                }
                if let Some(ret) = ret {
                    self.ty(ret);
                }
            }
            TypeExpr::Lifetime(_) | TypeExpr::Never | TypeExpr::Infer => {}
        }
    }

    fn path(&mut self, path: &mut TypePath) {
        for segment in &mut path.segments {
            if let Some(to) = self.replacement(segment.ident.as_str()).map(str::to_string) {
                self.note("path segment", segment.ident.as_str(), &to);
                segment.ident = Identifier::new(to);
                self.report.type_references += 1;
            }
            match &mut segment.args {
                PathArgs::None => {}
                PathArgs::AngleBracketed(args) => {
                    for arg in args {
                        match arg {
                            GenericArg::Lifetime(_) => {}
                            GenericArg::Type(ty) | GenericArg::Binding { ty, .. } => self.ty(ty),
                            GenericArg::Const(value) => self.verbatim(value),
                        }
                    }
                }
                PathArgs::Parenthesized { inputs, output } => {
                    for input in inputs {
                        self.ty(input);
                    }
                    if let Some(output) = output {
                        self.ty(output);
                    }
                }
            }
        }
    }

    fn use_tree(&mut self, tree: &mut UseTree) {
        match tree {
            UseTree::Path { segment, rest } => {
                self.use_name(segment);
                self.use_tree(rest);
            }
            UseTree::Name(name) | UseTree::Rename { name, .. } => self.use_name(name),
            UseTree::Glob => {}
            UseTree::Group(trees) => {
                for tree in trees {
                    self.use_tree(tree);
                }
            }
        }
    }

    fn use_name(&mut self, name: &mut Identifier) {
        if let Some(to) = self.replacement(name.as_str()).map(str::to_string) {
            self.note("import", name.as_str(), &to);
            *name = Identifier::new(to);
            self.report.type_references += 1;
        }
    }

    fn attrs(&mut self, attrs: &mut [Attribute]) {
        for attr in attrs {
            self.verbatim(&mut attr.content);
        }
    }

    fn opt_verbatim(&mut self, v: &mut Option<Verbatim>) {
        if let Some(v) = v {
            self.verbatim(v);
        }
    }

    /// Identifier segments only; literals and comments stay as written
    fn verbatim(&mut self, v: &mut Verbatim) {
        for segment in &mut v.segments {
            let Segment::Ident(name) = segment else {
                continue;
            };
            if let Some(to) = self.replacement(name).map(str::to_string) {
                self.note("identifier", name, &to);
                *name = to;
                self.report.body_identifiers += 1;
            }
        }
    }
}
