//! Directive parser: `Stack[Widget]` to an [`Instruction`]
//!
//! A directive names a data-structure kind and the element type to
//! instantiate it for. [`parse`] never fails and returns
//! `Instruction::default()` for anything it rejects; [`try_parse`] reports
//! why and where.

mod grammar;
pub mod lexer;

use thiserror::Error;
use tracing::debug;

use crate::error::render_report;
use crate::kind::StructureKind;
use crate::syntax::Span;

/// Words the element type may not be, since the result must stay valid source
const RESERVED: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectiveError {
    #[error("Directive is empty")]
    Empty,

    #[error("Malformed directive: {message}")]
    Syntax { span: Span, message: String },

    #[error("Unknown data structure kind '{name}'")]
    UnknownKind { name: String, span: Span },

    #[error("'{name}' is a reserved word and cannot be used as an element type")]
    ReservedElement { name: String, span: Span },
}

impl DirectiveError {
    pub fn span(&self) -> Option<&Span> {
        match self {
            DirectiveError::Empty => None,
            DirectiveError::Syntax { span, .. }
            | DirectiveError::UnknownKind { span, .. }
            | DirectiveError::ReservedElement { span, .. } => Some(span),
        }
    }

    /// Format the error against the raw directive using ariadne
    pub fn format(&self, raw: &str) -> String {
        let label = match self {
            DirectiveError::Empty => return self.to_string(),
            DirectiveError::Syntax { message, .. } => message.clone(),
            DirectiveError::UnknownKind { .. } => {
                let known: Vec<&str> = StructureKind::ALL.iter().map(|k| k.name()).collect();
                format!("expected one of: {}", known.join(", "))
            }
            DirectiveError::ReservedElement { .. } => "reserved word".to_string(),
        };
        match self.span() {
            Some(span) => render_report(raw, "directive", span, &self.to_string(), &label),
            None => self.to_string(),
        }
    }
}

/// A parsed directive. Kind `Unknown` with an empty element type means no
/// instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Instruction {
    kind: StructureKind,
    element_type: String,
}

impl Instruction {
    pub fn new(kind: StructureKind, element_type: impl Into<String>) -> Self {
        Self {
            kind,
            element_type: element_type.into(),
        }
    }

    pub fn kind(&self) -> StructureKind {
        self.kind
    }

    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    pub fn is_valid(&self) -> bool {
        self.kind != StructureKind::Unknown
            && self.element_type.len() >= 2
            && crate::syntax::ast::is_identifier(&self.element_type)
            && self.element_type.starts_with(|c: char| c.is_ascii_alphabetic())
            && !is_reserved(&self.element_type)
    }

    /// Element type followed by the kind name: `Widget` + `Stack`
    pub fn composite_name(&self) -> String {
        format!("{}{}", self.element_type, self.kind.name())
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.kind, self.element_type)
    }
}

/// Parse a directive, reporting why it was rejected
pub fn try_parse(raw: &str) -> Result<Instruction, DirectiveError> {
    if raw.is_empty() {
        return Err(DirectiveError::Empty);
    }
    let (kind, element) = grammar::parse(raw)?;
    let Some(structure) = StructureKind::from_name(&kind.node) else {
        return Err(DirectiveError::UnknownKind {
            name: kind.node,
            span: kind.span,
        });
    };
    if is_reserved(&element.node) {
        return Err(DirectiveError::ReservedElement {
            name: element.node,
            span: element.span,
        });
    }
    Ok(Instruction::new(structure, element.node))
}

/// Parse a directive; anything rejected becomes `Instruction::default()`
pub fn parse(raw: &str) -> Instruction {
    match try_parse(raw) {
        Ok(instruction) => instruction,
        Err(err) => {
            debug!(directive = raw, error = %err, "directive rejected");
            Instruction::default()
        }
    }
}
