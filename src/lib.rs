//! Stencil - data-structure templates instantiated by syntax-tree rewriting
//!
//! A directive such as `Stack[Widget]` selects a template written against
//! placeholder types. The template is parsed, every placeholder is replaced
//! with the requested element type and composite name, and the result is
//! merged into a destination unit and printed back to source.
//!
//! # Example
//!
//! ```rust
//! use stencil::{generate, GenerateOptions, Source, StructureKind, TemplateStore};
//!
//! let store = TemplateStore::from_sources([(
//!     StructureKind::Stack,
//!     "pub struct StackTemplate(Vec<Element>);\n\
//!      impl Render for StackTemplate { fn render(&self) -> String { String::new() } }",
//! )]);
//!
//! let mut out = Vec::new();
//! let outcome = generate(
//!     &store,
//!     "Stack[Widget]",
//!     &Source::empty("widgets.rs"),
//!     &mut out,
//!     &GenerateOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(outcome.type_name, "WidgetStack");
//! assert!(String::from_utf8(out).unwrap().contains("pub struct WidgetStack(Vec<Widget>);"));
//! ```

pub mod config;
pub mod directive;
pub mod error;
pub mod instantiate;
pub mod kind;
pub mod syntax;
pub mod template;

pub use config::{Config, ConfigError, TemplateConfig};
pub use directive::{DirectiveError, Instruction};
pub use error::ParseError;
pub use instantiate::{merge, MergeError, PlaceholderBinding, Substitution, SubstitutionReport};
pub use kind::StructureKind;
pub use syntax::{CompilationUnit, SerializeError};
pub use template::{ContractError, TemplateCopy, TemplateOrigin, TemplateStore};

use std::io::Write;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

/// How much the pipeline reports through `tracing`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// No events beyond errors returned to the caller
    Silent,
    /// One event per generation, plus warnings for fallback templates
    #[default]
    Normal,
    /// Every substitution is logged
    Noisy,
}

/// An already-read destination unit
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Path or label used in diagnostics
    pub name: String,
    pub text: String,
}

impl Source {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// A destination that does not exist yet
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }

    /// Module name derived from the file stem, when it is an identifier
    pub fn module_name(&self) -> Option<String> {
        let stem = Path::new(&self.name).file_stem()?.to_str()?;
        syntax::ast::is_identifier(stem).then(|| stem.to_string())
    }
}

/// Options for one generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub verbosity: Verbosity,
    /// Fail instead of emitting output from a fallback template
    pub strict: bool,
    /// Sentinel type name standing for the element type in templates
    pub element_placeholder: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            strict: false,
            element_placeholder: "Element".to_string(),
        }
    }
}

impl GenerateOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            verbosity: Verbosity::Normal,
            strict: config.strict,
            element_placeholder: config.element_placeholder.clone(),
        }
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_element_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.element_placeholder = placeholder.into();
        self
    }
}

/// Result of a successful generation
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub kind: StructureKind,
    /// Composite name of the generated type, e.g. `WidgetStack`
    pub type_name: String,
    /// The template was the fallback stub
    pub degraded: bool,
    pub report: SubstitutionReport,
}

impl Outcome {
    /// File name for the generated type: `widget_stack.rs`
    pub fn file_name(&self) -> String {
        format!("{}.rs", snake_case(&self.type_name))
    }
}

fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_uppercase() {
            out.push(c);
            continue;
        }
        let boundary = match i.checked_sub(1).map(|p| chars[p]) {
            Some(prev) if prev.is_ascii_lowercase() || prev.is_ascii_digit() => true,
            Some(prev) if prev.is_ascii_uppercase() => {
                chars.get(i + 1).is_some_and(|next| next.is_ascii_lowercase())
            }
            _ => false,
        };
        if boundary && !out.ends_with('_') {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Errors that can occur during generation
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Malformed directive '{raw}': {source}")]
    DirectiveMalformed {
        raw: String,
        #[source]
        source: DirectiveError,
    },

    #[error("No template loaded for {kind}")]
    TemplateUnavailable { kind: StructureKind },

    #[error("Template for {kind} fell back to a stub: {reason}")]
    TemplateDegraded { kind: StructureKind, reason: String },

    #[error("Template for {kind} is invalid: {source}")]
    TemplateContract {
        kind: StructureKind,
        #[source]
        source: ContractError,
    },

    #[error("Template for {kind} does not parse: {}", format_parse_errors(.errors))]
    TemplateUnparsable {
        kind: StructureKind,
        text: String,
        errors: Vec<ParseError>,
    },

    #[error("Destination '{name}' does not parse: {}", format_parse_errors(.errors))]
    SourceUnparsable {
        name: String,
        text: String,
        errors: Vec<ParseError>,
    },

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("serialization error: {0}")]
    Serialization(#[from] SerializeError),
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse, load, substitute and merge, returning the merged tree
pub fn instantiate(
    store: &TemplateStore,
    directive: &str,
    destination: &Source,
    options: &GenerateOptions,
) -> Result<(CompilationUnit, Outcome), GenerateError> {
    let instruction =
        directive::try_parse(directive).map_err(|source| GenerateError::DirectiveMalformed {
            raw: directive.to_string(),
            source,
        })?;
    let kind = instruction.kind();

    let copy = store
        .load(kind)
        .ok_or(GenerateError::TemplateUnavailable { kind })?;
    if let TemplateOrigin::Fallback { reason, .. } = &copy.origin {
        if options.strict {
            return Err(GenerateError::TemplateDegraded {
                kind,
                reason: reason.clone(),
            });
        }
        if options.verbosity >= Verbosity::Normal {
            warn!(%kind, %reason, "generating from fallback template");
        }
    }
    let degraded = copy.is_degraded();

    let text = copy.text().into_owned();
    let mut tree = syntax::parse(&text)
        .map_err(|errors| GenerateError::TemplateUnparsable { kind, text, errors })?;
    template::check_contract(&tree, kind, degraded)
        .map_err(|source| GenerateError::TemplateContract { kind, source })?;

    let binding = PlaceholderBinding::for_kind(kind, options.element_placeholder.clone());
    let report = Substitution::new(&instruction, &binding, options.verbosity).walk(&mut tree);

    let mut unit =
        syntax::parse(&destination.text).map_err(|errors| GenerateError::SourceUnparsable {
            name: destination.name.clone(),
            text: destination.text.clone(),
            errors,
        })?;
    unit.name = destination.module_name();

    let merged = merge(unit, tree)?;
    let outcome = Outcome {
        kind,
        type_name: instruction.composite_name(),
        degraded,
        report,
    };
    if options.verbosity >= Verbosity::Normal {
        info!(
            %instruction,
            type_name = %outcome.type_name,
            substitutions = report.total(),
            "instantiated template"
        );
    }
    Ok((merged, outcome))
}

/// Generate the type named by `directive` into `destination` and write the
/// merged unit to `sink`. Nothing is written on error.
///
/// # Example
///
/// ```rust
/// use stencil::{generate, GenerateError, GenerateOptions, Source, TemplateStore};
///
/// let err = generate(
///     &TemplateStore::empty(),
///     "foo[Widget]",
///     &Source::empty("out.rs"),
///     &mut Vec::new(),
///     &GenerateOptions::default(),
/// )
/// .unwrap_err();
/// assert!(matches!(err, GenerateError::DirectiveMalformed { .. }));
/// ```
pub fn generate<W: Write + ?Sized>(
    store: &TemplateStore,
    directive: &str,
    destination: &Source,
    sink: &mut W,
    options: &GenerateOptions,
) -> Result<Outcome, GenerateError> {
    let (unit, outcome) = instantiate(store, directive, destination, options)?;
    syntax::serialize(&unit, sink)?;
    Ok(outcome)
}

/// A template store paired with the options every generation uses
#[derive(Debug, Clone)]
pub struct Generator {
    store: TemplateStore,
    options: GenerateOptions,
}

impl Generator {
    pub fn new(store: TemplateStore, options: GenerateOptions) -> Self {
        Self { store, options }
    }

    /// Load templates from disk as `config` describes
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TemplateStore::load_from(&config.templates),
            GenerateOptions::from_config(config),
        )
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn generate<W: Write + ?Sized>(
        &self,
        directive: &str,
        destination: &Source,
        sink: &mut W,
    ) -> Result<Outcome, GenerateError> {
        generate(&self.store, directive, destination, sink, &self.options)
    }
}
