//! Structural checks a parsed template must pass before instantiation

use thiserror::Error;

use crate::kind::StructureKind;
use crate::syntax::ast::{CompilationUnit, ItemKind, TypeExpr};

/// Trait every non-stub template implements for its placeholder type
pub const RENDER_TRAIT: &str = "Render";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractError {
    #[error("template declares no type named {placeholder}")]
    NoPlaceholder { placeholder: String },

    #[error("template declares {count} types named {placeholder}, expected one")]
    DuplicatePlaceholder { placeholder: String, count: usize },

    #[error("template does not implement {RENDER_TRAIT} for {placeholder}")]
    MissingRender { placeholder: String },
}

/// Check that `unit` declares the placeholder type of `kind` exactly once and,
/// unless it is a fallback stub, implements the render trait for it
pub fn check(unit: &CompilationUnit, kind: StructureKind, stub: bool) -> Result<(), ContractError> {
    let placeholder = kind.structure_placeholder();

    let count = unit
        .items
        .iter()
        .filter(|item| {
            matches!(
                item.node.kind,
                ItemKind::Struct(_) | ItemKind::Enum(_) | ItemKind::TypeAlias(_)
            ) && item
                .node
                .kind
                .declared_name()
                .is_some_and(|name| name.as_str() == placeholder)
        })
        .count();

    match count {
        0 => return Err(ContractError::NoPlaceholder { placeholder }),
        1 => {}
        count => return Err(ContractError::DuplicatePlaceholder { placeholder, count }),
    }

    if stub || implements_render(unit, &placeholder) {
        Ok(())
    } else {
        Err(ContractError::MissingRender { placeholder })
    }
}

fn implements_render(unit: &CompilationUnit, placeholder: &str) -> bool {
    unit.items.iter().any(|item| match &item.node.kind {
        ItemKind::Impl(block) => {
            let names_render = match &block.trait_ref {
                Some(TypeExpr::Path(path)) => path
                    .segments
                    .last()
                    .is_some_and(|segment| segment.ident.as_str() == RENDER_TRAIT),
                _ => false,
            };
            names_render && !block.negative && block.self_ty.as_simple_name() == Some(placeholder)
        }
        _ => false,
    })
}
