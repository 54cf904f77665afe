//! Merge an instantiated template into a destination unit

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::syntax::ast::*;
use crate::syntax::{fingerprint, render_type};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error("Conflicting declarations of '{name}': destination and template differ")]
    Conflict { name: String },
}

/// Combine `destination` and `instantiated` into one unit.
///
/// The result carries the destination's name, header and trailing comments.
/// Imports come first, then destination items, then template items, each in
/// their original order. Template imports, functions and impl members the
/// destination already has are dropped; impl blocks with the same header are
/// fused; other declarations sharing a name must be identical.
pub fn merge(
    destination: CompilationUnit,
    instantiated: CompilationUnit,
) -> Result<CompilationUnit, MergeError> {
    let CompilationUnit {
        name,
        header,
        items: dest_items,
        trailing,
    } = destination;

    let (mut uses, mut items): (Vec<_>, Vec<_>) = dest_items
        .into_iter()
        .partition(|item| matches!(item.node.kind, ItemKind::Use(_)));

    let mut imported: HashSet<(bool, UseLeaf)> = HashSet::new();
    for item in &uses {
        if let ItemKind::Use(decl) = &item.node.kind {
            imported.extend(decl.tree.leaves().into_iter().map(|leaf| (decl.global, leaf)));
        }
    }

    for mut item in instantiated.items {
        match item.node.kind {
            ItemKind::Use(decl) => {
                let global = decl.global;
                let tree = decl
                    .tree
                    .prune(&mut |leaf| imported.insert((global, leaf.clone())));
                match tree {
                    Some(tree) => {
                        item.node.kind = ItemKind::Use(UseDecl {
                            global,
                            tree: simplify(tree),
                        });
                        uses.push(item);
                    }
                    None => debug!("dropping import already present in destination"),
                }
            }
            ItemKind::Impl(block) => {
                let header = impl_header(&block);
                let target = items.iter_mut().find_map(|existing| match &mut existing.node.kind {
                    ItemKind::Impl(other) if impl_header(other) == header => Some(other),
                    _ => None,
                });
                match target {
                    Some(target) => fuse(target, block.items)?,
                    None => {
                        item.node.kind = ItemKind::Impl(block);
                        items.push(item);
                    }
                }
            }
            kind => {
                item.node.kind = kind;
                if keep(&items, &item.node)? {
                    items.push(item);
                }
            }
        }
    }

    uses.extend(items);
    Ok(CompilationUnit {
        name,
        header,
        items: uses,
        trailing,
    })
}

/// Whether a template item survives next to `existing`
fn keep(existing: &[Spanned<Item>], item: &Item) -> Result<bool, MergeError> {
    let Some(duplicate) = existing.iter().find(|e| same_declaration(&e.node.kind, &item.kind))
    else {
        if let ItemKind::Verbatim(_) = item.kind {
            let print = fingerprint(item);
            return Ok(!existing.iter().any(|e| fingerprint(&e.node) == print));
        }
        return Ok(true);
    };

    if let ItemKind::Fn(decl) = &item.kind {
        debug!(name = %decl.name, "dropping function already declared in destination");
        return Ok(false);
    }
    if fingerprint(&duplicate.node) == fingerprint(item) {
        return Ok(false);
    }
    let name = item
        .kind
        .declared_name()
        .map(ToString::to_string)
        .unwrap_or_default();
    Err(MergeError::Conflict { name })
}

fn fuse(target: &mut ImplBlock, members: Vec<Spanned<Item>>) -> Result<(), MergeError> {
    for member in members {
        if keep(&target.items, &member.node)? {
            target.items.push(member);
        }
    }
    Ok(())
}

/// Same declared name in the same namespace: functions only clash with
/// functions
fn same_declaration(a: &ItemKind, b: &ItemKind) -> bool {
    let is_fn = |kind: &ItemKind| matches!(kind, ItemKind::Fn(_));
    match (a.declared_name(), b.declared_name()) {
        (Some(x), Some(y)) => x == y && is_fn(a) == is_fn(b),
        _ => false,
    }
}

/// Generics, polarity, trait, self type and where clause, as rendered
fn impl_header(block: &ImplBlock) -> (String, bool, Option<String>, String, String) {
    (
        block.generics.as_ref().map(Verbatim::flatten).unwrap_or_default(),
        block.negative,
        block.trait_ref.as_ref().map(render_type),
        render_type(&block.self_ty),
        block.where_clause.as_ref().map(Verbatim::flatten).unwrap_or_default(),
    )
}

/// Collapse groups left with a single member by pruning
fn simplify(tree: UseTree) -> UseTree {
    match tree {
        UseTree::Path { segment, rest } => UseTree::Path {
            segment,
            rest: Box::new(simplify(*rest)),
        },
        UseTree::Group(mut trees) if trees.len() == 1 => {
            let lone = trees.remove(0);
            if matches!(&lone, UseTree::Name(name) if name.as_str() == "self") {
                UseTree::Group(vec![lone])
            } else {
                simplify(lone)
            }
        }
        UseTree::Group(trees) => UseTree::Group(trees.into_iter().map(simplify).collect()),
        leaf => leaf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse, to_source};
    use pretty_assertions::assert_eq;

    fn merged(destination: &str, template: &str) -> Result<String, MergeError> {
        let destination = parse(destination).expect("destination parses");
        let template = parse(template).expect("template parses");
        let unit = merge(destination, template)?;
        Ok(to_source(&unit).expect("Should render"))
    }

    #[test]
    fn test_fixed_order_and_duplicate_functions() {
        let out = merged(
            "use std::fmt;\nstruct A;\nfn main() {}",
            "use std::fmt;\nuse std::collections::VecDeque;\npub struct WidgetStack;\nfn main() {}",
        )
        .expect("Should merge");
        assert_eq!(
            out,
            "use std::fmt;\nuse std::collections::VecDeque;\n\nstruct A;\n\nfn main() {}\n\npub struct WidgetStack;\n"
        );
    }

    #[test]
    fn test_import_groups_pruned() {
        let out = merged("use std::fmt;", "use std::{fmt, io};").expect("Should merge");
        assert_eq!(out, "use std::fmt;\nuse std::io;\n");
    }

    #[test]
    fn test_self_import_matches_module_import() {
        let out = merged("use std::fmt::{self, Display};", "use std::fmt;").expect("Should merge");
        assert_eq!(out, "use std::fmt::{self, Display};\n");

        let out = merged("use std::fmt;", "use std::fmt::{self, Write};").expect("Should merge");
        assert_eq!(out, "use std::fmt;\nuse std::fmt::Write;\n");
    }

    #[test]
    fn test_dropped_import_takes_its_comments() {
        let out = merged("use std::fmt;", "// imports\nuse std::fmt;").expect("Should merge");
        assert_eq!(out, "use std::fmt;\n");
    }

    #[test]
    fn test_impl_blocks_fused() {
        let out = merged(
            "struct W;\nimpl W { fn a(&self) {} }",
            "impl W { fn a(&self) {} fn b(&self) {} }",
        )
        .expect("Should merge");
        assert_eq!(
            out,
            "struct W;\n\nimpl W {\n    fn a(&self) {}\n\n    fn b(&self) {}\n}\n"
        );
    }

    #[test]
    fn test_trait_impls_not_fused_with_inherent() {
        let out = merged("impl W {}", "impl Clone for W {}").expect("Should merge");
        assert_eq!(out, "impl W {}\n\nimpl Clone for W {}\n");
    }

    #[test]
    fn test_identical_declarations_collapse_to_destination() {
        let out = merged("/// Kept\nstruct W;", "/// Dropped\nstruct W;").expect("Should merge");
        assert_eq!(out, "/// Kept\nstruct W;\n");
    }

    #[test]
    fn test_differing_declarations_conflict() {
        let err = merged("struct W(u8);", "struct W(u16);").unwrap_err();
        assert_eq!(
            err,
            MergeError::Conflict {
                name: "W".to_string()
            }
        );
    }

    #[test]
    fn test_conflicting_impl_constant() {
        let err = merged(
            "impl W { const N: usize = 1; }",
            "impl W { const N: usize = 2; }",
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::Conflict { name } if name == "N"));
    }

    #[test]
    fn test_destination_identity_kept() {
        let mut destination = parse("//! Destination docs\n// tail").expect("Should parse");
        destination.name = Some("widgets".to_string());
        let template = parse("//! Template docs\nstruct X;\n// template tail").expect("Should parse");
        let unit = merge(destination, template).expect("Should merge");
        assert_eq!(unit.name.as_deref(), Some("widgets"));
        assert_eq!(
            to_source(&unit).expect("Should render"),
            "//! Destination docs\n\nstruct X;\n\n// tail\n"
        );
    }

    #[test]
    fn test_empty_destination_takes_template_items() {
        let template = parse("use std::fmt;\npub struct X;").expect("Should parse");
        let unit = merge(CompilationUnit::default(), template.clone()).expect("Should merge");
        assert_eq!(unit.items, template.items);
        assert!(unit.header.is_empty());
    }
}
