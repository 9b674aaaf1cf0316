//! Filter shorthand resolvers.
//!
//! The lowered tree still speaks in portal shorthand: entity set references,
//! gene set ids, chromosome locations and filters on nested fields with no
//! `nested` wrapper. Each resolver rewrites one kind of shorthand into
//! primitive filters. They run in a fixed order because later resolvers
//! depend on the output of earlier ones (nested-field wrapping must see the
//! `Nested` nodes the gene set and location resolvers produce).

mod entity_set;
mod fields_to_source;
mod gene_set;
mod location;
mod nested_field;
mod score_sort;

pub use entity_set::ENTITY_SET_PREFIX;
pub use location::ChromosomeLocation;

use crate::context::QueryContext;
use crate::error::{CompileError, Result};
use crate::tree::{ExpressionNode, NodeKind};
use tracing::debug;

/// Run every resolver over a lowered tree.
pub fn resolve(root: ExpressionNode, context: &QueryContext<'_>) -> Result<ExpressionNode> {
    let model = context.type_model;

    let root = fields_to_source::resolve(root, model);
    debug!(stage = "fields-to-source", "\n{root}");

    let root = entity_set::resolve(root, context)?;
    debug!(stage = "entity-set", "\n{root}");

    let root = if root.has_child(|k| matches!(k, NodeKind::Count)) {
        root
    } else {
        score_sort::resolve(root)
    };
    debug!(stage = "score-sort", "\n{root}");

    let root = gene_set::resolve(root, model)?;
    debug!(stage = "gene-set", "\n{root}");

    let root = location::resolve(root, model)?;
    debug!(stage = "location", "\n{root}");

    let root = nested_field::resolve(root, model)?;
    debug!(stage = "nested-field", "\n{root}");

    Ok(root)
}

/// Apply `rewrite` to the `Query` child of `root`, leaving everything else
/// alone.
pub(crate) fn map_query(
    root: ExpressionNode,
    mut rewrite: impl FnMut(ExpressionNode) -> Result<ExpressionNode>,
) -> Result<ExpressionNode> {
    root.map_children(|child| match child.kind {
        NodeKind::Query => rewrite(child).map(Some),
        _ => Ok(Some(child)),
    })
}

/// A node a filter pass has no business seeing.
pub(crate) fn unexpected(kind: &NodeKind, pass: &str) -> CompileError {
    CompileError::internal(format!("Unexpected {} node while resolving {pass}", kind.tag()))
}
