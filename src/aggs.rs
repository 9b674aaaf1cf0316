//! Facet aggregations.
//!
//! Lowering emits one flat `TermsAggregation` per facet. A portal facet
//! must show, for its field, the counts the user would get by changing only
//! that field's filter, so each facet is rebuilt as a global aggregation
//! that re-applies every other active filter, descends through the nesting
//! levels of its field, and gets a twin counting the documents without a
//! value.

mod filters;
mod missing;
mod resolver;
mod reverse_nested;
mod simplify;

pub use missing::MISSING_SUFFIX;
pub use simplify::simplify;

use crate::error::Result;
use crate::meta::TypeModel;
use crate::tree::{ExpressionNode, NodeKind};
use tracing::debug;

/// Resolve the facets of a tree. Trees without an `Aggregations` node are
/// returned untouched.
pub fn resolve(root: ExpressionNode, model: &TypeModel) -> Result<ExpressionNode> {
    if !root.has_child(|k| matches!(k, NodeKind::Aggregations)) {
        return Ok(root);
    }

    let root = resolver::resolve(root, model)?;
    debug!(stage = "aggregations", "\n{root}");

    let root = missing::resolve(root)?;
    debug!(stage = "missing-aggregations", "\n{root}");

    let root = reverse_nested::resolve(root, model.doc_type())?;
    debug!(stage = "reverse-nested", "\n{root}");

    Ok(root)
}
