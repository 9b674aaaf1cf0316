//! PQL statement to expression tree.
//!
//! Aliases are resolved to document paths here; nesting is left to the
//! resolvers.

use crate::ast::{CompareOp, Filter, Projection, Statement};
use crate::error::Result;
use crate::meta::TypeModel;
use crate::tree::{ExpressionNode, NodeKind};

pub fn lower(statement: &Statement, model: &TypeModel) -> Result<ExpressionNode> {
    let mut children = Vec::new();

    if !statement.select.is_empty() {
        children.push(ExpressionNode::leaf(NodeKind::Fields(select_fields(statement, model)?)));
    }

    if statement.has_facets() {
        let facets = facet_aliases(statement, model);
        let aggregations = facets
            .into_iter()
            .map(|alias| Ok(ExpressionNode::terms_aggregation(alias.clone(), model.field(&alias)?)))
            .collect::<Result<Vec<_>>>()?;
        children.push(ExpressionNode::aggregations(aggregations));
    }

    if statement.count {
        children.push(ExpressionNode::leaf(NodeKind::Count));
    }

    if let Some(filter) = &statement.filter {
        let condition = lower_filter(filter, model)?;
        children.push(ExpressionNode::query(ExpressionNode::filter(condition)));
    }

    if !statement.sort.is_empty() {
        let keys = statement
            .sort
            .iter()
            .map(|key| Ok((model.field(&key.field)?.to_string(), key.order)))
            .collect::<Result<Vec<_>>>()?;
        children.push(ExpressionNode::leaf(NodeKind::Sort(keys)));
    }

    if let Some(limit) = statement.limit {
        children.push(ExpressionNode::leaf(NodeKind::Limit {
            from: limit.from,
            size: limit.size,
        }));
    }

    Ok(ExpressionNode::root(children))
}

fn push_unique(out: &mut Vec<String>, value: &str) {
    if !out.iter().any(|existing| existing == value) {
        out.push(value.to_string());
    }
}

fn select_fields(statement: &Statement, model: &TypeModel) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    for projection in &statement.select {
        match projection {
            Projection::All => model.fields().iter().for_each(|f| push_unique(&mut fields, f)),
            Projection::Fields(aliases) => {
                for alias in aliases {
                    push_unique(&mut fields, model.field(alias)?);
                }
            }
        }
    }
    Ok(fields)
}

fn facet_aliases(statement: &Statement, model: &TypeModel) -> Vec<String> {
    let mut facets = Vec::new();
    for projection in &statement.facets {
        match projection {
            Projection::All => model.facets().iter().for_each(|f| push_unique(&mut facets, f)),
            Projection::Fields(aliases) => aliases.iter().for_each(|f| push_unique(&mut facets, f)),
        }
    }
    facets
}

pub fn lower_filter(filter: &Filter, model: &TypeModel) -> Result<ExpressionNode> {
    let node = match filter {
        Filter::Compare { op, field, value } => {
            let field = model.field(field)?;
            let value = value.clone();
            match op {
                CompareOp::Eq => ExpressionNode::term(field, value),
                CompareOp::Ne => ExpressionNode::not(ExpressionNode::term(field, value)),
                CompareOp::Gt => ExpressionNode::range(field, NodeKind::GreaterThan(value)),
                CompareOp::Ge => ExpressionNode::range(field, NodeKind::GreaterEqual(value)),
                CompareOp::Lt => ExpressionNode::range(field, NodeKind::LessThan(value)),
                CompareOp::Le => ExpressionNode::range(field, NodeKind::LessEqual(value)),
            }
        }
        Filter::In { field, values } => ExpressionNode::terms(model.field(field)?, values.iter().cloned()),
        Filter::Exists(field) => ExpressionNode::exists(model.field(field)?),
        Filter::Missing(field) => ExpressionNode::missing(model.field(field)?),
        Filter::And(children) => ExpressionNode::must(lower_all(children, model)?),
        Filter::Or(children) => ExpressionNode::should(lower_all(children, model)?),
        Filter::Not(inner) => ExpressionNode::not(lower_filter(inner, model)?),
        Filter::Nested { path, filters } => {
            ExpressionNode::nested(path.clone(), ExpressionNode::must(lower_all(filters, model)?))
        }
    };
    Ok(node)
}

fn lower_all(filters: &[Filter], model: &TypeModel) -> Result<Vec<ExpressionNode>> {
    filters.iter().map(|f| lower_filter(f, model)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{type_model, DocType};
    use crate::parser::parse;

    fn lower_str(pql: &str, doc_type: DocType) -> ExpressionNode {
        lower(&parse(pql).unwrap(), type_model(doc_type)).unwrap()
    }

    #[test]
    fn test_ne_becomes_not_term() {
        let root = lower_str("ne(gender,'male')", DocType::DonorCentric);
        let condition = root.query_filter().unwrap().first_child().unwrap();
        assert_eq!(condition, &ExpressionNode::not(ExpressionNode::term("donor_sex", "male")));
    }

    #[test]
    fn test_facets_use_alias_as_name() {
        let root = lower_str("facets(gender)", DocType::DonorCentric);
        let aggs = root.find_child(|k| matches!(k, NodeKind::Aggregations)).unwrap();
        assert_eq!(aggs.children, vec![ExpressionNode::terms_aggregation("gender", "donor_sex")]);
    }

    #[test]
    fn test_unknown_alias() {
        let err = lower(&parse("eq(nope,1)").unwrap(), type_model(DocType::GeneCentric)).unwrap_err();
        assert!(err.is_bad_query());
        assert_eq!(err.to_string(), "Bad query: Field nope is not defined in the type model");
    }
}
