use crate::aggs;
use crate::ast::Statement;
use crate::cleanup::{remove_empty, simplify_bool};
use crate::config::EngineConfig;
use crate::context::QueryContext;
use crate::error::{CompileError, Result};
use crate::lower::lower;
use crate::meta::DocType;
use crate::parser::parse;
use crate::request::{RequestBuilder, SearchRequest};
use crate::resolve;
use crate::tree::ExpressionNode;
use tracing::debug;

/// Compiles PQL into search requests against the configured index.
///
/// The engine holds no per-query state; one instance serves every document
/// type and may be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    config: EngineConfig,
}

impl QueryEngine {
    pub fn new(config: EngineConfig) -> Self {
        QueryEngine { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Context of every pass compiling a query for `doc_type`.
    pub fn context(&self, doc_type: DocType) -> QueryContext<'_> {
        QueryContext::new(&self.config.index, doc_type)
            .with_lookup(&self.config.lookup_index, &self.config.lookup_path)
    }

    pub fn compile(&self, pql: &str, doc_type: DocType) -> Result<SearchRequest> {
        let statement = parse(pql)?;
        debug!(%doc_type, pql, "compiling");
        self.compile_statement(&statement, doc_type)
    }

    pub fn compile_statement(&self, statement: &Statement, doc_type: DocType) -> Result<SearchRequest> {
        let context = self.context(doc_type);
        let tree = self.compile_tree_in(statement, &context)?;
        let request = RequestBuilder::new(&context, self.config.terms_size).build(&tree)?;
        debug!(endpoint = %request.endpoint(), "built request");
        Ok(request)
    }

    /// The fully resolved and simplified tree the request is built from.
    pub fn compile_tree(&self, statement: &Statement, doc_type: DocType) -> Result<ExpressionNode> {
        self.compile_tree_in(statement, &self.context(doc_type))
    }

    fn compile_tree_in(&self, statement: &Statement, context: &QueryContext<'_>) -> Result<ExpressionNode> {
        let model = context.type_model;

        let root = lower(statement, model)?;
        debug!(stage = "lower", "\n{root}");

        let root = resolve::resolve(root, context)?;
        let root = aggs::resolve(root, model)?;

        let root = remove_empty(root).ok_or_else(|| CompileError::internal("Root node removed by cleanup"))?;
        debug!(stage = "cleanup", "\n{root}");

        let root = simplify_bool(aggs::simplify(root));
        debug!(stage = "simplify", "\n{root}");

        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> QueryEngine {
        QueryEngine::new(EngineConfig::default())
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QueryEngine>();
    }

    #[test]
    fn test_lookup_settings_come_from_config() {
        let config = EngineConfig {
            lookup_index: "sets".to_string(),
            ..EngineConfig::default()
        };
        let engine = QueryEngine::new(config);
        assert_eq!(engine.context(DocType::DonorCentric).lookup_index, "sets");
    }

    #[test]
    fn test_unknown_field_is_bad_query() {
        let err = engine().compile("eq(donor.nope,1)", DocType::DonorCentric).unwrap_err();
        assert!(err.is_bad_query());
    }

    #[test]
    fn test_count_skips_score_sort() {
        let request = engine().compile("count(),eq(gender,'male')", DocType::DonorCentric).unwrap();
        assert!(request.count_only);
        assert!(request.sort.is_empty());
    }
}
