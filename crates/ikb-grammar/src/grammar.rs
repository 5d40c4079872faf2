// The Grammar service: every check bound to one registry

use dashmap::DashMap;
use ikb_error_reporting::{ValidationError, ValidationResult};
use ikb_registry::{ComponentSpec, FilterSpec, PropSchema, Registry};
use ikb_template::{CmsHeader, Document, Expression, Node, PlatformHeader, Tag};
use serde_json::Value;
use std::sync::Arc;

use crate::expression::{
    ExpressionError, FilterCall, ParsedExpression, PathSegment, parse_expression_with,
    parse_variable_path,
};
use crate::security::{SecurityMode, escaping_finding, expression_sites};
use crate::{
    components, declarations, filters, introspection, locate, schema, structure, types,
};

/// Validation rules over one registry snapshot.
///
/// Apart from the parsed-expression cache a `Grammar` holds no mutable
/// state, so one instance can validate any number of documents, from any
/// number of threads. Every check comes in two forms: `validate_*` stops at
/// the first error, `validate_*_rich` collects every finding, warnings
/// included.
#[derive(Debug)]
pub struct Grammar {
    registry: Arc<Registry>,
    mode: SecurityMode,
    platform: Option<String>,
    expressions: DashMap<String, Arc<ParsedExpression>>,
}

impl Grammar {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            mode: SecurityMode::default(),
            platform: None,
            expressions: DashMap::new(),
        }
    }

    pub fn with_mode(mut self, mode: SecurityMode) -> Self {
        self.mode = mode;
        self
    }

    /// Gate components and filters by a delivery platform such as `web` or `ios`.
    pub fn with_platform(mut self, platform: Option<String>) -> Self {
        self.platform = platform;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn mode(&self) -> SecurityMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SecurityMode) {
        self.mode = mode;
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn set_platform(&mut self, platform: Option<String>) {
        self.platform = platform;
    }

    // ---- values -------------------------------------------------------

    pub fn validate_type(&self, value: &Value, type_expr: &str) -> bool {
        types::validate_type(value, type_expr)
    }

    pub fn validate_value(
        &self,
        value: Option<&Value>,
        schema: &PropSchema,
    ) -> Result<(), ValidationError> {
        schema::validate_value(value, schema)
    }

    pub fn validate_value_rich(&self, value: Option<&Value>, schema: &PropSchema) -> ValidationResult {
        schema::validate_value_rich(value, schema)
    }

    pub fn normalize_value(
        &self,
        value: Option<&Value>,
        schema: &PropSchema,
    ) -> Result<Value, ValidationError> {
        schema::normalize_value(value, schema)
    }

    // ---- expressions --------------------------------------------------

    /// Parse an expression, memoized by its source text.
    pub fn parse_expression(&self, text: &str) -> Result<Arc<ParsedExpression>, ExpressionError> {
        if let Some(parsed) = self.expressions.get(text) {
            tracing::trace!(expression = text, "expression cache hit");
            return Ok(Arc::clone(parsed.value()));
        }
        let parsed = Arc::new(parse_expression_with(text, |name| {
            self.registry.is_escaping_filter(name)
        })?);
        self.expressions
            .insert(text.to_string(), Arc::clone(&parsed));
        tracing::trace!(expression = text, "cached parsed expression");
        Ok(parsed)
    }

    pub fn parse_variable_path(&self, path: &str) -> Result<Vec<PathSegment>, ExpressionError> {
        parse_variable_path(path)
    }

    /// Number of memoized expressions.
    pub fn cached_expressions(&self) -> usize {
        self.expressions.len()
    }

    pub fn clear_cache(&self) {
        self.expressions.clear();
    }

    pub fn validate_filter_chain(&self, chain: &[FilterCall]) -> Result<(), ValidationError> {
        self.validate_filter_chain_rich(chain).into_result()
    }

    pub fn validate_filter_chain_rich(&self, chain: &[FilterCall]) -> ValidationResult {
        let mut result = ValidationResult::new();
        filters::check_filter_chain(&self.registry, chain, self.platform(), &mut result);
        result
    }

    /// Syntax, filter chain and escaping checks for one interpolation site.
    pub fn validate_expression(&self, expr: &Expression) -> Result<(), ValidationError> {
        self.validate_expression_rich(expr).into_result()
    }

    pub fn validate_expression_rich(&self, expr: &Expression) -> ValidationResult {
        let mut result = ValidationResult::new();
        self.check_expression(expr, &mut result);
        result
    }

    fn check_expression(&self, expr: &Expression, result: &mut ValidationResult) {
        let start = result.len();
        match self.parse_expression(&expr.raw) {
            Err(err) => result.push(err.to_diagnostic()),
            Ok(parsed) => {
                filters::check_filter_chain(&self.registry, &parsed.filters, self.platform(), result);
                if let Some(finding) = escaping_finding(&parsed, &expr.raw, self.mode) {
                    result.push(finding);
                }
            }
        }
        for diagnostic in result.errors.iter_mut().skip(start) {
            if diagnostic.node_kind.is_none() {
                diagnostic.node_kind = Some("expression".to_string());
                diagnostic.node_name = Some(expr.raw.clone());
            }
        }
        locate(result, start, expr.loc);
    }

    // ---- components and structure -------------------------------------

    pub fn validate_component(&self, tag: &Tag) -> Result<(), ValidationError> {
        self.validate_component_rich(tag).into_result()
    }

    pub fn validate_component_rich(&self, tag: &Tag) -> ValidationResult {
        let mut result = ValidationResult::new();
        components::check_component(&self.registry, tag, self.platform(), &mut result);
        result
    }

    pub fn validate_structure(&self, root: &Node) -> Result<(), ValidationError> {
        self.validate_structure_rich(root).into_result()
    }

    pub fn validate_structure_rich(&self, root: &Node) -> ValidationResult {
        let mut result = ValidationResult::new();
        structure::check_structure(root, &mut result);
        result
    }

    pub fn validate_cms_header(&self, header: &CmsHeader) -> Result<(), ValidationError> {
        self.validate_cms_header_rich(header).into_result()
    }

    pub fn validate_cms_header_rich(&self, header: &CmsHeader) -> ValidationResult {
        let mut result = ValidationResult::new();
        declarations::check_cms_header(header, &mut result);
        result
    }

    pub fn validate_platform_header(&self, header: &PlatformHeader) -> Result<(), ValidationError> {
        self.validate_platform_header_rich(header).into_result()
    }

    pub fn validate_platform_header_rich(&self, header: &PlatformHeader) -> ValidationResult {
        let mut result = ValidationResult::new();
        declarations::check_platform_header(&self.registry, header, &mut result);
        result
    }

    /// Escaping checks only, for every interpolation site in a document.
    /// Sites that do not parse are skipped here.
    pub fn validate_security(&self, doc: &Document) -> Result<(), ValidationError> {
        self.validate_security_rich(doc).into_result()
    }

    pub fn validate_security_rich(&self, doc: &Document) -> ValidationResult {
        let mut result = ValidationResult::new();
        for expr in expression_sites(doc) {
            if let Ok(parsed) = self.parse_expression(&expr.raw)
                && let Some(finding) = escaping_finding(&parsed, &expr.raw, self.mode)
            {
                let loc = expr.loc;
                result.push(
                    finding
                        .with_node("expression", expr.raw.clone())
                        .at(loc.line, loc.column, loc.offset),
                );
            }
        }
        result
    }

    /// Run every check over a document.
    ///
    /// Findings are ordered by source offset; findings without a position
    /// come last.
    pub fn validate_document(&self, doc: &Document) -> Result<(), ValidationError> {
        self.validate_document_rich(doc).into_result()
    }

    pub fn validate_document_rich(&self, doc: &Document) -> ValidationResult {
        let mut result = ValidationResult::new();
        structure::check_document(doc, &mut result);
        if let Some(header) = &doc.cms_header {
            declarations::check_cms_header(header, &mut result);
        }
        if let Some(header) = &doc.platform_header {
            declarations::check_platform_header(&self.registry, header, &mut result);
        }
        for tag in doc.tags() {
            components::check_component(&self.registry, tag, self.platform(), &mut result);
        }
        for expr in expression_sites(doc) {
            self.check_expression(expr, &mut result);
        }
        result
            .errors
            .sort_by_key(|e| e.offset.unwrap_or(usize::MAX));
        result
    }

    // ---- introspection -------------------------------------------------

    pub fn get_available_components(
        &self,
        platform: Option<&str>,
        category: Option<&str>,
    ) -> Vec<&ComponentSpec> {
        introspection::available_components(&self.registry, platform, category)
    }

    pub fn get_available_filters(&self, platform: Option<&str>) -> Vec<&FilterSpec> {
        introspection::available_filters(&self.registry, platform)
    }

    pub fn export_json_schema(&self) -> Value {
        introspection::export_json_schema(&self.registry)
    }
}
