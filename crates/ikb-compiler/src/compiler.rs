//! Template compilation.
//!
//! [`Compiler::compile`] runs the lexer and parser, validates the resulting
//! document with the [`Grammar`], then walks every tag depth-first to fill in
//! registry defaults and coerce attribute values to their declared types.
//!
//! Only lex and parse failures are returned as errors. Everything the
//! grammar finds is recorded in [`CompilationMetadata`] and the document is
//! returned regardless, so an editor can show all findings at once.

use ikb_error_reporting::{Severity, ValidationResult};
use ikb_grammar::{Grammar, coerce_value};
use ikb_registry::{ComponentSpec, Registry, RegistryStore};
use ikb_template::{AttrValue, Document, Node, Tag, parse_template};
use std::sync::Arc;
use std::time::Instant;

use crate::document::{CompilationMetadata, CompiledDocument};
use crate::error::CompileResult;
use crate::options::CompilerOptions;

/// Compiles templates against one registry snapshot.
///
/// A compiler holds no per-document state: compiling the same source twice
/// yields the same document and the same diagnostics.
#[derive(Debug)]
pub struct Compiler {
    options: CompilerOptions,
    grammar: Grammar,
}

impl Compiler {
    /// Build a compiler over the built-in manifests selected by `options`.
    pub fn new(options: CompilerOptions) -> CompileResult<Self> {
        let registry = Registry::load(options.profile, options.cms)?;
        Ok(Self::with_registry(Arc::new(registry), options))
    }

    /// Build a compiler over an existing registry. The registry's own profile
    /// and CMS take precedence over the ones in `options`.
    pub fn with_registry(registry: Arc<Registry>, options: CompilerOptions) -> Self {
        let grammar = Grammar::new(registry)
            .with_mode(options.mode)
            .with_platform(options.platform.clone());
        Self { options, grammar }
    }

    /// Build a compiler over the store's current snapshot. Later reloads of
    /// the store do not affect this compiler.
    pub fn from_store(store: &RegistryStore, options: CompilerOptions) -> Self {
        Self::with_registry(store.current(), options)
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn registry(&self) -> &Registry {
        self.grammar.registry()
    }

    /// Compile template text.
    ///
    /// Diagnostics with a line get the trimmed source line as their snippet.
    pub fn compile(&self, source: &str) -> CompileResult<CompiledDocument> {
        let _span = tracing::debug_span!("compile", bytes = source.len()).entered();
        let started = Instant::now();
        let document = parse_template(source)?;
        Ok(self.compile_document(document, Some(source), started))
    }

    /// Compile an already parsed document.
    pub fn compile_ast(&self, document: Document) -> CompiledDocument {
        let _span = tracing::debug_span!("compile_ast").entered();
        self.compile_document(document, None, Instant::now())
    }

    /// `started` is when the caller began, so lexing and parsing count
    /// towards the reported compilation time.
    fn compile_document(
        &self,
        mut document: Document,
        source: Option<&str>,
        started: Instant,
    ) -> CompiledDocument {
        let mut result = self.grammar.validate_document_rich(&document);
        if let Some(source) = source {
            result.fill_snippets(source);
        }

        normalize_tags(self.grammar.registry(), &mut document.children);

        let metadata = split_diagnostics(result, started);
        tracing::debug!(
            errors = metadata.errors.len(),
            warnings = metadata.warnings.len(),
            unclosed = document.unclosed.len(),
            elapsed_ms = metadata.compilation_time_ms,
            "compiled template"
        );
        CompiledDocument { document, metadata }
    }
}

fn split_diagnostics(result: ValidationResult, started: Instant) -> CompilationMetadata {
    let (errors, warnings): (Vec<_>, Vec<_>) = result
        .into_iter()
        .partition(|d| d.severity == Severity::Error);
    CompilationMetadata {
        compilation_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        errors,
        warnings,
    }
}

fn normalize_tags(registry: &Registry, nodes: &mut [Node]) {
    let mut pending: Vec<&mut Node> = nodes.iter_mut().collect();
    while let Some(node) = pending.pop() {
        if let Node::Tag(tag) = node {
            if let Some(spec) = registry.get_component(&tag.name) {
                normalize_attrs(spec, tag);
            }
            pending.extend(tag.children.iter_mut());
        }
    }
}

/// Fill missing attributes from prop defaults, in prop declaration order,
/// and coerce present literal values to the prop's type.
///
/// Attributes already present keep their position. Values that do not
/// coerce are left as written; the grammar has reported them.
fn normalize_attrs(spec: &ComponentSpec, tag: &mut Tag) {
    for (name, schema) in &spec.props {
        match tag.attrs.get(name) {
            None | Some(AttrValue::Null) => {
                if let Some(default) = &schema.default {
                    tag.attrs
                        .insert(name.clone(), AttrValue::from_json(default));
                }
            }
            Some(value) => {
                if let Some(json) = value.to_json() {
                    let coerced = coerce_value(&json, &schema.type_name);
                    if coerced != json {
                        tag.attrs
                            .insert(name.clone(), AttrValue::from_json(&coerced));
                    }
                }
            }
        }
    }
}
