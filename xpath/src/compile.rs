//! `compile(source, version, options) -> Expression` and
//! `Expression::evaluate(context) -> Sequence` (spec.md §6 "Public API
//! surface"), combining lex + parse + optional cache lookup + a
//! per-expression [`FunctionRegistry`] of built-ins and extensions.
//! Grounded on the teacher's `xee-xpath-compiler::compile` (`compile`/
//! `parse` pair sitting in front of `xee-interpreter::interpreter::Program`).

use std::rc::Rc;
use std::sync::OnceLock;

use xpath_ast::ast::XPath;
use xpath_ast::context::StaticContext;
use xpath_interpreter::context::DynamicContext;
use xpath_interpreter::error::SpannedError;
use xpath_interpreter::function::FunctionRegistry;
use xpath_interpreter::item::Item;
use xpath_interpreter::node::Node;
use xpath_interpreter::sequence::Sequence;
use xpath_interpreter::warning::WarningChannel;
use xpath_lexer::Version;

use crate::options::{CacheMode, Options};

/// A compiled expression, bound to the [`FunctionRegistry`] its [`Options`]
/// produced. Cheap to evaluate repeatedly against different
/// [`DynamicContext`]s; re-`compile` only when the source text changes.
pub struct Expression<N: Node> {
    ast: Rc<XPath>,
    functions: Rc<FunctionRegistry<N>>,
    version: Version,
    warnings: WarningChannel,
}

impl<N: Node> Expression<N> {
    /// Evaluate against a fully assembled dynamic context. Use
    /// [`Self::new_context`] to start from one wired to this expression's
    /// function registry, version, and warning channel.
    #[tracing::instrument(skip_all)]
    pub fn evaluate(&self, ctx: &DynamicContext<N>) -> Result<Sequence<N>, SpannedError> {
        xpath_interpreter::eval::evaluate(&self.ast, ctx)
    }

    /// A [`DynamicContext`] pre-wired with this expression's function
    /// registry, version, and warning channel, with `context_item` as the
    /// initial focus (position 1 of size 1, or no focus at all if `None`).
    pub fn new_context(&self, context_item: Option<Item<N>>) -> DynamicContext<N> {
        let mut ctx = DynamicContext::with_warnings(self.functions.clone(), self.version, self.warnings.clone());
        if let Some(item) = context_item {
            ctx = ctx.with_context_item(item, 1, 1);
        }
        ctx
    }

    /// Subscribe to this expression's non-fatal diagnostics (spec.md §7
    /// "Warnings").
    pub fn warnings(&self) -> &WarningChannel {
        &self.warnings
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

fn cache_key(source: &str, version: Version) -> String {
    format!("{version:?}\u{0}{source}")
}

/// The process-wide cache backing `CacheMode::Enabled` (spec.md §9: "an
/// implicit default is permitted only as a convenience wrapper" around the
/// explicit, injectable cache `CacheMode::Shared` exposes). Lives for the
/// life of the process so repeated `compile` calls actually amortize parsing
/// instead of each seeding and discarding an empty cache.
fn default_cache() -> &'static xpath_interpreter::cache::ExpressionCache {
    static CACHE: OnceLock<xpath_interpreter::cache::ExpressionCache> = OnceLock::new();
    CACHE.get_or_init(xpath_interpreter::cache::ExpressionCache::default)
}

fn build_registry<N: Node>(options: &Options<N>) -> Result<FunctionRegistry<N>, SpannedError> {
    let mut registry = FunctionRegistry::with_builtins(options.version);
    for extension in &options.extensions {
        let max_arity = extension.max_arity.unwrap_or(extension.min_arity);
        registry
            .register_arity_range(extension.name.clone(), extension.min_arity, max_arity, extension.callable.clone())
            .map_err(SpannedError::unspanned)?;
    }
    Ok(registry)
}

/// Lex, parse (consulting the cache first when `options.cache` asks for
/// one), and assemble a ready-to-evaluate [`Expression`] (spec.md §6
/// `compile(source, version, options)`).
#[tracing::instrument(skip(source, options))]
pub fn compile<N: Node>(source: &str, options: &Options<N>) -> Result<Expression<N>, SpannedError> {
    let mut static_ctx = StaticContext::new(options.version, options.static_namespaces.clone());
    static_ctx.set_enable_namespace_axis(options.enable_namespace_axis);
    let key = cache_key(source, options.version);

    let ast = match &options.cache {
        CacheMode::Disabled => parse(&static_ctx, source, options)?,
        CacheMode::Enabled | CacheMode::Shared(_) => {
            let cache = match &options.cache {
                CacheMode::Shared(existing) => existing.as_ref(),
                CacheMode::Enabled => default_cache(),
                CacheMode::Disabled => unreachable!(),
            };
            match cache.get(&key) {
                Some(ast) => ast,
                None => {
                    let ast = parse(&static_ctx, source, options)?;
                    cache.set(key, ast.clone());
                    ast
                }
            }
        }
    };

    let functions = build_registry(options)?;
    Ok(Expression {
        ast: Rc::new(ast),
        functions: Rc::new(functions),
        version: options.version,
        warnings: WarningChannel::new(),
    })
}

fn parse<N: Node>(static_ctx: &StaticContext, source: &str, options: &Options<N>) -> Result<XPath, SpannedError> {
    xpath_ast::compile_with_extension_functions(static_ctx, source, options.extension_names_for_lexer())
        .map_err(SpannedError::from)
}
