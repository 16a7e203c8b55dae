//! Routes every call of a function value through its profiling wrapper.

use crate::error::{GenerationError, IsuprofError, Result};
use crate::frontend::ast::{CallExpr, Expr, File};
use crate::frontend::typechecker::TypeError;
use crate::frontend::visit::{VisitMut, walk_expr_mut};
use crate::frontend::{Resolution, TypeOracle, format_type_errors};
use crate::instrument::generator::{WrapperTable, generate};
use crate::instrument::names::NameResolver;
use crate::instrument::registry::SignatureRegistry;
use crate::instrument::signature::{SignatureId, wrapper_name};
use tracing::{debug, warn};

/// Per-unit counts of call sites.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteStats {
    /// Calls routed through a wrapper.
    pub rewritten: usize,
    /// Calls of function values left as written because no wrapper exists.
    pub skipped: usize,
    /// Conversions and builtin calls.
    pub untouched: usize,
}

pub struct Rewriter<'a, 's, O: TypeOracle + ?Sized> {
    oracle: &'a O,
    registry: &'a mut SignatureRegistry,
    wrappers: &'a mut WrapperTable,
    names: &'a mut NameResolver<'s>,
    filename: &'a str,
    stats: RewriteStats,
    error: Option<IsuprofError>,
}

impl<'a, 's, O: TypeOracle + ?Sized> Rewriter<'a, 's, O> {
    pub fn new(
        oracle: &'a O,
        registry: &'a mut SignatureRegistry,
        wrappers: &'a mut WrapperTable,
        names: &'a mut NameResolver<'s>,
        filename: &'a str,
    ) -> Self {
        Self {
            oracle,
            registry,
            wrappers,
            names,
            filename,
            stats: RewriteStats::default(),
            error: None,
        }
    }

    /// Rewrites `file` in place. The first fatal error stops the walk.
    pub fn rewrite_file(mut self, file: &mut File) -> Result<RewriteStats> {
        self.visit_file_mut(file);
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.stats),
        }
    }

    /// Wrapper id for a call site, or `None` when the site stays as written.
    fn wrapper_for(&mut self, call: &CallExpr) -> Result<Option<SignatureId>> {
        let callable = match self.oracle.resolve_callee(&call.callee) {
            Resolution::NotCallable => {
                self.stats.untouched += 1;
                return Ok(None);
            }
            Resolution::Unknown => {
                let error = TypeError::new("cannot resolve callee", self.filename, call.callee.span());
                return Err(IsuprofError::TypeCheck(format_type_errors(&[error])));
            }
            Resolution::Callable(callable) => callable,
        };

        if call.args.len() == 1 && !call.ellipsis && self.oracle.is_multi_value(&call.args[0]) {
            self.skip(call, &GenerationError::MultiValueArgument);
            return Ok(None);
        }

        let (id, created) = self.registry.get_or_create(&callable)?;
        if created {
            match generate(&callable, id, self.names) {
                Ok(text) => {
                    debug!(id, signature = %format!("func{}", callable), "generated wrapper");
                    self.wrappers.define(id, text, callable);
                }
                Err(err) => self.wrappers.mark_failed(id, err),
            }
        }

        if let Some(err) = self.wrappers.failure(id).cloned() {
            self.skip(call, &err);
            return Ok(None);
        }
        Ok(Some(id))
    }

    fn skip(&mut self, call: &CallExpr, reason: &GenerationError) {
        let span = call.span;
        warn!(
            "{}:{}:{}: call left uninstrumented: {}",
            self.filename, span.line, span.column, reason
        );
        self.stats.skipped += 1;
    }
}

impl<O: TypeOracle + ?Sized> VisitMut for Rewriter<'_, '_, O> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if self.error.is_some() {
            return;
        }
        if let Expr::Call(call) = expr {
            if !call.instrumented {
                match self.wrapper_for(call) {
                    Ok(Some(id)) => {
                        call.wrap(&wrapper_name(id));
                        self.stats.rewritten += 1;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        self.error = Some(err);
                        return;
                    }
                }
            }
        }
        walk_expr_mut(self, expr);
    }
}
